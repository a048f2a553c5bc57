use std::{future::Future, time::Duration};

use dashmap::DashMap;
use tokio::{task::AbortHandle, time::sleep};

use crate::state::{SessionId, round::ExpiryTicket};

struct PendingExpiry {
    ticket: ExpiryTicket,
    handle: AbortHandle,
}

/// One delayed auto-expiry task per session.
///
/// Cancellation aborts the sleeping task. A task that already woke up may
/// still run; the round's armed flag decides whether it has any effect.
#[derive(Default)]
pub struct ExpiryTimers {
    pending: DashMap<SessionId, PendingExpiry>,
}

impl ExpiryTimers {
    /// Create an empty timer table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `on_fire` after `delay`, replacing any timer pending for `session_id`.
    pub fn schedule<F>(&self, session_id: SessionId, ticket: ExpiryTicket, delay: Duration, on_fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            sleep(delay).await;
            on_fire.await;
        });

        let previous = self.pending.insert(
            session_id,
            PendingExpiry {
                ticket,
                handle: task.abort_handle(),
            },
        );
        if let Some(previous) = previous {
            previous.handle.abort();
        }
    }

    /// Abort the timer pending for `session_id`. Returns whether one was pending.
    pub fn cancel(&self, session_id: SessionId) -> bool {
        match self.pending.remove(&session_id) {
            Some((_, pending)) => {
                pending.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Forget the timer of `session_id` once it fired, unless it was replaced.
    pub fn complete(&self, session_id: SessionId, ticket: ExpiryTicket) {
        self.pending
            .remove_if(&session_id, |_, pending| pending.ticket == ticket);
    }

    /// Whether a timer is pending for `session_id`.
    pub fn is_pending(&self, session_id: SessionId) -> bool {
        self.pending.contains_key(&session_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use uuid::Uuid;

    use super::*;
    use crate::state::round::Round;

    fn ticket() -> ExpiryTicket {
        Round::new(1, Duration::from_millis(300)).arm_expiry()
    }

    #[tokio::test(start_paused = true)]
    async fn fires_after_delay() {
        let timers = ExpiryTimers::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let session = Uuid::new_v4();
        let counter = fired.clone();

        timers.schedule(session, ticket(), Duration::from_secs(20), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(timers.is_pending(session));

        sleep(Duration::from_secs(19)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(2)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_firing() {
        let timers = ExpiryTimers::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let session = Uuid::new_v4();
        let counter = fired.clone();

        timers.schedule(session, ticket(), Duration::from_secs(20), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(timers.cancel(session));
        assert!(!timers.cancel(session));

        sleep(Duration::from_secs(30)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduling_replaces_the_previous_timer() {
        let timers = ExpiryTimers::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let session = Uuid::new_v4();

        for _ in 0..2 {
            let counter = fired.clone();
            timers.schedule(session, ticket(), Duration::from_secs(5), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }

        sleep(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn complete_ignores_replaced_timers() {
        let timers = ExpiryTimers::new();
        let session = Uuid::new_v4();
        let mut round = Round::new(1, Duration::from_millis(300));
        let stale = round.arm_expiry();
        round.unlock();
        let fresh = round.arm_expiry();

        timers.schedule(session, fresh, Duration::from_secs(60), async {});
        timers.complete(session, stale);
        assert!(timers.is_pending(session));

        timers.complete(session, fresh);
        assert!(!timers.is_pending(session));
    }
}

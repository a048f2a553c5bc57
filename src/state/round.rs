use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::state::{ParticipantId, RoomId};

/// Phases a buzzer round cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundPhase {
    /// Buzzes are accepted.
    Open,
    /// Buzzes are rejected until the round is unlocked or reset.
    Locked,
}

/// Reasons a buzz is not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BuzzRejection {
    /// The round is locked.
    #[error("round is locked")]
    Late,
    /// The participant pressed again inside the cooldown window.
    #[error("buzz arrived inside the cooldown window")]
    Cooldown,
    /// The participant already buzzed during this cycle.
    #[error("participant already buzzed this cycle")]
    Duplicate,
}

/// Errors raised by operator actions on a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoundError {
    /// Lock requested while the round is already locked.
    #[error("round is already locked")]
    AlreadyLocked,
}

/// Token handed out when the auto-expiry of a cycle is armed.
///
/// A ticket only consumes the cycle it was issued for, so a timer that
/// outlives its cycle is harmless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryTicket {
    cycle: u64,
}

/// One recorded buzz.
#[derive(Debug, Clone, PartialEq)]
pub struct Buzz {
    /// Who buzzed.
    pub participant_id: ParticipantId,
    /// Display name at the time of the buzz.
    pub display_name: String,
    /// Offset from the first buzz of the cycle, rounded to the millisecond.
    pub delta: Duration,
}

impl Buzz {
    /// Offset from the first buzz, in seconds.
    pub fn delta_secs(&self) -> f64 {
        self.delta.as_secs_f64()
    }
}

/// Result of an accepted buzz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuzzAccepted {
    /// Whether this buzz opened the cycle.
    pub first: bool,
    /// Offset from the first buzz.
    pub delta: Duration,
}

/// State machine for a single buzzer session.
#[derive(Debug, Clone)]
pub struct Round {
    room_id: RoomId,
    phase: RoundPhase,
    buzzes: Vec<Buzz>,
    anchor: Option<Instant>,
    last_buzz: HashMap<ParticipantId, Instant>,
    expiry_armed: bool,
    cycle: u64,
    cooldown: Duration,
}

impl Round {
    /// Create an open round for `room_id` with the given debounce window.
    pub fn new(room_id: RoomId, cooldown: Duration) -> Self {
        Self {
            room_id,
            phase: RoundPhase::Open,
            buzzes: Vec::new(),
            anchor: None,
            last_buzz: HashMap::new(),
            expiry_armed: false,
            cycle: 0,
            cooldown,
        }
    }

    /// Room the session belongs to.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Current phase.
    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// Whether new buzzes are rejected.
    pub fn is_locked(&self) -> bool {
        self.phase == RoundPhase::Locked
    }

    /// Buzzes of the current cycle in arrival order.
    pub fn buzzes(&self) -> &[Buzz] {
        &self.buzzes
    }

    /// Whether an auto-expiry is armed for the current cycle.
    pub fn is_expiry_armed(&self) -> bool {
        self.expiry_armed
    }

    /// Record a buzz, or explain why it was ignored.
    pub fn submit_buzz(
        &mut self,
        participant_id: ParticipantId,
        display_name: &str,
        now: Instant,
    ) -> Result<BuzzAccepted, BuzzRejection> {
        if self.is_locked() {
            return Err(BuzzRejection::Late);
        }

        let cooling_down = self
            .last_buzz
            .get(&participant_id)
            .is_some_and(|last| now.saturating_duration_since(*last) < self.cooldown);
        if cooling_down {
            return Err(BuzzRejection::Cooldown);
        }

        if self
            .buzzes
            .iter()
            .any(|buzz| buzz.participant_id == participant_id)
        {
            return Err(BuzzRejection::Duplicate);
        }

        self.last_buzz.insert(participant_id, now);

        let (first, delta) = match self.anchor {
            None => {
                self.anchor = Some(now);
                (true, Duration::ZERO)
            }
            Some(anchor) => (false, round_to_millis(now.saturating_duration_since(anchor))),
        };

        self.buzzes.push(Buzz {
            participant_id,
            display_name: display_name.to_string(),
            delta,
        });

        Ok(BuzzAccepted { first, delta })
    }

    /// Arm the auto-expiry for the current cycle.
    pub fn arm_expiry(&mut self) -> ExpiryTicket {
        self.expiry_armed = true;
        ExpiryTicket { cycle: self.cycle }
    }

    /// Stop accepting buzzes. A pending auto-expiry is disarmed.
    pub fn lock(&mut self) -> Result<(), RoundError> {
        if self.is_locked() {
            return Err(RoundError::AlreadyLocked);
        }
        self.phase = RoundPhase::Locked;
        self.expiry_armed = false;
        Ok(())
    }

    /// Clear the cycle and reopen the round.
    pub fn unlock(&mut self) {
        self.reset_cycle();
    }

    /// Start over with a fresh cycle. Tickets issued before the reset stay stale.
    pub fn reset(&mut self) {
        self.reset_cycle();
    }

    /// Consume the armed expiry for `ticket`, returning the buzzes of the
    /// finished cycle. The round is reopened with a cleared history.
    ///
    /// Returns `None` when nobody buzzed, when the expiry was already
    /// consumed or disarmed, or when the ticket belongs to an earlier cycle.
    pub fn take_expired(&mut self, ticket: ExpiryTicket) -> Option<Vec<Buzz>> {
        if !self.expiry_armed || ticket.cycle != self.cycle || self.buzzes.is_empty() {
            return None;
        }

        let finished = std::mem::take(&mut self.buzzes);
        self.reset_cycle();
        Some(finished)
    }

    fn reset_cycle(&mut self) {
        self.phase = RoundPhase::Open;
        self.buzzes.clear();
        self.anchor = None;
        self.last_buzz.clear();
        self.expiry_armed = false;
        self.cycle += 1;
    }
}

fn round_to_millis(elapsed: Duration) -> Duration {
    let millis = (elapsed.as_micros() + 500) / 1_000;
    Duration::from_millis(u64::try_from(millis).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COOLDOWN: Duration = Duration::from_millis(300);

    fn at(base: Instant, millis: u64) -> Instant {
        base + Duration::from_millis(millis)
    }

    #[test]
    fn new_round_is_open_and_empty() {
        let round = Round::new(-100, COOLDOWN);
        assert_eq!(round.phase(), RoundPhase::Open);
        assert!(round.buzzes().is_empty());
        assert!(!round.is_expiry_armed());
        assert_eq!(round.room_id(), -100);
    }

    #[test]
    fn arrival_order_and_deltas_follow_first_buzz() {
        let base = Instant::now();
        let mut round = Round::new(1, COOLDOWN);

        let first = round.submit_buzz(10, "Ada", base).unwrap();
        assert!(first.first);
        assert_eq!(first.delta, Duration::ZERO);

        round.submit_buzz(20, "Grace", at(base, 400)).unwrap();
        round.submit_buzz(30, "Linus", at(base, 1_200)).unwrap();
        round.submit_buzz(40, "Ken", at(base, 1_200)).unwrap();

        let ids: Vec<_> = round.buzzes().iter().map(|b| b.participant_id).collect();
        assert_eq!(ids, vec![10, 20, 30, 40]);

        let deltas: Vec<_> = round.buzzes().iter().map(|b| b.delta).collect();
        assert_eq!(
            deltas,
            vec![
                Duration::ZERO,
                Duration::from_millis(400),
                Duration::from_millis(1_200),
                Duration::from_millis(1_200),
            ]
        );
        assert!(deltas.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn deltas_are_rounded_to_the_millisecond() {
        let base = Instant::now();
        let mut round = Round::new(1, COOLDOWN);
        round.submit_buzz(1, "a", base).unwrap();

        let accepted = round
            .submit_buzz(2, "b", base + Duration::from_micros(1_234_567))
            .unwrap();
        assert_eq!(accepted.delta, Duration::from_millis(1_235));

        let accepted = round
            .submit_buzz(3, "c", base + Duration::from_micros(1_500_400))
            .unwrap();
        assert_eq!(accepted.delta, Duration::from_millis(1_500));
    }

    #[test]
    fn double_tap_inside_cooldown_is_absorbed() {
        let base = Instant::now();
        let mut round = Round::new(1, COOLDOWN);

        round.submit_buzz(7, "Ada", base).unwrap();
        let err = round.submit_buzz(7, "Ada", at(base, 200)).unwrap_err();

        assert_eq!(err, BuzzRejection::Cooldown);
        assert_eq!(round.buzzes().len(), 1);
    }

    #[test]
    fn second_buzz_in_same_cycle_is_a_duplicate() {
        let base = Instant::now();
        let mut round = Round::new(1, COOLDOWN);

        round.submit_buzz(7, "Ada", base).unwrap();
        let err = round.submit_buzz(7, "Ada", at(base, 5_000)).unwrap_err();

        assert_eq!(err, BuzzRejection::Duplicate);
        assert_eq!(round.buzzes().len(), 1);
    }

    #[test]
    fn locked_round_rejects_late_buzzes() {
        let base = Instant::now();
        let mut round = Round::new(1, COOLDOWN);
        round.submit_buzz(1, "a", base).unwrap();
        round.lock().unwrap();

        let err = round.submit_buzz(2, "b", at(base, 100)).unwrap_err();
        assert_eq!(err, BuzzRejection::Late);
        assert_eq!(round.buzzes().len(), 1);
    }

    #[test]
    fn locking_twice_is_rejected() {
        let mut round = Round::new(1, COOLDOWN);
        round.lock().unwrap();
        assert_eq!(round.lock(), Err(RoundError::AlreadyLocked));
    }

    #[test]
    fn unlock_clears_the_cycle_and_cooldowns() {
        let base = Instant::now();
        let mut round = Round::new(1, COOLDOWN);
        round.submit_buzz(1, "a", base).unwrap();
        round.arm_expiry();
        round.lock().unwrap();

        round.unlock();

        assert_eq!(round.phase(), RoundPhase::Open);
        assert!(round.buzzes().is_empty());
        assert!(!round.is_expiry_armed());

        // The cooldown map is cleared, so an immediate buzz is accepted.
        let accepted = round.submit_buzz(1, "a", at(base, 50)).unwrap();
        assert!(accepted.first);
    }

    #[test]
    fn expiry_without_buzzes_is_skipped() {
        let mut round = Round::new(1, COOLDOWN);
        let ticket = round.arm_expiry();

        assert!(round.take_expired(ticket).is_none());
        assert!(round.is_expiry_armed());
    }

    #[test]
    fn expiry_consumes_the_cycle_once() {
        let base = Instant::now();
        let mut round = Round::new(1, COOLDOWN);
        round.submit_buzz(1, "a", base).unwrap();
        let ticket = round.arm_expiry();
        round.submit_buzz(2, "b", at(base, 300)).unwrap();

        let finished = round.take_expired(ticket).unwrap();
        assert_eq!(finished.len(), 2);
        assert_eq!(round.phase(), RoundPhase::Open);
        assert!(round.buzzes().is_empty());

        assert!(round.take_expired(ticket).is_none());
    }

    #[test]
    fn lock_disarms_pending_expiry() {
        let base = Instant::now();
        let mut round = Round::new(1, COOLDOWN);
        round.submit_buzz(1, "a", base).unwrap();
        let ticket = round.arm_expiry();

        round.lock().unwrap();

        assert!(round.take_expired(ticket).is_none());
        assert!(round.is_locked());
        assert_eq!(round.buzzes().len(), 1);
    }

    #[test]
    fn stale_ticket_does_not_expire_a_later_cycle() {
        let base = Instant::now();
        let mut round = Round::new(1, COOLDOWN);
        round.submit_buzz(1, "a", base).unwrap();
        let stale = round.arm_expiry();

        round.unlock();
        round.submit_buzz(2, "b", at(base, 1_000)).unwrap();
        let fresh = round.arm_expiry();

        assert!(round.take_expired(stale).is_none());
        assert_eq!(round.buzzes().len(), 1);
        assert!(round.take_expired(fresh).is_some());
    }
}

pub mod orchestrator;
pub mod participants;
pub mod registry;
pub mod round;
pub mod scoreboard;
mod sse;
pub mod streaks;
mod timer;

use std::sync::Arc;

use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::AppConfig;

pub use self::sse::SseHub;
pub use self::timer::ExpiryTimers;
use self::orchestrator::Orchestrator;

/// Chat room identifier (negative for group chats on most platforms).
pub type RoomId = i64;
/// Participant identifier as issued by the chat platform.
pub type ParticipantId = i64;
/// Opaque identifier of one buzzer session.
pub type SessionId = Uuid;

pub type SharedState = Arc<AppState>;

/// Capacity of the rendering broadcast channel.
const RENDER_CHANNEL_CAPACITY: usize = 64;

/// Central application state: configuration, game stores, timers and the render hub.
///
/// Every game mutation runs while holding the `game` lock and performs no I/O,
/// so events are applied one at a time and never observed half-done.
pub struct AppState {
    config: Arc<AppConfig>,
    game: Mutex<Orchestrator>,
    timers: ExpiryTimers,
    render: SseHub,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        let game = Orchestrator::new(config.round_rules());
        Arc::new(Self {
            config: Arc::new(config),
            game: Mutex::new(game),
            timers: ExpiryTimers::new(),
            render: SseHub::new(RENDER_CHANNEL_CAPACITY),
        })
    }

    /// Access the immutable runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// Pending auto-expiry timers.
    pub fn timers(&self) -> &ExpiryTimers {
        &self.timers
    }

    /// Broadcast hub carrying rendering instructions.
    pub fn render_sse(&self) -> &SseHub {
        &self.render
    }

    /// Run `f` with exclusive access to the game stores.
    pub async fn with_game<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&mut Orchestrator) -> T,
    {
        let mut guard = self.game.lock().await;
        f(&mut guard)
    }

    /// Run `f` with shared access to the game stores.
    pub async fn read_game<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&Orchestrator) -> T,
    {
        let guard = self.game.lock().await;
        f(&guard)
    }
}

//! Application-level configuration loading: admin allow-list and round tunables.

use std::{collections::HashSet, env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::state::{ParticipantId, orchestrator::RoundRules};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "BUZZINGA_BACK_CONFIG_PATH";
/// Environment variable holding a comma separated admin allow-list.
const ADMIN_IDS_ENV: &str = "ADMIN_IDS";

const DEFAULT_AUTO_EXPIRY: Duration = Duration::from_secs(20);
const DEFAULT_PHOTO_FINISH: Duration = Duration::from_millis(1_000);

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    admin_ids: HashSet<ParticipantId>,
    rules: RoundRules,
    auto_expiry: Duration,
    photo_finish_threshold: Duration,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to built-in defaults,
    /// then apply the `ADMIN_IDS` override.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let mut config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        admins = app_config.admin_ids.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        if let Ok(raw_ids) = env::var(ADMIN_IDS_ENV) {
            config.admin_ids = parse_admin_ids(&raw_ids);
            info!(admins = config.admin_ids.len(), "admin allow-list taken from environment");
        }
        if config.admin_ids.is_empty() {
            warn!("admin allow-list is empty; privileged actions will be refused");
        }

        config
    }

    /// Replace the admin allow-list.
    pub fn with_admins<I>(mut self, admins: I) -> Self
    where
        I: IntoIterator<Item = ParticipantId>,
    {
        self.admin_ids = admins.into_iter().collect();
        self
    }

    /// Whether `participant_id` may lock, unlock, reset and manage scores.
    pub fn is_admin(&self, participant_id: ParticipantId) -> bool {
        self.admin_ids.contains(&participant_id)
    }

    /// Round bookkeeping tunables.
    pub fn round_rules(&self) -> RoundRules {
        self.rules.clone()
    }

    /// Delay between the first buzz of a cycle and its automatic expiry.
    pub fn auto_expiry(&self) -> Duration {
        self.auto_expiry
    }

    /// Gap under which a buzz is flagged as a photo finish.
    pub fn photo_finish_threshold(&self) -> Duration {
        self.photo_finish_threshold
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin_ids: HashSet::new(),
            rules: RoundRules::default(),
            auto_expiry: DEFAULT_AUTO_EXPIRY,
            photo_finish_threshold: DEFAULT_PHOTO_FINISH,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    admin_ids: Vec<ParticipantId>,
    buzz_cooldown_ms: Option<u64>,
    auto_expiry_secs: Option<u64>,
    photo_finish_threshold_ms: Option<u64>,
    change_log_capacity: Option<usize>,
    leaderboard_size: Option<usize>,
    streak_milestones: Option<Vec<u32>>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = RoundRules::default();
        let rules = RoundRules {
            cooldown: value
                .buzz_cooldown_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.cooldown),
            streak_milestones: value
                .streak_milestones
                .unwrap_or(defaults.streak_milestones),
            change_log_capacity: value
                .change_log_capacity
                .unwrap_or(defaults.change_log_capacity),
            leaderboard_size: value.leaderboard_size.unwrap_or(defaults.leaderboard_size),
        };

        Self {
            admin_ids: value.admin_ids.into_iter().collect(),
            rules,
            auto_expiry: value
                .auto_expiry_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_AUTO_EXPIRY),
            photo_finish_threshold: value
                .photo_finish_threshold_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_PHOTO_FINISH),
        }
    }
}

/// Parse a comma separated list of ids, skipping blank and malformed entries.
fn parse_admin_ids(raw: &str) -> HashSet<ParticipantId> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<ParticipantId>() {
            Ok(id) => Some(id),
            Err(err) => {
                warn!(entry, error = %err, "ignoring malformed admin id");
                None
            }
        })
        .collect()
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_ids_parse_and_skip_garbage() {
        let ids = parse_admin_ids(" 12, -5,,abc , 7 ");
        assert_eq!(ids, HashSet::from([12, -5, 7]));
    }

    #[test]
    fn raw_config_overrides_only_given_fields() {
        let raw: RawConfig =
            serde_json::from_str(r#"{ "admin_ids": [1, 2], "auto_expiry_secs": 30 }"#).unwrap();
        let config = AppConfig::from(raw);

        assert!(config.is_admin(1));
        assert!(!config.is_admin(3));
        assert_eq!(config.auto_expiry(), Duration::from_secs(30));
        assert_eq!(config.round_rules(), RoundRules::default());
        assert_eq!(config.photo_finish_threshold(), DEFAULT_PHOTO_FINISH);
    }

    #[test]
    fn defaults_match_the_classic_game() {
        let config = AppConfig::default();
        let rules = config.round_rules();
        assert_eq!(rules.cooldown, Duration::from_millis(300));
        assert_eq!(rules.streak_milestones, vec![3, 5, 10]);
        assert_eq!(rules.change_log_capacity, 3);
        assert_eq!(rules.leaderboard_size, 3);
        assert_eq!(config.auto_expiry(), Duration::from_secs(20));
    }
}

//! Daemon configuration, loaded from YAML.

use anyhow::{Context, Result};
use gambit_engine::{notices, reaper, ReapConfig, TickConfig};
use gambit_types::MessageId;
use serde::Deserialize;
use std::path::Path;

/// Synthetic-load parameters for standalone runs.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadConfig {
    /// Human users to seed.
    pub users: usize,
    /// Bot users to seed.
    pub bots: usize,
    /// Active games to seed.
    pub games: usize,
    /// Seed for the deterministic event generator.
    pub seed: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            users: 40,
            bots: 8,
            games: 6,
            seed: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Seconds between maintenance ticks.
    pub tick_interval_secs: u64,
    /// Sessions idle for longer than this are reaped.
    pub session_idle_secs: u64,
    /// Retention for temporary notices.
    pub notice_retention_secs: u64,
    /// Whether a linked discussion service is configured. When set, reaped
    /// users also get their last-viewed-message marker advanced.
    pub forum: bool,
    pub load: LoadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_interval_secs: 5,
            session_idle_secs: reaper::DEFAULT_IDLE_SECS,
            notice_retention_secs: notices::DEFAULT_RETENTION_SECS,
            forum: true,
            load: LoadConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        serde_yaml::from_str(&raw)
            .with_context(|| format!("failed to parse config {}", path.display()))
    }

    /// The engine-facing tick parameters, given the discussion service's
    /// current head message.
    pub fn tick_config(&self, forum_head: Option<MessageId>) -> TickConfig {
        TickConfig {
            reap: ReapConfig {
                idle_secs: self.session_idle_secs,
                forum_head: if self.forum { forum_head } else { None },
            },
            notice_retention_secs: self.notice_retention_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_maintenance_constants() {
        let config = Config::default();
        assert_eq!(config.session_idle_secs, 600);
        assert_eq!(config.notice_retention_secs, 7 * 24 * 60 * 60);
    }

    #[test]
    fn parses_partial_yaml() {
        let config: Config =
            serde_yaml::from_str("tick_interval_secs: 60\nload:\n  games: 2\n").expect("parse");
        assert_eq!(config.tick_interval_secs, 60);
        assert_eq!(config.load.games, 2);
        // Unspecified fields keep their defaults.
        assert_eq!(config.session_idle_secs, 600);
    }

    #[test]
    fn forum_flag_gates_the_head_marker() {
        let mut config = Config::default();
        config.forum = false;
        assert_eq!(config.tick_config(Some(MessageId(5))).reap.forum_head, None);
        config.forum = true;
        assert_eq!(
            config.tick_config(Some(MessageId(5))).reap.forum_head,
            Some(MessageId(5))
        );
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(serde_yaml::from_str::<Config>("tick_seconds: 60\n").is_err());
    }
}

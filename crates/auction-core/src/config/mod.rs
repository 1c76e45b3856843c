//! Configuration types for the auction server manager
//!
//! - [`ConfigNode`]: The persisted configuration tree servers are loaded from
//! - [`ConfigFile`]: Durable JSON storage for a configuration tree
//! - [`ManagerConfig`]: Runtime settings for the manager itself

pub mod node;
pub mod file;

pub use node::ConfigNode;
pub use file::ConfigFile;

use serde::{Deserialize, Serialize};

/// Bus topic the time-sync coordinator listens on
pub const AUCTION_MANAGER_TOPIC: &str = "auction_manager";

/// Bus topic that receives human-readable status notifications
pub const UI_NOTIFY_TOPIC: &str = "Swing";

/// Command that requests a time resynchronization
pub const TIMECHECK_COMMAND: &str = "TIMECHECK";

/// Main manager configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Time synchronization settings
    #[serde(default)]
    pub time_sync: TimeSyncConfig,
}

impl ManagerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.time_sync.validate()
    }
}

/// How duplicate TIMECHECK commands are removed from the queue
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DrainPolicy {
    /// Dequeue until a non-duplicate appears, then put it back at the tail
    ///
    /// A requeued message moves behind anything enqueued during the drain.
    #[default]
    DrainAndRequeue,

    /// Only remove duplicates seen at the head; never reorder
    PeekAndDiscard,
}

impl std::str::FromStr for DrainPolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "drain_and_requeue" => Ok(Self::DrainAndRequeue),
            "peek_and_discard" => Ok(Self::PeekAndDiscard),
            other => Err(crate::Error::config(format!(
                "Unknown drain policy '{}'. Valid: drain_and_requeue, peek_and_discard",
                other
            ))),
        }
    }
}

/// Time synchronization settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSyncConfig {
    /// Topic the coordinator subscribes to
    #[serde(default = "default_topic")]
    pub topic: String,

    /// Topic that receives the "Server time is now" status
    ///
    /// One status line is enqueued per time check. The host must register
    /// a listener on this topic, or the queue grows without bound.
    #[serde(default = "default_notify_topic")]
    pub notify_topic: String,

    /// Command value that triggers a time check
    #[serde(default = "default_command")]
    pub command: String,

    /// Duplicate removal strategy
    #[serde(default)]
    pub drain_policy: DrainPolicy,

    /// Interval for the periodic TIMECHECK producer (0 disables it)
    #[serde(default)]
    pub check_interval_secs: u64,
}

impl TimeSyncConfig {
    /// Validate the time sync configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.topic.is_empty() {
            return Err(crate::Error::config("Time sync topic cannot be empty"));
        }
        if self.notify_topic.is_empty() {
            return Err(crate::Error::config("Time sync notify topic cannot be empty"));
        }
        if self.topic == self.notify_topic {
            return Err(crate::Error::config(format!(
                "Time sync topic and notify topic must differ (both '{}')",
                self.topic
            )));
        }
        if self.command.is_empty() {
            return Err(crate::Error::config("Time sync command cannot be empty"));
        }
        Ok(())
    }
}

impl Default for TimeSyncConfig {
    fn default() -> Self {
        Self {
            topic: default_topic(),
            notify_topic: default_notify_topic(),
            command: default_command(),
            drain_policy: DrainPolicy::default(),
            check_interval_secs: 0,
        }
    }
}

fn default_topic() -> String {
    AUCTION_MANAGER_TOPIC.to_string()
}

fn default_notify_topic() -> String {
    UI_NOTIFY_TOPIC.to_string()
}

fn default_command() -> String {
    TIMECHECK_COMMAND.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = ManagerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.time_sync.topic, "auction_manager");
        assert_eq!(config.time_sync.notify_topic, "Swing");
        assert_eq!(config.time_sync.drain_policy, DrainPolicy::DrainAndRequeue);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let config: ManagerConfig =
            serde_json::from_str(r#"{ "time_sync": { "drain_policy": "peek_and_discard" } }"#)
                .unwrap();
        assert_eq!(config.time_sync.drain_policy, DrainPolicy::PeekAndDiscard);
        assert_eq!(config.time_sync.command, "TIMECHECK");
    }

    #[test]
    fn same_topic_for_listen_and_notify_is_rejected() {
        let mut config = TimeSyncConfig::default();
        config.notify_topic = config.topic.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn drain_policy_parses_from_env_style_strings() {
        assert_eq!("peek_and_discard".parse::<DrainPolicy>().unwrap(), DrainPolicy::PeekAndDiscard);
        assert!("fifo".parse::<DrainPolicy>().is_err());
    }
}

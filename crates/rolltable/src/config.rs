//! Host configuration.

use std::path::PathBuf;
use std::time::Duration;

use rolltable_protocol::RoomSettings;

/// Everything needed to start a host.
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// Room name. Also the snapshot key.
    pub room_name: String,
    pub host_nick: String,
    pub host_avatar: Option<String>,
    /// Snapshot directory. `None` keeps the room in memory only.
    pub data_dir: Option<PathBuf>,
    /// Settings for a newly created room. A restored room keeps its own.
    pub settings: RoomSettings,
    /// How often idle autoclear tables are checked.
    pub sweep_interval: Duration,
    /// Capacity of the host actor's command channel.
    pub command_buffer: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_name: "table".to_string(),
            host_nick: "DM".to_string(),
            host_avatar: None,
            data_dir: None,
            settings: RoomSettings::default(),
            sweep_interval: Duration::from_secs(1),
            command_buffer: 256,
        }
    }
}

/// Snapshot directory used by [`HostConfig::from_env`] when
/// `ROLLTABLE_DATA_DIR` is unset.
pub const DEFAULT_DATA_DIR: &str = "rolltable-data";

impl HostConfig {
    /// Reads `ROLLTABLE_BIND`, `ROLLTABLE_ROOM`, `ROLLTABLE_HOST_NICK` and
    /// `ROLLTABLE_DATA_DIR`. Unset or blank variables keep their defaults;
    /// `ROLLTABLE_DATA_DIR=""` explicitly turns persistence off.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// [`from_env`](Self::from_env) with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(bind) = non_blank("ROLLTABLE_BIND") {
            config.bind_addr = bind;
        }
        if let Some(room) = non_blank("ROLLTABLE_ROOM") {
            config.room_name = room;
        }
        if let Some(nick) = non_blank("ROLLTABLE_HOST_NICK") {
            config.host_nick = nick;
        }
        config.data_dir = match lookup("ROLLTABLE_DATA_DIR") {
            None => Some(PathBuf::from(DEFAULT_DATA_DIR)),
            Some(dir) if dir.trim().is_empty() => None,
            Some(dir) => Some(PathBuf::from(dir.trim())),
        };
        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_env_defaults() {
        let config = HostConfig::from_lookup(lookup(&[]));
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.room_name, "table");
        assert_eq!(config.host_nick, "DM");
        assert_eq!(config.data_dir, Some(PathBuf::from(DEFAULT_DATA_DIR)));
    }

    #[test]
    fn test_env_overrides() {
        let config = HostConfig::from_lookup(lookup(&[
            ("ROLLTABLE_BIND", "0.0.0.0:9000"),
            ("ROLLTABLE_ROOM", " crypt "),
            ("ROLLTABLE_HOST_NICK", "Keeper"),
            ("ROLLTABLE_DATA_DIR", "/var/lib/rolltable"),
        ]));
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.room_name, "crypt");
        assert_eq!(config.host_nick, "Keeper");
        assert_eq!(config.data_dir, Some(PathBuf::from("/var/lib/rolltable")));
    }

    #[test]
    fn test_blank_data_dir_disables_persistence() {
        let config = HostConfig::from_lookup(lookup(&[("ROLLTABLE_DATA_DIR", "")]));
        assert!(config.data_dir.is_none());
    }

    #[test]
    fn test_blank_values_keep_defaults() {
        let config = HostConfig::from_lookup(lookup(&[("ROLLTABLE_ROOM", "   ")]));
        assert_eq!(config.room_name, "table");
    }
}

//! Configuration system.
//!
//! Loads session configuration from JSON strings (file IO left to app).

use serde::{Deserialize, Serialize};

/// Root configuration shared by client and host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Session host address, e.g. `127.0.0.1:40600`.
    pub host_addr: String,
    /// Frame/simulation tick rate.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,
}

fn default_tick_hz() -> u32 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host_addr: "127.0.0.1:40600".to_string(),
            tick_hz: default_tick_hz(),
        }
    }
}

impl SessionConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tick_rate_defaults_when_absent() {
        let cfg = SessionConfig::from_json_str(r#"{"host_addr":"10.0.0.1:41000"}"#).unwrap();
        assert_eq!(cfg.host_addr, "10.0.0.1:41000");
        assert_eq!(cfg.tick_hz, 60);
    }
}

//! Per-device settings and JSON persistence.

use std::path::Path;
use std::time::Duration;
use std::{fs, io};

use serde::{Deserialize, Serialize};

/// Tunables for a [`Device`](crate::Device).
///
/// Missing fields fall back to their defaults when loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
#[non_exhaustive]
pub struct DeviceConfig {
    /// Connection timeout in milliseconds; `None` leaves it to the connector.
    pub timeout_ms: Option<u64>,
    /// How long [`Device::wait_ready`](crate::Device::wait_ready) waits.
    pub boot_timeout_secs: u64,
    /// Delay between boot-completion polls, in milliseconds.
    pub boot_poll_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            boot_timeout_secs: 60,
            boot_poll_ms: 1000,
        }
    }
}

impl DeviceConfig {
    /// Loads settings from a JSON file.
    pub fn load(path: &Path) -> io::Result<Self> {
        let data = fs::read_to_string(path)?;
        serde_json::from_str(&data).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    /// Writes settings to a JSON file.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let file = fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self).map_err(io::Error::other)
    }

    /// Connection timeout, if one is configured.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Boot wait deadline.
    pub const fn boot_timeout(&self) -> Duration {
        Duration::from_secs(self.boot_timeout_secs)
    }

    /// Boot poll interval.
    pub const fn boot_poll_interval(&self) -> Duration {
        Duration::from_millis(self.boot_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");
        let cfg = DeviceConfig {
            timeout_ms: Some(2500),
            boot_timeout_secs: 90,
            boot_poll_ms: 250,
        };
        cfg.save(&path).unwrap();
        assert_eq!(DeviceConfig::load(&path).unwrap(), cfg);
    }

    #[test]
    fn missing_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");
        fs::write(&path, r#"{"boot_poll_ms": 200}"#).unwrap();

        let cfg = DeviceConfig::load(&path).unwrap();
        assert_eq!(cfg.timeout(), None);
        assert_eq!(cfg.boot_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.boot_poll_interval(), Duration::from_millis(200));
    }

    #[test]
    fn rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("device.json");
        fs::write(&path, "not json").unwrap();
        let err = DeviceConfig::load(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}

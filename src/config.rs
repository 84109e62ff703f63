//! Store configuration persisted by the surrounding application.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tripcal_core::{StoreError, StoreResult};

const DEFAULT_UID_PREFIX: &str = "KIT";
const DEFAULT_SYNC_WINDOW_DAYS: i64 = 30;

fn default_uid_prefix() -> String {
    DEFAULT_UID_PREFIX.to_string()
}

fn default_sync_window_days() -> i64 {
    DEFAULT_SYNC_WINDOW_DAYS
}

/// Configuration at ~/.config/tripcal/config.toml
///
/// Records which provider calendar the store binds to, the uid namespace
/// stamped on events the application creates, and the width of the
/// default range query window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Provider id of the calendar events are written to; `None` until
    /// the user picked one from the directory listing.
    pub calendar_id: Option<i64>,

    /// Namespace tag for uids of events this application owns. Existing
    /// records keep their tag, so changing this orphans them.
    #[serde(default = "default_uid_prefix")]
    pub uid_prefix: String,

    /// Half-width in days of the default range query window.
    #[serde(default = "default_sync_window_days")]
    pub sync_window_days: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            calendar_id: None,
            uid_prefix: default_uid_prefix(),
            sync_window_days: default_sync_window_days(),
        }
    }
}

impl StoreConfig {
    pub fn config_path() -> StoreResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| StoreError::Config("Could not determine config directory".into()))?
            .join("tripcal");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: StoreConfig =
                toml::from_str(&content).map_err(|e| StoreError::Config(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| StoreError::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Default range query window: ±`sync_window_days` from now.
    pub fn sync_range(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (
            now - Duration::days(self.sync_window_days),
            now + Duration::days(self.sync_window_days),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: StoreConfig = toml::from_str("calendar_id = 7").unwrap();
        assert_eq!(config.calendar_id, Some(7));
        assert_eq!(config.uid_prefix, "KIT");
        assert_eq!(config.sync_window_days, 30);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let config = StoreConfig {
            calendar_id: Some(3),
            uid_prefix: "TRIP".to_string(),
            sync_window_days: 14,
        };
        config.save(&path).unwrap();

        let loaded = StoreConfig::load(&path).unwrap();
        assert_eq!(loaded.calendar_id, Some(3));
        assert_eq!(loaded.uid_prefix, "TRIP");
        assert_eq!(loaded.sync_window_days, 14);
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::load(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.calendar_id, None);
        assert_eq!(config.uid_prefix, "KIT");
    }

    #[test]
    fn test_sync_range_width() {
        let config = StoreConfig::default();
        let (from, to) = config.sync_range();
        assert_eq!(to - from, Duration::days(60));
    }
}

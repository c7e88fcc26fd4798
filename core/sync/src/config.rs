//! Persisted settings and the immutable per-run sync configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use notionsync_common::{ApiToken, Error, Result};

/// File name of the settings document inside the config directory.
pub const SETTINGS_FILE: &str = "settings.json";

/// User settings as stored on disk.
///
/// Unknown keys are ignored and missing keys fall back to their defaults, so
/// files written by older versions keep loading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Integration token.
    #[serde(rename = "notionAPI")]
    pub notion_api: String,
    /// Destination database.
    #[serde(rename = "databaseID")]
    pub database_id: String,
    /// Cover image applied to every created page.
    #[serde(rename = "bannerUrl")]
    pub banner_url: String,
    /// Public workspace name used to build `<name>.notion.site` links.
    #[serde(rename = "notionID")]
    pub notion_id: String,
    /// Send front-matter tags as the `Tags` multi-select.
    #[serde(rename = "allowTags")]
    pub allow_tags: bool,
    #[serde(rename = "requestIntervalMs")]
    pub request_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            notion_api: String::new(),
            database_id: String::new(),
            banner_url: String::new(),
            notion_id: String::new(),
            allow_tags: false,
            request_interval_ms: 500,
        }
    }
}

impl Settings {
    /// Names accepted by [`Settings::set`], in file order.
    pub const KEYS: [&'static str; 6] = [
        "notionAPI",
        "databaseID",
        "bannerUrl",
        "notionID",
        "allowTags",
        "requestIntervalMs",
    ];

    /// Default settings location, `<config dir>/notionsync/settings.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("notionsync").join(SETTINGS_FILE))
    }

    /// Load settings from `path`. A missing file yields the defaults.
    ///
    /// # Errors
    /// - I/O errors other than not-found
    /// - Malformed JSON
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read(path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No settings at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Write settings to `path`, creating its directory when needed.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    /// Update one setting by its stored name.
    ///
    /// # Errors
    /// - `Error::InvalidInput` for an unknown key or a value of the wrong type
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "notionAPI" => self.notion_api = value.to_string(),
            "databaseID" => self.database_id = value.to_string(),
            "bannerUrl" => self.banner_url = value.to_string(),
            "notionID" => self.notion_id = value.to_string(),
            "allowTags" => {
                self.allow_tags = value.parse().map_err(|_| {
                    Error::InvalidInput(format!("allowTags expects true or false, got {}", value))
                })?
            }
            "requestIntervalMs" => {
                self.request_interval_ms = value.parse().map_err(|_| {
                    Error::InvalidInput(format!(
                        "requestIntervalMs expects milliseconds, got {}",
                        value
                    ))
                })?
            }
            _ => {
                return Err(Error::InvalidInput(format!(
                    "Unknown setting {}; expected one of {}",
                    key,
                    Self::KEYS.join(", ")
                )))
            }
        }
        Ok(())
    }

    /// Copy with the token masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.notion_api.is_empty() {
            copy.notion_api = "[REDACTED]".to_string();
        }
        copy
    }
}

/// Configuration of one sync run, built once from [`Settings`].
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub token: ApiToken,
    pub database_id: String,
    pub banner_url: Option<String>,
    pub vanity_id: Option<String>,
    pub allow_tags: bool,
    pub request_interval: Duration,
}

impl SyncConfig {
    /// Validate settings and freeze them for a run.
    ///
    /// # Errors
    /// - `Error::ConfigurationMissing` if the token or database id is empty
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        if settings.notion_api.trim().is_empty() {
            return Err(Error::ConfigurationMissing(
                "notionAPI is not set".to_string(),
            ));
        }
        if settings.database_id.trim().is_empty() {
            return Err(Error::ConfigurationMissing(
                "databaseID is not set".to_string(),
            ));
        }

        Ok(Self {
            token: ApiToken::new(settings.notion_api.trim()),
            database_id: settings.database_id.trim().to_string(),
            banner_url: non_empty(&settings.banner_url),
            vanity_id: non_empty(&settings.notion_id),
            allow_tags: settings.allow_tags,
            request_interval: Duration::from_millis(settings.request_interval_ms),
        })
    }

    /// Same configuration aimed at another database.
    pub fn with_database(&self, database_id: impl Into<String>) -> Self {
        Self {
            database_id: database_id.into(),
            ..self.clone()
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn configured() -> Settings {
        Settings {
            notion_api: "secret_abc".to_string(),
            database_id: "db-1".to_string(),
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_missing_file_yields_defaults() {
        let temp = TempDir::new().unwrap();
        let settings = Settings::load(&temp.path().join("none.json")).await.unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.request_interval_ms, 500);
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(SETTINGS_FILE);

        let mut settings = configured();
        settings.allow_tags = true;
        settings.save(&path).await.unwrap();

        let loaded = Settings::load(&path).await.unwrap();
        assert_eq!(loaded, settings);

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(raw["notionAPI"], "secret_abc");
        assert_eq!(raw["allowTags"], true);
    }

    #[tokio::test]
    async fn test_partial_file_merges_over_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"databaseID": "db", "proxy": "ignored"}"#).unwrap();

        let settings = Settings::load(&path).await.unwrap();
        assert_eq!(settings.database_id, "db");
        assert_eq!(settings.request_interval_ms, 500);
        assert!(!settings.allow_tags);
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{not json").unwrap();

        assert!(matches!(
            Settings::load(&path).await,
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_set_values() {
        let mut settings = Settings::default();
        settings.set("bannerUrl", "https://img/banner.png").unwrap();
        settings.set("allowTags", "true").unwrap();
        settings.set("requestIntervalMs", "250").unwrap();
        assert_eq!(settings.banner_url, "https://img/banner.png");
        assert!(settings.allow_tags);
        assert_eq!(settings.request_interval_ms, 250);

        assert!(settings.set("allowTags", "yes").is_err());
        assert!(settings.set("proxy", "x").is_err());
    }

    #[test]
    fn test_redacted_hides_token() {
        let shown = configured().redacted();
        assert_eq!(shown.notion_api, "[REDACTED]");
        assert_eq!(Settings::default().redacted().notion_api, "");
    }

    #[test]
    fn test_sync_config_requires_credentials() {
        let err = SyncConfig::from_settings(&Settings::default()).unwrap_err();
        assert!(matches!(err, Error::ConfigurationMissing(_)));

        let mut settings = configured();
        settings.database_id = "  ".to_string();
        assert!(matches!(
            SyncConfig::from_settings(&settings),
            Err(Error::ConfigurationMissing(_))
        ));
    }

    #[test]
    fn test_sync_config_from_settings() {
        let mut settings = configured();
        settings.notion_id = "me".to_string();
        settings.request_interval_ms = 100;

        let config = SyncConfig::from_settings(&settings).unwrap();
        assert_eq!(config.token.expose(), "secret_abc");
        assert_eq!(config.banner_url, None);
        assert_eq!(config.vanity_id.as_deref(), Some("me"));
        assert_eq!(config.request_interval, Duration::from_millis(100));

        let other = config.with_database("db-2");
        assert_eq!(other.database_id, "db-2");
        assert_eq!(config.database_id, "db-1");
    }
}

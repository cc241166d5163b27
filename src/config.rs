//! TOML configuration
//!
//! Read from `$HOME/.config/beatsmarket/config.toml`. Every key has a default,
//! so a missing file simply yields `AppConfig::default()`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Reserved filter value meaning "every style"
pub const ALL_STYLES: &str = "all";

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub site: SiteConfig,
    pub player: PlayerConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StoreConfig {
    pub endpoint: String,
    pub project_id: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub public_field: String,
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://firestore.googleapis.com/v1".to_string(),
            project_id: "beatsmarket".to_string(),
            api_key: None,
            collection: "beats".to_string(),
            public_field: "isPublic".to_string(),
            timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://beatsmarket.app".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub watermark_url: String,
    pub watermark_gain: f32,
    pub watermark_repeat_secs: Option<f32>,
    pub fetch_timeout_secs: u64,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            watermark_url: "/watermark.mp3".to_string(),
            watermark_gain: 0.2,
            watermark_repeat_secs: None,
            fetch_timeout_secs: 20,
        }
    }
}

impl PlayerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub styles: Vec<String>,
    /// Filter applied on startup: "all" or one of `styles`
    pub initial_style: String,
    pub currency: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            styles: ["Trap", "Drill", "RnB", "Boom Bap", "Afro", "Autre"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            initial_style: ALL_STYLES.to_string(),
            currency: "€".to_string(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.store.project_id.trim().is_empty() {
            bail!("store.project_id must not be empty");
        }
        if self.store.timeout_secs == 0 {
            bail!("store.timeout_secs must be positive");
        }
        if !(0.0..=1.0).contains(&self.player.watermark_gain) {
            bail!(
                "player.watermark_gain must be between 0 and 1, got {}",
                self.player.watermark_gain
            );
        }
        if self.player.fetch_timeout_secs == 0 {
            bail!("player.fetch_timeout_secs must be positive");
        }
        if let Some(secs) = self.player.watermark_repeat_secs {
            if secs.is_nan() || secs <= 0.0 {
                bail!("player.watermark_repeat_secs must be positive, got {}", secs);
            }
        }
        if self.catalog.styles.is_empty() {
            bail!("catalog.styles must list at least one style");
        }
        for (i, style) in self.catalog.styles.iter().enumerate() {
            if style.eq_ignore_ascii_case(ALL_STYLES) {
                bail!("catalog.styles may not contain the reserved value \"{}\"", ALL_STYLES);
            }
            if self.catalog.styles[..i].contains(style) {
                bail!("catalog.styles lists \"{}\" twice", style);
            }
        }
        let initial = &self.catalog.initial_style;
        if !initial.eq_ignore_ascii_case(ALL_STYLES) && !self.catalog.styles.contains(initial) {
            bail!("catalog.initial_style \"{}\" is not one of catalog.styles", initial);
        }
        Ok(())
    }
}

pub fn config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
        .join(".config")
        .join("beatsmarket")
        .join("config.toml")
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&config_path())
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        tracing::info!(path = %path.display(), "No config file, using defaults");
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;

    tracing::info!(path = %path.display(), "Config loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.catalog.styles.len(), 6);
        assert_eq!(config.player.watermark_url, "/watermark.mp3");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_config(
            r#"
            [catalog]
            styles = ["Trap", "Jersey Club"]

            [player]
            watermark_gain = 0.15
            "#,
        );
        let config = load_config_from(file.path()).unwrap();
        assert_eq!(config.catalog.styles, vec!["Trap", "Jersey Club"]);
        assert_eq!(config.catalog.currency, "€");
        assert!((config.player.watermark_gain - 0.15).abs() < f32::EPSILON);
        assert_eq!(config.store.collection, "beats");
    }

    #[test]
    fn rejects_gain_out_of_range() {
        let file = write_config("[player]\nwatermark_gain = 1.5\n");
        let err = load_config_from(file.path()).unwrap_err();
        assert!(format!("{:#}", err).contains("watermark_gain"));
    }

    #[test]
    fn rejects_reserved_and_duplicate_styles() {
        let mut config = AppConfig::default();
        config.catalog.styles = vec!["Trap".to_string(), "All".to_string()];
        assert!(config.validate().is_err());

        config.catalog.styles = vec!["Trap".to_string(), "Trap".to_string()];
        assert!(config.validate().is_err());

        config.catalog.styles.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_non_positive_repeat_interval() {
        let mut config = AppConfig::default();
        config.player.watermark_repeat_secs = Some(0.0);
        assert!(config.validate().is_err());
        config.player.watermark_repeat_secs = Some(8.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn initial_style_must_be_a_known_style() {
        let mut config = AppConfig::default();
        config.catalog.initial_style = "Drill".to_string();
        assert!(config.validate().is_ok());
        config.catalog.initial_style = "Polka".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let file = write_config("[store\nproject_id = ");
        assert!(load_config_from(file.path()).is_err());
    }
}

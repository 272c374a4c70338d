//! Scraper configuration module.
//!
//! Handles loading, validating, and merging the optional `nautilus.toml`
//! file. Stock defaults are overridden by the config file, which is in turn
//! overridden by command-line flags.
//!
//! ## Where It Is Read From
//!
//! `nautilus.toml` in the working directory is picked up automatically;
//! `--config <path>` points at any other file (which must then exist).
//!
//! ## Keys
//!
//! ```toml
//! # Every key is optional; defaults shown
//!
//! language = "eng"          # ISO-639-3 content language(s), comma-separated
//! # locale = "fr"           # UI locale (derived from language when unset)
//! tags = []                 # Package tags
//! creator = "Unknown"       # Content creator
//! publisher = "openZIM"     # Package publisher
//!
//! [ui]
//! pagination = 10           # Items per page in the UI
//! randomize = true          # Show items in random order on load
//! show_description = false  # Show item descriptions in the list
//! show_author = true        # Show item authors in the list
//!
//! [branding]
//! # favicon = "favicon.png"         # Path or URL, resized to 48x48
//! # main_logo = "logo.png"          # Path or URL, resized to fit 300x65
//! # secondary_logo = "footer.png"   # Path or URL, resized to fit 300x65
//! # main_color = "#95A5A6"          # Header color
//! # secondary_color = "#95A5A6"     # Secondary color
//! # about = "about.html"            # Path or URL of a custom about page
//!
//! [download]
//! delay_secs = 0.0          # Pause between two downloads
//! ```
//!
//! Unknown keys are rejected.

use crate::branding::{BrandingInput, is_hex_color};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File picked up from the working directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "nautilus.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Scraper configuration loaded from `nautilus.toml`.
///
/// All fields have defaults. Config files need only specify the values they
/// want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScraperConfig {
    /// ISO-639-3 language code(s) of the content, comma-separated.
    pub language: String,
    /// UI locale; derived from the first language when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    pub tags: Vec<String>,
    pub creator: String,
    pub publisher: String,
    pub ui: UiConfig,
    pub branding: BrandingConfig,
    pub download: DownloadConfig,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            language: "eng".to_string(),
            locale: None,
            tags: Vec::new(),
            creator: "Unknown".to_string(),
            publisher: "openZIM".to_string(),
            ui: UiConfig::default(),
            branding: BrandingConfig::default(),
            download: DownloadConfig::default(),
        }
    }
}

impl ScraperConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.language.trim().is_empty() {
            return Err(ConfigError::Validation("language must not be empty".into()));
        }
        if self.ui.pagination == 0 {
            return Err(ConfigError::Validation(
                "ui.pagination must be at least 1".into(),
            ));
        }
        if !self.download.delay_secs.is_finite() || self.download.delay_secs < 0.0 {
            return Err(ConfigError::Validation(
                "download.delay_secs must be a non-negative number".into(),
            ));
        }
        for (key, value) in [
            ("branding.main_color", &self.branding.main_color),
            ("branding.secondary_color", &self.branding.secondary_color),
        ] {
            if let Some(color) = value
                && !is_hex_color(color)
            {
                return Err(ConfigError::Validation(format!(
                    "{key} is not a valid hex color: {color}"
                )));
            }
        }
        Ok(())
    }
}

/// Client UI settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UiConfig {
    pub pagination: u32,
    pub randomize: bool,
    pub show_description: bool,
    pub show_author: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            pagination: 10,
            randomize: true,
            show_description: false,
            show_author: true,
        }
    }
}

/// Branding values. Each is optional; see [`crate::branding`] for defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrandingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
}

impl From<BrandingConfig> for BrandingInput {
    fn from(config: BrandingConfig) -> Self {
        BrandingInput {
            favicon: config.favicon,
            main_logo: config.main_logo,
            secondary_logo: config.secondary_logo,
            main_color: config.main_color,
            secondary_color: config.secondary_color,
            about: config.about,
        }
    }
}

/// Network download settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DownloadConfig {
    /// Seconds to wait between two consecutive downloads.
    pub delay_secs: f64,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self { delay_secs: 0.0 }
    }
}

/// Stock defaults as a TOML table: the bottom layer of every resolved config.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ScraperConfig::default())?)
}

/// Layer `overlay` over `base`. Sections merge key by key, so a file that
/// sets only `[ui] pagination` keeps every other `[ui]` default; any other
/// value replaces the base one.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut table), toml::Value::Table(layer)) => {
            for (key, value) in layer {
                let value = match table.remove(&key) {
                    Some(existing) => merge_toml(existing, value),
                    None => value,
                };
                table.insert(key, value);
            }
            toml::Value::Table(table)
        }
        (_, replacement) => replacement,
    }
}

/// Parse `path` as untyped TOML; `None` when there is no such file.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    Ok(Some(toml::from_str(&fs::read_to_string(path)?)?))
}

/// Typed, validated config from the defaults and an optional file layer.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ScraperConfig, ConfigError> {
    let layered = match overlay {
        Some(file) => merge_toml(base, file),
        None => base,
    };
    let config: ScraperConfig = layered.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// An explicit path must exist. Without one, `nautilus.toml` in `dir` is used
/// when present, stock defaults otherwise.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<ScraperConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            load_raw_config(path)?
        }
        None => load_raw_config(&dir.join(CONFIG_FILE_NAME))?,
    };
    resolve_config(stock_defaults_value()?, overlay)
}

/// Documented `nautilus.toml` printed by `gen-config`.
pub fn stock_config_toml() -> &'static str {
    r##"# Nautilus ZIM Configuration
# ==========================
# Every key is optional and shows its default value.
# Save as nautilus.toml in the working directory, or pass --config <path>.
# Command-line flags win over values set here; unknown keys are an error.

# ISO-639-3 language code(s) of the content, comma-separated.
language = "eng"

# UI locale (en, fr, es, pt...). Derived from the first language when unset.
# locale = "en"

# Package tags.
tags = []

# Name of the content creator.
creator = "Unknown"

# Package publisher.
publisher = "openZIM"

# ---------------------------------------------------------------------------
# Client UI
# ---------------------------------------------------------------------------
[ui]
# Number of items per page.
pagination = 10

# Show items in random order on the home page.
randomize = true

# Show item descriptions in the list.
show_description = false

# Show item authors in the list.
show_author = true

# ---------------------------------------------------------------------------
# Branding
# ---------------------------------------------------------------------------
# Images may be local paths or http(s) URLs.
[branding]
# Favicon, resized to 48x48. A plain one is generated otherwise.
# favicon = "favicon.png"

# Header logo, resized to fit 300x65.
# main_logo = "logo.png"

# Footer logo, resized to fit 300x65.
# secondary_logo = "footer-logo.png"

# Colors as #RRGGBB. Default to the main logo's dominant color,
# or #95A5A6 without a logo.
# main_color = "#95A5A6"
# secondary_color = "#95A5A6"

# Custom about page (HTML). Falls back to the archive's about.html,
# then to the description.
# about = "about.html"

# ---------------------------------------------------------------------------
# Downloads
# ---------------------------------------------------------------------------
[download]
# Seconds to wait between two consecutive downloads.
delay_secs = 0.0
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ScraperConfig::default();
        assert_eq!(config.language, "eng");
        assert_eq!(config.creator, "Unknown");
        assert_eq!(config.publisher, "openZIM");
        assert_eq!(config.ui.pagination, 10);
        assert!(config.ui.randomize);
        assert!(!config.ui.show_description);
        assert_eq!(config.download.delay_secs, 0.0);
    }

    #[test]
    fn parse_partial_config() {
        let config: ScraperConfig = toml::from_str(
            r##"
language = "fra"

[branding]
main_color = "#ff0000"
"##,
        )
        .unwrap();

        assert_eq!(config.language, "fra");
        assert_eq!(config.branding.main_color.as_deref(), Some("#ff0000"));
        // untouched sections keep defaults
        assert_eq!(config.ui.pagination, 10);
        assert_eq!(config.publisher, "openZIM");
    }

    // =========================================================================
    // load_config
    // =========================================================================

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config, ScraperConfig::default());
    }

    #[test]
    fn load_config_reads_working_directory_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE_NAME),
            r#"
tags = ["ted", "talks"]

[ui]
pagination = 25
"#,
        )
        .unwrap();

        let config = load_config(None, tmp.path()).unwrap();
        assert_eq!(config.tags, vec!["ted", "talks"]);
        assert_eq!(config.ui.pagination, 25);
        assert!(config.ui.randomize);
    }

    #[test]
    fn load_config_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        fs::write(&path, "creator = \"Kiwix\"\n").unwrap();

        let config = load_config(Some(&path), Path::new("/nonexistent")).unwrap();
        assert_eq!(config.creator, "Kiwix");
    }

    #[test]
    fn load_config_explicit_missing_is_error() {
        let tmp = TempDir::new().unwrap();
        let result = load_config(Some(&tmp.path().join("nope.toml")), tmp.path());
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE_NAME), "this is not valid toml [[[").unwrap();

        let result = load_config(None, tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    // =========================================================================
    // validate
    // =========================================================================

    #[test]
    fn zero_pagination_rejected() {
        let mut config = ScraperConfig::default();
        config.ui.pagination = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn bad_color_rejected() {
        let mut config = ScraperConfig::default();
        config.branding.secondary_color = Some("teal".into());
        let err = config.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Config validation error: branding.secondary_color is not a valid hex color: teal"
        );
    }

    #[test]
    fn negative_delay_rejected() {
        let mut config = ScraperConfig::default();
        config.download.delay_secs = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_language_rejected() {
        let mut config = ScraperConfig::default();
        config.language = " ".into();
        assert!(config.validate().is_err());
    }

    // =========================================================================
    // merge_toml
    // =========================================================================

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str(r#"language = "eng""#).unwrap();
        let overlay: toml::Value = toml::from_str(r#"language = "fra""#).unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("language").unwrap().as_str(), Some("fra"));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[ui]
pagination = 10
randomize = true
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[ui]
randomize = false
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let ui = merged.get("ui").unwrap();
        assert_eq!(ui.get("randomize").unwrap().as_bool(), Some(false));
        // pagination preserved from base
        assert_eq!(ui.get("pagination").unwrap().as_integer(), Some(10));
    }

    #[test]
    fn merge_toml_adds_missing_keys() {
        let base = stock_defaults_value().unwrap();
        let overlay: toml::Value = toml::from_str(
            r##"
[branding]
main_color = "#123456"
"##,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let branding = merged.get("branding").unwrap();
        assert_eq!(branding.get("main_color").unwrap().as_str(), Some("#123456"));
    }

    // =========================================================================
    // Unknown key rejection
    // =========================================================================

    #[test]
    fn unknown_key_rejected() {
        let result: Result<ScraperConfig, _> = toml::from_str("pagnation = 5\n");
        assert!(result.is_err());
    }

    #[test]
    fn unknown_nested_key_rejected() {
        let result: Result<ScraperConfig, _> = toml::from_str(
            r#"
[ui]
randomise = false
"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn unknown_key_rejected_through_resolve() {
        let overlay: toml::Value = toml::from_str("[download]\ndelay = 1\n").unwrap();
        let result = resolve_config(stock_defaults_value().unwrap(), Some(overlay));
        assert!(result.is_err());
    }

    // =========================================================================
    // stock config
    // =========================================================================

    #[test]
    fn stock_defaults_value_is_table() {
        let val = stock_defaults_value().unwrap();
        assert!(val.is_table());
        // unset options are omitted, not serialized as empty strings
        assert!(val.get("locale").is_none());
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: ScraperConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, ScraperConfig::default());
    }

    #[test]
    fn stock_config_toml_contains_all_sections() {
        let content = stock_config_toml();
        for section in ["[ui]", "[branding]", "[download]"] {
            assert!(content.contains(section), "missing {section}");
        }
    }

    #[test]
    fn branding_config_converts_to_input() {
        let config = BrandingConfig {
            main_logo: Some("logo.png".into()),
            ..BrandingConfig::default()
        };
        let input: BrandingInput = config.into();
        assert_eq!(input.main_logo.as_deref(), Some("logo.png"));
        assert!(input.favicon.is_none());
    }
}

//! Glossa configuration system
//!
//! This crate loads launcher settings from `glossa.toml` (with environment
//! variable overrides) and the per-language font definitions the launcher
//! points at.

pub mod addon;
pub mod error;
pub mod language;

pub use addon::{AddonCompat, DataDirAddons, NoAddons};
pub use error::{ConfigError, Result};
pub use language::{FontRoles, LanguageConfig};

use glossa_text::{DisplayMetrics, REFERENCE_HEIGHT, REFERENCE_WIDTH, ScalingPolicy};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the launcher configuration.
pub const CONFIG_FILE: &str = "glossa.toml";

/// Main launcher configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct GlossaConfig {
    /// Which language to load and where language data lives
    pub language: LanguageSection,
    /// Display size used when no window is available
    pub display: DisplaySection,
    /// Overrides applied on top of the language definition
    pub text: TextSection,
    /// Crash report settings
    pub diagnostics: DiagnosticsSection,
}

/// Language selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSection {
    /// Language directory name under `data_root` (e.g. "English")
    pub name: String,
    /// Root directory holding one subdirectory per language
    pub data_root: PathBuf,
}

/// Display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    pub width: u32,
    pub height: u32,
}

/// Text scaling overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TextSection {
    /// Replaces `ResolutionFontSizeMethod` from the language definition
    pub font_size_method: Option<ScalingPolicy>,
    /// Replaces `ResolutionFontAdjustment` from the language definition
    pub font_adjustment: Option<f32>,
}

/// Crash report configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsSection {
    /// Write a crash report when the process panics
    pub enabled: bool,
    /// User directory that receives the `CrashDumps` folder
    pub dump_dir: Option<PathBuf>,
    /// Number of crash reports kept on disk
    pub keep_count: usize,
    /// Include process arguments and platform details in reports
    pub extended_info: bool,
}

impl Default for LanguageSection {
    fn default() -> Self {
        Self {
            name: "English".to_string(),
            data_root: PathBuf::from("Data"),
        }
    }
}

impl Default for DisplaySection {
    fn default() -> Self {
        Self {
            width: REFERENCE_WIDTH,
            height: REFERENCE_HEIGHT,
        }
    }
}

impl Default for DiagnosticsSection {
    fn default() -> Self {
        Self {
            enabled: true,
            dump_dir: None,
            keep_count: 10,
            extended_info: false,
        }
    }
}

impl DisplaySection {
    pub fn metrics(&self) -> DisplayMetrics {
        DisplayMetrics::new(self.width, self.height)
    }
}

impl TextSection {
    /// Apply the configured overrides to a loaded language definition.
    pub fn apply_overrides(&self, language: &mut LanguageConfig) {
        if let Some(method) = self.font_size_method {
            language.resolution_font_size_method = method;
        }
        if let Some(adjustment) = self.font_adjustment {
            language.resolution_font_adjustment = adjustment;
        }
    }
}

impl DiagnosticsSection {
    /// Configured dump directory, else the platform local data directory.
    pub fn resolved_dump_dir(&self) -> PathBuf {
        self.dump_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("glossa")))
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl GlossaConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;

        toml::from_str(&content).map_err(|e| ConfigError::parse(path, e))
    }

    /// Load configuration from `path`, or return defaults if the file doesn't
    /// exist. A file that exists but cannot be used is reported and skipped.
    pub fn load_or_default_from<P: AsRef<Path>>(path: P) -> Self {
        match Self::load_from_file(path) {
            Ok(config) => config,
            Err(err) => {
                if !err.is_not_found() {
                    warn!("{err}; using default configuration");
                }
                Self::default()
            }
        }
    }

    /// Load configuration from the default location (glossa.toml in the current directory)
    /// or return default configuration if file doesn't exist
    pub fn load_or_default() -> Self {
        Self::load_or_default_from(CONFIG_FILE)
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        // Language settings
        if let Ok(name) = std::env::var("GLOSSA_LANGUAGE") {
            self.language.name = name;
        }
        if let Ok(root) = std::env::var("GLOSSA_DATA_ROOT") {
            self.language.data_root = PathBuf::from(root);
        }

        // Display settings
        if let Ok(val) = std::env::var("GLOSSA_DISPLAY_WIDTH") {
            if let Ok(width) = val.parse::<u32>() {
                self.display.width = width;
            }
        }
        if let Ok(val) = std::env::var("GLOSSA_DISPLAY_HEIGHT") {
            if let Ok(height) = val.parse::<u32>() {
                self.display.height = height;
            }
        }

        // Text settings
        if let Ok(val) = std::env::var("GLOSSA_FONT_SIZE_METHOD") {
            match val.parse::<ScalingPolicy>() {
                Ok(method) => self.text.font_size_method = Some(method),
                Err(err) => warn!("ignoring GLOSSA_FONT_SIZE_METHOD: {err}"),
            }
        }
        if let Ok(val) = std::env::var("GLOSSA_FONT_ADJUSTMENT") {
            if let Ok(adjustment) = val.parse::<f32>() {
                self.text.font_adjustment = Some(adjustment);
            }
        }

        // Diagnostics settings
        if let Ok(val) = std::env::var("GLOSSA_CRASH_DUMPS") {
            self.diagnostics.enabled = env_flag(&val);
        }
        if let Ok(dir) = std::env::var("GLOSSA_DUMP_DIR") {
            self.diagnostics.dump_dir = Some(PathBuf::from(dir));
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from glossa.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }

    /// Directory holding the selected language's files.
    pub fn language_dir(&self) -> PathBuf {
        self.language.data_root.join(&self.language.name)
    }

    /// Load the selected language and apply every override in order: the
    /// addon compatibility check first, then the `[text]` section.
    pub fn load_language(&self, addons: &dyn AddonCompat) -> Result<LanguageConfig> {
        let mut language =
            LanguageConfig::load_language(&self.language.data_root, &self.language.name)?;
        language.apply_custom_definition(addons);
        self.text.apply_overrides(&mut language);
        Ok(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GlossaConfig::default();
        assert_eq!(config.language.name, "English");
        assert_eq!(config.language.data_root, PathBuf::from("Data"));
        assert_eq!(config.display.metrics(), DisplayMetrics::REFERENCE);
        assert!(config.diagnostics.enabled);
        assert_eq!(config.diagnostics.keep_count, 10);
        assert!(config.text.font_size_method.is_none());
    }

    #[test]
    fn test_toml_serialization() {
        let mut config = GlossaConfig::default();
        config.text.font_size_method = Some(ScalingPolicy::Strict);
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: GlossaConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.text.font_size_method, Some(ScalingPolicy::Strict));
        assert!(parsed.diagnostics.enabled);
    }

    #[test]
    fn test_partial_file() {
        let parsed: GlossaConfig = toml::from_str(
            r#"
            [display]
            width = 1920

            [text]
            font_size_method = "classic"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.display.metrics(), DisplayMetrics::new(1920, 600));
        assert_eq!(parsed.text.font_size_method, Some(ScalingPolicy::Classic));
        assert_eq!(parsed.language.name, "English");
    }

    #[test]
    fn test_load_or_default() {
        // Should not panic even if glossa.toml doesn't exist
        let config = GlossaConfig::load_or_default_from("/nonexistent/glossa.toml");
        assert_eq!(config.language.name, "English");
        assert!(config.diagnostics.enabled);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "[display]\nwidth = \"wide\"\n").unwrap();

        let err = GlossaConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(!err.is_not_found());

        let config = GlossaConfig::load_or_default_from(&path);
        assert_eq!(config.display.width, REFERENCE_WIDTH);
    }

    #[test]
    fn test_apply_overrides() {
        let text = TextSection {
            font_size_method: Some(ScalingPolicy::Strict),
            font_adjustment: Some(1.0),
        };
        let mut language = LanguageConfig::default();
        text.apply_overrides(&mut language);
        assert_eq!(language.resolution_font_size_method, ScalingPolicy::Strict);
        assert_eq!(language.resolution_font_adjustment, 1.0);
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("GLOSSA_LANGUAGE", "German");
            std::env::set_var("GLOSSA_DISPLAY_WIDTH", "2560");
            std::env::set_var("GLOSSA_DISPLAY_HEIGHT", "not-a-number");
            std::env::set_var("GLOSSA_FONT_SIZE_METHOD", "Balanced");
            std::env::set_var("GLOSSA_CRASH_DUMPS", "0");
        }

        let mut config = GlossaConfig::default();
        config.merge_with_env();

        assert_eq!(config.language.name, "German");
        assert_eq!(config.display.metrics(), DisplayMetrics::new(2560, REFERENCE_HEIGHT));
        assert_eq!(config.text.font_size_method, Some(ScalingPolicy::Balanced));
        assert!(!config.diagnostics.enabled);
        assert_eq!(config.language_dir(), PathBuf::from("Data").join("German"));

        unsafe {
            std::env::remove_var("GLOSSA_LANGUAGE");
            std::env::remove_var("GLOSSA_DISPLAY_WIDTH");
            std::env::remove_var("GLOSSA_DISPLAY_HEIGHT");
            std::env::remove_var("GLOSSA_FONT_SIZE_METHOD");
            std::env::remove_var("GLOSSA_CRASH_DUMPS");
        }
    }
}

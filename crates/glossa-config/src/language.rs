//! Per-language font and text settings.
//!
//! A language is defined by `<data_root>/<language>/Language.toml` and any
//! `*.toml` files in `<data_root>/<language>/Language/`. Files are applied in
//! that order (directory entries sorted by name); each one overwrites the keys
//! it sets, and `LocalFontFile` entries accumulate across all of them.

use std::path::{Path, PathBuf};

use glossa_text::{DisplayMetrics, FontDesc, FontScalingConfig, ScalingPolicy, adjust_font_size};
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize};
use toml::{Table, Value};

use crate::addon::AddonCompat;
use crate::error::{ConfigError, Result};

const DEFINITION_FILE: &str = "Language.toml";
const DEFINITION_DIR: &str = "Language";
const LOCAL_FONT_FILE_KEY: &str = "LocalFontFile";

/// Font and text settings for the active language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct LanguageConfig {
    pub unicode_font_name: String,
    /// Font files shipped with the language, relative to the language directory.
    #[serde(rename = "LocalFontFile", deserialize_with = "one_or_many")]
    pub local_font_files: Vec<PathBuf>,
    pub military_caption_speed: i32,
    #[serde(rename = "MilitaryCaptionDelayMS")]
    pub military_caption_delay_ms: i32,
    pub use_hard_word_wrap: bool,
    pub resolution_font_adjustment: f32,
    pub resolution_font_size_method: ScalingPolicy,
    #[serde(flatten)]
    pub fonts: FontRoles,
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            unicode_font_name: String::new(),
            local_font_files: Vec::new(),
            military_caption_speed: 0,
            military_caption_delay_ms: 750,
            use_hard_word_wrap: false,
            resolution_font_adjustment: 0.7,
            resolution_font_size_method: ScalingPolicy::Balanced,
            fonts: FontRoles::default(),
        }
    }
}

/// The named UI fonts of a language.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct FontRoles {
    pub copyright_font: FontDesc,
    pub message_font: FontDesc,
    pub military_caption_title_font: FontDesc,
    pub military_caption_font: FontDesc,
    pub superweapon_countdown_normal_font: FontDesc,
    pub superweapon_countdown_ready_font: FontDesc,
    pub named_timer_countdown_normal_font: FontDesc,
    pub named_timer_countdown_ready_font: FontDesc,
    pub drawable_caption_font: FontDesc,
    pub default_window_font: FontDesc,
    pub default_display_string_font: FontDesc,
    #[serde(rename = "TooltipFontName")]
    pub tooltip_font: FontDesc,
    pub native_debug_display: FontDesc,
    pub draw_group_info_font: FontDesc,
    pub credits_title_font: FontDesc,
    pub credits_minor_title_font: FontDesc,
    pub credits_normal_font: FontDesc,
}

impl FontRoles {
    /// Every role with its configuration key, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FontDesc)> {
        [
            ("CopyrightFont", &self.copyright_font),
            ("MessageFont", &self.message_font),
            ("MilitaryCaptionTitleFont", &self.military_caption_title_font),
            ("MilitaryCaptionFont", &self.military_caption_font),
            (
                "SuperweaponCountdownNormalFont",
                &self.superweapon_countdown_normal_font,
            ),
            (
                "SuperweaponCountdownReadyFont",
                &self.superweapon_countdown_ready_font,
            ),
            (
                "NamedTimerCountdownNormalFont",
                &self.named_timer_countdown_normal_font,
            ),
            (
                "NamedTimerCountdownReadyFont",
                &self.named_timer_countdown_ready_font,
            ),
            ("DrawableCaptionFont", &self.drawable_caption_font),
            ("DefaultWindowFont", &self.default_window_font),
            ("DefaultDisplayStringFont", &self.default_display_string_font),
            ("TooltipFontName", &self.tooltip_font),
            ("NativeDebugDisplay", &self.native_debug_display),
            ("DrawGroupInfoFont", &self.draw_group_info_font),
            ("CreditsTitleFont", &self.credits_title_font),
            ("CreditsMinorTitleFont", &self.credits_minor_title_font),
            ("CreditsNormalFont", &self.credits_normal_font),
        ]
        .into_iter()
    }
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<PathBuf>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(PathBuf),
        Many(Vec<PathBuf>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(path) => vec![path],
        OneOrMany::Many(paths) => paths,
    })
}

/// Apply `layer` on top of `base`. Font tables merge key by key, local font
/// lists append, and every other key is replaced.
fn overlay(base: &mut Table, layer: Table) {
    for (key, value) in layer {
        if key == LOCAL_FONT_FILE_KEY {
            let entry = base.entry(key).or_insert(Value::Array(Vec::new()));
            if let Value::Array(list) = entry {
                match value {
                    Value::Array(items) => list.extend(items),
                    single => list.push(single),
                }
            }
            continue;
        }

        // A font written as a one-line string becomes a table so a partial
        // table overlay keeps the fields it does not set.
        let line_font = match (base.get(&key), &value) {
            (Some(Value::String(line)), Value::Table(_)) => line.parse::<FontDesc>().ok(),
            _ => None,
        };
        if let Some(font) = line_font {
            base.insert(key.clone(), Value::Table(font_table(font)));
        }

        let value = match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(incoming)) => {
                for (field, field_value) in incoming {
                    existing.insert(field, field_value);
                }
                continue;
            }
            (_, value) => value,
        };
        base.insert(key, value);
    }
}

fn font_table(font: FontDesc) -> Table {
    let mut table = Table::new();
    table.insert("name".into(), Value::String(font.name));
    table.insert("size".into(), Value::Integer(i64::from(font.size)));
    table.insert("bold".into(), Value::Boolean(font.bold));
    table
}

const SETTING_KEYS: [&str; 7] = [
    "UnicodeFontName",
    LOCAL_FONT_FILE_KEY,
    "MilitaryCaptionSpeed",
    "MilitaryCaptionDelayMS",
    "UseHardWordWrap",
    "ResolutionFontAdjustment",
    "ResolutionFontSizeMethod",
];

/// Top-level keys of `table` that no setting or font role reads.
fn unknown_keys(table: &Table) -> Vec<&str> {
    let roles = FontRoles::default();
    table
        .keys()
        .map(String::as_str)
        .filter(|key| {
            !SETTING_KEYS.contains(key) && !roles.iter().any(|(role, _)| role == *key)
        })
        .collect()
}

fn parse_table(path: &Path) -> Result<Table> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let table: Table = toml::from_str(&content).map_err(|e| ConfigError::parse(path, e))?;
    for key in unknown_keys(&table) {
        warn!("{}: ignoring unknown key {key:?}", path.display());
    }
    // Type-check each file on its own so errors name the file at fault.
    Value::Table(table.clone())
        .try_into::<LanguageConfig>()
        .map_err(|e| ConfigError::parse(path, e))?;
    Ok(table)
}

/// Definition files for `language`, in application order.
pub fn definition_files(data_root: &Path, language: &str) -> Result<Vec<PathBuf>> {
    let language_dir = data_root.join(language);
    let mut files = Vec::new();

    let main_file = language_dir.join(DEFINITION_FILE);
    if main_file.is_file() {
        files.push(main_file);
    }

    let overlay_dir = language_dir.join(DEFINITION_DIR);
    if overlay_dir.is_dir() {
        let entries =
            std::fs::read_dir(&overlay_dir).map_err(|e| ConfigError::io(&overlay_dir, e))?;
        let mut overlays = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ConfigError::io(&overlay_dir, e))?.path();
            let is_toml = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
            if is_toml && path.is_file() {
                overlays.push(path);
            }
        }
        overlays.sort();
        files.extend(overlays);
    }

    Ok(files)
}

impl LanguageConfig {
    /// Parse a single definition from TOML text.
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        let config: LanguageConfig = toml::from_str(content)?;
        config.warn_on_suspect_values();
        Ok(config)
    }

    /// Load a single definition file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config: LanguageConfig = Value::Table(parse_table(path)?)
            .try_into()
            .map_err(|e| ConfigError::parse(path, e))?;
        config.warn_on_suspect_values();
        Ok(config)
    }

    /// Load and merge every definition file of `language` under `data_root`.
    pub fn load_language(data_root: impl AsRef<Path>, language: &str) -> Result<Self> {
        let data_root = data_root.as_ref();
        let language_dir = data_root.join(language);
        let files = definition_files(data_root, language)?;
        if files.is_empty() {
            return Err(ConfigError::NoLanguageDefinition(language_dir));
        }

        let mut merged = Table::new();
        for path in &files {
            debug!("loading language definition {}", path.display());
            overlay(&mut merged, parse_table(path)?);
        }

        let config: LanguageConfig = Value::Table(merged)
            .try_into()
            .map_err(|e| ConfigError::parse(&language_dir, e))?;
        config.warn_on_suspect_values();
        info!(
            "loaded language {language} from {} file(s): {} scaling at {}",
            files.len(),
            config.resolution_font_size_method,
            config.resolution_font_adjustment
        );
        Ok(config)
    }

    fn warn_on_suspect_values(&self) {
        let strength = self.resolution_font_adjustment;
        if !(0.0..=1.0).contains(&strength) {
            warn!("ResolutionFontAdjustment {strength} is outside 0.0..=1.0; using it as given");
        }
    }

    /// Force Classic scaling when a legacy full-viewport addon is installed.
    /// Must run before any font is scaled.
    pub fn apply_custom_definition(&mut self, addons: &dyn AddonCompat) {
        if addons.has_fullviewport_dat()
            && self.resolution_font_size_method != ScalingPolicy::Classic
        {
            info!(
                "full-viewport addon detected; font size method {} forced to {}",
                self.resolution_font_size_method,
                ScalingPolicy::Classic
            );
            self.resolution_font_size_method = ScalingPolicy::Classic;
        }
    }

    pub fn scaling_config(&self) -> FontScalingConfig {
        FontScalingConfig::new(
            self.resolution_font_size_method,
            self.resolution_font_adjustment,
        )
    }

    /// Scale an authored point size for `display`.
    pub fn adjust_font_size(&self, size: i32, display: DisplayMetrics) -> i32 {
        adjust_font_size(size, &self.scaling_config(), display)
    }

    pub fn scaled_font(&self, font: &FontDesc, display: DisplayMetrics) -> FontDesc {
        font.scaled(&self.scaling_config(), display)
    }

    /// Local font files resolved against `language_dir`. Absolute entries are
    /// returned as is.
    pub fn local_font_paths(&self, language_dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let language_dir = language_dir.as_ref();
        self.local_font_files
            .iter()
            .map(|file| language_dir.join(file))
            .collect()
    }
}

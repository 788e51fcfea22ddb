use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scaling::{DisplayMetrics, FontScalingConfig, adjust_font_size};

pub const DEFAULT_FONT_NAME: &str = "Arial Unicode MS";
pub const DEFAULT_FONT_SIZE: i32 = 12;

/// A named font at an authored point size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "FontDescRepr")]
pub struct FontDesc {
    pub name: String,
    pub size: i32,
    pub bold: bool,
}

impl Default for FontDesc {
    fn default() -> Self {
        Self {
            name: DEFAULT_FONT_NAME.to_string(),
            size: DEFAULT_FONT_SIZE,
            bold: false,
        }
    }
}

impl FontDesc {
    pub fn new(name: impl Into<String>, size: i32, bold: bool) -> Self {
        Self {
            name: name.into(),
            size,
            bold,
        }
    }

    /// Copy of this font with its size adjusted for `display`.
    pub fn scaled(&self, config: &FontScalingConfig, display: DisplayMetrics) -> FontDesc {
        FontDesc {
            name: self.name.clone(),
            size: adjust_font_size(self.size, config, display),
            bold: self.bold,
        }
    }
}

impl fmt::Display for FontDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bold = if self.bold { "Yes" } else { "No" };
        write!(f, "\"{}\" {} {}", self.name, self.size, bold)
    }
}

/// Errors produced while reading the `"Name" size bold` font form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FontDescError {
    #[error("font name is missing its closing quote")]
    UnterminatedName,
    #[error("font description is missing the {0}")]
    Missing(&'static str),
    #[error("invalid font size {0:?}")]
    InvalidSize(String),
    #[error("invalid bold flag {0:?} (expected yes/no)")]
    InvalidBold(String),
    #[error("unexpected trailing text {0:?} in font description")]
    Trailing(String),
}

fn parse_bool_token(token: &str) -> Option<bool> {
    match token.to_ascii_lowercase().as_str() {
        "yes" | "true" | "1" => Some(true),
        "no" | "false" | "0" => Some(false),
        _ => None,
    }
}

/// Split off the font name, quoted or a single bare token.
fn split_name(s: &str) -> Result<(&str, &str), FontDescError> {
    let s = s.trim_start();
    if let Some(quoted) = s.strip_prefix('"') {
        let end = quoted.find('"').ok_or(FontDescError::UnterminatedName)?;
        Ok((&quoted[..end], &quoted[end + 1..]))
    } else {
        let end = s.find(char::is_whitespace).unwrap_or(s.len());
        if end == 0 {
            return Err(FontDescError::Missing("name"));
        }
        Ok((&s[..end], &s[end..]))
    }
}

impl FromStr for FontDesc {
    type Err = FontDescError;

    /// Parses `"Arial Unicode MS" 12 No`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, rest) = split_name(s)?;
        let mut tokens = rest.split_whitespace();

        let size_token = tokens.next().ok_or(FontDescError::Missing("size"))?;
        let size = size_token
            .parse::<i32>()
            .map_err(|_| FontDescError::InvalidSize(size_token.to_string()))?;

        let bold_token = tokens.next().ok_or(FontDescError::Missing("bold flag"))?;
        let bold = parse_bool_token(bold_token)
            .ok_or_else(|| FontDescError::InvalidBold(bold_token.to_string()))?;

        let trailing: Vec<&str> = tokens.collect();
        if !trailing.is_empty() {
            return Err(FontDescError::Trailing(trailing.join(" ")));
        }

        Ok(FontDesc::new(name, size, bold))
    }
}

/// Either the legacy one-line form or a `{ name, size, bold }` table.
#[derive(Deserialize)]
#[serde(untagged)]
enum FontDescRepr {
    Line(String),
    Table(FontDescTable),
}

#[derive(Deserialize)]
#[serde(default)]
struct FontDescTable {
    name: String,
    size: i32,
    bold: bool,
}

impl Default for FontDescTable {
    fn default() -> Self {
        let FontDesc { name, size, bold } = FontDesc::default();
        Self { name, size, bold }
    }
}

impl TryFrom<FontDescRepr> for FontDesc {
    type Error = FontDescError;

    fn try_from(repr: FontDescRepr) -> Result<Self, Self::Error> {
        match repr {
            FontDescRepr::Line(line) => line.parse(),
            FontDescRepr::Table(FontDescTable { name, size, bold }) => {
                Ok(FontDesc { name, size, bold })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scaling::ScalingPolicy;

    #[derive(Debug, Deserialize)]
    struct Holder {
        font: FontDesc,
    }

    #[test]
    fn default_font() {
        let font = FontDesc::default();
        assert_eq!(font.name, "Arial Unicode MS");
        assert_eq!(font.size, 12);
        assert!(!font.bold);
    }

    #[test]
    fn parses_quoted_line() {
        let font: FontDesc = "\"Arial Unicode MS\" 14 Yes".parse().unwrap();
        assert_eq!(font, FontDesc::new("Arial Unicode MS", 14, true));
    }

    #[test]
    fn parses_bare_name() {
        let font: FontDesc = "Courier 8 no".parse().unwrap();
        assert_eq!(font, FontDesc::new("Courier", 8, false));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(
            "\"Arial 12 No".parse::<FontDesc>(),
            Err(FontDescError::UnterminatedName)
        );
        assert_eq!(
            "\"Arial\"".parse::<FontDesc>(),
            Err(FontDescError::Missing("size"))
        );
        assert_eq!(
            "\"Arial\" big No".parse::<FontDesc>(),
            Err(FontDescError::InvalidSize("big".into()))
        );
        assert_eq!(
            "\"Arial\" 12 maybe".parse::<FontDesc>(),
            Err(FontDescError::InvalidBold("maybe".into()))
        );
        assert_eq!(
            "\"Arial\" 12 No extra".parse::<FontDesc>(),
            Err(FontDescError::Trailing("extra".into()))
        );
    }

    #[test]
    fn display_round_trips_through_parse() {
        let font = FontDesc::new("Times New Roman", 16, true);
        assert_eq!(font.to_string().parse::<FontDesc>().unwrap(), font);
    }

    #[test]
    fn deserializes_line_and_table() {
        let line: Holder = toml::from_str(r#"font = '"Tahoma" 10 Yes'"#).unwrap();
        assert_eq!(line.font, FontDesc::new("Tahoma", 10, true));

        let table: Holder = toml::from_str("font = { size = 18 }").unwrap();
        assert_eq!(table.font, FontDesc::new("Arial Unicode MS", 18, false));
    }

    #[test]
    fn scaled_keeps_face() {
        let font = FontDesc::new("Tahoma", 12, true);
        let config = FontScalingConfig::new(ScalingPolicy::Classic, 1.0);
        let scaled = font.scaled(&config, DisplayMetrics::new(1200, 900));
        assert_eq!(scaled, FontDesc::new("Tahoma", 18, true));
    }
}

//! # Merge Configuration
//!
//! Everything a merge run needs, as one serde-deserializable record. A run
//! can be described entirely by a JSON job file:
//!
//! ```json
//! {
//!   "template": "letterhead.pdf",
//!   "data": "people.csv",
//!   "outputDir": "out",
//!   "filename": "{name}_{surname}",
//!   "body": { "kind": "markup", "text": "Dear <b>{name}</b>,\\n\\tthank you." },
//!   "font": "Times-Roman",
//!   "fontSize": 12,
//!   "x": 10,
//!   "y": 20,
//!   "wrap": { "chars": 80 },
//!   "onError": "continue"
//! }
//! ```
//!
//! Settings typed by a person arrive as strings; [`RawSettings`] parses
//! them and names the field that failed.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{MergeError, Result};
use crate::font::FontFamily;
use crate::template::DEFAULT_FILENAME;
use crate::text::runs::{RichText, StyleSpan};

/// The body text template, with or without formatting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum BodyTemplate {
    /// Unformatted text.
    Plain { text: String },
    /// Text with explicit formatting ranges (character offsets).
    Styled {
        text: String,
        #[serde(default)]
        spans: Vec<StyleSpan>,
    },
    /// Text with inline `<b>`, `<i>` and `<u>` tags.
    Markup { text: String },
}

impl Default for BodyTemplate {
    fn default() -> Self {
        BodyTemplate::Plain {
            text: String::new(),
        }
    }
}

impl BodyTemplate {
    pub fn is_empty(&self) -> bool {
        match self {
            BodyTemplate::Plain { text }
            | BodyTemplate::Styled { text, .. }
            | BodyTemplate::Markup { text } => text.is_empty(),
        }
    }

    /// Whether the body carries formatting and must take the styled path.
    pub fn is_styled(&self) -> bool {
        !matches!(self, BodyTemplate::Plain { .. })
    }

    /// The formatting source for this body.
    pub fn rich_text(&self) -> RichText {
        match self {
            BodyTemplate::Plain { text } => RichText::plain(text.clone()),
            BodyTemplate::Styled { text, spans } => RichText {
                text: text.clone(),
                spans: spans.clone(),
            },
            BodyTemplate::Markup { text } => RichText::from_markup(text),
        }
    }
}

/// Line width limit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WrapSetting {
    /// At most this many characters per line.
    Chars(usize),
    /// Lines end where the measured text would pass this fraction of the
    /// page width.
    PageFraction(f64),
}

impl WrapSetting {
    pub const DEFAULT_CHARS: usize = 80;
    pub const DEFAULT_FRACTION: f64 = 0.8;
}

impl Default for WrapSetting {
    fn default() -> Self {
        WrapSetting::Chars(Self::DEFAULT_CHARS)
    }
}

/// What a run does after a row fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    /// Record the failure and go on with the next row.
    #[default]
    Continue,
    /// Stop at the first failed row.
    Abort,
}

fn default_filename() -> String {
    DEFAULT_FILENAME.to_string()
}

fn default_font_size() -> u32 {
    12
}

fn default_x() -> f64 {
    10.0
}

fn default_y() -> f64 {
    20.0
}

/// A complete merge run description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeConfig {
    #[serde(default)]
    pub template: PathBuf,

    #[serde(default)]
    pub data: PathBuf,

    #[serde(default)]
    pub output_dir: PathBuf,

    /// Output filename template, `{field}` tags allowed.
    #[serde(default = "default_filename")]
    pub filename: String,

    #[serde(default)]
    pub body: BodyTemplate,

    #[serde(default)]
    pub font: FontFamily,

    #[serde(default = "default_font_size")]
    pub font_size: u32,

    /// Left edge of the text block, percent of page width.
    #[serde(default = "default_x")]
    pub x: f64,

    /// First baseline, percent of page height from the top.
    #[serde(default = "default_y")]
    pub y: f64,

    #[serde(default)]
    pub wrap: WrapSetting,

    #[serde(default)]
    pub on_error: OnError,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::new(),
            data: PathBuf::new(),
            output_dir: PathBuf::new(),
            filename: default_filename(),
            body: BodyTemplate::default(),
            font: FontFamily::default(),
            font_size: default_font_size(),
            x: default_x(),
            y: default_y(),
            wrap: WrapSetting::default(),
            on_error: OnError::default(),
        }
    }
}

impl MergeConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a JSON job file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check the run can start.
    ///
    /// All missing required inputs are reported together.
    pub fn validate(&self) -> Result<()> {
        let mut missing = Vec::new();
        if self.template.as_os_str().is_empty() {
            missing.push("template".to_string());
        }
        if self.data.as_os_str().is_empty() {
            missing.push("data source".to_string());
        }
        if self.output_dir.as_os_str().is_empty() {
            missing.push("output directory".to_string());
        }
        if self.body.is_empty() {
            missing.push("body text".to_string());
        }
        if !missing.is_empty() {
            return Err(MergeError::Precondition(missing));
        }

        if self.font_size == 0 {
            return Err(out_of_range("font size", "must be a positive integer"));
        }
        for (field, value) in [("x", self.x), ("y", self.y)] {
            if !(0.0..=100.0).contains(&value) {
                return Err(out_of_range(field, "must be a percentage between 0 and 100"));
            }
        }
        match self.wrap {
            WrapSetting::Chars(0) => Err(out_of_range("max chars", "must be at least 1")),
            WrapSetting::PageFraction(f) if !(f > 0.0 && f <= 1.0) => {
                Err(out_of_range("page fraction", "must be greater than 0 and at most 1"))
            }
            _ => Ok(()),
        }
    }
}

fn out_of_range(field: &'static str, reason: &str) -> MergeError {
    MergeError::OutOfRange {
        field,
        reason: reason.to_string(),
    }
}

/// Numeric settings as typed, before parsing.
#[derive(Debug, Clone, Default)]
pub struct RawSettings {
    pub font_size: Option<String>,
    pub x: Option<String>,
    pub y: Option<String>,
    pub max_chars: Option<String>,
    pub page_fraction: Option<String>,
}

impl RawSettings {
    /// Parse the present values into `config`, overriding what it had.
    pub fn parse(&self, mut config: MergeConfig) -> Result<MergeConfig> {
        if let Some(v) = &self.font_size {
            config.font_size = parse_field("font size", v)?;
        }
        if let Some(v) = &self.x {
            config.x = parse_field("x", v)?;
        }
        if let Some(v) = &self.y {
            config.y = parse_field("y", v)?;
        }
        if let Some(v) = &self.max_chars {
            config.wrap = WrapSetting::Chars(parse_field("max chars", v)?);
        }
        if let Some(v) = &self.page_fraction {
            config.wrap = WrapSetting::PageFraction(parse_field("page fraction", v)?);
        }
        Ok(config)
    }
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| MergeError::NumericParse {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> MergeConfig {
        MergeConfig {
            template: "t.pdf".into(),
            data: "d.csv".into(),
            output_dir: "out".into(),
            body: BodyTemplate::Plain {
                text: "Hello {name}".to_string(),
            },
            ..MergeConfig::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = MergeConfig::from_json("{}").unwrap();
        assert_eq!(config.filename, "document");
        assert_eq!(config.font, FontFamily::Helvetica);
        assert_eq!(config.font_size, 12);
        assert_eq!(config.x, 10.0);
        assert_eq!(config.y, 20.0);
        assert_eq!(config.wrap, WrapSetting::Chars(80));
        assert_eq!(config.on_error, OnError::Continue);
    }

    #[test]
    fn test_full_job_file() {
        let json = r#"{
            "template": "letterhead.pdf",
            "data": "people.csv",
            "outputDir": "out",
            "filename": "{name}_{surname}",
            "body": { "kind": "styled", "text": "Dear Ann", "spans": [
                { "start": 5, "end": 8, "style": "bold" }
            ] },
            "font": "Times-Roman",
            "fontSize": 14,
            "wrap": { "pageFraction": 0.5 },
            "onError": "abort"
        }"#;
        let config = MergeConfig::from_json(json).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.font, FontFamily::Times);
        assert_eq!(config.font_size, 14);
        assert_eq!(config.wrap, WrapSetting::PageFraction(0.5));
        assert_eq!(config.on_error, OnError::Abort);
        assert!(config.body.is_styled());
        let runs = config.body.rich_text().runs();
        assert!(runs.last().unwrap().style.bold);
        config.validate().unwrap();
    }

    #[test]
    fn test_markup_body() {
        let json = r#"{ "body": { "kind": "markup", "text": "<i>x</i>" } }"#;
        let config = MergeConfig::from_json(json).unwrap();
        let rich = config.body.rich_text();
        assert_eq!(rich.text, "x");
        assert!(rich.runs()[0].style.italic);
    }

    #[test]
    fn test_unknown_font_rejected() {
        let err = MergeConfig::from_json(r#"{ "font": "Comic Sans" }"#).unwrap_err();
        assert!(matches!(err, MergeError::Config(_)));
    }

    #[test]
    fn test_missing_inputs_aggregated() {
        let err = MergeConfig::default().validate().unwrap_err();
        match err {
            MergeError::Precondition(missing) => assert_eq!(
                missing,
                vec!["template", "data source", "output directory", "body text"]
            ),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_precondition_message() {
        let config = MergeConfig {
            template: PathBuf::new(),
            ..complete()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.to_string(), "All fields are required! Missing: template");
    }

    #[test]
    fn test_ranges() {
        let zero_size = MergeConfig {
            font_size: 0,
            ..complete()
        };
        assert!(matches!(
            zero_size.validate(),
            Err(MergeError::OutOfRange { field: "font size", .. })
        ));
        let off_page = MergeConfig { x: 120.0, ..complete() };
        assert!(matches!(
            off_page.validate(),
            Err(MergeError::OutOfRange { field: "x", .. })
        ));
        let no_width = MergeConfig {
            wrap: WrapSetting::Chars(0),
            ..complete()
        };
        assert!(no_width.validate().is_err());
        let fraction = MergeConfig {
            wrap: WrapSetting::PageFraction(1.5),
            ..complete()
        };
        assert!(fraction.validate().is_err());
    }

    #[test]
    fn test_raw_settings_parse() {
        let raw = RawSettings {
            font_size: Some(" 14 ".to_string()),
            x: Some("12.5".to_string()),
            max_chars: Some("60".to_string()),
            ..RawSettings::default()
        };
        let config = raw.parse(complete()).unwrap();
        assert_eq!(config.font_size, 14);
        assert_eq!(config.x, 12.5);
        assert_eq!(config.y, 20.0);
        assert_eq!(config.wrap, WrapSetting::Chars(60));
    }

    #[test]
    fn test_raw_settings_names_bad_field() {
        let raw = RawSettings {
            font_size: Some("twelve".to_string()),
            ..RawSettings::default()
        };
        match raw.parse(complete()).unwrap_err() {
            MergeError::NumericParse { field, value } => {
                assert_eq!(field, "font size");
                assert_eq!(value, "twelve");
            }
            other => panic!("unexpected error: {other}"),
        }

        let fractional = RawSettings {
            font_size: Some("12.5".to_string()),
            ..RawSettings::default()
        };
        assert!(matches!(
            fractional.parse(complete()),
            Err(MergeError::NumericParse { field: "font size", .. })
        ));
    }
}

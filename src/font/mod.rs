//! # Font Management
//!
//! Font family selection, variant resolution and text measurement.
//!
//! Only the standard PDF fonts are supported (Helvetica, Times, Courier), so
//! nothing is ever embedded: a font is a `/BaseFont` name plus a width table.

pub mod metrics;

pub use metrics::StandardFontMetrics;

use crate::error::MergeError;
use crate::text::runs::{Style, StyledRun};
use crate::text::wrap::Measure;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// The closed set of font families a merge can use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFamily {
    #[default]
    Helvetica,
    #[serde(rename = "Times-Roman", alias = "Times")]
    Times,
    Courier,
}

impl FontFamily {
    /// The name the family is selected by in settings.
    pub fn name(&self) -> &'static str {
        match self {
            FontFamily::Helvetica => "Helvetica",
            FontFamily::Times => "Times-Roman",
            FontFamily::Courier => "Courier",
        }
    }
}

impl fmt::Display for FontFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FontFamily {
    type Err = MergeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "helvetica" => Ok(FontFamily::Helvetica),
            "times" | "times-roman" => Ok(FontFamily::Times),
            "courier" => Ok(FontFamily::Courier),
            _ => Err(MergeError::UnknownFont(s.to_string())),
        }
    }
}

/// Concrete face within a family, resolved from a run's style set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontVariant {
    Regular,
    Bold,
    Italic,
    BoldItalic,
}

impl FontVariant {
    /// Resolve the variant for a style set. Underline does not affect the face.
    pub fn from_style(style: Style) -> Self {
        match (style.bold, style.italic) {
            (true, true) => FontVariant::BoldItalic,
            (true, false) => FontVariant::Bold,
            (false, true) => FontVariant::Italic,
            (false, false) => FontVariant::Regular,
        }
    }
}

/// The standard PDF fonts used by the supported families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
            Self::HelveticaOblique => "Helvetica-Oblique",
            Self::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Self::TimesRoman => "Times-Roman",
            Self::TimesBold => "Times-Bold",
            Self::TimesItalic => "Times-Italic",
            Self::TimesBoldItalic => "Times-BoldItalic",
            Self::Courier => "Courier",
            Self::CourierBold => "Courier-Bold",
            Self::CourierOblique => "Courier-Oblique",
            Self::CourierBoldOblique => "Courier-BoldOblique",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica | Self::HelveticaOblique => &metrics::HELVETICA,
            Self::HelveticaBold | Self::HelveticaBoldOblique => &metrics::HELVETICA_BOLD,
            Self::TimesRoman => &metrics::TIMES_ROMAN,
            Self::TimesBold => &metrics::TIMES_BOLD,
            Self::TimesItalic => &metrics::TIMES_ITALIC,
            Self::TimesBoldItalic => &metrics::TIMES_BOLD_ITALIC,
            Self::Courier | Self::CourierBold | Self::CourierOblique | Self::CourierBoldOblique => {
                &metrics::COURIER
            }
        }
    }
}

/// A font registry that maps family + variant to a standard font.
pub struct FontRegistry {
    fonts: HashMap<(FontFamily, FontVariant), StandardFont>,
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        use FontFamily::*;
        use FontVariant::*;

        let standard_mappings = [
            ((Helvetica, Regular), StandardFont::Helvetica),
            ((Helvetica, Bold), StandardFont::HelveticaBold),
            ((Helvetica, Italic), StandardFont::HelveticaOblique),
            ((Helvetica, BoldItalic), StandardFont::HelveticaBoldOblique),
            ((Times, Regular), StandardFont::TimesRoman),
            ((Times, Bold), StandardFont::TimesBold),
            ((Times, Italic), StandardFont::TimesItalic),
            ((Times, BoldItalic), StandardFont::TimesBoldItalic),
            ((Courier, Regular), StandardFont::Courier),
            ((Courier, Bold), StandardFont::CourierBold),
            ((Courier, Italic), StandardFont::CourierOblique),
            ((Courier, BoldItalic), StandardFont::CourierBoldOblique),
        ];

        Self {
            fonts: standard_mappings.into_iter().collect(),
        }
    }

    /// Look up a font, falling back to the family's regular face and then to
    /// Helvetica if the variant is not registered.
    pub fn resolve(&self, family: FontFamily, variant: FontVariant) -> StandardFont {
        if let Some(font) = self.fonts.get(&(family, variant)) {
            return *font;
        }
        log::warn!("No {:?} variant for {}, using regular", variant, family);
        self.fonts
            .get(&(family, FontVariant::Regular))
            .copied()
            .unwrap_or(StandardFont::Helvetica)
    }

    /// Width of `text` set in `font` at `font_size`, in points.
    pub fn measure(&self, text: &str, font: StandardFont, font_size: f64) -> f64 {
        font.metrics().measure(text, font_size)
    }
}

/// Line advance as a multiple of the font size.
pub const LINE_SPACING: f64 = 1.2;

/// The font settings of one merge: a family, a size and the registry that
/// resolves styles to faces.
pub struct FontContext {
    registry: FontRegistry,
    family: FontFamily,
    size: f64,
}

impl FontContext {
    pub fn new(family: FontFamily, size: f64) -> Self {
        Self {
            registry: FontRegistry::new(),
            family,
            size,
        }
    }

    pub fn family(&self) -> FontFamily {
        self.family
    }

    pub fn size(&self) -> f64 {
        self.size
    }

    pub fn line_height(&self) -> f64 {
        self.size * LINE_SPACING
    }

    /// The face a run with `style` is drawn in.
    pub fn font_for(&self, style: Style) -> StandardFont {
        self.registry.resolve(self.family, FontVariant::from_style(style))
    }

    pub fn regular(&self) -> StandardFont {
        self.registry.resolve(self.family, FontVariant::Regular)
    }

    /// Width of `text` in `font` at this context's size.
    pub fn width(&self, text: &str, font: StandardFont) -> f64 {
        self.registry.measure(text, font, self.size)
    }
}

impl Measure for FontContext {
    fn run_width(&self, run: &StyledRun) -> f64 {
        self.width(&run.text, self.font_for(run.style))
    }

    fn space_width(&self, style: Style) -> f64 {
        self.width(" ", self.font_for(style))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn style(bold: bool, italic: bool, underline: bool) -> Style {
        Style {
            bold,
            italic,
            underline,
        }
    }

    #[test]
    fn test_variant_precedence() {
        assert_eq!(FontVariant::from_style(style(true, true, false)), FontVariant::BoldItalic);
        assert_eq!(FontVariant::from_style(style(true, false, true)), FontVariant::Bold);
        assert_eq!(FontVariant::from_style(style(false, true, false)), FontVariant::Italic);
        assert_eq!(FontVariant::from_style(style(false, false, true)), FontVariant::Regular);
    }

    #[test]
    fn test_resolve_all_families() {
        let registry = FontRegistry::new();
        assert_eq!(
            registry.resolve(FontFamily::Helvetica, FontVariant::BoldItalic).pdf_name(),
            "Helvetica-BoldOblique"
        );
        assert_eq!(
            registry.resolve(FontFamily::Times, FontVariant::Italic).pdf_name(),
            "Times-Italic"
        );
        assert_eq!(
            registry.resolve(FontFamily::Courier, FontVariant::Bold).pdf_name(),
            "Courier-Bold"
        );
    }

    #[test]
    fn test_resolve_falls_back_to_regular() {
        let mut registry = FontRegistry::new();
        registry.fonts.remove(&(FontFamily::Times, FontVariant::Bold));
        assert_eq!(
            registry.resolve(FontFamily::Times, FontVariant::Bold),
            StandardFont::TimesRoman
        );
    }

    #[test]
    fn test_family_from_str() {
        assert_eq!("Times-Roman".parse::<FontFamily>().unwrap(), FontFamily::Times);
        assert_eq!("courier".parse::<FontFamily>().unwrap(), FontFamily::Courier);
        assert!(matches!(
            "Comic Sans".parse::<FontFamily>(),
            Err(MergeError::UnknownFont(_))
        ));
    }

    #[test]
    fn test_context_measures_runs_in_resolved_face() {
        let ctx = FontContext::new(FontFamily::Times, 10.0);
        let bold = StyledRun::new("Word", Style { bold: true, ..Style::PLAIN });
        assert_eq!(ctx.run_width(&bold), ctx.width("Word", StandardFont::TimesBold));
        assert!((ctx.line_height() - 12.0).abs() < 1e-9);
        assert_eq!(ctx.regular(), StandardFont::TimesRoman);
    }

    #[test]
    fn test_measure_uses_variant_widths() {
        let registry = FontRegistry::new();
        let regular = registry.measure("Bold", StandardFont::Helvetica, 12.0);
        let bold = registry.measure("Bold", StandardFont::HelveticaBold, 12.0);
        assert!(bold > regular);
    }
}

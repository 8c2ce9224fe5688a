//! Styled text: formatting ranges, per-character styles and run segmentation.
//!
//! The formatting source is a [`RichText`]: plain content plus character
//! ranges tagged bold, italic or underline. While tags are substituted and
//! escapes expanded the content lives as a [`StyledText`] (one style per
//! character), and [`StyledText::runs`] turns it into the ordered
//! [`StyledRun`] sequence the wrapper consumes.

use serde::{Deserialize, Serialize};

/// The set of styles active on a character.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub bold: bool,
    #[serde(default)]
    pub italic: bool,
    #[serde(default)]
    pub underline: bool,
}

impl Style {
    pub const PLAIN: Style = Style {
        bold: false,
        italic: false,
        underline: false,
    };

    /// This style with `kind` switched on.
    pub fn with(mut self, kind: StyleKind) -> Style {
        match kind {
            StyleKind::Bold => self.bold = true,
            StyleKind::Italic => self.italic = true,
            StyleKind::Underline => self.underline = true,
        }
        self
    }

    pub fn has(&self, kind: StyleKind) -> bool {
        match kind {
            StyleKind::Bold => self.bold,
            StyleKind::Italic => self.italic,
            StyleKind::Underline => self.underline,
        }
    }
}

/// A single formatting attribute a user can apply to a range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleKind {
    Bold,
    Italic,
    Underline,
}

impl StyleKind {
    pub const ALL: [StyleKind; 3] = [StyleKind::Bold, StyleKind::Italic, StyleKind::Underline];

    fn markup_tag(&self) -> char {
        match self {
            StyleKind::Bold => 'b',
            StyleKind::Italic => 'i',
            StyleKind::Underline => 'u',
        }
    }
}

/// A formatting range over a [`RichText`], in characters, `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleSpan {
    pub start: usize,
    pub end: usize,
    pub style: StyleKind,
}

/// Body text together with the formatting ranges applied to it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub text: String,
    #[serde(default)]
    pub spans: Vec<StyleSpan>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        RichText {
            text: text.into(),
            spans: Vec::new(),
        }
    }

    /// Parse inline markup: `<b>`, `<i>` and `<u>` with their closing tags.
    ///
    /// Tags may nest and overlap. Anything else, including an unmatched
    /// closing tag, is kept as literal text.
    pub fn from_markup(markup: &str) -> Self {
        let mut styled = StyledText::default();
        let mut depth = [0usize; 3];
        let mut rest = markup;

        while let Some(ch) = rest.chars().next() {
            if ch == '<' {
                if let Some((kind, closing, len)) = parse_markup_tag(rest) {
                    let slot = &mut depth[kind as usize];
                    if !closing {
                        *slot += 1;
                        rest = &rest[len..];
                        continue;
                    }
                    if *slot > 0 {
                        *slot -= 1;
                        rest = &rest[len..];
                        continue;
                    }
                }
            }
            let mut style = Style::PLAIN;
            for kind in StyleKind::ALL {
                if depth[kind as usize] > 0 {
                    style = style.with(kind);
                }
            }
            styled.push(ch, style);
            rest = &rest[ch.len_utf8()..];
        }

        RichText::from_styled(&styled)
    }

    /// Collapse per-character styles back into maximal spans per style kind.
    pub fn from_styled(styled: &StyledText) -> Self {
        let mut spans = Vec::new();
        for kind in StyleKind::ALL {
            let mut open: Option<usize> = None;
            for (i, (_, style)) in styled.chars().iter().enumerate() {
                match (style.has(kind), open) {
                    (true, None) => open = Some(i),
                    (false, Some(start)) => {
                        spans.push(StyleSpan { start, end: i, style: kind });
                        open = None;
                    }
                    _ => {}
                }
            }
            if let Some(start) = open {
                spans.push(StyleSpan {
                    start,
                    end: styled.len(),
                    style: kind,
                });
            }
        }
        spans.sort_by_key(|s| (s.start, s.end));
        RichText {
            text: styled.text(),
            spans,
        }
    }

    /// Expand the spans into a per-character style sequence.
    ///
    /// Spans reaching past the end of the text are clamped.
    pub fn to_styled(&self) -> StyledText {
        let mut chars: Vec<(char, Style)> = self.text.chars().map(|c| (c, Style::PLAIN)).collect();
        for span in &self.spans {
            let end = span.end.min(chars.len());
            for slot in chars.iter_mut().take(end).skip(span.start) {
                slot.1 = slot.1.with(span.style);
            }
        }
        StyledText { chars }
    }

    pub fn runs(&self) -> Vec<StyledRun> {
        self.to_styled().runs()
    }
}

/// `<b>`, `</u>`, ... at the start of `s`: (kind, is_closing, byte length).
fn parse_markup_tag(s: &str) -> Option<(StyleKind, bool, usize)> {
    let bytes = s.as_bytes();
    let (closing, name_at) = if bytes.get(1) == Some(&b'/') { (true, 2) } else { (false, 1) };
    let name = *bytes.get(name_at)? as char;
    if bytes.get(name_at + 1) != Some(&b'>') {
        return None;
    }
    let kind = StyleKind::ALL
        .into_iter()
        .find(|k| k.markup_tag() == name.to_ascii_lowercase())?;
    Some((kind, closing, name_at + 2))
}

/// A contiguous span of text carrying one style set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyledRun {
    pub text: String,
    pub style: Style,
}

impl StyledRun {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        StyledRun {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::PLAIN)
    }
}

/// Text with a style attached to every character.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledText {
    chars: Vec<(char, Style)>,
}

impl StyledText {
    pub fn plain(text: &str) -> Self {
        let mut styled = StyledText::default();
        styled.push_str(text, Style::PLAIN);
        styled
    }

    pub fn push(&mut self, ch: char, style: Style) {
        self.chars.push((ch, style));
    }

    pub fn push_str(&mut self, text: &str, style: Style) {
        self.chars.extend(text.chars().map(|c| (c, style)));
    }

    pub fn chars(&self) -> &[(char, Style)] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    /// The content without styling.
    pub fn text(&self) -> String {
        self.chars.iter().map(|(c, _)| *c).collect()
    }

    /// Segment into runs.
    ///
    /// A new run starts wherever the style changes, and every whitespace
    /// character forms a run of its own. Adjacent non-whitespace characters
    /// with the same style are coalesced.
    pub fn runs(&self) -> Vec<StyledRun> {
        let mut runs: Vec<StyledRun> = Vec::new();
        let mut current: Option<StyledRun> = None;

        for &(ch, style) in &self.chars {
            if ch.is_whitespace() {
                runs.extend(current.take());
                runs.push(StyledRun::new(ch.to_string(), style));
                continue;
            }
            match current.as_mut() {
                Some(run) if run.style == style => run.text.push(ch),
                _ => {
                    runs.extend(current.take());
                    current = Some(StyledRun::new(ch.to_string(), style));
                }
            }
        }
        runs.extend(current);
        runs
    }
}

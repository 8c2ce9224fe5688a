//! Word wrapping.
//!
//! Lines break only at whitespace. A word longer than the limit is put on a
//! line of its own and never split. A line feed always ends the line, and a
//! blank source line produces exactly one blank output line.
//!
//! Two entry points cover the two granularities:
//!
//! - [`wrap_text`] wraps plain escaped text by character count and keeps
//!   whitespace verbatim, so indentation from tab expansion survives.
//! - [`wrap_runs`] wraps a styled-run sequence word by word under either a
//!   character-count or a measured-width [`WidthPolicy`]. Whitespace here is
//!   only a break opportunity; the renderer puts one space between words.

use crate::text::runs::{Style, StyledRun};

/// Maximum line width for [`wrap_runs`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WidthPolicy {
    /// At most this many characters, counting one space between words.
    Chars(usize),
    /// At most this many points of measured glyph advance.
    Measured(f64),
}

/// Width measurement for the measured-width policy.
pub trait Measure {
    /// Advance width of a run in its resolved font.
    fn run_width(&self, run: &StyledRun) -> f64;
    /// Width of the space inserted before a word whose first run has `style`.
    fn space_width(&self, style: Style) -> f64;
}

/// A whitespace-free word, made of one or more styled pieces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    pub pieces: Vec<StyledRun>,
}

impl Word {
    pub fn text(&self) -> String {
        self.pieces.iter().map(|p| p.text.as_str()).collect()
    }

    pub fn char_count(&self) -> usize {
        self.pieces.iter().map(|p| p.text.chars().count()).sum()
    }

    fn leading_style(&self) -> Style {
        self.pieces.first().map(|p| p.style).unwrap_or_default()
    }
}

/// One output line of styled words. No words means a blank line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrappedLine {
    pub words: Vec<Word>,
}

impl WrappedLine {
    pub fn is_blank(&self) -> bool {
        self.words.is_empty()
    }

    /// The line's words joined by single spaces.
    pub fn text(&self) -> String {
        self.words.iter().map(Word::text).collect::<Vec<_>>().join(" ")
    }
}

/// Wrap plain text to at most `max_chars` characters per line.
///
/// Whitespace is kept verbatim except for the single whitespace character
/// consumed by each break. Indentation that cannot fit together with the
/// word after it is dropped and the word starts the line.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();

    for source_line in text.split('\n') {
        let first = lines.len();
        let mut current = String::new();
        let mut current_len = 0usize;

        for token in tokens(source_line) {
            let token_len = token.chars().count();
            let is_space = token.chars().all(char::is_whitespace);

            if is_space {
                if current_len < max_chars {
                    current.push_str(token);
                    current_len += 1;
                } else {
                    lines.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                continue;
            }

            if current_len + token_len <= max_chars {
                current.push_str(token);
                current_len += token_len;
            } else if current.chars().all(char::is_whitespace) {
                current = token.to_string();
                current_len = token_len;
            } else {
                if current.ends_with(char::is_whitespace) {
                    current.pop();
                }
                lines.push(std::mem::replace(&mut current, token.to_string()));
                current_len = token_len;
            }
        }

        if !current.is_empty() || lines.len() == first {
            lines.push(current);
        }
    }

    lines
}

/// Split into maximal non-whitespace words and single whitespace characters.
fn tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut word_start: Option<usize> = None;
    for (i, ch) in line.char_indices() {
        if ch.is_whitespace() {
            if let Some(start) = word_start.take() {
                tokens.push(&line[start..i]);
            }
            tokens.push(&line[i..i + ch.len_utf8()]);
        } else if word_start.is_none() {
            word_start = Some(i);
        }
    }
    if let Some(start) = word_start {
        tokens.push(&line[start..]);
    }
    tokens
}

/// Wrap a styled-run sequence into lines of words.
pub fn wrap_runs(runs: &[StyledRun], policy: WidthPolicy, measure: &dyn Measure) -> Vec<WrappedLine> {
    let mut lines = Vec::new();

    for source_line in split_lines(runs) {
        let words = collect_words(&source_line);
        if words.is_empty() {
            lines.push(WrappedLine::default());
            continue;
        }

        let mut current = WrappedLine::default();
        let mut width = 0.0;

        for word in words {
            let (word_width, gap, limit) = match policy {
                WidthPolicy::Chars(max) => (word.char_count() as f64, 1.0, max.max(1) as f64),
                WidthPolicy::Measured(max) => {
                    let w = word.pieces.iter().map(|p| measure.run_width(p)).sum();
                    (w, measure.space_width(word.leading_style()), max)
                }
            };

            if current.is_blank() {
                width = word_width;
                current.words.push(word);
            } else if width + gap + word_width <= limit {
                width += gap + word_width;
                current.words.push(word);
            } else {
                lines.push(std::mem::take(&mut current));
                width = word_width;
                current.words.push(word);
            }
        }
        lines.push(current);
    }

    lines
}

/// Split runs at line feeds. Always yields at least one (possibly empty) line.
fn split_lines(runs: &[StyledRun]) -> Vec<Vec<StyledRun>> {
    let mut lines = vec![Vec::new()];
    for run in runs {
        let mut parts = run.text.split('\n');
        if let (Some(first), Some(line)) = (parts.next(), lines.last_mut()) {
            if !first.is_empty() {
                line.push(StyledRun::new(first, run.style));
            }
        }
        for part in parts {
            let mut line = Vec::new();
            if !part.is_empty() {
                line.push(StyledRun::new(part, run.style));
            }
            lines.push(line);
        }
    }
    lines
}

/// Group adjacent non-whitespace runs into words.
fn collect_words(runs: &[StyledRun]) -> Vec<Word> {
    let mut words = Vec::new();
    let mut pieces: Vec<StyledRun> = Vec::new();

    for run in runs {
        for (is_space, text) in split_whitespace_keep(&run.text) {
            if is_space {
                if !pieces.is_empty() {
                    words.push(Word { pieces: std::mem::take(&mut pieces) });
                }
            } else {
                pieces.push(StyledRun::new(text, run.style));
            }
        }
    }
    if !pieces.is_empty() {
        words.push(Word { pieces });
    }
    words
}

/// Alternating whitespace / non-whitespace slices of `text`.
fn split_whitespace_keep(text: &str) -> Vec<(bool, &str)> {
    let mut parts: Vec<(bool, &str)> = Vec::new();
    let mut start = 0;
    let mut state: Option<bool> = None;
    for (i, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        match state {
            Some(s) if s == space => {}
            Some(s) => {
                parts.push((s, &text[start..i]));
                start = i;
                state = Some(space);
            }
            None => state = Some(space),
        }
    }
    if let Some(s) = state {
        parts.push((s, &text[start..]));
    }
    parts
}

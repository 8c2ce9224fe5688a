//! Placeholder substitution.
//!
//! A placeholder is a field name between braces, `{name}`, matched literally
//! and case-sensitively. The name may not itself contain braces, so in
//! `{{name}` only the inner `{name}` is a placeholder.
//!
//! Body text is substituted leniently: placeholders naming unknown fields
//! are left as they are. Output filenames are strict: every placeholder must
//! name a field, otherwise the row fails with [`MergeError::UnknownTag`].

use crate::data::Row;
use crate::error::{MergeError, Result};
use crate::text::runs::StyledText;
use std::ops::Range;

/// Name used when a filename template resolves to nothing.
pub const DEFAULT_FILENAME: &str = "document";

/// How placeholders that name unknown fields are treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagMode {
    /// Leave unknown placeholders verbatim.
    #[default]
    Lenient,
    /// Fail on the first unknown placeholder.
    Strict,
}

/// A piece of a template, as char index ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Piece {
    Literal(Range<usize>),
    /// Range of the name between the braces.
    Tag(Range<usize>),
}

fn scan(chars: &[char]) -> Vec<Piece> {
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '{' {
            let name_start = i + 1;
            let close = chars[name_start..]
                .iter()
                .position(|&c| c == '{' || c == '}')
                .map(|p| name_start + p);
            if let Some(end) = close {
                if chars[end] == '}' && end > name_start {
                    if literal_start < i {
                        pieces.push(Piece::Literal(literal_start..i));
                    }
                    pieces.push(Piece::Tag(name_start..end));
                    i = end + 1;
                    literal_start = i;
                    continue;
                }
            }
        }
        i += 1;
    }
    if literal_start < chars.len() {
        pieces.push(Piece::Literal(literal_start..chars.len()));
    }
    pieces
}

fn name_of(chars: &[char], range: &Range<usize>) -> String {
    chars[range.clone()].iter().collect()
}

/// Every placeholder name in `template`, in order of appearance.
pub fn tags(template: &str) -> Vec<String> {
    let chars: Vec<char> = template.chars().collect();
    scan(&chars)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Tag(range) => Some(name_of(&chars, &range)),
            Piece::Literal(_) => None,
        })
        .collect()
}

/// Check that every placeholder names a field of `row`.
///
/// Reports the first unknown placeholder together with all available
/// field names.
pub fn validate(template: &str, row: &Row) -> Result<()> {
    match tags(template).into_iter().find(|tag| !row.contains(tag)) {
        Some(tag) => Err(MergeError::UnknownTag {
            tag,
            headers: row.headers().to_vec(),
        }),
        None => Ok(()),
    }
}

/// Replace placeholders in `template` with values from `row`.
///
/// Inserted values are not scanned again.
pub fn substitute(template: &str, row: &Row, mode: TagMode) -> Result<String> {
    if mode == TagMode::Strict {
        validate(template, row)?;
    }
    Ok(substitute_styled(&StyledText::plain(template), row).text())
}

/// Lenient substitution over styled text.
///
/// An inserted value takes the style of the placeholder's opening brace.
pub fn substitute_styled(template: &StyledText, row: &Row) -> StyledText {
    let styled = template.chars();
    let chars: Vec<char> = styled.iter().map(|(c, _)| *c).collect();
    let mut out = StyledText::default();

    for piece in scan(&chars) {
        match piece {
            Piece::Literal(range) => {
                for &(ch, style) in &styled[range] {
                    out.push(ch, style);
                }
            }
            Piece::Tag(range) => {
                let name = name_of(&chars, &range);
                match row.get(&name) {
                    Some(value) => out.push_str(value, styled[range.start - 1].1),
                    None => {
                        for &(ch, style) in &styled[range.start - 1..range.end + 1] {
                            out.push(ch, style);
                        }
                    }
                }
            }
        }
    }
    out
}

/// Resolve the output filename for `row`.
///
/// Substitution is strict. The result is trimmed, an empty name becomes
/// `document`, path separators in the name are replaced with `_`, and
/// `.pdf` is appended unless already present (in any case).
pub fn resolve_filename(template: &str, row: &Row) -> Result<String> {
    let substituted = substitute(template, row, TagMode::Strict)?;
    let mut name: String = substituted
        .trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    if name.is_empty() {
        name = DEFAULT_FILENAME.to_string();
    }
    if !name.to_lowercase().ends_with(".pdf") {
        name.push_str(".pdf");
    }
    Ok(name)
}

//! Escape-sequence expansion.
//!
//! Body templates are typed into single-line form fields, so line structure
//! is written as literal backslash tokens:
//!
//! - `\n` becomes a line feed
//! - `\t` becomes four spaces (output is position-measured, not tab-stopped)
//! - `\r` becomes a carriage return
//!
//! Line feeds are expanded first, tabs are then expanded line by line, and
//! carriage returns last. Each stage scans left to right and replaces
//! non-overlapping matches.

use crate::text::runs::{Style, StyledText};

const TAB_SPACES: &str = "    ";

/// Expand escape tokens in plain text.
pub fn process(text: &str) -> String {
    process_styled(&StyledText::plain(text)).text()
}

/// Expand escape tokens in styled text.
///
/// The characters produced by a token take the style of its backslash.
pub fn process_styled(text: &StyledText) -> StyledText {
    let expanded = expand(text.chars(), 'n', "\n");

    let mut tabbed = StyledText::default();
    let mut line_start = 0;
    let chars = expanded.chars();
    for i in 0..=chars.len() {
        if i == chars.len() || chars[i].0 == '\n' {
            let line = expand(&chars[line_start..i], 't', TAB_SPACES);
            for &(ch, style) in line.chars() {
                tabbed.push(ch, style);
            }
            if i < chars.len() {
                tabbed.push('\n', chars[i].1);
            }
            line_start = i + 1;
        }
    }

    expand(tabbed.chars(), 'r', "\r")
}

/// Replace every `\<token>` pair with `replacement`.
fn expand(chars: &[(char, Style)], token: char, replacement: &str) -> StyledText {
    let mut out = StyledText::default();
    let mut i = 0;
    while i < chars.len() {
        let (ch, style) = chars[i];
        if ch == '\\' && chars.get(i + 1).map(|c| c.0) == Some(token) {
            out.push_str(replacement, style);
            i += 2;
        } else {
            out.push(ch, style);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::runs::RichText;

    #[test]
    fn test_newline_token() {
        assert_eq!(process("a\\nb"), "a\nb");
        let out = process("a\\nb");
        let lines: Vec<&str> = out.split('\n').collect();
        assert_eq!(lines, vec!["a", "b"]);
    }

    #[test]
    fn test_tab_token_is_four_spaces() {
        assert_eq!(process("x\\ty"), "x    y");
        assert_eq!(process("\\t\\tindent"), "        indent");
    }

    #[test]
    fn test_carriage_return_token() {
        assert_eq!(process("a\\rb"), "a\rb");
    }

    #[test]
    fn test_mixed_tokens_on_several_lines() {
        assert_eq!(process("one\\n\\ttwo\\nthree\\t"), "one\n    two\nthree    ");
    }

    #[test]
    fn test_leftmost_match_wins() {
        // The first backslash is literal; the second starts the token.
        assert_eq!(process("a\\\\nb"), "a\\\nb");
    }

    #[test]
    fn test_real_control_chars_pass_through() {
        assert_eq!(process("a\nb\tc"), "a\nb\tc");
    }

    #[test]
    fn test_unknown_escape_is_literal() {
        assert_eq!(process("C:\\path\\x"), "C:\\path\\x");
    }

    #[test]
    fn test_expansion_inherits_style() {
        let rich = RichText::from_markup("<b>a\\tb</b>");
        let out = process_styled(&rich.to_styled());
        assert_eq!(out.text(), "a    b");
        assert!(out.chars().iter().all(|(_, s)| s.bold));
    }
}

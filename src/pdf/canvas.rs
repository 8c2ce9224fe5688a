//! Content-stream canvas.
//!
//! [`PageCanvas`] implements the renderer's [`Canvas`] by emitting PDF
//! content-stream operators. Fonts are registered as they are first used
//! and named `/F0`, `/F1`, ... in that order.

use std::fmt::Write as FmtWrite;

use crate::font::StandardFont;
use crate::render::Canvas;

/// Page dimensions in points, with the media box origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub x0: f64,
    pub y0: f64,
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// US Letter, the layout size when a template does not say otherwise.
    pub const LETTER: PageSize = PageSize {
        x0: 0.0,
        y0: 0.0,
        width: 612.0,
        height: 792.0,
    };
}

/// A finished overlay: content operators plus the fonts they reference.
#[derive(Debug, Clone)]
pub struct OverlayPage {
    pub size: PageSize,
    pub content: Vec<u8>,
    /// Font for resource name `/F{index}`.
    pub fonts: Vec<StandardFont>,
}

pub struct PageCanvas {
    size: PageSize,
    content: String,
    fonts: Vec<StandardFont>,
    current: Option<(usize, f64)>,
}

impl PageCanvas {
    pub fn new(size: PageSize) -> Self {
        Self {
            size,
            content: String::new(),
            fonts: Vec::new(),
            current: None,
        }
    }

    fn font_index(&mut self, font: StandardFont) -> usize {
        match self.fonts.iter().position(|f| *f == font) {
            Some(i) => i,
            None => {
                self.fonts.push(font);
                self.fonts.len() - 1
            }
        }
    }

    pub fn finish(self) -> OverlayPage {
        OverlayPage {
            size: self.size,
            content: self.content.into_bytes(),
            fonts: self.fonts,
        }
    }
}

impl Canvas for PageCanvas {
    fn set_font(&mut self, font: StandardFont, size: f64) {
        let index = self.font_index(font);
        self.current = Some((index, size));
    }

    fn draw_text(&mut self, x: f64, y: f64, text: &str) {
        let encoded = encode_win_ansi(text);
        if encoded.is_empty() {
            return;
        }
        let (font, size) = match self.current {
            Some(current) => current,
            None => (self.font_index(StandardFont::Helvetica), 12.0),
        };
        let _ = write!(
            self.content,
            "BT\n/F{} {:.2} Tf\n{:.2} {:.2} Td\n({}) Tj\nET\n",
            font,
            size,
            x,
            y,
            escape_pdf_string(&encoded)
        );
    }

    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64) {
        let _ = write!(
            self.content,
            "q\n{:.2} w\n{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n",
            width, x1, y1, x2, y2
        );
    }
}

/// Encode text for a WinAnsiEncoding simple font.
///
/// Control characters are dropped and characters the encoding cannot
/// represent become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .filter(|c| !c.is_control())
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => win_ansi_extra(c).unwrap_or(b'?'),
        })
        .collect()
}

/// WinAnsi's 0x80..=0x9F block.
fn win_ansi_extra(c: char) -> Option<u8> {
    Some(match c {
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        _ => return None,
    })
}

/// Escape encoded bytes for a PDF literal string.
fn escape_pdf_string(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for &b in bytes {
        match b {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            0x20..=0x7E => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn content(canvas: PageCanvas) -> String {
        String::from_utf8(canvas.finish().content).unwrap()
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(escape_pdf_string(b"Hello (World)"), "Hello \\(World\\)");
        assert_eq!(escape_pdf_string(b"back\\slash"), "back\\\\slash");
        assert_eq!(escape_pdf_string(&[0xE9]), "\\351");
    }

    #[test]
    fn test_win_ansi_encoding() {
        assert_eq!(encode_win_ansi("café"), b"caf\xE9".to_vec());
        assert_eq!(encode_win_ansi("a\rb"), b"ab".to_vec());
        assert_eq!(encode_win_ansi("“€”"), vec![0x93, 0x80, 0x94]);
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }

    #[test]
    fn test_text_operators() {
        let mut canvas = PageCanvas::new(PageSize::LETTER);
        canvas.set_font(StandardFont::HelveticaBold, 12.0);
        canvas.draw_text(61.2, 712.8, "Hi (you)");
        let out = content(canvas);
        assert_eq!(out, "BT\n/F0 12.00 Tf\n61.20 712.80 Td\n(Hi \\(you\\)) Tj\nET\n");
    }

    #[test]
    fn test_fonts_registered_in_first_use_order() {
        let mut canvas = PageCanvas::new(PageSize::LETTER);
        canvas.set_font(StandardFont::TimesRoman, 10.0);
        canvas.draw_text(0.0, 0.0, "a");
        canvas.set_font(StandardFont::TimesBold, 10.0);
        canvas.draw_text(0.0, 0.0, "b");
        canvas.set_font(StandardFont::TimesRoman, 10.0);
        canvas.draw_text(0.0, 0.0, "c");
        let page = canvas.finish();
        assert_eq!(page.fonts, vec![StandardFont::TimesRoman, StandardFont::TimesBold]);
        let out = String::from_utf8(page.content).unwrap();
        assert_eq!(out.matches("/F0 ").count(), 2);
        assert_eq!(out.matches("/F1 ").count(), 1);
    }

    #[test]
    fn test_line_operators() {
        let mut canvas = PageCanvas::new(PageSize::LETTER);
        canvas.draw_line(10.0, 698.5, 40.0, 698.5, 0.5);
        assert_eq!(content(canvas), "q\n0.50 w\n10.00 698.50 m\n40.00 698.50 l\nS\nQ\n");
    }

    #[test]
    fn test_empty_text_emits_nothing() {
        let mut canvas = PageCanvas::new(PageSize::LETTER);
        canvas.set_font(StandardFont::Courier, 12.0);
        canvas.draw_text(0.0, 0.0, "\r");
        assert!(content(canvas).is_empty());
    }
}

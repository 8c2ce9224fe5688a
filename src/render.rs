//! # Segment Renderer
//!
//! Places wrapped lines onto a page. The renderer does no line breaking of
//! its own: every [`WrappedLine`] becomes exactly one baseline.
//!
//! The cursor is an explicit value. Each line-drawing call takes the cursor
//! for its baseline and returns the cursor for the next one.
//!
//! Coordinates are PDF user space: origin at the bottom-left, y grows up.

use crate::font::{FontContext, StandardFont};
use crate::text::runs::StyledRun;
use crate::text::wrap::WrappedLine;

/// Distance of the underline below the baseline, in points.
pub const UNDERLINE_OFFSET: f64 = 1.5;
/// Stroke width of the underline, in points.
pub const UNDERLINE_WIDTH: f64 = 0.5;

/// The drawing primitive the renderer draws through.
pub trait Canvas {
    fn set_font(&mut self, font: StandardFont, size: f64);
    fn draw_text(&mut self, x: f64, y: f64, text: &str);
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, width: f64);
}

/// Position of the next baseline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub x: f64,
    pub y: f64,
}

impl Cursor {
    /// Cursor for a text block anchored at a percentage of the page.
    ///
    /// `x_percent` is measured from the left edge and `y_percent` from the
    /// top edge; the first baseline lands exactly there.
    pub fn at_percent(page_width: f64, page_height: f64, x_percent: f64, y_percent: f64) -> Self {
        Cursor {
            x: x_percent / 100.0 * page_width,
            y: page_height - y_percent / 100.0 * page_height,
        }
    }
}

/// The atomic drawing unit: a piece of text in one resolved font.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSegment {
    pub text: String,
    pub font: StandardFont,
    pub width: f64,
}

/// A segment with its horizontal position on the line.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedSegment {
    pub x: f64,
    pub segment: RenderSegment,
    pub underline: bool,
}

/// Draws lines at a fixed left edge using one font family and size.
pub struct SegmentRenderer<'a> {
    fonts: &'a FontContext,
}

impl<'a> SegmentRenderer<'a> {
    pub fn new(fonts: &'a FontContext) -> Self {
        Self { fonts }
    }

    pub fn line_height(&self) -> f64 {
        self.fonts.line_height()
    }

    fn segment(&self, run: &StyledRun) -> RenderSegment {
        let font = self.fonts.font_for(run.style);
        RenderSegment {
            width: self.fonts.width(&run.text, font),
            text: run.text.clone(),
            font,
        }
    }

    /// Lay a styled line out horizontally, starting at `x`.
    ///
    /// Pieces of one word abut. Consecutive words are separated by the width
    /// of one space in the font of the following word.
    pub fn place_line(&self, line: &WrappedLine, x: f64) -> Vec<PlacedSegment> {
        let mut placed = Vec::new();
        let mut pen = x;

        for (i, word) in line.words.iter().enumerate() {
            for (j, piece) in word.pieces.iter().enumerate() {
                let segment = self.segment(piece);
                if i > 0 && j == 0 {
                    pen += self.fonts.width(" ", segment.font);
                }
                let advance = segment.width;
                placed.push(PlacedSegment {
                    x: pen,
                    segment,
                    underline: piece.style.underline,
                });
                pen += advance;
            }
        }
        placed
    }

    /// Draw one styled line and return the cursor for the next line.
    pub fn render_line(&self, canvas: &mut dyn Canvas, line: &WrappedLine, cursor: Cursor) -> Cursor {
        let size = self.fonts.size();
        for placed in self.place_line(line, cursor.x) {
            let segment = &placed.segment;
            canvas.set_font(segment.font, size);
            canvas.draw_text(placed.x, cursor.y, &segment.text);
            if placed.underline {
                let y = cursor.y - UNDERLINE_OFFSET;
                canvas.draw_line(placed.x, y, placed.x + segment.width, y, UNDERLINE_WIDTH);
            }
        }
        self.next_line(cursor)
    }

    /// Draw a plain line verbatim, embedded spaces included, in the regular face.
    pub fn render_raw_line(&self, canvas: &mut dyn Canvas, text: &str, cursor: Cursor) -> Cursor {
        if !text.is_empty() {
            canvas.set_font(self.fonts.regular(), self.fonts.size());
            canvas.draw_text(cursor.x, cursor.y, text);
        }
        self.next_line(cursor)
    }

    /// Draw every line from `start` down; returns the cursor below the last line.
    pub fn render_lines(&self, canvas: &mut dyn Canvas, lines: &[WrappedLine], start: Cursor) -> Cursor {
        lines
            .iter()
            .fold(start, |cursor, line| self.render_line(canvas, line, cursor))
    }

    pub fn render_raw_lines(&self, canvas: &mut dyn Canvas, lines: &[String], start: Cursor) -> Cursor {
        lines
            .iter()
            .fold(start, |cursor, line| self.render_raw_line(canvas, line, cursor))
    }

    fn next_line(&self, cursor: Cursor) -> Cursor {
        Cursor {
            x: cursor.x,
            y: cursor.y - self.line_height(),
        }
    }
}

//! Advance widths for the standard PDF fonts.
//!
//! Values come from the Adobe Core14 AFM files, in units of 1/1000 em, for
//! the printable ASCII range (0x20..=0x7E) under WinAnsiEncoding. Oblique
//! Helvetica shares its upright widths; Courier is monospaced.

/// Width table for one standard font.
#[derive(Debug)]
pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    /// Advance used for any character outside the table.
    default_width: u16,
}

impl StandardFontMetrics {
    /// Advance width of a single character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let units = match ch as u32 {
            code @ 0x20..=0x7E => self.widths[(code - 0x20) as usize],
            code if code < 0x20 => 0,
            _ => self.default_width,
        };
        units as f64 * font_size / 1000.0
    }

    /// Advance width of a string in points.
    pub fn measure(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_WIDTHS,
    default_width: 556,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: &HELVETICA_BOLD_WIDTHS,
    default_width: 611,
};

pub static TIMES_ROMAN: StandardFontMetrics = StandardFontMetrics {
    widths: &TIMES_ROMAN_WIDTHS,
    default_width: 500,
};

pub static TIMES_BOLD: StandardFontMetrics = StandardFontMetrics {
    widths: &TIMES_BOLD_WIDTHS,
    default_width: 500,
};

pub static TIMES_ITALIC: StandardFontMetrics = StandardFontMetrics {
    widths: &TIMES_ITALIC_WIDTHS,
    default_width: 500,
};

pub static TIMES_BOLD_ITALIC: StandardFontMetrics = StandardFontMetrics {
    widths: &TIMES_BOLD_ITALIC_WIDTHS,
    default_width: 500,
};

pub static COURIER: StandardFontMetrics = StandardFontMetrics {
    widths: &[600; 95],
    default_width: 600,
};

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN_WIDTHS: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    278, 278, 564, 564, 564, 444, 921,
    722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889,
    722, 722, 556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611,
    333, 278, 333, 469, 500, 333,
    444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778,
    500, 500, 500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444,
    480, 200, 480, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_WIDTHS: [u16; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 930,
    722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944,
    722, 778, 611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667,
    333, 278, 333, 581, 500, 333,
    500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833,
    556, 500, 556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444,
    394, 220, 394, 520,
];

#[rustfmt::skip]
const TIMES_ITALIC_WIDTHS: [u16; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 675, 675, 675, 500, 920,
    611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833,
    667, 722, 611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556,
    389, 278, 389, 422, 500, 333,
    500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722,
    500, 500, 500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389,
    400, 275, 400, 541,
];

#[rustfmt::skip]
const TIMES_BOLD_ITALIC_WIDTHS: [u16; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500,
    333, 333, 570, 570, 570, 500, 832,
    667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889,
    722, 722, 611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611,
    333, 278, 333, 570, 500, 333,
    500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778,
    556, 500, 500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389,
    348, 220, 348, 570,
];

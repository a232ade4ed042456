//! Standard-14 Type1 fonts used for footer text.
//!
//! Every conforming PDF reader ships these fonts, so nothing needs to be
//! embedded: the footer only references the font by name. Text is encoded
//! with `WinAnsiEncoding`, and widths come from the Adobe AFM metrics so the
//! footer can be centred without loading a font file.

use serde::{Deserialize, Serialize};

/// A standard Type1 font that needs no embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StandardFont {
    #[default]
    Helvetica,
    HelveticaBold,
    Courier,
}

/// Advance widths (1/1000 em) for U+0020..=U+007E, Helvetica AFM.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // '0'..'?'
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 'P'..'_'
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // '`'..'o'
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 'p'..'~'
];

/// Advance widths (1/1000 em) for U+0020..=U+007E, Helvetica-Bold AFM.
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

const COURIER_WIDTH: u16 = 600;

/// Width used for characters outside the ASCII tables.
const FALLBACK_WIDTH: u16 = 556;

impl StandardFont {
    /// The `/BaseFont` name.
    pub fn base_font(self) -> &'static str {
        match self {
            StandardFont::Helvetica => "Helvetica",
            StandardFont::HelveticaBold => "Helvetica-Bold",
            StandardFont::Courier => "Courier",
        }
    }

    /// Advance width of one character in 1/1000 em.
    fn glyph_width(self, c: char) -> u16 {
        if self == StandardFont::Courier {
            return COURIER_WIDTH;
        }
        let table = match self {
            StandardFont::HelveticaBold => &HELVETICA_BOLD_WIDTHS,
            _ => &HELVETICA_WIDTHS,
        };
        match c {
            ' '..='~' => table[c as usize - 0x20],
            _ => FALLBACK_WIDTH,
        }
    }

    /// Width of `text` in points when set at `size` points.
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.glyph_width(c))).sum();
        units as f32 * size / 1000.0
    }

    /// Encode `text` as `WinAnsiEncoding` bytes.
    ///
    /// Latin-1 maps directly; the typographic punctuation WinAnsi places in
    /// 0x80..0x9F is translated; anything else becomes `?`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        text.chars().map(win_ansi_byte).collect()
    }
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
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
        _ => b'?',
    }
}

//! Bitmap font text rendering for the pixel canvas.
//!
//! Text is drawn with an 8×8 bitmap font scaled by an integer factor. Width
//! measurement is a pure function of the string, which keeps wrapping
//! deterministic and lets tests drive it with synthetic measurers.

use super::Canvas;
use crate::color::Color;
use crate::error::RenderError;

/// Horizontal anchor of a drawn string relative to its x coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextAlign {
    Left,
    Right,
}

/// Vertical anchor of a drawn string relative to its y coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextBaseline {
    Top,
    Middle,
}

/// A scaled face of the built-in bitmap font.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BitmapFont {
    pub scale: usize,
    pub bold: bool,
}

impl BitmapFont {
    pub const fn new(scale: usize, bold: bool) -> Self {
        Self { scale, bold }
    }

    /// Fail early when the face cannot produce any glyph metrics.
    pub fn validate(&self) -> Result<(), RenderError> {
        if self.scale == 0 {
            return Err(RenderError::Measurement("font scale must be at least 1".into()));
        }
        Ok(())
    }

    pub fn glyph_size(&self) -> usize {
        8 * self.scale
    }

    /// Distance from one glyph origin to the next.
    pub fn advance(&self) -> usize {
        8 * self.scale + self.scale
    }

    /// Rendered width of `text` in pixels, after folding to the face's
    /// repertoire.
    pub fn measure(&self, text: &str) -> f32 {
        (fold_text(text).chars().count() * self.advance()) as f32
    }

    /// Draw one line of text. `x` is the left or right edge per `align`,
    /// `y` the top or vertical middle per `baseline`.
    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        canvas: &mut Canvas,
        text: &str,
        x: i64,
        y: i64,
        align: TextAlign,
        baseline: TextBaseline,
        color: Color,
    ) {
        let width = self.measure(text) as i64;
        let start_x = match align {
            TextAlign::Left => x,
            TextAlign::Right => x - width,
        };
        let top = match baseline {
            TextBaseline::Top => y,
            TextBaseline::Middle => y - self.glyph_size() as i64 / 2,
        };

        for (i, ch) in fold_text(text).chars().enumerate() {
            let char_x = start_x + (i * self.advance()) as i64;
            draw_glyph(canvas, char_x, top, ch, color, self.scale);
            if self.bold {
                draw_glyph(canvas, char_x + 1, top, ch, color, self.scale);
            }
        }
    }
}

/// Greedy word wrap against a caller-supplied width function.
///
/// Words are separated by single spaces. A word that would push the line past
/// `max_width` starts a new line unless the current line is empty, so an
/// over-long word sits alone on its own line rather than being broken.
pub fn wrap_text<F>(measure: F, text: &str, max_width: f32) -> Vec<String>
where
    F: Fn(&str) -> f32,
{
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split(' ') {
        let candidate = format!("{}{} ", current, word);
        if measure(&candidate) > max_width && !current.is_empty() {
            lines.push(current.trim().to_string());
            current = format!("{} ", word);
        } else {
            current = candidate;
        }
    }

    if !current.trim().is_empty() {
        lines.push(current.trim().to_string());
    }

    lines
}

/// Map text onto the glyph table: uppercase it, replace accented Latin
/// letters with their base letters (ligatures expand, so `Æ` becomes `AE`)
/// and typographic punctuation with ASCII. Anything else is left as is and
/// drawn as a box.
pub fn fold_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars().flat_map(char::to_uppercase) {
        let folded = match ch {
            'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
            'Æ' => "AE",
            'Ç' | 'Ć' | 'Ĉ' | 'Ċ' | 'Č' => "C",
            'Ð' | 'Ď' | 'Đ' => "D",
            'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ĕ' | 'Ė' | 'Ę' | 'Ě' => "E",
            'Ĝ' | 'Ğ' | 'Ġ' | 'Ģ' => "G",
            'Ĥ' | 'Ħ' => "H",
            'Ì' | 'Í' | 'Î' | 'Ï' | 'Ĩ' | 'Ī' | 'Ĭ' | 'Į' | 'İ' => "I",
            'Ĵ' => "J",
            'Ķ' => "K",
            'Ĺ' | 'Ļ' | 'Ľ' | 'Ŀ' | 'Ł' => "L",
            'Ñ' | 'Ń' | 'Ņ' | 'Ň' => "N",
            'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ŏ' | 'Ő' => "O",
            'Œ' => "OE",
            'Ŕ' | 'Ŗ' | 'Ř' => "R",
            'Ś' | 'Ŝ' | 'Ş' | 'Š' | 'Ș' => "S",
            'ẞ' => "SS",
            'Ţ' | 'Ť' | 'Ŧ' | 'Ț' => "T",
            'Þ' => "TH",
            'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ũ' | 'Ū' | 'Ŭ' | 'Ů' | 'Ű' | 'Ų' => "U",
            'Ŵ' => "W",
            'Ý' | 'Ÿ' | 'Ŷ' => "Y",
            'Ź' | 'Ż' | 'Ž' => "Z",
            '‘' | '’' | '`' | '´' => "'",
            '“' | '”' => "\"",
            '–' | '‐' => "-",
            '…' => "...",
            '\u{a0}' => " ",
            _ => {
                out.push(ch);
                continue;
            }
        };
        out.push_str(folded);
    }
    out
}

/// Drawn for characters the face has no shape for, so they stay visible.
const MISSING_GLYPH: [u8; 8] = [0x7E, 0x42, 0x42, 0x42, 0x42, 0x42, 0x7E, 0x00];

/// 8x8 glyph rows for `ch`, most significant bit leftmost.
/// Lowercase letters share the uppercase shapes.
fn glyph_rows(ch: char) -> Option<[u8; 8]> {
    let ch = ch.to_ascii_uppercase();
    Some(match ch {
        'A' => [0x18, 0x24, 0x42, 0x7E, 0x42, 0x42, 0x42, 0x00],
        'B' => [0x7C, 0x42, 0x7C, 0x42, 0x42, 0x42, 0x7C, 0x00],
        'C' => [0x3C, 0x42, 0x40, 0x40, 0x40, 0x42, 0x3C, 0x00],
        'D' => [0x78, 0x44, 0x42, 0x42, 0x42, 0x44, 0x78, 0x00],
        'E' => [0x7E, 0x40, 0x7C, 0x40, 0x40, 0x40, 0x7E, 0x00],
        'F' => [0x7E, 0x40, 0x7C, 0x40, 0x40, 0x40, 0x40, 0x00],
        'G' => [0x3C, 0x42, 0x40, 0x4E, 0x42, 0x42, 0x3C, 0x00],
        'H' => [0x42, 0x42, 0x7E, 0x42, 0x42, 0x42, 0x42, 0x00],
        'I' => [0x3E, 0x08, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00],
        'J' => [0x1F, 0x04, 0x04, 0x04, 0x04, 0x44, 0x38, 0x00],
        'K' => [0x42, 0x44, 0x78, 0x48, 0x44, 0x42, 0x42, 0x00],
        'L' => [0x40, 0x40, 0x40, 0x40, 0x40, 0x40, 0x7E, 0x00],
        'M' => [0x42, 0x66, 0x5A, 0x42, 0x42, 0x42, 0x42, 0x00],
        'N' => [0x42, 0x62, 0x52, 0x4A, 0x46, 0x42, 0x42, 0x00],
        'O' => [0x3C, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00],
        'P' => [0x7C, 0x42, 0x42, 0x7C, 0x40, 0x40, 0x40, 0x00],
        'Q' => [0x3C, 0x42, 0x42, 0x42, 0x4A, 0x44, 0x3A, 0x00],
        'R' => [0x7C, 0x42, 0x42, 0x7C, 0x48, 0x44, 0x42, 0x00],
        'S' => [0x3C, 0x42, 0x30, 0x0C, 0x02, 0x42, 0x3C, 0x00],
        'T' => [0x7F, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00],
        'U' => [0x42, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00],
        'V' => [0x42, 0x42, 0x42, 0x42, 0x24, 0x24, 0x18, 0x00],
        'W' => [0x42, 0x42, 0x42, 0x5A, 0x5A, 0x66, 0x42, 0x00],
        'X' => [0x42, 0x24, 0x18, 0x18, 0x24, 0x42, 0x42, 0x00],
        'Y' => [0x41, 0x22, 0x14, 0x08, 0x08, 0x08, 0x08, 0x00],
        'Z' => [0x7E, 0x04, 0x08, 0x10, 0x20, 0x40, 0x7E, 0x00],
        '0' => [0x3C, 0x42, 0x46, 0x5A, 0x62, 0x42, 0x3C, 0x00],
        '1' => [0x08, 0x18, 0x28, 0x08, 0x08, 0x08, 0x3E, 0x00],
        '2' => [0x3C, 0x42, 0x02, 0x0C, 0x30, 0x40, 0x7E, 0x00],
        '3' => [0x3C, 0x42, 0x02, 0x1C, 0x02, 0x42, 0x3C, 0x00],
        '4' => [0x04, 0x0C, 0x14, 0x24, 0x7E, 0x04, 0x04, 0x00],
        '5' => [0x7E, 0x40, 0x7C, 0x02, 0x02, 0x42, 0x3C, 0x00],
        '6' => [0x1C, 0x20, 0x40, 0x7C, 0x42, 0x42, 0x3C, 0x00],
        '7' => [0x7E, 0x02, 0x04, 0x08, 0x10, 0x10, 0x10, 0x00],
        '8' => [0x3C, 0x42, 0x42, 0x3C, 0x42, 0x42, 0x3C, 0x00],
        '9' => [0x3C, 0x42, 0x42, 0x3E, 0x02, 0x04, 0x38, 0x00],
        ' ' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        '-' => [0x00, 0x00, 0x00, 0x7E, 0x00, 0x00, 0x00, 0x00],
        '—' => [0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x00],
        '.' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00],
        ',' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x08, 0x10],
        '!' => [0x08, 0x08, 0x08, 0x08, 0x08, 0x00, 0x08, 0x00],
        '?' => [0x3C, 0x42, 0x02, 0x0C, 0x10, 0x00, 0x10, 0x00],
        ':' => [0x00, 0x18, 0x18, 0x00, 0x18, 0x18, 0x00, 0x00],
        ';' => [0x00, 0x18, 0x18, 0x00, 0x18, 0x08, 0x10, 0x00],
        '\'' => [0x08, 0x08, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00],
        '"' => [0x24, 0x24, 0x48, 0x00, 0x00, 0x00, 0x00, 0x00],
        '(' => [0x04, 0x08, 0x10, 0x10, 0x10, 0x08, 0x04, 0x00],
        ')' => [0x20, 0x10, 0x08, 0x08, 0x08, 0x10, 0x20, 0x00],
        '[' => [0x1C, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1C, 0x00],
        ']' => [0x38, 0x08, 0x08, 0x08, 0x08, 0x08, 0x38, 0x00],
        '&' => [0x30, 0x48, 0x30, 0x50, 0x4A, 0x44, 0x3A, 0x00],
        '/' => [0x02, 0x04, 0x08, 0x10, 0x20, 0x40, 0x00, 0x00],
        '+' => [0x00, 0x08, 0x08, 0x3E, 0x08, 0x08, 0x00, 0x00],
        '#' => [0x24, 0x7E, 0x24, 0x24, 0x7E, 0x24, 0x00, 0x00],
        '*' => [0x00, 0x2A, 0x1C, 0x3E, 0x1C, 0x2A, 0x00, 0x00],
        '_' => [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7E, 0x00],
        _ => return None,
    })
}

fn draw_glyph(canvas: &mut Canvas, x: i64, y: i64, ch: char, color: Color, scale: usize) {
    let rows = glyph_rows(ch).unwrap_or(MISSING_GLYPH);
    let s = scale as i64;
    for (row_idx, &bits) in rows.iter().enumerate() {
        for col in (0..8i64).filter(|col| bits & (0x80u8 >> *col) != 0) {
            canvas.fill_rect(x + col * s, y + row_idx as i64 * s, s, s, color, 1.0);
        }
    }
}

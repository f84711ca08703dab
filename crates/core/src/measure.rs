//! Text measurement capability.
//!
//! The fit search only needs "how wide is this string at this size in this
//! family". Hosts with real font metrics (a browser canvas, a font shaper)
//! supply their own [`TextMeasure`]; [`EmMetrics`] is a table-based
//! approximation for headless use.

/// Rendered pixel width of a string.
pub trait TextMeasure {
    fn measure(&self, text: &str, font_size: f64, font_family: &str) -> f64;
}

impl<F> TextMeasure for F
where
    F: Fn(&str, f64, &str) -> f64,
{
    fn measure(&self, text: &str, font_size: f64, font_family: &str) -> f64 {
        self(text, font_size, font_family)
    }
}

/// Approximate measurement from per-character em widths.
///
/// Widths are typical of a proportional sans-serif; CJK and other full-width
/// characters count one em. The font family is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmMetrics;

impl EmMetrics {
    pub fn new() -> Self {
        Self
    }

    /// Width of `text` in em units.
    pub fn measure_em(&self, text: &str) -> f64 {
        text.chars().map(char_em_width).sum()
    }
}

impl TextMeasure for EmMetrics {
    fn measure(&self, text: &str, font_size: f64, _font_family: &str) -> f64 {
        self.measure_em(text) * font_size
    }
}

fn char_em_width(c: char) -> f64 {
    match c {
        ' ' => 0.28,
        'i' | 'l' | 'j' | 't' | 'f' | 'I' | '.' | ',' | ';' | ':' | '\'' | '!' | '|' => 0.28,
        'r' | '(' | ')' | '[' | ']' | '-' | '"' => 0.36,
        'm' | 'w' | 'M' | 'W' | '@' | '%' => 0.86,
        '0'..='9' => 0.56,
        'A'..='Z' => 0.68,
        'a'..='z' => 0.53,
        c if is_full_width(c) => 1.0,
        c if c.is_ascii() => 0.56,
        _ => 0.6,
    }
}

fn is_full_width(c: char) -> bool {
    matches!(c as u32,
        0x1100..=0x115F      // Hangul Jamo
        | 0x2E80..=0xA4CF    // CJK radicals through Yi
        | 0xAC00..=0xD7A3    // Hangul syllables
        | 0xF900..=0xFAFF    // CJK compatibility ideographs
        | 0xFE30..=0xFE4F    // CJK compatibility forms
        | 0xFF00..=0xFF60    // Full-width forms
        | 0xFFE0..=0xFFE6
        | 0x20000..=0x3FFFD)
}

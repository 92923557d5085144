//! Character style attached to vector words.
//!
//! PDF content streams rarely carry explicit bold/italic flags; like most
//! extractors we infer them from the font name. OCR words carry no style.

use serde::{Deserialize, Serialize};

/// Visual style of a word, derived from its font attributes.
///
/// Only words extracted from the PDF content stream carry a style; OCR
/// words have none.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Style {
    /// Raw font name as reported by the PDF (e.g. `"Helvetica-BoldOblique"`)
    pub font_name: String,
    /// Font size in user units
    pub font_size: f32,
    /// Inferred from a `bold` substring in the font name
    pub bold: bool,
    /// Inferred from an `italic` or `oblique` substring
    pub italic: bool,
    /// Fill (non-stroking) colour as `[r, g, b]`, when known
    #[serde(default)]
    pub color: Option<[u8; 3]>,
    /// Inferred from an `underline` substring
    pub underline: bool,
    /// Inferred from a `strike`/`strikethrough` substring
    pub strike: bool,
    /// Inferred from a `super` substring
    pub superscript: bool,
    /// Inferred from a `sub` substring
    pub subscript: bool,
    /// Background colour, when known (never set by the vector extractor)
    #[serde(default)]
    pub background_color: Option<[u8; 3]>,
}

impl Style {
    /// Infer a style from a font name, size and fill colour.
    ///
    /// All substring matches are case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use page_oxide::model::Style;
    ///
    /// let s = Style::from_font("Arial-BoldItalic", 11.0, None);
    /// assert!(s.bold);
    /// assert!(s.italic);
    /// assert!(!s.underline);
    /// ```
    pub fn from_font(font_name: &str, font_size: f32, color: Option<[u8; 3]>) -> Self {
        let lower = font_name.to_lowercase();
        Style {
            font_name: font_name.to_string(),
            font_size,
            bold: lower.contains("bold"),
            italic: lower.contains("italic") || lower.contains("oblique"),
            color,
            underline: lower.contains("underline"),
            strike: lower.contains("strike"),
            superscript: lower.contains("super"),
            subscript: lower.contains("sub"),
            background_color: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_font() {
        let s = Style::from_font("Times-Roman", 12.0, None);
        assert!(!s.bold && !s.italic && !s.underline && !s.strike);
        assert_eq!(s.font_size, 12.0);
    }

    #[test]
    fn test_oblique_is_italic() {
        let s = Style::from_font("Helvetica-Oblique", 10.0, None);
        assert!(s.italic);
        assert!(!s.bold);
    }

    #[test]
    fn test_case_insensitive_bold() {
        assert!(Style::from_font("ARIALBOLD", 9.0, None).bold);
        assert!(Style::from_font("arial-bold", 9.0, None).bold);
    }

    #[test]
    fn test_strikethrough_variants() {
        assert!(Style::from_font("Font-Strike", 9.0, None).strike);
        assert!(Style::from_font("Font-Strikethrough", 9.0, None).strike);
    }

    #[test]
    fn test_super_and_subscript() {
        assert!(Style::from_font("Math-Super", 7.0, None).superscript);
        assert!(Style::from_font("Math-Sub", 7.0, None).subscript);
    }

    #[test]
    fn test_color_passthrough() {
        let s = Style::from_font("Times", 12.0, Some([255, 0, 0]));
        assert_eq!(s.color, Some([255, 0, 0]));
        assert_eq!(s.background_color, None);
    }
}

//! Formula classification and rendering.
//!
//! A block or sentence is a formula zone when its text either contains a
//! mathematical token, or consists entirely of mathematical-class
//! characters with at least one operator or symbol among them.
//!
//! Formula text is exported twice: wrapped as inline LaTeX (`$...$`) and
//! as a flat MathML tree with one `<mi>` element per character.

use crate::error::{Error, Result};
use lazy_static::lazy_static;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use regex::Regex;
use std::io::Cursor;

/// Substrings that immediately mark a text as mathematical.
const FORMULA_TOKENS: &[&str] = &[
    "=", "+", "\u{2212}", "\u{2211}", "\u{222b}", "lim", "sin", "cos", "tan", "\u{221a}", "^",
    "_", "{", "}",
];

lazy_static! {
    /// Full-string mathematical character class.
    static ref MATH_CLASS: Regex = Regex::new(
        r"^[\d\s\w+\-*/^=(){}\[\]\\.,;:<>√α-ωΑ-Ω∑∫∞≈≠±×÷°µ€$§%→←↔ΔΣλπρθΩ]+$"
    )
    .expect("formula class regex");

    /// Operators and symbols that distinguish a formula from prose that
    /// merely stays inside the character class.
    static ref MATH_SYMBOL: Regex = Regex::new(
        r"[+*/^=<>{}\[\]\\√α-ωΑ-Ω∑∫∞≈≠±×÷°µ→←↔ΔΣλπρθΩ]"
    )
    .expect("formula symbol regex");
}

/// Decide whether a text reads as mathematical content.
///
/// # Examples
///
/// ```
/// use page_oxide::fusion::is_formula_zone;
///
/// assert!(is_formula_zone("E = m c ^ 2"));
/// assert!(is_formula_zone("α + β"));
/// assert!(!is_formula_zone("Hello world"));
/// assert!(!is_formula_zone("- First item"));
/// ```
pub fn is_formula_zone(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return false;
    }
    if FORMULA_TOKENS.iter().any(|t| trimmed.contains(t)) {
        return true;
    }
    MATH_CLASS.is_match(trimmed) && MATH_SYMBOL.is_match(trimmed)
}

/// Wrap a formula text as inline LaTeX.
pub fn formula_latex(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("${}$", trimmed)
    }
}

/// Build a flat MathML tree for a formula text: one `<mi>` element per
/// character, wrapped in a single `<mrow>`.
pub fn formula_mathml(text: &str) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    let mut math = BytesStart::new("math");
    math.push_attribute(("xmlns", "http://www.w3.org/1998/Math/MathML"));
    write_event(&mut writer, Event::Start(math))?;
    write_event(&mut writer, Event::Start(BytesStart::new("mrow")))?;
    for c in text.chars() {
        let symbol = c.to_string();
        write_event(&mut writer, Event::Start(BytesStart::new("mi")))?;
        write_event(&mut writer, Event::Text(BytesText::new(&symbol)))?;
        write_event(&mut writer, Event::End(BytesEnd::new("mi")))?;
    }
    write_event(&mut writer, Event::End(BytesEnd::new("mrow")))?;
    write_event(&mut writer, Event::End(BytesEnd::new("math")))?;

    String::from_utf8(writer.into_inner().into_inner())
        .map_err(|e| Error::Export(format!("MathML not valid UTF-8: {}", e)))
}

fn write_event<W: std::io::Write>(writer: &mut Writer<W>, event: Event) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::Export(format!("Failed to write MathML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equation_is_formula() {
        assert!(is_formula_zone("E = m c ^ 2"));
        assert!(is_formula_zone("x_1 + x_2"));
        assert!(is_formula_zone("lim f(x)"));
    }

    #[test]
    fn test_prose_is_not_formula() {
        assert!(!is_formula_zone("Hello world"));
        assert!(!is_formula_zone("Une phrase ordinaire."));
        assert!(!is_formula_zone(""));
        assert!(!is_formula_zone("   "));
    }

    #[test]
    fn test_list_marker_is_not_formula() {
        assert!(!is_formula_zone("- First item"));
    }

    #[test]
    fn test_greek_symbols_are_formula() {
        assert!(is_formula_zone("α β γ"));
        assert!(is_formula_zone("Δ x ÷ 2"));
    }

    #[test]
    fn test_acronym_is_not_formula() {
        assert!(!is_formula_zone("UNESCO"));
    }

    #[test]
    fn test_latex_wrapper() {
        assert_eq!(formula_latex(" E = m c ^ 2 "), "$E = m c ^ 2$");
        assert_eq!(formula_latex(""), "");
    }

    #[test]
    fn test_mathml_shape() {
        let mathml = formula_mathml("E=2").unwrap();
        assert!(mathml.starts_with("<math"));
        assert!(mathml.contains("xmlns=\"http://www.w3.org/1998/Math/MathML\""));
        assert!(mathml.contains("<mrow>"));
        assert!(mathml.contains("<mi>E</mi>"));
        assert!(mathml.contains("<mi>=</mi>"));
        assert!(mathml.contains("<mi>2</mi>"));
        assert!(mathml.trim_end().ends_with("</math>"));
    }

    #[test]
    fn test_mathml_escapes_markup() {
        let mathml = formula_mathml("a<b").unwrap();
        assert!(mathml.contains("&lt;"));
    }
}

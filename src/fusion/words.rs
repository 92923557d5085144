//! Word stream fusion.
//!
//! The vector and OCR extractors see the same page through different
//! eyes; on born-digital pages most OCR words duplicate a vector word.
//! Fusion keeps the vector stream intact and appends only the OCR words
//! whose `(text, bbox)` identity is new.

use crate::model::Word;
use std::collections::HashSet;

/// Exact dedup key: the word text plus the bit patterns of its bbox.
fn dedup_key(word: &Word) -> (String, [u32; 4]) {
    (
        word.text.clone(),
        [
            word.bbox.x0.to_bits(),
            word.bbox.y0.to_bits(),
            word.bbox.x1.to_bits(),
            word.bbox.y1.to_bits(),
        ],
    )
}

/// Build the fused word stream from the two extractors.
///
/// Ordering is stable: vector words first in extraction order, then the
/// surviving OCR words in recognition order. No two words in the result
/// share `(text, bbox)`.
///
/// # Examples
///
/// ```
/// use page_oxide::fusion::fuse_word_streams;
/// use page_oxide::geometry::BBox;
/// use page_oxide::model::{Style, Word};
///
/// let b = BBox::new(10.0, 10.0, 40.0, 20.0);
/// let vector = vec![Word::vector("Hello", b, Style::default())];
/// let ocr = vec![
///     Word::ocr("Hello", b),                                  // duplicate, dropped
///     Word::ocr("world", BBox::new(45.0, 10.0, 80.0, 20.0)),  // new, kept
/// ];
/// let fused = fuse_word_streams(vector, ocr);
/// assert_eq!(fused.len(), 2);
/// assert_eq!(fused[1].text, "world");
/// ```
pub fn fuse_word_streams(vector: Vec<Word>, ocr: Vec<Word>) -> Vec<Word> {
    let mut seen: HashSet<(String, [u32; 4])> = vector.iter().map(dedup_key).collect();
    let mut fused = vector;
    let ocr_total = ocr.len();
    for word in ocr {
        if seen.insert(dedup_key(&word)) {
            fused.push(word);
        }
    }
    log::debug!(
        "Word fusion: {} total ({} OCR candidates)",
        fused.len(),
        ocr_total
    );
    fused
}

//! Ultra-fine sentence segmentation.
//!
//! A block's words are flattened into a single text, run through a
//! sentence splitter, and mapped back to the exact words each sentence
//! covers. The selected words are then re-clustered into visual lines so
//! a wrapped sentence carries one bbox per line it spans. This exact
//! word-to-bbox provenance is what lets a downstream renderer lay a
//! translation over the original geometry.

use crate::fusion::lines::cluster_rows;
use crate::geometry::BBox;
use crate::model::{Sentence, SentenceWord, Style, Word};
use std::cmp::Ordering;
use unicode_segmentation::UnicodeSegmentation;

/// A sentence-boundary engine.
///
/// Implementations must return the input text partitioned into sentence
/// substrings, in order. The pipeline holds one splitter for the whole
/// process; implementations must be safe for concurrent read-only use.
pub trait SentenceSplitter: Send + Sync {
    /// Split `text` into sentences for the given language hint.
    fn split(&self, text: &str, language: &str) -> Vec<String>;
}

/// UAX #29 sentence segmentation with language-specific refinements for
/// scripts whose terminators the default rules miss.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnicodeSplitter;

impl SentenceSplitter for UnicodeSplitter {
    fn split(&self, text: &str, language: &str) -> Vec<String> {
        match language {
            "ja" => split_on_terminators(text, &['。', '！', '？']),
            "zh" | "zh-CN" | "zh-TW" => split_on_terminators(text, &['。', '！', '？', '；']),
            _ => text.unicode_sentences().map(str::to_string).collect(),
        }
    }
}

fn split_on_terminators(text: &str, terminators: &[char]) -> Vec<String> {
    text.split(terminators)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Segment a block's words into sentences with per-line bboxes.
///
/// Words are sorted by `(y0, x0)`, joined with single spaces, split into
/// sentences, and each sentence is matched back to the contiguous word
/// run whose concatenation equals the sentence text. The walk is robust
/// to splitters that normalise whitespace: it skips leading spaces and
/// matches word-by-word rather than comparing offsets strictly.
///
/// Sentence flags (`is_formula`, `is_sigle`, links) are left unset here;
/// the block fuser fills them.
pub fn segment_words_into_sentences(
    words: &[Word],
    splitter: &dyn SentenceSplitter,
    language: &str,
    line_threshold: f32,
) -> Vec<Sentence> {
    if words.is_empty() {
        return vec![];
    }

    let mut sorted: Vec<&Word> = words.iter().collect();
    sorted.sort_by(|a, b| {
        a.bbox
            .y0
            .partial_cmp(&b.bbox.y0)
            .unwrap_or(Ordering::Equal)
            .then(a.bbox.x0.partial_cmp(&b.bbox.x0).unwrap_or(Ordering::Equal))
    });

    let joined = sorted
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");

    let mut sentences = Vec::new();
    let mut cursor = 0; // next unconsumed word in `sorted`
    for raw in splitter.split(&joined, language) {
        let phrase = raw.trim();
        if phrase.is_empty() {
            continue;
        }

        let taken = match_words(phrase, &sorted[cursor..]);
        let members: Vec<&Word> = sorted[cursor..cursor + taken].to_vec();
        cursor += taken;

        sentences.push(build_sentence(phrase, &members, line_threshold));
    }
    log::debug!("Segmented {} words into {} sentences", words.len(), sentences.len());
    sentences
}

/// Count how many leading words of `rest` the sentence text covers.
fn match_words(phrase: &str, rest: &[&Word]) -> usize {
    let mut pos = 0;
    let mut taken = 0;
    for word in rest {
        let remaining = phrase[pos..].trim_start();
        pos = phrase.len() - remaining.len();
        if remaining.is_empty() || !remaining.starts_with(word.text.as_str()) {
            break;
        }
        pos += word.text.len();
        taken += 1;
    }
    taken
}

fn build_sentence(phrase: &str, members: &[&Word], line_threshold: f32) -> Sentence {
    let boxes: Vec<BBox> = members.iter().map(|w| w.bbox).collect();
    let bboxes = cluster_rows(&boxes, line_threshold)
        .into_iter()
        .filter_map(|row| BBox::cover(row.into_iter().map(|i| boxes[i])))
        .collect();

    let style: Option<Style> = members.first().and_then(|w| w.style.clone());
    Sentence {
        phrase: phrase.to_string(),
        bboxes,
        words: members
            .iter()
            .map(|w| SentenceWord {
                text: w.text.clone(),
                bbox: w.bbox,
                source: w.source,
            })
            .collect(),
        style,
        links: vec![],
        is_formula: false,
        is_sigle: false,
        non_translatable: false,
        mathml: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WordSource;

    fn word(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> Word {
        Word::ocr(text, BBox::new(x0, y0, x1, y1))
    }

    #[test]
    fn test_single_sentence_single_line() {
        let words = vec![
            word("Hello", 10.0, 10.0, 40.0, 20.0),
            word("world", 45.0, 10.0, 80.0, 20.0),
        ];
        let sentences =
            segment_words_into_sentences(&words, &UnicodeSplitter, "en", 2.5);
        assert_eq!(sentences.len(), 1);
        let s = &sentences[0];
        assert_eq!(s.phrase, "Hello world");
        assert_eq!(s.bboxes, vec![BBox::new(10.0, 10.0, 80.0, 20.0)]);
        assert_eq!(s.words.len(), 2);
        assert_eq!(s.words[0].source, WordSource::Ocr);
    }

    #[test]
    fn test_two_sentences_split_and_matched() {
        let words = vec![
            word("Alpha", 10.0, 10.0, 40.0, 20.0),
            word("beta.", 45.0, 10.0, 80.0, 20.0),
            word("Gamma", 10.0, 25.0, 45.0, 35.0),
        ];
        let sentences =
            segment_words_into_sentences(&words, &UnicodeSplitter, "en", 2.5);
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0].phrase, "Alpha beta.");
        assert_eq!(sentences[0].bboxes, vec![BBox::new(10.0, 10.0, 80.0, 20.0)]);
        assert_eq!(sentences[1].phrase, "Gamma");
        assert_eq!(sentences[1].bboxes, vec![BBox::new(10.0, 25.0, 45.0, 35.0)]);
    }

    #[test]
    fn test_wrapped_sentence_has_one_bbox_per_line() {
        let words = vec![
            word("Une", 10.0, 10.0, 30.0, 20.0),
            word("longue", 35.0, 10.0, 70.0, 20.0),
            word("phrase", 10.0, 25.0, 45.0, 35.0),
            word("continue.", 50.0, 25.0, 95.0, 35.0),
        ];
        let sentences =
            segment_words_into_sentences(&words, &UnicodeSplitter, "fr", 2.5);
        assert_eq!(sentences.len(), 1);
        let s = &sentences[0];
        assert_eq!(s.phrase, "Une longue phrase continue.");
        assert_eq!(s.bboxes.len(), 2);
        assert_eq!(s.bboxes[0], BBox::new(10.0, 10.0, 70.0, 20.0));
        assert_eq!(s.bboxes[1], BBox::new(10.0, 25.0, 95.0, 35.0));
        assert_eq!(s.words.len(), 4);
    }

    #[test]
    fn test_phrase_equals_joined_words() {
        let words = vec![
            word("One", 0.0, 0.0, 10.0, 5.0),
            word("two.", 12.0, 0.0, 22.0, 5.0),
            word("Three", 0.0, 10.0, 15.0, 15.0),
            word("four.", 17.0, 10.0, 30.0, 15.0),
        ];
        let sentences =
            segment_words_into_sentences(&words, &UnicodeSplitter, "en", 2.5);
        for s in &sentences {
            if !s.words.is_empty() {
                let joined = s
                    .words
                    .iter()
                    .map(|w| w.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                assert_eq!(s.phrase, joined);
            }
        }
    }

    #[test]
    fn test_style_inherited_from_first_word() {
        let style = Style::from_font("Arial-Bold", 12.0, None);
        let words = vec![
            Word::vector("Bold", BBox::new(0.0, 0.0, 20.0, 10.0), style),
            word("plain", 25.0, 0.0, 50.0, 10.0),
        ];
        let sentences =
            segment_words_into_sentences(&words, &UnicodeSplitter, "en", 2.5);
        assert!(sentences[0].style.as_ref().unwrap().bold);
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_words_into_sentences(&[], &UnicodeSplitter, "en", 2.5).is_empty());
    }

    #[test]
    fn test_cjk_terminator_split() {
        let words = vec![
            word("こんにちは。", 0.0, 0.0, 50.0, 10.0),
            word("さようなら。", 0.0, 15.0, 50.0, 25.0),
        ];
        let sentences = segment_words_into_sentences(&words, &UnicodeSplitter, "ja", 2.5);
        assert_eq!(sentences.len(), 2);
    }

    struct WhitespaceManglingSplitter;

    impl SentenceSplitter for WhitespaceManglingSplitter {
        fn split(&self, text: &str, _language: &str) -> Vec<String> {
            // Simulates an NLP engine that collapses runs of spaces.
            vec![format!("  {}  ", text)]
        }
    }

    #[test]
    fn test_robust_to_whitespace_normalisation() {
        let words = vec![
            word("Hello", 10.0, 10.0, 40.0, 20.0),
            word("world", 45.0, 10.0, 80.0, 20.0),
        ];
        let sentences =
            segment_words_into_sentences(&words, &WhitespaceManglingSplitter, "en", 2.5);
        assert_eq!(sentences.len(), 1);
        assert_eq!(sentences[0].words.len(), 2);
    }
}

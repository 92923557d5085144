//! The structural page model.
//!
//! The model is a strict tree: Page -> Blocks -> Sentences -> Words.
//! Visual lines (`Line`) reference words by index into the page's fused
//! word stream instead of owning copies, so a word has exactly one owner.
//!
//! Wire-schema serialisation lives in [`crate::export::schema`]; the
//! types here are the in-memory working set of the pipeline.

mod style;

pub use style::Style;

use crate::geometry::BBox;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Origin of an extracted word.
///
/// Serialised as `"pdf"` / `"ocr"` per the wire schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WordSource {
    /// Pulled from the PDF content stream with font metadata
    #[serde(rename = "pdf")]
    Vector,
    /// Recognised by OCR on the page bitmap
    #[serde(rename = "ocr")]
    Ocr,
}

/// A positioned word on the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    /// Word text, never empty
    pub text: String,
    /// Bounding box in user units
    pub bbox: BBox,
    /// Style, present only for vector words
    pub style: Option<Style>,
    /// Which extractor produced the word
    pub source: WordSource,
}

impl Word {
    /// Create a vector word with an inferred style.
    pub fn vector(text: impl Into<String>, bbox: BBox, style: Style) -> Self {
        Word {
            text: text.into(),
            bbox,
            style: Some(style),
            source: WordSource::Vector,
        }
    }

    /// Create a style-less OCR word.
    pub fn ocr(text: impl Into<String>, bbox: BBox) -> Self {
        Word {
            text: text.into(),
            bbox,
            style: None,
            source: WordSource::Ocr,
        }
    }
}

/// A visual baseline line: words sharing a y-band, left to right.
///
/// `words` holds indices into the page's fused word stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Member word texts joined with single spaces
    pub text: String,
    /// Tight cover of the member word boxes
    pub bbox: BBox,
    /// Indices of member words in sweep order
    pub words: Vec<usize>,
}

/// A hyperlink annotation: target URI plus its active rectangle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hyperlink {
    /// Link target
    pub uri: String,
    /// Active rectangle in user units
    pub bbox: BBox,
}

/// A word as carried inside a sentence: text, box and provenance only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceWord {
    /// Word text
    pub text: String,
    /// Bounding box in user units
    pub bbox: BBox,
    /// Which extractor produced the word
    pub source: WordSource,
}

/// A linguistic sentence within a block.
///
/// A sentence that wraps across visual lines carries one bbox per line,
/// which is what allows a downstream renderer to re-flow a translation
/// over the exact same area.
#[derive(Debug, Clone, PartialEq)]
pub struct Sentence {
    /// Sentence text as returned by the splitter
    pub phrase: String,
    /// One bbox per visual line the sentence spans
    pub bboxes: Vec<BBox>,
    /// Member words, a contiguous run of the block's word stream
    pub words: Vec<SentenceWord>,
    /// Style of the first member word, when any
    pub style: Option<Style>,
    /// Hyperlinks attached to this sentence
    pub links: Vec<Hyperlink>,
    /// Mathematical-content heuristic result
    pub is_formula: bool,
    /// Known-acronym match
    pub is_sigle: bool,
    /// `is_formula || is_sigle`
    pub non_translatable: bool,
    /// MathML rendering when the sentence is a formula, else empty
    pub mathml: String,
}

/// Region type proposed by the layout segmenter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockKind {
    /// Running text
    Text,
    /// Heading
    Title,
    /// Bulleted or numbered list
    List,
    /// Tabular region
    Table,
    /// Image or figure region
    Figure,
}

impl BlockKind {
    /// True for the block types whose empty interior triggers the OCR
    /// crop fallback.
    pub fn wants_ocr_fallback(&self) -> bool {
        matches!(self, BlockKind::Text | BlockKind::Title | BlockKind::List)
    }
}

/// Horizontal alignment of a block's words against its edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left margins hug the block's left edge
    Left,
    /// Right margins hug the block's right edge
    Right,
    /// Neither margin is consistent
    Center,
    /// Both margins hug their edges
    Justify,
    /// No words to measure
    Unknown,
}

/// List marker metadata detected on a List block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListMeta {
    /// `"bullet"`, `"numbered"`, or `None` when no marker matched
    pub list_type: Option<String>,
    /// Nesting level (always 1 for a detected marker)
    pub level: u32,
    /// The marker characters, e.g. `"-"` or `"1."`
    #[serde(rename = "char")]
    pub marker: String,
}

/// Formula classification attached to a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaData {
    /// Always true when this struct is present
    pub is_formula: bool,
    /// The block text wrapped as `$...$`
    pub latex: String,
    /// Cropped formula image, when persisting it succeeded
    pub img_path: Option<String>,
    /// MathML file, when persisting it succeeded
    pub mathml_path: Option<String>,
}

/// A fused block: an ML-proposed region joined with its word content.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Dense per-page id, starting at 0
    pub id: usize,
    /// Region type
    pub kind: BlockKind,
    /// Region bbox in user units
    pub bbox: BBox,
    /// Segmenter confidence in `[0, 1]`
    pub score: f32,
    /// All sentence texts joined with single spaces
    pub ocr_text: String,
    /// Sentence texts in order
    pub sentences: Vec<String>,
    /// Style of the first sentence, when any
    pub style: Option<Style>,
    /// Alignment derived from word margins
    pub alignment: Alignment,
    /// List metadata, present only on List blocks
    pub list_meta: Option<ListMeta>,
    /// Formula classification, present only on formula blocks
    pub formula_data: Option<FormulaData>,
    /// Known-acronym match on the aggregated text
    pub sigle: bool,
    /// The sentences with full provenance
    pub content: Vec<Sentence>,
    /// Union of the sentences' hyperlinks
    pub hyperlinks: Vec<Hyperlink>,
    /// `sigle || formula_data.is_some()`
    pub non_translatable: bool,
}

/// A detected table, persisted as CSV and HTML next to the page outputs.
#[derive(Debug, Clone, PartialEq)]
pub struct TableData {
    /// CSV file, `None` when the write failed
    pub csv_path: Option<PathBuf>,
    /// HTML file, `None` when the write failed
    pub html_path: Option<PathBuf>,
    /// Raw cell grid
    pub rows: Vec<Vec<String>>,
    /// Table region in user units
    pub bbox: BBox,
}

/// An embedded raster image found in the content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct FigureRef {
    /// Image placement in user units
    pub bbox: BBox,
    /// Where the pixel content was saved
    pub image_path: PathBuf,
}

/// The structural model of one analysed page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageModel {
    /// 1-based page number
    pub page_num: usize,
    /// Page width in user units
    pub width: f32,
    /// Page height in user units
    pub height: f32,
    /// Fused word stream (vector words first, then surviving OCR words)
    pub words: Vec<Word>,
    /// Fused blocks in segmenter order
    pub blocks: Vec<Block>,
    /// Bottom-up clustered lines over the full word stream
    pub lines: Vec<Line>,
    /// Tables detected on the page
    pub tables: Vec<TableData>,
    /// Embedded images extracted from the content stream
    pub figures: Vec<FigureRef>,
}

impl PageModel {
    /// Resolve a line's word indices to the underlying words.
    pub fn line_words(&self, line: &Line) -> Vec<&Word> {
        line.words.iter().filter_map(|&i| self.words.get(i)).collect()
    }
}

/// The ordered collection of completed pages.
#[derive(Debug, Clone, Default)]
pub struct DocumentModel {
    /// Completed pages, in requested order (failed pages are absent)
    pub pages: Vec<PageModel>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_source_wire_names() {
        assert_eq!(serde_json::to_string(&WordSource::Vector).unwrap(), "\"pdf\"");
        assert_eq!(serde_json::to_string(&WordSource::Ocr).unwrap(), "\"ocr\"");
    }

    #[test]
    fn test_alignment_wire_names() {
        assert_eq!(serde_json::to_string(&Alignment::Justify).unwrap(), "\"justify\"");
        assert_eq!(serde_json::to_string(&Alignment::Unknown).unwrap(), "\"unknown\"");
    }

    #[test]
    fn test_block_kind_wire_names() {
        assert_eq!(serde_json::to_string(&BlockKind::Figure).unwrap(), "\"Figure\"");
        let k: BlockKind = serde_json::from_str("\"Title\"").unwrap();
        assert_eq!(k, BlockKind::Title);
    }

    #[test]
    fn test_list_meta_char_key() {
        let meta = ListMeta {
            list_type: Some("bullet".to_string()),
            level: 1,
            marker: "-".to_string(),
        };
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["char"], "-");
        assert_eq!(json["list_type"], "bullet");
    }

    #[test]
    fn test_line_words_resolution() {
        let page = PageModel {
            page_num: 1,
            width: 100.0,
            height: 100.0,
            words: vec![
                Word::ocr("a", BBox::new(0.0, 0.0, 5.0, 5.0)),
                Word::ocr("b", BBox::new(6.0, 0.0, 10.0, 5.0)),
            ],
            blocks: vec![],
            lines: vec![Line {
                text: "a b".to_string(),
                bbox: BBox::new(0.0, 0.0, 10.0, 5.0),
                words: vec![0, 1],
            }],
            tables: vec![],
            figures: vec![],
        };
        let words = page.line_words(&page.lines[0]);
        assert_eq!(words.len(), 2);
        assert_eq!(words[1].text, "b");
    }
}

//! Wire-schema types.
//!
//! These structs mirror the stable JSON schema consumed by downstream
//! translators and preview generators, field for field and in field
//! order. The in-memory model references words by index; the conversion
//! here expands lines to owned word copies as the schema requires.
//!
//! Optional sub-objects (`style`, `list_meta`, `formula_data`) serialise
//! as `{}` when absent, which is what downstream consumers expect.

use crate::geometry::BBox;
use crate::model::{
    Alignment, Block, BlockKind, DocumentModel, FormulaData, Hyperlink, Line, ListMeta,
    PageModel, Sentence, SentenceWord, Style, Word, WordSource,
};
use serde::{Deserialize, Serialize};

/// `Option<T>` encoded as the value itself or an empty map.
mod empty_map_opt {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S, T>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
        T: Serialize,
    {
        match value {
            Some(v) => v.serialize(serializer),
            None => serde_json::Map::new().serialize(serializer),
        }
    }

    pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        match &value {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::Object(map) if map.is_empty() => Ok(None),
            _ => T::deserialize(value).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

/// A word inside `lines_extracted`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordJson {
    /// Word text
    pub text: String,
    /// Bounding box
    pub bbox: BBox,
    /// Style, `{}` for OCR words
    #[serde(with = "empty_map_opt", default)]
    pub style: Option<Style>,
    /// `"pdf"` or `"ocr"`
    pub source: WordSource,
}

/// A clustered visual line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineJson {
    /// Member texts joined with single spaces
    pub text: String,
    /// Tight cover of the member boxes
    pub bbox: BBox,
    /// Member words in sweep order
    pub words: Vec<WordJson>,
}

/// A sentence within a block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentenceJson {
    /// Sentence text
    pub phrase: String,
    /// One bbox per visual line the sentence spans
    pub bboxes: Vec<BBox>,
    /// Member words (text, bbox, source)
    pub words: Vec<SentenceWord>,
    /// Style of the first word, `{}` when unknown
    #[serde(with = "empty_map_opt", default)]
    pub style: Option<Style>,
    /// Hyperlinks attached to the sentence
    pub links: Vec<Hyperlink>,
    /// Mathematical-content flag
    pub is_formula: bool,
    /// Known-acronym flag
    pub is_sigle: bool,
    /// `is_formula || is_sigle`
    pub non_translatable: bool,
    /// MathML rendering, empty unless the sentence is a formula
    pub mathml: String,
}

/// A fused block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockJson {
    /// Dense per-page id from 0
    pub id: usize,
    /// Region type
    #[serde(rename = "type")]
    pub kind: BlockKind,
    /// Region bbox
    pub bbox: BBox,
    /// Segmenter confidence
    pub score: f32,
    /// Aggregated text
    pub ocr_text: String,
    /// Sentence texts
    pub sentences: Vec<String>,
    /// Style of the first sentence, `{}` when unknown
    #[serde(with = "empty_map_opt", default)]
    pub style: Option<Style>,
    /// Alignment label
    pub alignment: Alignment,
    /// List metadata, `{}` on non-list blocks
    #[serde(with = "empty_map_opt", default)]
    pub list_meta: Option<ListMeta>,
    /// Formula classification, `{}` on non-formula blocks
    #[serde(with = "empty_map_opt", default)]
    pub formula_data: Option<FormulaData>,
    /// Acronym flag on the aggregated text
    pub sigle: bool,
    /// Sentences with provenance
    pub content: Vec<SentenceJson>,
    /// Union of sentence links
    pub hyperlinks: Vec<Hyperlink>,
    /// `sigle || formula_data.is_formula`
    pub non_translatable: bool,
}

/// One analysed page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageJson {
    /// 1-based page number
    pub page_num: usize,
    /// Page width in user units
    pub width: f32,
    /// Page height in user units
    pub height: f32,
    /// Fused blocks
    pub blocks: Vec<BlockJson>,
    /// Bottom-up clustered lines
    pub lines_extracted: Vec<LineJson>,
    /// Reserved; always empty
    pub logical_structure: Vec<serde_json::Value>,
}

/// The whole-document export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentJson {
    /// Completed pages in requested order
    pub pages: Vec<PageJson>,
}

impl WordJson {
    fn from_word(word: &Word) -> Self {
        WordJson {
            text: word.text.clone(),
            bbox: word.bbox,
            style: word.style.clone(),
            source: word.source,
        }
    }
}

impl LineJson {
    fn from_line(line: &Line, words: &[Word]) -> Self {
        LineJson {
            text: line.text.clone(),
            bbox: line.bbox,
            words: line
                .words
                .iter()
                .filter_map(|&i| words.get(i))
                .map(WordJson::from_word)
                .collect(),
        }
    }
}

impl From<&Sentence> for SentenceJson {
    fn from(s: &Sentence) -> Self {
        SentenceJson {
            phrase: s.phrase.clone(),
            bboxes: s.bboxes.clone(),
            words: s.words.clone(),
            style: s.style.clone(),
            links: s.links.clone(),
            is_formula: s.is_formula,
            is_sigle: s.is_sigle,
            non_translatable: s.non_translatable,
            mathml: s.mathml.clone(),
        }
    }
}

impl From<&Block> for BlockJson {
    fn from(b: &Block) -> Self {
        BlockJson {
            id: b.id,
            kind: b.kind,
            bbox: b.bbox,
            score: b.score,
            ocr_text: b.ocr_text.clone(),
            sentences: b.sentences.clone(),
            style: b.style.clone(),
            alignment: b.alignment,
            list_meta: b.list_meta.clone(),
            formula_data: b.formula_data.clone(),
            sigle: b.sigle,
            content: b.content.iter().map(SentenceJson::from).collect(),
            hyperlinks: b.hyperlinks.clone(),
            non_translatable: b.non_translatable,
        }
    }
}

impl From<&PageModel> for PageJson {
    fn from(page: &PageModel) -> Self {
        PageJson {
            page_num: page.page_num,
            width: page.width,
            height: page.height,
            blocks: page.blocks.iter().map(BlockJson::from).collect(),
            lines_extracted: page
                .lines
                .iter()
                .map(|l| LineJson::from_line(l, &page.words))
                .collect(),
            logical_structure: vec![],
        }
    }
}

impl From<&DocumentModel> for DocumentJson {
    fn from(doc: &DocumentModel) -> Self {
        DocumentJson {
            pages: doc.pages.iter().map(PageJson::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_page() -> PageModel {
        PageModel {
            page_num: 3,
            width: 612.0,
            height: 792.0,
            words: vec![
                Word::vector(
                    "Hello",
                    BBox::new(10.0, 10.0, 40.0, 20.0),
                    Style::from_font("Times-Bold", 12.0, None),
                ),
                Word::ocr("world", BBox::new(45.0, 10.0, 80.0, 20.0)),
            ],
            blocks: vec![],
            lines: vec![Line {
                text: "Hello world".to_string(),
                bbox: BBox::new(10.0, 10.0, 80.0, 20.0),
                words: vec![0, 1],
            }],
            tables: vec![],
            figures: vec![],
        }
    }

    #[test]
    fn test_page_json_shape() {
        let json = serde_json::to_value(PageJson::from(&sample_page())).unwrap();
        assert_eq!(json["page_num"], 3);
        assert_eq!(json["logical_structure"], serde_json::json!([]));
        let line = &json["lines_extracted"][0];
        assert_eq!(line["text"], "Hello world");
        assert_eq!(line["words"][0]["source"], "pdf");
        assert_eq!(line["words"][1]["source"], "ocr");
        // OCR word style serialises as an empty map
        assert_eq!(line["words"][1]["style"], serde_json::json!({}));
        assert_eq!(line["words"][0]["style"]["bold"], true);
    }

    #[test]
    fn test_empty_style_roundtrip() {
        let page = PageJson::from(&sample_page());
        let json = serde_json::to_string(&page).unwrap();
        let back: PageJson = serde_json::from_str(&json).unwrap();
        assert_eq!(back, page);
        assert!(back.lines_extracted[0].words[1].style.is_none());
    }

    #[test]
    fn test_messagepack_roundtrip() {
        let doc = DocumentJson {
            pages: vec![PageJson::from(&sample_page())],
        };
        let bytes = rmp_serde::to_vec_named(&doc).unwrap();
        let back: DocumentJson = rmp_serde::from_slice(&bytes).unwrap();
        assert_eq!(back, doc);
    }
}

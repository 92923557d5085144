//! Block fusion.
//!
//! Joins the ML-proposed regions with the fused word stream: selects the
//! words inside each region, segments them into sentences, derives
//! alignment, list metadata and formula/acronym flags, attaches
//! hyperlinks, and emits the final typed blocks. Degradations (failed
//! crops, empty OCR) recover with deterministic fallbacks and never fail
//! the page.

use crate::extractors::layout::LayoutRegion;
use crate::extractors::ocr::OcrEngine;
use crate::extractors::raster::PageRaster;
use crate::export::OutputDirs;
use crate::fusion::formula::{formula_latex, formula_mathml, is_formula_zone};
use crate::fusion::sentences::{segment_words_into_sentences, SentenceSplitter};
use crate::geometry::BBox;
use crate::model::{
    Alignment, Block, BlockKind, FigureRef, FormulaData, Hyperlink, ListMeta, Sentence, Word,
};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref BULLET_MARKER: Regex =
        Regex::new(r"^([\u{2022}\-*·‣▪‒–—●○□■➔▶►])\s+").expect("bullet marker regex");
    static ref NUMBERED_MARKER: Regex =
        Regex::new(r"^([0-9]+\.|[a-zA-Z]\.)\s+").expect("numbered marker regex");
}

/// Tunables consumed by block fusion.
pub struct FusionSettings<'a> {
    /// Line threshold used when grouping words into visual lines
    pub line_threshold: f32,
    /// Finer threshold for the sentence segmenter's re-clustering
    pub sentence_line_threshold: f32,
    /// Margin tolerance for alignment detection
    pub alignment_tolerance: f32,
    /// Minimum IoU between a link rect and a sentence bbox
    pub link_iou: f32,
    /// Language hint forwarded to the sentence splitter
    pub language: &'a str,
    /// Known acronyms, uppercased
    pub acronyms: &'a HashSet<String>,
}

/// Select the words belonging to a region: upper-left corner inside the
/// region's rectangle and right edge not past the region's right edge.
fn words_in_region<'a>(words: &'a [Word], bbox: &BBox) -> Vec<&'a Word> {
    words
        .iter()
        .filter(|w| bbox.contains_point(w.bbox.x0, w.bbox.y0) && w.bbox.x1 <= bbox.x1)
        .collect()
}

/// Derive a block's alignment from its line margins.
///
/// Words are grouped into visual lines first; each line contributes one
/// left margin (its first word's `x0`) and one right margin (its last
/// word's `x1`). With `tolerance` slack: every left margin on the
/// block's left edge and every right margin on its right edge means
/// justified text; one side alone means left or right alignment; neither
/// means centered. A block without words has unknown alignment.
pub fn detect_alignment(
    words: &[&Word],
    bbox: &BBox,
    tolerance: f32,
    line_threshold: f32,
) -> Alignment {
    if words.is_empty() {
        return Alignment::Unknown;
    }
    let boxes: Vec<BBox> = words.iter().map(|w| w.bbox).collect();
    let rows = crate::fusion::lines::cluster_rows(&boxes, line_threshold);
    let margins: Vec<(f32, f32)> = rows
        .iter()
        .map(|row| {
            let left = row.iter().map(|&i| boxes[i].x0).fold(f32::INFINITY, f32::min);
            let right = row.iter().map(|&i| boxes[i].x1).fold(f32::NEG_INFINITY, f32::max);
            (left, right)
        })
        .collect();
    let left = margins.iter().all(|(l, _)| (l - bbox.x0).abs() < tolerance);
    let right = margins.iter().all(|(_, r)| (r - bbox.x1).abs() < tolerance);
    match (left, right) {
        (true, true) => Alignment::Justify,
        (true, false) => Alignment::Left,
        (false, true) => Alignment::Right,
        (false, false) => Alignment::Center,
    }
}

/// Detect a leading list marker in a block's aggregated text.
///
/// A bullet glyph yields `list_type = "bullet"`, a `1.`/`a.` prefix
/// yields `"numbered"`; anything else leaves the metadata empty.
pub fn detect_list_type(text: &str) -> ListMeta {
    if let Some(captures) = BULLET_MARKER.captures(text) {
        return ListMeta {
            list_type: Some("bullet".to_string()),
            level: 1,
            marker: captures[1].to_string(),
        };
    }
    if let Some(captures) = NUMBERED_MARKER.captures(text) {
        return ListMeta {
            list_type: Some("numbered".to_string()),
            level: 1,
            marker: captures[1].to_string(),
        };
    }
    ListMeta {
        list_type: None,
        level: 0,
        marker: String::new(),
    }
}

/// True when the trimmed, uppercased text is a known acronym.
pub fn is_sigle(text: &str, acronyms: &HashSet<String>) -> bool {
    acronyms.contains(&text.trim().to_uppercase())
}

/// Attach flags, MathML and hyperlinks to a segmented sentence.
fn enrich_sentence(
    mut sentence: Sentence,
    hyperlinks: &[Hyperlink],
    settings: &FusionSettings,
) -> Sentence {
    sentence.is_formula = is_formula_zone(&sentence.phrase);
    sentence.is_sigle = is_sigle(&sentence.phrase, settings.acronyms);
    sentence.non_translatable = sentence.is_formula || sentence.is_sigle;
    if sentence.is_formula {
        match formula_mathml(&sentence.phrase) {
            Ok(mathml) => sentence.mathml = mathml,
            Err(e) => log::warn!("MathML rendering failed: {}", e),
        }
    }
    sentence.links = hyperlinks
        .iter()
        .filter(|link| {
            sentence
                .bboxes
                .iter()
                .any(|b| b.iou(&link.bbox) >= settings.link_iou)
        })
        .cloned()
        .collect();
    sentence
}

/// Classify a formula block and persist its image and MathML rendering.
fn build_formula_data(
    block_id: usize,
    bbox: &BBox,
    text: &str,
    raster: &PageRaster,
    dirs: &OutputDirs,
) -> FormulaData {
    let img_path = dirs.formulas.join(format!("formula_{}_page.png", block_id));
    let img_path = match raster.crop_user(bbox).save(&img_path) {
        Ok(()) => Some(img_path.to_string_lossy().into_owned()),
        Err(e) => {
            log::warn!("Failed to save formula image for block {}: {}", block_id, e);
            None
        },
    };

    let mathml_path = dirs.mathml.join(format!("formula_{}_page.xml", block_id));
    let mathml_path = match formula_mathml(text)
        .and_then(|xml| std::fs::write(&mathml_path, xml).map_err(Into::into))
    {
        Ok(()) => Some(mathml_path.to_string_lossy().into_owned()),
        Err(e) => {
            log::warn!("Failed to save MathML for block {}: {}", block_id, e);
            None
        },
    };

    FormulaData {
        is_formula: true,
        latex: formula_latex(text),
        img_path,
        mathml_path,
    }
}

/// Fuse the merged layout regions with the page's word stream.
///
/// Regions are numbered densely from 0 in their input order. Returns the
/// fused blocks plus any Figure-block crops persisted along the way.
#[allow(clippy::too_many_arguments)]
pub fn fuse_blocks(
    regions: &[LayoutRegion],
    words: &[Word],
    hyperlinks: &[Hyperlink],
    raster: &PageRaster,
    page_num: usize,
    splitter: &dyn SentenceSplitter,
    ocr: &dyn OcrEngine,
    dirs: &OutputDirs,
    settings: &FusionSettings,
) -> (Vec<Block>, Vec<FigureRef>) {
    let mut blocks = Vec::with_capacity(regions.len());
    let mut figures = Vec::new();

    for (id, region) in regions.iter().enumerate() {
        let block_words = words_in_region(words, &region.bbox);
        log::debug!(
            "Block {} ({:?}) contains {} words",
            id,
            region.kind,
            block_words.len()
        );

        let mut content: Vec<Sentence> = if block_words.is_empty() {
            ocr_fallback_content(region, raster, ocr)
        } else {
            let owned: Vec<Word> = block_words.iter().map(|&w| w.clone()).collect();
            segment_words_into_sentences(
                &owned,
                splitter,
                settings.language,
                settings.sentence_line_threshold,
            )
        };
        content = content
            .into_iter()
            .map(|s| enrich_sentence(s, hyperlinks, settings))
            .collect();

        let ocr_text = content
            .iter()
            .map(|s| s.phrase.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let sentences: Vec<String> = content.iter().map(|s| s.phrase.clone()).collect();
        let style = content.first().and_then(|s| s.style.clone());
        let alignment = detect_alignment(
            &block_words,
            &region.bbox,
            settings.alignment_tolerance,
            settings.line_threshold,
        );

        let list_meta = if region.kind == BlockKind::List {
            Some(detect_list_type(&ocr_text))
        } else {
            None
        };

        let formula_data = if is_formula_zone(&ocr_text) {
            Some(build_formula_data(id, &region.bbox, &ocr_text, raster, dirs))
        } else {
            None
        };

        if region.kind == BlockKind::Figure {
            let path = dirs
                .figures
                .join(format!("page{}_figure{}.png", page_num, id));
            match raster.crop_user(&region.bbox).save(&path) {
                Ok(()) => figures.push(FigureRef {
                    bbox: region.bbox,
                    image_path: path,
                }),
                Err(e) => log::warn!("Failed to save figure crop for block {}: {}", id, e),
            }
        }

        let sigle = is_sigle(&ocr_text, settings.acronyms);
        let block_links: Vec<Hyperlink> =
            content.iter().flat_map(|s| s.links.iter().cloned()).collect();
        let non_translatable = sigle || formula_data.is_some();

        blocks.push(Block {
            id,
            kind: region.kind,
            bbox: region.bbox,
            score: region.score,
            ocr_text,
            sentences,
            style,
            alignment,
            list_meta,
            formula_data,
            sigle,
            content,
            hyperlinks: block_links,
            non_translatable,
        });
    }

    log::debug!("Fused {} blocks on page {}", blocks.len(), page_num);
    (blocks, figures)
}

/// Crop-and-recognise fallback for textual blocks with no word overlap.
///
/// Returns at most one synthetic sentence carrying the block bbox; OCR
/// failure or empty text degrades to no content.
fn ocr_fallback_content(
    region: &LayoutRegion,
    raster: &PageRaster,
    ocr: &dyn OcrEngine,
) -> Vec<Sentence> {
    if !region.kind.wants_ocr_fallback() {
        return vec![];
    }
    let crop = raster.crop_user(&region.bbox);
    let text = match ocr.recognize_region(&crop) {
        Ok(text) => text,
        Err(e) => {
            log::warn!("OCR fallback failed on {:?} block: {}", region.kind, e);
            return vec![];
        },
    };
    if text.is_empty() {
        return vec![];
    }
    log::debug!("OCR fallback recovered {} chars", text.len());
    vec![Sentence {
        phrase: text,
        bboxes: vec![region.bbox],
        words: vec![],
        style: None,
        links: vec![],
        is_formula: false,
        is_sigle: false,
        non_translatable: false,
        mathml: String::new(),
    }]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn word(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> Word {
        Word::ocr(text, BBox::new(x0, y0, x1, y1))
    }

    #[test]
    fn test_alignment_left() {
        // Two lines both starting at the left edge but ending short of
        // the right edge; words inside a line may start anywhere.
        let a = word("a", 0.5, 0.0, 40.0, 10.0);
        let b = word("b", 50.0, 0.0, 70.0, 10.0);
        let c = word("c", 1.0, 12.0, 60.0, 22.0);
        let refs: Vec<&Word> = vec![&a, &b, &c];
        let bbox = BBox::new(0.0, 0.0, 100.0, 30.0);
        assert_eq!(detect_alignment(&refs, &bbox, 15.0, 5.0), Alignment::Left);
    }

    #[test]
    fn test_alignment_justify() {
        let a = word("a", 0.5, 0.0, 99.0, 10.0);
        let refs: Vec<&Word> = vec![&a];
        let bbox = BBox::new(0.0, 0.0, 100.0, 30.0);
        assert_eq!(detect_alignment(&refs, &bbox, 15.0, 5.0), Alignment::Justify);
    }

    #[test]
    fn test_alignment_right() {
        let a = word("a", 60.0, 0.0, 99.0, 10.0);
        let refs: Vec<&Word> = vec![&a];
        let bbox = BBox::new(0.0, 0.0, 100.0, 30.0);
        assert_eq!(detect_alignment(&refs, &bbox, 15.0, 5.0), Alignment::Right);
    }

    #[test]
    fn test_alignment_center() {
        let a = word("a", 40.0, 0.0, 60.0, 10.0);
        let refs: Vec<&Word> = vec![&a];
        let bbox = BBox::new(0.0, 0.0, 100.0, 30.0);
        assert_eq!(detect_alignment(&refs, &bbox, 15.0, 5.0), Alignment::Center);
    }

    #[test]
    fn test_alignment_unknown_when_empty() {
        let bbox = BBox::new(0.0, 0.0, 100.0, 30.0);
        assert_eq!(detect_alignment(&[], &bbox, 15.0, 5.0), Alignment::Unknown);
    }

    #[test]
    fn test_bullet_list_marker() {
        let meta = detect_list_type("- First item");
        assert_eq!(meta.list_type.as_deref(), Some("bullet"));
        assert_eq!(meta.level, 1);
        assert_eq!(meta.marker, "-");
    }

    #[test]
    fn test_unicode_bullet_marker() {
        let meta = detect_list_type("• Deuxième élément");
        assert_eq!(meta.list_type.as_deref(), Some("bullet"));
        assert_eq!(meta.marker, "•");
    }

    #[test]
    fn test_numbered_list_marker() {
        let meta = detect_list_type("3. Third item");
        assert_eq!(meta.list_type.as_deref(), Some("numbered"));
        assert_eq!(meta.marker, "3.");

        let meta = detect_list_type("a. Lettered item");
        assert_eq!(meta.list_type.as_deref(), Some("numbered"));
        assert_eq!(meta.marker, "a.");
    }

    #[test]
    fn test_no_list_marker() {
        let meta = detect_list_type("Plain paragraph text");
        assert_eq!(meta.list_type, None);
        assert_eq!(meta.level, 0);
        assert_eq!(meta.marker, "");
    }

    #[test]
    fn test_sigle_detection_is_case_insensitive() {
        let acronyms: HashSet<String> =
            ["UNESCO", "WHO"].iter().map(|s| s.to_string()).collect();
        assert!(is_sigle("UNESCO", &acronyms));
        assert!(is_sigle("  unesco ", &acronyms));
        assert!(!is_sigle("UNESCO rules", &acronyms));
    }

    #[test]
    fn test_words_in_region_membership() {
        let inside = word("in", 10.0, 10.0, 90.0, 20.0);
        let overhang = word("wide", 50.0, 10.0, 150.0, 20.0); // x1 past the edge
        let outside = word("out", 150.0, 10.0, 160.0, 20.0);
        let words = vec![inside, overhang, outside];
        let selected = words_in_region(&words, &BBox::new(0.0, 0.0, 100.0, 30.0));
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].text, "in");
    }
}

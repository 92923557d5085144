//! Pipeline configuration.
//!
//! Every tunable the pipeline consults lives here explicitly: DPI,
//! geometric thresholds, model and language resolution, the acronym set.
//! No hidden globals; the same input with the same config produces
//! byte-identical JSON output.

use crate::error::{Error, Result};
use std::collections::HashSet;
use std::path::PathBuf;

/// Environment variable consulted for the layout model when no explicit
/// path is configured.
pub const LAYOUT_MODEL_ENV: &str = "PAGE_OXIDE_LAYOUT_MODEL";

/// Acronyms treated as non-translatable out of the box.
pub const DEFAULT_ACRONYMS: &[&str] = &[
    "ONU", "OMS", "UNESCO", "CNAM", "WHO", "AI", "USA", "EU", "ETC",
];

/// All tunables of the analysis pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Rasterisation resolution in dots per inch
    pub dpi: u32,
    /// Line clustering threshold in user units
    pub line_threshold: f32,
    /// Finer threshold used when re-clustering a sentence's words
    pub sentence_line_threshold: f32,
    /// Column/adjacency tolerance for block merging and table columns
    pub merge_tolerance: f32,
    /// Margin tolerance for alignment detection
    pub alignment_tolerance: f32,
    /// Minimum layout-detection confidence kept
    pub confidence_floor: f32,
    /// Minimum IoU for hyperlink attachment
    pub link_iou_threshold: f32,
    /// Tesseract language packs, `+`-joined
    pub ocr_languages: String,
    /// Language hint for the sentence splitter
    pub language: String,
    /// Known acronyms, uppercased
    pub acronyms: HashSet<String>,
    /// Explicit layout model path; falls back to [`LAYOUT_MODEL_ENV`]
    pub layout_model_path: Option<PathBuf>,
    /// Pages analysed concurrently (1 = fully sequential)
    pub jobs: usize,
    /// Whether to write the document-level export
    pub export_document: bool,
    /// Base name of the document-level export files
    pub export_name: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            dpi: 300,
            line_threshold: 5.0,
            sentence_line_threshold: 2.5,
            merge_tolerance: 15.0,
            alignment_tolerance: 15.0,
            confidence_floor: 0.5,
            link_iou_threshold: 0.5,
            ocr_languages: "eng+fra".to_string(),
            language: "fr".to_string(),
            acronyms: DEFAULT_ACRONYMS.iter().map(|s| s.to_string()).collect(),
            layout_model_path: None,
            jobs: 1,
            export_document: true,
            export_name: "extraction_doc".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Resolve the layout model path: explicit config first, then the
    /// `PAGE_OXIDE_LAYOUT_MODEL` environment variable.
    pub fn resolve_model_path(&self) -> Option<PathBuf> {
        self.layout_model_path
            .clone()
            .or_else(|| std::env::var_os(LAYOUT_MODEL_ENV).map(PathBuf::from))
    }
}

/// Which pages of the document to analyse.
///
/// An explicit list wins over the range fields; `max_pages` truncates
/// whatever the other fields selected.
#[derive(Debug, Clone)]
pub struct PageSelection {
    /// Explicit 1-based page numbers, in requested order
    pub pages: Option<Vec<usize>>,
    /// First page of the range (1-based, inclusive)
    pub start_page: usize,
    /// Last page of the range (inclusive); `None` means the last page
    pub end_page: Option<usize>,
    /// Cap on the number of selected pages
    pub max_pages: Option<usize>,
}

impl Default for PageSelection {
    fn default() -> Self {
        PageSelection {
            pages: None,
            start_page: 1,
            end_page: None,
            max_pages: None,
        }
    }
}

impl PageSelection {
    /// Parse an explicit page list such as `1,3,5-8`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on empty input, malformed numbers,
    /// zero pages or inverted ranges.
    pub fn parse_pages(spec: &str) -> Result<Vec<usize>> {
        let mut pages = Vec::new();
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some((a, b)) = part.split_once('-') {
                let start = parse_page_number(a)?;
                let end = parse_page_number(b)?;
                if end < start {
                    return Err(Error::Config(format!(
                        "Invalid page range '{}': end before start",
                        part
                    )));
                }
                pages.extend(start..=end);
            } else {
                pages.push(parse_page_number(part)?);
            }
        }
        if pages.is_empty() {
            return Err(Error::Config(format!("Empty page selector '{}'", spec)));
        }
        Ok(pages)
    }

    /// Resolve the selection against the document's page count,
    /// producing 1-based page numbers in requested order.
    pub fn resolve(&self, total_pages: usize) -> Vec<usize> {
        let mut selected: Vec<usize> = match &self.pages {
            Some(pages) => pages
                .iter()
                .copied()
                .filter(|&p| p >= 1 && p <= total_pages)
                .collect(),
            None => {
                let start = self.start_page.max(1);
                let end = self.end_page.unwrap_or(total_pages).min(total_pages);
                (start..=end).collect()
            },
        };
        if let Some(max) = self.max_pages {
            selected.truncate(max);
        }
        selected
    }
}

fn parse_page_number(text: &str) -> Result<usize> {
    let n: usize = text
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("Invalid page number '{}'", text.trim())))?;
    if n == 0 {
        return Err(Error::Config("Page numbers are 1-based".to_string()));
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = PipelineConfig::default();
        assert_eq!(config.dpi, 300);
        assert_eq!(config.line_threshold, 5.0);
        assert_eq!(config.sentence_line_threshold, 2.5);
        assert_eq!(config.merge_tolerance, 15.0);
        assert_eq!(config.confidence_floor, 0.5);
        assert!(config.acronyms.contains("UNESCO"));
    }

    #[test]
    fn test_parse_list_and_ranges() {
        assert_eq!(
            PageSelection::parse_pages("1,3,5-8").unwrap(),
            vec![1, 3, 5, 6, 7, 8]
        );
        assert_eq!(PageSelection::parse_pages(" 2 , 4 ").unwrap(), vec![2, 4]);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(PageSelection::parse_pages("1,x").is_err());
        assert!(PageSelection::parse_pages("0").is_err());
        assert!(PageSelection::parse_pages("8-5").is_err());
        assert!(PageSelection::parse_pages("").is_err());
    }

    #[test]
    fn test_resolve_explicit_filters_out_of_range() {
        let selection = PageSelection {
            pages: Some(vec![2, 99, 1]),
            ..Default::default()
        };
        assert_eq!(selection.resolve(10), vec![2, 1]);
    }

    #[test]
    fn test_resolve_range_with_max() {
        let selection = PageSelection {
            start_page: 3,
            end_page: Some(9),
            max_pages: Some(2),
            ..Default::default()
        };
        assert_eq!(selection.resolve(20), vec![3, 4]);
    }

    #[test]
    fn test_resolve_defaults_to_whole_document() {
        let selection = PageSelection::default();
        assert_eq!(selection.resolve(3), vec![1, 2, 3]);
    }

    #[test]
    fn test_resolve_clamps_end() {
        let selection = PageSelection {
            end_page: Some(99),
            ..Default::default()
        };
        assert_eq!(selection.resolve(2), vec![1, 2]);
    }
}

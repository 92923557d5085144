//! Error types for the page analysis pipeline.
//!
//! The pipeline distinguishes fatal configuration problems from per-page
//! failures: a configuration error aborts the run, while a page failure is
//! recorded and the remaining pages are still processed.

use std::path::PathBuf;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during page analysis.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration: bad paths, missing models, unparseable
    /// page selector. Fatal for the whole run.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input document could not be opened or read.
    #[error("Failed to open document {}: {reason}", .path.display())]
    Document {
        /// Path of the document
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// A pipeline stage failed on one page. The page is dropped from the
    /// document export; other pages are unaffected.
    #[error("Stage '{stage}' failed on page {page_num}: {reason}")]
    Stage {
        /// 1-based page number
        page_num: usize,
        /// Name of the failing stage
        stage: &'static str,
        /// Reason for the failure
        reason: String,
    },

    /// ML model error (loading or inference)
    #[error("ML error: {0}")]
    Ml(String),

    /// OCR engine error
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Export serialisation error
    #[error("Export error: {0}")]
    Export(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialisation error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap any stage error with its page number and stage name.
    ///
    /// Used by the orchestrator to attribute failures when aggregating
    /// per-page results.
    pub fn on_page(self, page_num: usize, stage: &'static str) -> Error {
        match self {
            Error::Stage { .. } => self,
            other => Error::Stage {
                page_num,
                stage,
                reason: other.to_string(),
            },
        }
    }
}

/// A failure recorded for a single page.
///
/// The orchestrator collects one of these per failed page and continues
/// with the rest of the document.
#[derive(Debug)]
pub struct PageFailure {
    /// 1-based page number
    pub page_num: usize,
    /// The error that stopped the page
    pub error: Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_message() {
        let err = Error::Config("bad page selector '1,x'".to_string());
        assert!(format!("{}", err).contains("bad page selector"));
    }

    #[test]
    fn test_on_page_wraps_reason() {
        let err = Error::Ocr("tesseract not available".to_string()).on_page(3, "ocr_words");
        let msg = format!("{}", err);
        assert!(msg.contains("page 3"));
        assert!(msg.contains("ocr_words"));
        assert!(msg.contains("tesseract"));
    }

    #[test]
    fn test_on_page_keeps_existing_stage() {
        let err = Error::Stage {
            page_num: 1,
            stage: "raster",
            reason: "boom".to_string(),
        }
        .on_page(2, "fusion");
        match err {
            Error::Stage { page_num, stage, .. } => {
                assert_eq!(page_num, 1);
                assert_eq!(stage, "raster");
            },
            _ => panic!("expected Stage error"),
        }
    }
}

//! # page_oxide
//!
//! Position-aware PDF page analysis for WYSIWYG document translation.
//!
//! The pipeline analyses a PDF page by page, coordinating four
//! analysers (vector text extraction, OCR, ML layout segmentation and
//! table detection) and fuses their outputs into a structural page
//! model: typed blocks containing sentences, each sentence carrying one
//! bbox per visual line it spans, down to per-word provenance. The model
//! is what lets a downstream renderer re-flow a translation over the
//! exact geometry of the original page.
//!
//! ## Stages
//!
//! 1. Rasterise the page (pdfium, 300 DPI by default)
//! 2. Extract vector words with font styles, hyperlinks, embedded images
//! 3. Extract OCR words (Tesseract), converted to user units
//! 4. Fuse the word streams, dropping exact OCR duplicates
//! 5. Cluster words into baseline lines
//! 6. Detect stream-flavour tables and persist CSV/HTML
//! 7. Propose typed regions with an ONNX layout model; merge stacked
//!    detections
//! 8. Fuse regions with words: sentence segmentation, alignment, list
//!    metadata, formula/acronym classification, hyperlink attachment
//! 9. Export per-page JSON, a document JSON + MessagePack snapshot, and
//!    flat line CSV/TXT dumps
//!
//! ## Quick start
//!
//! ```ignore
//! use page_oxide::{PageSelection, Pipeline, PipelineConfig};
//! use std::path::Path;
//!
//! # fn main() -> page_oxide::Result<()> {
//! let config = PipelineConfig {
//!     layout_model_path: Some("models/layout.onnx".into()),
//!     ..PipelineConfig::default()
//! };
//! let pipeline = Pipeline::new(config)?;
//! let summary = pipeline.run(
//!     Path::new("paper.pdf"),
//!     Path::new("out"),
//!     &PageSelection::default(),
//! )?;
//! println!("{} pages analysed, {} failed",
//!     summary.document.pages.len(),
//!     summary.failures.len());
//! # Ok(())
//! # }
//! ```
//!
//! Pages fail independently: any stage error drops that page from the
//! document export, is recorded in the summary, and the run continues.

pub mod error;
pub mod export;
pub mod extractors;
pub mod fusion;
pub mod geometry;
pub mod model;
pub mod pipeline;

pub use error::{Error, PageFailure, Result};
pub use pipeline::{PageSelection, Pipeline, PipelineConfig, RunSummary};

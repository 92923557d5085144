//! Page analysers.
//!
//! Four heterogeneous analysers each look at one page and return a typed
//! result: vector text from the content stream, OCR words from the
//! bitmap, table regions, and ML layout regions. Their outputs are
//! carried as a tagged variant so the fusion stage consumes one uniform
//! shape regardless of which analysers actually ran.

pub mod layout;
pub mod ocr;
pub mod raster;
pub mod tables;
pub mod vector;

pub use layout::{LayoutModel, LayoutRegion, OnnxLayoutModel};
pub use ocr::{DisabledOcr, OcrEngine};
pub use raster::PageRaster;
pub use vector::VectorText;

use crate::model::{TableData, Word};

/// The typed result of one analyser on one page.
pub enum AnalyzerOutput {
    /// Vector words, hyperlinks and embedded images
    VectorText(VectorText),
    /// OCR words in user units
    OcrWords(Vec<Word>),
    /// Detected tables
    Tables(Vec<TableData>),
    /// ML layout regions in user units
    Layout(Vec<LayoutRegion>),
}

/// All analyser results for one page, ready for fusion.
///
/// Collecting from tagged outputs keeps fusion deterministic and
/// independent of which analysers ran: a missing analyser simply leaves
/// its slot empty.
#[derive(Default)]
pub struct PageAnalysis {
    /// Vector extraction result
    pub vector: VectorText,
    /// OCR words
    pub ocr_words: Vec<Word>,
    /// Detected tables
    pub tables: Vec<TableData>,
    /// Layout regions
    pub regions: Vec<LayoutRegion>,
}

impl PageAnalysis {
    /// Fold tagged analyser outputs into one analysis.
    pub fn collect(outputs: Vec<AnalyzerOutput>) -> Self {
        let mut analysis = PageAnalysis::default();
        for output in outputs {
            match output {
                AnalyzerOutput::VectorText(v) => analysis.vector = v,
                AnalyzerOutput::OcrWords(w) => analysis.ocr_words = w,
                AnalyzerOutput::Tables(t) => analysis.tables = t,
                AnalyzerOutput::Layout(r) => analysis.regions = r,
            }
        }
        analysis
    }
}

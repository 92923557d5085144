//! Pipeline orchestration.
//!
//! A [`Pipeline`] owns the process-wide models (layout segmenter,
//! sentence splitter, OCR engine) and drives the per-page stage chain:
//!
//! raster -> {vector words, OCR words, tables, layout} -> word fusion ->
//! line clustering -> block merging -> block fusion -> page model ->
//! export.
//!
//! Pages are independent units of work. pdfium itself is single-threaded,
//! so page inputs (bitmap + vector text) are produced serially in batches
//! of `jobs`; the remaining stages of a batch run on the rayon pool. Any
//! stage failure drops that page, is recorded, and the run continues.

pub mod config;

pub use config::{PageSelection, PipelineConfig};

use crate::error::{Error, PageFailure, Result};
use crate::export::{self, OutputDirs};
use crate::extractors::layout::{self, OnnxLayoutModel};
use crate::extractors::ocr::OcrEngine;
use crate::extractors::raster::{self, PageRaster};
use crate::extractors::tables::extract_tables;
use crate::extractors::vector::{self, VectorText};
use crate::extractors::{AnalyzerOutput, LayoutModel, PageAnalysis};
use crate::fusion::blocks::FusionSettings;
use crate::fusion::{
    cluster_into_lines, fuse_blocks, fuse_word_streams, merge_vertical_regions, SentenceSplitter,
    UnicodeSplitter,
};
use crate::model::{DocumentModel, PageModel};
use pdfium_render::prelude::*;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Result of one pipeline run.
pub struct RunSummary {
    /// Completed pages in requested order
    pub document: DocumentModel,
    /// One entry per dropped page
    pub failures: Vec<PageFailure>,
    /// Where everything was written
    pub dirs: OutputDirs,
    /// How many pages the selection resolved to
    pub pages_requested: usize,
}

/// Serial per-page inputs produced under the pdfium lock-step phase.
struct PageInput {
    page_num: usize,
    raster: PageRaster,
    vector: VectorText,
}

/// The document analysis pipeline.
///
/// Owns the heavyweight models explicitly instead of hiding them in
/// globals, which removes startup ordering surprises and lets tests
/// substitute scripted fakes via [`Pipeline::with_components`].
pub struct Pipeline {
    config: PipelineConfig,
    layout: Arc<dyn LayoutModel>,
    splitter: Arc<dyn SentenceSplitter>,
    ocr: Arc<dyn OcrEngine>,
    abort: Arc<AtomicBool>,
}

impl Pipeline {
    /// Build a pipeline with the production components.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no layout model is configured
    /// (neither `layout_model_path` nor the environment variable) or the
    /// model fails to load.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        let model_path = config.resolve_model_path().ok_or_else(|| {
            Error::Config(format!(
                "No layout model configured; pass --model or set {}",
                config::LAYOUT_MODEL_ENV
            ))
        })?;
        let layout = OnnxLayoutModel::load(&model_path, config.confidence_floor)?;

        #[cfg(feature = "ocr")]
        let ocr: Arc<dyn OcrEngine> =
            Arc::new(crate::extractors::ocr::TesseractOcr::new(&config.ocr_languages));
        #[cfg(not(feature = "ocr"))]
        let ocr: Arc<dyn OcrEngine> = {
            log::warn!("Built without the 'ocr' feature; running vector-only");
            Arc::new(crate::extractors::ocr::DisabledOcr)
        };

        Ok(Self::with_components(
            config,
            Arc::new(layout),
            Arc::new(UnicodeSplitter),
            ocr,
        ))
    }

    /// Build a pipeline from explicit components.
    pub fn with_components(
        config: PipelineConfig,
        layout: Arc<dyn LayoutModel>,
        splitter: Arc<dyn SentenceSplitter>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        Pipeline {
            config,
            layout,
            splitter,
            ocr,
            abort: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle for requesting an abort; honoured between pages.
    pub fn abort_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.abort)
    }

    /// The active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Analyse a document and write all outputs under `out_root`.
    ///
    /// Per-page failures are collected in the summary; only document or
    /// configuration level problems return `Err`.
    pub fn run(
        &self,
        pdf_path: &Path,
        out_root: &Path,
        selection: &PageSelection,
    ) -> Result<RunSummary> {
        let doc_name = pdf_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let dirs = OutputDirs::create(out_root, &doc_name)?;

        let pdfium = bind_pdfium()?;
        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| Error::Document {
                path: pdf_path.to_path_buf(),
                reason: format!("{e:?}"),
            })?;

        let total_pages = document.pages().len() as usize;
        let page_numbers = selection.resolve(total_pages);
        log::info!(
            "Analysing {} of {} pages of {}",
            page_numbers.len(),
            total_pages,
            pdf_path.display()
        );

        let mut pages: Vec<PageModel> = Vec::with_capacity(page_numbers.len());
        let mut failures: Vec<PageFailure> = Vec::new();
        let jobs = self.config.jobs.max(1);

        'batches: for batch in page_numbers.chunks(jobs) {
            // Serial phase: pdfium is single-threaded.
            let mut inputs: Vec<(usize, Result<PageInput>)> = Vec::with_capacity(batch.len());
            for &page_num in batch {
                if self.abort.load(Ordering::Relaxed) {
                    log::warn!("Abort requested, stopping before page {}", page_num);
                    break 'batches;
                }
                inputs.push((page_num, self.load_page_input(&document, page_num, &dirs)));
            }

            // Parallel phase: pure analysis over owned inputs.
            let process = |(page_num, input): (usize, Result<PageInput>)| match input {
                Ok(input) => (page_num, self.analyze_page(input, &dirs)),
                Err(e) => (page_num, Err(e)),
            };
            let results: Vec<(usize, Result<PageModel>)> = if jobs <= 1 {
                inputs.into_iter().map(process).collect()
            } else {
                inputs.into_par_iter().map(process).collect()
            };

            for (page_num, result) in results {
                match result {
                    Ok(page) => pages.push(page),
                    Err(error) => {
                        log::warn!("Page {} dropped: {}", page_num, error);
                        failures.push(PageFailure { page_num, error });
                    },
                }
            }
        }

        let document_model = DocumentModel { pages };

        if self.config.export_document {
            if let Err(e) =
                export::export_document(&dirs, &document_model, &self.config.export_name)
            {
                log::error!("Document-level export failed: {}", e);
            }
        }
        if let Err(e) = export::lines::export_lines(&dirs, &document_model, "lines_extracted") {
            log::error!("Line export failed: {}", e);
        }

        Ok(RunSummary {
            document: document_model,
            failures,
            dirs,
            pages_requested: page_numbers.len(),
        })
    }

    /// Load one page through pdfium: raster bitmap plus vector text.
    fn load_page_input(
        &self,
        document: &PdfDocument,
        page_num: usize,
        dirs: &OutputDirs,
    ) -> Result<PageInput> {
        let page = document
            .pages()
            .get((page_num - 1) as u16)
            .map_err(|e| Error::Stage {
                page_num,
                stage: "load",
                reason: format!("{e:?}"),
            })?;
        let raster = raster::render_page(&page, page_num, self.config.dpi, &dirs.images)?;
        let vector = vector::extract_page_text(document, &page, page_num, &dirs.images)?;
        Ok(PageInput {
            page_num,
            raster,
            vector,
        })
    }

    /// Run the analyser and fusion stages for one page and write its
    /// JSON model. Pure with respect to pdfium: safe on worker threads.
    fn analyze_page(&self, input: PageInput, dirs: &OutputDirs) -> Result<PageModel> {
        let PageInput {
            page_num,
            raster,
            vector,
        } = input;
        let config = &self.config;

        let ocr_words = self
            .ocr
            .extract_words(&raster)
            .map_err(|e| e.on_page(page_num, "ocr_words"))?;

        let tables = extract_tables(
            &vector.words,
            page_num,
            dirs,
            config.line_threshold,
            config.merge_tolerance,
        );

        let regions = self
            .layout
            .detect(&raster.image)
            .map_err(|e| e.on_page(page_num, "layout"))?;
        let regions = layout::to_user_units(
            regions,
            raster.bitmap_size(),
            (raster.page_width, raster.page_height),
        );

        let PageAnalysis {
            vector,
            ocr_words,
            tables,
            regions,
        } = PageAnalysis::collect(vec![
            AnalyzerOutput::VectorText(vector),
            AnalyzerOutput::OcrWords(ocr_words),
            AnalyzerOutput::Tables(tables),
            AnalyzerOutput::Layout(regions),
        ]);

        let regions = layout::or_full_page(regions, raster.page_width, raster.page_height);
        let regions = merge_vertical_regions(regions, config.merge_tolerance);

        let words = fuse_word_streams(vector.words, ocr_words);
        let lines = cluster_into_lines(&words, config.line_threshold);

        let settings = FusionSettings {
            line_threshold: config.line_threshold,
            sentence_line_threshold: config.sentence_line_threshold,
            alignment_tolerance: config.alignment_tolerance,
            link_iou: config.link_iou_threshold,
            language: &config.language,
            acronyms: &config.acronyms,
        };
        let (blocks, mut figure_crops) = fuse_blocks(
            &regions,
            &words,
            &vector.hyperlinks,
            &raster,
            page_num,
            self.splitter.as_ref(),
            self.ocr.as_ref(),
            dirs,
            &settings,
        );

        let mut figures = vector.figures;
        figures.append(&mut figure_crops);

        let page = PageModel {
            page_num,
            width: raster.page_width,
            height: raster.page_height,
            words,
            blocks,
            lines,
            tables,
            figures,
        };

        export::write_page_json(dirs, &page).map_err(|e| e.on_page(page_num, "export"))?;
        Ok(page)
    }
}

/// Bind the pdfium dynamic library: system-wide first, then alongside
/// the executable.
fn bind_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_system_library()
        .or_else(|_| {
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        })
        .map_err(|e| Error::Config(format!("pdfium library not available: {e:?}")))?;
    Ok(Pdfium::new(bindings))
}

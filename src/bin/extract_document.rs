//! Analyse a PDF into structural page models.
//!
//! Usage:
//!   extract_document paper.pdf --model models/layout.onnx
//!   extract_document paper.pdf --pages 1,3,5-8 --out results --dpi 300
//!
//! Exit code is 0 when the run completes, even if individual pages
//! failed; only configuration errors exit non-zero.

use clap::Parser;
use page_oxide::{PageSelection, Pipeline, PipelineConfig, Result, RunSummary};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "extract_document",
    about = "Fuse vector text, OCR, ML layout and tables into a structural page model"
)]
struct Args {
    /// PDF file to analyse
    pdf: PathBuf,

    /// Explicit pages to analyse, e.g. "1,3,5-8"
    #[arg(long)]
    pages: Option<String>,

    /// First page of the range (1-based, inclusive)
    #[arg(long, default_value_t = 1)]
    start_page: usize,

    /// Last page of the range (inclusive; defaults to the last page)
    #[arg(long)]
    end_page: Option<usize>,

    /// Cap on the number of analysed pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Output base directory (defaults to the PDF's directory)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Rasterisation resolution
    #[arg(long, default_value_t = 300)]
    dpi: u32,

    /// Skip the document-level JSON/binary export
    #[arg(long)]
    no_export: bool,

    /// Sentence-splitter language hint
    #[arg(long, default_value = "fr")]
    lang: String,

    /// Tesseract language packs, +-joined
    #[arg(long, default_value = "eng+fra")]
    ocr_langs: String,

    /// ONNX layout model path (also PAGE_OXIDE_LAYOUT_MODEL)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Pages analysed concurrently
    #[arg(long, default_value_t = 1)]
    jobs: usize,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    match run(args) {
        Ok(summary) => {
            println!(
                "Analysed {}/{} pages into {}",
                summary.document.pages.len(),
                summary.pages_requested,
                summary.dirs.base.display()
            );
            for failure in &summary.failures {
                println!("  page {} failed: {}", failure.page_num, failure.error);
            }
        },
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        },
    }
}

fn run(args: Args) -> Result<RunSummary> {
    let selection = PageSelection {
        pages: args
            .pages
            .as_deref()
            .map(PageSelection::parse_pages)
            .transpose()?,
        start_page: args.start_page,
        end_page: args.end_page,
        max_pages: args.max_pages,
    };

    let out_root = match args.out {
        Some(dir) => dir,
        None => args
            .pdf
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".")),
    };

    let config = PipelineConfig {
        dpi: args.dpi,
        language: args.lang,
        ocr_languages: args.ocr_langs,
        layout_model_path: args.model,
        jobs: args.jobs,
        export_document: !args.no_export,
        ..PipelineConfig::default()
    };

    let pipeline = Pipeline::new(config)?;
    pipeline.run(&args.pdf, &out_root, &selection)
}

//! Sanity-check a document export.
//!
//! Re-loads an `export/<name>.json` or `.bin` snapshot and prints
//! per-page block, sentence and word counts, the block-type breakdown,
//! and a list of structural anomalies (malformed bboxes, blocks with no
//! extracted sentence, table-typed blocks with no table content), so a
//! broken extraction is obvious before translation starts.

use clap::Parser;
use page_oxide::export::{load_document, BlockJson};
use page_oxide::geometry::BBox;
use page_oxide::model::BlockKind;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "audit_export", about = "Print statistics and anomalies of a document export")]
struct Args {
    /// Document export file (.json or .bin)
    export: PathBuf,
}

/// What is wrong with a block's bbox, if anything.
fn bbox_anomaly(bbox: &BBox) -> Option<&'static str> {
    if !bbox.is_finite() {
        return Some("bbox has non-finite coordinates");
    }
    if bbox.x1 < bbox.x0 || bbox.y1 < bbox.y0 {
        return Some("bbox corners are inverted");
    }
    None
}

/// Collect the anomaly messages for one block.
fn block_warnings(page_num: usize, block: &BlockJson) -> Vec<String> {
    let mut warnings = Vec::new();
    if let Some(problem) = bbox_anomaly(&block.bbox) {
        warnings.push(format!("page {} block {}: {}", page_num, block.id, problem));
    }
    if block.sentences.is_empty() {
        warnings.push(format!(
            "page {} block {}: no sentence extracted",
            page_num, block.id
        ));
    }
    if block.kind == BlockKind::Table && block.ocr_text.is_empty() {
        warnings.push(format!(
            "page {} block {}: Table block with no table content",
            page_num, block.id
        ));
    }
    warnings
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    let document = match load_document(&args.export) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        },
    };

    let mut type_totals: BTreeMap<String, usize> = BTreeMap::new();
    let mut warnings: Vec<String> = Vec::new();
    let mut total_blocks = 0usize;
    let mut total_sentences = 0usize;
    let mut total_non_translatable = 0usize;

    println!("pages: {}", document.pages.len());
    for page in &document.pages {
        let mut types_on_page: BTreeMap<String, usize> = BTreeMap::new();
        for block in &page.blocks {
            let kind = format!("{:?}", block.kind);
            *types_on_page.entry(kind.clone()).or_default() += 1;
            *type_totals.entry(kind).or_default() += 1;
            warnings.extend(block_warnings(page.page_num, block));
        }

        let sentences: usize = page.blocks.iter().map(|b| b.content.len()).sum();
        let words: usize = page
            .blocks
            .iter()
            .flat_map(|b| b.content.iter())
            .map(|s| s.words.len())
            .sum();
        let non_translatable = page
            .blocks
            .iter()
            .flat_map(|b| b.content.iter())
            .filter(|s| s.non_translatable)
            .count();
        total_blocks += page.blocks.len();
        total_sentences += sentences;
        total_non_translatable += non_translatable;

        let breakdown = types_on_page
            .iter()
            .map(|(kind, count)| format!("{}: {}", kind, count))
            .collect::<Vec<_>>()
            .join(", ");
        println!(
            "page {:>3}: {:>3} blocks ({}), {:>4} sentences, {:>5} words, {} lines",
            page.page_num,
            page.blocks.len(),
            breakdown,
            sentences,
            words,
            page.lines_extracted.len(),
        );
    }

    println!("\nsummary:");
    println!("  blocks: {}", total_blocks);
    for (kind, count) in &type_totals {
        println!("    {:<8} {}", kind, count);
    }
    println!(
        "  sentences: {} ({} non-translatable)",
        total_sentences, total_non_translatable
    );

    println!("\nanomalies: {}", warnings.len());
    for warning in &warnings {
        println!("  - {}", warning);
    }
}

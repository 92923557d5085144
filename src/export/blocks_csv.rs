//! Flat CSV export of block sentences.
//!
//! Reads a directory of per-page JSON models and flattens every sentence
//! into one CSV row carrying its block context and translation flags.
//! Downstream translation tooling uses this to triage what needs human
//! attention.

use super::schema::PageJson;
use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Flatten all `*.json` page models in `json_dir` into one CSV file.
///
/// Rows are ordered by file name, then block, then sentence. Returns the
/// number of rows written.
pub fn json_dir_to_csv(json_dir: &Path, out_csv: &Path) -> Result<usize> {
    let mut files: Vec<_> = fs::read_dir(json_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|e| e == "json"))
        .collect();
    files.sort();

    if files.is_empty() {
        return Err(Error::Config(format!(
            "No page JSON files found in {}",
            json_dir.display()
        )));
    }

    let mut writer = csv::Writer::from_path(out_csv)
        .map_err(|e| Error::Export(format!("cannot create {}: {}", out_csv.display(), e)))?;
    writer
        .write_record([
            "page",
            "block_id",
            "block_type",
            "phrase",
            "bbox",
            "font",
            "non_translatable",
            "is_formula",
            "is_sigle",
            "has_link",
        ])
        .map_err(|e| Error::Export(e.to_string()))?;

    let mut rows = 0usize;
    for file in files {
        let page: PageJson = serde_json::from_slice(&fs::read(&file)?)?;
        for block in &page.blocks {
            for sentence in &block.content {
                let bbox = sentence
                    .bboxes
                    .first()
                    .map(serde_json::to_string)
                    .transpose()?
                    .unwrap_or_default();
                let font = sentence
                    .style
                    .as_ref()
                    .map(|s| s.font_name.clone())
                    .unwrap_or_default();
                writer
                    .write_record([
                        page.page_num.to_string(),
                        block.id.to_string(),
                        format!("{:?}", block.kind),
                        sentence.phrase.clone(),
                        bbox,
                        font,
                        sentence.non_translatable.to_string(),
                        sentence.is_formula.to_string(),
                        sentence.is_sigle.to_string(),
                        (!sentence.links.is_empty()).to_string(),
                    ])
                    .map_err(|e| Error::Export(e.to_string()))?;
                rows += 1;
            }
        }
    }
    writer.flush().map_err(|e| Error::Export(e.to_string()))?;
    log::info!("Wrote {} sentence rows to {}", rows, out_csv.display());
    Ok(rows)
}

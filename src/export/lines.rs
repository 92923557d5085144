//! Flat export of clustered lines.
//!
//! Writes `export/lines_extracted.csv` (page_num, line_num, text, bbox)
//! and `export/lines_extracted.txt` (one line text per row) across every
//! exported page, in page order.

use super::OutputDirs;
use crate::error::{Error, Result};
use crate::model::DocumentModel;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

/// Write both line exports and return their paths (CSV first).
pub fn export_lines(
    dirs: &OutputDirs,
    document: &DocumentModel,
    base_name: &str,
) -> Result<(PathBuf, PathBuf)> {
    let csv_path = dirs.export.join(format!("{}.csv", base_name));
    let txt_path = dirs.export.join(format!("{}.txt", base_name));

    let mut writer = csv::Writer::from_path(&csv_path)
        .map_err(|e| Error::Export(format!("cannot create {}: {}", csv_path.display(), e)))?;
    let mut txt = BufWriter::new(File::create(&txt_path)?);

    writer
        .write_record(["page_num", "line_num", "text", "bbox"])
        .map_err(|e| Error::Export(e.to_string()))?;

    let mut total = 0usize;
    for page in &document.pages {
        for (i, line) in page.lines.iter().enumerate() {
            let bbox = serde_json::to_string(&line.bbox)?;
            writer
                .write_record([
                    page.page_num.to_string(),
                    (i + 1).to_string(),
                    line.text.clone(),
                    bbox,
                ])
                .map_err(|e| Error::Export(e.to_string()))?;
            writeln!(txt, "{}", line.text.trim())?;
            total += 1;
        }
    }
    writer.flush().map_err(|e| Error::Export(e.to_string()))?;
    txt.flush()?;

    log::info!("Exported {} lines to {}", total, csv_path.display());
    Ok((csv_path, txt_path))
}

//! Persistence of analysis results.
//!
//! The exporter writes three kinds of output under one base directory:
//! per-page JSON immediately after each page completes, a document-wide
//! JSON + MessagePack snapshot at the end of the run, and a flat
//! CSV/TXT dump of every clustered line.

pub mod blocks_csv;
pub mod lines;
pub mod schema;

pub use schema::{BlockJson, DocumentJson, LineJson, PageJson, SentenceJson, WordJson};

use crate::error::{Error, Result};
use crate::model::{DocumentModel, PageModel};
use std::fs;
use std::path::{Path, PathBuf};

/// The output directory layout for one analysed document.
///
/// All directories are created up front; per-page writers then address
/// distinct filenames so concurrent pages never contend.
#[derive(Debug, Clone)]
pub struct OutputDirs {
    /// `<out>/output_<name>`
    pub base: PathBuf,
    /// Rendered page bitmaps and embedded images
    pub images: PathBuf,
    /// Table CSVs
    pub tables: PathBuf,
    /// Table HTML renderings
    pub htmltables: PathBuf,
    /// Per-page JSON models
    pub json: PathBuf,
    /// Cropped formula images
    pub formulas: PathBuf,
    /// MathML files
    pub mathml: PathBuf,
    /// Figure-block crops
    pub figures: PathBuf,
    /// Document-level exports
    pub export: PathBuf,
}

impl OutputDirs {
    /// Create the full layout under `<out_root>/output_<doc_name>`.
    pub fn create(out_root: &Path, doc_name: &str) -> Result<Self> {
        let base = out_root.join(format!("output_{}", doc_name));
        let dirs = OutputDirs {
            images: base.join("images"),
            tables: base.join("tables"),
            htmltables: base.join("htmltables"),
            json: base.join("json"),
            formulas: base.join("formulas"),
            mathml: base.join("mathml"),
            figures: base.join("figures"),
            export: base.join("export"),
            base,
        };
        for dir in [
            &dirs.base,
            &dirs.images,
            &dirs.tables,
            &dirs.htmltables,
            &dirs.json,
            &dirs.formulas,
            &dirs.mathml,
            &dirs.figures,
            &dirs.export,
        ] {
            fs::create_dir_all(dir)?;
        }
        Ok(dirs)
    }
}

/// Write `json/page_<N>.json` for one completed page.
///
/// A failure here counts as a page failure: the caller drops the page.
pub fn write_page_json(dirs: &OutputDirs, page: &PageModel) -> Result<PathBuf> {
    let path = dirs.json.join(format!("page_{}.json", page.page_num));
    let view = PageJson::from(page);
    let json = serde_json::to_string_pretty(&view)?;
    fs::write(&path, json)?;
    log::debug!("Wrote page model to {}", path.display());
    Ok(path)
}

/// Write the document-wide `export/<name>.json` and `export/<name>.bin`.
///
/// The binary snapshot is MessagePack, isomorphic to the JSON document.
/// Returns the two paths on success.
pub fn export_document(
    dirs: &OutputDirs,
    document: &DocumentModel,
    name: &str,
) -> Result<(PathBuf, PathBuf)> {
    let view = DocumentJson::from(document);

    let json_path = dirs.export.join(format!("{}.json", name));
    fs::write(&json_path, serde_json::to_string_pretty(&view)?)?;

    let bin_path = dirs.export.join(format!("{}.bin", name));
    let bytes = rmp_serde::to_vec_named(&view)
        .map_err(|e| Error::Export(format!("MessagePack encoding failed: {}", e)))?;
    fs::write(&bin_path, bytes)?;

    log::info!(
        "Document export written: {} and {}",
        json_path.display(),
        bin_path.display()
    );
    Ok((json_path, bin_path))
}

/// Re-load a document export from a `.json` or `.bin` snapshot.
///
/// The format is chosen by extension; anything that is not `.bin` is
/// parsed as JSON.
pub fn load_document(path: &Path) -> Result<DocumentJson> {
    let bytes = fs::read(path)?;
    if path.extension().is_some_and(|e| e == "bin") {
        rmp_serde::from_slice(&bytes)
            .map_err(|e| Error::Export(format!("MessagePack decoding failed: {}", e)))
    } else {
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DocumentModel;

    fn empty_page(page_num: usize) -> PageModel {
        PageModel {
            page_num,
            width: 612.0,
            height: 792.0,
            words: vec![],
            blocks: vec![],
            lines: vec![],
            tables: vec![],
            figures: vec![],
        }
    }

    #[test]
    fn test_output_layout_created() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = OutputDirs::create(tmp.path(), "report").unwrap();
        assert!(dirs.base.ends_with("output_report"));
        assert!(dirs.images.is_dir());
        assert!(dirs.mathml.is_dir());
        assert!(dirs.export.is_dir());
    }

    #[test]
    fn test_page_json_written_and_reparses() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = OutputDirs::create(tmp.path(), "doc").unwrap();
        let path = write_page_json(&dirs, &empty_page(7)).unwrap();
        assert!(path.ends_with("page_7.json"));
        let parsed: PageJson =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.page_num, 7);
    }

    #[test]
    fn test_document_export_json_and_bin() {
        let tmp = tempfile::tempdir().unwrap();
        let dirs = OutputDirs::create(tmp.path(), "doc").unwrap();
        let doc = DocumentModel {
            pages: vec![empty_page(1), empty_page(3)],
        };
        let (json_path, bin_path) = export_document(&dirs, &doc, "extraction_doc").unwrap();

        let from_json = load_document(&json_path).unwrap();
        let from_bin = load_document(&bin_path).unwrap();
        assert_eq!(from_json, from_bin);
        assert_eq!(from_json.pages.len(), 2);
        assert_eq!(from_json.pages[1].page_num, 3);
    }
}

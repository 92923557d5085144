//! OCR word extraction.
//!
//! Runs Tesseract over the page bitmap and returns positioned words.
//! Tesseract reports integer pixel boxes in bitmap coordinates; they are
//! converted to user units here, before fusion, so the whole pipeline
//! works in a single coordinate space.
//!
//! The engine is behind a trait so the pipeline can run without a
//! Tesseract installation (vector-only mode) and tests can script
//! recognition results.

use crate::error::Result;
use crate::extractors::raster::PageRaster;
use crate::geometry::BBox;
use crate::model::Word;
use image::RgbImage;

/// An OCR engine: words with boxes from a full page, plain text from a
/// block crop.
///
/// Tesseract's API object is single-threaded, so implementations create
/// one per invocation rather than sharing a locked instance.
pub trait OcrEngine: Send + Sync {
    /// Recognise positioned words on the page bitmap, in user units.
    fn extract_words(&self, raster: &PageRaster) -> Result<Vec<Word>>;

    /// Recognise the text of a single block crop (layout-free).
    fn recognize_region(&self, crop: &RgbImage) -> Result<String>;
}

/// No-op engine used when the `ocr` feature is disabled: every page
/// degrades to vector-only extraction.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledOcr;

impl OcrEngine for DisabledOcr {
    fn extract_words(&self, _raster: &PageRaster) -> Result<Vec<Word>> {
        log::debug!("OCR disabled, returning no words");
        Ok(vec![])
    }

    fn recognize_region(&self, _crop: &RgbImage) -> Result<String> {
        Ok(String::new())
    }
}

/// One word row parsed out of Tesseract's TSV output.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TsvWord {
    pub text: String,
    /// Pixel box `[left, top, right, bottom]` in bitmap coordinates
    pub bbox: [i32; 4],
}

/// Parse Tesseract TSV output, keeping word-level rows (level 5) with
/// non-empty text.
///
/// TSV columns: level, page_num, block_num, par_num, line_num, word_num,
/// left, top, width, height, conf, text.
pub(crate) fn parse_tsv_words(tsv: &str) -> Vec<TsvWord> {
    let mut words = Vec::new();
    for row in tsv.lines() {
        let cols: Vec<&str> = row.split('\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }
        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }
        let parse = |s: &str| s.trim().parse::<i32>().ok();
        let (Some(left), Some(top), Some(width), Some(height)) =
            (parse(cols[6]), parse(cols[7]), parse(cols[8]), parse(cols[9]))
        else {
            continue;
        };
        words.push(TsvWord {
            text: text.to_string(),
            bbox: [left, top, left + width, top + height],
        });
    }
    words
}

/// Convert pixel-space TSV words to user-unit [`Word`]s.
pub(crate) fn tsv_words_to_user_units(words: Vec<TsvWord>, raster: &PageRaster) -> Vec<Word> {
    let sx = 1.0 / raster.pixels_per_unit_x();
    let sy = 1.0 / raster.pixels_per_unit_y();
    words
        .into_iter()
        .map(|w| {
            Word::ocr(
                w.text,
                BBox::new(
                    w.bbox[0] as f32 * sx,
                    w.bbox[1] as f32 * sy,
                    w.bbox[2] as f32 * sx,
                    w.bbox[3] as f32 * sy,
                ),
            )
        })
        .collect()
}

#[cfg(feature = "ocr")]
pub use self::tesseract::TesseractOcr;

#[cfg(feature = "ocr")]
mod tesseract {
    use super::*;
    use crate::error::Error;
    use image::{DynamicImage, ImageFormat};
    use leptess::{LepTess, Variable};
    use std::io::Cursor;

    /// Tesseract-backed OCR engine.
    ///
    /// `languages` uses Tesseract's `+`-joined pack syntax, e.g.
    /// `"eng+fra"`. Language packs are resolved through the standard
    /// `TESSDATA_PREFIX` lookup.
    pub struct TesseractOcr {
        languages: String,
    }

    impl TesseractOcr {
        /// Create an engine for the given language packs.
        pub fn new(languages: impl Into<String>) -> Self {
            Self {
                languages: languages.into(),
            }
        }

        fn session(&self, image: &RgbImage) -> Result<LepTess> {
            let mut session = LepTess::new(None, &self.languages)
                .map_err(|e| Error::Ocr(format!("tesseract init failed: {}", e)))?;
            let mut png = Vec::new();
            DynamicImage::ImageRgb8(image.clone())
                .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
                .map_err(|e| Error::Ocr(format!("failed to encode bitmap: {}", e)))?;
            session
                .set_image_from_mem(&png)
                .map_err(|e| Error::Ocr(format!("failed to load bitmap: {}", e)))?;
            Ok(session)
        }
    }

    impl OcrEngine for TesseractOcr {
        fn extract_words(&self, raster: &PageRaster) -> Result<Vec<Word>> {
            let mut session = self.session(&raster.image)?;
            let tsv = session
                .get_tsv_text(0)
                .map_err(|e| Error::Ocr(format!("tesseract TSV failed: {}", e)))?;
            let words = parse_tsv_words(&tsv);
            log::debug!("OCR recognised {} words", words.len());
            Ok(tsv_words_to_user_units(words, raster))
        }

        fn recognize_region(&self, crop: &RgbImage) -> Result<String> {
            let mut session = self.session(crop)?;
            // PSM 6: assume a single uniform block of text.
            session
                .set_variable(Variable::TesseditPagesegMode, "6")
                .map_err(|e| Error::Ocr(format!("failed to set PSM: {}", e)))?;
            let text = session
                .get_utf8_text()
                .map_err(|e| Error::Ocr(format!("tesseract recognition failed: {}", e)))?;
            Ok(text.trim().to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TSV: &str = "\
1\t1\t0\t0\t0\t0\t0\t0\t2550\t3300\t-1\t
5\t1\t1\t1\t1\t1\t100\t200\t300\t50\t96.1\tHello
5\t1\t1\t1\t1\t2\t420\t200\t280\t50\t95.0\tworld
5\t1\t1\t1\t1\t3\t720\t200\t10\t50\t12.0\t
4\t1\t1\t1\t1\t0\t100\t200\t600\t50\t-1\t";

    #[test]
    fn test_parse_tsv_keeps_word_rows() {
        let words = parse_tsv_words(TSV);
        assert_eq!(words.len(), 2);
        assert_eq!(words[0].text, "Hello");
        assert_eq!(words[0].bbox, [100, 200, 400, 250]);
        assert_eq!(words[1].text, "world");
    }

    #[test]
    fn test_parse_tsv_drops_empty_text() {
        let words = parse_tsv_words(TSV);
        assert!(words.iter().all(|w| !w.text.is_empty()));
    }

    #[test]
    fn test_pixel_to_user_conversion() {
        // 612x792 pt page rendered to 1224x1584 px (2 px per unit)
        let raster = PageRaster::from_image(RgbImage::new(1224, 1584), 612.0, 792.0);
        let words = tsv_words_to_user_units(
            vec![TsvWord {
                text: "x".to_string(),
                bbox: [100, 200, 400, 250],
            }],
            &raster,
        );
        assert_eq!(words[0].bbox, BBox::new(50.0, 100.0, 200.0, 125.0));
        assert!(words[0].style.is_none());
    }

    #[test]
    fn test_disabled_engine_is_empty() {
        let raster = PageRaster::from_image(RgbImage::new(10, 10), 10.0, 10.0);
        assert!(DisabledOcr.extract_words(&raster).unwrap().is_empty());
        assert_eq!(DisabledOcr.recognize_region(&raster.image).unwrap(), "");
    }
}

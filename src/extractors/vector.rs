//! Vector text extraction.
//!
//! Pulls positioned words with font metadata straight from the PDF
//! content stream, plus hyperlink annotations and embedded raster
//! images. pdfium reports geometry in bottom-up page coordinates; this
//! module flips everything to the pipeline's top-left convention.

use crate::error::{Error, Result};
use crate::geometry::BBox;
use crate::model::{FigureRef, Hyperlink, Style, Word};
use pdfium_render::prelude::*;
use std::path::Path;

/// Everything the vector extractor sees on one page.
#[derive(Default)]
pub struct VectorText {
    /// Positioned words with inferred styles, in extraction order
    pub words: Vec<Word>,
    /// URI link annotations with their active rectangles
    pub hyperlinks: Vec<Hyperlink>,
    /// Embedded raster images saved to disk
    pub figures: Vec<FigureRef>,
}

/// Convert a pdfium rect (bottom-up) to a top-left user-unit bbox.
fn flip_rect(rect: &PdfRect, page_height: f32) -> BBox {
    BBox::new(
        rect.left().value,
        page_height - rect.top().value,
        rect.right().value,
        page_height - rect.bottom().value,
    )
}

/// Extract words, hyperlinks and embedded images from one page.
///
/// Word boundaries follow whitespace in the character stream; each word
/// carries the style inferred from its first character's font. Embedded
/// images are saved as `images/page<N>_img<K>.png`; a failed image save
/// is logged and skipped, never fatal.
pub fn extract_page_text(
    document: &PdfDocument,
    page: &PdfPage,
    page_num: usize,
    images_dir: &Path,
) -> Result<VectorText> {
    let page_height = page.height().value;
    let text = page.text().map_err(|e| Error::Stage {
        page_num,
        stage: "vector_words",
        reason: format!("pdfium text page failed: {e:?}"),
    })?;

    let mut result = VectorText::default();
    let mut pending: Option<(String, BBox, Style)> = None;

    for ch in text.chars().iter() {
        let Some(c) = ch.unicode_char() else {
            continue;
        };
        if c.is_whitespace() {
            if let Some((word_text, bbox, style)) = pending.take() {
                result.words.push(Word::vector(word_text, bbox, style));
            }
            continue;
        }
        let Ok(bounds) = ch.loose_bounds() else {
            log::debug!("Character '{}' has no bounds, skipping", c);
            continue;
        };
        let char_box = flip_rect(&bounds, page_height);
        match pending.as_mut() {
            Some((word_text, bbox, _)) => {
                word_text.push(c);
                *bbox = bbox.union(&char_box);
            },
            None => {
                let color = ch
                    .fill_color()
                    .ok()
                    .map(|c| [c.red(), c.green(), c.blue()]);
                let style = Style::from_font(
                    &ch.font_name(),
                    ch.scaled_font_size().value,
                    color,
                );
                pending = Some((c.to_string(), char_box, style));
            },
        }
    }
    if let Some((word_text, bbox, style)) = pending.take() {
        result.words.push(Word::vector(word_text, bbox, style));
    }

    result.hyperlinks = extract_hyperlinks(page, page_height);
    result.figures = extract_images(document, page, page_num, page_height, images_dir);

    log::debug!(
        "Vector extraction on page {}: {} words, {} links, {} images",
        page_num,
        result.words.len(),
        result.hyperlinks.len(),
        result.figures.len()
    );
    Ok(result)
}

/// Collect URI link annotations with their active rectangles.
fn extract_hyperlinks(page: &PdfPage, page_height: f32) -> Vec<Hyperlink> {
    let mut links = Vec::new();
    for annotation in page.annotations().iter() {
        let Some(link_annotation) = annotation.as_link_annotation() else {
            continue;
        };
        let Ok(bounds) = annotation.bounds() else {
            continue;
        };
        let Some(uri) = annotation_uri(link_annotation) else {
            continue;
        };
        links.push(Hyperlink {
            uri,
            bbox: flip_rect(&bounds, page_height),
        });
    }
    links
}

/// Resolve a link annotation to its target URI, if it has one.
fn annotation_uri(link_annotation: &PdfPageLinkAnnotation) -> Option<String> {
    let link = link_annotation.link().ok()?;
    match link.action()? {
        PdfAction::Uri(uri_action) => match uri_action.uri() {
            Ok(uri) if !uri.is_empty() => Some(uri),
            Ok(_) => None,
            Err(e) => {
                log::debug!("Unreadable link URI: {e:?}");
                None
            },
        },
        _ => None,
    }
}

/// Save embedded raster images and return their placements.
fn extract_images(
    document: &PdfDocument,
    page: &PdfPage,
    page_num: usize,
    page_height: f32,
    images_dir: &Path,
) -> Vec<FigureRef> {
    let mut figures = Vec::new();
    let mut index = 0usize;
    for object in page.objects().iter() {
        let Some(image_object) = object.as_image_object() else {
            continue;
        };
        let Ok(bounds) = object.bounds() else {
            continue;
        };
        index += 1;
        let bbox = BBox::new(
            bounds.left().value,
            page_height - bounds.top().value,
            bounds.right().value,
            page_height - bounds.bottom().value,
        );
        let image = match image_object.get_processed_image(document) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("Failed to decode image {} on page {}: {e:?}", index, page_num);
                continue;
            },
        };
        let path = images_dir.join(format!("page{}_img{}.png", page_num, index));
        if let Err(e) = image.save(&path) {
            log::warn!("Failed to save image {}: {}", path.display(), e);
            continue;
        }
        figures.push(FigureRef {
            bbox,
            image_path: path,
        });
    }
    figures
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flip_rect_converts_to_top_left() {
        // A rect spanning y in [700, 780] on a 792pt page, bottom-up.
        let rect = PdfRect::new(
            PdfPoints::new(700.0),
            PdfPoints::new(10.0),
            PdfPoints::new(780.0),
            PdfPoints::new(60.0),
        );
        let bbox = flip_rect(&rect, 792.0);
        assert_eq!(bbox, BBox::new(10.0, 12.0, 60.0, 92.0));
        assert!(bbox.y0 < bbox.y1);
    }
}

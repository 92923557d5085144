//! Page rasterisation.
//!
//! Renders a PDF page to an RGB bitmap at the configured DPI and keeps
//! the page-to-bitmap scale so later stages can convert between pixel
//! and user-unit coordinates. Failure to render is fatal for that page
//! but not for the document.

use crate::error::{Error, Result};
use crate::geometry::BBox;
use image::RgbImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};

/// Points per inch in PDF user space.
pub const POINTS_PER_INCH: f32 = 72.0;

/// A rendered page bitmap plus the geometry linking it to user space.
pub struct PageRaster {
    /// The rendered RGB bitmap
    pub image: RgbImage,
    /// Where the bitmap was saved, when it was
    pub png_path: Option<PathBuf>,
    /// Page width in user units
    pub page_width: f32,
    /// Page height in user units
    pub page_height: f32,
}

impl PageRaster {
    /// Wrap an existing bitmap; used by tests and the OCR fallback path.
    pub fn from_image(image: RgbImage, page_width: f32, page_height: f32) -> Self {
        Self {
            image,
            png_path: None,
            page_width,
            page_height,
        }
    }

    /// Bitmap dimensions in pixels.
    pub fn bitmap_size(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Horizontal pixels per user unit.
    pub fn pixels_per_unit_x(&self) -> f32 {
        self.image.width() as f32 / self.page_width
    }

    /// Vertical pixels per user unit.
    pub fn pixels_per_unit_y(&self) -> f32 {
        self.image.height() as f32 / self.page_height
    }

    /// Crop the bitmap to a user-unit rectangle, clamped to the page.
    pub fn crop_user(&self, bbox: &BBox) -> RgbImage {
        let sx = self.pixels_per_unit_x();
        let sy = self.pixels_per_unit_y();
        let x0 = ((bbox.x0 * sx).max(0.0) as u32).min(self.image.width());
        let y0 = ((bbox.y0 * sy).max(0.0) as u32).min(self.image.height());
        let x1 = ((bbox.x1 * sx).max(0.0) as u32).min(self.image.width());
        let y1 = ((bbox.y1 * sy).max(0.0) as u32).min(self.image.height());
        let w = x1.saturating_sub(x0).max(1);
        let h = y1.saturating_sub(y0).max(1);
        image::imageops::crop_imm(&self.image, x0, y0, w, h).to_image()
    }
}

/// Render one page to `images/page_<N>.png` at the given DPI.
pub fn render_page(
    page: &PdfPage,
    page_num: usize,
    dpi: u32,
    images_dir: &Path,
) -> Result<PageRaster> {
    let page_width = page.width().value;
    let page_height = page.height().value;

    let config = PdfRenderConfig::new()
        .set_target_width((page_width * dpi as f32 / POINTS_PER_INCH) as i32)
        .set_target_height((page_height * dpi as f32 / POINTS_PER_INCH) as i32);

    let bitmap = page.render_with_config(&config).map_err(|e| Error::Stage {
        page_num,
        stage: "raster",
        reason: format!("pdfium render failed: {e:?}"),
    })?;
    let image = bitmap.as_image().to_rgb8();

    let png_path = images_dir.join(format!("page_{}.png", page_num));
    image.save(&png_path).map_err(|e| Error::Stage {
        page_num,
        stage: "raster",
        reason: format!("failed to save {}: {}", png_path.display(), e),
    })?;
    log::debug!(
        "Rendered page {} to {} ({}x{} px)",
        page_num,
        png_path.display(),
        image.width(),
        image.height()
    );

    Ok(PageRaster {
        image,
        png_path: Some(png_path),
        page_width,
        page_height,
    })
}

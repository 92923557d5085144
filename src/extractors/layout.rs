//! ML layout segmentation.
//!
//! Runs a region-detection model over the page bitmap and maps its
//! detections to typed regions (`Text`, `Title`, `List`, `Table`,
//! `Figure`). Detections below the confidence floor are dropped. When the
//! model proposes nothing, the caller synthesises a single full-page Text
//! region so the page still produces content.
//!
//! The expected model is a YOLO-style detector exported post-NMS: input
//! `[1, 3, S, S]` normalised to `[0, 1]`, output `[1, N, 6]` rows of
//! `[x0, y0, x1, y1, score, class]` in input pixel space. Inference runs
//! on CPU through tract; the plan is built once per pipeline and is safe
//! for concurrent read-only use.

use crate::error::{Error, Result};
use crate::geometry::BBox;
use crate::model::BlockKind;
use image::RgbImage;
use std::path::Path;
use tract_onnx::prelude::*;

/// The optimized, runnable detector plan.
type DetectorPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// A typed region proposed by the layout segmenter.
///
/// Coordinates are in page user units once the region has passed through
/// [`to_user_units`]; the raw model output is in bitmap pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutRegion {
    /// Region type
    pub kind: BlockKind,
    /// Region bounds
    pub bbox: BBox,
    /// Model confidence in `[0, 1]`
    pub score: f32,
}

/// A layout segmentation model: analyse one page bitmap, return typed
/// regions in bitmap pixel coordinates.
///
/// The production implementation is [`OnnxLayoutModel`]; tests substitute
/// scripted fakes.
pub trait LayoutModel: Send + Sync {
    /// Detect typed regions on a page bitmap.
    fn detect(&self, image: &RgbImage) -> Result<Vec<LayoutRegion>>;
}

/// Map a detector class index to a region type.
///
/// Class order follows the PubLayNet convention used by the training
/// pipeline: 0=Text, 1=Title, 2=List, 3=Table, 4=Figure.
fn map_label(class_id: usize) -> Option<BlockKind> {
    match class_id {
        0 => Some(BlockKind::Text),
        1 => Some(BlockKind::Title),
        2 => Some(BlockKind::List),
        3 => Some(BlockKind::Table),
        4 => Some(BlockKind::Figure),
        _ => None,
    }
}

/// ONNX-backed layout segmenter.
pub struct OnnxLayoutModel {
    plan: DetectorPlan,
    input_size: u32,
    confidence_floor: f32,
}

impl OnnxLayoutModel {
    /// Default square input resolution fed to the detector.
    pub const DEFAULT_INPUT_SIZE: u32 = 640;

    /// Load the detector from an ONNX file, pinning its input to the
    /// `[1, 3, S, S]` detector shape and optimizing for CPU inference.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the file is missing and
    /// [`Error::Ml`] when it cannot be loaded or optimized.
    pub fn load(path: &Path, confidence_floor: f32) -> Result<Self> {
        Self::load_with_input_size(path, confidence_floor, Self::DEFAULT_INPUT_SIZE)
    }

    /// Load the detector for a non-default input resolution.
    pub fn load_with_input_size(
        path: &Path,
        confidence_floor: f32,
        input_size: u32,
    ) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Layout model file not found: {}",
                path.display()
            )));
        }
        let size = input_size as usize;
        let plan = tract_onnx::onnx()
            .model_for_path(path)
            .map_err(|e| Error::Ml(format!("Failed to load layout model: {}", e)))?
            .with_input_fact(0, f32::fact([1, 3, size, size]).into())
            .map_err(|e| Error::Ml(format!("Detector input shape rejected: {}", e)))?
            .into_optimized()
            .map_err(|e| Error::Ml(format!("Failed to optimize layout model: {}", e)))?
            .into_runnable()
            .map_err(|e| Error::Ml(format!("Failed to build layout model plan: {}", e)))?;

        log::info!(
            "Layout model loaded from {} ({}x{} input)",
            path.display(),
            input_size,
            input_size
        );
        Ok(Self {
            plan,
            input_size,
            confidence_floor,
        })
    }

    /// Resize the bitmap to the detector input and build the normalised
    /// `[1, 3, S, S]` tensor.
    fn preprocess(&self, image: &RgbImage) -> Tensor {
        let size = self.input_size;
        let resized = image::imageops::resize(
            image,
            size,
            size,
            image::imageops::FilterType::Triangle,
        );
        let array = tract_ndarray::Array4::from_shape_fn(
            (1, 3, size as usize, size as usize),
            |(_, c, y, x)| f32::from(resized.get_pixel(x as u32, y as u32)[c]) / 255.0,
        );
        array.into()
    }
}

impl LayoutModel for OnnxLayoutModel {
    fn detect(&self, image: &RgbImage) -> Result<Vec<LayoutRegion>> {
        let (img_w, img_h) = (image.width() as f32, image.height() as f32);
        let input = self.preprocess(image);
        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| Error::Ml(format!("Layout inference failed: {}", e)))?;

        let detections = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| Error::Ml(format!("Unexpected detector output: {}", e)))?;
        let shape = detections.shape().to_vec();
        if shape.len() != 3 || shape[2] < 6 {
            return Err(Error::Ml(format!(
                "Unexpected detector output shape {:?}, expected [1, N, 6]",
                shape
            )));
        }

        // Scale factors from model input space back to bitmap pixels.
        let sx = img_w / self.input_size as f32;
        let sy = img_h / self.input_size as f32;

        let mut regions = Vec::new();
        for row in 0..shape[1] {
            let score = detections[[0, row, 4]];
            if score < self.confidence_floor {
                continue;
            }
            let class_id = detections[[0, row, 5]].round() as usize;
            let Some(kind) = map_label(class_id) else {
                log::debug!("Skipping detection with unknown class {}", class_id);
                continue;
            };
            regions.push(LayoutRegion {
                kind,
                bbox: BBox::new(
                    detections[[0, row, 0]] * sx,
                    detections[[0, row, 1]] * sy,
                    detections[[0, row, 2]] * sx,
                    detections[[0, row, 3]] * sy,
                ),
                score,
            });
        }
        log::debug!(
            "Layout model proposed {} regions above floor {}",
            regions.len(),
            self.confidence_floor
        );
        Ok(regions)
    }
}

/// Convert regions from bitmap pixel space to page user units.
pub fn to_user_units(
    regions: Vec<LayoutRegion>,
    bitmap_size: (u32, u32),
    page_size: (f32, f32),
) -> Vec<LayoutRegion> {
    let sx = page_size.0 / bitmap_size.0 as f32;
    let sy = page_size.1 / bitmap_size.1 as f32;
    regions
        .into_iter()
        .map(|r| LayoutRegion {
            bbox: r.bbox.scaled(sx, sy),
            ..r
        })
        .collect()
}

/// Substitute a single full-page Text region when the segmenter proposed
/// nothing, so downstream fusion still sees the page's words.
pub fn or_full_page(
    regions: Vec<LayoutRegion>,
    page_width: f32,
    page_height: f32,
) -> Vec<LayoutRegion> {
    if !regions.is_empty() {
        return regions;
    }
    log::warn!("Layout segmenter returned no regions, falling back to full-page Text block");
    vec![LayoutRegion {
        kind: BlockKind::Text,
        bbox: BBox::new(0.0, 0.0, page_width, page_height),
        score: 1.0,
    }]
}

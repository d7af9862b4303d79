use image::GrayImage;
use imageproc::contours::{find_contours, BorderType, Contour};
use crate::{
    config::ExtractionConfig,
    error::Result,
    traits::ShapeDetector,
    types::Region,
};

/// Detects node candidates from the outer contours of a binarized image.
///
/// Pixels at or below `threshold` become foreground, so dark strokes and
/// filled shapes on a light page are picked up. Only outermost contours are
/// used: anything drawn inside a shape belongs to that shape.
#[derive(Debug, Clone)]
pub struct ContourShapeDetector {
    pub threshold: u8,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for ContourShapeDetector {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl ContourShapeDetector {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            threshold: config.binarize_threshold,
            min_width: config.min_shape_width,
            min_height: config.min_shape_height,
        }
    }

    /// Inverted global threshold: foreground (255) where `pixel <= threshold`
    pub fn binarize(&self, gray: &GrayImage) -> GrayImage {
        let mut binary = imageproc::contrast::threshold(gray, self.threshold);
        image::imageops::invert(&mut binary);
        binary
    }

    fn is_external(contour: &Contour<i32>) -> bool {
        contour.border_type == BorderType::Outer && contour.parent.is_none()
    }

    /// Bounding box as `(x, y, width, height)`, inclusive of both edge pixels
    fn bounding_box(contour: &Contour<i32>) -> Option<(u32, u32, u32, u32)> {
        let first = contour.points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &contour.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some((
            min_x as u32,
            min_y as u32,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        ))
    }
}

impl ShapeDetector for ContourShapeDetector {
    fn detect_shapes(&self, gray: &GrayImage) -> Result<Vec<Region>> {
        let binary = self.binarize(gray);
        let contours = find_contours::<i32>(&binary);

        let mut regions = Vec::new();
        let mut rejected = 0usize;
        for contour in contours.iter().filter(|c| Self::is_external(c)) {
            let Some((x, y, width, height)) = Self::bounding_box(contour) else {
                continue;
            };
            if width < self.min_width || height < self.min_height {
                rejected += 1;
                continue;
            }
            regions.push(Region { id: regions.len(), x, y, width, height });
        }

        tracing::debug!(
            contours = contours.len(),
            shapes = regions.len(),
            rejected,
            "Shape detection finished"
        );
        Ok(regions)
    }
}

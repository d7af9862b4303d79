use image::{DynamicImage, GrayImage};
use crate::{
    error::{OcrError, Result},
    types::{Region, Segment},
};

/// Intermediate images shared by the detection stages
#[derive(Debug, Clone)]
pub struct PreprocessedImage {
    /// Single-channel intensity image, reused for binarization and OCR
    pub gray: GrayImage,
    /// Binary edge map (255 = edge)
    pub edges: GrayImage,
}

/// Trait for turning the input image into grayscale and edge maps
pub trait ImagePreprocessor: Send + Sync {
    fn preprocess(&self, image: &DynamicImage) -> Result<PreprocessedImage>;
}

/// Trait for shape detection over the grayscale image
pub trait ShapeDetector: Send + Sync {
    /// Detect node regions; ids are assigned in detection order
    fn detect_shapes(&self, gray: &GrayImage) -> Result<Vec<Region>>;
}

/// Trait for line segment detection over an edge map
pub trait LineDetector: Send + Sync {
    fn detect_lines(&self, edges: &GrayImage) -> Result<Vec<Segment>>;
}

/// External text recognition engine.
///
/// Implementations are shared across OCR workers and must tolerate
/// concurrent calls.
pub trait OcrEngine: Send + Sync {
    /// Recognize the text of one cropped region
    fn recognize(&self, region: &GrayImage, language: &str) -> std::result::Result<String, OcrError>;
}

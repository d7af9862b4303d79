use image::{DynamicImage, GrayImage};
use crate::{
    config::ExtractionConfig,
    error::{FlowchartError, Result},
    traits::{ImagePreprocessor, PreprocessedImage},
};

/// `imageproc::edges::canny` smooths with this sigma before taking gradients
pub const CANNY_SIGMA: f32 = 1.4;

/// Grayscale conversion, Gaussian smoothing and Canny edge detection.
///
/// `sigma` is the total smoothing the edge detector sees. Canny already blurs
/// with [`CANNY_SIGMA`], so only the remainder is applied up front, and nothing
/// when `sigma` is at or below it.
#[derive(Debug, Clone)]
pub struct CannyPreprocessor {
    pub sigma: f32,
    pub low_threshold: f32,
    pub high_threshold: f32,
}

impl Default for CannyPreprocessor {
    fn default() -> Self {
        Self::from_config(&ExtractionConfig::default())
    }
}

impl CannyPreprocessor {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            sigma: config.blur_sigma(),
            low_threshold: config.canny_low,
            high_threshold: config.canny_high,
        }
    }

    /// Extra blur applied before Canny. Gaussian variances add, so the
    /// remainder is `sqrt(sigma² - CANNY_SIGMA²)`.
    pub fn pre_blur_sigma(&self) -> Option<f32> {
        (self.sigma > CANNY_SIGMA).then(|| (self.sigma.powi(2) - CANNY_SIGMA.powi(2)).sqrt())
    }

    /// Smooth and edge-detect an already grayscale image
    pub fn edge_map(&self, gray: &GrayImage) -> GrayImage {
        match self.pre_blur_sigma() {
            Some(sigma) => {
                let blurred = imageproc::filter::gaussian_blur_f32(gray, sigma);
                imageproc::edges::canny(&blurred, self.low_threshold, self.high_threshold)
            }
            None => imageproc::edges::canny(gray, self.low_threshold, self.high_threshold),
        }
    }
}

impl ImagePreprocessor for CannyPreprocessor {
    fn preprocess(&self, image: &DynamicImage) -> Result<PreprocessedImage> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(FlowchartError::InvalidDimensions { width, height });
        }

        let gray = image.to_luma8();
        let edges = self.edge_map(&gray);
        Ok(PreprocessedImage { gray, edges })
    }
}

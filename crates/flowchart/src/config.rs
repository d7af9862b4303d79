use std::fs;
use std::path::Path;
use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{FlowchartError, Result};

/// Tunables for one extraction run.
///
/// Every field has a default, so configuration files only need to list the
/// values they change.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Geometry scale factor for renderers. The extraction itself never scales.
    #[schemars(range(min = 0.0))]
    pub scale: f64,
    /// Shortest line segment, in pixels, that counts as a connector
    pub arrow_min_len: u32,
    /// Endpoints must be strictly closer than this to a node center to resolve
    pub connect_threshold: f64,
    pub min_shape_width: u32,
    pub min_shape_height: u32,
    /// OCR language code passed to the engine
    pub ocr_language: String,
    /// OCR page segmentation mode (6 = single uniform block of text)
    pub page_segmentation_mode: u8,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Odd smoothing kernel size, converted to the total Gaussian sigma seen
    /// by edge detection. Canny's own blur (sigma 1.4) already covers the
    /// default kernel; larger kernels add the difference.
    pub blur_kernel_size: u32,
    /// Global binarization threshold; darker pixels become shape foreground
    pub binarize_threshold: u8,
    pub hough_vote_threshold: u32,
    /// Largest gap, in pixels, bridged when following a line
    pub hough_max_gap: u32,
    /// Concurrent OCR calls
    #[schemars(range(min = 1))]
    pub ocr_workers: usize,
    /// Per-region OCR timeout; unset waits for the engine
    pub ocr_timeout_ms: Option<u64>,
    /// Keep only the first connection for each (from, to) pair
    pub deduplicate_connections: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            scale: 0.2,
            arrow_min_len: 50,
            connect_threshold: 80.0,
            min_shape_width: 30,
            min_shape_height: 20,
            ocr_language: "jpn".to_string(),
            page_segmentation_mode: 6,
            canny_low: 50.0,
            canny_high: 150.0,
            blur_kernel_size: 5,
            binarize_threshold: 200,
            hough_vote_threshold: 80,
            hough_max_gap: 10,
            ocr_workers: 4,
            ocr_timeout_ms: None,
            deduplicate_connections: false,
        }
    }
}

impl ExtractionConfig {
    /// Reject values the stages cannot work with.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| Err(FlowchartError::InvalidConfig(message));

        if !(self.scale.is_finite() && self.scale > 0.0) {
            return invalid(format!("scale must be positive, got {}", self.scale));
        }
        if !(self.connect_threshold.is_finite() && self.connect_threshold > 0.0) {
            return invalid(format!(
                "connect_threshold must be positive, got {}",
                self.connect_threshold
            ));
        }
        if self.blur_kernel_size < 3 || self.blur_kernel_size % 2 == 0 {
            return invalid(format!(
                "blur_kernel_size must be odd and at least 3, got {}",
                self.blur_kernel_size
            ));
        }
        if !(self.canny_low >= 0.0 && self.canny_low <= self.canny_high) {
            return invalid(format!(
                "canny thresholds must satisfy 0 <= low <= high, got {}/{}",
                self.canny_low, self.canny_high
            ));
        }
        if self.hough_vote_threshold == 0 {
            return invalid("hough_vote_threshold must be at least 1".to_string());
        }
        if self.ocr_workers == 0 {
            return invalid("ocr_workers must be at least 1".to_string());
        }
        if self.ocr_language.trim().is_empty() {
            return invalid("ocr_language must not be empty".to_string());
        }
        Ok(())
    }

    /// Gaussian sigma equivalent to the configured kernel size.
    pub fn blur_sigma(&self) -> f32 {
        0.3 * ((self.blur_kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }

    pub fn ocr_timeout(&self) -> Option<Duration> {
        self.ocr_timeout_ms.map(Duration::from_millis)
    }

    /// Get the JSON schema of the configuration
    pub fn schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ExtractionConfig)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: ExtractionConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from JSON string
    pub fn from_json(content: &str) -> Result<Self> {
        let config: ExtractionConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Auto-detect file format and load configuration
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&fs::read_to_string(path_ref)?),
            Some("json") => Self::from_json(&fs::read_to_string(path_ref)?),
            _ => Err(FlowchartError::UnsupportedFileFormat),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save configuration, picking the format from the file extension
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path_ref = path.as_ref();
        let content = match path_ref.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => self.to_toml()?,
            Some("json") => self.to_json()?,
            _ => return Err(FlowchartError::UnsupportedFileFormat),
        };
        fs::write(path_ref, content)?;
        Ok(())
    }
}

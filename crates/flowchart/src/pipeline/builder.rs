use std::sync::Arc;
use std::time::Duration;

use crate::{
    algorithms::{CannyPreprocessor, ConnectionResolver, ContourShapeDetector, ProbabilisticHoughDetector},
    config::ExtractionConfig,
    error::Result,
    ocr::{NoopOcrEngine, TextExtractor},
    pipeline::Pipeline,
    traits::{ImagePreprocessor, LineDetector, OcrEngine, ShapeDetector},
};

/// Builder for creating extraction pipelines with a fluent API.
///
/// Stages that are not set explicitly are built from the configuration.
/// Without an OCR engine every node gets empty text.
pub struct PipelineBuilder {
    config: ExtractionConfig,
    preprocessor: Option<Box<dyn ImagePreprocessor>>,
    shape_detector: Option<Box<dyn ShapeDetector>>,
    line_detector: Option<Box<dyn LineDetector>>,
    ocr_engine: Option<Arc<dyn OcrEngine>>,
}

impl PipelineBuilder {
    /// Create a new pipeline builder
    pub fn new() -> Self {
        Self {
            config: ExtractionConfig::default(),
            preprocessor: None,
            shape_detector: None,
            line_detector: None,
            ocr_engine: None,
        }
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: ExtractionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_connect_threshold(mut self, threshold: f64) -> Self {
        self.config.connect_threshold = threshold;
        self
    }

    pub fn with_ocr_language(mut self, language: impl Into<String>) -> Self {
        self.config.ocr_language = language.into();
        self
    }

    pub fn with_ocr_timeout(mut self, timeout: Duration) -> Self {
        self.config.ocr_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_deduplication(mut self) -> Self {
        self.config.deduplicate_connections = true;
        self
    }

    /// Set the preprocessor (replaces the configured Canny preprocessor)
    pub fn set_preprocessor<P>(mut self, preprocessor: P) -> Self
    where
        P: ImagePreprocessor + 'static,
    {
        self.preprocessor = Some(Box::new(preprocessor));
        self
    }

    /// Set the shape detector (replaces the configured contour detector)
    pub fn set_shape_detector<S>(mut self, detector: S) -> Self
    where
        S: ShapeDetector + 'static,
    {
        self.shape_detector = Some(Box::new(detector));
        self
    }

    /// Set the line detector (replaces the configured Hough detector)
    pub fn set_line_detector<L>(mut self, detector: L) -> Self
    where
        L: LineDetector + 'static,
    {
        self.line_detector = Some(Box::new(detector));
        self
    }

    pub fn set_ocr_engine<E>(self, engine: E) -> Self
    where
        E: OcrEngine + 'static,
    {
        self.set_shared_ocr_engine(Arc::new(engine))
    }

    /// Share one engine instance between several pipelines
    pub fn set_shared_ocr_engine(mut self, engine: Arc<dyn OcrEngine>) -> Self {
        self.ocr_engine = Some(engine);
        self
    }

    /// Validate the configuration and build the pipeline
    pub fn build(self) -> Result<Pipeline> {
        self.config.validate()?;
        let config = self.config;

        let preprocessor = self
            .preprocessor
            .unwrap_or_else(|| Box::new(CannyPreprocessor::from_config(&config)));
        let shape_detector = self
            .shape_detector
            .unwrap_or_else(|| Box::new(ContourShapeDetector::from_config(&config)));
        let line_detector = self
            .line_detector
            .unwrap_or_else(|| Box::new(ProbabilisticHoughDetector::from_config(&config)));
        let engine = self.ocr_engine.unwrap_or_else(|| Arc::new(NoopOcrEngine));

        let text_extractor = TextExtractor::from_config(engine, &config);
        let resolver = ConnectionResolver::from_config(&config);

        Ok(Pipeline::new(
            config,
            preprocessor,
            shape_detector,
            line_detector,
            text_extractor,
            resolver,
        ))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowchartError;

    #[test]
    fn test_invalid_config_fails_build() {
        let result = PipelineBuilder::new().with_connect_threshold(0.0).build();
        assert!(matches!(result, Err(FlowchartError::InvalidConfig(_))));
    }

    #[test]
    fn test_convenience_setters_reach_config() {
        let pipeline = PipelineBuilder::new()
            .with_connect_threshold(120.0)
            .with_ocr_language("eng")
            .with_ocr_timeout(Duration::from_secs(3))
            .with_deduplication()
            .build()
            .expect("Should build");

        let config = pipeline.config();
        assert_eq!(config.connect_threshold, 120.0);
        assert_eq!(config.ocr_language, "eng");
        assert_eq!(config.ocr_timeout_ms, Some(3000));
        assert!(config.deduplicate_connections);
    }
}

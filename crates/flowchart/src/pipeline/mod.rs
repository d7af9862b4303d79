pub mod builder;

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use strum::{Display, EnumIter, IntoStaticStr};
use tokio::sync::watch;
use tracing::info;
use crate::{
    algorithms::ConnectionResolver,
    config::ExtractionConfig,
    error::{FlowchartError, Result},
    ocr::TextExtractor,
    traits::{ImagePreprocessor, LineDetector, PreprocessedImage, ShapeDetector},
    types::{Extraction, Graph},
};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    Preprocess,
    DetectShapes,
    ExtractText,
    DetectLines,
    ResolveConnections,
    Assemble,
}

/// Image-to-graph extraction, run as a strict sequence of stages.
///
/// A fatal failure in any stage aborts the run before later stages execute,
/// so callers never see a partial graph.
pub struct Pipeline {
    config: ExtractionConfig,
    preprocessor: Box<dyn ImagePreprocessor>,
    shape_detector: Box<dyn ShapeDetector>,
    line_detector: Box<dyn LineDetector>,
    text_extractor: TextExtractor,
    resolver: ConnectionResolver,
}

impl Pipeline {
    /// Create a new pipeline builder
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    /// Create a new pipeline with the given components
    pub fn new(
        config: ExtractionConfig,
        preprocessor: Box<dyn ImagePreprocessor>,
        shape_detector: Box<dyn ShapeDetector>,
        line_detector: Box<dyn LineDetector>,
        text_extractor: TextExtractor,
        resolver: ConnectionResolver,
    ) -> Self {
        Self {
            config,
            preprocessor,
            shape_detector,
            line_detector,
            text_extractor,
            resolver,
        }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Decode an image file and extract its graph
    pub async fn process_path<P: AsRef<Path>>(&self, path: P) -> Result<Extraction> {
        let image = image::open(path)?;
        self.process(&image).await
    }

    /// [`Pipeline::process_path`] with a cancellation signal
    pub async fn process_path_with_cancel<P: AsRef<Path>>(
        &self,
        path: P,
        cancel: watch::Receiver<bool>,
    ) -> Result<Extraction> {
        let image = image::open(path)?;
        self.process_with_cancel(&image, cancel).await
    }

    /// Decode an in-memory image and extract its graph
    pub async fn process_bytes(&self, bytes: &[u8]) -> Result<Extraction> {
        let image = image::load_from_memory(bytes)?;
        self.process(&image).await
    }

    pub async fn process(&self, image: &DynamicImage) -> Result<Extraction> {
        self.run(image, None).await
    }

    /// Like [`Pipeline::process`], but stops at the OCR boundary once `cancel`
    /// turns true and fails with [`FlowchartError::Cancelled`].
    pub async fn process_with_cancel(
        &self,
        image: &DynamicImage,
        cancel: watch::Receiver<bool>,
    ) -> Result<Extraction> {
        self.run(image, Some(cancel)).await
    }

    async fn run(
        &self,
        image: &DynamicImage,
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<Extraction> {
        let (image_width, image_height) = (image.width(), image.height());
        info!(stage = %Stage::Preprocess, image_width, image_height, "Starting extraction");
        let PreprocessedImage { gray, edges } = self.preprocessor.preprocess(image)?;

        let regions = self.shape_detector.detect_shapes(&gray)?;
        info!(stage = %Stage::DetectShapes, shapes = regions.len());

        let annotated = self
            .text_extractor
            .annotate(Arc::new(gray), &regions, cancel.clone())
            .await;
        info!(stage = %Stage::ExtractText, warnings = annotated.warnings.len());
        if cancel.as_ref().is_some_and(|signal| *signal.borrow()) {
            return Err(FlowchartError::Cancelled);
        }

        let segments = self.line_detector.detect_lines(&edges)?;
        info!(stage = %Stage::DetectLines, segments = segments.len());

        let connections = self.resolver.resolve(&annotated.nodes, &segments);
        info!(stage = %Stage::ResolveConnections, connections = connections.len());

        let graph = Graph::assemble(annotated.nodes, connections);
        info!(
            stage = %Stage::Assemble,
            nodes = graph.nodes().len(),
            connections = graph.connections().len(),
            "Extraction finished"
        );

        Ok(Extraction {
            graph,
            warnings: annotated.warnings,
            image_width,
            image_height,
        })
    }
}

//! # Flowchart Extraction Library
//!
//! Turns a raster image of a drawn flowchart into a graph of labeled nodes
//! and directed connections.
//!
//! ## Stages
//!
//! 1. **Preprocess**: grayscale, Gaussian smoothing, Canny edge map
//! 2. **Detect shapes**: inverted global threshold, outer contours, size filter
//! 3. **Extract text**: OCR per node region, fanned out over a bounded worker pool
//! 4. **Detect lines**: progressive probabilistic Hough transform on the edge map
//! 5. **Resolve connections**: segment endpoints snap to the nearest node center
//! 6. **Assemble**: nodes and connections become an immutable [`Graph`]
//!
//! Connection direction comes from the order of the detected segment's
//! endpoints. Arrow heads are never inspected, so treat direction as a hint.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flowchart::{Pipeline, TesseractEngine};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::builder()
//!     .with_ocr_language("eng")
//!     .set_ocr_engine(TesseractEngine::new()?)
//!     .build()?;
//!
//! let extraction = pipeline.process_path("flowchart.png").await?;
//! for node in extraction.graph.nodes() {
//!     println!("{}: {}", node.id, node.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod types;
pub mod config;
pub mod traits;
pub mod algorithms;
pub mod ocr;
pub mod pipeline;
pub mod render;

// Re-exports for convenience
pub use error::{FlowchartError, OcrError, Result};
pub use types::{Connection, Extraction, ExtractionWarning, Graph, Node, Region, Segment};
pub use config::ExtractionConfig;
pub use traits::*;
pub use algorithms::*;
pub use ocr::{NoopOcrEngine, TesseractEngine, TextExtractor};
pub use pipeline::{Pipeline, Stage, builder::PipelineBuilder};
pub use render::{GraphRenderer, Layout, LayoutRenderer};

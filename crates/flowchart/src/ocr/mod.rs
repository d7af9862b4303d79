pub mod tesseract;

pub use tesseract::TesseractEngine;

use std::sync::Arc;
use std::time::Duration;

use image::GrayImage;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinSet;
use crate::{
    config::ExtractionConfig,
    error::OcrError,
    traits::OcrEngine,
    types::{ExtractionWarning, Node, Region},
};

/// Engine that recognizes nothing. Useful for geometry-only runs.
#[derive(Debug, Clone, Default)]
pub struct NoopOcrEngine;

impl OcrEngine for NoopOcrEngine {
    fn recognize(&self, _region: &GrayImage, _language: &str) -> Result<String, OcrError> {
        Ok(String::new())
    }
}

/// Nodes with their text filled in, plus any recovered OCR failures
#[derive(Debug, Clone, Default)]
pub struct AnnotatedNodes {
    pub nodes: Vec<Node>,
    pub warnings: Vec<ExtractionWarning>,
}

/// Runs OCR over every region with a bounded number of concurrent engine calls.
///
/// A failing, panicking, timed-out or cancelled call yields an empty text
/// and a warning for that node only.
#[derive(Clone)]
pub struct TextExtractor {
    engine: Arc<dyn OcrEngine>,
    language: String,
    workers: usize,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExtractor")
            .field("language", &self.language)
            .field("workers", &self.workers)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl TextExtractor {
    pub fn new(engine: Arc<dyn OcrEngine>) -> Self {
        Self::from_config(engine, &ExtractionConfig::default())
    }

    pub fn from_config(engine: Arc<dyn OcrEngine>, config: &ExtractionConfig) -> Self {
        Self {
            engine,
            language: config.ocr_language.clone(),
            workers: config.ocr_workers.max(1),
            timeout: config.ocr_timeout(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Recognize the text of every region. Nodes come back in region order,
    /// whatever order the engine calls finish in.
    pub async fn annotate(
        &self,
        gray: Arc<GrayImage>,
        regions: &[Region],
        cancel: Option<watch::Receiver<bool>>,
    ) -> AnnotatedNodes {
        let permits = Arc::new(Semaphore::new(self.workers));
        let mut tasks = JoinSet::new();

        for (index, region) in regions.iter().copied().enumerate() {
            let call = OcrCall {
                engine: Arc::clone(&self.engine),
                gray: Arc::clone(&gray),
                region,
                language: self.language.clone(),
                timeout: self.timeout,
            };
            let permits = Arc::clone(&permits);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let work = call.run(permits);
                let result = match cancel {
                    Some(signal) => tokio::select! {
                        biased;
                        _ = cancelled(signal) => Err(OcrError::Cancelled),
                        result = work => result,
                    },
                    None => work.await,
                };
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<String, OcrError>>> =
            std::iter::repeat_with(|| None).take(regions.len()).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(e) => tracing::error!("OCR task aborted: {}", e),
            }
        }

        let mut annotated = AnnotatedNodes::default();
        for (region, result) in regions.iter().zip(results) {
            let text = match result {
                Some(Ok(text)) => text.trim().to_string(),
                Some(Err(e)) => {
                    annotated.warn(region.id, e.to_string());
                    String::new()
                }
                None => {
                    annotated.warn(region.id, "OCR task aborted".to_string());
                    String::new()
                }
            };
            annotated.nodes.push(Node::from_region(*region, text));
        }
        annotated
    }
}

impl AnnotatedNodes {
    fn warn(&mut self, node_id: usize, message: String) {
        tracing::warn!(node_id, "OCR failed, using empty text: {}", message);
        self.warnings.push(ExtractionWarning { node_id, message });
    }
}

/// One engine invocation over a cropped region
struct OcrCall {
    engine: Arc<dyn OcrEngine>,
    gray: Arc<GrayImage>,
    region: Region,
    language: String,
    timeout: Option<Duration>,
}

impl OcrCall {
    async fn run(self, permits: Arc<Semaphore>) -> Result<String, OcrError> {
        let permit = permits.acquire_owned().await.map_err(|_| OcrError::Cancelled)?;
        let timeout = self.timeout;

        let Self { engine, gray, region, language, .. } = self;
        // Held until the engine returns, even after a timeout.
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let crop = image::imageops::crop_imm(
                gray.as_ref(),
                region.x,
                region.y,
                region.width,
                region.height,
            )
            .to_image();
            engine.recognize(&crop, &language)
        });
        let call = async move {
            match handle.await {
                Ok(result) => result,
                Err(e) => Err(OcrError::Engine(format!("engine panicked: {}", e))),
            }
        };

        match timeout {
            // The blocking call keeps running in the background; its result is dropped.
            // The next region waits for its permit.
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| OcrError::Timeout(limit.as_millis() as u64))?,
            None => call.await,
        }
    }
}

/// Resolves once the signal turns true. A dropped sender never cancels.
async fn cancelled(mut signal: watch::Receiver<bool>) {
    let closed = signal.wait_for(|cancelled| *cancelled).await.is_err();
    if closed {
        std::future::pending::<()>().await;
    }
}

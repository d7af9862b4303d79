use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowchartError {
    #[error("Invalid image: {0}")]
    InvalidImage(#[from] image::ImageError),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    #[error("Extraction cancelled")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML write error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("Unsupported file format. Please use .toml or .json files")]
    UnsupportedFileFormat,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FlowchartError>;

/// Failure at the OCR engine boundary. Always recovered per region.
#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("OCR engine failed: {0}")]
    Engine(String),

    #[error("OCR timed out after {0} ms")]
    Timeout(u64),

    #[error("OCR cancelled")]
    Cancelled,

    #[error("Region could not be encoded: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use image::{GrayImage, ImageFormat};
use crate::{error::OcrError, traits::OcrEngine};

/// Runs the `tesseract` command-line tool on each region.
///
/// Every call writes the region to a temporary PNG, so the engine holds no
/// per-call state and can be shared freely between OCR workers.
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    executable: PathBuf,
    page_segmentation_mode: u8,
}

impl TesseractEngine {
    /// Locate `tesseract` on the `PATH` or in the usual install locations
    pub fn new() -> Result<Self, OcrError> {
        Ok(Self {
            executable: Self::find_executable()?,
            page_segmentation_mode: 6,
        })
    }

    pub fn with_path(executable: impl Into<PathBuf>) -> Result<Self, OcrError> {
        let executable = executable.into();
        if !executable.exists() {
            return Err(OcrError::EngineUnavailable(format!(
                "Tesseract executable not found at: {}",
                executable.display()
            )));
        }
        Ok(Self {
            executable,
            page_segmentation_mode: 6,
        })
    }

    pub fn with_page_segmentation_mode(mut self, mode: u8) -> Self {
        self.page_segmentation_mode = mode;
        self
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    fn find_executable() -> Result<PathBuf, OcrError> {
        if let Ok(output) = Command::new("which").arg("tesseract").output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Ok(PathBuf::from(path));
                }
            }
        }

        let common_paths = [
            "/usr/bin/tesseract",
            "/usr/local/bin/tesseract",
            "/opt/homebrew/bin/tesseract",
        ];
        common_paths
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
            .ok_or_else(|| {
                OcrError::EngineUnavailable(
                    "Tesseract executable not found. Please install Tesseract or specify the path.".to_string(),
                )
            })
    }

    fn build_command(&self, input: &Path, language: &str) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg(input)
            .arg("stdout")
            .args(["-l", language])
            .args(["--psm", &self.page_segmentation_mode.to_string()]);
        cmd
    }
}

impl OcrEngine for TesseractEngine {
    fn recognize(&self, region: &GrayImage, language: &str) -> Result<String, OcrError> {
        if region.width() == 0 || region.height() == 0 {
            return Err(OcrError::Engine("empty region".to_string()));
        }

        let input = tempfile::Builder::new()
            .prefix("flowchart-region-")
            .suffix(".png")
            .tempfile()?;
        region.save_with_format(input.path(), ImageFormat::Png)?;

        let output = self
            .build_command(input.path(), language)
            .output()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => OcrError::EngineUnavailable(format!(
                    "{}: {}",
                    self.executable.display(),
                    e
                )),
                _ => OcrError::Io(e),
            })?;

        if !output.status.success() {
            return Err(OcrError::Engine(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

use std::fs;
use std::path::Path;

use flowchart::{Extraction, ExtractionConfig, FlowchartError, GraphRenderer, LayoutRenderer};
use serde::Serialize;
use strum::{Display, EnumString, IntoStaticStr, VariantNames};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Flowchart(#[from] FlowchartError),
    #[error(transparent)]
    SerdeError(#[from] serde_json::Error),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// What `extract` writes out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, IntoStaticStr, VariantNames)]
#[strum(serialize_all = "snake_case")]
pub enum OutputFormat {
    /// Nodes, connections and recovered warnings as extracted
    #[default]
    Graph,
    /// Scaled shapes and connectors, ready for a drawing target
    Layout,
}

/// Load the configuration file if one was given, defaults otherwise
pub fn load_config(path: Option<&Path>) -> Result<ExtractionConfig, CliError> {
    match path {
        Some(path) => Ok(ExtractionConfig::from_file(path)?),
        None => Ok(ExtractionConfig::default()),
    }
}

/// Serialize an extraction in the requested format
pub fn render_output(
    extraction: Extraction,
    format: OutputFormat,
    config: &ExtractionConfig,
) -> Result<String, CliError> {
    match format {
        OutputFormat::Graph => to_pretty_json(&extraction),
        OutputFormat::Layout => {
            let layout = LayoutRenderer::from_config(config).render(extraction.graph)?;
            to_pretty_json(&layout)
        }
    }
}

/// Write to the given file, or stdout when none is given
pub fn write_output(content: &str, output: Option<&Path>) -> Result<(), CliError> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
        None => println!("{}", content),
    }
    Ok(())
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(value)?)
}

mod check;
mod fmt;
mod run;

pub use check::CheckCommand;
pub use fmt::FmtCommand;
pub use run::RunCommand;

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

pub fn output_format(raw: &str) -> Result<OutputFormat> {
    match raw.to_ascii_lowercase().as_str() {
        "human" => Ok(OutputFormat::Human),
        "json" => Ok(OutputFormat::Json),
        other => bail!("Unsupported output format: {other}. Use human or json."),
    }
}

pub fn load_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read rule source: {}", path.display()))
}

/// Loads a JSON or YAML record file, keyed off the extension. Both the data
/// domain and top-level options must be objects.
pub fn load_record(path: &Path, what: &str) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {what} file: {}", path.display()))?;
    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    );
    let value: Value = if is_yaml {
        let deserializer = serde_yaml::Deserializer::from_str(&text);
        serde_path_to_error::deserialize(deserializer)
            .with_context(|| format!("invalid {what} file: {}", path.display()))?
    } else {
        let mut deserializer = serde_json::Deserializer::from_str(&text);
        serde_path_to_error::deserialize(&mut deserializer)
            .with_context(|| format!("invalid {what} file: {}", path.display()))?
    };
    if !value.is_object() {
        bail!("{what} file must hold a JSON object: {}", path.display());
    }
    Ok(value)
}

pub mod builder;
pub mod defaults;
pub mod filter;
pub mod merge;
pub mod types;

#[cfg(test)]
mod tests;

pub use builder::ConfigBuilder;
pub use filter::ObjectFilter;
pub use types::*;

use crate::errors::DbSampleError;
use anyhow::Result;
use std::path::Path;

/// Load a JSON or YAML config file (§6 Input configuration). Missing file is
/// not an error — callers fall back to CLI-only input.
pub fn load_config(config_file: &str) -> Result<ConfigInput> {
    let path = Path::new(config_file);
    if !path.exists() {
        return Ok(ConfigInput::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| {
        DbSampleError::Io(format!("could not read config file {config_file}: {e}"))
    })?;
    let input = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&contents).map_err(|e| {
            DbSampleError::Configuration(format!("invalid JSON in {config_file}: {e}"))
        })?,
        _ => serde_yaml::from_str(&contents).map_err(|e| {
            DbSampleError::Configuration(format!("invalid YAML in {config_file}: {e}"))
        })?,
    };
    Ok(input)
}

//! Config file loading.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::{Result, RetuneConfig};

/// Parses a TOML config. Missing keys keep their defaults.
pub fn parse_config(text: &str) -> Result<RetuneConfig> {
    let config: RetuneConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

pub fn load_config(path: impl AsRef<Path>) -> Result<RetuneConfig> {
    let path = path.as_ref();
    let config = parse_config(&fs::read_to_string(path)?)?;
    debug!("Loaded config from {}", path.display());
    Ok(config)
}

use std::fs;
use std::io;
use std::path::Path;

use engine_logging::engine_info;
use feed_core::{ConfigError, FeedConfig};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ron::error::SpannedError,
    },
    #[error("invalid feed configuration: {0}")]
    Invalid(#[from] ConfigError),
}

/// Reads and validates a RON feed configuration.
pub fn load_config(path: &Path) -> Result<FeedConfig, SettingsError> {
    let content = fs::read_to_string(path).map_err(|source| SettingsError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let config: FeedConfig = ron::from_str(&content).map_err(|source| SettingsError::Parse {
        path: path.display().to_string(),
        source,
    })?;
    config.validate()?;
    engine_info!(
        "loaded {} card type(s) from {}",
        config.card_types.len(),
        path.display()
    );
    Ok(config)
}

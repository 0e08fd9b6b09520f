use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading, changing or writing a [`LineageConfig`].
///
/// [`LineageConfig`]: crate::config::LineageConfig
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file exists but could not be read or written.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A `SECTION.KEY` that the schema does not define.
    #[error("unknown setting '{0}'")]
    UnknownSetting(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidOverride { key: String, reason: String },

    #[error("invalid configuration: {key} {reason}")]
    Invalid { key: String, reason: String },

    #[error("failed to write config: {0}")]
    Write(#[source] io::Error),
}

/// Errors that end the bootstrap with a non-zero exit status.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),

    #[error("experiment run failed: {0:#}")]
    Run(anyhow::Error),
}

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot access config file: {path}: {source}")]
    ConfigUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {path}: {message}")]
    ConfigMalformed { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

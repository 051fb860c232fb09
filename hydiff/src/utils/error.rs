use strum::EnumIs;
use thiserror::Error;

#[derive(Debug, Error, EnumIs)]
pub enum DiffError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse configuration file '{file}': {source}")]
    ConfigParseError {
        source: toml::de::Error,
        file: String,
    },

    #[error("Unknown attribute '{name}' listed in configuration key '{key}'")]
    UnknownAttribute { name: String, key: &'static str },
}

pub type DiffResult<T> = Result<T, DiffError>;

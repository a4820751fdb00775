use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    /// The input is structurally not an ordered list of tracks.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Invalid Camelot key: {0:?}")]
    InvalidKey(String),
    #[error("Unsupported set file format: {0}")]
    UnsupportedFormat(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, FlowError>;

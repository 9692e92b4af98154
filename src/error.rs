use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Payload matched neither the current nor the legacy record shape.
    #[error("record matches no known schema: {current} (legacy: {legacy})")]
    SchemaDecode {
        current: serde_json::Error,
        legacy: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },

    #[error("{what} mismatch: running {running:?}, session requires {required:?}")]
    VersionMismatch {
        what: &'static str,
        running: String,
        required: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

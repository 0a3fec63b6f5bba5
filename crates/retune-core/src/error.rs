//! Error types for retune-core.
//!
//! Every variant is a startup error: nothing on the block path returns `Result`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Parse error on line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid scale: {0}")]
    InvalidScale(String),

    #[error("Invalid keyboard mapping: {0}")]
    InvalidMapping(String),

    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Key {key} needs {cents:.3} cents of bend, outside the ±{range} cent pitch-bend range")]
    PitchBendOutOfRange { key: u8, cents: f64, range: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;

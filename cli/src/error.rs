use std::io;
use std::path::PathBuf;

use billingo_core::BillingoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    /// Bad user input caught before any request is made.
    #[error("{0}")]
    Validation(String),

    #[error("Config file {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("{0}")]
    Api(#[from] BillingoError),

    /// The API answered with an empty envelope.
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("IO Error: {0}")]
    Io(#[from] io::Error),
}

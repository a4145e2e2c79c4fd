use std::io;
use std::path::PathBuf;

use thiserror::Error;

use interop_core::GenerationError;

pub type Result<T> = std::result::Result<T, BindgenError>;

/// Failures of the command line front end, around a generation run.
#[derive(Debug, Error)]
pub enum BindgenError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid descriptor feed {}: {source}", path.display())]
    Feed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid configuration file {}: {source}", path.display())]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl BindgenError {
    /// Errors that came out of generation keep their diagnostic code.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            BindgenError::Generation(err) => Some(err.code()),
            _ => None,
        }
    }
}

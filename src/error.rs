use serde::Serialize;
use std::io;

#[derive(Debug, thiserror::Error)]
pub enum DictionaryLoadError {
    #[error("Failed to read word list '{source_name}': {error}")]
    Io {
        source_name: String,
        #[source]
        error: io::Error,
    },
    #[error("Word list '{source_name}' contains no words")]
    Empty { source_name: String },
    #[error("Failed to build dictionary from '{source_name}': {error}")]
    Fst {
        source_name: String,
        #[source]
        error: fst::Error,
    },
}

/// A buffer that is not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("File is not valid UTF-8 (valid up to byte {valid_up_to}): {message}")]
pub struct DecodeError {
    pub valid_up_to: usize,
    pub message: String,
}

impl From<std::str::Utf8Error> for DecodeError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self {
            valid_up_to: err.valid_up_to(),
            message: err.to_string(),
        }
    }
}

/// Why a single file produced no diagnostics. Never fatal to a run.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileError {
    #[error("Failed to read file: {message}")]
    Read { message: String },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<io::Error> for FileError {
    fn from(err: io::Error) -> Self {
        FileError::Read {
            message: err.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid syntax for language '{language}': {reason}")]
pub struct SyntaxError {
    pub language: String,
    pub reason: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Dictionary(#[from] DictionaryLoadError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;

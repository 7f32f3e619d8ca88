pub mod checker;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod language;
pub mod span;

pub use checker::dictionary::{Dictionary, WordSource};
pub use checker::{CheckOptions, Checker, IgnoreList};
pub use config::Config;
pub use engine::{Engine, FileReport, FileTask, Report, SourceFile};
pub use error::{DecodeError, DictionaryLoadError, Error, FileError, Result};
pub use language::{LanguageDescriptor, Languages, Syntax};
pub use span::{Position, Span};

use serde::Serialize;

/// An unknown word found in a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// The word as written in the source.
    pub word: String,
    pub normalized: String,
    pub span: Span,
    pub suggestions: Vec<String>,
}

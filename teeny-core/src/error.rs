use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("failed to write output file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("lex error at line {line} (byte {position}): {message}")]
    LexError {
        line: u32,
        position: usize,
        message: String,
    },
    #[error("parse error at line {line}: {message}")]
    ParseError { line: u32, message: String },
    #[error("semantic error at line {line}: {message}")]
    SemanticError { line: u32, message: String },
}

impl CoreError {
    /// Line the error was detected on.
    pub fn line(&self) -> Option<u32> {
        match self {
            CoreError::Io { .. } => None,
            CoreError::LexError { line, .. }
            | CoreError::ParseError { line, .. }
            | CoreError::SemanticError { line, .. } => Some(*line),
        }
    }
}

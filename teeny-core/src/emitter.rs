//! Output sink for generated C code.
//!
//! The emitter knows nothing about the grammar. It keeps two append-only
//! buffers, a header (includes, declarations, entry point) and a body
//! (statements), and writes them out header first.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::error::CoreError;

/// Artifact name used when no output path is configured.
pub const DEFAULT_OUTPUT: &str = "out.c";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Emitter {
    header: String,
    code: String,
}

impl Emitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `code` to the body without a separator.
    pub fn emit(&mut self, code: &str) {
        self.code.push_str(code);
    }

    pub fn emit_line(&mut self, code: &str) {
        self.code.push_str(code);
        self.code.push('\n');
    }

    pub fn header_line(&mut self, code: &str) {
        self.header.push_str(code);
        self.header.push('\n');
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Header followed by body.
    pub fn output(&self) -> String {
        let mut output = String::with_capacity(self.header.len() + self.code.len());
        output.push_str(&self.header);
        output.push_str(&self.code);
        output
    }

    pub fn write_to(&self, mut writer: impl Write) -> io::Result<()> {
        writer.write_all(self.header.as_bytes())?;
        writer.write_all(self.code.as_bytes())?;
        writer.flush()
    }

    /// Writes the artifact to `path`, replacing any existing file.
    ///
    /// The file handle is dropped (and closed) before this returns, on
    /// success and on failure alike.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), CoreError> {
        let path = path.as_ref();
        let io_error = |source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        };
        let file = File::create(path).map_err(io_error)?;
        self.write_to(BufWriter::new(file)).map_err(io_error)?;
        debug!(
            path = %path.display(),
            bytes = self.header.len() + self.code.len(),
            "wrote output file"
        );
        Ok(())
    }
}

use std::path::Path;

use tracing::debug;

use crate::emitter::Emitter;
use crate::error::CoreError;
use crate::lexer::Scanner;
use crate::parser::Parser;

/// Compiles `source` and returns the generated C program.
pub fn compile(source: &str) -> Result<String, CoreError> {
    generate(source).map(|emitter| emitter.output())
}

/// Compiles `source` and writes the C program to `path`.
///
/// Nothing is written unless the whole program compiles.
pub fn compile_to_path(source: &str, path: impl AsRef<Path>) -> Result<(), CoreError> {
    let emitter = generate(source)?;
    emitter.write(path)
}

fn generate(source: &str) -> Result<Emitter, CoreError> {
    let mut emitter = Emitter::new();
    {
        let mut parser = Parser::new(Scanner::new(source), &mut emitter)?;
        parser.program()?;
        debug!(
            symbols = parser.symbols().len(),
            labels = parser.labels().len(),
            "parsed program"
        );
    }
    Ok(emitter)
}

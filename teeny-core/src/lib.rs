//! Core pipeline for the Teeny compiler.
//!
//! Teeny source is translated straight into C in a single pass:
//!
//!   source text
//!     -> lexer    (tokens, pulled one at a time)
//!     -> parser   (grammar + semantic checks, drives the emitter)
//!     -> emitter  (header and body buffers, written out at the end)
//!
//! There is no intermediate tree. Front-ends (the CLI, tests) should go
//! through [`compile`] or [`compile_to_path`].

// ---------------------------------------------------------------------
// Error handling
// ---------------------------------------------------------------------

pub mod error;

// ---------------------------------------------------------------------
// Front-end: scanning and parsing
// ---------------------------------------------------------------------

pub mod lexer;
pub mod parser;

// ---------------------------------------------------------------------
// Back-end: output and orchestration
// ---------------------------------------------------------------------

pub mod emitter;
pub mod compiler;

// ---------------------------------------------------------------------
// Public API re-exports
// ---------------------------------------------------------------------

pub use compiler::{compile, compile_to_path};
pub use emitter::{DEFAULT_OUTPUT, Emitter};
pub use error::CoreError;
pub use lexer::{Scanner, Token, TokenKind, tokenize};

use std::io;

use thiserror::Error;

/// Errors raised while reading SFZ text.
///
/// Unknown opcodes and unsupported sections are not errors here; the reader
/// skips them with a warning and leaves the rest to the converter.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    IO(#[from] io::Error),

    /// An opcode value that does not read as the expected kind, e.g. `lokey=foo`
    #[error("'{value}' is not a valid {expected}")]
    InvalidValue { value: String, expected: &'static str },

    /// Malformed header or opcode, with 1-based position
    #[error("Failed to parse SFZ at line {line}, column {column}: {message}")]
    ParseAt {
        line: usize,
        column: usize,
        message: String,
    },
}

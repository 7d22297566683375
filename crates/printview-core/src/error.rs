//! Error handling for PrintView
//!
//! Two kinds of failure are modelled here:
//! - [`Diagnostic`] - recoverable conditions found while interpreting a
//!   toolpath. They are collected and reported; they never abort a pass.
//! - [`Error`] - genuine failures outside the interpretation pass, such as
//!   I/O while reading a file.
//!
//! All error types use `thiserror` for ergonomic error handling.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How loudly a diagnostic should be surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    /// Informational, e.g. an unhandled command of the recognised family
    Info,
    /// Something in the input was dropped or ignored
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// Diagnostic raised while decoding or interpreting G-code
///
/// Line numbers are 1-based positions in the source text.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Diagnostic {
    /// A word carried a value that is not a finite number
    #[error("Malformed argument '{word}{value}' at line {line_number}")]
    MalformedArgument {
        /// The line number where the word was found.
        line_number: usize,
        /// The word letter.
        word: char,
        /// The text that failed to parse.
        value: String,
    },

    /// A command of the recognised family that is deliberately not interpreted
    #[error("Unsupported operation {code} at line {line_number}: {reason}")]
    UnsupportedOperation {
        /// The line number of the command.
        line_number: usize,
        /// The operation code, e.g. `G2`.
        code: String,
        /// Why the command (or part of it) was skipped.
        reason: String,
    },

    /// A command of the recognised family with no handler
    #[error("Unknown operation {code} at line {line_number}")]
    UnknownOperation {
        /// The line number of the command.
        line_number: usize,
        /// The operation code.
        code: String,
    },

    /// The input contained no commands at all
    #[error("Input contains no commands")]
    EmptyInput,
}

impl Diagnostic {
    /// Severity used when logging or summarising this diagnostic
    pub fn severity(&self) -> Severity {
        match self {
            Self::MalformedArgument { .. } | Self::UnsupportedOperation { .. } => {
                Severity::Warning
            }
            Self::UnknownOperation { .. } | Self::EmptyInput => Severity::Info,
        }
    }

    /// Source line the diagnostic refers to, if any
    pub fn line_number(&self) -> Option<usize> {
        match self {
            Self::MalformedArgument { line_number, .. }
            | Self::UnsupportedOperation { line_number, .. }
            | Self::UnknownOperation { line_number, .. } => Some(*line_number),
            Self::EmptyInput => None,
        }
    }
}

/// Main error type for PrintView
#[derive(Error, Debug)]
pub enum Error {
    /// Standard I/O error while reading a program
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;

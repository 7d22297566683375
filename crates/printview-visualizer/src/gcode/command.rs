//! G-Code line decoding
//!
//! A raw line is upper-cased, stripped of its `;` comment and split into
//! whitespace-separated words. The first word is the operation code and every
//! other word is a letter followed by a number.

use printview_core::constants::{BARE_WORD_VALUE, DEFAULT_FAMILY_PREFIX};
use printview_core::{Diagnostic, PartialPosition, TRACKED_AXES};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

/// Operation selected by a command's code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// G0/G1 straight move. `rapid` is informational only.
    LinearMove { rapid: bool },
    /// G28 home or G29 auto-level
    Home,
    /// G90
    AbsoluteMode,
    /// G91
    RelativeMode,
    /// G92
    SetPosition,
    /// G2/G3, recognised but never interpreted
    Arc { clockwise: bool },
    /// Anything else. `in_family` is true when the code carries the recognised prefix.
    Unknown { in_family: bool },
}

impl Operation {
    /// Classify an upper-cased operation code
    ///
    /// Codes are compared numerically, so `G01` and `G1` are the same operation.
    pub fn from_code(code: &str, family_prefix: char) -> Self {
        let Some(rest) = code.strip_prefix(family_prefix) else {
            return Self::Unknown { in_family: false };
        };

        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Self::Unknown { in_family: true };
        }

        match rest.parse::<u32>() {
            Ok(0) => Self::LinearMove { rapid: true },
            Ok(1) => Self::LinearMove { rapid: false },
            Ok(2) => Self::Arc { clockwise: true },
            Ok(3) => Self::Arc { clockwise: false },
            Ok(28) | Ok(29) => Self::Home,
            Ok(90) => Self::AbsoluteMode,
            Ok(91) => Self::RelativeMode,
            Ok(92) => Self::SetPosition,
            _ => Self::Unknown { in_family: true },
        }
    }

}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinearMove { rapid: true } => write!(f, "Rapid move"),
            Self::LinearMove { rapid: false } => write!(f, "Linear move"),
            Self::Home => write!(f, "Home"),
            Self::AbsoluteMode => write!(f, "Absolute positioning"),
            Self::RelativeMode => write!(f, "Relative positioning"),
            Self::SetPosition => write!(f, "Set position"),
            Self::Arc { clockwise: true } => write!(f, "Clockwise arc"),
            Self::Arc { clockwise: false } => write!(f, "Counter-clockwise arc"),
            Self::Unknown { .. } => write!(f, "Unknown"),
        }
    }
}

/// A decoded command line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    /// 1-based line number in the source text
    pub line_number: usize,
    /// Operation code as written (upper-cased), e.g. "G1"
    pub code: String,
    /// Classified operation
    pub operation: Operation,
    /// Word values keyed by letter. Absent letters were not written.
    pub words: BTreeMap<char, f64>,
}

impl Command {
    /// Value of a word, if present
    pub fn word(&self, letter: char) -> Option<f64> {
        self.words.get(&letter).copied()
    }

    /// Values of the tracked axes named by this command
    pub fn axes(&self) -> PartialPosition {
        let mut axes = PartialPosition::new();
        for axis in TRACKED_AXES {
            axes.set(axis, self.word(axis.letter()));
        }
        axes
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        for (letter, value) in &self.words {
            write!(f, " {}{}", letter, value)?;
        }
        Ok(())
    }
}

/// Result of decoding one line
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecodedLine {
    /// The command, or None for blank and comment-only lines
    pub command: Option<Command>,
    /// Problems found in the line's words
    pub diagnostics: Vec<Diagnostic>,
}

/// Line decoder for a single command family
#[derive(Debug, Clone)]
pub struct CommandDecoder {
    family_prefix: char,
}

impl Default for CommandDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_FAMILY_PREFIX)
    }
}

impl CommandDecoder {
    /// Create a decoder recognising codes that start with `family_prefix`
    pub fn new(family_prefix: char) -> Self {
        Self {
            family_prefix: family_prefix.to_ascii_uppercase(),
        }
    }

    pub fn family_prefix(&self) -> char {
        self.family_prefix
    }

    /// Decode one raw line
    pub fn decode(&self, line: &str, line_number: usize) -> DecodedLine {
        let upper = line.to_uppercase();
        let cleaned = strip_comment(upper.trim());
        // Host-streamed files end commands with a *<checksum>
        let body = cleaned.split('*').next().unwrap_or_default();
        let mut words = body.split_whitespace().peekable();

        // Host-streamed files prefix commands with N<line>
        if words.peek().is_some_and(|w| is_line_number_word(w)) {
            words.next();
        }

        let Some(code) = words.next() else {
            return DecodedLine::default();
        };

        let mut command = Command {
            line_number,
            code: code.to_string(),
            operation: Operation::from_code(code, self.family_prefix),
            words: BTreeMap::new(),
        };
        let mut diagnostics = Vec::new();

        for word in words {
            let mut chars = word.chars();
            let Some(letter) = chars.next() else {
                continue;
            };
            let value_text = chars.as_str();

            match parse_word_value(value_text) {
                Some(value) => {
                    command.words.insert(letter, value);
                }
                None => {
                    trace!("Line {}: malformed word {}", line_number, word);
                    command.words.remove(&letter);
                    diagnostics.push(Diagnostic::MalformedArgument {
                        line_number,
                        word: letter,
                        value: value_text.to_string(),
                    });
                }
            }
        }

        DecodedLine {
            command: Some(command),
            diagnostics,
        }
    }

    /// Decode every line of a text, skipping blank and comment-only lines
    pub fn decode_all<'a>(&'a self, text: &'a str) -> impl Iterator<Item = DecodedLine> + 'a {
        text.lines()
            .enumerate()
            .map(move |(idx, line)| self.decode(line, idx + 1))
            .filter(|decoded| decoded.command.is_some())
    }
}

fn strip_comment(line: &str) -> Cow<'_, str> {
    static COMMENT_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let regex = COMMENT_REGEX.get_or_init(|| Regex::new(r";.*").expect("invalid regex pattern"));
    regex.replace(line, "")
}

fn is_line_number_word(word: &str) -> bool {
    word.strip_prefix('N')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// A bare letter counts as 1; anything else must be a finite number.
fn parse_word_value(text: &str) -> Option<f64> {
    if text.is_empty() {
        return Some(BARE_WORD_VALUE);
    }
    text.parse::<f64>().ok().filter(|v| v.is_finite())
}

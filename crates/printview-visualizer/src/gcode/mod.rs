//! G-Code decoding and machine state
//!
//! This module provides:
//! - Line decoding into operation codes and word values
//! - Closed classification of the supported operations
//! - Positioning-mode, offset, and position tracking

pub mod command;
pub mod machine;

pub use command::*;
pub use machine::*;

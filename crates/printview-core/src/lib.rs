//! # PrintView Core
//!
//! Core types and utilities shared by the PrintView crates.
//! Provides axis and position types, numeric constants, and the
//! diagnostic taxonomy reported while interpreting a toolpath.

pub mod constants;
pub mod data;
pub mod error;

pub use data::{Axis, PartialPosition, Point3D, Position, TRACKED_AXES};

pub use error::{Diagnostic, Error, Result, Severity};

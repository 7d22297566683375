//! Machine state tracking
//!
//! Tracks the positioning mode, per-axis zero offsets, and the position the
//! controller believes the tool is at. The state is owned exclusively by one
//! toolpath build and threaded through every command application.

use printview_core::{Axis, PartialPosition, Position};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Distance mode (G90/G91)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PositioningMode {
    /// Word values are coordinates, shifted by the axis offset
    #[default]
    Absolute,
    /// Word values are deltas added to the current position
    Relative,
}

impl fmt::Display for PositioningMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute => write!(f, "Absolute positioning (G90)"),
            Self::Relative => write!(f, "Incremental positioning (G91)"),
        }
    }
}

/// Position change produced by one move
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveOutcome {
    /// Position before the move
    pub from: Position,
    /// Position after the move
    pub to: Position,
    /// Signed change of the extruder axis
    pub e_delta: f64,
}

impl MoveOutcome {
    /// True when material feed strictly increased
    pub fn is_depositing(&self) -> bool {
        self.e_delta > 0.0
    }
}

/// Interpreter state for the X, Y, Z and E axes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MachineState {
    mode: PositioningMode,
    offset: Position,
    position: Position,
}

impl MachineState {
    /// Create a state in absolute mode with zero offsets at the origin
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state starting at a known position
    pub fn at(position: Position) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> PositioningMode {
        self.mode
    }

    pub fn offset(&self) -> Position {
        self.offset
    }

    pub fn position(&self) -> Position {
        self.position
    }

    /// Apply a linear move
    ///
    /// In relative mode each named axis accumulates its word value. In absolute
    /// mode the axis becomes the word value plus that axis' offset. Axes the
    /// command does not name keep their value.
    pub fn apply_move(&mut self, args: &PartialPosition) -> MoveOutcome {
        let from = self.position;

        for (axis, value) in args.iter() {
            match self.mode {
                PositioningMode::Relative => self.position[axis] += value,
                PositioningMode::Absolute => self.position[axis] = value + self.offset[axis],
            }
        }

        MoveOutcome {
            from,
            to: self.position,
            e_delta: self.position.e - from.e,
        }
    }

    /// Switch between absolute and relative positioning
    pub fn set_mode(&mut self, mode: PositioningMode) {
        self.mode = mode;
    }

    /// Redefine the origin of the named axes without moving
    ///
    /// Afterwards an absolute move to `args[axis]` resolves to the current
    /// position of that axis.
    pub fn set_position(&mut self, args: &PartialPosition) {
        for (axis, value) in args.iter() {
            self.set_axis_position(axis, value);
        }
    }

    /// Redefine the origin of a single axis
    pub fn set_axis_position(&mut self, axis: Axis, value: f64) {
        self.offset[axis] = self.position[axis] - value;
    }

    /// Clear all offsets and return to absolute mode
    ///
    /// The tracked position is left untouched.
    pub fn home(&mut self) {
        self.offset = Position::default();
        self.mode = PositioningMode::Absolute;
    }
}

//! Data models for axes and positions
//!
//! This module provides:
//! - The four tracked axes of an extrusion machine (X, Y, Z, E)
//! - Full positions with one value per tracked axis
//! - Partial positions for commands that only name some axes
//! - 3D points used by the toolpath geometry

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// A machine axis tracked by the interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Axis {
    /// X-axis (horizontal)
    X,
    /// Y-axis (horizontal)
    Y,
    /// Z-axis (layer height)
    Z,
    /// Extruder axis (material feed)
    E,
}

/// All tracked axes in canonical order.
pub const TRACKED_AXES: [Axis; 4] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

impl Axis {
    /// The word letter for this axis.
    pub fn letter(self) -> char {
        match self {
            Self::X => 'X',
            Self::Y => 'Y',
            Self::Z => 'Z',
            Self::E => 'E',
        }
    }

    /// Whether this axis moves the nozzle in space (as opposed to feeding material).
    pub fn is_spatial(self) -> bool {
        !matches!(self, Self::E)
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Position with one value per tracked axis
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// X-axis position
    pub x: f64,
    /// Y-axis position
    pub y: f64,
    /// Z-axis position
    pub z: f64,
    /// Extruder position
    pub e: f64,
}

impl Position {
    /// Create a new position
    pub fn new(x: f64, y: f64, z: f64, e: f64) -> Self {
        Self { x, y, z, e }
    }

    /// The spatial part of this position
    pub fn point(&self) -> Point3D {
        Point3D::new(self.x, self.y, self.z)
    }
}

impl Index<Axis> for Position {
    type Output = f64;

    fn index(&self, axis: Axis) -> &f64 {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::E => &self.e,
        }
    }
}

impl IndexMut<Axis> for Position {
    fn index_mut(&mut self, axis: Axis) -> &mut f64 {
        match axis {
            Axis::X => &mut self.x,
            Axis::Y => &mut self.y,
            Axis::Z => &mut self.z,
            Axis::E => &mut self.e,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "X:{:.3} Y:{:.3} Z:{:.3} E:{:.3}",
            self.x, self.y, self.z, self.e
        )
    }
}

/// Partial position for commands that name only some axes
///
/// An absent axis means "not specified", which is different from zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PartialPosition {
    /// X-axis value (if Some, the command names this axis)
    pub x: Option<f64>,
    /// Y-axis value (if Some, the command names this axis)
    pub y: Option<f64>,
    /// Z-axis value (if Some, the command names this axis)
    pub z: Option<f64>,
    /// Extruder value (if Some, the command names this axis)
    pub e: Option<f64>,
}

impl PartialPosition {
    /// Create a new empty partial position (all axes None)
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the value for one axis
    pub fn get(&self, axis: Axis) -> Option<f64> {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
            Axis::Z => self.z,
            Axis::E => self.e,
        }
    }

    /// Set the value for one axis
    pub fn set(&mut self, axis: Axis, value: Option<f64>) {
        match axis {
            Axis::X => self.x = value,
            Axis::Y => self.y = value,
            Axis::Z => self.z = value,
            Axis::E => self.e = value,
        }
    }

    /// Builder-style setter
    pub fn with(mut self, axis: Axis, value: f64) -> Self {
        self.set(axis, Some(value));
        self
    }

    /// True when no axis is specified
    pub fn is_empty(&self) -> bool {
        TRACKED_AXES.iter().all(|axis| self.get(*axis).is_none())
    }

    /// True when any of X, Y or Z is specified
    pub fn has_spatial(&self) -> bool {
        self.x.is_some() || self.y.is_some() || self.z.is_some()
    }

    /// Iterate over the specified axes and their values
    pub fn iter(&self) -> impl Iterator<Item = (Axis, f64)> + '_ {
        TRACKED_AXES
            .iter()
            .filter_map(move |axis| self.get(*axis).map(|v| (*axis, v)))
    }

    /// Apply this partial position to an existing position, updating only specified axes
    pub fn apply_to(&self, pos: &Position) -> Position {
        Position {
            x: self.x.unwrap_or(pos.x),
            y: self.y.unwrap_or(pos.y),
            z: self.z.unwrap_or(pos.z),
            e: self.e.unwrap_or(pos.e),
        }
    }
}

/// 3D point in model space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point3D {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn distance_to(&self, other: &Point3D) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2) + (other.z - self.z).powi(2))
            .sqrt()
    }
}

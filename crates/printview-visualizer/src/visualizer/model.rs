//! Layered toolpath model
//!
//! A [`Model`] owns its [`Layer`]s in a flat vector. Each layer owns a flat
//! vector of atomic [`Segment`]s and a vector of [`Move`]s that index into it,
//! so dropping a model releases everything at once.

use super::bounds::Bounds;
use printview_core::constants::DEFAULT_PATH_WIDTH;
use printview_core::Point3D;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// Classification of a motion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    /// Repositioning without net positive material feed
    Travel,
    /// Material is laid down
    Deposit,
}

impl MoveKind {
    pub fn from_depositing(depositing: bool) -> Self {
        if depositing {
            Self::Deposit
        } else {
            Self::Travel
        }
    }

    pub fn is_deposit(self) -> bool {
        matches!(self, Self::Deposit)
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Travel => write!(f, "travel"),
            Self::Deposit => write!(f, "deposit"),
        }
    }
}

/// Straight motion produced by one interpreted move command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Point3D,
    pub end: Point3D,
    /// True if extrusion strictly increased during this motion
    pub depositing: bool,
}

impl Segment {
    pub fn new(start: Point3D, end: Point3D, depositing: bool) -> Self {
        Self {
            start,
            end,
            depositing,
        }
    }

    pub fn kind(&self) -> MoveKind {
        MoveKind::from_depositing(self.depositing)
    }

    pub fn length(&self) -> f64 {
        self.start.distance_to(&self.end)
    }
}

/// Run of consecutive same-kind segments within a layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub kind: MoveKind,
    /// Index of the first segment in the owning layer
    pub first_segment: usize,
    /// Number of segments in this move
    pub segment_count: usize,
}

impl Move {
    /// Segment indices covered by this move
    pub fn segment_range(&self) -> Range<usize> {
        self.first_segment..self.first_segment + self.segment_count
    }
}

/// One contiguous run of activity at a single Z height
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    z: f64,
    segments: Vec<Segment>,
    moves: Vec<Move>,
}

impl Layer {
    pub fn new(z: f64) -> Self {
        Self {
            z,
            segments: Vec::new(),
            moves: Vec::new(),
        }
    }

    pub fn z(&self) -> f64 {
        self.z
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Segments belonging to one move
    pub fn move_segments(&self, move_index: usize) -> &[Segment] {
        self.moves
            .get(move_index)
            .map(|mv| &self.segments[mv.segment_range()])
            .unwrap_or(&[])
    }

    /// Number of progress points in this layer (one per segment)
    pub fn point_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a segment, extending the last move when the kind matches
    pub fn push_segment(&mut self, segment: Segment) {
        let kind = segment.kind();
        let index = self.segments.len();
        self.segments.push(segment);

        match self.moves.last_mut() {
            Some(last) if last.kind == kind => last.segment_count += 1,
            _ => self.moves.push(Move {
                kind,
                first_segment: index,
                segment_count: 1,
            }),
        }
    }

    /// Total length of depositing segments
    pub fn deposit_length(&self) -> f64 {
        self.segments
            .iter()
            .filter(|s| s.depositing)
            .map(Segment::length)
            .sum()
    }
}

/// Root of a built toolpath
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    layers: Vec<Layer>,
    /// Nominal line width, a rendering hint only
    path_width: f64,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(0.0, DEFAULT_PATH_WIDTH)
    }
}

impl Model {
    /// Create a model whose first (empty) layer sits at `initial_z`
    pub fn new(initial_z: f64, path_width: f64) -> Self {
        Self {
            layers: vec![Layer::new(initial_z)],
            path_width,
        }
    }

    /// Assemble a model from prebuilt layers; an empty list gets one layer at Z 0
    pub fn from_layers(mut layers: Vec<Layer>, path_width: f64) -> Self {
        if layers.is_empty() {
            layers.push(Layer::new(0.0));
        }
        Self { layers, path_width }
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn path_width(&self) -> f64 {
        self.path_width
    }

    pub fn segment_count(&self) -> usize {
        self.layers.iter().map(Layer::point_count).sum()
    }

    pub fn move_count(&self) -> usize {
        self.layers.iter().map(|l| l.moves().len()).sum()
    }

    /// True when no segment was produced
    pub fn is_empty(&self) -> bool {
        self.layers.iter().all(Layer::is_empty)
    }

    /// The most recently opened layer
    pub fn current_layer(&self) -> Option<&Layer> {
        self.layers.last()
    }

    /// Open a new layer at `z` and make it current
    pub(crate) fn push_layer(&mut self, z: f64) {
        self.layers.push(Layer::new(z));
    }

    pub(crate) fn current_layer_mut(&mut self) -> &mut Layer {
        if self.layers.is_empty() {
            self.layers.push(Layer::new(0.0));
        }
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }

    /// Lowest and highest layer height
    pub fn z_range(&self) -> (f64, f64) {
        self.layers
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), layer| {
                (lo.min(layer.z), hi.max(layer.z))
            })
    }

    /// Bounding box of every segment endpoint
    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds::new();
        for segment in self.layers.iter().flat_map(|l| l.segments()) {
            bounds.update(&segment.start);
            bounds.update(&segment.end);
        }
        bounds
    }
}

//! Batched polylines for drawing
//!
//! Polylines are a view product: consecutive same-kind segments of one layer
//! collapse into a single vertex strip. They are derived from segments only,
//! so they can be rebuilt from a [`Model`] at any time.

use super::model::{Layer, Model, MoveKind};
use printview_core::Point3D;
use serde::{Deserialize, Serialize};

/// Vertex strip for one run of same-kind segments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    /// Index of the owning layer
    pub layer: usize,
    /// Ordinal of this polyline within its layer
    pub index: usize,
    pub kind: MoveKind,
    /// Layer-relative index of the first segment drawn by this polyline
    pub first_point: usize,
    /// Start vertex followed by one end vertex per segment
    pub vertices: Vec<Point3D>,
}

impl Polyline {
    /// Number of segments drawn by this polyline
    pub fn segment_count(&self) -> usize {
        self.vertices.len().saturating_sub(1)
    }

    /// Layer-relative segment index one past the last one drawn
    pub fn end_point(&self) -> usize {
        self.first_point + self.segment_count()
    }
}

/// Batch the segments of one layer
pub fn batch_layer(layer_index: usize, layer: &Layer) -> Vec<Polyline> {
    let mut polylines: Vec<Polyline> = Vec::new();

    for (point, segment) in layer.segments().iter().enumerate() {
        let kind = segment.kind();
        match polylines.last_mut() {
            Some(current) if current.kind == kind => current.vertices.push(segment.end),
            _ => {
                let index = polylines.len();
                polylines.push(Polyline {
                    layer: layer_index,
                    index,
                    kind,
                    first_point: point,
                    vertices: vec![segment.start, segment.end],
                });
            }
        }
    }

    polylines
}

/// Batch every layer of a model, in layer order
pub fn batch_model(model: &Model) -> Vec<Polyline> {
    model
        .layers()
        .iter()
        .enumerate()
        .flat_map(|(idx, layer)| batch_layer(idx, layer))
        .collect()
}

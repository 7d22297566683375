use super::builder::{BuildOutput, BuildStats};
use super::histogram::StepInference;
use super::model::Model;
use super::polyline::{batch_model, Polyline};
use printview_core::{Diagnostic, Position};
use tracing::debug;

/// Build products kept for one input text, keyed by its content hash
#[derive(Debug, Default, Clone)]
pub struct ToolpathCache {
    content_hash: u64,
    loaded: bool,
    model: Model,
    polylines: Vec<Polyline>,
    diagnostics: Vec<Diagnostic>,
    stats: BuildStats,
    final_position: Position,
    layer_step: f64,
}

impl ToolpathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn needs_update(&self, new_hash: u64) -> bool {
        !self.loaded || self.content_hash != new_hash
    }

    /// Replace the cached build and derive the view products from it
    pub fn update(&mut self, new_hash: u64, output: BuildOutput, inference: &StepInference) {
        self.content_hash = new_hash;
        self.loaded = true;
        self.model = output.model;
        self.diagnostics = output.diagnostics;
        self.stats = output.stats;
        self.final_position = output.final_position;
        self.rebuild(inference);
    }

    /// Recompute polylines and the layer step without rebuilding the model
    pub fn rebuild(&mut self, inference: &StepInference) {
        self.polylines = batch_model(&self.model);
        self.layer_step = inference.infer(self.model.layers());
        debug!(
            "Rebuilt {} polylines over {} layers, step {}",
            self.polylines.len(),
            self.model.layer_count(),
            self.layer_step
        );
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn polylines(&self) -> &[Polyline] {
        &self.polylines
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn final_position(&self) -> Position {
        self.final_position
    }

    pub fn layer_step(&self) -> f64 {
        self.layer_step
    }
}

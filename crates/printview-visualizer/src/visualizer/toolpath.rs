//! Loaded toolpath facade
//!
//! [`Toolpath`] ties the builder, the view products, and the window engine
//! together. Loading the same text twice is a no-op.

use super::bounds::Bounds;
use super::builder::{BuildStats, BuilderOptions, ToolpathBuilder};
use super::histogram::StepInference;
use super::model::Model;
use super::polyline::Polyline;
use super::toolpath_cache::ToolpathCache;
use super::window::{CursorMode, ViewCursor, VisibilityFrame, WindowEngine};
use printview_core::constants::DEFAULT_CURRENT_LAYER_SLACK;
use printview_core::{Diagnostic, Position, Result};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use tracing::debug;

/// A built toolpath plus everything derived from it
#[derive(Debug, Clone)]
pub struct Toolpath {
    options: BuilderOptions,
    inference: StepInference,
    cursor_mode: CursorMode,
    current_layer_slack: f64,
    cache: ToolpathCache,
}

impl Default for Toolpath {
    fn default() -> Self {
        Self::new(BuilderOptions::default(), StepInference::default())
    }
}

impl Toolpath {
    pub fn new(options: BuilderOptions, inference: StepInference) -> Self {
        Self {
            options,
            inference,
            cursor_mode: CursorMode::default(),
            current_layer_slack: DEFAULT_CURRENT_LAYER_SLACK,
            cache: ToolpathCache::new(),
        }
    }

    /// Set how the window engine addresses layers
    pub fn with_window(mut self, mode: CursorMode, current_layer_slack: f64) -> Self {
        self.cursor_mode = mode;
        self.current_layer_slack = current_layer_slack;
        self
    }

    /// Build a toolpath from text in one call
    pub fn from_text(text: &str, options: BuilderOptions) -> Self {
        let mut toolpath = Self::new(options, StepInference::default());
        toolpath.load(text);
        toolpath
    }

    /// Load program text, rebuilding only when the content changed
    ///
    /// Returns true if a rebuild happened.
    pub fn load(&mut self, text: &str) -> bool {
        debug!("Loading toolpath, input size: {} bytes", text.len());

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let new_hash = hasher.finish();

        if !self.cache.needs_update(new_hash) {
            debug!("Toolpath hash unchanged, skipping build");
            return false;
        }

        debug!("Building toolpath (hash: {})", new_hash);
        let output = ToolpathBuilder::build(text, self.options);
        self.cache.update(new_hash, output, &self.inference);
        debug!(
            "Toolpath loaded: {} layers, {} segments, {} diagnostics",
            self.model().layer_count(),
            self.model().segment_count(),
            self.diagnostics().len()
        );
        true
    }

    /// Read a program file and load it
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected.
    pub fn load_file(&mut self, path: &Path) -> Result<bool> {
        let bytes = std::fs::read(path)?;
        debug!("Read {} bytes from {}", bytes.len(), path.display());
        Ok(self.load(&String::from_utf8_lossy(&bytes)))
    }

    /// Change the step inference parameters and recompute the step
    pub fn set_inference(&mut self, inference: StepInference) {
        self.inference = inference;
        if self.cache.is_loaded() {
            self.cache.rebuild(&self.inference);
        }
    }

    pub fn options(&self) -> &BuilderOptions {
        &self.options
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.is_loaded()
    }

    pub fn model(&self) -> &Model {
        self.cache.model()
    }

    pub fn polylines(&self) -> &[Polyline] {
        self.cache.polylines()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.cache.diagnostics()
    }

    pub fn stats(&self) -> &BuildStats {
        self.cache.stats()
    }

    pub fn final_position(&self) -> Position {
        self.cache.final_position()
    }

    /// Inferred nominal layer height
    pub fn layer_step(&self) -> f64 {
        self.cache.layer_step()
    }

    pub fn bounds(&self) -> Bounds {
        self.model().bounds()
    }

    pub fn z_range(&self) -> (f64, f64) {
        self.model().z_range()
    }

    /// Window engine using the inferred layer step
    pub fn window_engine(&self) -> WindowEngine {
        WindowEngine::new(self.cursor_mode, self.layer_step(), self.current_layer_slack)
    }

    /// Cursor covering every layer with everything revealed
    pub fn full_cursor(&self) -> ViewCursor {
        self.window_engine().full_cursor(self.model())
    }

    /// Evaluate a cursor, syncing its progress range first
    pub fn visibility(&self, cursor: &mut ViewCursor) -> VisibilityFrame {
        self.window_engine().update(self.model(), cursor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printview_core::Error;
    use std::io::Write;

    const PROGRAM: &str = "G28\nG1 Z0.3 F1200\nG1 X10 E1\nG1 Y10 E2\nG1 Z0.5\nG1 X0 E3\nG1 Z0.7\nG1 Y0 E4\n";

    #[test]
    fn test_load_skips_unchanged_text() {
        let mut toolpath = Toolpath::default();
        assert!(!toolpath.is_loaded());
        assert!(toolpath.load(PROGRAM));
        assert!(!toolpath.load(PROGRAM));
        assert!(toolpath.load("G1 X1"));
        assert_eq!(toolpath.model().segment_count(), 1);
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PROGRAM.as_bytes()).unwrap();
        file.write_all(b"G1 X5 ; \xff\n").unwrap();

        let mut toolpath = Toolpath::default();
        assert!(toolpath.load_file(file.path()).unwrap());
        assert!(!toolpath.load_file(file.path()).unwrap());
        assert_eq!(toolpath.final_position().x, 5.0);

        let dir = tempfile::tempdir().unwrap();
        let err = toolpath.load_file(&dir.path().join("missing.gcode")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert!(toolpath.is_loaded());
    }

    #[test]
    fn test_layer_step_and_ranges() {
        let toolpath = Toolpath::from_text(PROGRAM, BuilderOptions::default());
        assert_eq!(toolpath.model().layer_count(), 4);
        assert!((toolpath.layer_step() - 0.2).abs() < 1e-9);
        assert_eq!(toolpath.z_range(), (0.0, 0.7));
        let bounds = toolpath.bounds();
        assert_eq!(bounds.max_x, 10.0);
        assert_eq!(bounds.max_y, 10.0);
        assert!(toolpath.diagnostics().is_empty());
        assert_eq!(toolpath.final_position().y, 0.0);
    }

    #[test]
    fn test_visibility_through_facade() {
        let toolpath = Toolpath::from_text(PROGRAM, BuilderOptions::default());
        let mut cursor = toolpath.full_cursor();
        cursor.set_max_layer(0.5);
        let frame = toolpath.visibility(&mut cursor);
        assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![2]);
        assert!(!frame.is_layer_visible(3));
        assert_eq!(cursor.progress_max(), 2);
    }

    #[test]
    fn test_fine_layer_heights_have_a_current_layer() {
        let mut text = String::new();
        for layer in 1..=10 {
            let z = layer as f64 * 0.05;
            text.push_str(&format!("G1 Z{:.2}\nG1 X{layer} Y{layer} E{layer}\n", z));
        }
        let toolpath = Toolpath::from_text(&text, BuilderOptions::default());
        assert!((toolpath.layer_step() - 0.05).abs() < 1e-9);

        let mut cursor = toolpath.full_cursor();
        let frame = toolpath.visibility(&mut cursor);
        assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![10]);
        assert!(cursor.progress_max() > 0);
        assert_eq!(frame.drawn_segment_count(), toolpath.model().segment_count());
    }

    #[test]
    fn test_layer_index_mode() {
        let toolpath = Toolpath::from_text(PROGRAM, BuilderOptions::default())
            .with_window(CursorMode::LayerIndex, 0.05);
        let engine = toolpath.window_engine();
        assert_eq!(engine.mode(), CursorMode::LayerIndex);
        assert_eq!(engine.cursor_range(toolpath.model()), (0.0, 3.0));
    }

    #[test]
    fn test_set_inference_recomputes_step() {
        let mut toolpath = Toolpath::from_text("G1 X1 E1", BuilderOptions::default());
        assert_eq!(toolpath.layer_step(), 0.2);
        toolpath.set_inference(StepInference {
            precision_digits: 2,
            fallback_step: 0.1,
        });
        assert_eq!(toolpath.layer_step(), 0.1);
    }
}

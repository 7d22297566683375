//! Visibility window for layer-by-layer playback
//!
//! Given a [`Model`] and a [`ViewCursor`] (lower bound, upper bound, progress)
//! the [`WindowEngine`] decides which moves are drawn, which material class
//! they use, and how much of a partially revealed move is drawn.
//!
//! Bounds are either layer indices or layer heights, see [`CursorMode`].
//! Layers whose key lies outside `[min, max]` are hidden. Layers whose key is
//! close enough to `max` are "current": they are highlighted and revealed only
//! up to the progress cursor, counted in segments.

use super::model::{Model, MoveKind};
use printview_core::constants::{
    DEFAULT_CURRENT_LAYER_SLACK, DEFAULT_LAYER_STEP, HEIGHT_TOLERANCE,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How cursor bounds address layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CursorMode {
    /// Bounds are layer indices in build order
    LayerIndex,
    /// Bounds are Z heights
    #[default]
    Height,
}

/// Lower/upper layer bound pair that never crosses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerWindow {
    min: f64,
    max: f64,
}

impl LayerWindow {
    /// Create a window; an inverted pair collapses onto `min`
    pub fn new(min: f64, max: f64) -> Self {
        Self {
            min,
            max: max.max(min),
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Move the lower bound; the upper bound follows if crossed
    pub fn set_min(&mut self, value: f64) {
        self.min = value;
        if self.max < value {
            self.max = value;
        }
    }

    /// Move the upper bound; the lower bound follows if crossed
    pub fn set_max(&mut self, value: f64) {
        self.max = value;
        if self.min > value {
            self.min = value;
        }
    }

    pub fn contains(&self, key: f64) -> bool {
        key >= self.min && key <= self.max
    }

    /// Like [`contains`](Self::contains), widened by `tolerance` on both ends
    pub fn contains_within(&self, key: f64, tolerance: f64) -> bool {
        key >= self.min - tolerance && key <= self.max + tolerance
    }
}

/// Cursor state owned by the caller and passed to the engine on every change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewCursor {
    window: LayerWindow,
    progress: f64,
    progress_max: usize,
}

impl ViewCursor {
    /// Create a cursor; progress starts fully revealed on the first sync
    pub fn new(window: LayerWindow) -> Self {
        Self {
            window,
            progress: 0.0,
            progress_max: 0,
        }
    }

    pub fn window(&self) -> LayerWindow {
        self.window
    }

    pub fn set_min_layer(&mut self, value: f64) {
        self.window.set_min(value);
    }

    pub fn set_max_layer(&mut self, value: f64) {
        self.window.set_max(value);
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn progress_max(&self) -> usize {
        self.progress_max
    }

    /// Set progress, clamped to `[0, progress_max]`
    pub fn set_progress(&mut self, value: f64) {
        self.progress = if value.is_nan() {
            0.0
        } else {
            value.clamp(0.0, self.progress_max as f64)
        };
    }

    /// Progress as a fraction of the revealable points
    pub fn progress_fraction(&self) -> f64 {
        if self.progress_max == 0 {
            1.0
        } else {
            self.progress / self.progress_max as f64
        }
    }

    /// Change the revealable point count, keeping the progress fraction
    ///
    /// Coming from an empty range the new range is revealed completely.
    pub fn rescale_progress(&mut self, new_max: usize) {
        if new_max == self.progress_max {
            return;
        }
        let fraction = self.progress_fraction();
        self.progress = fraction * new_max as f64;
        self.progress_max = new_max;
    }

    /// Number of whole segments revealed in the current layers
    pub fn revealed_points(&self) -> usize {
        self.progress.floor().max(0.0) as usize
    }
}

/// Material class for drawing a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Material {
    pub kind: MoveKind,
    /// Whether the move is in a current layer
    pub current: bool,
}

/// Per-layer decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerVisibility {
    pub layer: usize,
    /// Inside `[min, max]`
    pub visible: bool,
    pub current: bool,
}

/// Per-move decision
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoveVisibility {
    pub layer: usize,
    pub move_index: usize,
    pub visible: bool,
    pub material: Material,
    /// Segments to draw from the start of the move
    pub drawn_segments: usize,
    /// Segments the move has in total
    pub segment_count: usize,
}

impl MoveVisibility {
    /// True when the move is drawn but cut short by the progress cursor
    pub fn is_partial(&self) -> bool {
        self.visible && self.drawn_segments < self.segment_count
    }

    /// Vertex count for a strip renderer (start vertex plus one per segment)
    pub fn draw_range(&self) -> usize {
        if self.visible {
            self.drawn_segments + 1
        } else {
            0
        }
    }
}

/// Result of evaluating a cursor against a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityFrame {
    pub layers: Vec<LayerVisibility>,
    pub moves: Vec<MoveVisibility>,
    /// Points revealable by the progress cursor for this window
    pub progress_max: usize,
}

impl VisibilityFrame {
    pub fn visible_moves(&self) -> impl Iterator<Item = &MoveVisibility> {
        self.moves.iter().filter(|m| m.visible)
    }

    pub fn current_layers(&self) -> impl Iterator<Item = usize> + '_ {
        self.layers.iter().filter(|l| l.current).map(|l| l.layer)
    }

    pub fn is_layer_visible(&self, layer: usize) -> bool {
        self.layers.get(layer).is_some_and(|l| l.visible)
    }

    pub fn move_visibility(&self, layer: usize, move_index: usize) -> Option<&MoveVisibility> {
        self.moves
            .iter()
            .find(|m| m.layer == layer && m.move_index == move_index)
    }

    /// Whether one segment of a layer is drawn
    pub fn is_segment_visible(&self, model: &Model, layer: usize, segment: usize) -> bool {
        let Some(model_layer) = model.layer(layer) else {
            return false;
        };
        model_layer
            .moves()
            .iter()
            .position(|mv| mv.segment_range().contains(&segment))
            .and_then(|move_index| {
                let first = model_layer.moves()[move_index].first_segment;
                self.move_visibility(layer, move_index)
                    .map(|vis| vis.visible && segment - first < vis.drawn_segments)
            })
            .unwrap_or(false)
    }

    /// Total segments drawn
    pub fn drawn_segment_count(&self) -> usize {
        self.visible_moves().map(|m| m.drawn_segments).sum()
    }
}

/// Visibility decisions for a model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowEngine {
    mode: CursorMode,
    /// Nominal layer step (height mode)
    step: f64,
    /// Subtracted from the step to form the current-layer band
    slack: f64,
}

impl Default for WindowEngine {
    fn default() -> Self {
        Self::new(CursorMode::default(), DEFAULT_LAYER_STEP, DEFAULT_CURRENT_LAYER_SLACK)
    }
}

impl WindowEngine {
    pub fn new(mode: CursorMode, step: f64, slack: f64) -> Self {
        Self { mode, step, slack }
    }

    pub fn mode(&self) -> CursorMode {
        self.mode
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Range the caller should offer for the bounds
    pub fn cursor_range(&self, model: &Model) -> (f64, f64) {
        match self.mode {
            CursorMode::LayerIndex => (0.0, model.layer_count().saturating_sub(1) as f64),
            CursorMode::Height => model.z_range(),
        }
    }

    /// Slider granularity for the bounds
    pub fn cursor_granularity(&self) -> f64 {
        match self.mode {
            CursorMode::LayerIndex => 1.0,
            CursorMode::Height => self.step,
        }
    }

    /// A cursor spanning the whole model
    pub fn full_cursor(&self, model: &Model) -> ViewCursor {
        let (min, max) = self.cursor_range(model);
        let mut cursor = ViewCursor::new(LayerWindow::new(min, max));
        self.sync(model, &mut cursor);
        cursor
    }

    fn layer_key(&self, index: usize, z: f64) -> f64 {
        match self.mode {
            CursorMode::LayerIndex => index as f64,
            CursorMode::Height => z,
        }
    }

    /// Accumulated relative moves leave float noise on heights
    fn tolerance(&self) -> f64 {
        match self.mode {
            CursorMode::LayerIndex => 0.0,
            CursorMode::Height => HEIGHT_TOLERANCE,
        }
    }

    fn in_window(&self, key: f64, window: &LayerWindow) -> bool {
        window.contains_within(key, self.tolerance())
    }

    /// Half-width of the current-layer band around `max`
    ///
    /// The slack narrows the band, but never below half a step.
    fn current_band(&self) -> f64 {
        match self.mode {
            CursorMode::LayerIndex => 0.5,
            CursorMode::Height => (self.step - self.slack).max(self.step / 2.0),
        }
    }

    fn is_current(&self, key: f64, window: &LayerWindow) -> bool {
        self.in_window(key, window) && (key - window.max()).abs() < self.current_band()
    }

    /// Indices of the current layers for a window, in build order
    pub fn current_layers(&self, model: &Model, window: &LayerWindow) -> Vec<usize> {
        model
            .layers()
            .iter()
            .enumerate()
            .filter(|(idx, layer)| self.is_current(self.layer_key(*idx, layer.z()), window))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Points the progress cursor ranges over for a window
    pub fn revealable_points(&self, model: &Model, window: &LayerWindow) -> usize {
        self.current_layers(model, window)
            .into_iter()
            .filter_map(|idx| model.layer(idx))
            .map(|layer| layer.point_count())
            .sum()
    }

    /// Bring the cursor's progress range in line with its window
    pub fn sync(&self, model: &Model, cursor: &mut ViewCursor) {
        let points = self.revealable_points(model, &cursor.window);
        if points != cursor.progress_max {
            trace!(
                "Rescaling progress {:.2}/{} to {} points",
                cursor.progress,
                cursor.progress_max,
                points
            );
            cursor.rescale_progress(points);
        }
    }

    /// Sync the cursor, then evaluate it
    pub fn update(&self, model: &Model, cursor: &mut ViewCursor) -> VisibilityFrame {
        self.sync(model, cursor);
        self.evaluate(model, cursor)
    }

    /// Decide visibility for every move of the model
    ///
    /// Current layers are revealed in build order as one sequence, so progress
    /// `p` draws the first `p` segments across them.
    pub fn evaluate(&self, model: &Model, cursor: &ViewCursor) -> VisibilityFrame {
        let window = cursor.window;
        let revealed = cursor.revealed_points();
        let mut consumed = 0usize;
        let mut layers = Vec::with_capacity(model.layer_count());
        let mut moves = Vec::with_capacity(model.move_count());
        let mut progress_max = 0usize;

        for (layer_idx, layer) in model.layers().iter().enumerate() {
            let key = self.layer_key(layer_idx, layer.z());
            let visible = self.in_window(key, &window);
            let current = self.is_current(key, &window);
            layers.push(LayerVisibility {
                layer: layer_idx,
                visible,
                current,
            });

            let budget = revealed.saturating_sub(consumed);
            for (move_index, mv) in layer.moves().iter().enumerate() {
                let drawn_segments = if !visible {
                    0
                } else if current {
                    budget
                        .saturating_sub(mv.first_segment)
                        .min(mv.segment_count)
                } else {
                    mv.segment_count
                };

                moves.push(MoveVisibility {
                    layer: layer_idx,
                    move_index,
                    visible: drawn_segments > 0,
                    material: Material {
                        kind: mv.kind,
                        current,
                    },
                    drawn_segments,
                    segment_count: mv.segment_count,
                });
            }

            if current {
                consumed += layer.point_count();
                progress_max += layer.point_count();
            }
        }

        VisibilityFrame {
            layers,
            moves,
            progress_max,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizer::builder::{BuilderOptions, ToolpathBuilder};

    /// Five layers at Z 0.2..1.0, each: travel, three deposits, travel
    fn five_layer_model() -> Model {
        let mut text = String::new();
        let mut e = 0.0;
        for layer in 1..=5 {
            text.push_str(&format!("G1 Z{:.1} X0 Y0\n", layer as f64 * 0.2));
            for x in 1..=3 {
                e += 1.0;
                text.push_str(&format!("G1 X{} E{}\n", x, e));
            }
            text.push_str("G1 X0 Y5\n");
        }
        let out = ToolpathBuilder::build(&text, BuilderOptions::default());
        // the empty anchor layer at Z 0 plus five printed layers
        Model::from_layers(out.model.layers()[1..].to_vec(), out.model.path_width())
    }

    #[test]
    fn test_window_bounds_snap() {
        let mut window = LayerWindow::new(1.0, 3.0);
        window.set_max(0.5);
        assert_eq!((window.min(), window.max()), (0.5, 0.5));
        window.set_min(2.0);
        assert_eq!((window.min(), window.max()), (2.0, 2.0));
        assert_eq!(LayerWindow::new(4.0, 1.0).max(), 4.0);
    }

    #[test]
    fn test_progress_clamped() {
        let mut cursor = ViewCursor::new(LayerWindow::new(0.0, 0.0));
        cursor.rescale_progress(10);
        assert_eq!(cursor.progress(), 10.0);
        cursor.set_progress(25.0);
        assert_eq!(cursor.progress(), 10.0);
        cursor.set_progress(-3.0);
        assert_eq!(cursor.progress(), 0.0);
        cursor.set_progress(f64::NAN);
        assert_eq!(cursor.progress(), 0.0);
    }

    #[test]
    fn test_rescale_keeps_fraction() {
        let mut cursor = ViewCursor::new(LayerWindow::new(0.0, 0.0));
        cursor.rescale_progress(10);
        cursor.set_progress(4.0);
        cursor.rescale_progress(5);
        assert_eq!(cursor.progress(), 2.0);
        assert_eq!(cursor.progress_max(), 5);
        cursor.rescale_progress(0);
        assert_eq!(cursor.progress(), 0.0);
        cursor.rescale_progress(8);
        assert_eq!(cursor.progress(), 8.0);
    }

    #[test]
    fn test_layer_index_window() {
        let model = five_layer_model();
        assert_eq!(model.layer_count(), 5);
        let engine = WindowEngine::new(CursorMode::LayerIndex, 0.2, 0.05);
        let mut cursor = ViewCursor::new(LayerWindow::new(1.0, 3.0));
        let frame = engine.update(&model, &mut cursor);

        assert!(!frame.is_layer_visible(0));
        assert!(frame.is_layer_visible(1));
        assert!(frame.is_layer_visible(3));
        assert!(!frame.is_layer_visible(4));
        assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![3]);
        assert_eq!(frame.progress_max, 5);
        assert!(frame.visible_moves().all(|m| (1..=3).contains(&m.layer)));
    }

    #[test]
    fn test_height_window_uses_step_band() {
        let model = five_layer_model();
        let engine = WindowEngine::new(CursorMode::Height, 0.2, 0.05);
        let mut cursor = ViewCursor::new(LayerWindow::new(0.4, 0.8));
        let frame = engine.update(&model, &mut cursor);
        assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![3]);
        assert!(!frame.is_layer_visible(0));
        assert!(!frame.is_layer_visible(4));
    }

    #[test]
    fn test_partial_reveal_of_current_layer() {
        let model = five_layer_model();
        let engine = WindowEngine::new(CursorMode::LayerIndex, 0.2, 0.05);
        let mut cursor = ViewCursor::new(LayerWindow::new(0.0, 2.0));
        engine.sync(&model, &mut cursor);
        cursor.set_progress(3.0);
        let frame = engine.evaluate(&model, &cursor);

        // layer 2 moves: travel(1) deposit(3) travel(1)
        let travel_in = frame.move_visibility(2, 0).unwrap();
        assert!(travel_in.visible && !travel_in.is_partial());
        assert!(travel_in.material.current);
        let deposit = frame.move_visibility(2, 1).unwrap();
        assert!(deposit.is_partial());
        assert_eq!(deposit.drawn_segments, 2);
        assert_eq!(deposit.draw_range(), 3);
        let travel_out = frame.move_visibility(2, 2).unwrap();
        assert!(!travel_out.visible);
        assert_eq!(travel_out.draw_range(), 0);

        // non-current layers are drawn fully with the plain material
        let lower = frame.move_visibility(1, 1).unwrap();
        assert!(lower.visible && !lower.is_partial());
        assert!(!lower.material.current);
        assert_eq!(lower.material.kind, MoveKind::Deposit);

        assert!(frame.is_segment_visible(&model, 2, 2));
        assert!(!frame.is_segment_visible(&model, 2, 3));
        assert!(!frame.is_segment_visible(&model, 9, 0));
    }

    #[test]
    fn test_lowering_max_rescales_progress() {
        let mut text = String::new();
        for layer in 0..3 {
            text.push_str(&format!("G1 Z{}\n", layer + 1));
            for i in 0..(4 * (layer + 1)) {
                text.push_str(&format!("G1 X{} E{}\n", i, 100 * layer + i + 1));
            }
        }
        let model = ToolpathBuilder::build(&text, BuilderOptions::default()).model;
        // anchor layer 0 is empty; layers 1..=3 have 5, 9, 13 points
        let engine = WindowEngine::new(CursorMode::LayerIndex, 1.0, 0.05);
        let mut cursor = ViewCursor::new(LayerWindow::new(0.0, 3.0));
        engine.sync(&model, &mut cursor);
        assert_eq!(cursor.progress_max(), 13);
        cursor.set_progress(6.5);

        cursor.set_max_layer(2.0);
        let frame = engine.update(&model, &mut cursor);
        assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![2]);
        assert_eq!(cursor.progress_max(), 9);
        assert!((cursor.progress() - 4.5).abs() < 1e-9);
        assert_eq!(frame.progress_max, 9);
    }

    #[test]
    fn test_multiple_current_layers_share_progress() {
        // Z returns to 1 after a hop, making two separate layers at Z 1
        let text = "G1 Z1\nG1 X1 E1\nG1 X2 E2\nG1 Z2\nG1 Z1\nG1 X3 E3\nG1 X4 E4\n";
        let model = ToolpathBuilder::build(text, BuilderOptions::default()).model;
        let zs: Vec<f64> = model.layers().iter().map(|l| l.z()).collect();
        assert_eq!(zs, vec![0.0, 1.0, 2.0, 1.0]);

        let engine = WindowEngine::new(CursorMode::Height, 1.0, 0.05);
        let mut cursor = ViewCursor::new(LayerWindow::new(0.0, 1.0));
        engine.sync(&model, &mut cursor);
        assert_eq!(cursor.progress_max(), 6);
        cursor.set_progress(4.0);
        let frame = engine.evaluate(&model, &cursor);
        assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![1, 3]);
        // layer 1 fully drawn (3 points), one point of layer 3
        assert!(frame.is_segment_visible(&model, 1, 2));
        assert!(frame.is_segment_visible(&model, 3, 0));
        assert!(!frame.is_segment_visible(&model, 3, 1));
        assert!(!frame.is_layer_visible(2));
    }

    #[test]
    fn test_fine_layers_keep_a_current_layer() {
        let mut text = String::new();
        for layer in 1..=10 {
            let z = layer as f64 * 0.05;
            text.push_str(&format!("G1 Z{:.2}\nG1 X{layer} E{layer}\n", z));
        }
        let model = ToolpathBuilder::build(&text, BuilderOptions::default()).model;
        let engine = WindowEngine::new(CursorMode::Height, 0.05, 0.05);
        let mut cursor = engine.full_cursor(&model);
        let frame = engine.update(&model, &mut cursor);
        assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![10]);
        assert_eq!(cursor.progress_max(), 2);

        cursor.set_max_layer(0.25);
        let frame = engine.update(&model, &mut cursor);
        assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![5]);
    }

    #[test]
    fn test_relative_heights_match_typed_bounds() {
        let text = "G91\nG1 Z0.1\nG1 Z0.1\nG1 Z0.1\n";
        let model = ToolpathBuilder::build(text, BuilderOptions::default()).model;
        assert_ne!(model.layers()[3].z(), 0.3);

        let engine = WindowEngine::new(CursorMode::Height, 0.1, 0.05);
        let mut cursor = ViewCursor::new(LayerWindow::new(0.0, 0.3));
        let frame = engine.update(&model, &mut cursor);
        assert!(frame.is_layer_visible(3));
        assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![3]);

        let mut cursor = ViewCursor::new(LayerWindow::new(0.3, 0.3));
        let frame = engine.update(&model, &mut cursor);
        assert!(!frame.is_layer_visible(2));
        assert!(frame.is_layer_visible(3));
    }

    #[test]
    fn test_full_cursor_draws_everything() {
        let model = five_layer_model();
        let engine = WindowEngine::new(CursorMode::Height, 0.2, 0.05);
        let mut cursor = engine.full_cursor(&model);
        let frame = engine.update(&model, &mut cursor);
        assert_eq!(frame.drawn_segment_count(), model.segment_count());
        assert_eq!(engine.cursor_granularity(), 0.2);
    }

    #[test]
    fn test_cursor_range_by_mode() {
        let model = five_layer_model();
        let by_index = WindowEngine::new(CursorMode::LayerIndex, 0.2, 0.05);
        assert_eq!(by_index.cursor_range(&model), (0.0, 4.0));
        let by_height = WindowEngine::new(CursorMode::Height, 0.2, 0.05);
        let (lo, hi) = by_height.cursor_range(&model);
        assert!((lo - 0.2).abs() < 1e-9 && (hi - 1.0).abs() < 1e-9);
    }
}

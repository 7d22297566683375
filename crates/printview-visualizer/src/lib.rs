//! # PrintView Visualizer
//!
//! G-code interpretation and layer playback for PrintView.
//! Decodes command lines, tracks machine position, builds a layered
//! toolpath model, and decides what is visible for a layer window.

pub mod gcode;
pub mod visualizer;

pub use visualizer::{
    batch_layer, batch_model, BuildOutput, BuildStats, BuilderOptions, Bounds, CursorMode, Layer,
    LayerStepHistogram, LayerVisibility, LayerWindow, Material, Model, Move, MoveKind,
    MoveVisibility, Polyline, Segment, StepInference, Toolpath, ToolpathBuilder, ToolpathCache,
    ViewCursor, VisibilityFrame, WindowEngine,
};

pub use gcode::{
    Command, CommandDecoder, DecodedLine, MachineState, MoveOutcome, Operation, PositioningMode,
};

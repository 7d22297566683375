//! Toolpath model and playback
//!
//! This module provides:
//! - The layered toolpath model (model)
//! - Single-pass model construction (builder)
//! - Polyline batching for drawing (polyline)
//! - Layer-step inference (histogram)
//! - The visibility window engine (window)
//! - A cached facade over all of the above (toolpath)

pub mod bounds;
pub mod builder;
pub mod histogram;
pub mod model;
pub mod polyline;
pub mod toolpath;
pub mod toolpath_cache;
pub mod window;

pub use bounds::Bounds;
pub use builder::{BuildOutput, BuildStats, BuilderOptions, ToolpathBuilder};
pub use histogram::{LayerStepHistogram, StepInference};
pub use model::{Layer, Model, Move, MoveKind, Segment};
pub use polyline::{batch_layer, batch_model, Polyline};
pub use toolpath::Toolpath;
pub use toolpath_cache::ToolpathCache;
pub use window::{
    CursorMode, LayerVisibility, LayerWindow, Material, MoveVisibility, ViewCursor,
    VisibilityFrame, WindowEngine,
};

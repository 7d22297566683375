//! # PrintView
//!
//! Turns 3D-printer G-code into a layered toolpath model and decides, for a
//! layer window and a progress cursor, what a renderer should draw.
//!
//! ## Architecture
//!
//! PrintView is organized as a workspace with multiple crates:
//!
//! 1. **printview-core** - Axis and position types, constants, diagnostics
//! 2. **printview-visualizer** - Command decoder, machine state, toolpath builder,
//!    layer-step inference, visibility window engine
//! 3. **printview-settings** - Parser and viewer configuration
//! 4. **printview** - This facade plus the command-line summary tool

pub mod cli;

pub use printview_core::{
    Axis, Diagnostic, Error, PartialPosition, Point3D, Position, Result, Severity,
};

pub use printview_visualizer::{
    BuildOutput, BuildStats, BuilderOptions, Bounds, Command, CommandDecoder, CursorMode, Layer,
    LayerStepHistogram, LayerWindow, MachineState, Model, Move, MoveKind, Operation, Polyline,
    Segment, StepInference, Toolpath, ToolpathBuilder, ViewCursor, VisibilityFrame, WindowEngine,
};

pub use printview_settings::{Config, SettingsError};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging with the default configuration
///
/// Log lines go to stderr so stdout stays clean for reports and JSON.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_logging() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

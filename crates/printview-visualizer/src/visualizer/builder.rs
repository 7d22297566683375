//! Toolpath builder
//!
//! Runs decoded commands through a [`MachineState`] and assembles the
//! resulting motions into a layered [`Model`]. The pass never aborts:
//! anything it cannot interpret becomes a [`Diagnostic`].

use super::model::{Model, Segment};
use crate::gcode::{Command, CommandDecoder, MachineState, Operation, PositioningMode};
use printview_core::constants::{DEFAULT_FAMILY_PREFIX, DEFAULT_PATH_WIDTH};
use printview_core::{Diagnostic, PartialPosition, Position, Severity};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Options controlling interpretation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BuilderOptions {
    /// First character of the command family to interpret
    pub family_prefix: char,
    /// Accept X/Y/Z words on set-position commands; when false only E is applied
    pub allow_xyz_reset: bool,
    /// Nominal line width stored on the model
    pub path_width: f64,
}

impl Default for BuilderOptions {
    fn default() -> Self {
        Self {
            family_prefix: DEFAULT_FAMILY_PREFIX,
            allow_xyz_reset: true,
            path_width: DEFAULT_PATH_WIDTH,
        }
    }
}

/// Counters collected during a build
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Source lines read
    pub lines: usize,
    /// Lines that produced a command
    pub commands: usize,
    /// Linear moves that produced a segment
    pub linear_moves: usize,
    pub deposit_segments: usize,
    pub travel_segments: usize,
    /// Commands skipped as unsupported or unknown
    pub skipped: usize,
}

/// Everything a build produces
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub model: Model,
    pub diagnostics: Vec<Diagnostic>,
    pub stats: BuildStats,
    /// Tracked position after the last command
    pub final_position: Position,
}

/// Single-pass toolpath builder
pub struct ToolpathBuilder {
    options: BuilderOptions,
    decoder: CommandDecoder,
    machine: MachineState,
    model: Model,
    diagnostics: Vec<Diagnostic>,
    stats: BuildStats,
}

impl ToolpathBuilder {
    /// Create a builder starting from a fresh machine state
    pub fn new(options: BuilderOptions) -> Self {
        Self::with_machine(options, MachineState::new())
    }

    /// Create a builder that takes ownership of an existing machine state
    ///
    /// The first layer is anchored at the machine's current Z.
    pub fn with_machine(options: BuilderOptions, machine: MachineState) -> Self {
        let model = Model::new(machine.position().z, options.path_width);
        Self {
            options,
            decoder: CommandDecoder::new(options.family_prefix),
            machine,
            model,
            diagnostics: Vec::new(),
            stats: BuildStats::default(),
        }
    }

    /// Decode a whole text and build its model
    pub fn build(text: &str, options: BuilderOptions) -> BuildOutput {
        let mut builder = Self::new(options);
        for (idx, line) in text.lines().enumerate() {
            builder.feed_line(line, idx + 1);
        }
        builder.finish()
    }

    pub fn machine(&self) -> &MachineState {
        &self.machine
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Decode and apply one source line
    pub fn feed_line(&mut self, line: &str, line_number: usize) {
        self.stats.lines += 1;
        let decoded = self.decoder.decode(line, line_number);
        for diagnostic in decoded.diagnostics {
            self.report(diagnostic);
        }
        if let Some(command) = decoded.command {
            self.apply(&command);
        }
    }

    /// Apply one decoded command
    pub fn apply(&mut self, command: &Command) {
        self.stats.commands += 1;
        trace!("Line {}: {}", command.line_number, command);

        match command.operation {
            Operation::LinearMove { .. } => self.linear_move(command),
            Operation::Home => self.machine.home(),
            Operation::AbsoluteMode => self.machine.set_mode(PositioningMode::Absolute),
            Operation::RelativeMode => self.machine.set_mode(PositioningMode::Relative),
            Operation::SetPosition => self.set_position(command),
            Operation::Arc { .. } => {
                self.stats.skipped += 1;
                self.report(Diagnostic::UnsupportedOperation {
                    line_number: command.line_number,
                    code: command.code.clone(),
                    reason: "arc moves are not interpreted".to_string(),
                });
            }
            Operation::Unknown { in_family: true } => {
                self.stats.skipped += 1;
                self.report(Diagnostic::UnknownOperation {
                    line_number: command.line_number,
                    code: command.code.clone(),
                });
            }
            Operation::Unknown { in_family: false } => {
                self.stats.skipped += 1;
            }
        }
    }

    /// Finish the pass and hand over the model
    pub fn finish(mut self) -> BuildOutput {
        if self.stats.commands == 0 {
            self.report(Diagnostic::EmptyInput);
        }

        debug!(
            "Build complete: lines={}, commands={}, moves={}, deposit={}, travel={}, layers={}, skipped={}",
            self.stats.lines,
            self.stats.commands,
            self.stats.linear_moves,
            self.stats.deposit_segments,
            self.stats.travel_segments,
            self.model.layer_count(),
            self.stats.skipped
        );

        BuildOutput {
            final_position: self.machine.position(),
            model: self.model,
            diagnostics: self.diagnostics,
            stats: self.stats,
        }
    }

    fn linear_move(&mut self, command: &Command) {
        let args = command.axes();
        if args.is_empty() {
            // e.g. a feed-rate-only G1
            return;
        }

        let outcome = self.machine.apply_move(&args);
        if outcome.from == outcome.to {
            trace!("Line {}: move changes no axis", command.line_number);
            return;
        }

        let segment = Segment::new(
            outcome.from.point(),
            outcome.to.point(),
            outcome.is_depositing(),
        );

        // The segment belongs to the layer at its end height.
        let layer_z = self.model.current_layer().map(|l| l.z());
        if layer_z != Some(outcome.to.z) {
            trace!(
                "Line {}: new layer at Z={}",
                command.line_number,
                outcome.to.z
            );
            self.model.push_layer(outcome.to.z);
        }

        self.stats.linear_moves += 1;
        if segment.depositing {
            self.stats.deposit_segments += 1;
        } else {
            self.stats.travel_segments += 1;
        }
        self.model.current_layer_mut().push_segment(segment);
    }

    fn set_position(&mut self, command: &Command) {
        let mut args = command.axes();

        if !self.options.allow_xyz_reset && args.has_spatial() {
            self.report(Diagnostic::UnsupportedOperation {
                line_number: command.line_number,
                code: command.code.clone(),
                reason: "only the E axis can be reset".to_string(),
            });
            args = PartialPosition {
                e: args.e,
                ..PartialPosition::default()
            };
        }

        self.machine.set_position(&args);
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Info => debug!("{}", diagnostic),
            Severity::Warning => warn!("{}", diagnostic),
        }
        self.diagnostics.push(diagnostic);
    }
}

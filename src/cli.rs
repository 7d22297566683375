//! Command-line summary tool
//!
//! `printview <FILE> [--config <PATH>] [--json] [--window <MIN> <MAX> [<PROGRESS>]]`

use anyhow::{bail, Context};
use printview_settings::Config;
use printview_visualizer::{LayerWindow, Toolpath, ViewCursor, VisibilityFrame};
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const USAGE: &str = "\
Usage: printview <FILE> [OPTIONS]

Options:
  --config <PATH>                   Load settings from a .json or .toml file
  --json                            Print the model and diagnostics as JSON
  --window <MIN> <MAX> [<PROGRESS>] Evaluate a layer window and progress cursor
  -h, --help                        Print this help
  -V, --version                     Print version information";

/// Layer window requested on the command line
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowArgs {
    pub min: f64,
    pub max: f64,
    /// Revealed points in the current layers; everything when absent
    pub progress: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryArgs {
    pub file: PathBuf,
    pub config: Option<PathBuf>,
    pub json: bool,
    pub window: Option<WindowArgs>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CliArgs {
    Help,
    Version,
    Summarize(SummaryArgs),
}

fn parse_number(flag: &str, value: Option<String>) -> anyhow::Result<f64> {
    let Some(value) = value else {
        bail!("{} expects a number", flag);
    };
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .with_context(|| format!("{} expects a number, got '{}'", flag, value))
}

impl CliArgs {
    /// Parse arguments (without the program name)
    pub fn parse<I>(args: I) -> anyhow::Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter().peekable();
        let mut file = None;
        let mut config = None;
        let mut json = false;
        let mut window = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Self::Help),
                "-V" | "--version" => return Ok(Self::Version),
                "--json" => json = true,
                "--config" => {
                    let Some(path) = args.next() else {
                        bail!("--config expects a path");
                    };
                    config = Some(PathBuf::from(path));
                }
                "--window" => {
                    let min = parse_number("--window", args.next())?;
                    let max = parse_number("--window", args.next())?;
                    let progress = match args.peek() {
                        Some(next) if !next.starts_with("--") => {
                            Some(parse_number("--window", args.next())?)
                        }
                        _ => None,
                    };
                    window = Some(WindowArgs { min, max, progress });
                }
                flag if flag.starts_with('-') && flag.len() > 1 => {
                    bail!("Unknown option '{}'", flag)
                }
                path => {
                    if file.is_some() {
                        bail!("Only one input file is supported");
                    }
                    file = Some(PathBuf::from(path));
                }
            }
        }

        let Some(file) = file else {
            bail!("Missing input file\n\n{}", USAGE);
        };

        Ok(Self::Summarize(SummaryArgs {
            file,
            config,
            json,
            window,
        }))
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    if let Some(path) = path {
        return Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()));
    }

    match Config::default_path() {
        Ok(path) => Config::load_or_default(&path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        Err(e) => {
            debug!("Using default config: {}", e);
            Ok(Config::default())
        }
    }
}

/// Execute a parsed command line, writing the report to `out`
pub fn run<W: Write>(args: &CliArgs, out: &mut W) -> anyhow::Result<()> {
    let args = match args {
        CliArgs::Help => {
            writeln!(out, "{}", USAGE)?;
            return Ok(());
        }
        CliArgs::Version => {
            writeln!(out, "printview {} (built {})", crate::VERSION, crate::BUILD_DATE)?;
            return Ok(());
        }
        CliArgs::Summarize(args) => args,
    };

    let config = load_config(args.config.as_deref())?;
    let mut toolpath = config.toolpath();
    toolpath
        .load_file(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let window = args.window.map(|w| {
        let engine = toolpath.window_engine();
        let mut cursor = ViewCursor::new(LayerWindow::new(w.min, w.max));
        engine.sync(toolpath.model(), &mut cursor);
        if let Some(progress) = w.progress {
            cursor.set_progress(progress);
        }
        let frame = engine.evaluate(toolpath.model(), &cursor);
        (cursor, frame)
    });

    if args.json {
        write_json(out, &toolpath, window.as_ref())?;
    } else {
        write_summary(out, &args.file, &toolpath, window.as_ref())?;
    }
    Ok(())
}

fn write_json<W: Write>(
    out: &mut W,
    toolpath: &Toolpath,
    window: Option<&(ViewCursor, VisibilityFrame)>,
) -> anyhow::Result<()> {
    let (z_min, z_max) = toolpath.z_range();
    let report = json!({
        "layer_step": toolpath.layer_step(),
        "z_range": [z_min, z_max],
        "stats": toolpath.stats(),
        "diagnostics": toolpath.diagnostics(),
        "model": toolpath.model(),
        "window": window.map(|(cursor, frame)| json!({
            "cursor": cursor,
            "frame": frame,
        })),
    });
    serde_json::to_writer_pretty(&mut *out, &report).context("Failed to write JSON report")?;
    writeln!(out)?;
    Ok(())
}

fn write_summary<W: Write>(
    out: &mut W,
    file: &Path,
    toolpath: &Toolpath,
    window: Option<&(ViewCursor, VisibilityFrame)>,
) -> std::io::Result<()> {
    let model = toolpath.model();
    let stats = toolpath.stats();

    writeln!(out, "file: {}", file.display())?;
    writeln!(
        out,
        "lines: {}, commands: {}, skipped: {}",
        stats.lines, stats.commands, stats.skipped
    )?;
    writeln!(
        out,
        "layers: {}, segments: {} (deposit {}, travel {})",
        model.layer_count(),
        model.segment_count(),
        stats.deposit_segments,
        stats.travel_segments
    )?;
    writeln!(out, "layer step: {}", toolpath.layer_step())?;

    let bounds = toolpath.bounds();
    if bounds.is_valid() {
        writeln!(
            out,
            "bounds: X {:.3}..{:.3} Y {:.3}..{:.3} Z {:.3}..{:.3}",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y, bounds.min_z, bounds.max_z
        )?;
    }

    writeln!(out, "diagnostics: {}", toolpath.diagnostics().len())?;
    for diagnostic in toolpath.diagnostics() {
        writeln!(out, "  {}", diagnostic)?;
    }

    writeln!(out)?;
    writeln!(out, "{:>5} {:>10} {:>6} {:>7} {:>12}", "layer", "z", "moves", "points", "deposit_mm")?;
    for (idx, layer) in model.layers().iter().enumerate() {
        writeln!(
            out,
            "{:>5} {:>10.3} {:>6} {:>7} {:>12.3}",
            idx,
            layer.z(),
            layer.moves().len(),
            layer.point_count(),
            layer.deposit_length()
        )?;
    }

    if let Some((cursor, frame)) = window {
        let visible: Vec<String> = frame
            .layers
            .iter()
            .filter(|l| l.visible)
            .map(|l| l.layer.to_string())
            .collect();
        let current: Vec<String> = frame.current_layers().map(|l| l.to_string()).collect();

        writeln!(out)?;
        writeln!(
            out,
            "window: {}..{}, progress {}/{}",
            cursor.window().min(),
            cursor.window().max(),
            cursor.progress(),
            cursor.progress_max()
        )?;
        writeln!(out, "visible layers: [{}]", visible.join(", "))?;
        writeln!(out, "current layers: [{}]", current.join(", "))?;
        writeln!(
            out,
            "drawn segments: {}/{}",
            frame.drawn_segment_count(),
            model.segment_count()
        )?;
    }

    Ok(())
}

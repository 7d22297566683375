//! End-to-end behaviour of the decode, track, and build pipeline

use printview_core::{Diagnostic, Position};
use printview_visualizer::{
    BuilderOptions, CommandDecoder, CursorMode, LayerWindow, MachineState, MoveKind, Operation,
    PositioningMode, StepInference, Toolpath, ToolpathBuilder, ViewCursor, WindowEngine,
};
use proptest::prelude::*;

fn build(text: &str) -> printview_visualizer::BuildOutput {
    ToolpathBuilder::build(text, BuilderOptions::default())
}

#[test]
fn test_set_position_then_same_absolute_move_is_idempotent() {
    let out = build("G1 X10\nG92 X0\nG1 X0");
    assert_eq!(out.final_position.x, 10.0);
    // The last move lands where the head already is
    assert_eq!(out.model.segment_count(), 1);
}

#[test]
fn test_repeated_target_draws_one_segment() {
    let out = build("G1 X10
G1 X10
G1 Y0");
    assert_eq!(out.model.segment_count(), 1);
    assert_eq!(out.stats.commands, 3);
    assert!(out.diagnostics.is_empty());
}

#[test]
fn test_relative_mode_accumulates_deltas() {
    let out = build("G92 X3\nG91\nG1 X5\nG1 X5");
    assert_eq!(out.final_position.x, 10.0);
}

#[test]
fn test_layer_boundaries_and_step() {
    let out = build("G1 X1 Z0\nG1 X2 Z0.2 E1\nG1 X3 Z0.2 E2\nG1 X4 Z0.4 E3");
    let zs: Vec<f64> = out.model.layers().iter().map(|l| l.z()).collect();
    assert_eq!(zs, vec![0.0, 0.2, 0.4]);
    let step = StepInference::default().infer(out.model.layers());
    assert!((step - 0.2).abs() < 1e-9);
}

#[test]
fn test_deposit_classification_uses_e_delta() {
    let out = build("G1 X1 E1\nG1 X2 E1\nG1 X3 E0.5\nG1 X4\nG1 X5 E0.6");
    let depositing: Vec<bool> = out.model.layers()[0]
        .segments()
        .iter()
        .map(|s| s.depositing)
        .collect();
    assert_eq!(depositing, vec![true, false, false, false, true]);
}

#[test]
fn test_extruder_reset_keeps_deposits() {
    // Slicers reset E every layer; the next move must still count as deposit
    let out = build("G1 X1 E5\nG92 E0\nG1 X2 E0.5");
    let segments = out.model.layers()[0].segments();
    assert!(segments[0].depositing);
    assert!(segments[1].depositing);
}

#[test]
fn test_malformed_argument_is_absent_for_that_line_only() {
    let out = build("G1 X5 Y1\nG1 Xabc Y2\nG1 X7");
    let segments = out.model.layers()[0].segments();
    assert_eq!(segments.len(), 3);
    assert_eq!(segments[1].end.x, 5.0);
    assert_eq!(segments[1].end.y, 2.0);
    assert_eq!(segments[2].end.x, 7.0);
    assert_eq!(
        out.diagnostics,
        vec![Diagnostic::MalformedArgument {
            line_number: 2,
            word: 'X',
            value: "ABC".to_string(),
        }]
    );
}

#[test]
fn test_comments_line_numbers_and_rapids() {
    let out = build("N10 G0 X5 ; travel\n; full line\nN11 G01 X6 E1 *12");
    assert_eq!(out.stats.commands, 2);
    assert!(out.diagnostics.is_empty());
    assert_eq!(out.final_position.x, 6.0);
    assert_eq!(out.final_position.e, 1.0);
    let kinds: Vec<MoveKind> = out.model.layers()[0].moves().iter().map(|m| m.kind).collect();
    assert_eq!(kinds, vec![MoveKind::Travel, MoveKind::Deposit]);
}

#[test]
fn test_five_layer_window_scenario() {
    let mut text = String::new();
    for layer in 0..5 {
        text.push_str(&format!("G1 Z{}\n", layer));
        text.push_str(&format!("G1 X10 E{}\n", 2 * layer + 1));
        text.push_str(&format!("G1 X0 E{}\n", 2 * layer + 2));
    }
    let out = build(&text);
    // Z0 matches the anchor layer, so the first layer is reused
    assert_eq!(out.model.layer_count(), 5);

    let engine = WindowEngine::new(CursorMode::LayerIndex, 1.0, 0.05);
    let mut cursor = ViewCursor::new(LayerWindow::new(1.0, 3.0));
    engine.sync(&out.model, &mut cursor);
    assert_eq!(cursor.progress_max(), 3);

    for progress in [0.0, 1.0, 2.0, 3.0] {
        cursor.set_progress(progress);
        let frame = engine.evaluate(&out.model, &cursor);
        assert!(!frame.is_layer_visible(0));
        assert!(!frame.is_layer_visible(4));
        assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![3]);
    }

    cursor.set_progress(1.5);
    cursor.set_max_layer(2.0);
    let frame = engine.update(&out.model, &mut cursor);
    assert_eq!(frame.current_layers().collect::<Vec<_>>(), vec![2]);
    assert!((cursor.progress_fraction() - 0.5).abs() < 1e-9);
}

#[test]
fn test_window_min_snaps_when_max_crosses() {
    let mut cursor = ViewCursor::new(LayerWindow::new(2.0, 4.0));
    cursor.set_max_layer(1.0);
    assert_eq!(cursor.window().min(), 1.0);
    cursor.set_min_layer(3.0);
    assert_eq!(cursor.window().max(), 3.0);
}

#[test]
fn test_facade_reports_all_diagnostics() {
    let toolpath = Toolpath::from_text(
        "G1 X1 E1\nG2 X2 Y2 I1 J0\nG17\nM107\nG1 Yfoo",
        BuilderOptions::default(),
    );
    let lines: Vec<Option<usize>> = toolpath
        .diagnostics()
        .iter()
        .map(|d| d.line_number())
        .collect();
    assert_eq!(lines, vec![Some(2), Some(3), Some(5)]);
}

#[derive(Debug, Clone)]
enum Step {
    Absolute,
    Relative,
    Reset(i32),
    Move([Option<i32>; 4]),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    let word = proptest::option::of(-500i32..500);
    prop_oneof![
        1 => Just(Step::Absolute),
        1 => Just(Step::Relative),
        1 => (-100i32..100).prop_map(Step::Reset),
        6 => proptest::array::uniform4(word)
            .prop_filter("move names at least one axis", |w| w.iter().any(Option::is_some))
            .prop_map(Step::Move),
    ]
}

fn render(steps: &[Step]) -> String {
    let mut text = String::new();
    for step in steps {
        match step {
            Step::Absolute => text.push_str("G90\n"),
            Step::Relative => text.push_str("G91\n"),
            Step::Reset(e) => text.push_str(&format!("G92 E{}\n", *e as f64 / 10.0)),
            Step::Move(words) => {
                text.push_str("G1");
                for (letter, value) in ['X', 'Y', 'Z', 'E'].iter().zip(words) {
                    if let Some(v) = value {
                        text.push_str(&format!(" {}{}", letter, *v as f64 / 10.0));
                    }
                }
                text.push('\n');
            }
        }
    }
    text
}

/// Drive the tracker directly from decoded commands
fn simulate(text: &str) -> Position {
    let decoder = CommandDecoder::default();
    let mut machine = MachineState::new();
    for decoded in decoder.decode_all(text) {
        let Some(command) = decoded.command else {
            continue;
        };
        match command.operation {
            Operation::LinearMove { .. } => {
                machine.apply_move(&command.axes());
            }
            Operation::AbsoluteMode => machine.set_mode(PositioningMode::Absolute),
            Operation::RelativeMode => machine.set_mode(PositioningMode::Relative),
            Operation::SetPosition => machine.set_position(&command.axes()),
            _ => {}
        }
    }
    machine.position()
}

proptest! {
    #[test]
    fn prop_segments_replay_to_tracker_position(steps in proptest::collection::vec(step_strategy(), 1..60)) {
        let text = render(&steps);
        let out = build(&text);
        let expected = simulate(&text);

        prop_assert_eq!(out.final_position, expected);
        prop_assert!(out.diagnostics.iter().all(|d| matches!(d, Diagnostic::EmptyInput)));

        let segments: Vec<_> = out.model.layers().iter().flat_map(|l| l.segments()).collect();
        for pair in segments.windows(2) {
            prop_assert_eq!(pair[0].end, pair[1].start);
        }
        if let Some(last) = segments.last() {
            prop_assert_eq!(last.end, expected.point());
        }
        for layer in out.model.layers() {
            for segment in layer.segments() {
                prop_assert_eq!(segment.end.z, layer.z());
            }
        }
    }

    #[test]
    fn prop_visibility_never_leaks_outside_window(
        steps in proptest::collection::vec(step_strategy(), 1..40),
        lo in 0usize..6,
        span in 0usize..6,
        fraction in 0.0f64..=1.0,
    ) {
        let out = build(&render(&steps));
        let engine = WindowEngine::new(CursorMode::LayerIndex, 1.0, 0.05);
        let mut cursor = ViewCursor::new(LayerWindow::new(lo as f64, (lo + span) as f64));
        engine.sync(&out.model, &mut cursor);
        cursor.set_progress(fraction * cursor.progress_max() as f64);
        let frame = engine.evaluate(&out.model, &cursor);

        for mv in frame.visible_moves() {
            prop_assert!(mv.layer >= lo && mv.layer <= lo + span);
            prop_assert!(mv.drawn_segments <= mv.segment_count);
        }
        prop_assert!(frame.drawn_segment_count() <= out.model.segment_count());
        prop_assert_eq!(frame.progress_max, cursor.progress_max());
    }
}

//! Transform pipeline integration tests — source text → parse → dispatch → notes.
//!
//! These drive the public entry points the way a host would, with
//! diagnostics captured in memory instead of logged.

use std::sync::Arc;

use assert_approx_eq::assert_approx_eq;
use notewarp::diagnostics::{DiagnosticLog, Severity};
use notewarp::dsl::{self, AssignOp, Parameter};
use notewarp::eval::EvalContext;
use notewarp::note::NoteEvent;
use notewarp::time::TimeSignature;
use notewarp::transform::{ApplyOptions, TransformEngine};
use notewarp::wave::{SeededRandom, SequenceRandom};

const C_MAJOR: u16 = 0b1010_1011_0101;

/// Helper: engine whose diagnostics land in an inspectable log.
fn engine_with_log() -> (TransformEngine, Arc<DiagnosticLog>) {
    let log = Arc::new(DiagnosticLog::new(64));
    let engine = TransformEngine::new().with_diagnostics(log.clone());
    (engine, log)
}

/// Helper: one note per beat for `count` beats.
fn quarter_notes(count: usize, pitch: u8) -> Vec<NoteEvent> {
    (0..count)
        .map(|i| NoteEvent::new(pitch, i as f64, 1.0, 100.0))
        .collect()
}

#[test]
fn cosine_accent_per_beat() {
    let ctx = EvalContext::new(0.0, TimeSignature::default());
    let deltas = notewarp::transform::evaluate_transform("velocity += cos(1t)", &ctx);
    assert_eq!(deltas.len(), 1);
    let delta = deltas[&Parameter::Velocity];
    assert_eq!(delta.operator, AssignOp::Add);
    assert_approx_eq!(delta.value, 1.0);
}

#[test]
fn quantize_to_c_major() {
    let ctx = EvalContext::new(0.0, TimeSignature::default()).with_scale_mask(C_MAJOR);
    let deltas = notewarp::transform::evaluate_transform("pitch = quant(61)", &ctx);
    assert_eq!(deltas[&Parameter::Pitch].value, 62.0);
}

#[test]
fn cascade_selects_by_pitch() {
    let src = "C3 velocity += 10\ntiming += 0.05";
    let base = EvalContext::new(0.0, TimeSignature::default());
    let hit = notewarp::transform::evaluate_transform(src, &base.clone().with_pitch(60));
    assert_eq!(hit.len(), 2);
    let miss = notewarp::transform::evaluate_transform(src, &base.with_pitch(61));
    assert!(miss.is_empty());
}

#[test]
fn malformed_batch_emits_one_diagnostic() {
    let (engine, log) = engine_with_log();
    let mut notes = quarter_notes(8, 60);
    let report = engine.apply_transforms(&mut notes, "invalid @@ syntax", 4, 4);

    assert!(report.parse_failed);
    assert!(notes.iter().all(|n| n.velocity == 100.0));
    let diags = log.diagnostics();
    assert_eq!(diags.len(), 1);
    assert_eq!(diags[0].severity, Severity::Error);
}

#[test]
fn cosine_velocity_across_a_bar() {
    let (engine, log) = engine_with_log();
    let mut notes: Vec<NoteEvent> = (0..8)
        .map(|i| NoteEvent::new(60, i as f64 * 0.5, 0.5, 100.0))
        .collect();
    engine.apply_transforms(&mut notes, "velocity += 20 * cos(1t)", 4, 4);

    // On-beat notes get +20, off-beat notes get -20
    for (i, note) in notes.iter().enumerate() {
        let expected = if i % 2 == 0 { 120.0 } else { 80.0 };
        assert_approx_eq!(note.velocity, expected);
    }
    assert!(log.is_empty());
}

#[test]
fn time_filter_limits_to_first_bar() {
    let (engine, _log) = engine_with_log();
    let mut notes = quarter_notes(8, 60);
    engine.apply_transforms(&mut notes, "1|1-1|4 velocity = 50", 4, 4);
    assert!(notes[..4].iter().all(|n| n.velocity == 50.0));
    assert!(notes[4..].iter().all(|n| n.velocity == 100.0));
}

#[test]
fn time_filter_in_three_four() {
    let (engine, _log) = engine_with_log();
    let mut notes = quarter_notes(6, 60);
    engine.apply_transforms(&mut notes, "2|1-2|3 velocity = 1", 3, 4);
    let changed: Vec<usize> = notes
        .iter()
        .enumerate()
        .filter(|(_, n)| n.velocity == 1.0)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(changed, vec![3, 4, 5]);
}

#[test]
fn ramp_within_time_filter_window() {
    let (engine, _log) = engine_with_log();
    let mut notes = quarter_notes(8, 60);
    engine.apply_transforms(&mut notes, "2|1-3|1 velocity = ramp(0, 100)", 4, 4);
    assert_approx_eq!(notes[4].velocity, 0.0);
    assert_approx_eq!(notes[6].velocity, 50.0);
    // Outside the window the note is untouched
    assert_approx_eq!(notes[0].velocity, 100.0);
}

#[test]
fn drum_accents_by_pitch() {
    let (engine, _log) = engine_with_log();
    let mut notes = vec![
        NoteEvent::new(36, 0.0, 0.25, 100.0),
        NoteEvent::new(38, 1.0, 0.25, 100.0),
        NoteEvent::new(42, 0.5, 0.25, 100.0),
    ];
    let src = "C1 velocity = 127\nD1 velocity = 90\nF#1 probability = 0.5";
    engine.apply_transforms(&mut notes, src, 4, 4);
    assert_eq!(notes[0].velocity, 127.0);
    assert_eq!(notes[1].velocity, 90.0);
    assert_eq!(notes[2].velocity, 100.0);
    assert_eq!(notes[2].probability, Some(0.5));
    assert_eq!(notes[0].probability, None);
}

#[test]
fn one_bad_statement_does_not_block_others() {
    let (engine, log) = engine_with_log();
    let mut notes = quarter_notes(4, 60);
    let report = engine.apply_transforms(
        &mut notes,
        "velocity = pow(0, -1)\nduration = 0.5\ndeviation += 200",
        4,
        4,
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(log.len(), 1);
    for note in &notes {
        assert_eq!(note.velocity, 100.0);
        assert_eq!(note.duration, 0.5);
        assert_eq!(note.velocity_deviation, Some(127.0));
    }
}

#[test]
fn humanize_with_seeded_randomness_is_reproducible() {
    let src = "timing += rand(-0.05, 0.05)\nvelocity += noise() * 10";
    let run = || {
        let engine = TransformEngine::new().with_random(Arc::new(SeededRandom::new(1234)));
        let mut notes = quarter_notes(16, 60);
        engine.apply_transforms(&mut notes, src, 4, 4);
        notes
    };
    let a = run();
    assert_eq!(a, run());
    for (i, note) in a.iter().enumerate() {
        assert!((note.start - i as f64).abs() <= 0.05);
        assert!((note.velocity - 100.0).abs() <= 10.0);
    }
}

#[test]
fn choose_picks_from_options() {
    let engine = TransformEngine::new().with_random(Arc::new(SequenceRandom::new([0.0, 0.5, 0.99])));
    let mut notes = quarter_notes(3, 60);
    engine.apply_transforms(&mut notes, "duration = choose(0.25, 0.5, 1)", 4, 4);
    let durations: Vec<f64> = notes.iter().map(|n| n.duration).collect();
    assert_eq!(durations, vec![0.25, 0.5, 1.0]);
}

#[test]
fn quantize_batch_to_scale() {
    let (engine, _log) = engine_with_log();
    let mut notes: Vec<NoteEvent> = (60..72)
        .enumerate()
        .map(|(i, p)| NoteEvent::new(p, i as f64, 1.0, 100.0))
        .collect();
    let options = ApplyOptions::new(TimeSignature::default()).with_scale_mask(C_MAJOR);
    engine.apply_transforms_with(&mut notes, "pitch = quant(note.pitch)", &options);
    let pitches: Vec<u8> = notes.iter().map(|n| n.pitch).collect();
    assert_eq!(
        pitches,
        vec![60, 62, 62, 64, 64, 65, 67, 67, 69, 69, 71, 71]
    );
}

#[test]
fn modulation_dialect_hides_note_deviation() {
    let (engine, log) = engine_with_log();
    let mut notes = quarter_notes(2, 60);
    let options = ApplyOptions::new(TimeSignature::default())
        .with_dialect(notewarp::dsl::Dialect::Modulation);
    let report = engine.apply_transforms_with(
        &mut notes,
        "velocityDeviation = note.deviation\nvelocity = 64",
        &options,
    );
    assert_eq!(report.failures.len(), 1);
    assert_eq!(log.len(), 1);
    assert!(notes.iter().all(|n| n.velocity == 64.0 && n.velocity_deviation.is_none()));
}

#[test]
fn parsing_is_deterministic() {
    let src = "C3-C4 1|1-4|4 velocity += 20 * sin(1:0t, 0.25) + ramp(0, 10)\n\
               pitch = quant(note.pitch + 7)";
    assert_eq!(dsl::parse(src).unwrap(), dsl::parse(src).unwrap());
}

#[test]
fn notes_roundtrip_through_yaml() {
    let mut notes = quarter_notes(2, 60);
    notes[1].probability = Some(0.5);
    let yaml = serde_yaml::to_string(&notes).unwrap();
    let back: Vec<NoteEvent> = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, notes);
}

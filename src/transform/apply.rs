//! Batch applier — runs a parsed program over a slice of notes in place.

use std::collections::BTreeSet;

use tracing::debug;

use super::dispatch::{evaluate_lenient, DeltaMap, ParameterDelta, StatementFailure};
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::dsl::{AssignOp, Dialect, Parameter, Statement};
use crate::eval::{EvalContext, Evaluator};
use crate::note::NoteEvent;
use crate::time::{TimeRange, TimeSignature};

/// Deviation is a signed velocity spread.
pub const DEVIATION_LIMIT: f64 = 127.0;

/// Per-batch settings.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ApplyOptions {
    pub time_sig: TimeSignature,
    pub scale_mask: Option<u16>,
    pub dialect: Dialect,
}

impl ApplyOptions {
    pub fn new(time_sig: TimeSignature) -> Self {
        Self {
            time_sig,
            ..Self::default()
        }
    }

    pub fn with_scale_mask(mut self, mask: u16) -> Self {
        self.scale_mask = Some(mask);
        self
    }

    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }
}

/// Outcome of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplyReport {
    /// Notes whose fields actually changed.
    pub notes_changed: usize,
    /// One entry per failing statement, in first-failure order.
    pub failures: Vec<StatementFailure>,
    /// The source did not parse; nothing was applied.
    pub parse_failed: bool,
}

impl ApplyReport {
    pub fn parse_failure() -> Self {
        Self {
            parse_failed: true,
            ..Self::default()
        }
    }

    pub fn is_clean(&self) -> bool {
        !self.parse_failed && self.failures.is_empty()
    }
}

/// The span from the earliest note start to the latest note end.
pub fn clip_extent(notes: &[NoteEvent]) -> Option<TimeRange> {
    let start = notes.iter().map(|n| n.start).reduce(f64::min)?;
    let end = notes.iter().map(NoteEvent::end).reduce(f64::max)?;
    Some(TimeRange::new(start, end))
}

/// Evaluate `statements` for every note and commit the deltas.
///
/// Each note sees its own pre-transform values as `note.*`. A statement
/// that fails is reported to `diagnostics` once for the whole batch and
/// contributes nothing; other statements still apply.
pub fn apply_statements(
    notes: &mut [NoteEvent],
    statements: &[Statement],
    options: &ApplyOptions,
    evaluator: &Evaluator<'_>,
    diagnostics: &dyn DiagnosticSink,
) -> ApplyReport {
    let Some(extent) = clip_extent(notes) else {
        return ApplyReport::default();
    };

    let mut report = ApplyReport::default();
    let mut reported = BTreeSet::new();

    for note in notes.iter_mut() {
        let mut ctx = EvalContext::for_note(note, options.time_sig, options.dialect)
            .with_active_range(extent);
        if let Some(mask) = options.scale_mask {
            ctx = ctx.with_scale_mask(mask);
        }

        let deltas = evaluate_lenient(statements, &ctx, evaluator, |failure| {
            if reported.insert(failure.index) {
                diagnostics.emit(Diagnostic::error(format!(
                    "statement {} ({}) failed: {}",
                    failure.index + 1,
                    options.dialect.parameter_name(failure.parameter),
                    failure.error.message
                )));
                report.failures.push(failure);
            }
        });

        if commit(note, &deltas) {
            report.notes_changed += 1;
        }
    }

    debug!(
        notes = notes.len(),
        changed = report.notes_changed,
        failures = report.failures.len(),
        "applied transforms"
    );
    report
}

/// Write deltas onto a note. Returns whether anything changed.
pub fn commit(note: &mut NoteEvent, deltas: &DeltaMap) -> bool {
    let before = note.clone();
    for (parameter, delta) in deltas {
        match parameter {
            Parameter::Velocity => note.velocity = combine(delta, note.velocity),
            Parameter::Timing => note.start = combine(delta, note.start),
            Parameter::Duration => note.duration = combine(delta, note.duration),
            Parameter::Probability => {
                let current = note.probability.unwrap_or(1.0);
                note.probability = Some(combine(delta, current));
            }
            Parameter::Deviation => {
                let current = note.velocity_deviation.unwrap_or(0.0);
                let value = combine(delta, current).clamp(-DEVIATION_LIMIT, DEVIATION_LIMIT);
                note.velocity_deviation = Some(value);
            }
            Parameter::Pitch => {
                note.pitch = combine(delta, note.pitch as f64).round().clamp(0.0, 127.0) as u8;
            }
            Parameter::Gain => debug!("gain has no note field, skipped"),
        }
    }
    *note != before
}

fn combine(delta: &ParameterDelta, current: f64) -> f64 {
    match delta.operator {
        AssignOp::Set => delta.value,
        AssignOp::Add => current + delta.value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticLog;
    use crate::dsl::parse;
    use assert_approx_eq::assert_approx_eq;

    fn delta(operator: AssignOp, value: f64) -> ParameterDelta {
        ParameterDelta { operator, value }
    }

    fn apply(notes: &mut [NoteEvent], src: &str, log: &DiagnosticLog) -> ApplyReport {
        let statements = parse(src).unwrap();
        apply_statements(
            notes,
            &statements,
            &ApplyOptions::default(),
            &Evaluator::default(),
            log,
        )
    }

    #[test]
    fn clip_extent_spans_all_notes() {
        let notes = vec![
            NoteEvent::new(60, 2.0, 1.0, 100.0),
            NoteEvent::new(62, 0.5, 0.5, 100.0),
            NoteEvent::new(64, 3.0, 2.5, 100.0),
        ];
        assert_eq!(clip_extent(&notes), Some(TimeRange::new(0.5, 5.5)));
        assert_eq!(clip_extent(&[]), None);
    }

    #[test]
    fn set_and_add() {
        let mut note = NoteEvent::new(60, 0.0, 1.0, 100.0);
        let mut deltas = DeltaMap::new();
        deltas.insert(Parameter::Velocity, delta(AssignOp::Add, -20.0));
        deltas.insert(Parameter::Duration, delta(AssignOp::Set, 0.25));
        deltas.insert(Parameter::Timing, delta(AssignOp::Add, 0.5));
        assert!(commit(&mut note, &deltas));
        assert_eq!(note.velocity, 80.0);
        assert_eq!(note.duration, 0.25);
        assert_eq!(note.start, 0.5);
    }

    #[test]
    fn add_to_absent_fields_uses_defaults() {
        let mut note = NoteEvent::new(60, 0.0, 1.0, 100.0);
        let mut deltas = DeltaMap::new();
        deltas.insert(Parameter::Probability, delta(AssignOp::Add, -0.25));
        deltas.insert(Parameter::Deviation, delta(AssignOp::Add, 12.0));
        commit(&mut note, &deltas);
        assert_eq!(note.probability, Some(0.75));
        assert_eq!(note.velocity_deviation, Some(12.0));
    }

    #[test]
    fn deviation_is_clamped() {
        let mut note = NoteEvent::new(60, 0.0, 1.0, 100.0);
        let mut deltas = DeltaMap::new();
        deltas.insert(Parameter::Deviation, delta(AssignOp::Set, 500.0));
        commit(&mut note, &deltas);
        assert_eq!(note.velocity_deviation, Some(127.0));

        deltas.insert(Parameter::Deviation, delta(AssignOp::Add, -400.0));
        commit(&mut note, &deltas);
        assert_eq!(note.velocity_deviation, Some(-127.0));
    }

    #[test]
    fn pitch_is_rounded_and_clamped() {
        let mut note = NoteEvent::new(60, 0.0, 1.0, 100.0);
        let mut deltas = DeltaMap::new();
        deltas.insert(Parameter::Pitch, delta(AssignOp::Add, 2.6));
        commit(&mut note, &deltas);
        assert_eq!(note.pitch, 63);

        deltas.insert(Parameter::Pitch, delta(AssignOp::Add, 200.0));
        commit(&mut note, &deltas);
        assert_eq!(note.pitch, 127);
    }

    #[test]
    fn gain_leaves_note_alone() {
        let mut note = NoteEvent::new(60, 0.0, 1.0, 100.0);
        let mut deltas = DeltaMap::new();
        deltas.insert(Parameter::Gain, delta(AssignOp::Set, -6.0));
        assert!(!commit(&mut note, &deltas));
    }

    #[test]
    fn self_reference_sees_original_values() {
        let log = DiagnosticLog::new(8);
        let mut notes = vec![NoteEvent::new(60, 0.0, 1.0, 50.0)];
        apply(&mut notes, "velocity = note.velocity * 2\nduration = note.velocity / 100", &log);
        assert_eq!(notes[0].velocity, 100.0);
        assert_approx_eq!(notes[0].duration, 0.5);
    }

    #[test]
    fn ramp_spans_clip_extent() {
        let log = DiagnosticLog::new(8);
        let mut notes: Vec<NoteEvent> = (0..5)
            .map(|i| NoteEvent::new(60, i as f64, 1.0, 0.0))
            .collect();
        apply(&mut notes, "velocity = ramp(0, 100)", &log);
        // Extent is 0..5
        assert_approx_eq!(notes[0].velocity, 0.0);
        assert_approx_eq!(notes[2].velocity, 40.0);
        assert_approx_eq!(notes[4].velocity, 80.0);
    }

    #[test]
    fn failing_statement_reported_once() {
        let log = DiagnosticLog::new(16);
        let mut notes: Vec<NoteEvent> = (0..4)
            .map(|i| NoteEvent::new(60, i as f64, 1.0, 100.0))
            .collect();
        let report = apply(&mut notes, "velocity = note.nothing\nduration = 0.5", &log);
        assert_eq!(log.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.notes_changed, 4);
        assert!(notes.iter().all(|n| n.velocity == 100.0 && n.duration == 0.5));
        assert!(!report.is_clean());
    }

    #[test]
    fn pitch_filter_selects_notes() {
        let log = DiagnosticLog::new(8);
        let mut notes = vec![
            NoteEvent::new(60, 0.0, 1.0, 100.0),
            NoteEvent::new(62, 1.0, 1.0, 100.0),
        ];
        let report = apply(&mut notes, "C3 velocity += 10", &log);
        assert_eq!(notes[0].velocity, 110.0);
        assert_eq!(notes[1].velocity, 100.0);
        assert_eq!(report.notes_changed, 1);
        assert!(report.is_clean());
    }

    #[test]
    fn scale_mask_reaches_quant() {
        let log = DiagnosticLog::new(8);
        let mut notes = vec![NoteEvent::new(61, 0.0, 1.0, 100.0)];
        let statements = parse("pitch = quant(note.pitch)").unwrap();
        let options = ApplyOptions::default().with_scale_mask(0b1010_1011_0101);
        apply_statements(&mut notes, &statements, &options, &Evaluator::default(), &log);
        assert_eq!(notes[0].pitch, 62);
    }

    #[test]
    fn empty_batch_is_noop() {
        let log = DiagnosticLog::new(8);
        let report = apply(&mut [], "velocity = 1", &log);
        assert_eq!(report, ApplyReport::default());
    }
}

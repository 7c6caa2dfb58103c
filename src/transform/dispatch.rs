//! Filter/dispatch — folds a statement list into per-parameter deltas.
//!
//! Pitch and time filters cascade: once written on a statement they stay in
//! effect for every later statement until another statement overrides them.
//! The two are tracked independently, so overriding one leaves the other
//! alone.

use std::collections::BTreeMap;

use crate::dsl::{AssignOp, Parameter, PitchFilter, Statement, TimeFilter};
use crate::eval::{EvalContext, EvalError, Evaluator};
use crate::time::TimeRange;

/// What a statement contributes to one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDelta {
    pub operator: AssignOp,
    pub value: f64,
}

/// Parameter -> delta. The last matching statement for a parameter wins.
pub type DeltaMap = BTreeMap<Parameter, ParameterDelta>;

/// A statement whose expression failed to evaluate.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementFailure {
    /// Position of the statement in the program.
    pub index: usize,
    pub parameter: Parameter,
    pub error: EvalError,
}

/// The filters in effect at a given statement.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterCascade {
    pitch: Option<PitchFilter>,
    time: Option<TimeFilter>,
}

impl FilterCascade {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take over any filter written on `statement`.
    pub fn advance(&mut self, statement: &Statement) {
        if let Some(pitch) = statement.pitch_filter {
            self.pitch = Some(pitch);
        }
        if let Some(time) = statement.time_filter {
            self.time = Some(time);
        }
    }

    pub fn pitch(&self) -> Option<PitchFilter> {
        self.pitch
    }

    pub fn time(&self) -> Option<TimeFilter> {
        self.time
    }

    /// Whether the current filters select `ctx`.
    ///
    /// A pitch filter only applies when the context carries a pitch.
    pub fn matches(&self, ctx: &EvalContext) -> bool {
        if let (Some(filter), Some(pitch)) = (self.pitch, ctx.pitch) {
            if !filter.matches(pitch) {
                return false;
            }
        }
        match self.time_range(ctx) {
            Some(range) => range.contains(ctx.position),
            None => true,
        }
    }

    /// The time filter window in beats under the context's time signature.
    pub fn time_range(&self, ctx: &EvalContext) -> Option<TimeRange> {
        self.time.map(|filter| filter.to_range(ctx.time_sig))
    }
}

/// Evaluate every matching statement, stopping at the first failure.
pub fn evaluate(
    statements: &[Statement],
    ctx: &EvalContext,
    evaluator: &Evaluator<'_>,
) -> Result<DeltaMap, EvalError> {
    dispatch(statements, ctx, evaluator, |failure| Err(failure.error))
}

/// Evaluate every matching statement. Failing statements are handed to
/// `on_failure` and left out of the result; the rest still apply.
pub fn evaluate_lenient(
    statements: &[Statement],
    ctx: &EvalContext,
    evaluator: &Evaluator<'_>,
    mut on_failure: impl FnMut(StatementFailure),
) -> DeltaMap {
    dispatch(statements, ctx, evaluator, |failure| {
        on_failure(failure);
        Ok(())
    })
    .unwrap_or_default()
}

fn dispatch(
    statements: &[Statement],
    ctx: &EvalContext,
    evaluator: &Evaluator<'_>,
    mut on_failure: impl FnMut(StatementFailure) -> Result<(), EvalError>,
) -> Result<DeltaMap, EvalError> {
    let mut cascade = FilterCascade::new();
    let mut deltas = DeltaMap::new();

    for (index, statement) in statements.iter().enumerate() {
        cascade.advance(statement);
        if !cascade.matches(ctx) {
            continue;
        }

        // A time-filtered statement ramps across its own window.
        let scoped;
        let stmt_ctx = match cascade.time_range(ctx) {
            Some(range) => {
                scoped = ctx.clone().with_active_range(range);
                &scoped
            }
            None => ctx,
        };

        match evaluator.evaluate_expression(&statement.expression, stmt_ctx) {
            Ok(value) => {
                deltas.insert(
                    statement.parameter,
                    ParameterDelta {
                        operator: statement.operator,
                        value,
                    },
                );
            }
            Err(error) => on_failure(StatementFailure {
                index,
                parameter: statement.parameter,
                error,
            })?,
        }
    }

    Ok(deltas)
}

//! Transform engine — the safe entry points hosts call.
//!
//! Nothing here returns an error. Parse failures and failing statements are
//! reported through the engine's [`DiagnosticSink`] and the affected
//! statement (or the whole program, for a parse failure) is left out.

pub mod apply;
pub mod dispatch;

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::dsl::{self, Dialect, Statement};
use crate::eval::{EvalContext, Evaluator};
use crate::note::NoteEvent;
use crate::time::TimeSignature;
use crate::wave::{RandomSource, SeededRandom, ThreadRandom};

pub use apply::{apply_statements, clip_extent, commit, ApplyOptions, ApplyReport};
pub use dispatch::{
    evaluate, evaluate_lenient, DeltaMap, FilterCascade, ParameterDelta, StatementFailure,
};

/// Evaluates transform source against notes, isolating failures.
#[derive(Clone)]
pub struct TransformEngine {
    random: Arc<dyn RandomSource>,
    diagnostics: Arc<dyn DiagnosticSink>,
    dialect: Dialect,
}

impl Default for TransformEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransformEngine {
    /// Thread-local randomness, diagnostics logged through `tracing`.
    pub fn new() -> Self {
        Self {
            random: Arc::new(ThreadRandom),
            diagnostics: Arc::new(TracingSink),
            dialect: Dialect::default(),
        }
    }

    /// Seeded randomness when the config fixes a seed.
    pub fn from_config(config: &EngineConfig) -> Self {
        let random: Arc<dyn RandomSource> = match config.seed {
            Some(seed) => Arc::new(SeededRandom::new(seed)),
            None => Arc::new(ThreadRandom),
        };
        Self::new().with_random(random).with_dialect(config.dialect)
    }

    pub fn with_random(mut self, random: Arc<dyn RandomSource>) -> Self {
        self.random = random;
        self
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Dialect used by [`apply_transforms`](Self::apply_transforms).
    pub fn with_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(self.random.as_ref(), self.diagnostics.as_ref())
    }

    /// Single-shot evaluation with clip-transform parameter names.
    pub fn evaluate_transform(&self, source: &str, ctx: &EvalContext) -> DeltaMap {
        self.evaluate_dialect(source, ctx, Dialect::Transform)
    }

    /// Single-shot evaluation with modulation parameter names.
    pub fn evaluate_modulation(&self, source: &str, ctx: &EvalContext) -> DeltaMap {
        self.evaluate_dialect(source, ctx, Dialect::Modulation)
    }

    fn evaluate_dialect(&self, source: &str, ctx: &EvalContext, dialect: Dialect) -> DeltaMap {
        let Some(statements) = self.parse(source, dialect) else {
            return DeltaMap::new();
        };
        evaluate_lenient(&statements, ctx, &self.evaluator(), |failure| {
            self.diagnostics.emit(Diagnostic::error(format!(
                "statement {} ({}) failed: {}",
                failure.index + 1,
                dialect.parameter_name(failure.parameter),
                failure.error.message
            )));
        })
    }

    /// Apply `source` to every note in place.
    pub fn apply_transforms(
        &self,
        notes: &mut [NoteEvent],
        source: &str,
        numerator: u32,
        denominator: u32,
    ) -> ApplyReport {
        let Some(time_sig) = TimeSignature::new(numerator, denominator) else {
            self.diagnostics.emit(Diagnostic::error(format!(
                "invalid time signature {numerator}/{denominator}"
            )));
            return ApplyReport::default();
        };
        let options = ApplyOptions::new(time_sig).with_dialect(self.dialect);
        self.apply_transforms_with(notes, source, &options)
    }

    /// Apply `source` with explicit batch options.
    pub fn apply_transforms_with(
        &self,
        notes: &mut [NoteEvent],
        source: &str,
        options: &ApplyOptions,
    ) -> ApplyReport {
        match self.parse(source, options.dialect) {
            Some(statements) => self.apply_parsed(notes, &statements, options),
            None => ApplyReport::parse_failure(),
        }
    }

    /// Apply an already parsed program, for hosts that reuse one program
    /// across many clips.
    pub fn apply_parsed(
        &self,
        notes: &mut [NoteEvent],
        statements: &[Statement],
        options: &ApplyOptions,
    ) -> ApplyReport {
        apply_statements(
            notes,
            statements,
            options,
            &self.evaluator(),
            self.diagnostics.as_ref(),
        )
    }

    fn parse(&self, source: &str, dialect: Dialect) -> Option<Vec<Statement>> {
        match dsl::parse_dialect(source, dialect) {
            Ok(statements) => Some(statements),
            Err(e) => {
                self.diagnostics
                    .emit(Diagnostic::error(format!("failed to parse transform: {e}")));
                None
            }
        }
    }
}

/// [`TransformEngine::evaluate_transform`] on a default engine.
pub fn evaluate_transform(source: &str, ctx: &EvalContext) -> DeltaMap {
    TransformEngine::new().evaluate_transform(source, ctx)
}

/// [`TransformEngine::evaluate_modulation`] on a default engine.
pub fn evaluate_modulation(source: &str, ctx: &EvalContext) -> DeltaMap {
    TransformEngine::new().evaluate_modulation(source, ctx)
}

/// [`TransformEngine::apply_transforms`] on a default engine.
pub fn apply_transforms(
    notes: &mut [NoteEvent],
    source: &str,
    numerator: u32,
    denominator: u32,
) -> ApplyReport {
    TransformEngine::new().apply_transforms(notes, source, numerator, denominator)
}

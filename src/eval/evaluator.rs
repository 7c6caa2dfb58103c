//! Expression evaluator — walks an [`Expr`] against an [`EvalContext`].
//!
//! This is the strict surface: every failure comes back as an [`EvalError`].
//! Recoverable oddities (a non-positive ramp speed or curve exponent) are
//! clamped and reported as warnings through the diagnostics sink.

use super::context::EvalContext;
use super::error::EvalError;
use super::function::Function;
use crate::diagnostics::{Diagnostic, DiagnosticSink, TracingSink};
use crate::dsl::{BinaryOp, Expr};
use crate::time::{TimeRange, TimeSignature};
use crate::wave::{self, random, RandomSource, ThreadRandom, Waveform, DEFAULT_DUTY};

/// Evaluates expressions with an injected random source and warning sink.
#[derive(Clone, Copy)]
pub struct Evaluator<'a> {
    random: &'a dyn RandomSource,
    diagnostics: &'a dyn DiagnosticSink,
}

impl Default for Evaluator<'static> {
    fn default() -> Self {
        Self {
            random: &ThreadRandom,
            diagnostics: &TracingSink,
        }
    }
}

impl<'a> Evaluator<'a> {
    pub fn new(random: &'a dyn RandomSource, diagnostics: &'a dyn DiagnosticSink) -> Self {
        Self {
            random,
            diagnostics,
        }
    }

    pub fn evaluate_expression(&self, node: &Expr, ctx: &EvalContext) -> Result<f64, EvalError> {
        match node {
            Expr::Number(n) => Ok(*n),
            Expr::Period { bars, beats } => Ok(period_beats(*bars, *beats, ctx.time_sig)),
            Expr::Variable { namespace, name } => ctx.lookup(*namespace, name),
            Expr::Binary {
                op: BinaryOp::Add,
                left,
                right,
            } => self.sum_chain(left, right, ctx),
            Expr::Binary { op, left, right } => {
                let l = self.evaluate_expression(left, ctx)?;
                let r = self.evaluate_expression(right, ctx)?;
                Ok(apply_binary(*op, l, r))
            }
            Expr::Call { name, args } => {
                let function =
                    Function::from_name(name).ok_or_else(|| EvalError::unknown_function(name))?;
                self.evaluate_function(function, args, ctx)
            }
        }
    }

    /// Sum a right-nested `+` chain from left to right.
    fn sum_chain(&self, left: &Expr, right: &Expr, ctx: &EvalContext) -> Result<f64, EvalError> {
        let mut total = self.evaluate_expression(left, ctx)?;
        let mut rest = right;
        while let Expr::Binary {
            op: BinaryOp::Add,
            left,
            right,
        } = rest
        {
            total += self.evaluate_expression(left, ctx)?;
            rest = right;
        }
        Ok(total + self.evaluate_expression(rest, ctx)?)
    }

    /// Evaluate a call to a built-in function.
    ///
    /// Arity is checked before any argument is evaluated or any random value
    /// is drawn.
    pub fn evaluate_function(
        &self,
        function: Function,
        args: &[Expr],
        ctx: &EvalContext,
    ) -> Result<f64, EvalError> {
        function.check_arity(args.len())?;

        match function {
            Function::Cos => self.periodic(function, Waveform::Cos, args, ctx),
            Function::Sin => self.periodic(function, Waveform::Sin, args, ctx),
            Function::Tri => self.periodic(function, Waveform::Tri, args, ctx),
            Function::Saw => self.periodic(function, Waveform::Saw, args, ctx),
            Function::Square => self.periodic(function, Waveform::Square, args, ctx),
            Function::Ramp => {
                let v = self.values(args, ctx)?;
                let range = ctx
                    .active_range
                    .ok_or_else(|| EvalError::missing_time_range("ramp"))?;
                let mut speed = v.get(2).copied().unwrap_or(1.0);
                if speed <= 0.0 {
                    self.warn(format!("ramp() speed must be positive, got {speed}; using 0"));
                    speed = 0.0;
                }
                Ok(wave::ramp(range_phase(ctx.position, range) * speed, v[0], v[1]))
            }
            Function::Curve => {
                let v = self.values(args, ctx)?;
                let (phase, start, end, exponent) = if v.len() == 4 {
                    (v[0], v[1], v[2], v[3])
                } else {
                    let range = ctx
                        .active_range
                        .ok_or_else(|| EvalError::missing_time_range("curve"))?;
                    (range_phase(ctx.position, range), v[0], v[1], v[2])
                };
                if exponent <= 0.0 {
                    self.warn(format!(
                        "curve() exponent must be positive, got {exponent}; using {}",
                        wave::MIN_CURVE_EXPONENT
                    ));
                }
                Ok(wave::curve(phase, start, end, exponent))
            }
            Function::Noise => Ok(random::noise(self.random)),
            Function::Rand => {
                let v = self.values(args, ctx)?;
                Ok(random::uniform(self.random, v[0], v[1]))
            }
            Function::Choose => {
                let v = self.values(args, ctx)?;
                random::choose(self.random, &v)
                    .ok_or_else(|| EvalError::invalid_argument("choose", "no options given"))
            }
            Function::Quant => {
                let v = self.values(args, ctx)?;
                Ok(quantize(v[0], ctx.scale_mask))
            }
            Function::Round => Ok(self.values(args, ctx)?[0].round()),
            Function::Floor => Ok(self.values(args, ctx)?[0].floor()),
            Function::Ceil => Ok(self.values(args, ctx)?[0].ceil()),
            Function::Abs => Ok(self.values(args, ctx)?[0].abs()),
            Function::Min => Ok(self
                .values(args, ctx)?
                .into_iter()
                .fold(f64::INFINITY, f64::min)),
            Function::Max => Ok(self
                .values(args, ctx)?
                .into_iter()
                .fold(f64::NEG_INFINITY, f64::max)),
            Function::Pow => {
                let v = self.values(args, ctx)?;
                let result = v[0].powf(v[1]);
                if result.is_finite() {
                    Ok(result)
                } else {
                    Err(EvalError::invalid_argument(
                        "pow",
                        format!("{}^{} is not a finite number", v[0], v[1]),
                    ))
                }
            }
        }
    }

    /// `shape(period, [offset], [duty])` at the context position.
    fn periodic(
        &self,
        function: Function,
        shape: Waveform,
        args: &[Expr],
        ctx: &EvalContext,
    ) -> Result<f64, EvalError> {
        let period = self.resolve_period(function, &args[0], ctx)?;
        let offset = match args.get(1) {
            Some(arg) => self.evaluate_expression(arg, ctx)?,
            None => 0.0,
        };
        let duty = match args.get(2) {
            Some(arg) => self.evaluate_expression(arg, ctx)?,
            None => DEFAULT_DUTY,
        };
        let base_phase = (ctx.position / period).rem_euclid(1.0);
        Ok(wave::waveform(shape, base_phase + offset, duty))
    }

    /// Resolve a period argument to beats; it must be strictly positive.
    fn resolve_period(
        &self,
        function: Function,
        arg: &Expr,
        ctx: &EvalContext,
    ) -> Result<f64, EvalError> {
        let beats = match arg {
            Expr::Period { bars, beats } => period_beats(*bars, *beats, ctx.time_sig),
            other => self.evaluate_expression(other, ctx)?,
        };
        if beats > 0.0 && beats.is_finite() {
            Ok(beats)
        } else {
            Err(EvalError::invalid_argument(
                function.name(),
                format!("period must be greater than 0 beats, got {beats}"),
            ))
        }
    }

    fn values(&self, args: &[Expr], ctx: &EvalContext) -> Result<Vec<f64>, EvalError> {
        args.iter()
            .map(|arg| self.evaluate_expression(arg, ctx))
            .collect()
    }

    fn warn(&self, message: String) {
        self.diagnostics.emit(Diagnostic::warning(message));
    }
}

/// Evaluate with the thread-local random source, warnings going to `tracing`.
pub fn evaluate_expression(node: &Expr, ctx: &EvalContext) -> Result<f64, EvalError> {
    Evaluator::default().evaluate_expression(node, ctx)
}

/// Call a built-in by name with the default evaluator.
pub fn evaluate_function(name: &str, args: &[Expr], ctx: &EvalContext) -> Result<f64, EvalError> {
    let function = Function::from_name(name).ok_or_else(|| EvalError::unknown_function(name))?;
    Evaluator::default().evaluate_function(function, args, ctx)
}

/// `bars * beats_per_bar + beats`.
pub fn period_beats(bars: f64, beats: f64, time_sig: TimeSignature) -> f64 {
    bars * time_sig.beats_per_bar() + beats
}

fn range_phase(position: f64, range: TimeRange) -> f64 {
    let length = range.length();
    if length == 0.0 {
        0.0
    } else {
        (position - range.start) / length
    }
}

/// Apply an arithmetic operator. Division and modulo by zero yield 0.
pub fn apply_binary(op: BinaryOp, l: f64, r: f64) -> f64 {
    match op {
        BinaryOp::Add => l + r,
        BinaryOp::Subtract => l - r,
        BinaryOp::Multiply => l * r,
        BinaryOp::Divide => {
            if r == 0.0 {
                0.0
            } else {
                l / r
            }
        }
        BinaryOp::Modulo => modulo(l, r),
    }
}

/// Floored modulo: the result takes the divisor's sign (`-1 % 4 == 3`,
/// `7 % -3 == -2`) and never equals the divisor. Modulo by zero is 0.
pub fn modulo(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return 0.0;
    }
    ((a % b) + b) % b
}

/// Snap `value` to the nearest pitch allowed by a 12-bit pitch-class mask.
///
/// Ties go to the higher pitch. Results are kept inside 0–127 by searching
/// inward from the violated boundary. Without a mask (or with an empty one)
/// the value passes through unchanged.
pub fn quantize(value: f64, scale_mask: Option<u16>) -> f64 {
    let mask = match scale_mask {
        Some(m) if m & 0x0FFF != 0 => m & 0x0FFF,
        _ => return value,
    };
    let in_scale = |p: i64| mask & (1 << p.rem_euclid(12)) != 0;

    let pitch = value.round().clamp(-12.0, 139.0) as i64;
    let nearest = (0..=6)
        .flat_map(|d| [pitch + d, pitch - d])
        .find(|&p| in_scale(p))
        .unwrap_or(pitch);

    let snapped = if nearest > 127 {
        (0..=127).rev().find(|&p| in_scale(p)).unwrap_or(127)
    } else if nearest < 0 {
        (0..=127).find(|&p| in_scale(p)).unwrap_or(0)
    } else {
        nearest
    };
    snapped as f64
}

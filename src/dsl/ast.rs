//! Abstract Syntax Tree for the transform language.
//!
//! A parsed program is an ordered `Vec<Statement>`. Filters left as `None`
//! on a statement inherit the most recent filter written earlier in the
//! program; the cascade is resolved at evaluation time.

use std::fmt;

use crate::time::{BarBeat, TimeRange, TimeSignature};

/// One `[pitch] [time] parameter op expression` line.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub parameter: Parameter,
    pub operator: AssignOp,
    pub pitch_filter: Option<PitchFilter>,
    pub time_filter: Option<TimeFilter>,
    pub expression: Expr,
}

/// Note parameters a statement can target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Parameter {
    Velocity,
    Timing,
    Duration,
    Probability,
    Deviation,
    Pitch,
    Gain,
}

/// Assignment operator: `=` or `+=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignOp::Set => write!(f, "set"),
            AssignOp::Add => write!(f, "add"),
        }
    }
}

/// Which notes a statement applies to, by MIDI pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PitchFilter {
    Single(u8),
    /// Inclusive `low..=high`.
    Range(u8, u8),
}

impl PitchFilter {
    pub fn matches(self, pitch: u8) -> bool {
        match self {
            PitchFilter::Single(p) => pitch == p,
            PitchFilter::Range(low, high) => (low..=high).contains(&pitch),
        }
    }
}

/// An inclusive bar|beat window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeFilter {
    pub start: BarBeat,
    pub end: BarBeat,
}

impl TimeFilter {
    /// Resolve to absolute beats under `time_sig`.
    pub fn to_range(self, time_sig: TimeSignature) -> TimeRange {
        TimeRange::new(self.start.to_beats(time_sig), self.end.to_beats(time_sig))
    }
}

/// Variable namespaces: `note.*` for MIDI notes, `audio.*` for audio clips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Namespace {
    Note,
    Audio,
}

impl Namespace {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "note" => Some(Namespace::Note),
            "audio" => Some(Namespace::Audio),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Note => "note",
            Namespace::Audio => "audio",
        }
    }
}

/// Binary arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinaryOp {
    pub fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Subtract => '-',
            BinaryOp::Multiply => '*',
            BinaryOp::Divide => '/',
            BinaryOp::Modulo => '%',
        }
    }
}

/// An expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    /// A duration in bars plus beats; only written as a function argument.
    Period { bars: f64, beats: f64 },
    Variable { namespace: Namespace, name: String },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call { name: String, args: Vec<Expr> },
}

impl Expr {
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Self {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn variable(namespace: Namespace, name: impl Into<String>) -> Self {
        Expr::Variable {
            namespace,
            name: name.into(),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Number(n) => write!(f, "{n}"),
            Expr::Period { bars, beats } if *bars == 0.0 => write!(f, "{beats}t"),
            Expr::Period { bars, beats } => write!(f, "{bars}:{beats}t"),
            Expr::Variable { namespace, name } => write!(f, "{}.{name}", namespace.as_str()),
            Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Call { name, args } => {
                write!(f, "{name}(")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_filter_single() {
        assert!(PitchFilter::Single(60).matches(60));
        assert!(!PitchFilter::Single(60).matches(61));
    }

    #[test]
    fn pitch_filter_range_is_inclusive() {
        let f = PitchFilter::Range(60, 72);
        assert!(f.matches(60));
        assert!(f.matches(72));
        assert!(!f.matches(59));
        assert!(!f.matches(73));
    }

    #[test]
    fn time_filter_to_range() {
        let f = TimeFilter {
            start: BarBeat::new(1, 1.0),
            end: BarBeat::new(2, 1.0),
        };
        let r = f.to_range(TimeSignature::default());
        assert_eq!(r, TimeRange::new(0.0, 4.0));

        let r34 = f.to_range(TimeSignature::new(3, 4).unwrap());
        assert_eq!(r34, TimeRange::new(0.0, 3.0));
    }

    #[test]
    fn display_expression() {
        let e = Expr::binary(
            BinaryOp::Multiply,
            Expr::Number(20.0),
            Expr::call(
                "cos",
                vec![Expr::Period {
                    bars: 0.0,
                    beats: 1.0,
                }],
            ),
        );
        assert_eq!(e.to_string(), "(20 * cos(1t))");
    }

    #[test]
    fn display_variable_and_bar_period() {
        let e = Expr::call(
            "saw",
            vec![
                Expr::Period {
                    bars: 2.0,
                    beats: 0.5,
                },
                Expr::variable(Namespace::Note, "start"),
            ],
        );
        assert_eq!(e.to_string(), "saw(2:0.5t, note.start)");
    }
}

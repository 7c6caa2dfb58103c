//! The closed set of functions callable from transform expressions.

use std::fmt;

use super::error::EvalError;

/// A built-in function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Function {
    Cos,
    Sin,
    Tri,
    Saw,
    Square,
    Ramp,
    Curve,
    Noise,
    Rand,
    Choose,
    Quant,
    Round,
    Floor,
    Ceil,
    Abs,
    Min,
    Max,
    Pow,
}

/// How many arguments a function accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, count: usize) -> bool {
        match self {
            Arity::Exact(n) => count == n,
            Arity::Between(lo, hi) => (lo..=hi).contains(&count),
            Arity::AtLeast(n) => count >= n,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        match *self {
            Arity::Exact(n) => write!(f, "exactly {n} argument{}", plural(n)),
            Arity::Between(lo, hi) => write!(f, "{lo} to {hi} arguments"),
            Arity::AtLeast(n) => write!(f, "at least {n} argument{}", plural(n)),
        }
    }
}

const ALL: [Function; 18] = [
    Function::Cos,
    Function::Sin,
    Function::Tri,
    Function::Saw,
    Function::Square,
    Function::Ramp,
    Function::Curve,
    Function::Noise,
    Function::Rand,
    Function::Choose,
    Function::Quant,
    Function::Round,
    Function::Floor,
    Function::Ceil,
    Function::Abs,
    Function::Min,
    Function::Max,
    Function::Pow,
];

impl Function {
    pub fn from_name(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|f| f.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Function::Cos => "cos",
            Function::Sin => "sin",
            Function::Tri => "tri",
            Function::Saw => "saw",
            Function::Square => "square",
            Function::Ramp => "ramp",
            Function::Curve => "curve",
            Function::Noise => "noise",
            Function::Rand => "rand",
            Function::Choose => "choose",
            Function::Quant => "quant",
            Function::Round => "round",
            Function::Floor => "floor",
            Function::Ceil => "ceil",
            Function::Abs => "abs",
            Function::Min => "min",
            Function::Max => "max",
            Function::Pow => "pow",
        }
    }

    pub fn arity(self) -> Arity {
        match self {
            Function::Cos | Function::Sin | Function::Tri | Function::Saw => Arity::Between(1, 2),
            Function::Square => Arity::Between(1, 3),
            Function::Ramp => Arity::Between(2, 3),
            Function::Curve => Arity::Between(3, 4),
            Function::Noise => Arity::Exact(0),
            Function::Rand | Function::Pow => Arity::Exact(2),
            Function::Choose => Arity::AtLeast(1),
            Function::Quant
            | Function::Round
            | Function::Floor
            | Function::Ceil
            | Function::Abs => Arity::Exact(1),
            Function::Min | Function::Max => Arity::AtLeast(2),
        }
    }

    /// Check an argument count against [`Function::arity`].
    pub fn check_arity(self, count: usize) -> Result<(), EvalError> {
        let arity = self.arity();
        if arity.accepts(count) {
            Ok(())
        } else {
            Err(EvalError::arity(self.name(), arity, count))
        }
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

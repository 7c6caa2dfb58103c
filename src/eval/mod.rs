//! Expression evaluation — context, built-in functions, and the tree walker.

pub mod context;
pub mod error;
pub mod evaluator;
pub mod function;

pub use context::{note_properties, Domain, EvalContext, VariableBag};
pub use error::{EvalError, EvalErrorKind};
pub use evaluator::{evaluate_expression, evaluate_function, quantize, Evaluator};
pub use function::{Arity, Function};

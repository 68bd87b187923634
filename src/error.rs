use std::fmt;

/// Errors that can occur anywhere in the interpreter at the Rust level.
///
/// The reader, expander, and evaluator all unwind to their top-level entry
/// points by threading this through `Result`; the host never sees a panic
/// for malformed input.
#[derive(Debug, Clone, PartialEq)]
pub enum LispError {
    /// Could not open the file handed to `read_path`.
    FileOpen(String),

    /// The reader hit a `)` with no matching `(`.
    ParenUnexpected,

    /// Input ended inside a list; a `)` was still expected.
    ParenExpected,

    /// The lexer could not produce a token where one was required.
    BadToken,

    /// Malformed `(define ...)` form.
    BadDefine,

    /// Malformed `(set! var x)` form.
    BadSet,

    /// Malformed `(cond ...)` clause.
    BadCond,

    /// `(and)` with no operands.
    BadAnd,

    /// `(or)` with no operands.
    BadOr,

    /// Malformed `(let ...)` binding list.
    BadLet,

    /// Malformed `(lambda ...)` parameter list.
    BadLambda,

    /// `(quote ...)` with other than exactly one datum.
    BadQuote,

    /// Reference to a variable with no binding. Carries the symbol name.
    UnknownVar(String),

    /// Application of a value that is neither a lambda nor a primitive.
    BadOp,

    /// The evaluator was handed a value it cannot evaluate (e.g. a table).
    UnknownEval,

    /// A primitive was called with an argument of the wrong type.
    BadArg,

    /// An index was outside the valid range.
    OutOfBounds,
}

impl fmt::Display for LispError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LispError::FileOpen(path) => write!(f, "file error: could not open file: {}", path),
            LispError::ParenUnexpected => write!(f, "syntax error: unexpected ) paren"),
            LispError::ParenExpected => write!(f, "syntax error: expected ) paren"),
            LispError::BadToken => write!(f, "syntax error: bad token"),
            LispError::BadDefine => write!(f, "expand error: bad define (define var x)"),
            LispError::BadSet => write!(f, "expand error: bad set (set! var x)"),
            LispError::BadCond => write!(f, "expand error: bad cond"),
            LispError::BadAnd => write!(f, "expand error: bad and (and a b)"),
            LispError::BadOr => write!(f, "expand error: bad or (or a b)"),
            LispError::BadLet => write!(f, "expand error: bad let"),
            LispError::BadLambda => write!(f, "expand error: bad lambda"),
            LispError::BadQuote => write!(f, "expand error: bad quote (quote x)"),
            LispError::UnknownVar(name) => write!(f, "eval error: unknown variable '{}'", name),
            LispError::BadOp => write!(f, "eval error: application was not an operator"),
            LispError::UnknownEval => write!(f, "eval error: got into a bad state"),
            LispError::BadArg => write!(f, "func error: bad argument type"),
            LispError::OutOfBounds => write!(f, "func error: index out of bounds"),
        }
    }
}

impl std::error::Error for LispError {}

pub type Result<T> = std::result::Result<T, LispError>;

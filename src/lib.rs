//! slip — an embeddable S-expression interpreter.
//!
//! The interpreter core: a tagged value model over a paged two-space heap,
//! a copying garbage collector with on-the-fly table resizing, a streaming
//! lexer and reader, a macro expander that lowers surface forms to a small
//! primitive language, and a trampolined tree-walking evaluator with
//! lexical environments.
//!
//! Hosts drive it through [`eval::Interp`]:
//!
//! ```
//! use slip::eval::Interp;
//!
//! let mut interp = Interp::new();
//! let result = interp.run("(+ 1 2 3)").unwrap();
//! assert_eq!(slip::printer::print_val(&interp.heap, result), "6");
//! ```
//!
//! Collection happens only when the host asks for it, between top-level
//! expressions: `interp.collect(root)` relocates everything reachable from
//! the symbol table, the global environment, and `root`, and returns the
//! forwarded root. Any other handle held across a collection is invalid.

pub mod error;
pub mod eval;
pub mod expand;
pub mod globals;
pub mod heap;
pub mod lexer;
pub mod printer;
pub mod primitives;
pub mod reader;
pub mod symbol;
pub mod table;
pub mod value;

pub use error::{LispError, Result};
pub use eval::Interp;
pub use value::Value;

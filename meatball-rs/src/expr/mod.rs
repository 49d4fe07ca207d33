//! The s-expression macro language.
//!
//! - [`parser`]: text → [`Node`]
//! - [`eval`]: [`Node`] → [`Value`](crate::value::Value), against a context
//!   and a function table
//! - [`builtins`]: the function library the standard engines contribute
//! - [`function`]: callable handles and function tables
//!
//! # Quick start
//!
//! ```rust
//! use meatball::context::ContextResolver;
//! use meatball::env::ProcessEnv;
//! use meatball::expr::{builtins, Evaluator, FunctionTable};
//! use meatball::value::Value;
//!
//! let functions: FunctionTable = builtins::SEXPR.iter().copied().collect();
//! let mut ctx = ContextResolver::default();
//! ctx.set("x", Value::Int(6));
//! let v = Evaluator::new(&ctx, &functions, &ProcessEnv).eval_str("(* x 7)").unwrap();
//! assert_eq!(v, Value::Int(42));
//! ```

pub mod builtins;
pub mod eval;
pub mod function;
pub mod parser;

// Re-exports for convenience.
pub use eval::{evaluate, Evaluator};
pub use function::{Builtin, CallEnv, Callable, FunctionLookup, FunctionTable};
pub use parser::{parse, Atom, Node};

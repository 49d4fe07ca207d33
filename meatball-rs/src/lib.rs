//! Macro and expression preprocessor for YAML configuration documents.
//!
//! A document passes through once; string scalars, inline mappings and
//! sequences that look like macros are replaced by their values, everything
//! else comes out unchanged.
//!
//! ```rust
//! use meatball::{process_yaml, ContextResolver, Value};
//!
//! let mut ctx = ContextResolver::default();
//! ctx.set("base", "https://cdn.example.com");
//! let doc = process_yaml(
//!     "port: 8000\nnext: (+ port 1)\nscript: (concat base /app.js)\n",
//!     &mut ctx,
//! )
//! .unwrap();
//! let map = doc.as_map().unwrap();
//! assert_eq!(map["next"], Value::Int(8001));
//! assert_eq!(map["script"], Value::str("https://cdn.example.com/app.js"));
//! ```
//!
//! # Modules
//!
//! | Module         | Role                                                 |
//! |----------------|------------------------------------------------------|
//! | [`value`]      | runtime value and document node                      |
//! | [`context`]    | variables, dotted/bracketed paths, aliases           |
//! | [`expr`]       | s-expression parser, evaluator, built-ins            |
//! | [`template`]   | `py`/`js`/`go` placeholder substitution              |
//! | [`engine`]     | the engine capability and the standard engines       |
//! | [`registry`]   | engine and function tables                           |
//! | [`plugin`]     | process-wide user functions                          |
//! | [`preprocess`] | the document pass                                    |
//! | [`pipeline`]   | post-expansion steps                                 |

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod env;
pub mod error;
pub mod expr;
pub mod literal;
#[cfg(feature = "lua")]
pub mod lua;
pub mod pipeline;
pub mod plugin;
pub mod preprocess;
pub mod registry;
pub mod stack;
pub mod template;
pub mod value;

pub use context::{Context, ContextResolver};
pub use engine::MacroEngine;
pub use error::{EvalError, ParseError, PreprocessError, ResolveError};
pub use preprocess::{process_value, process_yaml, Preprocessor};
pub use registry::MacroRegistry;
pub use value::{Map, Value};

//! Process-wide plugin functions.
//!
//! Plugins are consulted by every [`MacroRegistry`](crate::registry::MacroRegistry)
//! for names its own table doesn't have.  Registration is additive and
//! unchecked: registering a name again replaces the earlier function.
//!
//! ```rust
//! use meatball::plugin;
//! use meatball::value::Value;
//!
//! plugin::register("shout", |args| {
//!     let text = args.first().map(Value::to_string).unwrap_or_default();
//!     Ok(Value::Str(text.to_uppercase()))
//! });
//! assert!(plugin::get("shout").is_some());
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

use parking_lot::RwLock;
use tracing::debug;

use crate::expr::Callable;
use crate::value::Value;

static PLUGINS: LazyLock<RwLock<HashMap<String, Callable>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register `f` under `name`.
pub fn register<F>(name: &str, f: F)
where
    F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
{
    register_callable(name, Callable::plugin(name, f));
}

/// Register an existing callable under `name`.
pub fn register_callable(name: &str, callable: Callable) {
    debug!(name, "register plugin");
    PLUGINS.write().insert(name.to_owned(), callable);
}

pub fn get(name: &str) -> Option<Callable> {
    PLUGINS.read().get(name).cloned()
}

/// Names of all registered plugins, sorted.
pub fn names() -> Vec<String> {
    let mut names: Vec<String> = PLUGINS.read().keys().cloned().collect();
    names.sort();
    names
}

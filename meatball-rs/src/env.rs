//! Environment lookup capability used by the `env` built-in.
//!
//! The core never reads the process environment directly; it asks an
//! [`Environment`].  [`ProcessEnv`] is the default, [`MapEnv`] a fixed table
//! for tests and sandboxed hosts.

use std::collections::HashMap;

pub trait Environment: Send + Sync {
    /// Value of `name`, or `None` when unset.
    fn lookup(&self, name: &str) -> Option<String>;
}

/// Reads the real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// A fixed name → value table.
#[derive(Debug, Default, Clone)]
pub struct MapEnv {
    vars: HashMap<String, String>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }
}

impl Environment for MapEnv {
    fn lookup(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }
}

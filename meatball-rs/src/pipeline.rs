//! Post-expansion processing.
//!
//! [`ShadowProcessor`] runs macro expansion and then a list of caller steps,
//! each receiving the previous step's output and the pass's context.  The
//! context still holds the untouched source under
//! [`ORIGINAL_YAML_KEY`](crate::preprocess::ORIGINAL_YAML_KEY), so steps can
//! compare expanded and original values; [`compare_field`] does exactly that
//! for one top-level field.

use std::sync::Arc;

use tracing::debug;

use crate::context::ContextResolver;
use crate::error::PreprocessError;
use crate::preprocess::{Preprocessor, ORIGINAL_YAML_KEY};
use crate::registry::MacroRegistry;
use crate::value::Value;

/// A step applied to the expanded document.
pub type Step = Box<dyn Fn(Value, &mut ContextResolver) -> Value + Send + Sync>;

#[derive(Default)]
pub struct ShadowProcessor {
    preprocessor: Preprocessor,
    steps: Vec<Step>,
}

impl ShadowProcessor {
    pub fn new(registry: Arc<MacroRegistry>) -> Self {
        ShadowProcessor { preprocessor: Preprocessor::new(registry), steps: Vec::new() }
    }

    /// Append a step; steps run in insertion order.
    pub fn add_step<F>(&mut self, step: F)
    where
        F: Fn(Value, &mut ContextResolver) -> Value + Send + Sync + 'static,
    {
        self.steps.push(Box::new(step));
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Expand `text`, then thread the result through every step.
    pub fn run(&self, text: &str, context: &mut ContextResolver) -> Result<Value, PreprocessError> {
        let mut data = self.preprocessor.process_yaml(text, context)?;
        for (i, step) in self.steps.iter().enumerate() {
            debug!(step = i, "pipeline step");
            data = step(data, context);
        }
        Ok(data)
    }
}

/// Build a [`ShadowProcessor`] over the process-wide registry and run it.
pub fn run_pipeline(
    text: &str,
    steps: Vec<Step>,
    context: &mut ContextResolver,
) -> Result<Value, PreprocessError> {
    let processor = ShadowProcessor { steps, ..ShadowProcessor::default() };
    processor.run(text, context)
}

/// Expand `text` and return the top-level `field` as it came out of
/// expansion, alongside its value in the original document.  Either side is
/// `Null` when absent.
pub fn compare_field(text: &str, field: &str) -> Result<(Value, Value), PreprocessError> {
    let mut context = ContextResolver::default();
    let processed = Preprocessor::default().process_yaml(text, &mut context)?;
    let original = match context.get(ORIGINAL_YAML_KEY) {
        Some(Value::Str(source)) => Value::from(serde_yaml::from_str::<serde_yaml::Value>(source)?),
        _ => Value::Null,
    };
    let field_of = |v: &Value| v.as_map().and_then(|m| m.get(field)).cloned().unwrap_or_default();
    Ok((field_of(&processed), field_of(&original)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

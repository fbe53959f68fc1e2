//! Host-provided callables for `call_js_function` steps, looked up by name.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::StepError;

/// A registered function: positional arguments in, optional value out.
pub type HostFunction = Arc<dyn Fn(&[Value]) -> Result<Option<Value>, String> + Send + Sync>;

#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, HostFunction>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.functions.keys()).finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `f` under `name`, replacing any previous registration.
    pub fn register<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
        where F: Fn(&[Value]) -> Result<Option<Value>, String> + Send + Sync + 'static
    {
        self.functions.insert(name.into(), Arc::new(f));
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn call(&self, name: &str, args: &[Value]) -> Result<Option<Value>, StepError> {
        let f = self.functions
                    .get(name)
                    .ok_or_else(|| StepError::UnknownFunction(name.to_string()))?;
        f(args).map_err(|message| StepError::FunctionFailed { name: name.to_string(),
                                                              message })
    }
}

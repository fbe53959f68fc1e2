use mapflow_core::schema::CallFunctionConfig;
use mapflow_core::WorkflowInstance;

use crate::error::StepError;
use crate::registry::FunctionRegistry;
use crate::view::ActionOutcome;

/// Invokes the registered function with `parameters` read from state (dotted
/// paths, `null` when unresolved). A returned value lands in
/// `target_variable` when the step declares one.
pub fn call(instance: &mut WorkflowInstance, cfg: &CallFunctionConfig, registry: &FunctionRegistry) -> Result<ActionOutcome, StepError> {
    let args = instance.state().values_for(&cfg.parameters);
    let result = registry.call(&cfg.js_function, &args)?;
    if let (Some(target), Some(value)) = (&cfg.target_variable, &result) {
        instance.state_mut().set_key(target.clone(), value.clone());
    }
    Ok(ActionOutcome::Called(result))
}

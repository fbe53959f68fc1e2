use mapflow_core::schema::ChoiceConfig;
use mapflow_core::{StepDefinition, WorkflowInstance};

use crate::error::StepError;
use crate::view::{ActionOutcome, OptionView, StepView};

pub fn view(step: &StepDefinition, cfg: &ChoiceConfig) -> StepView {
    StepView::Choice { title: step.name.clone(),
                       description: step.description.clone(),
                       options: cfg.options
                                   .iter()
                                   .map(|o| OptionView { label: o.name.clone(),
                                                         description: o.description.clone(),
                                                         target: o.next_step })
                                   .collect() }
}

/// Jumps to the option's own target, bypassing the step's `next_step`.
pub fn choose(instance: &mut WorkflowInstance, cfg: &ChoiceConfig, position: usize) -> Result<ActionOutcome, StepError> {
    let option = cfg.options
                    .get(position)
                    .ok_or_else(|| StepError::Validation(format!("no option #{position} ({} available)", cfg.options.len())))?;
    Ok(ActionOutcome::Moved(instance.do_next(Some(option.next_step))?))
}

//! Asocia el step actual con su handler.
//!
//! Entrar en un step es sans-IO: [`StepDispatcher::enter`] devuelve una vista
//! de inmediato o describe la petición que el step necesita. El host la
//! ejecuta y entrega el resultado a [`StepDispatcher::complete`], que lo
//! descarta si el flujo avanzó mientras tanto. [`StepDispatcher::drive`] hace
//! el viaje completo sobre un [`Transport`].

use log::{debug, warn};
use mapflow_core::{StepBody, StepDefinition, StepGuard, WorkflowError, WorkflowInstance};
use serde_json::{Map, Value};

use crate::error::StepError;
use crate::handlers::query::QueryKind;
use crate::handlers::{call, choice, data, form, query, transfer};
use crate::registry::FunctionRegistry;
use crate::transport::{RequestError, Transport};
use crate::view::{ActionOutcome, StepView, UserAction};

/// A read the current step is waiting for.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    pub guard: StepGuard,
    pub url: String,
    pub query: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepPlan {
    Ready(StepView),
    Fetch(PendingRequest),
}

#[derive(Debug, Clone, Default)]
pub struct StepDispatcher {
    functions: FunctionRegistry,
}

impl StepDispatcher {
    pub fn new(functions: FunctionRegistry) -> Self {
        Self { functions }
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionRegistry {
        &mut self.functions
    }

    pub fn enter(&self, instance: &WorkflowInstance) -> StepPlan {
        let Some(step) = instance.current_step() else {
            return StepPlan::Ready(StepView::Closed);
        };
        let title = step.name.clone();
        let view = match &step.body {
            StepBody::Choice(c) => choice::view(step, c),
            StepBody::Form(f) => form::view(step, f),
            StepBody::JsonForm(j) => form::json_view(step, j),
            StepBody::SelectQuery(q) | StepBody::MultiSelectQuery(q) | StepBody::TableQuery(q) => {
                return StepPlan::Fetch(query::request(instance, &q.source));
            }
            StepBody::GetData(g) => return StepPlan::Fetch(query::request(instance, &g.source)),
            StepBody::Service(s) => StepView::Service { title,
                                                        service: s.service.clone(),
                                                        params: instance.state().params_from(&s.request_params) },
            StepBody::DownloadFile(r) => StepView::Download { title,
                                                              file_name: r.file_name.clone() },
            StepBody::UploadFile(_) => StepView::Upload { title },
            StepBody::HttpPost(_) => StepView::Post { title },
            StepBody::CallFunction(c) => StepView::Call { title,
                                                          function: c.js_function.clone() },
            StepBody::Progress(c) => StepView::Progress { title,
                                                          config: c.clone() },
            StepBody::Text(_) => StepView::Text { title,
                                                  description: step.description.clone() },
            StepBody::Custom(c) => StepView::Custom { title,
                                                      config: c.clone() },
            StepBody::Unknown { type_name, .. } => {
                warn!("unknown step type '{type_name}' in step '{}'", step.name);
                StepView::Unknown { type_name: type_name.clone() }
            }
        };
        StepPlan::Ready(view)
    }

    /// Renders the response of `pending`. Returns [`StepView::Stale`] when
    /// the instance closed or moved since the request was planned.
    pub fn complete(&self,
                    instance: &WorkflowInstance,
                    pending: &PendingRequest,
                    result: Result<Option<Value>, RequestError>)
                    -> StepView {
        if !instance.matches(&pending.guard) {
            debug!("dropping stale response for {}", pending.url);
            return StepView::Stale;
        }
        let Some(step) = instance.current_step() else {
            return StepView::Stale;
        };
        let response = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("request to {} failed: {e}", pending.url);
                return StepError::from(e).to_view();
            }
        };
        match &step.body {
            StepBody::SelectQuery(q) => query::render(step, q, QueryKind::Select, response),
            StepBody::MultiSelectQuery(q) => query::render(step, q, QueryKind::MultiSelect, response),
            StepBody::TableQuery(q) => query::render(step, q, QueryKind::Table, response),
            StepBody::GetData(g) => data::render(step, g, response),
            _ => match self.enter(instance) {
                StepPlan::Ready(view) => view,
                StepPlan::Fetch(_) => StepView::Stale,
            },
        }
    }

    /// `enter`, then the fetch if one is needed, then `complete`.
    pub async fn drive(&self, instance: &WorkflowInstance, transport: &dyn Transport) -> StepView {
        let pending = match self.enter(instance) {
            StepPlan::Ready(view) => return view,
            StepPlan::Fetch(p) => p,
        };
        if !transport.session_check().await {
            return StepView::AuthRequired;
        }
        debug!("GET {} {:?}", pending.url, pending.query);
        let result = transport.fetch_json(&pending.url, &pending.query).await;
        self.complete(instance, &pending, result)
    }

    /// `Next` on these steps does not navigate: unknown types are blocked and
    /// transfer steps without a `next_step` just clear the interaction area.
    pub fn hold_on_next(step: &StepDefinition) -> Option<ActionOutcome> {
        match &step.body {
            StepBody::Unknown { .. } => Some(ActionOutcome::Blocked),
            StepBody::DownloadFile(_) | StepBody::UploadFile(_) if step.next_step.is_none() => Some(ActionOutcome::Cleared),
            _ => None,
        }
    }

    /// `Previous` is blocked when there is history but the current step does
    /// not declare a non-negative `previous_step`.
    pub fn hold_on_previous(instance: &WorkflowInstance) -> Option<ActionOutcome> {
        (instance.has_previous_step() && !instance.can_go_back()).then_some(ActionOutcome::Blocked)
    }

    /// Applies a user action to the current step.
    pub async fn act(&self,
                     instance: &mut WorkflowInstance,
                     action: UserAction,
                     transport: &dyn Transport)
                     -> Result<ActionOutcome, StepError> {
        let step = instance.current_step()
                           .cloned()
                           .ok_or(StepError::Navigation(WorkflowError::NoActiveWorkflow))?;
        let not_applicable = StepError::NotApplicable { action: action.name(),
                                                        step_type: step.type_name().to_string() };
        match (action, &step.body) {
            (UserAction::Previous, _) => match Self::hold_on_previous(instance) {
                Some(held) => Ok(held),
                None => {
                    instance.do_previous()?;
                    Ok(ActionOutcome::Back(instance.current_index()))
                }
            },
            (UserAction::Next, _) => match Self::hold_on_next(&step) {
                Some(held) => Ok(held),
                None => Ok(ActionOutcome::Moved(instance.do_next(None)?)),
            },
            (UserAction::Choose(i), StepBody::Choice(c)) => choice::choose(instance, c, i),
            (UserAction::SubmitForm(pairs), StepBody::Form(f)) => form::submit(instance, f, pairs),
            (UserAction::SubmitJson(v), StepBody::JsonForm(j)) => form::submit_json(instance, j, v),
            (UserAction::Select(values), StepBody::SelectQuery(q)) => query::select(instance, q, false, values),
            (UserAction::Select(values), StepBody::MultiSelectQuery(q) | StepBody::TableQuery(q)) => {
                query::select(instance, q, true, values)
            }
            (UserAction::Download, StepBody::DownloadFile(r)) => transfer::download(instance, r, transport).await,
            (UserAction::UploadFile { name, bytes }, StepBody::UploadFile(r)) => {
                transfer::upload(instance, r, name, bytes, transport).await
            }
            (UserAction::Post, StepBody::HttpPost(r)) => transfer::post(instance, r, transport).await,
            (UserAction::Call, StepBody::CallFunction(c)) => call::call(instance, c, &self.functions),
            _ => Err(not_applicable),
        }
    }
}

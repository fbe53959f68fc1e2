//! Esquema de steps: la descripción del flujo de un servicio que entrega el servidor.

mod body;
mod next;
mod service;
mod step;

pub use body::{CallFunctionConfig, ChoiceConfig, ChoiceOption, DataSource, Extra, FieldType, FormConfig, FormField, GetDataConfig,
               JsonFormConfig, QueryConfig, RequestConfig, ServiceConfig, StepBody};
pub use next::{BranchSpec, ElseTarget, NextStep};
pub use service::{ServiceCatalog, ServiceDefinition, SchemaIssue, SchemaReport, Severity};
pub use step::StepDefinition;

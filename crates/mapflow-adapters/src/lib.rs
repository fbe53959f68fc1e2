//! mapflow-adapters: handlers de steps y la frontera con el backend.
//!
//! - [`StepDispatcher`]: un handler por tipo de step, entrada sans-IO más
//!   completado protegido por guardas.
//! - [`Transport`]: sonda de sesión, fetch/post JSON y comandos con nombre.
//! - [`FunctionRegistry`]: funciones del host para steps `call_js_function`.
//! - [`RemoteWorkflowStore`]: snapshots persistidos mediante comandos del backend.

pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod remote_store;
pub mod transport;
pub mod view;

pub use dispatcher::{PendingRequest, StepDispatcher, StepPlan};
pub use error::StepError;
pub use registry::FunctionRegistry;
pub use remote_store::{RemoteStoreError, RemoteWorkflowStore};
pub use transport::{CannedTransport, RecordedCall, RequestError, Transport};
pub use view::{ActionOutcome, DataNode, ItemView, OptionView, StepView, UserAction};

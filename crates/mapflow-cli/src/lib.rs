//! Operator commands for mapflow: check a service file, dry-run branch
//! resolution, and inspect the Postgres snapshot store.
//!
//! Exit codes: 0 ok, 2 usage, 4 not found / rejected, 5 backend error.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::debug;
use mapflow_core::{Route, ServiceCatalog, WorkflowState, WorkflowStore, WorkflowSummary};
use mapflow_persistence::{build_dev_pool_from_env, PgWorkflowStore, PoolProvider};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "mapflow-cli", version, about = "Inspect mapflow services and persisted workflows")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check every service in a catalog file.
    Validate { file: PathBuf },
    /// Resolve the next step of one step against a given state.
    Resolve {
        file: PathBuf,
        /// Service position in the catalog.
        #[arg(long, default_value_t = 0)]
        service: usize,
        #[arg(long)]
        step: usize,
        /// State as a JSON object.
        #[arg(long, default_value = "{}")]
        state: String,
    },
    /// List persisted workflows, newest first.
    List,
    /// Print one persisted snapshot.
    Show { uuid: Uuid },
    /// Remove one persisted snapshot.
    Delete { uuid: Uuid },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("usage: {0}")]
    Usage(String),
    #[error("{0}")]
    NotFound(String),
    #[error("rejected: {0}")]
    Rejected(String),
    #[error("backend: {0}")]
    Backend(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => 2,
            CliError::NotFound(_) | CliError::Rejected(_) => 4,
            CliError::Backend(_) => 5,
        }
    }
}

/// Runs one command; the returned lines go to stdout.
pub fn run(command: Command) -> Result<Vec<String>, CliError> {
    match command {
        Command::Validate { file } => validate(&load_catalog(&file)?),
        Command::Resolve { file, service, step, state } => {
            let state = parse_state(&state)?;
            resolve(&load_catalog(&file)?, service, step, &state).map(|v| vec![v.to_string()])
        }
        Command::List => Ok(list(&open_store()?)?.iter().map(summary_line).collect()),
        Command::Show { uuid } => {
            let store = open_store()?;
            let snapshot = store.load(uuid)
                                .map_err(|e| CliError::Backend(e.to_string()))?
                                .ok_or_else(|| CliError::NotFound(format!("workflow {uuid} not found")))?;
            let pretty = serde_json::to_string_pretty(&snapshot).map_err(|e| CliError::Backend(e.to_string()))?;
            Ok(vec![pretty])
        }
        Command::Delete { uuid } => {
            let mut store = open_store()?;
            match store.delete(uuid) {
                Ok(true) => Ok(vec![format!("deleted {uuid}")]),
                Ok(false) => Err(CliError::NotFound(format!("workflow {uuid} not found"))),
                Err(e) => Err(CliError::Backend(e.to_string())),
            }
        }
    }
}

pub fn load_catalog(path: &Path) -> Result<ServiceCatalog, CliError> {
    let raw = fs::read_to_string(path).map_err(|e| CliError::NotFound(format!("{}: {e}", path.display())))?;
    ServiceCatalog::from_json_str(&raw).map_err(|e| CliError::Rejected(format!("{}: {e}", path.display())))
}

pub fn parse_state(raw: &str) -> Result<WorkflowState, CliError> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(WorkflowState::from(map)),
        Ok(other) => Err(CliError::Usage(format!("--state must be a JSON object, got {other}"))),
        Err(e) => Err(CliError::Usage(format!("--state: {e}"))),
    }
}

/// One line per service; any fatal issue rejects the whole file.
pub fn validate(catalog: &ServiceCatalog) -> Result<Vec<String>, CliError> {
    let mut lines = Vec::new();
    let mut fatal = 0;
    for (i, service) in catalog.iter().enumerate() {
        let report = service.inspect();
        if report.is_fatal() {
            fatal += 1;
            lines.push(format!("[{i}] {}: invalid", service.name));
            lines.extend(report.issues.iter().map(|issue| format!("    {:?}: {issue}", issue.severity())));
        } else {
            lines.push(format!("[{i}] {}: ok ({} steps, {} warning(s))",
                               service.name,
                               service.len(),
                               report.warnings().count()));
            lines.extend(report.warnings().map(|w| format!("    warning: {w}")));
        }
    }
    if fatal > 0 {
        return Err(CliError::Rejected(format!("{fatal} invalid service(s)\n{}", lines.join("\n"))));
    }
    Ok(lines)
}

pub fn resolve(catalog: &ServiceCatalog, service: usize, step: usize, state: &WorkflowState) -> Result<Value, CliError> {
    let def = catalog.get(service)
                     .ok_or_else(|| CliError::NotFound(format!("no service at index {service}")))?;
    let step_def = def.step(step)
                      .ok_or_else(|| CliError::NotFound(format!("service {service} has no step {step}")))?;
    let resolution = step_def.resolve_next(state);
    debug!("resolved step {step} of service {service}: {resolution:?}");
    let route = match resolution.route {
        Route::Explicit => json!("explicit"),
        Route::Fixed => json!("fixed"),
        Route::Rule { entry } => json!({"rule": entry}),
        Route::Else => json!("else"),
        Route::Unresolved => json!("unresolved"),
    };
    let target_name = resolution.target
                                .and_then(|t| usize::try_from(t).ok())
                                .and_then(|t| def.step(t))
                                .map(|s| s.name.clone());
    let skipped: Vec<Value> = resolution.skipped
                                        .iter()
                                        .map(|s| json!({"entry": s.entry, "error": s.error.to_string()}))
                                        .collect();
    Ok(json!({
        "step": step_def.name,
        "target": resolution.target,
        "target_name": target_name,
        "route": route,
        "skipped": skipped,
    }))
}

fn open_store() -> Result<PgWorkflowStore<PoolProvider>, CliError> {
    if std::env::var("DATABASE_URL").is_err() {
        return Err(CliError::Rejected("DATABASE_URL is required for persisted workflows".into()));
    }
    let pool = build_dev_pool_from_env().map_err(|e| CliError::Backend(format!("pool error: {e}")))?;
    Ok(PgWorkflowStore::new(PoolProvider { pool }))
}

fn list<S: WorkflowStore>(store: &S) -> Result<Vec<WorkflowSummary>, CliError> {
    store.list().map_err(|e| CliError::Backend(e.to_string()))
}

pub fn summary_line(s: &WorkflowSummary) -> String {
    format!("{}  {}  service={}  resumable={}  {}",
            s.uuid,
            s.saved_at.to_rfc3339(),
            s.service_index,
            s.resumable,
            s.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_must_be_an_object() {
        assert!(parse_state(r#"{"a": 1}"#).is_ok());
        assert_eq!(parse_state("[1]").unwrap_err().exit_code(), 2);
        assert_eq!(parse_state("{").unwrap_err().exit_code(), 2);
    }

    #[test]
    fn missing_catalog_is_not_found() {
        let err = load_catalog(Path::new("/nonexistent/services.json")).unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn clap_parses_resolve() {
        let cli = Cli::try_parse_from(["mapflow-cli", "resolve", "s.json", "--step", "2", "--state", "{}"]).unwrap();
        assert!(matches!(cli.command, Command::Resolve { step: 2, service: 0, .. }));
        assert!(Cli::try_parse_from(["mapflow-cli", "show", "not-a-uuid"]).is_err());
    }
}

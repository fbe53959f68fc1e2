use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use super::body::StepBody;
use super::next::NextStep;
use super::step::StepDefinition;
use crate::hashing::hash_value;
use crate::rules::{validate_branch_rule, RuleValidationError};

/// A launchable service: metadata plus its ordered step list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub workflow: Vec<StepDefinition>,
    #[serde(default)]
    pub resumable: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Navigation can still work around it.
    Warning,
    /// Some path through the workflow is broken.
    Fatal,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaIssue {
    #[error("workflow has no steps")]
    EmptyWorkflow,
    #[error("step {step}: {field} = {index} is outside the workflow ({len} steps)")]
    IndexOutOfRange {
        step: usize,
        field: String,
        index: i64,
        len: usize,
    },
    #[error("step {step}: branch entry #{entry} is invalid: {error}")]
    InvalidRule {
        step: usize,
        entry: usize,
        error: RuleValidationError,
    },
    #[error("step {step}: choice step has no options")]
    NoOptions { step: usize },
    #[error("step {step}: request url is empty")]
    EmptyUrl { step: usize },
    #[error("step {step}: form field #{field} has no name")]
    UnnamedField { step: usize, field: usize },
    #[error("step {step}: no function name given")]
    MissingFunction { step: usize },
    #[error("step {step}: unknown step type '{type_name}'")]
    UnknownType { step: usize, type_name: String },
}

impl SchemaIssue {
    pub fn severity(&self) -> Severity {
        match self {
            SchemaIssue::InvalidRule { .. } | SchemaIssue::UnknownType { .. } => Severity::Warning,
            _ => Severity::Fatal,
        }
    }
}

/// All issues found in one service definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaReport {
    pub issues: Vec<SchemaIssue>,
}

impl SchemaReport {
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn is_fatal(&self) -> bool {
        self.issues.iter().any(|i| i.severity() == Severity::Fatal)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SchemaIssue> {
        self.issues.iter().filter(|i| i.severity() == Severity::Warning)
    }
}

impl fmt::Display for SchemaReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.issues.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SchemaReport {}

impl ServiceDefinition {
    pub fn new(name: impl Into<String>, workflow: Vec<StepDefinition>) -> Self {
        Self { name: name.into(),
               description: String::new(),
               workflow,
               resumable: false,
               extra: Map::new() }
    }

    pub fn len(&self) -> usize {
        self.workflow.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workflow.is_empty()
    }

    pub fn step(&self, index: usize) -> Option<&StepDefinition> {
        self.workflow.get(index)
    }

    /// blake3 fingerprint of the canonical JSON form. Stored with snapshots
    /// so a definition change between save and resume can be detected.
    pub fn definition_hash(&self) -> String {
        hash_value(&serde_json::to_value(self).unwrap_or_default())
    }

    /// Every issue in the definition; empty when it is sound.
    pub fn inspect(&self) -> SchemaReport {
        let mut issues = Vec::new();
        if self.workflow.is_empty() {
            issues.push(SchemaIssue::EmptyWorkflow);
        }
        let len = self.workflow.len();
        for (i, step) in self.workflow.iter().enumerate() {
            Self::check_step(i, step, len, &mut issues);
        }
        SchemaReport { issues }
    }

    /// `Ok` only when no issue at all was found. Callers that tolerate
    /// warnings check [`SchemaReport::is_fatal`] on the error.
    pub fn validate(&self) -> Result<(), SchemaReport> {
        let report = self.inspect();
        if report.is_empty() {
            Ok(())
        } else {
            Err(report)
        }
    }

    fn check_step(step: usize, def: &StepDefinition, len: usize, issues: &mut Vec<SchemaIssue>) {
        let mut target = |field: String, index: i64| {
            if index >= 0 && index as usize >= len {
                issues.push(SchemaIssue::IndexOutOfRange { step, field, index, len });
            }
        };

        if let Some(p) = def.previous_step {
            target("previous_step".into(), p);
        }
        let mut rule_errors = Vec::new();
        match &def.next_step {
            Some(NextStep::Index(n)) => target("next_step".into(), *n),
            Some(NextStep::Branch(spec)) => {
                for (entry, raw) in spec.rules.iter().enumerate() {
                    match validate_branch_rule(raw) {
                        Ok(rule) => target(format!("next_step.if[{entry}].then"), rule.then),
                        Err(error) => rule_errors.push(SchemaIssue::InvalidRule { step, entry, error }),
                    }
                }
                if let Some(e) = &spec.otherwise {
                    target("next_step.else.then".into(), e.then);
                }
            }
            None => {}
        }
        for (o, t) in def.option_targets().into_iter().enumerate() {
            target(format!("options[{o}].next_step"), t);
        }
        issues.extend(rule_errors);

        match &def.body {
            StepBody::Choice(c) if c.options.is_empty() => issues.push(SchemaIssue::NoOptions { step }),
            StepBody::Form(f) => {
                for (field, ff) in f.fields.iter().enumerate() {
                    if ff.name.trim().is_empty() {
                        issues.push(SchemaIssue::UnnamedField { step, field });
                    }
                }
            }
            StepBody::SelectQuery(q) | StepBody::MultiSelectQuery(q) | StepBody::TableQuery(q) if q.source.url.is_empty() => {
                issues.push(SchemaIssue::EmptyUrl { step })
            }
            StepBody::GetData(g) if g.source.url.is_empty() => issues.push(SchemaIssue::EmptyUrl { step }),
            StepBody::DownloadFile(r) | StepBody::UploadFile(r) | StepBody::HttpPost(r) if r.url.is_empty() => {
                issues.push(SchemaIssue::EmptyUrl { step })
            }
            StepBody::CallFunction(c) if c.js_function.trim().is_empty() => {
                issues.push(SchemaIssue::MissingFunction { step })
            }
            StepBody::Unknown { type_name, .. } => issues.push(SchemaIssue::UnknownType { step,
                                                                                         type_name: type_name.clone() }),
            _ => {}
        }
    }
}

/// Ordered list of services; workflows address their service by position.
#[derive(Debug, Clone, Default)]
pub struct ServiceCatalog {
    services: Vec<Arc<ServiceDefinition>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogDocument {
    List(Vec<ServiceDefinition>),
    Wrapped { services: Vec<ServiceDefinition> },
}

impl ServiceCatalog {
    pub fn new(services: Vec<ServiceDefinition>) -> Self {
        Self { services: services.into_iter().map(Arc::new).collect() }
    }

    /// Accepts either a bare array of services or `{"services": [...]}`.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        let doc: CatalogDocument = serde_json::from_str(s)?;
        Ok(match doc {
            CatalogDocument::List(v) | CatalogDocument::Wrapped { services: v } => Self::new(v),
        })
    }

    pub fn get(&self, index: usize) -> Option<Arc<ServiceDefinition>> {
        self.services.get(index).cloned()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.services.iter().position(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ServiceDefinition>> {
        self.services.iter()
    }
}

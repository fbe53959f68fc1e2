//! Reglas de bifurcación: árboles de predicados AND/OR sobre el estado del flujo.
//!
//! Las definiciones de steps traen sus entradas `if` como JSON crudo. Cada
//! entrada pasa por [`validate_branch_rule`] antes de evaluarse; una entrada
//! que no cumple la gramática se salta con un diagnóstico en lugar de hacer
//! fallar toda la resolución.
//!
//! Gramática:
//! - entrada de primer nivel: `{condition, rules, then}`
//! - grupo: `{condition: "AND" | "OR", rules: [nodo...]}`
//! - hoja: `{field, operator, value}`
//! - un nodo con clave `condition` es un grupo, si no una hoja; no se admiten
//!   otras propiedades en ningún nivel.

mod evaluate;
mod resolve;
mod types;
mod validate;

pub use evaluate::{evaluate, evaluate_node};
pub use resolve::{resolve_next_step, BranchResolution, Route, SkippedRule};
pub use types::{BranchRule, Condition, Operator, RuleGroup, RuleLeaf, RuleNode};
pub use validate::{validate_branch_rule, validate_rule_group, RuleValidationError};

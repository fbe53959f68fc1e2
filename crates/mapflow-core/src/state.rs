//! Estado acumulado del flujo.
//!
//! Cada step escribe aquí sus respuestas y los steps siguientes las leen, ya
//! sea para rellenar parámetros de peticiones o para evaluar reglas de
//! bifurcación. Las claves conservan el orden de inserción, así un snapshot
//! persistido se lee igual que como se construyó.
//!
//! Lectura y escritura son asimétricas a propósito:
//! - [`WorkflowState::get_path`] recorre una ruta con puntos (`a.b.c`) a través
//!   de objetos y arrays anidados;
//! - [`WorkflowState::set_key`] solo escribe una clave plana de primer nivel.
//!   Un nombre con puntos se guarda literal como una sola clave y entonces *no*
//!   es alcanzable con `get_path`.
//!
//! Las definiciones de steps escritas para el editor de mapas dependen de este
//! comportamiento, por eso las dos operaciones siguen separadas.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Read mapping declared by a step: `{request_or_target_name: state_field}`.
pub type ParamMapping = IndexMap<String, String>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowState(Map<String, Value>);

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact top-level lookup, no path traversal.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Dotted-path lookup. Object segments are keys, array segments are
    /// decimal indices. Any missing segment yields `None`.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut cursor = self.0.get(first)?;
        for segment in segments {
            cursor = match cursor {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(cursor)
    }

    /// Flat write; last write wins. Returns the previous value.
    pub fn set_key(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    /// Appends to a multi-valued key. A scalar already stored under `key` is
    /// promoted to a list first.
    pub fn push_value(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.0.get_mut(&key) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                self.0.insert(key, Value::Array(vec![value]));
            }
        }
    }

    /// Write mapping: every `(field, value)` pair becomes a flat key.
    pub fn apply<I>(&mut self, values: I) -> Vec<String>
        where I: IntoIterator<Item = (String, Value)>
    {
        let mut written = Vec::new();
        for (k, v) in values {
            written.push(k.clone());
            self.0.insert(k, v);
        }
        written
    }

    /// Read mapping: builds `{target: state[source]}` for every declared pair
    /// whose source resolves. Sources are dotted paths.
    pub fn params_from(&self, mapping: &ParamMapping) -> Map<String, Value> {
        mapping.iter()
               .filter_map(|(target, source)| self.get_path(source).map(|v| (target.clone(), v.clone())))
               .collect()
    }

    /// Positional lookup used for function-call parameters; unresolved paths
    /// become `null` so arity is preserved.
    pub fn values_for(&self, paths: &[String]) -> Vec<Value> {
        paths.iter()
             .map(|p| self.get_path(p).cloned().unwrap_or(Value::Null))
             .collect()
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Start over.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for WorkflowState {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

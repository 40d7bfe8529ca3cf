//! The learner's persistent variable namespace.

use std::collections::BTreeMap;

use crate::interp::modules;
use crate::interp::value::Value;

/// Ambient builtins entry that must never be visible to checks.
pub const BUILTINS_ENTRY: &str = "__builtins__";

/// Prefix applied to a goal's metavar when its marker is published.
pub const METAVAR_PREFIX: &str = "__";

/// Variable name to value mapping shared by every goal of a session.
///
/// Ordered by name so value-matching checks report matches deterministically.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    vars: BTreeMap<String, Value>,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.vars.insert(name.into(), value);
    }

    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.vars.remove(name)
    }

    /// Read-only view for checks.
    pub fn snapshot(&self) -> &BTreeMap<String, Value> {
        &self.vars
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Drop the ambient builtins entry if anything put it there.
    pub fn sanitize(&mut self) {
        self.vars.remove(BUILTINS_ENTRY);
    }

    /// Deep copy sharing no mutable containers with `self`.
    pub fn detached(&self) -> Workspace {
        Workspace {
            vars: self
                .vars
                .iter()
                .map(|(name, value)| (name.clone(), value.deep_copy()))
                .collect(),
        }
    }

    /// Bind a registered namespace under its own name. Returns `false` for
    /// unknown namespaces.
    pub fn inject_namespace(&mut self, name: &str) -> bool {
        match modules::lookup(name) {
            Some(namespace) => {
                self.define(name, Value::Module(namespace));
                true
            }
            None => false,
        }
    }

    /// Store a goal's marker under `__<metavar>` and return the bound name.
    pub fn publish(&mut self, metavar: &str, value: Value) -> String {
        let name = format!("{METAVAR_PREFIX}{metavar}");
        self.define(name.clone(), value);
        name
    }

    /// First variable, in name order, bound to a value equal to `target`.
    pub fn find_value(&self, target: &Value) -> Option<&str> {
        self.vars
            .iter()
            .find(|(_, value)| *value == target)
            .map(|(name, _)| name.as_str())
    }

    /// `str()` rendering of every binding, for prompt templates.
    pub fn template_context(&self) -> BTreeMap<String, String> {
        self.vars
            .iter()
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect()
    }
}

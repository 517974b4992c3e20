//! Host-side cache of the interpreter's bindings as display strings

use crate::lesson::plan::Step;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::trace;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableBinding {
    pub name: String,
    pub value: String,
}

/// How one binding changed while applying a snapshot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingChange {
    Created { name: String, value: String },
    Updated { name: String, old: String, new: String },
}

impl BindingChange {
    pub fn name(&self) -> &str {
        match self {
            BindingChange::Created { name, .. } | BindingChange::Updated { name, .. } => name,
        }
    }
}

/// Name → display value, in first-binding order.
///
/// Applying a snapshot only creates or overwrites entries; keys are never
/// removed because the interpreter's globals only grow within one run.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    bindings: Vec<VariableBinding>,
    index: FxHashMap<String, usize>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the snapshot taken after `step` executed.
    pub fn apply_diff(&mut self, step: &Step, snapshot: &[(String, String)]) -> Vec<BindingChange> {
        let changes = self.apply_snapshot(snapshot);
        trace!(
            line = step.line_number + 1,
            changed = changes.len(),
            "variable store updated"
        );
        changes
    }

    /// Overwrite every key present in `snapshot`, returning what changed
    pub fn apply_snapshot(&mut self, snapshot: &[(String, String)]) -> Vec<BindingChange> {
        let mut changes = Vec::new();
        for (name, value) in snapshot {
            match self.index.get(name) {
                Some(&i) => {
                    let binding = &mut self.bindings[i];
                    if binding.value != *value {
                        changes.push(BindingChange::Updated {
                            name: name.clone(),
                            old: std::mem::replace(&mut binding.value, value.clone()),
                            new: value.clone(),
                        });
                    }
                }
                None => {
                    self.index.insert(name.clone(), self.bindings.len());
                    self.bindings.push(VariableBinding {
                        name: name.clone(),
                        value: value.clone(),
                    });
                    changes.push(BindingChange::Created {
                        name: name.clone(),
                        value: value.clone(),
                    });
                }
            }
        }
        changes
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&i| self.bindings[i].value.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VariableBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        self.bindings.clear();
        self.index.clear();
    }

    /// `{"name": "value", ...}` in binding order, the explanation context
    /// for non-print steps
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .bindings
            .iter()
            .map(|b| (b.name.clone(), serde_json::Value::String(b.value.clone())))
            .collect();
        serde_json::Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_creates_then_updates() {
        let mut store = VariableStore::new();
        let changes = store.apply_snapshot(&snapshot(&[("x", "1")]));
        assert_eq!(
            changes,
            vec![BindingChange::Created {
                name: "x".into(),
                value: "1".into()
            }]
        );

        let changes = store.apply_snapshot(&snapshot(&[("x", "2"), ("y", "3")]));
        assert_eq!(changes.len(), 2);
        assert!(matches!(&changes[0], BindingChange::Updated { old, new, .. } if old == "1" && new == "2"));
        assert_eq!(store.get("x"), Some("2"));
        assert_eq!(store.get("y"), Some("3"));
    }

    #[test]
    fn test_never_removes_keys() {
        let mut store = VariableStore::new();
        store.apply_snapshot(&snapshot(&[("a", "1"), ("b", "2")]));
        store.apply_snapshot(&snapshot(&[("b", "5")]));
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("a"), Some("1"));
    }

    #[test]
    fn test_unchanged_values_report_nothing() {
        let mut store = VariableStore::new();
        store.apply_snapshot(&snapshot(&[("a", "1")]));
        assert!(store.apply_snapshot(&snapshot(&[("a", "1")])).is_empty());
    }

    #[test]
    fn test_json_keeps_binding_order() {
        let mut store = VariableStore::new();
        store.apply_snapshot(&snapshot(&[("length", "10"), ("breadth", "20"), ("area", "200")]));
        assert_eq!(
            store.to_json().to_string(),
            r#"{"length":"10","breadth":"20","area":"200"}"#
        );
    }
}

//! Variable container for expression values.
//!
//! An expression such as `temp.a + temp.b` declares its variables when it is
//! parsed. They start out unassigned; callers bind them one by one and the
//! expression can be evaluated once every name holds a value.

use indexmap::IndexMap;

use super::value::{EvalError, EvalResult, Value};

/// Named, possibly unassigned variable slots in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    /// Slots keyed by variable name (IndexMap preserves declaration order)
    slots: IndexMap<String, Option<Value>>,
}

impl Variables {
    /// Create an empty container.
    pub fn new() -> Self {
        Self {
            slots: IndexMap::new(),
        }
    }

    /// Create a container with the given names, all unassigned.
    pub fn declared<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut vars = Self::new();
        for name in names {
            vars.declare(name);
        }
        vars
    }

    /// Declare a variable. Redeclaring keeps the existing slot.
    pub fn declare(&mut self, name: impl Into<String>) {
        self.slots.entry(name.into()).or_insert(None);
    }

    /// Bind a declared variable.
    pub fn assign(&mut self, name: &str, value: Value) -> EvalResult<()> {
        match self.slots.get_mut(name) {
            Some(slot) => {
                *slot = Some(value);
                Ok(())
            }
            None => Err(EvalError::key_not_found(name)),
        }
    }

    /// The value bound to `name`, if declared and assigned.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.slots.get(name).and_then(Option::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// All declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.keys().map(String::as_str)
    }

    /// Names that still lack a value.
    pub fn unassigned(&self) -> impl Iterator<Item = &str> {
        self.slots
            .iter()
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| k.as_str())
    }

    /// Assigned `(name, value)` pairs.
    pub fn assigned(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.slots
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| (k.as_str(), v)))
    }

    /// Whether every declared variable holds a value.
    pub fn is_resolved(&self) -> bool {
        self.slots.values().all(Option::is_some)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::value::EvalErrorKind;

    #[test]
    fn test_declare_and_assign() {
        let mut vars = Variables::declared(["temp.a", "temp.b"]);
        assert!(!vars.is_resolved());
        assert_eq!(vars.unassigned().collect::<Vec<_>>(), vec!["temp.a", "temp.b"]);

        vars.assign("temp.a", Value::from(1i64)).unwrap();
        assert_eq!(vars.get("temp.a"), Some(&Value::from(1i64)));
        assert_eq!(vars.get("temp.b"), None);
        assert_eq!(vars.unassigned().collect::<Vec<_>>(), vec!["temp.b"]);

        vars.assign("temp.b", Value::Null).unwrap();
        assert!(vars.is_resolved());
        assert_eq!(vars.assigned().count(), 2);
    }

    #[test]
    fn test_assign_unknown_name_fails() {
        let mut vars = Variables::declared(["x"]);
        let err = vars.assign("y", Value::Bool(true)).unwrap_err();
        assert!(matches!(err.kind, EvalErrorKind::KeyNotFound(ref k) if k == "y"));
    }

    #[test]
    fn test_redeclare_keeps_binding() {
        let mut vars = Variables::declared(["x"]);
        vars.assign("x", Value::Bool(true)).unwrap();
        vars.declare("x");
        assert_eq!(vars.len(), 1);
        assert!(vars.is_resolved());
        assert_eq!(vars.names().collect::<Vec<_>>(), vec!["x"]);
    }
}

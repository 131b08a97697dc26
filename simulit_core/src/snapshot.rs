//! Immutable positional value dumps.

use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An immutable, ordered copy of every leaf value in a map.
///
/// Positions line up with flattened ids. Cloning shares the buffer, so a
/// snapshot can be fanned out to several consumers without copying.
/// Carries no names, validators or references into the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    values: Arc<[Value]>,
}

impl Snapshot {
    pub(crate) fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into(),
        }
    }

    /// Number of values captured.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value at a flattened id.
    pub fn get(&self, id: usize) -> Option<&Value> {
        self.values.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.values.iter()
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

impl From<Vec<Value>> for Snapshot {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_snapshot_is_thread_safe() {
        assert_send_sync::<Snapshot>();
    }

    #[test]
    fn test_clone_shares_buffer() {
        let snapshot = Snapshot::new(vec![Value::Int(1), Value::Float(2.5)]);
        let copy = snapshot.clone();
        assert!(Arc::ptr_eq(&snapshot.values, &copy.values));
        assert_eq!(copy.len(), 2);
        assert_eq!(copy.get(1), Some(&Value::Float(2.5)));
        assert_eq!(copy.get(2), None);
    }
}

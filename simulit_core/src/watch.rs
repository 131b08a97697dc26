//! Consumer-side mirrors of a variable map.

use crate::error::VariableError;
use crate::naming;
use crate::snapshot::Snapshot;
use crate::value::{Value, VariableType};
use std::collections::BTreeMap;
use std::sync::Arc;

/// A name-indexed, mutable mirror of a map's leaf values.
///
/// Built once by [`VariableMap::watch`](crate::VariableMap::watch). Holds
/// no references into the tree: values are pulled in at watch time and
/// later overwritten wholesale from [`Snapshot`]s or from partial
/// name/value maps.
#[derive(Debug, Clone, PartialEq)]
pub struct WatchList {
    /// Full names by id, shared between clones
    names: Arc<[String]>,

    /// Value slot per id
    values: Vec<Value>,
}

impl WatchList {
    pub(crate) fn new(names: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(names.len(), values.len());
        Self {
            names: names.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Full names in id order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Full name at `id`.
    pub fn name_of(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    /// Resolves a name (exact path, else unique suffix) to an id.
    pub fn id_of(&self, name: &str) -> Result<usize, VariableError> {
        naming::resolve(self.names(), name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.id_of(name).is_ok()
    }

    pub fn contains_id(&self, id: usize) -> bool {
        id < self.values.len()
    }

    /// Value by name.
    pub fn by_name(&self, name: &str) -> Result<&Value, VariableError> {
        let id = self.id_of(name)?;
        Ok(&self.values[id])
    }

    /// Value by id.
    pub fn by_id(&self, id: usize) -> Result<&Value, VariableError> {
        self.values.get(id).ok_or(VariableError::IdOutOfRange {
            id,
            size: self.values.len(),
        })
    }

    /// Typed read by name.
    pub fn get<T: VariableType>(&self, name: &str) -> Result<T, VariableError> {
        let id = self.id_of(name)?;
        self.typed(id)
    }

    /// Typed read by id.
    pub fn get_id<T: VariableType>(&self, id: usize) -> Result<T, VariableError> {
        self.by_id(id)?;
        self.typed(id)
    }

    fn typed<T: VariableType>(&self, id: usize) -> Result<T, VariableError> {
        let value = &self.values[id];
        T::from_value(value).ok_or_else(|| VariableError::TypeMismatch {
            name: self.names[id].clone(),
            expected: T::TYPE,
            found: value.value_type(),
        })
    }

    /// Replaces every value with the snapshot's.
    ///
    /// # Panics
    ///
    /// Panics if the snapshot was taken from a map of a different size:
    /// the watch list and its source disagree on the tree's shape.
    pub fn update(&mut self, snapshot: &Snapshot) {
        assert_eq!(
            snapshot.len(),
            self.values.len(),
            "snapshot of {} values applied to a watch list of {}",
            snapshot.len(),
            self.values.len()
        );
        self.values.clear();
        self.values.extend(snapshot.iter().cloned());
    }

    /// Overwrites the slots matching each key; unmatched keys are ignored.
    ///
    /// A key equal to a full name updates that slot only; otherwise every
    /// slot whose full name ends with `":" + key` is updated. Returns the
    /// ids that changed, in ascending order.
    pub fn update_partial(&mut self, changes: &BTreeMap<String, Value>) -> Vec<usize> {
        let mut touched = Vec::new();
        for (key, value) in changes {
            for id in naming::matching(self.names.iter().map(String::as_str), key) {
                self.values[id] = value.clone();
                touched.push(id);
            }
        }
        touched.sort_unstable();
        touched.dedup();
        touched
    }

    /// Writes a single slot by id.
    pub fn set_id(&mut self, id: usize, value: Value) -> Result<(), VariableError> {
        let size = self.values.len();
        let slot = self
            .values
            .get_mut(id)
            .ok_or(VariableError::IdOutOfRange { id, size })?;
        *slot = value;
        Ok(())
    }

    /// Copies the current values out as a snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.values.clone())
    }

    /// (full name, value) pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.names.iter().map(String::as_str).zip(self.values.iter())
    }
}

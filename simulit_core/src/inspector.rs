//! Presentation boundary for variable trees.
//!
//! An [`Inspector`] is what a view layer talks to: it describes every node
//! (`label`, `hint`, type tag, current value, children), accepts writes by
//! name or id, and announces every programmatic update so observers can
//! refresh. It lives on the owner thread; worker progress reaches it only
//! as [`Snapshot`]s.

use crate::error::VariableError;
use crate::map::VariableMap;
use crate::naming;
use crate::snapshot::Snapshot;
use crate::value::Value;
use crate::variable::{Node, VariableGroup};
use crate::watch::WatchList;
use crossbeam::channel::{unbounded, Receiver, Sender};
use serde::Serialize;
use std::collections::BTreeMap;

/// Addresses a leaf either by (full or suffix) name or by flattened id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableKey {
    Name(String),
    Id(usize),
}

impl From<&str> for VariableKey {
    fn from(name: &str) -> Self {
        VariableKey::Name(name.to_string())
    }
}

impl From<String> for VariableKey {
    fn from(name: String) -> Self {
        VariableKey::Name(name)
    }
}

impl From<usize> for VariableKey {
    fn from(id: usize) -> Self {
        VariableKey::Id(id)
    }
}

/// Display description of one node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableView {
    /// Flattened id (leaves only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<usize>,

    pub label: String,
    pub full_name: String,
    pub hint: String,

    /// Type tag (leaves only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_tag: Option<&'static str>,

    /// Current value (leaves only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,

    pub is_group: bool,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<VariableView>,
}

/// Notification sent to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum InspectorEvent {
    /// The listed ids may hold new values; re-read them.
    Changed { ids: Vec<usize> },
}

/// Owner-side model of one variable tree.
#[derive(Debug)]
pub struct Inspector {
    /// Declaration and validators
    map: VariableMap,

    /// Authoritative current values
    watch: WatchList,

    subscribers: Vec<Sender<InspectorEvent>>,
}

impl Inspector {
    /// Seals `root` and mirrors its current values.
    pub fn new(root: VariableGroup) -> Result<Self, VariableError> {
        Ok(Self::from_map(VariableMap::new(root)?))
    }

    pub fn from_map(map: VariableMap) -> Self {
        let watch = map.watch();
        Self {
            map,
            watch,
            subscribers: Vec::new(),
        }
    }

    /// Registers an observer.
    pub fn subscribe(&mut self) -> Receiver<InspectorEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Current values.
    pub fn watch(&self) -> &WatchList {
        &self.watch
    }

    pub fn map(&self) -> &VariableMap {
        &self.map
    }

    pub fn size(&self) -> usize {
        self.watch.len()
    }

    /// Description of the root group.
    pub fn root_view(&self) -> VariableView {
        let root = self.map.root();
        VariableView {
            id: None,
            label: root.name().to_string(),
            full_name: root.full_name().to_string(),
            hint: root.description().to_string(),
            type_tag: None,
            value: None,
            is_group: true,
            children: self.views(),
        }
    }

    /// Descriptions of the root's children.
    pub fn views(&self) -> Vec<VariableView> {
        self.map.root().inner().iter().map(|node| self.view(node)).collect()
    }

    fn view(&self, node: &Node) -> VariableView {
        match node {
            Node::Leaf(variable) => VariableView {
                id: variable.id(),
                label: variable.name().to_string(),
                full_name: variable.full_name().to_string(),
                hint: variable.description().to_string(),
                type_tag: Some(variable.value_type().tag()),
                value: variable
                    .id()
                    .and_then(|id| self.watch.by_id(id).ok())
                    .cloned(),
                is_group: false,
                children: Vec::new(),
            },
            Node::Group(group) => VariableView {
                id: None,
                label: group.name().to_string(),
                full_name: group.full_name().to_string(),
                hint: group.description().to_string(),
                type_tag: None,
                value: None,
                is_group: true,
                children: group.inner().iter().map(|child| self.view(child)).collect(),
            },
        }
    }

    /// Current value of a leaf.
    pub fn value(&self, key: impl Into<VariableKey>) -> Result<&Value, VariableError> {
        let id = self.resolve(&key.into())?;
        self.watch.by_id(id)
    }

    /// Requests a write from the view layer.
    ///
    /// Returns `Ok(false)` if the leaf's type or validator refused the
    /// value; subscribers are notified either way so a rejected edit
    /// reverts on screen.
    pub fn set_value(
        &mut self,
        key: impl Into<VariableKey>,
        value: impl Into<Value>,
    ) -> Result<bool, VariableError> {
        let id = self.resolve(&key.into())?;
        let leaf = self.map.leaf_by_id_mut(id)?;
        let accepted = leaf.set(value);
        if accepted {
            let stored = leaf.get().clone();
            self.watch.set_id(id, stored)?;
        }
        self.notify(vec![id]);
        Ok(accepted)
    }

    /// Replaces every value with a snapshot's.
    ///
    /// Mirrors worker output as is: the snapshot came from a map sharing
    /// this tree's validators, so nothing is re-checked.
    pub fn apply(&mut self, snapshot: &Snapshot) {
        self.watch.update(snapshot);
        self.notify((0..self.watch.len()).collect());
    }

    /// Writes the named values; unknown names are ignored.
    ///
    /// Keys match like [`WatchList::update_partial`], but every write goes
    /// through the leaf's type check and validator. Refused values leave
    /// the leaf untouched and are still announced, like a rejected
    /// [`set_value`](Self::set_value).
    pub fn apply_changes(&mut self, changes: &BTreeMap<String, Value>) {
        let mut touched = Vec::new();
        for (key, value) in changes {
            for id in naming::matching(self.watch.names(), key) {
                let Ok(leaf) = self.map.leaf_by_id_mut(id) else {
                    continue;
                };
                if leaf.set(value.clone()) {
                    let stored = leaf.get().clone();
                    if self.watch.set_id(id, stored).is_err() {
                        continue;
                    }
                }
                touched.push(id);
            }
        }
        touched.sort_unstable();
        touched.dedup();
        if !touched.is_empty() {
            self.notify(touched);
        }
    }

    /// Restores every default.
    pub fn reset(&mut self) {
        self.map.reset();
        self.watch = self.map.watch();
        self.notify((0..self.watch.len()).collect());
    }

    fn resolve(&self, key: &VariableKey) -> Result<usize, VariableError> {
        match key {
            VariableKey::Name(name) => self.watch.id_of(name),
            VariableKey::Id(id) if self.watch.contains_id(*id) => Ok(*id),
            VariableKey::Id(id) => Err(VariableError::IdOutOfRange {
                id: *id,
                size: self.watch.len(),
            }),
        }
    }

    fn notify(&mut self, ids: Vec<usize>) {
        let event = InspectorEvent::Changed { ids };
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

//! Variable trees: typed leaves and ordered groups.
//!
//! Modules declare their properties and statistics as a tree of
//! [`VariableGroup`]s holding [`Variable`] leaves. Groups own their
//! children exclusively; child order is the flattening order used by
//! [`VariableMap`](crate::VariableMap).
//!
//! ```ignore
//! let stats = VariableGroup::anonymous()
//!     .with(Variable::new("Trials", "Total number of points", 0i64))
//!     .with(Variable::new("Estimate", "Current estimate of pi", 0.0f64));
//! ```

use crate::value::{Value, ValueType, VariableType};
use std::fmt;
use std::sync::Arc;

type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A named, typed, validated leaf value.
#[derive(Clone)]
pub struct Variable {
    /// Own name (no separator)
    name: String,

    /// Human-readable hint
    description: String,

    /// Declared type; writes of other types are refused
    value_type: ValueType,

    /// Value restored by `reset()`
    default: Value,

    /// Current value, always accepted by `validator`
    current: Value,

    /// Optional acceptance filter
    validator: Option<Validator>,

    /// Flattened position, assigned when the tree is sealed
    id: Option<usize>,

    /// Colon-joined path, cached when the tree is sealed
    full_name: String,
}

impl Variable {
    /// Creates a leaf with the given default value.
    pub fn new<T: VariableType>(
        name: impl Into<String>,
        description: impl Into<String>,
        default: T,
    ) -> Self {
        let name = name.into();
        let default = default.into_value();
        Self {
            full_name: name.clone(),
            name,
            description: description.into(),
            value_type: T::TYPE,
            current: default.clone(),
            default,
            validator: None,
            id: None,
        }
    }

    /// Creates a text leaf.
    pub fn text(
        name: impl Into<String>,
        description: impl Into<String>,
        default: impl Into<String>,
    ) -> Self {
        Self::new(name, description, default.into())
    }

    /// Attaches a validator over the declared type.
    ///
    /// `T` must be the declared type; any other `T` rejects every write.
    pub fn with_filter<T, F>(mut self, filter: F) -> Self
    where
        T: VariableType,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        debug_assert_eq!(T::TYPE, self.value_type, "filter type differs from '{}'", self.name);
        self.validator = Some(Arc::new(move |value: &Value| {
            T::from_value(value).map_or(false, |typed| filter(&typed))
        }));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Full colon-joined path; equals `name()` until the tree is sealed.
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Flattened id; `None` until the tree is sealed.
    pub fn id(&self) -> Option<usize> {
        self.id
    }

    pub fn default_value(&self) -> &Value {
        &self.default
    }

    /// Returns true if `value` would be accepted by `set`.
    pub fn accepts(&self, value: &Value) -> bool {
        match value.clone().coerce(self.value_type) {
            Some(coerced) => self.validator.as_ref().map_or(true, |valid| valid(&coerced)),
            None => false,
        }
    }

    /// Writes a new value.
    ///
    /// Returns `false` and leaves the value untouched if the type does not
    /// match (integers widen into float leaves) or the validator refuses.
    pub fn set(&mut self, value: impl Into<Value>) -> bool {
        let Some(coerced) = value.into().coerce(self.value_type) else {
            return false;
        };
        if let Some(validator) = &self.validator {
            if !validator(&coerced) {
                return false;
            }
        }
        self.current = coerced;
        true
    }

    pub fn get(&self) -> &Value {
        &self.current
    }

    /// Typed read; `None` if `T` is not the declared type.
    pub fn get_as<T: VariableType>(&self) -> Option<T> {
        T::from_value(&self.current)
    }

    /// Restores the default value.
    pub fn reset(&mut self) {
        self.current = self.default.clone();
    }

    pub(crate) fn stamp(&mut self, id: usize, full_name: String) {
        self.id = Some(id);
        self.full_name = full_name;
    }
}

impl fmt::Debug for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variable")
            .field("full_name", &self.full_name)
            .field("type", &self.value_type)
            .field("current", &self.current)
            .field("default", &self.default)
            .field("filtered", &self.validator.is_some())
            .field("id", &self.id)
            .finish()
    }
}

/// An ordered composite of variables and groups; carries no value.
#[derive(Debug, Clone, Default)]
pub struct VariableGroup {
    name: String,
    description: String,
    children: Vec<Node>,
    full_name: String,
}

impl VariableGroup {
    /// Creates an empty named group.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            full_name: name.clone(),
            name,
            description: String::new(),
            children: Vec::new(),
        }
    }

    /// Creates an unnamed group, typically a root.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Sets the group's hint text.
    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Appends a child (builder style).
    pub fn with(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends a child.
    pub fn push(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Children in declaration order.
    pub fn inner(&self) -> &[Node] {
        &self.children
    }

    pub(crate) fn inner_mut(&mut self) -> &mut [Node] {
        &mut self.children
    }

    pub(crate) fn set_full_name(&mut self, full_name: String) {
        self.full_name = full_name;
    }

    /// Number of leaves below this group.
    pub fn leaf_count(&self) -> usize {
        self.children.iter().map(Node::leaf_count).sum()
    }

    /// Restores every leaf below this group to its default.
    pub fn reset(&mut self) {
        for child in &mut self.children {
            child.reset();
        }
    }
}

/// A tree node: either a leaf or a group.
#[derive(Debug, Clone)]
pub enum Node {
    Leaf(Variable),
    Group(VariableGroup),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Leaf(variable) => variable.name(),
            Node::Group(group) => group.name(),
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Node::Leaf(variable) => variable.description(),
            Node::Group(group) => group.description(),
        }
    }

    pub fn full_name(&self) -> &str {
        match self {
            Node::Leaf(variable) => variable.full_name(),
            Node::Group(group) => group.full_name(),
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Node::Group(_))
    }

    /// Children; empty for leaves.
    pub fn inner(&self) -> &[Node] {
        match self {
            Node::Leaf(_) => &[],
            Node::Group(group) => group.inner(),
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf(_) => 1,
            Node::Group(group) => group.leaf_count(),
        }
    }

    pub fn reset(&mut self) {
        match self {
            Node::Leaf(variable) => variable.reset(),
            Node::Group(group) => group.reset(),
        }
    }
}

impl From<Variable> for Node {
    fn from(variable: Variable) -> Self {
        Node::Leaf(variable)
    }
}

impl From<VariableGroup> for Node {
    fn from(group: VariableGroup) -> Self {
        Node::Group(group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iterations() -> Variable {
        Variable::new("Iterations", "Number of runs", 1i64)
            .with_filter(|v: &i64| (1..=10_000_000).contains(v))
    }

    #[test]
    fn test_set_valid_value() {
        let mut var = iterations();
        assert!(var.set(500i64));
        assert_eq!(var.get(), &Value::Int(500));
        assert_eq!(var.get_as::<i64>(), Some(500));
    }

    #[test]
    fn test_validator_rejection_keeps_value() {
        let mut var = iterations();
        assert!(var.set(10i64));
        assert!(!var.set(0i64));
        assert!(!var.set(10_000_001i64));
        assert_eq!(var.get(), &Value::Int(10));
    }

    #[test]
    fn test_type_mismatch_keeps_value() {
        let mut var = iterations();
        assert!(!var.set(true));
        assert!(!var.set("12"));
        assert!(!var.set(12.0));
        assert_eq!(var.get(), &Value::Int(1));
    }

    #[test]
    fn test_int_widens_into_float() {
        let mut var = Variable::new("Error", "Absolute error", 0.0f64);
        assert!(var.set(3i64));
        assert_eq!(var.get(), &Value::Float(3.0));
    }

    #[test]
    fn test_reset_restores_default() {
        let mut var = iterations();
        var.set(7i64);
        var.set(99i64);
        var.reset();
        assert_eq!(var.get(), &Value::Int(1));
    }

    #[test]
    fn test_group_reset_is_recursive() {
        let mut group = VariableGroup::new("Run").with(iterations()).with(
            VariableGroup::new("Nested").with(Variable::new("Flag", "", false)),
        );
        if let Node::Leaf(var) = &mut group.inner_mut()[0] {
            var.set(42i64);
        }
        if let Node::Group(nested) = &mut group.inner_mut()[1] {
            if let Node::Leaf(flag) = &mut nested.inner_mut()[0] {
                flag.set(true);
            }
        }
        group.reset();
        assert_eq!(group.leaf_count(), 2);
        assert_eq!(group.inner()[0].inner().len(), 0);
        match &group.inner()[1].inner()[0] {
            Node::Leaf(flag) => assert_eq!(flag.get(), &Value::Bool(false)),
            Node::Group(_) => panic!("expected leaf"),
        }
        match &group.inner()[0] {
            Node::Leaf(var) => assert_eq!(var.get(), &Value::Int(1)),
            Node::Group(_) => panic!("expected leaf"),
        }
    }

    #[test]
    fn test_accepts_matches_set() {
        let var = iterations();
        assert!(var.accepts(&Value::Int(5)));
        assert!(!var.accepts(&Value::Int(0)));
        assert!(!var.accepts(&Value::Text("5".into())));
    }
}

//! Flattened, indexed views over a variable tree.

use crate::error::VariableError;
use crate::naming;
use crate::snapshot::Snapshot;
use crate::value::{Value, VariableType};
use crate::variable::{Node, Variable, VariableGroup};
use crate::watch::WatchList;
use std::collections::{BTreeMap, HashMap};

/// Owns a sealed variable tree and indexes its leaves.
///
/// Sealing walks the tree in preorder, assigning each leaf a zero-based
/// id in traversal order and caching its full name. The map is the only
/// place business logic reads and writes values.
///
/// # Invariants
///
/// - `leaf_by_id(i).id() == Some(i)` for every `i < size()`
/// - full names are unique
/// - no node's own name contains the separator
#[derive(Debug, Clone)]
pub struct VariableMap {
    /// The sealed tree
    root: VariableGroup,

    /// Child-index path from the root to each leaf, by id
    locations: Vec<Box<[usize]>>,

    /// Full name of each leaf, by id
    full_names: Vec<String>,

    /// Full name -> id
    by_name: HashMap<String, usize>,
}

impl VariableMap {
    /// Seals `root` and builds the flattened index.
    ///
    /// Fails if any node name contains the separator, if a default value
    /// is refused by its own validator, or if two leaves share a path.
    pub fn new(mut root: VariableGroup) -> Result<Self, VariableError> {
        if !naming::is_valid_name(root.name()) {
            return Err(VariableError::MalformedName(root.name().to_string()));
        }
        root.set_full_name(root.name().to_string());

        let mut sealer = Sealer::default();
        let prefix = root.full_name().to_string();
        sealer.seal(root.inner_mut(), &prefix, &mut Vec::new())?;

        let Sealer {
            locations,
            full_names,
        } = sealer;

        let mut by_name = HashMap::with_capacity(full_names.len());
        for (id, full_name) in full_names.iter().enumerate() {
            if by_name.insert(full_name.clone(), id).is_some() {
                return Err(VariableError::DuplicateName(full_name.clone()));
            }
        }

        let map = Self {
            root,
            locations,
            full_names,
            by_name,
        };
        debug_assert!((0..map.size()).all(|id| map.leaf(id).id() == Some(id)));
        Ok(map)
    }

    /// Number of leaves.
    pub fn size(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// The sealed tree.
    pub fn root(&self) -> &VariableGroup {
        &self.root
    }

    /// Full names in id order.
    pub fn full_names(&self) -> impl Iterator<Item = &str> {
        self.full_names.iter().map(String::as_str)
    }

    /// Leaves in id order.
    pub fn leaves(&self) -> impl Iterator<Item = &Variable> {
        (0..self.size()).map(move |id| self.leaf(id))
    }

    /// Resolves a name (exact path, else unique suffix) to an id.
    pub fn id_of(&self, name: &str) -> Result<usize, VariableError> {
        if let Some(id) = self.by_name.get(name) {
            return Ok(*id);
        }
        naming::resolve(self.full_names(), name)
    }

    pub fn leaf_by_id(&self, id: usize) -> Result<&Variable, VariableError> {
        self.check_id(id)?;
        Ok(self.leaf(id))
    }

    pub fn leaf_by_id_mut(&mut self, id: usize) -> Result<&mut Variable, VariableError> {
        self.check_id(id)?;
        Ok(self.leaf_mut(id))
    }

    pub fn leaf_by_name(&self, name: &str) -> Result<&Variable, VariableError> {
        let id = self.id_of(name)?;
        Ok(self.leaf(id))
    }

    pub fn leaf_by_name_mut(&mut self, name: &str) -> Result<&mut Variable, VariableError> {
        let id = self.id_of(name)?;
        Ok(self.leaf_mut(id))
    }

    /// Typed read by name.
    pub fn get<T: VariableType>(&self, name: &str) -> Result<T, VariableError> {
        let leaf = self.leaf_by_name(name)?;
        leaf.get_as::<T>().ok_or_else(|| VariableError::TypeMismatch {
            name: leaf.full_name().to_string(),
            expected: T::TYPE,
            found: leaf.get().value_type(),
        })
    }

    /// Writes by name, turning a refusal into an error.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), VariableError> {
        let value = value.into();
        let leaf = self.leaf_by_name_mut(name)?;
        if leaf.set(value.clone()) {
            Ok(())
        } else {
            Err(VariableError::Rejected {
                name: leaf.full_name().to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Writes by id, turning a refusal into an error.
    pub fn set_id(&mut self, id: usize, value: impl Into<Value>) -> Result<(), VariableError> {
        let value = value.into();
        let leaf = self.leaf_by_id_mut(id)?;
        if leaf.set(value.clone()) {
            Ok(())
        } else {
            Err(VariableError::Rejected {
                name: leaf.full_name().to_string(),
                value: value.to_string(),
            })
        }
    }

    /// Restores every leaf to its default.
    pub fn reset(&mut self) {
        self.root.reset();
    }

    /// Copies every value out, in id order.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.leaves().map(|leaf| leaf.get().clone()).collect())
    }

    /// Builds a consumer-owned mirror of names and current values.
    pub fn watch(&self) -> WatchList {
        WatchList::new(
            self.full_names.clone(),
            self.leaves().map(|leaf| leaf.get().clone()).collect(),
        )
    }

    /// Full name -> current value, for the leaves only.
    pub fn to_values(&self) -> BTreeMap<String, Value> {
        self.leaves()
            .map(|leaf| (leaf.full_name().to_string(), leaf.get().clone()))
            .collect()
    }

    fn check_id(&self, id: usize) -> Result<(), VariableError> {
        if id < self.size() {
            Ok(())
        } else {
            Err(VariableError::IdOutOfRange {
                id,
                size: self.size(),
            })
        }
    }

    fn leaf(&self, id: usize) -> &Variable {
        let (last, path) = split_location(&self.locations[id]);
        let mut group = &self.root;
        for index in path {
            match &group.inner()[*index] {
                Node::Group(inner) => group = inner,
                Node::Leaf(_) => unreachable!("leaf location passes through a leaf"),
            }
        }
        match &group.inner()[last] {
            Node::Leaf(variable) => variable,
            Node::Group(_) => unreachable!("leaf location ends at a group"),
        }
    }

    fn leaf_mut(&mut self, id: usize) -> &mut Variable {
        let (last, path) = split_location(&self.locations[id]);
        let mut group = &mut self.root;
        for index in path {
            group = match &mut group.inner_mut()[*index] {
                Node::Group(inner) => inner,
                Node::Leaf(_) => unreachable!("leaf location passes through a leaf"),
            };
        }
        match &mut group.inner_mut()[last] {
            Node::Leaf(variable) => variable,
            Node::Group(_) => unreachable!("leaf location ends at a group"),
        }
    }
}

fn split_location(location: &[usize]) -> (usize, &[usize]) {
    match location.split_last() {
        Some((last, path)) => (*last, path),
        None => unreachable!("empty leaf location"),
    }
}

/// Preorder walk that validates names and stamps ids.
#[derive(Default)]
struct Sealer {
    locations: Vec<Box<[usize]>>,
    full_names: Vec<String>,
}

impl Sealer {
    fn seal(
        &mut self,
        children: &mut [Node],
        prefix: &str,
        path: &mut Vec<usize>,
    ) -> Result<(), VariableError> {
        for (index, child) in children.iter_mut().enumerate() {
            if !naming::is_valid_name(child.name()) {
                return Err(VariableError::MalformedName(child.name().to_string()));
            }
            let full_name = naming::join(prefix, child.name());
            path.push(index);

            match child {
                Node::Leaf(variable) => {
                    if !variable.accepts(variable.default_value()) {
                        return Err(VariableError::InvalidDefault(full_name));
                    }
                    let id = self.locations.len();
                    variable.stamp(id, full_name.clone());
                    self.locations.push(path.clone().into_boxed_slice());
                    self.full_names.push(full_name);
                }
                Node::Group(group) => {
                    group.set_full_name(full_name.clone());
                    self.seal(group.inner_mut(), &full_name, path)?;
                }
            }

            path.pop();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bus_stop_properties() -> VariableGroup {
        VariableGroup::new("Simulation")
            .with(
                VariableGroup::new("Bus")
                    .with(Variable::text("Earliest", "", "07:58"))
                    .with(Variable::text("Latest", "", "08:02")),
            )
            .with(
                VariableGroup::new("Boy")
                    .with(Variable::text("Earliest", "", "07:55"))
                    .with(Variable::text("Latest", "", "08:01")),
            )
            .with(Variable::new("Animate", "", false))
    }

    #[test]
    fn test_preorder_ids_and_full_names() {
        let map = VariableMap::new(bus_stop_properties()).unwrap();
        let names: Vec<_> = map.full_names().collect();
        assert_eq!(
            names,
            vec![
                "Simulation:Bus:Earliest",
                "Simulation:Bus:Latest",
                "Simulation:Boy:Earliest",
                "Simulation:Boy:Latest",
                "Simulation:Animate",
            ]
        );
        for (position, leaf) in map.leaves().enumerate() {
            assert_eq!(leaf.id(), Some(position));
        }
        assert_eq!(map.root().inner()[0].full_name(), "Simulation:Bus");
    }

    #[test]
    fn test_anonymous_root_skips_empty_segment() {
        let root = VariableGroup::anonymous()
            .with(Variable::new("Trials", "", 0i64))
            .with(VariableGroup::new("Run").with(Variable::new("Seed", "", 0i64)));
        let map = VariableMap::new(root).unwrap();
        assert_eq!(map.leaf_by_id(0).unwrap().full_name(), "Trials");
        assert_eq!(map.leaf_by_id(1).unwrap().full_name(), "Run:Seed");
    }

    #[test]
    fn test_malformed_name_rejected() {
        let root = VariableGroup::anonymous().with(Variable::new("a:b", "", 0i64));
        assert_eq!(
            VariableMap::new(root).unwrap_err(),
            VariableError::MalformedName("a:b".into())
        );
        let root = VariableGroup::new("x:y");
        assert!(matches!(VariableMap::new(root), Err(VariableError::MalformedName(_))));
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let root = VariableGroup::anonymous()
            .with(Variable::new("Trials", "", 0i64))
            .with(Variable::new("Trials", "", 1i64));
        assert_eq!(
            VariableMap::new(root).unwrap_err(),
            VariableError::DuplicateName("Trials".into())
        );
    }

    #[test]
    fn test_invalid_default_rejected() {
        let root = VariableGroup::anonymous()
            .with(Variable::new("Delay", "", 5000i64).with_filter(|v: &i64| *v <= 3000));
        assert_eq!(
            VariableMap::new(root).unwrap_err(),
            VariableError::InvalidDefault("Delay".into())
        );
    }

    #[test]
    fn test_lookup_by_name() {
        let map = VariableMap::new(bus_stop_properties()).unwrap();
        assert_eq!(map.id_of("Simulation:Boy:Latest").unwrap(), 3);
        assert_eq!(map.id_of("Boy:Latest").unwrap(), 3);
        assert_eq!(map.id_of("Animate").unwrap(), 4);
        assert!(matches!(map.id_of("Latest"), Err(VariableError::Ambiguous { .. })));

        let err = map.leaf_by_name("Bus::Latest").unwrap_err();
        assert_eq!(err, VariableError::not_found("Bus::Latest"));
        assert!(err.to_string().contains("double colon"));
        assert!(matches!(
            map.leaf_by_id(5),
            Err(VariableError::IdOutOfRange { id: 5, size: 5 })
        ));
    }

    #[test]
    fn test_set_get_reset_through_map() {
        let mut map = VariableMap::new(bus_stop_properties()).unwrap();
        map.set("Animate", true).unwrap();
        map.set_id(0, "06:30").unwrap();
        assert!(map.get::<bool>("Animate").unwrap());
        assert!(matches!(map.set("Animate", 3i64), Err(VariableError::Rejected { .. })));
        assert!(matches!(map.get::<i64>("Animate"), Err(VariableError::TypeMismatch { .. })));

        map.reset();
        assert!(!map.get::<bool>("Animate").unwrap());
        assert_eq!(map.get::<String>("Bus:Earliest").unwrap(), "07:58");
    }

    #[test]
    fn test_watch_is_independent_of_tree() {
        let mut map = VariableMap::new(bus_stop_properties()).unwrap();
        let watch = map.watch();
        map.set("Animate", true).unwrap();
        assert!(!watch.get::<bool>("Animate").unwrap());
        assert_eq!(watch.len(), map.size());
    }

    #[derive(Debug, Clone)]
    enum Shape {
        Int(i64),
        Flag(bool),
        Group(Vec<Shape>),
    }

    fn shape() -> impl Strategy<Value = Shape> {
        let leaf = prop_oneof![
            any::<i64>().prop_map(Shape::Int),
            any::<bool>().prop_map(Shape::Flag),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop::collection::vec(inner, 0..6).prop_map(Shape::Group)
        })
    }

    /// Sibling names are positional, so every path is unique.
    fn build(group: &mut VariableGroup, shapes: &[Shape]) {
        for (index, shape) in shapes.iter().enumerate() {
            let name = format!("n{}", index);
            match shape {
                Shape::Int(value) => group.push(Variable::new(name, "", *value)),
                Shape::Flag(value) => group.push(Variable::new(name, "", *value)),
                Shape::Group(children) => {
                    let mut inner = VariableGroup::new(name);
                    build(&mut inner, children);
                    group.push(inner);
                }
            }
        }
    }

    fn arbitrary_tree() -> impl Strategy<Value = VariableGroup> {
        prop::collection::vec(shape(), 0..8).prop_map(|shapes| {
            let mut root = VariableGroup::anonymous();
            build(&mut root, &shapes);
            root
        })
    }

    proptest! {
        #[test]
        fn prop_ids_match_positions(root in arbitrary_tree()) {
            let expected = root.leaf_count();
            let map = VariableMap::new(root).unwrap();
            prop_assert_eq!(map.size(), expected);
            for (position, leaf) in map.leaves().enumerate() {
                prop_assert_eq!(leaf.id(), Some(position));
                prop_assert_eq!(map.id_of(leaf.full_name()).unwrap(), position);
            }
        }

        #[test]
        fn prop_snapshot_round_trips_through_watch(root in arbitrary_tree()) {
            let map = VariableMap::new(root).unwrap();
            let mut watch = map.watch();
            let snapshot = map.snapshot();
            watch.update(&snapshot);
            for (id, leaf) in map.leaves().enumerate() {
                prop_assert_eq!(watch.by_id(id).unwrap(), leaf.get());
            }
        }
    }
}

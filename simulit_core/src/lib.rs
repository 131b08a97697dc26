//! Simulit Core - typed hierarchical variables for simulation modules
//!
//! Simulation modules declare their configuration (properties) and their
//! outputs (statistics) as trees of named, typed, validated variables.
//! This crate turns such a tree into something that can be driven from a
//! worker thread and observed from another:
//!
//! 1. **Declare**: [`VariableGroup`]s own ordered [`Variable`] leaves
//! 2. **Seal**: [`VariableMap`] assigns preorder ids and indexes full names
//! 3. **Copy out**: [`Snapshot`] is an immutable, cheaply cloned value dump
//! 4. **Mirror**: [`WatchList`] / [`Inspector`] hold the consumer's view
//!
//! ```text
//!  worker thread                               owner thread
//! ┌─────────────────────────┐   Snapshot    ┌─────────────────────────┐
//! │ VariableMap (live tree) │ ────────────► │ Inspector / WatchList   │
//! │  set / get / reset      │   (values)    │  views, set_value       │
//! └─────────────────────────┘               └─────────────────────────┘
//! ```
//!
//! No reference into a live tree ever crosses a thread boundary; only
//! values do.

pub mod naming;
mod error;
mod inspector;
mod map;
mod snapshot;
mod value;
mod variable;
mod watch;

pub use error::VariableError;
pub use inspector::{Inspector, InspectorEvent, VariableKey, VariableView};
pub use map::VariableMap;
pub use naming::{NameDiagnostic, SEPARATOR};
pub use snapshot::Snapshot;
pub use value::{Value, ValueType, VariableType};
pub use variable::{Node, Variable, VariableGroup};
pub use watch::WatchList;

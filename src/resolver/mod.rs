//! Symbol resolution consumed by the inspections: alias tables and the
//! class-like hierarchy.

pub mod hierarchy;
pub mod names;

pub use hierarchy::{AncestorInterfaceSet, ClassRegistry};
pub use names::NameContext;

//! Entity model: descriptors, key tuples, field visibility.

mod descriptor;
mod key;
mod value;
mod visibility;

pub use descriptor::*;
pub use key::KeyTuple;
pub use value::*;
pub use visibility::FieldVisibility;

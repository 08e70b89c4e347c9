//! Capability aggregates shared by composition across node kinds.
//!
//! Each delegate holds the fields of exactly one capability: identity and
//! integrity anchoring, tree-shape links, or the scalar payload. A concrete
//! node kind owns one identity delegate plus whichever other aggregates its
//! kind calls for; a kind without the structural aggregate has no structural
//! accessors at all.

mod identity;
mod structure;
mod value;

pub use {identity::IdentityDelegate, structure::StructuralDelegate, value::ValueDelegate};

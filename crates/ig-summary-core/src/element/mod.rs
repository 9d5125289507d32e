//! Profile element resolution
//!
//! - [`ElementTree`]: ordered snapshot elements with id prefix queries
//! - [`ProfileElement`]: one resolved element and its nested elements
//! - [`DataElementRow`]: the flattened rows written to the data dictionary

mod extension;
pub mod metadata;
pub mod naming;
pub mod policy;
pub mod resolver;
pub mod row;
pub mod tree;

pub use metadata::{ElementMetadata, ValueSetBinding};
pub use resolver::{ElementKind, ProfileElement, ResolveContext};
pub use row::{DataElementRow, TabularRow, columns};
pub use tree::ElementTree;

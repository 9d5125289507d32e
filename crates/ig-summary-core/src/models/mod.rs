//! FHIR conformance resource models read from an IG's output folder

pub mod code_system;
pub mod common;
pub mod element_definition;
pub mod implementation_guide;
pub mod resource;
pub mod structure_definition;
pub mod value_set;

// Re-exports
pub use code_system::*;
pub use common::*;
pub use element_definition::*;
pub use implementation_guide::*;
pub use resource::*;
pub use structure_definition::*;
pub use value_set::*;

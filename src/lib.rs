//! Derive Elasticsearch-style index mappings from Rust types.
//!
//! ```
//! use elastic_mapping::{mappable_record, Mapper};
//!
//! struct Comment { body: String }
//! struct Post { title: String, views: u64, comments: Vec<Comment> }
//!
//! mappable_record! {
//!     Comment { body: String => "text" }
//!     Post { title: String => "text", views: u64, comments: Vec<Comment> }
//! }
//!
//! let derivation = Mapper::new().derive::<Post>("post").unwrap();
//! let mapping = derivation.mapping.to_value();
//! assert_eq!(mapping["mappings"]["post"]["properties"]["comments"]["type"], "nested");
//! ```
pub mod annotation;
pub mod descriptor;
pub mod error;
pub mod mapper;
pub mod path_de;
pub mod tree;

pub use annotation::{AnnotationSet, EmptyTokens};
pub use descriptor::catalog::Catalog;
pub use descriptor::{FieldDescriptor, Mappable, RecordDescriptor, RecordKey, TypeDescriptor};
pub use error::{CatalogError, MappingError, TreeError};
pub use mapper::{Derivation, Diagnostic, DiagnosticKind, Mapper, MapperOptions, Mapping};
pub use tree::MappingNode;

/// Pretty-printed mapping document for `T` under `root_name`, with default
/// options. Diagnostics are only logged.
pub fn mapping_of<T: Mappable + ?Sized>(root_name: &str) -> Result<String, MappingError> {
    let derivation = Mapper::new().derive::<T>(root_name)?;
    Ok(derivation.mapping.to_string_pretty())
}

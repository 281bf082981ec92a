//! Composer Schema - the contract type catalog
//!
//! Describes, as data, every document type the composer can produce:
//! - [`ParameterSpec`]: a required input with a typed kind (text, number, enum)
//! - [`ClauseOption`]: a named choice point with labeled variations
//! - [`ContractTypeDefinition`]: jurisdiction + parameters + clause options
//! - [`TypeCatalog`]: the read-only registry keyed by type id
//!
//! Nothing downstream switches on a type id. Forms, validation and request
//! construction iterate the schema, so adding a document type is a pure data
//! change (see [`TypeCatalog::load`]).
//!
//! # Example
//!
//! ```rust
//! use composer_schema::TypeCatalog;
//!
//! let catalog = TypeCatalog::builtin();
//! let definition = catalog.lookup("California Employment Agreement").unwrap();
//!
//! for field in definition.fields() {
//!     println!("{} ({})", field.display_label(), field.placeholder());
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod catalog;
pub mod definition;
pub mod error;
pub mod fields;

pub use catalog::{CatalogDocument, TypeCatalog, RESERVED_PARAMETER_KEYS};
pub use definition::{ClauseOption, ContractTypeDefinition, ParameterKind, ParameterSpec, Variation};
pub use error::CatalogError;
pub use fields::{Choice, FieldDescriptor, FieldSource, FieldWidget};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Stratum Intermediate Representation
//!
//! This crate carries the two data models the generator pipeline moves
//! between:
//!
//! - **Entity descriptors** ([`EntityDescriptor`], [`FieldDescriptor`]) —
//!   the abstract, annotation-shaped description of persistent classes
//!   that some caller populates from its own metadata source.
//! - **Schema model** ([`TableSchema`], [`ColumnSchema`]) — the physical
//!   shape of a table, produced either by projecting descriptors or by
//!   parsing previously emitted SQL, and consumed by the differ and the
//!   emitter.
//!
//! Descriptor sets can be persisted as versioned JSON/TOML files
//! ([`load_entities`]/[`save_entities`]) and checked for consistency
//! before generation ([`validation`]).

pub mod entity;
pub mod field;
pub mod schema;
pub mod serialization;
pub mod validation;

// Re-export main types at crate root
pub use entity::{EntityDescriptor, IndexDecl, TableMeta};
pub use field::{
    ColumnMeta, EmbeddedField, EmbeddedMeta, FieldDescriptor, FieldKind, IdStrategy, JoinMeta,
};
pub use schema::{ColumnSchema, ForeignKeySchema, IndexSchema, OnDelete, TableSchema};
pub use serialization::{load_entities, save_entities, DescriptorFile, DescriptorFormat};
pub use validation::{get_all_issues, get_errors, ValidationIssue, ValidationSeverity};

// Re-export core types that are commonly used with the IR
pub use stratum_core::{Dialect, GenerationMode, LogicalType, UuidPolicy};

/// Prelude module for convenient imports
pub mod prelude {
    pub use super::{
        ColumnMeta, ColumnSchema, DescriptorFormat, EmbeddedField, EmbeddedMeta, EntityDescriptor,
        FieldDescriptor, FieldKind, ForeignKeySchema, IdStrategy, IndexDecl, IndexSchema, JoinMeta,
        OnDelete, TableMeta, TableSchema,
    };
    pub use super::{load_entities, save_entities};
}

/// Current version of the descriptor file format
pub const FORMAT_VERSION: &str = "1.0.0";

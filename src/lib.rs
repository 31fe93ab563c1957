//! Stratum
//!
//! Generates and evolves relational-database migration scripts from
//! declaratively annotated entity descriptors. Given a descriptor set and
//! an output directory, the engine emits an ordered, content-addressed
//! sequence of SQL files: initial CREATE TABLE scripts, prerequisite
//! extension setup, index and foreign-key declarations, and incremental
//! ALTER scripts on subsequent runs.
//!
//! # Example
//!
//! ```rust,ignore
//! use stratum::prelude::*;
//!
//! let user = EntityDescriptor::new("User")
//!     .with_package("com.example.accounts")
//!     .with_field(FieldDescriptor::uuid_id("id"))
//!     .with_field(FieldDescriptor::string("email").not_null().unique());
//!
//! let config = GeneratorConfig::postgres().with_out_dir("migrations");
//! let report = MigrationEngine::new(config).generate(&[user])?;
//! println!("wrote {} files", report.written.len());
//! ```

pub use stratum_core::{
    Dialect, GenerationMode, GeneratorConfig, LogicalType, StratumError, StratumResult, UuidPolicy,
};
pub use stratum_engine::{
    list_migration_files, DefaultSchemaProvider, GenerationReport, MigrationEngine,
    MigrationWriter, SchemaProvider,
};
pub use stratum_ir::{
    ColumnSchema, EntityDescriptor, FieldDescriptor, FieldKind, ForeignKeySchema, IndexSchema,
    TableSchema,
};
pub use stratum_sql::{MigrationDiffer, SqlEmitter, SqlExtractor};

/// Prelude for convenient imports
pub mod prelude {
    pub use stratum_core::prelude::*;
    pub use stratum_engine::prelude::*;
    pub use stratum_ir::prelude::*;
    pub use stratum_sql::{MigrationDiffer, SqlEmitter, SqlExtractor};
}

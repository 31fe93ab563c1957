//! Stratum Engine
//!
//! The pipeline half of the generator: entity projection, the pluggable
//! partitioning/naming policy, the idempotent hash-headed file writer,
//! and the orchestrating [`MigrationEngine`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │          EntityDescriptor set (ir)           │
//! └──────────────────────────────────────────────┘
//!                      │
//!                      ▼
//! ┌──────────────────────────────────────────────┐
//! │               MigrationEngine                │
//! │   EntityProjector ──▶ TableSchema (current)  │
//! │   SqlExtractor    ──▶ TableSchema (previous) │
//! │   MigrationDiffer / SqlEmitter ──▶ SQL body  │
//! │   MigrationWriter ──▶ V<ts><sort>__<base>.sql│
//! └──────────────────────────────────────────────┘
//! ```

pub mod engine;
pub mod projector;
pub mod provider;
pub mod writer;

pub use engine::{list_migration_files, GenerationReport, MigrationEngine};
pub use projector::EntityProjector;
pub use provider::{DefaultSchemaProvider, SchemaProvider};
pub use writer::{content_hash, MigrationWriter, HASH_PREFIX};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::engine::{list_migration_files, GenerationReport, MigrationEngine};
    pub use super::projector::EntityProjector;
    pub use super::provider::{DefaultSchemaProvider, SchemaProvider};
    pub use super::writer::{content_hash, MigrationWriter};
}

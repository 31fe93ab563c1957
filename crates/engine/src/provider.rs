//! Partitioning and naming policy
//!
//! A [`SchemaProvider`] decides where each entity's migrations live and
//! what the emitted files are called. The default policy partitions by
//! the entity's schema/package and names files
//! `V<yyyyMMddHHmmss><sort>__<base>.sql`.

use stratum_ir::EntityDescriptor;

/// Pluggable partitioning/naming policy
pub trait SchemaProvider {
    /// Partition folder for one entity; empty means the default partition
    fn folder_for(&self, entity: &EntityDescriptor) -> String;

    /// Folder for extension/function setup files; empty means the output
    /// root
    fn setup_folder(&self) -> String;

    /// Build a migration file name from the frozen run timestamp, the
    /// sort number and the base name
    fn file_name(&self, timestamp: &str, sort_number: u16, base_name: &str) -> String;

    /// Regex matching every versioned file for a `(sort, base)` pair,
    /// regardless of timestamp
    fn file_regex(&self, sort_number: u16, base_name: &str) -> String;
}

/// The default policy described above
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSchemaProvider;

impl SchemaProvider for DefaultSchemaProvider {
    fn folder_for(&self, entity: &EntityDescriptor) -> String {
        entity.partition()
    }

    fn setup_folder(&self) -> String {
        String::new()
    }

    fn file_name(&self, timestamp: &str, sort_number: u16, base_name: &str) -> String {
        format!("V{}{:04}__{}.sql", timestamp, sort_number, base_name)
    }

    fn file_regex(&self, sort_number: u16, base_name: &str) -> String {
        format!(
            r"^V\d{{14}}{:04}__{}\.sql$",
            sort_number,
            regex::escape(base_name)
        )
    }
}

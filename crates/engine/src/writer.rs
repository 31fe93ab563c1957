//! Idempotent migration file writer
//!
//! Every emitted file starts with a `-- HASH: <16 hex>` header over its
//! body. Before writing, the writer scans the target directory for older
//! versions of the same `(sort, base)` file; a matching hash means the
//! content is already on disk and nothing is written. Files are never
//! deleted or overwritten; changed content lands in a new file under the
//! run's timestamp.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::debug;

use stratum_core::{StratumError, StratumResult};

use crate::provider::SchemaProvider;

/// Prefix of the hash header line
pub const HASH_PREFIX: &str = "-- HASH: ";

/// Writes hash-headed migration files under one frozen run timestamp
#[derive(Debug, Clone)]
pub struct MigrationWriter {
    execution_timestamp: String,
}

impl MigrationWriter {
    /// Create a writer with the timestamp frozen to the current wall clock
    pub fn new() -> Self {
        Self {
            execution_timestamp: Utc::now().format("%Y%m%d%H%M%S").to_string(),
        }
    }

    /// Create a writer with an explicit timestamp
    pub fn with_timestamp(timestamp: impl Into<String>) -> Self {
        Self {
            execution_timestamp: timestamp.into(),
        }
    }

    /// The frozen `yyyyMMddHHmmss` prefix every file of this run shares
    pub fn execution_timestamp(&self) -> &str {
        &self.execution_timestamp
    }

    /// Write one migration file, unless its content is already on disk
    ///
    /// Returns the written path, or `None` when an existing version of
    /// this `(sort, base)` file already carries the same content hash.
    pub fn write_migration(
        &self,
        provider: &dyn SchemaProvider,
        target_dir: &Path,
        sort_number: u16,
        base_name: &str,
        body: &str,
    ) -> StratumResult<Option<PathBuf>> {
        let hash = content_hash(body);

        let pattern = Regex::new(&provider.file_regex(sort_number, base_name))
            .map_err(|e| StratumError::internal(format!("bad file pattern: {}", e)))?;

        if self.already_written(target_dir, &pattern, &hash)? {
            debug!("skipping {} (hash {} already on disk)", base_name, hash);
            return Ok(None);
        }

        fs::create_dir_all(target_dir)?;

        let file_name = provider.file_name(&self.execution_timestamp, sort_number, base_name);
        let path = target_dir.join(&file_name);
        if path.exists() {
            // Same filename with different content means a second run in
            // the same wall-clock second; refusing beats overwriting
            return Err(StratumError::internal(format!(
                "refusing to overwrite existing migration file {}",
                path.display()
            )));
        }

        let mut content = format!("{}{}\n{}", HASH_PREFIX, hash, body);
        if !content.ends_with('\n') {
            content.push('\n');
        }
        fs::write(&path, content)?;

        Ok(Some(path))
    }

    /// Check existing versions of this file for a matching hash header
    fn already_written(
        &self,
        target_dir: &Path,
        pattern: &Regex,
        hash: &str,
    ) -> StratumResult<bool> {
        let entries = match fs::read_dir(target_dir) {
            Ok(entries) => entries,
            Err(_) => return Ok(false),
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if !pattern.is_match(name) {
                continue;
            }

            let content = fs::read_to_string(entry.path())?;
            if let Some(first_line) = content.lines().next() {
                if let Some(existing) = first_line.strip_prefix(HASH_PREFIX) {
                    if existing.trim() == hash {
                        return Ok(true);
                    }
                }
            }
        }

        Ok(false)
    }
}

impl Default for MigrationWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// First 16 hex characters of the SHA-256 of the body
pub fn content_hash(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    let digest = hasher.finalize();

    let mut hex = String::with_capacity(16);
    for byte in digest.iter().take(8) {
        hex.push_str(&format!("{:02x}", byte));
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::DefaultSchemaProvider;

    fn writer() -> MigrationWriter {
        MigrationWriter::with_timestamp("20240101120000")
    }

    #[test]
    fn test_hash_is_stable_and_whitespace_sensitive() {
        let a = content_hash("CREATE TABLE t (id INT);");
        let b = content_hash("CREATE TABLE t (id INT);");
        let c = content_hash("CREATE TABLE t  (id INT);");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 16);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_write_and_skip() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DefaultSchemaProvider;
        let writer = writer();

        let body = "CREATE TABLE t (\n    id INT PRIMARY KEY\n);";
        let path = writer
            .write_migration(&provider, dir.path(), 1000, "create_t_table", body)
            .unwrap()
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "V202401011200001000__create_t_table.sql"
        );

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(HASH_PREFIX));
        assert!(content.contains(body));

        // Unchanged content under a later timestamp is skipped
        let later = MigrationWriter::with_timestamp("20240202120000");
        let result = later
            .write_migration(&provider, dir.path(), 1000, "create_t_table", body)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_changed_content_gets_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DefaultSchemaProvider;

        writer()
            .write_migration(&provider, dir.path(), 1000, "create_t_table", "v1")
            .unwrap();

        let later = MigrationWriter::with_timestamp("20240202120000");
        let path = later
            .write_migration(&provider, dir.path(), 1000, "create_t_table", "v2")
            .unwrap()
            .unwrap();

        assert_eq!(
            path.file_name().unwrap().to_str().unwrap(),
            "V202402021200001000__create_t_table.sql"
        );
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DefaultSchemaProvider;
        let writer = writer();

        writer
            .write_migration(&provider, dir.path(), 1000, "create_t_table", "v1")
            .unwrap();

        // Same second, different content: the writer refuses
        let err = writer
            .write_migration(&provider, dir.path(), 1000, "create_t_table", "v2")
            .unwrap_err();
        assert!(err.to_string().contains("refusing to overwrite"));
    }

    #[test]
    fn test_other_sort_numbers_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let provider = DefaultSchemaProvider;
        let writer = writer();

        writer
            .write_migration(&provider, dir.path(), 1000, "create_t_table", "body")
            .unwrap();
        let second = writer
            .write_migration(&provider, dir.path(), 1001, "create_u_table", "body")
            .unwrap();

        assert!(second.is_some());
    }
}

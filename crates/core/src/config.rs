//! Generator configuration
//!
//! All knobs are carried in an explicit config record handed to the
//! orchestrator; there is no process-wide state.

use std::path::PathBuf;

use crate::types::{Dialect, GenerationMode, UuidPolicy};

/// Configuration for a generation run
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Target SQL dialect
    pub dialect: Dialect,
    /// UUID generation policy for UUID-strategy primary keys
    pub uuid: UuidPolicy,
    /// CREATE/ALTER/SMART behavior
    pub mode: GenerationMode,
    /// Root output directory for migration files
    pub out_dir: PathBuf,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            dialect: Dialect::Postgres,
            uuid: UuidPolicy::V7,
            mode: GenerationMode::Smart,
            out_dir: PathBuf::from("migrations"),
        }
    }
}

impl GeneratorConfig {
    /// Create a new config targeting Postgres
    pub fn postgres() -> Self {
        Self::default()
    }

    /// Create a new config targeting MariaDB
    pub fn mariadb() -> Self {
        Self {
            dialect: Dialect::MariaDb,
            ..Default::default()
        }
    }

    /// Set the UUID policy
    pub fn with_uuid(mut self, uuid: UuidPolicy) -> Self {
        self.uuid = uuid;
        self
    }

    /// Set the generation mode
    pub fn with_mode(mut self, mode: GenerationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the output directory
    pub fn with_out_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.out_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.dialect, Dialect::Postgres);
        assert_eq!(config.uuid, UuidPolicy::V7);
        assert_eq!(config.mode, GenerationMode::Smart);
    }

    #[test]
    fn test_builder() {
        let config = GeneratorConfig::mariadb()
            .with_uuid(UuidPolicy::V4)
            .with_mode(GenerationMode::CreateOnly)
            .with_out_dir("out/sql");

        assert_eq!(config.dialect, Dialect::MariaDb);
        assert_eq!(config.uuid, UuidPolicy::V4);
        assert_eq!(config.mode, GenerationMode::CreateOnly);
        assert_eq!(config.out_dir, PathBuf::from("out/sql"));
    }
}

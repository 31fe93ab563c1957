//! Physical schema model
//!
//! These types describe the structure of database tables as the generator
//! sees it. They are produced by the projector (from descriptors) or by
//! the extractor (from previously emitted SQL), are immutable once built,
//! and are consumed by the differ and the emitter.

use serde::{Deserialize, Serialize};

/// Referential action on delete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnDelete {
    Cascade,
    SetNull,
    Restrict,
    NoAction,
}

impl OnDelete {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnDelete::Cascade => "CASCADE",
            OnDelete::SetNull => "SET NULL",
            OnDelete::Restrict => "RESTRICT",
            OnDelete::NoAction => "NO ACTION",
        }
    }

    /// Parse the SQL spelling, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CASCADE" => Some(OnDelete::Cascade),
            "SET NULL" => Some(OnDelete::SetNull),
            "RESTRICT" => Some(OnDelete::Restrict),
            "NO ACTION" => Some(OnDelete::NoAction),
            _ => None,
        }
    }
}

/// One physical column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Physical column name (snake_case)
    pub name: String,
    /// Dialect-specific SQL type literal, already resolved
    pub sql_type: String,
    pub nullable: bool,
    pub unique: bool,
    pub primary_key: bool,
    /// MariaDB identity marker, rendered as AUTO_INCREMENT
    pub auto_increment: bool,
    /// Raw SQL fragment emitted after DEFAULT
    pub default: Option<String>,
}

impl ColumnSchema {
    /// Create a nullable, unconstrained column
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            nullable: true,
            unique: false,
            primary_key: false,
            auto_increment: false,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark as the primary key; primary keys are never nullable
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// One index over a table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSchema {
    pub name: String,
    /// Ordered, non-empty column list
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexSchema {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }
}

/// One foreign-key constraint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeySchema {
    /// Explicit constraint name; derived when absent
    pub name: Option<String>,
    /// Constrained column in the owning table
    pub column: String,
    pub referenced_table: String,
    pub referenced_column: String,
    pub on_delete: OnDelete,
}

impl ForeignKeySchema {
    pub fn new(
        column: impl Into<String>,
        referenced_table: impl Into<String>,
        referenced_column: impl Into<String>,
        on_delete: OnDelete,
    ) -> Self {
        Self {
            name: None,
            column: column.into(),
            referenced_table: referenced_table.into(),
            referenced_column: referenced_column.into(),
            on_delete,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Constraint name: explicit override or `fk_<table>_<column>`
    pub fn constraint_name(&self, table: &str) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("fk_{}_{}", table, self.column),
        }
    }
}

/// The full physical shape of one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Columns, insertion-ordered for rendering
    pub columns: Vec<ColumnSchema>,
    pub indexes: Vec<IndexSchema>,
    pub foreign_keys: Vec<ForeignKeySchema>,
}

impl TableSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// The primary-key column, if exactly one is marked
    pub fn primary_key(&self) -> Option<&ColumnSchema> {
        let mut pks = self.columns.iter().filter(|c| c.primary_key);
        match (pks.next(), pks.next()) {
            (Some(pk), None) => Some(pk),
            _ => None,
        }
    }

    /// Columns sorted lexicographically by name, the diffing order
    pub fn columns_sorted(&self) -> Vec<&ColumnSchema> {
        let mut cols: Vec<&ColumnSchema> = self.columns.iter().collect();
        cols.sort_by(|a, b| a.name.cmp(&b.name));
        cols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_on_delete_roundtrip() {
        for action in [
            OnDelete::Cascade,
            OnDelete::SetNull,
            OnDelete::Restrict,
            OnDelete::NoAction,
        ] {
            assert_eq!(OnDelete::parse(action.as_sql()), Some(action));
        }
        assert_eq!(OnDelete::parse("set null"), Some(OnDelete::SetNull));
        assert_eq!(OnDelete::parse("TRUNCATE"), None);
    }

    #[test]
    fn test_primary_key_never_nullable() {
        let col = ColumnSchema::new("id", "UUID").primary_key();
        assert!(col.primary_key);
        assert!(!col.nullable);
    }

    #[test]
    fn test_fk_constraint_name() {
        let fk = ForeignKeySchema::new("author_id", "user", "id", OnDelete::SetNull);
        assert_eq!(fk.constraint_name("post"), "fk_post_author_id");

        let fk = fk.with_name("fk_custom");
        assert_eq!(fk.constraint_name("post"), "fk_custom");
    }

    #[test]
    fn test_table_lookup() {
        let table = TableSchema {
            columns: vec![
                ColumnSchema::new("id", "BIGSERIAL").primary_key(),
                ColumnSchema::new("email", "VARCHAR(255)").not_null().unique(),
            ],
            ..Default::default()
        };

        assert!(table.has_column("email"));
        assert!(!table.has_column("name"));
        assert_eq!(table.primary_key().map(|c| c.name.as_str()), Some("id"));
    }

    #[test]
    fn test_columns_sorted() {
        let table = TableSchema {
            columns: vec![
                ColumnSchema::new("zeta", "INTEGER"),
                ColumnSchema::new("alpha", "INTEGER"),
            ],
            ..Default::default()
        };

        let names: Vec<&str> = table.columns_sorted().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }
}

//! SQL rendering
//!
//! Stateless renderers over [`TableSchema`]: CREATE TABLE bodies with
//! aligned column cells, foreign-key and index statement lists, and the
//! extension/function setup needed for database-generated UUIDs.

use stratum_core::{Dialect, UuidPolicy};
use stratum_ir::{ColumnSchema, TableSchema};

/// Renders schema fragments as SQL text for one dialect
#[derive(Debug, Clone, Copy)]
pub struct SqlEmitter {
    dialect: Dialect,
}

impl SqlEmitter {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Render the CREATE TABLE body for one table
    ///
    /// Column name and type cells are padded to the widest entry of each
    /// so constraints line up. Constraints appear in a fixed order:
    /// PRIMARY KEY, NOT NULL, UNIQUE, AUTO_INCREMENT, DEFAULT.
    pub fn create_table(&self, entity_name: &str, table_name: &str, schema: &TableSchema) -> String {
        let name_width = schema
            .columns
            .iter()
            .map(|c| c.name.len())
            .max()
            .unwrap_or(0);
        let type_width = schema
            .columns
            .iter()
            .map(|c| c.sql_type.len())
            .max()
            .unwrap_or(0);

        let mut lines = Vec::with_capacity(schema.columns.len());
        for column in &schema.columns {
            let constraints = self.column_constraints(column);
            let line = format!(
                "    {:<name_width$} {:<type_width$} {}",
                column.name, column.sql_type, constraints
            );
            lines.push(line.trim_end().to_string());
        }

        format!(
            "-- create_{table}_table\n\
             -- Entity: {entity}\n\
             -- Database: {dialect}\n\
             \n\
             CREATE TABLE {table} (\n{columns}\n);",
            table = table_name,
            entity = entity_name,
            dialect = self.dialect.as_tag(),
            columns = lines.join(",\n"),
        )
    }

    /// Constraint tail for one column, in source order
    fn column_constraints(&self, column: &ColumnSchema) -> String {
        let mut parts: Vec<String> = Vec::new();

        if column.primary_key {
            parts.push("PRIMARY KEY".to_string());
        }
        if !column.nullable && !column.primary_key {
            parts.push("NOT NULL".to_string());
        }
        if column.unique {
            parts.push("UNIQUE".to_string());
        }
        if column.auto_increment {
            parts.push("AUTO_INCREMENT".to_string());
        }
        if let Some(default) = &column.default {
            parts.push(format!("DEFAULT {}", default));
        }

        parts.join(" ")
    }

    /// Render ALTER TABLE ... ADD CONSTRAINT statements for every foreign
    /// key of the given tables
    pub fn foreign_keys(&self, tables: &[(String, TableSchema)]) -> String {
        let mut statements = Vec::new();

        for (table, schema) in tables {
            for fk in &schema.foreign_keys {
                statements.push(format!(
                    "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE {};",
                    table,
                    fk.constraint_name(table),
                    fk.column,
                    fk.referenced_table,
                    fk.referenced_column,
                    fk.on_delete.as_sql(),
                ));
            }
        }

        statements.join("\n")
    }

    /// Render CREATE INDEX statements for every index of the given tables
    pub fn indexes(&self, tables: &[(String, TableSchema)]) -> String {
        let mut statements = Vec::new();

        for (table, schema) in tables {
            for index in &schema.indexes {
                let unique = if index.unique { "UNIQUE " } else { "" };
                statements.push(format!(
                    "CREATE {}INDEX {} ON {} ({});",
                    unique,
                    index.name,
                    table,
                    index.columns.join(", "),
                ));
            }
        }

        statements.join("\n")
    }

    /// Render the extension/function setup needed for UUID primary keys
    ///
    /// MariaDB needs no setup (UUID() is built in) and returns `None`;
    /// the caller skips the file entirely.
    pub fn uuid_setup(&self, policy: UuidPolicy) -> Option<String> {
        match (self.dialect, policy) {
            (Dialect::MariaDb, _) => None,
            (Dialect::Postgres, UuidPolicy::V4) => {
                Some("CREATE EXTENSION IF NOT EXISTS \"uuid-ossp\" SCHEMA public;".to_string())
            }
            (Dialect::Postgres, UuidPolicy::V7) => Some(uuid_v7_setup().to_string()),
        }
    }
}

/// pgcrypto extension plus an idempotent uuid_generate_v7() helper
///
/// The function builds a 16-byte value from a timestamp prefix and ten
/// random bytes, then stamps the version nibble (0x7) and variant bits
/// (10) in place.
fn uuid_v7_setup() -> &'static str {
    r#"CREATE EXTENSION IF NOT EXISTS pgcrypto SCHEMA public;

CREATE OR REPLACE FUNCTION public.uuid_generate_v7()
RETURNS uuid
AS $$
DECLARE
    ts_millis  BIGINT;
    uuid_bytes BYTEA;
BEGIN
    ts_millis := FLOOR(EXTRACT(EPOCH FROM clock_timestamp()) * 1000)::BIGINT;
    uuid_bytes := decode(lpad(to_hex(ts_millis), 12, '0'), 'hex') || public.gen_random_bytes(10);
    uuid_bytes := set_byte(uuid_bytes, 6, (get_byte(uuid_bytes, 6) & 15) | 112);
    uuid_bytes := set_byte(uuid_bytes, 8, (get_byte(uuid_bytes, 8) & 63) | 128);
    RETURN encode(uuid_bytes, 'hex')::uuid;
END;
$$ LANGUAGE plpgsql VOLATILE;"#
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratum_ir::{ForeignKeySchema, IndexSchema, OnDelete};

    fn sample_table() -> TableSchema {
        TableSchema {
            columns: vec![
                ColumnSchema::new("id", "UUID")
                    .primary_key()
                    .with_default("public.uuid_generate_v7()"),
                ColumnSchema::new("email", "VARCHAR(255)").not_null().unique(),
                ColumnSchema::new("created_at", "TIMESTAMP").with_default("CURRENT_TIMESTAMP"),
            ],
            indexes: vec![IndexSchema::new(
                "idx_sample_email",
                vec!["email".to_string()],
            )],
            foreign_keys: Vec::new(),
        }
    }

    #[test]
    fn test_create_table_headers() {
        let emitter = SqlEmitter::new(Dialect::Postgres);
        let sql = emitter.create_table("Sample", "sample", &sample_table());

        assert!(sql.starts_with("-- create_sample_table\n"));
        assert!(sql.contains("-- Entity: Sample"));
        assert!(sql.contains("-- Database: POSTGRES"));
        assert!(sql.contains("CREATE TABLE sample ("));
        assert!(sql.ends_with("\n);"));
    }

    #[test]
    fn test_create_table_alignment() {
        let emitter = SqlEmitter::new(Dialect::Postgres);
        let sql = emitter.create_table("Sample", "sample", &sample_table());

        // Widest name is created_at (10); id pads to match
        assert!(sql.contains("    id         UUID"));
        assert!(sql.contains("    created_at TIMESTAMP"));
    }

    #[test]
    fn test_constraint_order() {
        let emitter = SqlEmitter::new(Dialect::MariaDb);
        let table = TableSchema {
            columns: vec![ColumnSchema::new("id", "BIGINT")
                .primary_key()
                .auto_increment()],
            ..Default::default()
        };
        let sql = emitter.create_table("Order", "orders", &table);

        assert!(sql.contains("id BIGINT PRIMARY KEY AUTO_INCREMENT"));
        // PRIMARY KEY implies NOT NULL, which is not repeated
        assert!(!sql.contains("NOT NULL"));
    }

    #[test]
    fn test_last_column_has_no_trailing_comma() {
        let emitter = SqlEmitter::new(Dialect::Postgres);
        let sql = emitter.create_table("Sample", "sample", &sample_table());

        assert!(sql.contains("DEFAULT CURRENT_TIMESTAMP\n);"));
    }

    #[test]
    fn test_foreign_keys() {
        let emitter = SqlEmitter::new(Dialect::Postgres);
        let table = TableSchema {
            foreign_keys: vec![ForeignKeySchema::new(
                "author_id",
                "user",
                "id",
                OnDelete::SetNull,
            )],
            ..Default::default()
        };

        let sql = emitter.foreign_keys(&[("post".to_string(), table)]);
        assert_eq!(
            sql,
            "ALTER TABLE post ADD CONSTRAINT fk_post_author_id FOREIGN KEY (author_id) \
             REFERENCES user(id) ON DELETE SET NULL;"
        );
    }

    #[test]
    fn test_indexes() {
        let emitter = SqlEmitter::new(Dialect::Postgres);
        let table = TableSchema {
            indexes: vec![
                IndexSchema::new("idx_sample_email", vec!["email".to_string()]),
                IndexSchema::new(
                    "idx_sample_name",
                    vec!["last_name".to_string(), "first_name".to_string()],
                )
                .unique(),
            ],
            ..Default::default()
        };

        let sql = emitter.indexes(&[("sample".to_string(), table)]);
        assert!(sql.contains("CREATE INDEX idx_sample_email ON sample (email);"));
        assert!(sql.contains("CREATE UNIQUE INDEX idx_sample_name ON sample (last_name, first_name);"));
    }

    #[test]
    fn test_uuid_setup_postgres_v7() {
        let emitter = SqlEmitter::new(Dialect::Postgres);
        let sql = emitter.uuid_setup(UuidPolicy::V7).unwrap();

        assert!(sql.contains("CREATE EXTENSION IF NOT EXISTS pgcrypto SCHEMA public;"));
        assert!(sql.contains("CREATE OR REPLACE FUNCTION public.uuid_generate_v7()"));
    }

    #[test]
    fn test_uuid_setup_postgres_v4() {
        let emitter = SqlEmitter::new(Dialect::Postgres);
        let sql = emitter.uuid_setup(UuidPolicy::V4).unwrap();

        assert!(sql.contains("\"uuid-ossp\""));
    }

    #[test]
    fn test_uuid_setup_mariadb_is_skipped() {
        let emitter = SqlEmitter::new(Dialect::MariaDb);
        assert!(emitter.uuid_setup(UuidPolicy::V7).is_none());
        assert!(emitter.uuid_setup(UuidPolicy::V4).is_none());
    }
}

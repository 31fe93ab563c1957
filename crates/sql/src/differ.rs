//! Schema diffing
//!
//! Compares two [`TableSchema`] values and renders an idempotent ALTER
//! script body. Both sides are normalized first so that whitespace and
//! case differences in type spellings never produce spurious changes.
//!
//! Columns are never dropped automatically; a removed column surfaces as
//! a comment pair so a human decides about the data.

use std::collections::BTreeMap;

use stratum_ir::{ColumnSchema, ForeignKeySchema, IndexSchema, TableSchema};

/// Produces ALTER-script bodies from schema pairs
#[derive(Debug, Clone, Copy, Default)]
pub struct MigrationDiffer;

impl MigrationDiffer {
    pub fn new() -> Self {
        Self
    }

    /// Diff `old` against `new` for one table
    ///
    /// Returns the ALTER body, or an empty string when the schemas are
    /// equivalent (the caller must then skip writing a file).
    pub fn diff(&self, table: &str, old: &TableSchema, new: &TableSchema) -> String {
        let old = normalize(old);
        let new = normalize(new);

        let mut sections = Vec::new();

        let columns = self.diff_columns(table, &old, &new);
        if !columns.is_empty() {
            sections.push(format!("-- Column changes\n{}", columns.join("\n")));
        }

        let indexes = self.diff_indexes(table, &old, &new);
        if !indexes.is_empty() {
            sections.push(format!("-- Index changes\n{}", indexes.join("\n")));
        }

        let foreign_keys = self.diff_foreign_keys(table, &old, &new);
        if !foreign_keys.is_empty() {
            sections.push(format!("-- Foreign key changes\n{}", foreign_keys.join("\n")));
        }

        sections.join("\n\n")
    }

    fn diff_columns(&self, table: &str, old: &TableSchema, new: &TableSchema) -> Vec<String> {
        let old_by_name: BTreeMap<&str, &ColumnSchema> =
            old.columns.iter().map(|c| (c.name.as_str(), c)).collect();
        let new_by_name: BTreeMap<&str, &ColumnSchema> =
            new.columns.iter().map(|c| (c.name.as_str(), c)).collect();

        let mut statements = Vec::new();

        for (&name, &column) in &new_by_name {
            match old_by_name.get(name) {
                None => statements.push(add_column_statement(table, column)),
                Some(&previous) => {
                    statements.extend(modify_column_statements(table, previous, column))
                }
            }
        }

        for (&name, &column) in &old_by_name {
            if !new_by_name.contains_key(name) && !column.primary_key {
                statements.push(format!(
                    "-- WARNING: Column '{}' was removed from entity\n\
                     -- Consider: ALTER TABLE {} DROP COLUMN {};",
                    name, table, name
                ));
            }
        }

        statements
    }

    fn diff_indexes(&self, table: &str, old: &TableSchema, new: &TableSchema) -> Vec<String> {
        // Indexes are keyed by their sorted column list, not their name
        let key = |index: &IndexSchema| {
            let mut columns = index.columns.clone();
            columns.sort();
            columns.join(",")
        };

        let old_by_cols: BTreeMap<String, &IndexSchema> =
            old.indexes.iter().map(|i| (key(i), i)).collect();
        let new_by_cols: BTreeMap<String, &IndexSchema> =
            new.indexes.iter().map(|i| (key(i), i)).collect();

        let mut statements = Vec::new();

        for (cols, &index) in &new_by_cols {
            if !old_by_cols.contains_key(cols) {
                let unique = if index.unique { "UNIQUE " } else { "" };
                statements.push(format!(
                    "CREATE {}INDEX {} ON {} ({});",
                    unique,
                    index.name,
                    table,
                    index.columns.join(", ")
                ));
            }
        }

        for (cols, &index) in &old_by_cols {
            if !new_by_cols.contains_key(cols) {
                statements.push(format!("DROP INDEX IF EXISTS {};", index.name));
            }
        }

        statements
    }

    fn diff_foreign_keys(&self, table: &str, old: &TableSchema, new: &TableSchema) -> Vec<String> {
        let old_by_col: BTreeMap<&str, &ForeignKeySchema> = old
            .foreign_keys
            .iter()
            .map(|fk| (fk.column.as_str(), fk))
            .collect();
        let new_by_col: BTreeMap<&str, &ForeignKeySchema> = new
            .foreign_keys
            .iter()
            .map(|fk| (fk.column.as_str(), fk))
            .collect();

        let mut statements = Vec::new();

        for (&column, &fk) in &new_by_col {
            match old_by_col.get(column) {
                None => statements.push(add_foreign_key_statement(table, fk)),
                Some(&previous) if !same_reference(previous, fk) => {
                    statements.push(format!(
                        "ALTER TABLE {} DROP CONSTRAINT {};",
                        table,
                        fk.constraint_name(table)
                    ));
                    statements.push(add_foreign_key_statement(table, fk));
                }
                Some(_) => {}
            }
        }

        for (&column, &fk) in &old_by_col {
            if !new_by_col.contains_key(column) {
                statements.push(format!(
                    "ALTER TABLE {} DROP CONSTRAINT {};",
                    table,
                    fk.constraint_name(table)
                ));
            }
        }

        statements
    }
}

fn add_column_statement(table: &str, column: &ColumnSchema) -> String {
    let mut statement = format!(
        "ALTER TABLE {} ADD COLUMN {} {}",
        table, column.name, column.sql_type
    );
    if !column.nullable {
        statement.push_str(" NOT NULL");
    }
    if column.unique {
        statement.push_str(" UNIQUE");
    }
    if let Some(default) = &column.default {
        statement.push_str(&format!(" DEFAULT {}", default));
    }
    statement.push(';');
    statement
}

/// Modification statements in a fixed sub-order: type, nullability,
/// uniqueness
fn modify_column_statements(table: &str, old: &ColumnSchema, new: &ColumnSchema) -> Vec<String> {
    let mut statements = Vec::new();

    if old.sql_type != new.sql_type {
        statements.push(format!(
            "ALTER TABLE {} ALTER COLUMN {} TYPE {};",
            table, new.name, new.sql_type
        ));
    }

    if old.nullable != new.nullable {
        if new.nullable {
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} DROP NOT NULL;",
                table, new.name
            ));
        } else {
            statements.push(format!(
                "ALTER TABLE {} ALTER COLUMN {} SET NOT NULL;",
                table, new.name
            ));
        }
    }

    if old.unique != new.unique {
        let constraint = format!("uq_{}_{}", table, new.name);
        if new.unique {
            statements.push(format!(
                "ALTER TABLE {} ADD CONSTRAINT {} UNIQUE ({});",
                table, constraint, new.name
            ));
        } else {
            statements.push(format!(
                "ALTER TABLE {} DROP CONSTRAINT {};",
                table, constraint
            ));
        }
    }

    statements
}

fn add_foreign_key_statement(table: &str, fk: &ForeignKeySchema) -> String {
    format!(
        "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({}) ON DELETE {};",
        table,
        fk.constraint_name(table),
        fk.column,
        fk.referenced_table,
        fk.referenced_column,
        fk.on_delete.as_sql(),
    )
}

fn same_reference(a: &ForeignKeySchema, b: &ForeignKeySchema) -> bool {
    a.referenced_table == b.referenced_table
        && a.referenced_column == b.referenced_column
        && a.on_delete == b.on_delete
}

/// Normalize a schema for comparison
///
/// Trims names, uppercases type spellings with internal whitespace
/// collapsed, case-folds NOW(), and sorts columns, indexes and foreign
/// keys into their diffing orders.
fn normalize(schema: &TableSchema) -> TableSchema {
    let mut columns: Vec<ColumnSchema> = schema
        .columns
        .iter()
        .map(|c| ColumnSchema {
            name: c.name.trim().to_string(),
            sql_type: normalize_type(&c.sql_type),
            default: c.default.as_ref().map(|d| normalize_default(d)),
            ..c.clone()
        })
        .collect();
    columns.sort_by(|a, b| a.name.cmp(&b.name));

    let mut indexes = schema.indexes.clone();
    indexes.sort_by(|a, b| {
        (a.columns.len(), a.columns.join(","), a.name.clone()).cmp(&(
            b.columns.len(),
            b.columns.join(","),
            b.name.clone(),
        ))
    });

    let mut foreign_keys = schema.foreign_keys.clone();
    foreign_keys.sort_by(|a, b| a.column.cmp(&b.column));

    TableSchema {
        columns,
        indexes,
        foreign_keys,
    }
}

fn normalize_type(sql_type: &str) -> String {
    sql_type
        .trim()
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn normalize_default(default: &str) -> String {
    let trimmed = default.trim();
    if trimmed.eq_ignore_ascii_case("now()") {
        return "NOW()".to_string();
    }
    trimmed.to_string()
}

//! Entity projection
//!
//! Projects one entity descriptor into a [`TableSchema`]: dialect-mapped
//! column types, synthesized relation columns and foreign keys, flattened
//! embedded values, and the heuristic indexes the generator adds on top
//! of explicit declarations.

use std::collections::HashMap;

use tracing::warn;

use stratum_core::{Dialect, LogicalType, StratumResult, UuidPolicy};
use stratum_ir::{
    ColumnSchema, EntityDescriptor, FieldDescriptor, FieldKind, ForeignKeySchema, IdStrategy,
    IndexSchema, OnDelete, TableSchema,
};
use stratum_sql::sql_type;

/// Column names that get a single-column index when nothing covers them
const HEURISTIC_INDEX_COLUMNS: [&str; 4] = ["email", "username", "subject", "code"];

/// Projects entity descriptors into physical table schemas
///
/// The projector holds every descriptor of the run so a relation's key
/// type is a pure lookup; cyclic references between entities are benign
/// because no object graph is ever built.
pub struct EntityProjector {
    dialect: Dialect,
    uuid: UuidPolicy,
    entities: HashMap<String, EntityDescriptor>,
}

impl EntityProjector {
    pub fn new(dialect: Dialect, uuid: UuidPolicy, entities: &[EntityDescriptor]) -> Self {
        Self {
            dialect,
            uuid,
            entities: entities
                .iter()
                .map(|e| (e.name.clone(), e.clone()))
                .collect(),
        }
    }

    /// Project one entity into its table schema
    pub fn project(&self, entity: &EntityDescriptor) -> StratumResult<TableSchema> {
        let table = entity.table_name();
        let mut schema = TableSchema::new();

        for field in &entity.fields {
            match &field.kind {
                FieldKind::Id { strategy } => {
                    schema.columns.push(self.project_id(field, *strategy));
                }
                FieldKind::ToOne { target, join } => {
                    let column_name = field.join_column_name();
                    let nullable = join
                        .as_ref()
                        .and_then(|j| j.nullable)
                        .unwrap_or(true);

                    let mut column = ColumnSchema::new(&column_name, self.key_type_of(target));
                    column.nullable = nullable;
                    schema.columns.push(column);

                    let on_delete = if nullable {
                        OnDelete::SetNull
                    } else {
                        OnDelete::Cascade
                    };
                    let mut fk = ForeignKeySchema::new(
                        column_name,
                        self.table_name_of(target),
                        "id",
                        on_delete,
                    );
                    if let Some(name) = join.as_ref().and_then(|j| j.foreign_key_name.clone()) {
                        fk = fk.with_name(name);
                    }
                    schema.foreign_keys.push(fk);
                }
                FieldKind::ToMany => {
                    // Join tables are out of scope; the owning side carries the key
                }
                FieldKind::Embedded { inner } => {
                    for inner_field in &inner.fields {
                        let name = inner.column_name_for(&field.name, inner_field);
                        let mut column = ColumnSchema::new(
                            name,
                            sql_type(&inner_field.logical_type, &inner_field.column, self.dialect),
                        );
                        column.nullable = inner_field.column.nullable != Some(false);
                        column.unique = inner_field.column.unique;
                        schema.columns.push(column);
                    }
                }
                FieldKind::Plain => {
                    schema.columns.push(self.project_plain(field));
                }
            }
        }

        schema.indexes = self.project_indexes(entity, &table, &schema);

        Ok(schema)
    }

    /// Project the primary-key column
    fn project_id(&self, field: &FieldDescriptor, strategy: Option<IdStrategy>) -> ColumnSchema {
        let name = field.column_name();

        match strategy {
            Some(IdStrategy::Uuid) => {
                let (sql, default) = match self.dialect {
                    Dialect::Postgres => ("UUID", self.postgres_uuid_default()),
                    // UUID_V7 on MariaDB silently falls back to UUID()
                    Dialect::MariaDb => ("CHAR(36)", "(UUID())"),
                };
                ColumnSchema::new(name, sql).primary_key().with_default(default)
            }
            Some(IdStrategy::Identity) => match self.dialect {
                Dialect::Postgres => ColumnSchema::new(name, "BIGSERIAL").primary_key(),
                Dialect::MariaDb => ColumnSchema::new(name, "BIGINT")
                    .primary_key()
                    .auto_increment(),
            },
            None => {
                let mut column =
                    ColumnSchema::new(name, sql_type(&field.logical_type, &field.column, self.dialect))
                        .primary_key();
                if let Some(default) = &field.column.default {
                    column = column.with_default(default.clone());
                }
                column
            }
        }
    }

    fn postgres_uuid_default(&self) -> &'static str {
        match self.uuid {
            UuidPolicy::V7 => "public.uuid_generate_v7()",
            UuidPolicy::V4 => "public.uuid_generate_v4()",
        }
    }

    /// Project an ordinary column
    fn project_plain(&self, field: &FieldDescriptor) -> ColumnSchema {
        let name = field.column_name();
        let mut column =
            ColumnSchema::new(&name, sql_type(&field.logical_type, &field.column, self.dialect));

        column.nullable = field.column.nullable != Some(false);
        column.unique = field.column.unique;
        column.default = field.column.default.clone();

        // Audit timestamp columns default to the database clock
        if column.default.is_none() && (name == "created_at" || name == "updated_at") {
            column.default = Some("CURRENT_TIMESTAMP".to_string());
        }

        column
    }

    /// Explicit indexes first, then heuristic single-column indexes for
    /// relation columns and well-known lookup columns
    fn project_indexes(
        &self,
        entity: &EntityDescriptor,
        table: &str,
        schema: &TableSchema,
    ) -> Vec<IndexSchema> {
        let mut indexes: Vec<IndexSchema> = entity
            .table
            .indexes
            .iter()
            .map(|decl| IndexSchema {
                name: decl.name.clone(),
                columns: decl.columns.clone(),
                unique: decl.unique,
            })
            .collect();

        // A column counts as covered when it leads an existing index
        let covered = |indexes: &[IndexSchema], column: &str| {
            indexes
                .iter()
                .any(|i| i.columns.first().map(String::as_str) == Some(column))
        };

        for field in entity.to_one_fields() {
            let column = field.join_column_name();
            if !covered(&indexes, &column) {
                indexes.push(IndexSchema::new(
                    format!("idx_{}_{}", table, column),
                    vec![column],
                ));
            }
        }

        let relation_columns: Vec<String> = entity
            .to_one_fields()
            .map(|f| f.join_column_name())
            .collect();
        for column in &schema.columns {
            if relation_columns.contains(&column.name) {
                continue;
            }
            if HEURISTIC_INDEX_COLUMNS.contains(&column.name.as_str())
                && !covered(&indexes, &column.name)
            {
                indexes.push(IndexSchema::new(
                    format!("idx_{}_{}", table, column.name),
                    vec![column.name.clone()],
                ));
            }
        }

        // De-duplicate by (name, columns)
        let mut seen = Vec::new();
        indexes.retain(|index| {
            let key = (index.name.clone(), index.columns.clone());
            if seen.contains(&key) {
                false
            } else {
                seen.push(key);
                true
            }
        });

        indexes
    }

    /// The SQL key type another entity's to-one relation column gets
    ///
    /// This is a pure function of the referenced descriptor, so mutual
    /// references never recurse.
    pub fn key_type_of(&self, entity_name: &str) -> String {
        let Some(entity) = self.entities.get(entity_name) else {
            warn!(
                "relation target '{}' is not part of this run; using BIGINT",
                entity_name
            );
            return "BIGINT".to_string();
        };

        let Some(id) = entity.id_field() else {
            warn!("entity '{}' has no id field; using BIGINT", entity_name);
            return "BIGINT".to_string();
        };

        match &id.kind {
            FieldKind::Id {
                strategy: Some(IdStrategy::Uuid),
            } => match self.dialect {
                Dialect::Postgres => "UUID".to_string(),
                Dialect::MariaDb => "CHAR(36)".to_string(),
            },
            FieldKind::Id {
                strategy: Some(IdStrategy::Identity),
            } => "BIGINT".to_string(),
            _ => sql_type(&id.logical_type, &id.column, self.dialect),
        }
    }

    /// Physical table name of a relation target
    fn table_name_of(&self, entity_name: &str) -> String {
        match self.entities.get(entity_name) {
            Some(entity) => entity.table_name(),
            None => stratum_core::to_snake_case(entity_name),
        }
    }

    /// Whether this entity's primary key is database-generated UUID
    pub fn entity_uses_uuid(&self, entity: &EntityDescriptor) -> bool {
        matches!(
            entity.id_field().map(|f| &f.kind),
            Some(FieldKind::Id {
                strategy: Some(IdStrategy::Uuid)
            })
        )
    }
}

//! Descriptor validation
//!
//! Checks an entity-descriptor set for problems before projection. Errors
//! make the generator refuse to write anything; warnings are surfaced but
//! do not halt a run.

use std::collections::HashMap;

use crate::entity::EntityDescriptor;
use crate::field::FieldKind;

/// Severity of a validation issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationSeverity {
    Error,
    Warning,
}

/// Categories of validation issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationKind {
    DuplicateTableName,
    MultiplePrimaryKeys,
    MissingPrimaryKey,
    EmptyEmbedded,
    UnknownIndexColumn,
    UnknownRelationTarget,
}

/// A validation issue with context
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub kind: ValidationKind,
    pub message: String,
    /// Entity the issue was found on, if any
    pub entity: Option<String>,
    pub severity: ValidationSeverity,
}

impl ValidationIssue {
    fn error(kind: ValidationKind, entity: &EntityDescriptor, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            entity: Some(entity.name.clone()),
            severity: ValidationSeverity::Error,
        }
    }

    fn warning(kind: ValidationKind, entity: &EntityDescriptor, message: impl Into<String>) -> Self {
        Self {
            severity: ValidationSeverity::Warning,
            ..Self::error(kind, entity, message)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, ValidationSeverity::Error)
    }

    pub fn is_warning(&self) -> bool {
        matches!(self.severity, ValidationSeverity::Warning)
    }
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            ValidationSeverity::Error => "ERROR",
            ValidationSeverity::Warning => "WARNING",
        };

        match &self.entity {
            Some(entity) => write!(f, "[{}] {}: {}", prefix, entity, self.message),
            None => write!(f, "[{}] {}", prefix, self.message),
        }
    }
}

/// Run all checks over a descriptor set
pub fn get_all_issues(entities: &[EntityDescriptor]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    check_duplicate_table_names(entities, &mut issues);

    for entity in entities {
        check_primary_keys(entity, &mut issues);
        check_embedded_fields(entity, &mut issues);
        check_index_columns(entity, &mut issues);
        check_relation_targets(entity, entities, &mut issues);
    }

    issues
}

/// Check a set and return only error-severity issues
pub fn get_errors(entities: &[EntityDescriptor]) -> Vec<ValidationIssue> {
    get_all_issues(entities)
        .into_iter()
        .filter(|i| i.is_error())
        .collect()
}

fn check_duplicate_table_names(entities: &[EntityDescriptor], issues: &mut Vec<ValidationIssue>) {
    let mut seen: HashMap<String, &EntityDescriptor> = HashMap::new();

    for entity in entities {
        let table = entity.table_name().to_lowercase();
        match seen.get(&table) {
            Some(first) => issues.push(ValidationIssue::error(
                ValidationKind::DuplicateTableName,
                entity,
                format!(
                    "table name '{}' is already used by entity '{}'",
                    table, first.name
                ),
            )),
            None => {
                seen.insert(table, entity);
            }
        }
    }
}

fn check_primary_keys(entity: &EntityDescriptor, issues: &mut Vec<ValidationIssue>) {
    let id_count = entity.fields.iter().filter(|f| f.is_id()).count();

    if id_count > 1 {
        issues.push(ValidationIssue::error(
            ValidationKind::MultiplePrimaryKeys,
            entity,
            format!("{} fields are marked as the primary key", id_count),
        ));
    } else if id_count == 0 {
        issues.push(ValidationIssue::warning(
            ValidationKind::MissingPrimaryKey,
            entity,
            "no primary-key field declared",
        ));
    }
}

fn check_embedded_fields(entity: &EntityDescriptor, issues: &mut Vec<ValidationIssue>) {
    for field in &entity.fields {
        if let FieldKind::Embedded { inner } = &field.kind {
            if inner.fields.is_empty() {
                issues.push(ValidationIssue::error(
                    ValidationKind::EmptyEmbedded,
                    entity,
                    format!(
                        "embedded field '{}' ({}) declares no inner fields",
                        field.name, inner.type_name
                    ),
                ));
            }
        }
    }
}

fn check_index_columns(entity: &EntityDescriptor, issues: &mut Vec<ValidationIssue>) {
    let columns = entity.projected_column_names();

    for index in &entity.table.indexes {
        for col in &index.columns {
            if !columns.iter().any(|c| c == col) {
                issues.push(ValidationIssue::error(
                    ValidationKind::UnknownIndexColumn,
                    entity,
                    format!("index '{}' references unknown column '{}'", index.name, col),
                ));
            }
        }
    }
}

fn check_relation_targets(
    entity: &EntityDescriptor,
    all: &[EntityDescriptor],
    issues: &mut Vec<ValidationIssue>,
) {
    for field in &entity.fields {
        if let FieldKind::ToOne { target, .. } = &field.kind {
            if !all.iter().any(|e| &e.name == target) {
                issues.push(ValidationIssue::warning(
                    ValidationKind::UnknownRelationTarget,
                    entity,
                    format!(
                        "relation '{}' targets unknown entity '{}'; its key type falls back to BIGINT",
                        field.name, target
                    ),
                ));
            }
        }
    }
}

//! Field descriptors
//!
//! Fields describe the persistent members of an entity. Each field carries
//! a [`FieldKind`] that mirrors the annotation that produced it (id,
//! to-one relation, collection, embedded value, plain column) plus the
//! column-level metadata the projector needs. Callers populate these from
//! their own metadata source; nothing here performs reflection.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use stratum_core::{to_snake_case, LogicalType};

/// Primary-key generation strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Database-generated UUID (version per the run's UUID policy)
    Uuid,
    /// Auto-incrementing integer key
    Identity,
}

/// Column-level metadata attached to a field
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnMeta {
    /// Explicit physical column name
    pub name: Option<String>,
    /// Tri-state nullability; only an explicit `false` forces NOT NULL
    pub nullable: Option<bool>,
    /// Whether the column carries a UNIQUE constraint
    pub unique: bool,
    /// Length for character types
    pub length: Option<u32>,
    /// Precision for decimal types
    pub precision: Option<u32>,
    /// Scale for decimal types
    pub scale: Option<u32>,
    /// Verbatim column definition override; wins over all type mapping
    pub definition: Option<String>,
    /// Raw SQL fragment emitted after DEFAULT
    pub default: Option<String>,
}

/// Join metadata for to-one relations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JoinMeta {
    /// Explicit join column name
    pub column: Option<String>,
    /// Tri-state nullability of the join column (absent means nullable)
    pub nullable: Option<bool>,
    /// Explicit foreign-key constraint name
    pub foreign_key_name: Option<String>,
}

/// One declared field of an embedded value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedField {
    /// Field name inside the embedded type
    pub name: String,
    /// Logical type of the inner field
    pub logical_type: LogicalType,
    /// Column metadata from the inner annotations
    pub column: ColumnMeta,
}

impl EmbeddedField {
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            column: ColumnMeta::default(),
        }
    }

    /// Force NOT NULL on the flattened column
    pub fn not_null(mut self) -> Self {
        self.column.nullable = Some(false);
        self
    }

    /// Add a UNIQUE constraint to the flattened column
    pub fn unique(mut self) -> Self {
        self.column.unique = true;
        self
    }

    /// Set the character length
    pub fn with_length(mut self, length: u32) -> Self {
        self.column.length = Some(length);
        self
    }
}

/// An embedded value type flattened into the owning table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedMeta {
    /// Simple name of the embedded type
    pub type_name: String,
    /// Declared (non-static) fields of the embedded type
    pub fields: Vec<EmbeddedField>,
    /// Attribute overrides: inner field name to explicit column name
    pub overrides: BTreeMap<String, String>,
}

impl EmbeddedMeta {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
            overrides: BTreeMap::new(),
        }
    }

    /// Add an inner field
    pub fn with_field(mut self, field: EmbeddedField) -> Self {
        self.fields.push(field);
        self
    }

    /// Override the column name for one inner field
    pub fn with_override(
        mut self,
        inner_field: impl Into<String>,
        column_name: impl Into<String>,
    ) -> Self {
        self.overrides.insert(inner_field.into(), column_name.into());
        self
    }

    /// Resolve the flattened column name for one inner field
    pub fn column_name_for(&self, outer_field: &str, inner: &EmbeddedField) -> String {
        match self.overrides.get(&inner.name) {
            Some(explicit) => explicit.clone(),
            None => format!(
                "{}_{}",
                to_snake_case(outer_field),
                to_snake_case(&inner.name)
            ),
        }
    }
}

/// The annotation-shaped kind of a field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Primary-key field
    Id { strategy: Option<IdStrategy> },
    /// Many-to-one or one-to-one relation, owning a join column
    ToOne {
        /// Simple name of the referenced entity
        target: String,
        join: Option<JoinMeta>,
    },
    /// One-to-many or many-to-many relation; never projects a column
    ToMany,
    /// Embedded value object, flattened into the owning table
    Embedded { inner: EmbeddedMeta },
    /// Ordinary column
    Plain,
}

/// A persistent field of an entity descriptor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Field name as declared on the class
    pub name: String,
    /// Logical type, ignored for relations (the target's key type wins)
    pub logical_type: LogicalType,
    /// Annotation kind
    pub kind: FieldKind,
    /// Column metadata
    pub column: ColumnMeta,
}

impl FieldDescriptor {
    /// Create a plain field with the given name and logical type
    pub fn new(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            kind: FieldKind::Plain,
            column: ColumnMeta::default(),
        }
    }

    /// Create a plain string field
    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, LogicalType::String)
    }

    /// Create a plain integer field
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, LogicalType::Int)
    }

    /// Create a plain long field
    pub fn long(name: impl Into<String>) -> Self {
        Self::new(name, LogicalType::Long)
    }

    /// Create a plain boolean field
    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, LogicalType::Bool)
    }

    /// Create a plain decimal field
    pub fn decimal(name: impl Into<String>) -> Self {
        Self::new(name, LogicalType::Decimal)
    }

    /// Create a plain datetime field
    pub fn datetime(name: impl Into<String>) -> Self {
        Self::new(name, LogicalType::DateTime)
    }

    /// Create a plain date field
    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, LogicalType::Date)
    }

    /// Create a plain JSON document field
    pub fn json(name: impl Into<String>) -> Self {
        Self::new(name, LogicalType::Json)
    }

    /// Create a plain enum-marked field
    pub fn enumeration(name: impl Into<String>) -> Self {
        Self::new(name, LogicalType::Enumeration)
    }

    /// Create a UUID-strategy primary key
    pub fn uuid_id(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_type: LogicalType::Uuid,
            kind: FieldKind::Id {
                strategy: Some(IdStrategy::Uuid),
            },
            column: ColumnMeta::default(),
        }
    }

    /// Create an identity-strategy primary key
    pub fn identity_id(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_type: LogicalType::Long,
            kind: FieldKind::Id {
                strategy: Some(IdStrategy::Identity),
            },
            column: ColumnMeta::default(),
        }
    }

    /// Create a primary key without a generation strategy
    pub fn plain_id(name: impl Into<String>, logical_type: LogicalType) -> Self {
        Self {
            name: name.into(),
            logical_type,
            kind: FieldKind::Id { strategy: None },
            column: ColumnMeta::default(),
        }
    }

    /// Create a many-to-one relation to the named entity
    pub fn many_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_type: LogicalType::Long,
            kind: FieldKind::ToOne {
                target: target.into(),
                join: None,
            },
            column: ColumnMeta::default(),
        }
    }

    /// Create a one-to-one relation to the named entity
    pub fn one_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::many_to_one(name, target)
    }

    /// Create a collection relation (never projects a column)
    pub fn to_many(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            logical_type: LogicalType::Other("Collection".to_string()),
            kind: FieldKind::ToMany,
            column: ColumnMeta::default(),
        }
    }

    /// Create an embedded value field
    pub fn embedded(name: impl Into<String>, inner: EmbeddedMeta) -> Self {
        Self {
            name: name.into(),
            logical_type: LogicalType::Other(inner.type_name.clone()),
            kind: FieldKind::Embedded { inner },
            column: ColumnMeta::default(),
        }
    }

    // ============ Builder Methods ============

    /// Force NOT NULL
    pub fn not_null(mut self) -> Self {
        self.column.nullable = Some(false);
        self
    }

    /// Add a UNIQUE constraint
    pub fn unique(mut self) -> Self {
        self.column.unique = true;
        self
    }

    /// Set an explicit physical column name
    pub fn with_column_name(mut self, name: impl Into<String>) -> Self {
        self.column.name = Some(name.into());
        self
    }

    /// Set the character length
    pub fn with_length(mut self, length: u32) -> Self {
        self.column.length = Some(length);
        self
    }

    /// Set decimal precision and scale
    pub fn with_precision(mut self, precision: u32, scale: u32) -> Self {
        self.column.precision = Some(precision);
        self.column.scale = Some(scale);
        self
    }

    /// Set a verbatim column definition override
    pub fn with_definition(mut self, definition: impl Into<String>) -> Self {
        self.column.definition = Some(definition.into());
        self
    }

    /// Set a raw SQL default fragment
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.column.default = Some(default.into());
        self
    }

    /// Set join metadata on a to-one relation; no-op for other kinds
    pub fn with_join(mut self, join: JoinMeta) -> Self {
        if let FieldKind::ToOne { join: slot, .. } = &mut self.kind {
            *slot = Some(join);
        }
        self
    }

    // ============ Utility Methods ============

    /// Check if this is a primary-key field
    pub fn is_id(&self) -> bool {
        matches!(self.kind, FieldKind::Id { .. })
    }

    /// Check if this is a to-one relation
    pub fn is_to_one(&self) -> bool {
        matches!(self.kind, FieldKind::ToOne { .. })
    }

    /// Check if this is a collection relation
    pub fn is_to_many(&self) -> bool {
        matches!(self.kind, FieldKind::ToMany)
    }

    /// Physical column name for id and plain fields
    pub fn column_name(&self) -> String {
        self.column
            .name
            .clone()
            .unwrap_or_else(|| to_snake_case(&self.name))
    }

    /// Physical join column name for to-one relations
    pub fn join_column_name(&self) -> String {
        if let FieldKind::ToOne { join, .. } = &self.kind {
            if let Some(explicit) = join.as_ref().and_then(|j| j.column.clone()) {
                return explicit;
            }
        }
        format!("{}_id", to_snake_case(&self.name))
    }

    /// Every physical column name this field projects to
    ///
    /// Plain and id fields project one column, to-one relations project
    /// their join column, embedded fields project one column per inner
    /// field, collections project none.
    pub fn projected_column_names(&self) -> Vec<String> {
        match &self.kind {
            FieldKind::Id { .. } | FieldKind::Plain => vec![self.column_name()],
            FieldKind::ToOne { .. } => vec![self.join_column_name()],
            FieldKind::ToMany => Vec::new(),
            FieldKind::Embedded { inner } => inner
                .fields
                .iter()
                .map(|f| inner.column_name_for(&self.name, f))
                .collect(),
        }
    }
}

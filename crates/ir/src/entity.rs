//! Entity descriptors
//!
//! An [`EntityDescriptor`] is the abstract, annotation-shaped description
//! of one persistent class: its table metadata, its partition, and its
//! fields in first-seen order (inherited fields included, transient and
//! static members already excluded by the caller's facade).

use serde::{Deserialize, Serialize};

use stratum_core::to_snake_case;

use crate::field::FieldDescriptor;

/// An explicitly declared index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexDecl {
    /// Index name
    pub name: String,
    /// Ordered, non-empty column list
    pub columns: Vec<String>,
    /// Whether this is a unique index
    pub unique: bool,
}

impl IndexDecl {
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

/// Table-level metadata from the entity's annotations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableMeta {
    /// Explicit physical table name
    pub name: Option<String>,
    /// Explicit schema (partition) name
    pub schema: Option<String>,
    /// Explicitly declared indexes
    pub indexes: Vec<IndexDecl>,
}

/// Abstract description of one persistent entity class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    /// Simple class name
    pub name: String,
    /// Dotted package path the class lives in
    pub package: Option<String>,
    /// Table-level annotations
    pub table: TableMeta,
    /// Persistent fields, first-seen order
    pub fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    /// Create a new entity descriptor with the given simple name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: None,
            table: TableMeta::default(),
            fields: Vec::new(),
        }
    }

    /// Set the package path
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// Set an explicit table name
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table.name = Some(name.into());
        self
    }

    /// Set an explicit schema (partition) name
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.table.schema = Some(schema.into());
        self
    }

    /// Declare an index
    pub fn with_index(mut self, index: IndexDecl) -> Self {
        self.table.indexes.push(index);
        self
    }

    /// Add a field
    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Physical table name: explicit override or snake_case of the class name
    pub fn table_name(&self) -> String {
        match &self.table.name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => to_snake_case(&self.name),
        }
    }

    /// Partition folder: explicit schema (lowercased), else the last
    /// segment of the package path, else empty
    pub fn partition(&self) -> String {
        if let Some(schema) = &self.table.schema {
            if !schema.trim().is_empty() {
                return schema.to_lowercase();
            }
        }
        self.package
            .as_deref()
            .and_then(|p| p.rsplit('.').next())
            .map(|s| s.to_lowercase())
            .unwrap_or_default()
    }

    /// The primary-key field, if one is declared
    pub fn id_field(&self) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.is_id())
    }

    /// All to-one relation fields, in declaration order
    pub fn to_one_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_to_one())
    }

    /// Every physical column name this entity projects to
    pub fn projected_column_names(&self) -> Vec<String> {
        self.fields
            .iter()
            .flat_map(|f| f.projected_column_names())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_name_default() {
        let entity = EntityDescriptor::new("UserProfile");
        assert_eq!(entity.table_name(), "user_profile");
    }

    #[test]
    fn test_table_name_override() {
        let entity = EntityDescriptor::new("UserProfile").with_table_name("profiles");
        assert_eq!(entity.table_name(), "profiles");

        // Blank overrides fall back to the derived name
        let entity = EntityDescriptor::new("UserProfile").with_table_name("  ");
        assert_eq!(entity.table_name(), "user_profile");
    }

    #[test]
    fn test_partition_from_schema() {
        let entity = EntityDescriptor::new("User")
            .with_package("com.example.billing")
            .with_schema("Accounts");
        assert_eq!(entity.partition(), "accounts");
    }

    #[test]
    fn test_partition_from_package() {
        let entity = EntityDescriptor::new("User").with_package("com.example.billing");
        assert_eq!(entity.partition(), "billing");
    }

    #[test]
    fn test_partition_empty() {
        let entity = EntityDescriptor::new("User");
        assert_eq!(entity.partition(), "");
    }

    #[test]
    fn test_id_field() {
        let entity = EntityDescriptor::new("User")
            .with_field(FieldDescriptor::uuid_id("id"))
            .with_field(FieldDescriptor::string("email"));

        assert_eq!(entity.id_field().map(|f| f.name.as_str()), Some("id"));
    }

    #[test]
    fn test_projected_column_names() {
        let entity = EntityDescriptor::new("Post")
            .with_field(FieldDescriptor::identity_id("id"))
            .with_field(FieldDescriptor::many_to_one("author", "User"))
            .with_field(FieldDescriptor::string("title"));

        assert_eq!(
            entity.projected_column_names(),
            vec!["id".to_string(), "author_id".to_string(), "title".to_string()]
        );
    }
}

//! Serialization for entity-descriptor sets
//!
//! Descriptor sets are persisted as versioned JSON or TOML files so that
//! tools (and the CLI) can hand a whole entity package to the generator
//! without linking against the caller's metadata source.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use stratum_core::{StratumError, StratumResult};

use crate::entity::EntityDescriptor;
use crate::FORMAT_VERSION;

/// Supported descriptor file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DescriptorFormat {
    /// JSON format (default, human-readable)
    #[default]
    Json,
    /// Compact JSON (minified)
    JsonCompact,
    /// TOML format
    Toml,
}

impl DescriptorFormat {
    /// Get the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            DescriptorFormat::Json | DescriptorFormat::JsonCompact => "json",
            DescriptorFormat::Toml => "toml",
        }
    }

    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "json" => Some(DescriptorFormat::Json),
            "toml" => Some(DescriptorFormat::Toml),
            _ => None,
        }
    }

    /// Detect format from file path
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }
}

/// Wrapper for descriptor files with format version information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescriptorFile {
    /// Descriptor format version
    pub format_version: String,
    /// The entity descriptors
    pub entities: Vec<EntityDescriptor>,
}

impl DescriptorFile {
    /// Wrap a descriptor set in the current format version
    pub fn new(entities: Vec<EntityDescriptor>) -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            entities,
        }
    }

    /// Check major-version compatibility with the current format
    pub fn is_compatible(&self) -> bool {
        let current_major = FORMAT_VERSION.split('.').next().unwrap_or("1");
        let file_major = self.format_version.split('.').next().unwrap_or("0");
        current_major == file_major
    }
}

/// Load a descriptor set from a file path
pub fn load_entities(path: impl AsRef<Path>) -> StratumResult<Vec<EntityDescriptor>> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(StratumError::FileNotFound(path.display().to_string()));
    }

    let format = DescriptorFormat::from_path(path).unwrap_or(DescriptorFormat::Json);

    let mut file = fs::File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let descriptor_file: DescriptorFile = match format {
        DescriptorFormat::Json | DescriptorFormat::JsonCompact => serde_json::from_str(&contents)
            .map_err(|e| StratumError::Deserialization(format!("JSON parse error: {}", e)))?,
        DescriptorFormat::Toml => toml::from_str(&contents)
            .map_err(|e| StratumError::Deserialization(format!("TOML parse error: {}", e)))?,
    };

    if !descriptor_file.is_compatible() {
        return Err(StratumError::Deserialization(format!(
            "incompatible descriptor version: file is {}, current is {}",
            descriptor_file.format_version, FORMAT_VERSION
        )));
    }

    Ok(descriptor_file.entities)
}

/// Save a descriptor set to a file path
pub fn save_entities(
    entities: &[EntityDescriptor],
    path: impl AsRef<Path>,
    format: DescriptorFormat,
) -> StratumResult<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let descriptor_file = DescriptorFile::new(entities.to_vec());

    let contents = match format {
        DescriptorFormat::Json => serde_json::to_string_pretty(&descriptor_file)
            .map_err(|e| StratumError::Serialization(format!("JSON serialize error: {}", e)))?,
        DescriptorFormat::JsonCompact => serde_json::to_string(&descriptor_file)
            .map_err(|e| StratumError::Serialization(format!("JSON serialize error: {}", e)))?,
        DescriptorFormat::Toml => toml::to_string_pretty(&descriptor_file)
            .map_err(|e| StratumError::Serialization(format!("TOML serialize error: {}", e)))?,
    };

    let mut file = fs::File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;

    Ok(())
}

/// Load a descriptor set from a JSON string
pub fn load_from_json(json: &str) -> StratumResult<Vec<EntityDescriptor>> {
    let descriptor_file: DescriptorFile = serde_json::from_str(json)
        .map_err(|e| StratumError::Deserialization(format!("JSON parse error: {}", e)))?;

    if !descriptor_file.is_compatible() {
        return Err(StratumError::Deserialization(format!(
            "incompatible descriptor version: file is {}, current is {}",
            descriptor_file.format_version, FORMAT_VERSION
        )));
    }

    Ok(descriptor_file.entities)
}

/// Save a descriptor set to a JSON string
pub fn save_to_json(entities: &[EntityDescriptor], pretty: bool) -> StratumResult<String> {
    let descriptor_file = DescriptorFile::new(entities.to_vec());

    if pretty {
        serde_json::to_string_pretty(&descriptor_file)
            .map_err(|e| StratumError::Serialization(format!("JSON serialize error: {}", e)))
    } else {
        serde_json::to_string(&descriptor_file)
            .map_err(|e| StratumError::Serialization(format!("JSON serialize error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldDescriptor;

    fn create_test_entities() -> Vec<EntityDescriptor> {
        vec![
            EntityDescriptor::new("User")
                .with_package("com.example.accounts")
                .with_field(FieldDescriptor::uuid_id("id"))
                .with_field(FieldDescriptor::string("email").not_null().unique()),
            EntityDescriptor::new("Post")
                .with_package("com.example.content")
                .with_field(FieldDescriptor::identity_id("id"))
                .with_field(FieldDescriptor::many_to_one("author", "User")),
        ]
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DescriptorFormat::from_extension("json"),
            Some(DescriptorFormat::Json)
        );
        assert_eq!(
            DescriptorFormat::from_extension("TOML"),
            Some(DescriptorFormat::Toml)
        );
        assert_eq!(DescriptorFormat::from_extension("yaml"), None);
    }

    #[test]
    fn test_json_roundtrip() {
        let entities = create_test_entities();

        let json = save_to_json(&entities, true).unwrap();
        let loaded = load_from_json(&json).unwrap();

        assert_eq!(entities, loaded);
    }

    #[test]
    fn test_json_compact() {
        let entities = create_test_entities();

        let pretty = save_to_json(&entities, true).unwrap();
        let compact = save_to_json(&entities, false).unwrap();

        assert!(compact.len() < pretty.len());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.json");

        let entities = create_test_entities();
        save_entities(&entities, &path, DescriptorFormat::Json).unwrap();
        let loaded = load_entities(&path).unwrap();

        assert_eq!(entities, loaded);
    }

    #[test]
    fn test_toml_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entities.toml");

        let entities = create_test_entities();
        save_entities(&entities, &path, DescriptorFormat::Toml).unwrap();
        let loaded = load_entities(&path).unwrap();

        assert_eq!(entities, loaded);
    }

    #[test]
    fn test_missing_file() {
        let err = load_entities("no/such/file.json").unwrap_err();
        assert!(matches!(err, StratumError::FileNotFound(_)));
    }

    #[test]
    fn test_version_rejected() {
        let json = r#"{"format_version": "999.0.0", "entities": []}"#;
        let err = load_from_json(json).unwrap_err();
        assert!(matches!(err, StratumError::Deserialization(_)));
    }
}

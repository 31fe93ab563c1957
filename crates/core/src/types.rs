//! Core types used throughout Stratum
//!
//! These types form the foundation of the generator: the logical type
//! system the projector consumes and the dialect/policy knobs that steer
//! SQL rendering.

use serde::{Deserialize, Serialize};

/// Target SQL dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Postgres,
    MariaDb,
}

impl Dialect {
    /// Tag used in generated file header comments
    pub fn as_tag(&self) -> &'static str {
        match self {
            Dialect::Postgres => "POSTGRES",
            Dialect::MariaDb => "MARIADB",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Dialect::Postgres => "PostgreSQL",
            Dialect::MariaDb => "MariaDB",
        }
    }
}

/// UUID generation policy for UUID-strategy primary keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UuidPolicy {
    /// Random UUIDs via uuid-ossp (Postgres) or UUID() (MariaDB)
    V4,
    /// Time-ordered UUIDs via a generated helper function (Postgres).
    /// MariaDB has no v7 idiom and falls back to UUID().
    #[default]
    V7,
}

/// How the generator treats the output directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GenerationMode {
    /// Emit CREATE scripts for every entity, unconditionally
    CreateOnly,
    /// Diff every entity against the previously emitted schema
    AlterOnly,
    /// CREATE for tables not yet on disk, ALTER for the rest
    #[default]
    Smart,
}

/// Logical field types the projector understands
///
/// Callers populate these from their own metadata source; `from_name`
/// accepts the reflection-style spellings such sources typically carry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum LogicalType {
    String,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    Bool,
    DateTime,
    Date,
    Time,
    ZonedDateTime,
    Duration,
    Period,
    Uuid,
    Json,
    Url,
    Bytes,
    /// Enum-marked type; always stored as a short VARCHAR
    Enumeration,
    /// Unrecognized type name, mapped conservatively to VARCHAR
    Other(String),
}

impl LogicalType {
    /// Map a reflection-style type name onto the logical type system
    pub fn from_name(name: &str) -> Self {
        match name {
            "String" | "char" | "Character" | "CharSequence" => LogicalType::String,
            "byte" | "Byte" => LogicalType::Byte,
            "short" | "Short" => LogicalType::Short,
            "int" | "Integer" => LogicalType::Int,
            "long" | "Long" => LogicalType::Long,
            "float" | "Float" => LogicalType::Float,
            "double" | "Double" => LogicalType::Double,
            "BigDecimal" => LogicalType::Decimal,
            "boolean" | "Boolean" => LogicalType::Bool,
            "LocalDateTime" | "Instant" | "Timestamp" | "Date" => LogicalType::DateTime,
            "LocalDate" => LogicalType::Date,
            "LocalTime" | "Time" => LogicalType::Time,
            "ZonedDateTime" | "OffsetDateTime" => LogicalType::ZonedDateTime,
            "Duration" => LogicalType::Duration,
            "Period" => LogicalType::Period,
            "UUID" | "Uuid" => LogicalType::Uuid,
            "JsonNode" | "JsonObject" | "Json" => LogicalType::Json,
            "URL" | "URI" | "Url" | "Uri" => LogicalType::Url,
            "byte[]" | "ByteArray" | "Blob" => LogicalType::Bytes,
            other => LogicalType::Other(other.to_string()),
        }
    }

    /// Check if this is a temporal type
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            LogicalType::DateTime
                | LogicalType::Date
                | LogicalType::Time
                | LogicalType::ZonedDateTime
        )
    }

    /// Check if this is a numeric type
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            LogicalType::Byte
                | LogicalType::Short
                | LogicalType::Int
                | LogicalType::Long
                | LogicalType::Float
                | LogicalType::Double
                | LogicalType::Decimal
        )
    }
}

impl Default for LogicalType {
    fn default() -> Self {
        LogicalType::String
    }
}

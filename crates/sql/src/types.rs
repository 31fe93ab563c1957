//! Logical-to-SQL type mapping
//!
//! Maps a [`LogicalType`] plus column metadata to a dialect-specific SQL
//! type literal. The mapping is total: every logical type resolves, and
//! unrecognized types degrade to VARCHAR.

use stratum_core::{Dialect, LogicalType};
use stratum_ir::ColumnMeta;

/// Default VARCHAR length when none is declared
const DEFAULT_VARCHAR_LENGTH: u32 = 255;
/// Default decimal precision/scale
const DEFAULT_DECIMAL_PRECISION: u32 = 19;
const DEFAULT_DECIMAL_SCALE: u32 = 2;

/// Resolve the SQL type for a field
///
/// A non-blank `definition` override wins over all mapping.
pub fn sql_type(logical: &LogicalType, meta: &ColumnMeta, dialect: Dialect) -> String {
    if let Some(definition) = &meta.definition {
        if !definition.trim().is_empty() {
            return definition.clone();
        }
    }

    match dialect {
        Dialect::Postgres => postgres_type(logical, meta),
        Dialect::MariaDb => mariadb_type(logical, meta),
    }
}

fn varchar(length: Option<u32>) -> String {
    format!("VARCHAR({})", length.unwrap_or(DEFAULT_VARCHAR_LENGTH))
}

fn decimal(meta: &ColumnMeta) -> String {
    format!(
        "DECIMAL({},{})",
        meta.precision.unwrap_or(DEFAULT_DECIMAL_PRECISION),
        meta.scale.unwrap_or(DEFAULT_DECIMAL_SCALE)
    )
}

/// Get the SQL type for Postgres
fn postgres_type(logical: &LogicalType, meta: &ColumnMeta) -> String {
    match logical {
        LogicalType::String => varchar(meta.length),
        LogicalType::Byte | LogicalType::Short => "SMALLINT".to_string(),
        LogicalType::Int => "INTEGER".to_string(),
        LogicalType::Long => "BIGINT".to_string(),
        LogicalType::Float => "REAL".to_string(),
        LogicalType::Double => "DOUBLE PRECISION".to_string(),
        LogicalType::Decimal => decimal(meta),
        LogicalType::Bool => "BOOLEAN".to_string(),
        LogicalType::DateTime => "TIMESTAMP".to_string(),
        LogicalType::Date => "DATE".to_string(),
        LogicalType::Time => "TIME".to_string(),
        LogicalType::ZonedDateTime => "TIMESTAMP WITH TIME ZONE".to_string(),
        LogicalType::Duration => "BIGINT".to_string(),
        LogicalType::Period => "VARCHAR(50)".to_string(),
        LogicalType::Uuid => "UUID".to_string(),
        LogicalType::Json => "JSONB".to_string(),
        LogicalType::Url => "VARCHAR(2048)".to_string(),
        LogicalType::Bytes => "BYTEA".to_string(),
        LogicalType::Enumeration => "VARCHAR(50)".to_string(),
        LogicalType::Other(_) => varchar(meta.length),
    }
}

/// Get the SQL type for MariaDB
fn mariadb_type(logical: &LogicalType, meta: &ColumnMeta) -> String {
    match logical {
        LogicalType::String => varchar(meta.length),
        LogicalType::Byte => "TINYINT".to_string(),
        LogicalType::Short => "SMALLINT".to_string(),
        LogicalType::Int => "INT".to_string(),
        LogicalType::Long => "BIGINT".to_string(),
        LogicalType::Float => "FLOAT".to_string(),
        LogicalType::Double => "DOUBLE".to_string(),
        LogicalType::Decimal => decimal(meta),
        LogicalType::Bool => "BOOLEAN".to_string(),
        LogicalType::DateTime => "DATETIME".to_string(),
        LogicalType::Date => "DATE".to_string(),
        LogicalType::Time => "TIME".to_string(),
        LogicalType::ZonedDateTime => "DATETIME".to_string(),
        LogicalType::Duration => "BIGINT".to_string(),
        LogicalType::Period => "VARCHAR(50)".to_string(),
        LogicalType::Uuid => "CHAR(36)".to_string(),
        LogicalType::Json => "JSON".to_string(),
        LogicalType::Url => "VARCHAR(2048)".to_string(),
        LogicalType::Bytes => "BLOB".to_string(),
        LogicalType::Enumeration => "VARCHAR(50)".to_string(),
        LogicalType::Other(_) => varchar(meta.length),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta() -> ColumnMeta {
        ColumnMeta::default()
    }

    #[test]
    fn test_postgres_types() {
        assert_eq!(
            sql_type(&LogicalType::String, &meta(), Dialect::Postgres),
            "VARCHAR(255)"
        );
        assert_eq!(
            sql_type(&LogicalType::Uuid, &meta(), Dialect::Postgres),
            "UUID"
        );
        assert_eq!(
            sql_type(&LogicalType::Json, &meta(), Dialect::Postgres),
            "JSONB"
        );
        assert_eq!(
            sql_type(&LogicalType::Double, &meta(), Dialect::Postgres),
            "DOUBLE PRECISION"
        );
        assert_eq!(
            sql_type(&LogicalType::Bytes, &meta(), Dialect::Postgres),
            "BYTEA"
        );
    }

    #[test]
    fn test_mariadb_types() {
        assert_eq!(
            sql_type(&LogicalType::Uuid, &meta(), Dialect::MariaDb),
            "CHAR(36)"
        );
        assert_eq!(
            sql_type(&LogicalType::Byte, &meta(), Dialect::MariaDb),
            "TINYINT"
        );
        assert_eq!(
            sql_type(&LogicalType::Json, &meta(), Dialect::MariaDb),
            "JSON"
        );
        assert_eq!(
            sql_type(&LogicalType::DateTime, &meta(), Dialect::MariaDb),
            "DATETIME"
        );
    }

    #[test]
    fn test_varchar_length() {
        let m = ColumnMeta {
            length: Some(64),
            ..Default::default()
        };
        assert_eq!(
            sql_type(&LogicalType::String, &m, Dialect::Postgres),
            "VARCHAR(64)"
        );
    }

    #[test]
    fn test_decimal_defaults() {
        assert_eq!(
            sql_type(&LogicalType::Decimal, &meta(), Dialect::Postgres),
            "DECIMAL(19,2)"
        );

        let m = ColumnMeta {
            precision: Some(10),
            scale: Some(4),
            ..Default::default()
        };
        assert_eq!(
            sql_type(&LogicalType::Decimal, &m, Dialect::MariaDb),
            "DECIMAL(10,4)"
        );
    }

    #[test]
    fn test_definition_override_wins() {
        let m = ColumnMeta {
            definition: Some("TEXT CHECK (length(body) > 0)".to_string()),
            length: Some(10),
            ..Default::default()
        };
        assert_eq!(
            sql_type(&LogicalType::String, &m, Dialect::Postgres),
            "TEXT CHECK (length(body) > 0)"
        );

        // A blank override is ignored
        let m = ColumnMeta {
            definition: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(
            sql_type(&LogicalType::String, &m, Dialect::Postgres),
            "VARCHAR(255)"
        );
    }

    #[test]
    fn test_unknown_type_degrades_to_varchar() {
        assert_eq!(
            sql_type(
                &LogicalType::Other("MoneyAmount".to_string()),
                &meta(),
                Dialect::Postgres
            ),
            "VARCHAR(255)"
        );
    }

    #[test]
    fn test_enum_marker() {
        assert_eq!(
            sql_type(&LogicalType::Enumeration, &meta(), Dialect::MariaDb),
            "VARCHAR(50)"
        );
    }
}

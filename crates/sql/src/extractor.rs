//! SQL schema extraction
//!
//! Parses previously emitted SQL files in a partition directory back into
//! the schema model. The parser is regex-driven, case-insensitive, and
//! deliberately narrow: it targets the exact dialect the emitter writes
//! plus reasonable human edits (comments, whitespace). Extending the
//! regexes is a schema change.
//!
//! Failure policy: a parse error on one file logs a warning and yields
//! `None` for that table; it never aborts a run.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::warn;

use stratum_core::{StratumError, StratumResult};
use stratum_ir::{ColumnSchema, ForeignKeySchema, IndexSchema, OnDelete, TableSchema};

/// Reads a partition directory of emitted SQL back into [`TableSchema`]s
#[derive(Debug, Clone)]
pub struct SqlExtractor {
    schema_dir: PathBuf,
}

impl SqlExtractor {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
        }
    }

    pub fn schema_dir(&self) -> &Path {
        &self.schema_dir
    }

    /// Reconstruct the schema of one table from the partition directory
    ///
    /// The CREATE body is taken from the lexicographically greatest file
    /// that contains a CREATE TABLE for this table (the newest versioned
    /// file); indexes and foreign keys are collected across every file.
    pub fn load_table_schema(&self, table: &str) -> Option<TableSchema> {
        let files = self.sql_files();
        if files.is_empty() {
            return None;
        }

        let create_re = match Regex::new(&format!(
            r"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?{}\s*\(",
            regex::escape(table)
        )) {
            Ok(re) => re,
            Err(err) => {
                warn!("unusable table name '{}': {}", table, err);
                return None;
            }
        };

        let (path, content) = files
            .iter()
            .filter(|(_, content)| create_re.is_match(content))
            .max_by(|(a, _), (b, _)| a.file_name().cmp(&b.file_name()))?;

        match self.parse_table(table, path, content, &create_re, &files) {
            Ok(schema) => Some(schema),
            Err(err) => {
                warn!("skipping unparseable schema for '{}': {}", table, err);
                None
            }
        }
    }

    /// Every table name any file in the partition directory touches
    ///
    /// Union of CREATE TABLE, ALTER TABLE and CREATE INDEX targets,
    /// lowercased for case-insensitive membership checks.
    pub fn existing_tables(&self) -> BTreeSet<String> {
        let mut tables = BTreeSet::new();

        let patterns = [
            r"(?i)CREATE\s+TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(\w+)",
            r"(?i)ALTER\s+TABLE\s+(\w+)",
            r"(?i)CREATE\s+(?:UNIQUE\s+)?INDEX\s+\w+\s+ON\s+(\w+)",
        ];
        let regexes: Vec<Regex> = patterns
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();

        for (_, content) in self.sql_files() {
            for re in &regexes {
                for caps in re.captures_iter(&content) {
                    if let Some(name) = caps.get(1) {
                        tables.insert(name.as_str().to_lowercase());
                    }
                }
            }
        }

        tables
    }

    /// All readable `*.sql` files in the partition directory, sorted by
    /// file name
    fn sql_files(&self) -> Vec<(PathBuf, String)> {
        let entries = match fs::read_dir(&self.schema_dir) {
            Ok(entries) => entries,
            Err(_) => return Vec::new(),
        };

        let mut files = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("sql") {
                continue;
            }
            match fs::read_to_string(&path) {
                Ok(content) => files.push((path, content)),
                Err(err) => warn!("skipping unreadable file {}: {}", path.display(), err),
            }
        }

        files.sort_by(|(a, _), (b, _)| a.file_name().cmp(&b.file_name()));
        files
    }

    fn parse_table(
        &self,
        table: &str,
        path: &Path,
        content: &str,
        create_re: &Regex,
        all_files: &[(PathBuf, String)],
    ) -> StratumResult<TableSchema> {
        let open = create_re
            .find(content)
            .ok_or_else(|| StratumError::sql_parse(path, "CREATE TABLE vanished on re-read"))?;
        let body = create_body(content, open.end())
            .ok_or_else(|| StratumError::sql_parse(path, "unbalanced CREATE TABLE body"))?;

        let mut columns = parse_columns(path, body)?;
        apply_composite_primary_key(body, &mut columns);

        Ok(TableSchema {
            columns,
            indexes: self.collect_indexes(table, all_files),
            foreign_keys: self.collect_foreign_keys(table, all_files),
        })
    }

    fn collect_indexes(&self, table: &str, files: &[(PathBuf, String)]) -> Vec<IndexSchema> {
        let re = match Regex::new(&format!(
            r"(?i)CREATE\s+(UNIQUE\s+)?INDEX\s+(\w+)\s+ON\s+{}\s*\(([^)]*)\)",
            regex::escape(table)
        )) {
            Ok(re) => re,
            Err(_) => return Vec::new(),
        };

        // De-duplicated by name; files are visited in sorted order so the
        // newest definition wins
        let mut by_name: BTreeMap<String, IndexSchema> = BTreeMap::new();
        for (_, content) in files {
            for caps in re.captures_iter(content) {
                let name = caps[2].to_string();
                let columns: Vec<String> = caps[3]
                    .split(',')
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                let index = IndexSchema {
                    name: name.clone(),
                    columns,
                    unique: caps.get(1).is_some(),
                };
                by_name.insert(name, index);
            }
        }

        by_name.into_values().collect()
    }

    fn collect_foreign_keys(
        &self,
        table: &str,
        files: &[(PathBuf, String)],
    ) -> Vec<ForeignKeySchema> {
        let re = match Regex::new(&format!(
            r"(?i)ALTER\s+TABLE\s+{}\s+ADD\s+CONSTRAINT\s+\w+\s+FOREIGN\s+KEY\s*\((\w+)\)\s*REFERENCES\s+(\w+)\s*\((\w+)\)\s*ON\s+DELETE\s+(CASCADE|SET\s+NULL|RESTRICT|NO\s+ACTION)",
            regex::escape(table)
        )) {
            Ok(re) => re,
            Err(_) => return Vec::new(),
        };

        let mut by_column: BTreeMap<String, ForeignKeySchema> = BTreeMap::new();
        for (_, content) in files {
            for caps in re.captures_iter(content) {
                let action = caps[4].split_whitespace().collect::<Vec<_>>().join(" ");
                let Some(on_delete) = OnDelete::parse(&action) else {
                    continue;
                };
                let column = caps[1].to_string();
                by_column.insert(
                    column.clone(),
                    ForeignKeySchema::new(column, caps[2].to_string(), caps[3].to_string(), on_delete),
                );
            }
        }

        by_column.into_values().collect()
    }
}

/// Slice the CREATE body between the opening paren (at `start`) and its
/// matching close
fn create_body(content: &str, start: usize) -> Option<&str> {
    let mut depth = 1usize;
    for (offset, c) in content[start..].char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&content[start..start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_columns(path: &Path, body: &str) -> StratumResult<Vec<ColumnSchema>> {
    let mut columns = Vec::new();

    for raw_line in body.lines() {
        let line = raw_line.trim().trim_end_matches(',').trim_end();
        if line.is_empty() || line.starts_with("--") {
            continue;
        }

        let upper = line.to_uppercase();
        if upper.starts_with("PRIMARY KEY")
            || upper.starts_with("FOREIGN KEY")
            || upper.starts_with("CONSTRAINT")
        {
            continue;
        }

        let Some((name, rest)) = split_token(line) else {
            continue;
        };
        let Some((sql_type, tail)) = split_token(rest) else {
            return Err(StratumError::sql_parse(
                path,
                format!("column line '{}' has no type", line),
            ));
        };

        let tail_upper = tail.to_uppercase();
        let primary_key = tail_upper.contains("PRIMARY KEY");

        columns.push(ColumnSchema {
            name: name.to_string(),
            sql_type: sql_type.to_string(),
            nullable: !primary_key && !tail_upper.contains("NOT NULL"),
            unique: tail_upper.contains("UNIQUE"),
            primary_key,
            auto_increment: tail_upper.contains("AUTO_INCREMENT"),
            default: extract_default(tail),
        });
    }

    Ok(columns)
}

/// Split off the first whitespace-delimited token
fn split_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    match s.find(char::is_whitespace) {
        Some(i) => Some((&s[..i], s[i..].trim_start())),
        None => Some((s, "")),
    }
}

/// Extract the expression after the DEFAULT keyword, if any
fn extract_default(tail: &str) -> Option<String> {
    let re = Regex::new(r"(?i)\bDEFAULT\b").ok()?;
    let m = re.find(tail)?;
    parse_default_value(&tail[m.end()..])
}

/// State machine over the text following `DEFAULT`
///
/// Accepts a single-quoted literal (with `\'` escapes, quotes included),
/// a signed number, an identifier with an optional balanced argument
/// list, or a bare balanced parenthesized expression. Anything else
/// yields no default.
fn parse_default_value(s: &str) -> Option<String> {
    let s = s.trim_start();
    let first = s.chars().next()?;

    if first == '\'' {
        return parse_quoted(s);
    }
    if first == '-' || first.is_ascii_digit() {
        return parse_number(s);
    }
    if first == '(' {
        let end = balanced_paren_end(s)?;
        return Some(s[..=end].to_string());
    }
    if first.is_ascii_alphabetic() || first == '_' {
        return parse_identifier(s);
    }
    None
}

fn parse_quoted(s: &str) -> Option<String> {
    let mut escaped = false;
    for (i, c) in s.char_indices().skip(1) {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '\'' => return Some(s[..=i].to_string()),
            _ => {}
        }
    }
    None
}

fn parse_number(s: &str) -> Option<String> {
    let bytes = s.as_bytes();
    let mut i = 0;
    if bytes[0] == b'-' {
        i = 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > frac_start {
            i = j;
        }
    }
    Some(s[..i].to_string())
}

fn parse_identifier(s: &str) -> Option<String> {
    let mut end = 0;
    for (i, c) in s.char_indices() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '.' {
            end = i + c.len_utf8();
        } else {
            break;
        }
    }
    if end == 0 {
        return None;
    }

    // Identifier directly followed by an argument list takes the whole call
    if s[end..].starts_with('(') {
        let close = balanced_paren_end(&s[end..])?;
        return Some(s[..end + close + 1].to_string());
    }
    Some(s[..end].to_string())
}

/// Index of the paren that closes the one at position 0
fn balanced_paren_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Apply a table-level `PRIMARY KEY (...)` declaration to parsed columns
///
/// A single-column declaration marks that column; a compound declaration
/// marks none (compound PK semantics).
fn apply_composite_primary_key(body: &str, columns: &mut [ColumnSchema]) {
    let Ok(re) = Regex::new(r"(?i)PRIMARY\s+KEY\s*\(([^)]*)\)") else {
        return;
    };
    let Some(caps) = re.captures(body) else {
        return;
    };

    let listed: Vec<&str> = caps[1]
        .split(',')
        .map(|c| c.trim())
        .filter(|c| !c.is_empty())
        .collect();

    if listed.len() == 1 {
        if let Some(column) = columns.iter_mut().find(|c| c.name == listed[0]) {
            column.primary_key = true;
            column.nullable = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_basic_extraction() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "V202401010000000001000__create_users_table.sql",
            "-- HASH: 0123456789abcdef\n\
             CREATE TABLE users (\n\
             \x20   id BIGSERIAL PRIMARY KEY,\n\
             \x20   email VARCHAR(255) NOT NULL UNIQUE,\n\
             \x20   active BOOLEAN DEFAULT true\n\
             );",
        );

        let schema = SqlExtractor::new(dir.path()).load_table_schema("users").unwrap();
        assert_eq!(schema.columns.len(), 3);

        let id = schema.column("id").unwrap();
        assert!(id.primary_key);
        assert!(!id.nullable);

        let email = schema.column("email").unwrap();
        assert!(email.unique);
        assert!(!email.nullable);

        let active = schema.column("active").unwrap();
        assert_eq!(active.default.as_deref(), Some("true"));
        assert!(active.nullable);
    }

    #[test]
    fn test_missing_table_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "V1__create_users_table.sql", "CREATE TABLE users (id INT);");

        assert!(SqlExtractor::new(dir.path()).load_table_schema("orders").is_none());
    }

    #[test]
    fn test_newest_create_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "V202401010000000001000__create_users_table.sql",
            "CREATE TABLE users (\n    id BIGSERIAL PRIMARY KEY\n);",
        );
        write(
            dir.path(),
            "V202402020000000001000__create_users_table.sql",
            "CREATE TABLE users (\n    id BIGSERIAL PRIMARY KEY,\n    email VARCHAR(255)\n);",
        );

        let schema = SqlExtractor::new(dir.path()).load_table_schema("users").unwrap();
        assert_eq!(schema.columns.len(), 2);
    }

    #[test]
    fn test_table_name_is_not_a_prefix_match() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "V1__create_users_table.sql",
            "CREATE TABLE users (\n    id BIGSERIAL PRIMARY KEY\n);",
        );

        assert!(SqlExtractor::new(dir.path()).load_table_schema("user").is_none());
    }

    #[test]
    fn test_trailing_comma_before_close() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "V1__create_t_table.sql",
            "CREATE TABLE t (\n    id INT PRIMARY KEY,\n    name VARCHAR(50),\n);",
        );

        let schema = SqlExtractor::new(dir.path()).load_table_schema("t").unwrap();
        assert_eq!(schema.columns.len(), 2);
    }

    #[test]
    fn test_comments_and_case_variation() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "V1__create_t_table.sql",
            "-- a header comment\n\
             create table T (\n\
             \x20   -- the key\n\
             \x20   id uuid primary key default public.uuid_generate_v7(),\n\
             \x20   note VARCHAR(100) not null\n\
             );",
        );

        let schema = SqlExtractor::new(dir.path()).load_table_schema("T").unwrap();
        let id = schema.column("id").unwrap();
        assert!(id.primary_key);
        assert_eq!(id.default.as_deref(), Some("public.uuid_generate_v7()"));

        let note = schema.column("note").unwrap();
        assert!(!note.nullable);
    }

    #[test]
    fn test_composite_primary_key_marks_none() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "V1__create_m_table.sql",
            "CREATE TABLE m (\n\
             \x20   a INT NOT NULL,\n\
             \x20   b INT NOT NULL,\n\
             \x20   PRIMARY KEY (a, b)\n\
             );",
        );

        let schema = SqlExtractor::new(dir.path()).load_table_schema("m").unwrap();
        assert!(schema.columns.iter().all(|c| !c.primary_key));
    }

    #[test]
    fn test_single_column_table_level_primary_key() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "V1__create_s_table.sql",
            "CREATE TABLE s (\n\
             \x20   id BIGINT NOT NULL,\n\
             \x20   PRIMARY KEY (id)\n\
             );",
        );

        let schema = SqlExtractor::new(dir.path()).load_table_schema("s").unwrap();
        let id = schema.column("id").unwrap();
        assert!(id.primary_key);
        assert!(!id.nullable);
    }

    #[test]
    fn test_default_state_machine() {
        assert_eq!(parse_default_value("'PENDING'"), Some("'PENDING'".to_string()));
        assert_eq!(
            parse_default_value(r"'it\'s fine' NOT NULL"),
            Some(r"'it\'s fine'".to_string())
        );
        assert_eq!(parse_default_value("0.00 NOT NULL"), Some("0.00".to_string()));
        assert_eq!(parse_default_value("-42"), Some("-42".to_string()));
        assert_eq!(
            parse_default_value("CURRENT_TIMESTAMP"),
            Some("CURRENT_TIMESTAMP".to_string())
        );
        assert_eq!(
            parse_default_value("public.uuid_generate_v7() UNIQUE"),
            Some("public.uuid_generate_v7()".to_string())
        );
        assert_eq!(parse_default_value("(UUID())"), Some("(UUID())".to_string()));
        assert_eq!(
            parse_default_value("now_plus(interval '1 day')"),
            Some("now_plus(interval '1 day')".to_string())
        );
        assert_eq!(parse_default_value("?!"), None);
        assert_eq!(parse_default_value("'unterminated"), None);
    }

    #[test]
    fn test_indexes_collected_across_files() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "V1__create_users_table.sql",
            "CREATE TABLE users (\n    id BIGSERIAL PRIMARY KEY,\n    email VARCHAR(255)\n);",
        );
        write(
            dir.path(),
            "V2__add_indexes.sql",
            "CREATE INDEX idx_users_email ON users (email);\n\
             CREATE UNIQUE INDEX idx_users_handle ON users (handle);",
        );

        let schema = SqlExtractor::new(dir.path()).load_table_schema("users").unwrap();
        assert_eq!(schema.indexes.len(), 2);

        let email_idx = schema.indexes.iter().find(|i| i.name == "idx_users_email").unwrap();
        assert_eq!(email_idx.columns, vec!["email".to_string()]);
        assert!(!email_idx.unique);

        let handle_idx = schema.indexes.iter().find(|i| i.name == "idx_users_handle").unwrap();
        assert!(handle_idx.unique);
    }

    #[test]
    fn test_foreign_keys_collected() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "V1__create_posts_table.sql",
            "CREATE TABLE posts (\n    id BIGSERIAL PRIMARY KEY,\n    author_id BIGINT\n);",
        );
        write(
            dir.path(),
            "V2__add_foreign_keys.sql",
            "ALTER TABLE posts ADD CONSTRAINT fk_posts_author_id FOREIGN KEY (author_id) \
             REFERENCES users(id) ON DELETE SET NULL;",
        );

        let schema = SqlExtractor::new(dir.path()).load_table_schema("posts").unwrap();
        assert_eq!(schema.foreign_keys.len(), 1);

        let fk = &schema.foreign_keys[0];
        assert_eq!(fk.column, "author_id");
        assert_eq!(fk.referenced_table, "users");
        assert_eq!(fk.referenced_column, "id");
        assert_eq!(fk.on_delete, OnDelete::SetNull);
    }

    #[test]
    fn test_existing_tables_union() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "V1__create_users_table.sql", "CREATE TABLE Users (id INT);");
        write(
            dir.path(),
            "V2__add_foreign_keys.sql",
            "ALTER TABLE posts ADD CONSTRAINT fk FOREIGN KEY (u) REFERENCES users(id) ON DELETE CASCADE;",
        );
        write(dir.path(), "V3__add_indexes.sql", "CREATE INDEX idx_a ON audit_log (at);");

        let tables = SqlExtractor::new(dir.path()).existing_tables();
        assert!(tables.contains("users"));
        assert!(tables.contains("posts"));
        assert!(tables.contains("audit_log"));
    }

    #[test]
    fn test_missing_directory_is_empty() {
        let extractor = SqlExtractor::new("definitely/not/here");
        assert!(extractor.load_table_schema("users").is_none());
        assert!(extractor.existing_tables().is_empty());
    }
}

//! Generation orchestrator
//!
//! Drives the pipeline: validate the descriptor set, project every entity,
//! choose the CREATE/ALTER path per table, and hand rendered bodies to the
//! idempotent file writer. All files of one run share a single frozen
//! timestamp so lexicographic order equals emission order.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use stratum_core::{GenerationMode, GeneratorConfig, StratumError, StratumResult};
use stratum_ir::{validation, EntityDescriptor, TableSchema, ValidationIssue};
use stratum_sql::{MigrationDiffer, SqlEmitter, SqlExtractor};

use crate::projector::EntityProjector;
use crate::provider::{DefaultSchemaProvider, SchemaProvider};
use crate::writer::MigrationWriter;

/// Reserved sort number for UUID/extension setup
const SORT_UUID_SETUP: u16 = 1;
/// First sort number for create-table files
const SORT_CREATE_BASE: u16 = 1000;
/// Sort number for the per-partition foreign-key file
const SORT_FOREIGN_KEYS: u16 = 5000;
/// Sort number for the per-partition index file
const SORT_INDEXES: u16 = 9000;

/// What one `generate()` call did
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Files written, in emission order
    pub written: Vec<PathBuf>,
    /// Candidates skipped because their content hash was already on disk
    pub skipped: usize,
    /// Non-fatal problems absorbed during the run
    pub warnings: Vec<String>,
}

impl GenerationReport {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// One projected entity, ready for rendering
struct Projected<'a> {
    entity: &'a EntityDescriptor,
    table: String,
    folder: String,
    sort: u16,
    schema: TableSchema,
}

/// The migration generator
pub struct MigrationEngine {
    config: GeneratorConfig,
    provider: Box<dyn SchemaProvider>,
}

impl MigrationEngine {
    /// Create an engine with the default partitioning/naming policy
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            provider: Box::new(DefaultSchemaProvider),
        }
    }

    /// Replace the partitioning/naming policy
    pub fn with_provider(mut self, provider: Box<dyn SchemaProvider>) -> Self {
        self.provider = provider;
        self
    }

    /// Generate migration files for the given descriptor set
    pub fn generate(&self, entities: &[EntityDescriptor]) -> StratumResult<GenerationReport> {
        let writer = MigrationWriter::new();
        self.generate_with_writer(entities, &writer)
    }

    /// Generate with an explicit writer (and thus an explicit timestamp)
    pub fn generate_with_writer(
        &self,
        entities: &[EntityDescriptor],
        writer: &MigrationWriter,
    ) -> StratumResult<GenerationReport> {
        let mut report = GenerationReport::default();

        self.validate(entities, &mut report)?;

        // Stable processing order: by lowercased table name
        let mut sorted: Vec<&EntityDescriptor> = entities.iter().collect();
        sorted.sort_by_key(|e| e.table_name().to_lowercase());

        if sorted.len() > (SORT_FOREIGN_KEYS - SORT_CREATE_BASE) as usize {
            return Err(StratumError::internal(format!(
                "{} entities exceed the create-table sort number range",
                sorted.len()
            )));
        }

        let projector =
            EntityProjector::new(self.config.dialect, self.config.uuid, entities);

        let mut projected = Vec::with_capacity(sorted.len());
        for (i, &entity) in sorted.iter().enumerate() {
            projected.push(Projected {
                entity,
                table: entity.table_name(),
                folder: self.provider.folder_for(entity),
                sort: SORT_CREATE_BASE + i as u16,
                schema: projector.project(entity)?,
            });
        }

        info!(
            "generating migrations for {} entities ({:?} mode, timestamp {})",
            projected.len(),
            self.config.mode,
            writer.execution_timestamp()
        );

        match self.config.mode {
            GenerationMode::CreateOnly => {
                let all: Vec<&Projected> = projected.iter().collect();
                self.create_path(&all, &projector, writer, &mut report)?;
            }
            GenerationMode::AlterOnly => {
                let all: Vec<&Projected> = projected.iter().collect();
                self.alter_path(&all, writer, &mut report)?;
            }
            GenerationMode::Smart => {
                let mut existing_cache: HashMap<PathBuf, BTreeSet<String>> = HashMap::new();
                let mut fresh = Vec::new();
                let mut known = Vec::new();

                for item in &projected {
                    let dir = self.partition_dir(&item.folder);
                    let existing = existing_cache
                        .entry(dir.clone())
                        .or_insert_with(|| SqlExtractor::new(&dir).existing_tables());

                    if existing.contains(&item.table.to_lowercase()) {
                        known.push(item);
                    } else {
                        fresh.push(item);
                    }
                }

                self.create_path(&fresh, &projector, writer, &mut report)?;
                self.alter_path(&known, writer, &mut report)?;
            }
        }

        info!(
            "wrote {} files, skipped {} unchanged",
            report.written.len(),
            report.skipped
        );
        Ok(report)
    }

    /// Duplicate table names are fatal before anything touches the disk;
    /// other error-severity issues are fatal too, warnings are carried
    /// into the report
    fn validate(
        &self,
        entities: &[EntityDescriptor],
        report: &mut GenerationReport,
    ) -> StratumResult<()> {
        let mut seen: HashMap<String, &EntityDescriptor> = HashMap::new();
        for entity in entities {
            let table = entity.table_name().to_lowercase();
            if let Some(first) = seen.get(&table) {
                return Err(StratumError::DuplicateTableName {
                    table,
                    first: first.name.clone(),
                    second: entity.name.clone(),
                });
            }
            seen.insert(table, entity);
        }

        let issues = validation::get_all_issues(entities);
        let errors: Vec<&ValidationIssue> = issues.iter().filter(|i| i.is_error()).collect();
        if !errors.is_empty() {
            let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            return Err(StratumError::Validation(messages.join("; ")));
        }

        for issue in issues.iter().filter(|i| i.is_warning()) {
            report.warnings.push(issue.to_string());
        }

        Ok(())
    }

    /// CREATE path: optional UUID setup, one create-table file per entity,
    /// then one foreign-key and one index file per partition
    fn create_path(
        &self,
        set: &[&Projected],
        projector: &EntityProjector,
        writer: &MigrationWriter,
        report: &mut GenerationReport,
    ) -> StratumResult<()> {
        if set.is_empty() {
            return Ok(());
        }

        let emitter = SqlEmitter::new(self.config.dialect);

        if set.iter().any(|p| projector.entity_uses_uuid(p.entity)) {
            if let Some(body) = emitter.uuid_setup(self.config.uuid) {
                let dir = self.setup_dir();
                self.write(writer, &dir, SORT_UUID_SETUP, "setup_uuid_extension", &body, report)?;
            }
        }

        for &item in set {
            let dir = self.partition_dir(&item.folder);
            let body = emitter.create_table(&item.entity.name, &item.table, &item.schema);
            let base = format!("create_{}_table", item.table);
            self.write(writer, &dir, item.sort, &base, &body, report)?;
        }

        // Collateral files are grouped per partition
        let mut by_partition: BTreeMap<String, Vec<&Projected>> = BTreeMap::new();
        for &item in set {
            by_partition.entry(item.folder.clone()).or_default().push(item);
        }

        for (folder, items) in by_partition {
            let dir = self.partition_dir(&folder);
            let tables: Vec<(String, TableSchema)> = items
                .iter()
                .map(|p| (p.table.clone(), p.schema.clone()))
                .collect();

            let fk_body = emitter.foreign_keys(&tables);
            if !fk_body.is_empty() {
                self.write(writer, &dir, SORT_FOREIGN_KEYS, "add_foreign_keys", &fk_body, report)?;
            }

            let index_body = emitter.indexes(&tables);
            if !index_body.is_empty() {
                self.write(writer, &dir, SORT_INDEXES, "add_indexes", &index_body, report)?;
            }
        }

        Ok(())
    }

    /// ALTER path: diff each entity against the schema reconstructed from
    /// the partition directory; tables without a prior CREATE are skipped
    /// with a warning
    fn alter_path(
        &self,
        set: &[&Projected],
        writer: &MigrationWriter,
        report: &mut GenerationReport,
    ) -> StratumResult<()> {
        let differ = MigrationDiffer::new();

        for &item in set {
            let dir = self.partition_dir(&item.folder);
            let extractor = SqlExtractor::new(&dir);

            let Some(previous) = extractor.load_table_schema(&item.table) else {
                let missing = StratumError::MissingPriorSchema(item.table.clone());
                warn!("{} in {}; skipping", missing, dir.display());
                report.warnings.push(format!("{}; skipped", missing));
                continue;
            };

            let body = differ.diff(&item.table, &previous, &item.schema);
            if body.is_empty() {
                debug!("table '{}' is unchanged", item.table);
                continue;
            }

            let base = format!("alter_{}_table", item.table);
            self.write(writer, &dir, item.sort, &base, &body, report)?;
        }

        Ok(())
    }

    fn write(
        &self,
        writer: &MigrationWriter,
        dir: &Path,
        sort: u16,
        base: &str,
        body: &str,
        report: &mut GenerationReport,
    ) -> StratumResult<()> {
        match writer.write_migration(self.provider.as_ref(), dir, sort, base, body)? {
            Some(path) => report.written.push(path),
            None => report.skipped += 1,
        }
        Ok(())
    }

    /// Partition directory under the output root; an empty folder name
    /// maps to `default`
    fn partition_dir(&self, folder: &str) -> PathBuf {
        if folder.is_empty() {
            self.config.out_dir.join("default")
        } else {
            self.config.out_dir.join(folder)
        }
    }

    /// Setup files live in the provider's setup folder, or the output
    /// root when it is empty
    fn setup_dir(&self) -> PathBuf {
        let folder = self.provider.setup_folder();
        if folder.is_empty() {
            self.config.out_dir.clone()
        } else {
            self.config.out_dir.join(folder)
        }
    }
}

/// Every migration file under the output root, recursively, sorted by path
pub fn list_migration_files(out_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(out_dir)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("sql"))
        .collect();
    files.sort();
    files
}

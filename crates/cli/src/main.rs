//! Stratum CLI
//!
//! Command-line interface for the Stratum migration generator.

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stratum_core::{Dialect, GenerationMode, GeneratorConfig, UuidPolicy};

/// Stratum - Entity-to-SQL Migration Generator
#[derive(Parser)]
#[command(name = "stratum")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate migration files from a descriptor file
    Generate {
        /// Entity descriptor file (JSON or TOML)
        descriptors: String,

        /// Output directory for migration files
        #[arg(short, long, default_value = "migrations")]
        out: String,

        /// Target dialect (postgres, mariadb)
        #[arg(short, long, default_value = "postgres")]
        dialect: String,

        /// UUID policy for generated primary keys (v4, v7)
        #[arg(short, long, default_value = "v7")]
        uuid: String,

        /// Generation mode (create, alter, smart)
        #[arg(short, long, default_value = "smart")]
        mode: String,
    },

    /// Validate a descriptor file without generating anything
    Validate {
        /// Entity descriptor file (JSON or TOML)
        descriptors: String,
    },

    /// List migration files under an output directory
    List {
        /// Output directory to scan
        #[arg(default_value = "migrations")]
        dir: String,
    },

    /// Show information about the generator
    Info,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stratum=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Generate {
            descriptors,
            out,
            dialect,
            uuid,
            mode,
        } => {
            cmd_generate(&descriptors, &out, &dialect, &uuid, &mode)?;
        }
        Commands::Validate { descriptors } => {
            cmd_validate(&descriptors)?;
        }
        Commands::List { dir } => {
            cmd_list(&dir)?;
        }
        Commands::Info => {
            cmd_info();
        }
    }

    Ok(())
}

fn parse_dialect(s: &str) -> Result<Dialect> {
    match s.to_lowercase().as_str() {
        "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
        "mariadb" | "mysql" => Ok(Dialect::MariaDb),
        other => bail!("unknown dialect: {other} (expected postgres or mariadb)"),
    }
}

fn parse_uuid(s: &str) -> Result<UuidPolicy> {
    match s.to_lowercase().as_str() {
        "v4" | "4" => Ok(UuidPolicy::V4),
        "v7" | "7" => Ok(UuidPolicy::V7),
        other => bail!("unknown uuid policy: {other} (expected v4 or v7)"),
    }
}

fn parse_mode(s: &str) -> Result<GenerationMode> {
    match s.to_lowercase().as_str() {
        "create" | "create_only" => Ok(GenerationMode::CreateOnly),
        "alter" | "alter_only" => Ok(GenerationMode::AlterOnly),
        "smart" => Ok(GenerationMode::Smart),
        other => bail!("unknown mode: {other} (expected create, alter or smart)"),
    }
}

fn cmd_generate(descriptors: &str, out: &str, dialect: &str, uuid: &str, mode: &str) -> Result<()> {
    use stratum_engine::MigrationEngine;
    use stratum_ir::load_entities;

    let entities = load_entities(descriptors)?;
    println!("⚙️  Loaded {} entities from {}", entities.len(), descriptors);

    let config = GeneratorConfig {
        dialect: parse_dialect(dialect)?,
        uuid: parse_uuid(uuid)?,
        mode: parse_mode(mode)?,
        out_dir: out.into(),
    };
    println!("   Target: {} ({} mode)", config.dialect.display_name(), mode);

    let report = MigrationEngine::new(config).generate(&entities)?;

    for path in &report.written {
        println!("   + {}", path.display());
    }
    if report.skipped > 0 {
        println!("   = {} file(s) already up to date", report.skipped);
    }
    for warning in &report.warnings {
        println!("⚠️  {}", warning);
    }

    if report.written.is_empty() {
        println!("✅ Nothing to do - schema is up to date");
    } else {
        println!("✅ Wrote {} migration file(s) to {}", report.written.len(), out);
    }

    Ok(())
}

fn cmd_validate(descriptors: &str) -> Result<()> {
    use stratum_ir::{load_entities, validation};

    println!("🔍 Validating: {}", descriptors);

    let entities = load_entities(descriptors)?;
    let issues = validation::get_all_issues(&entities);

    let errors: Vec<_> = issues.iter().filter(|i| i.is_error()).collect();
    let warnings: Vec<_> = issues.iter().filter(|i| i.is_warning()).collect();

    println!("   Entities: {}", entities.len());
    println!();

    if errors.is_empty() && warnings.is_empty() {
        println!("✅ No issues found!");
    } else {
        for error in &errors {
            println!("❌ {}", error);
        }
        for warning in &warnings {
            println!("⚠️  {}", warning);
        }
        println!();
        println!("   {} error(s), {} warning(s)", errors.len(), warnings.len());
    }

    if !errors.is_empty() {
        bail!("descriptor validation failed");
    }

    Ok(())
}

fn cmd_list(dir: &str) -> Result<()> {
    use stratum_engine::list_migration_files;

    let files = list_migration_files(dir.as_ref());

    if files.is_empty() {
        println!("No migration files under {}", dir);
        return Ok(());
    }

    for file in &files {
        println!("{}", file.display());
    }
    println!();
    println!("Total: {} file(s)", files.len());

    Ok(())
}

fn cmd_info() {
    println!("🔧 Stratum\n");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!("   Descriptor format: {}", stratum_ir::FORMAT_VERSION);
    println!("   Dialects: postgres, mariadb");
    println!("   Modes: create, alter, smart");
}

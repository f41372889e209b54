use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;

use org_directory::contract::client::OrgDirectoryApi;
use org_directory::contract::model::{ImportProgress, ImportReport, TemplateKind};
use org_directory::domain::import::{ImportConfig, ImportService};
use org_directory::gateways::local::OrgDirectoryLocalClient;
use org_directory::infra::storage::migrations::Migrator;
use org_directory::infra::storage::repo::{
    SeaOrmAssignmentsRepository, SeaOrmJobLevelsRepository, SeaOrmPersonsRepository,
};
use runtime::AppConfig;

/// OrgDir - organizational directory import tool
#[derive(Parser)]
#[command(name = "orgdir")]
#[command(about = "OrgDir - organizational directory import tool")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a user file (xlsx/xls/csv)
    ImportUsers { file: PathBuf },
    /// Import a supervisor-collaborator assignment file (xlsx/xls/csv)
    ImportAssignments { file: PathBuf },
    /// Print an import template to stdout
    Template {
        #[arg(value_enum)]
        kind: TemplateArg,
    },
    /// Recompute the supervisor role across all active assignments
    RecomputeRoles,
    /// Check configuration
    Check,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TemplateArg {
    Users,
    Assignments,
}

impl From<TemplateArg> for TemplateKind {
    fn from(value: TemplateArg) -> Self {
        match value {
            TemplateArg::Users => TemplateKind::Users,
            TemplateArg::Assignments => TemplateKind::Assignments,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_verbosity(cli.verbose);

    let logging = config.logging.clone().unwrap_or_default();
    let _log_guard = runtime::logging::init(&logging)?;
    tracing::info!("orgdir starting");

    match cli.command {
        Commands::ImportUsers { file } => {
            let client = connect_client(&config).await?;
            run_import(client.as_ref(), &file, ImportTarget::Users).await
        }
        Commands::ImportAssignments { file } => {
            let client = connect_client(&config).await?;
            run_import(client.as_ref(), &file, ImportTarget::Assignments).await
        }
        Commands::Template { kind } => {
            let client = connect_client(&config).await?;
            let text = client.render_template(kind.into()).await?;
            print!("{text}");
            Ok(())
        }
        Commands::RecomputeRoles => {
            let client = connect_client(&config).await?;
            let promoted = client.recompute_supervisor_roles().await?;
            println!("Promoted {promoted} supervisor(s)");
            Ok(())
        }
        Commands::Check => {
            println!("Configuration check passed");
            println!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

/// Ensure a sqlite URL points at a creatable location: parent directories
/// exist and the create-if-missing mode flag is present. In-memory DSNs and
/// non-sqlite backends pass through untouched.
fn prepare_sqlite_url(url: &str) -> Result<String> {
    if !url.starts_with("sqlite://") || url.contains(":memory:") {
        return Ok(url.to_string());
    }
    let rest = &url["sqlite://".len()..];
    let (path_str, query) = match rest.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (rest, None),
    };
    if path_str.is_empty() {
        return Err(anyhow!("empty sqlite path in '{url}'"));
    }
    if let Some(dir) = Path::new(path_str).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating database directory {}", dir.display()))?;
        }
    }
    let query = match query {
        Some(q) if q.contains("mode=") => q.to_string(),
        Some(q) => format!("{q}&mode=rwc"),
        None => "mode=rwc".to_string(),
    };
    Ok(format!("sqlite://{path_str}?{query}"))
}

async fn connect(config: &AppConfig) -> Result<DatabaseConnection> {
    let url = prepare_sqlite_url(&config.database.url)?;
    tracing::info!("Connecting to database: {url}");

    let mut options = ConnectOptions::new(url);
    if let Some(max) = config.database.max_conns {
        options.max_connections(max);
    }
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

async fn connect_client(config: &AppConfig) -> Result<Arc<dyn OrgDirectoryApi>> {
    let db = connect(config).await?;

    let persons = Arc::new(SeaOrmPersonsRepository::new(db.clone()));
    let assignments = Arc::new(SeaOrmAssignmentsRepository::new(db.clone()));
    let job_levels = Arc::new(SeaOrmJobLevelsRepository::new(db));

    let service = Arc::new(ImportService::new(
        persons,
        assignments,
        job_levels,
        ImportConfig {
            user_chunk_size: config.import.user_chunk_size,
            assignment_chunk_size: config.import.assignment_chunk_size,
            chunk_pause: Duration::from_millis(config.import.chunk_pause_ms),
        },
    ));
    Ok(Arc::new(OrgDirectoryLocalClient::new(service)))
}

enum ImportTarget {
    Users,
    Assignments,
}

async fn run_import(
    client: &dyn OrgDirectoryApi,
    file: &Path,
    target: ImportTarget,
) -> Result<()> {
    let bytes = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;
    let extension = file
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("cannot tell file type of {} (no extension)", file.display()))?;

    let on_progress = |p: ImportProgress| {
        eprint!("\rWriting {}/{} ({}%)", p.current, p.total, p.percentage);
        let _ = std::io::stderr().flush();
    };

    let report = match target {
        ImportTarget::Users => client.import_users(&bytes, extension, &on_progress).await?,
        ImportTarget::Assignments => {
            client
                .import_assignments(&bytes, extension, &on_progress)
                .await?
        }
    };
    eprintln!();
    print_report(&report);
    Ok(())
}

fn print_report(report: &ImportReport) {
    println!(
        "Rows: {} total, {} valid, {} invalid, {} duplicate(s)",
        report.total, report.valid, report.invalid, report.duplicates
    );
    println!(
        "Written: {} succeeded, {} failed",
        report.outcome.success_count,
        report.outcome.failures.len()
    );
    for issue in &report.row_issues {
        for error in &issue.errors {
            println!("  row {}: ERROR {error}", issue.row);
        }
        for warning in &issue.warnings {
            println!("  row {}: warning {warning}", issue.row);
        }
    }
    for failure in &report.outcome.failures {
        println!("  write failed [{}]: {}", failure.identity, failure.message);
    }
    for warning in &report.outcome.side_effect_warnings {
        println!("  side effect: {warning}");
    }
}

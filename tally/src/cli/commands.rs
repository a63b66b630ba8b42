use anyhow::{Context, Result, bail};
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};

use crate::cli::{Args, Commands, ConfigCommands, DatabaseCommands};
use crate::config::Config;
use crate::drainer::TickReport;
use crate::pipeline::Pipeline;
use crate::scheduler::TickOutcome;
use crate::services::DatabaseService;

pub async fn execute(args: Args) -> Result<()> {
    setup_logging(&args)?;

    let config_path = args.config.as_deref();

    match args.command {
        Commands::Start {
            interval,
            no_migrate,
        } => start(config_path, interval, no_migrate).await,
        Commands::Drain { json } => drain_once(config_path, json).await,
        Commands::Config { command } => match command {
            ConfigCommands::Validate { show } => validate_config(config_path, show),
            ConfigCommands::Init { output, force } => init_config(output, force),
        },
        Commands::Database { command } => handle_database_command(config_path, command).await,
    }
}

async fn connect(config: &Config) -> Result<DatabaseService> {
    info!("Connecting to database...");
    let database = DatabaseService::new_with_options(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    Ok(database)
}

async fn start(config_path: Option<&Path>, interval: Option<u64>, no_migrate: bool) -> Result<()> {
    info!("Starting Ripple tally");

    let mut config = Config::load(config_path)?;
    if let Some(secs) = interval {
        config.drain.interval_secs = secs;
    }
    config.validate()?;
    info!("Configuration validated successfully");

    let database = connect(&config).await?;
    if config.database.run_migrations && !no_migrate {
        database.migrate().await?;
    }

    let pipeline = Pipeline::from_config(Arc::new(config), Arc::new(database))?;

    let summary = pipeline
        .run(async {
            if let Err(e) = signal::ctrl_c().await {
                error!("Failed to listen for shutdown signal: {}", e);
                return;
            }
            info!("Received shutdown signal");
        })
        .await;

    let metrics = pipeline.metrics().snapshot();
    info!(
        ticks = summary.started,
        skipped = summary.skipped,
        fields_drained = metrics.fields_drained,
        dead_letters = metrics.dead_letters,
        "Ripple tally stopped"
    );

    Ok(())
}

async fn drain_once(config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = Config::load(config_path)?;
    let database = connect(&config).await?;
    let pipeline = Pipeline::from_config(Arc::new(config), Arc::new(database))?;

    match pipeline.drain_now(Utc::now()).await {
        TickOutcome::Completed(report) if json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        TickOutcome::Completed(report) => print_report(&report),
        TickOutcome::Skipped => warn!("Drain skipped, another tick is running"),
    }

    Ok(())
}

fn print_report(report: &TickReport) {
    println!("Drain at {}", report.at.to_rfc3339());
    println!(
        "{:<22} {:>8} {:>8} {:>9} {:>6} {:>6} {:>8} {:>6}",
        "pass", "buckets", "drained", "persisted", "zero", "dead", "persist!", "store!"
    );

    let rows = report
        .passes
        .iter()
        .map(|p| (p.pass, &p.report))
        .chain(std::iter::once(("total", &report.total)));

    for (pass, r) in rows {
        println!(
            "{:<22} {:>8} {:>8} {:>9} {:>6} {:>6} {:>8} {:>6}",
            pass,
            r.buckets,
            r.fields_drained,
            r.records_persisted,
            r.zero_skipped,
            r.dead_letters,
            r.persist_failures,
            r.store_failures
        );
    }
}

fn validate_config(config_path: Option<&Path>, show: bool) -> Result<()> {
    match config_path {
        Some(path) => info!("Validating configuration file: {}", path.display()),
        None => info!("Validating default configuration with environment overrides"),
    }

    let config = Config::load(config_path)?;

    info!("✅ Configuration is valid");

    if show {
        println!("Effective configuration:");
        println!("{}", config.to_toml()?);
    }

    Ok(())
}

fn init_config(output: PathBuf, force: bool) -> Result<()> {
    if output.exists() && !force {
        bail!(
            "{} already exists, pass --force to overwrite",
            output.display()
        );
    }

    let content = Config::default().to_toml()?;
    std::fs::write(&output, content)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    info!("Configuration written to {}", output.display());
    Ok(())
}

async fn handle_database_command(
    config_path: Option<&Path>,
    command: DatabaseCommands,
) -> Result<()> {
    let config = Config::load(config_path)?;
    let database = connect(&config).await?;

    match command {
        DatabaseCommands::Migrate => {
            info!("Running all pending migrations...");
            database.migrate().await?;
        }
        DatabaseCommands::Status => {
            info!("Checking database connection: {}", database.url());

            match database.health_check().await {
                Ok(_) => info!("✅ Database connection successful"),
                Err(e) => {
                    error!("❌ Database connection failed: {}", e);
                    return Err(e.into());
                }
            }

            let pending = database.pending_migrations().await?;
            if pending == 0 {
                info!("Schema is up to date");
            } else {
                warn!("{} pending migration(s)", pending);
            }
        }
    }

    Ok(())
}

/// Output layout for the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    /// `LOG_FORMAT` decides when set. Otherwise production deployments
    /// (`ENVIRONMENT` or `ENV` set to `production`/`prod`) log JSON.
    fn detect(var: impl Fn(&str) -> Option<String>) -> Self {
        let json = match var("LOG_FORMAT") {
            Some(format) => format.eq_ignore_ascii_case("json"),
            None => var("ENVIRONMENT")
                .or_else(|| var("ENV"))
                .is_some_and(|env| matches!(env.to_lowercase().as_str(), "production" | "prod")),
        };

        if json { LogFormat::Json } else { LogFormat::Compact }
    }
}

/// Default directives when `RUST_LOG` is unset: our crates at `level`, the
/// ORM and its driver kept quiet.
fn default_directives(level: &str) -> String {
    format!("ripple_tally={level},ripple_model={level},migration={level},sea_orm=warn,sqlx=warn")
}

fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let level = match args.verbose {
        0 => args.log_level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let format = LogFormat::detect(|name| std::env::var(name).ok());
    let layer = match format {
        LogFormat::Json => fmt::layer().json().flatten_event(true).with_current_span(true).boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(false).boxed(),
    };

    tracing_subscriber::registry().with(env_filter).with(layer).try_init()?;
    tracing::debug!(?format, level, "Logging initialized");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tracing_subscriber::EnvFilter;

    fn detect(vars: &[(&str, &str)]) -> LogFormat {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LogFormat::detect(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_log_format_detection() {
        assert_eq!(detect(&[]), LogFormat::Compact);
        assert_eq!(detect(&[("LOG_FORMAT", "JSON")]), LogFormat::Json);
        assert_eq!(detect(&[("ENVIRONMENT", "production")]), LogFormat::Json);
        assert_eq!(detect(&[("ENV", "prod")]), LogFormat::Json);
        assert_eq!(detect(&[("ENVIRONMENT", "staging")]), LogFormat::Compact);
        // An explicit format beats the environment
        assert_eq!(
            detect(&[("LOG_FORMAT", "compact"), ("ENVIRONMENT", "production")]),
            LogFormat::Compact
        );
    }

    #[test]
    fn test_default_directives_quiet_the_orm() {
        let directives = default_directives("debug");
        assert!(directives.contains("ripple_tally=debug"));
        assert!(directives.contains("sea_orm=warn"));
        assert!(EnvFilter::try_new(directives).is_ok());
    }
}

//! The crawler's command-line surface: one subcommand per operator action,
//! a fixed set of exit codes downstream tooling scripts against, and
//! nothing else — every interesting decision lives in `crawler_orchestrator`
//! or `crawler_store`.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use crawler_ids::CollectionId;
use crawler_intel::{classify_health, collect, CollectorConfig};
use crawler_logging::{init_logging, LogConfig};
use crawler_orchestrator::Crawler;
use crawler_protocol::{CanonicalMcp, CrawlerConfig};
use crawler_store::{create_pool, Store};

#[derive(Parser, Debug)]
#[command(name = "crawler", about = "MCP registry crawler")]
struct Cli {
    /// Path to a TOML configuration file, layered under environment variables.
    #[arg(long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Emit machine-readable JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Raise the console log level to match the file log level.
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress console logging below `warn` (for non-interactive piping).
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print whether the crawler and scheduler are enabled, and the last successful run.
    Status,
    /// Enable the crawler after interactive confirmation.
    Enable {
        /// Skip the confirmation prompt (for scripting).
        #[arg(long)]
        yes: bool,
    },
    /// Disable the crawler and the schedule.
    Disable,
    /// Run one pipeline pass now.
    RunOnce,
    /// Validate configuration without crawling.
    Test,
    /// Print the last N run rows.
    History {
        #[arg(default_value_t = 10)]
        n: u32,
    },
    /// Run live validation on one named MCP, or on every persisted MCP.
    HealthCheck { name: Option<String> },
    #[command(subcommand)]
    Schedule(ScheduleCommand),
}

#[derive(Subcommand, Debug)]
enum ScheduleCommand {
    Enable,
    Disable,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(LogConfig { app_name: "crawler", verbose: cli.verbose, quiet: cli.quiet }) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::from(1);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            return ExitCode::from(1);
        }
    };

    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> ExitCode {
    let file_contents = match &cli.config {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(contents) => Some(contents),
            Err(e) => {
                eprintln!("could not read config file {}: {e}", path.display());
                return ExitCode::from(1);
            }
        },
        None => None,
    };

    let config = match CrawlerConfig::from_env_and_file(file_contents.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    match cli.command {
        Commands::Test => return cmd_test(&config),
        Commands::Status => return cmd_status(config, cli.json).await,
        Commands::Enable { yes } => return cmd_enable(config, yes).await,
        Commands::Disable => return cmd_disable(config).await,
        Commands::RunOnce => return cmd_run_once(config).await,
        Commands::History { n } => return cmd_history(config, n, cli.json).await,
        Commands::HealthCheck { name } => return cmd_health_check(config, name, cli.json).await,
        Commands::Schedule(sub) => return cmd_schedule(config, sub).await,
    }
}

fn cmd_test(config: &CrawlerConfig) -> ExitCode {
    match config.validate() {
        Ok(()) => {
            println!("configuration valid");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("configuration invalid: {e}");
            ExitCode::from(1)
        }
    }
}

async fn open_crawler(config: CrawlerConfig) -> anyhow::Result<Crawler> {
    let pool = create_pool(&config.db_url, 5).await?;
    let store = Store::new(pool);
    Ok(Crawler::new(config, store))
}

async fn cmd_status(config: CrawlerConfig, json: bool) -> ExitCode {
    let crawler = match open_crawler(config).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("could not open store: {e}");
            return ExitCode::from(1);
        }
    };
    let status = crawler.status().await;
    if json {
        println!(
            "{}",
            serde_json::json!({
                "enabled": status.enabled,
                "schedule_enabled": status.schedule_enabled,
                "run_state": format!("{:?}", status.run_state),
                "last_successful_run": status.last_successful_run,
            })
        );
    } else {
        println!("crawler enabled:  {}", status.enabled);
        println!("schedule enabled: {}", status.schedule_enabled);
        println!("run state:        {:?}", status.run_state);
        match status.last_successful_run {
            Some(ts) => println!("last successful run: {ts}"),
            None => println!("last successful run: never"),
        }
    }
    ExitCode::SUCCESS
}

async fn cmd_enable(config: CrawlerConfig, yes: bool) -> ExitCode {
    if !yes && !confirm("Enable the crawler?") {
        println!("aborted");
        return ExitCode::from(2);
    }
    let crawler = match open_crawler(config).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("could not open store: {e}");
            return ExitCode::from(1);
        }
    };
    crawler.enable();
    println!("crawler enabled");
    ExitCode::SUCCESS
}

async fn cmd_disable(config: CrawlerConfig) -> ExitCode {
    let crawler = match open_crawler(config).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("could not open store: {e}");
            return ExitCode::from(1);
        }
    };
    crawler.disable().await;
    println!("crawler and schedule disabled");
    ExitCode::SUCCESS
}

async fn cmd_run_once(config: CrawlerConfig) -> ExitCode {
    let crawler = match open_crawler(config).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("could not open store: {e}");
            return ExitCode::from(1);
        }
    };
    match crawler.run_once().await {
        Ok(outcome) => {
            println!(
                "run {} finished: {:?} (discovered {}, filtered {}, scraped {}, validated {}, upserted {}, errors {})",
                outcome.run_id,
                outcome.status,
                outcome.counts.candidates_discovered,
                outcome.counts.candidates_filtered,
                outcome.counts.candidates_scraped,
                outcome.counts.candidates_validated,
                outcome.counts.records_upserted,
                outcome.counts.errors,
            );
            if matches!(outcome.status, crawler_orchestrator::RunCompletionStatus::Completed) {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(1)
            }
        }
        Err(e) => {
            eprintln!("run-once failed: {e}");
            ExitCode::from(1)
        }
    }
}

async fn cmd_history(config: CrawlerConfig, n: u32, json: bool) -> ExitCode {
    let crawler = match open_crawler(config).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("could not open store: {e}");
            return ExitCode::from(1);
        }
    };
    let rows = match crawler.history(n).await {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("could not read run history: {e}");
            return ExitCode::from(1);
        }
    };
    if json {
        println!("{}", serde_json::to_string_pretty(&history_as_json(&rows)).unwrap_or_default());
    } else if rows.is_empty() {
        println!("no runs recorded");
    } else {
        for row in rows {
            println!(
                "{} started={} status={} discovered={} upserted={} errors={}",
                row.id,
                row.started_at,
                row.status,
                row.counters.candidates_discovered,
                row.counters.records_upserted,
                row.counters.errors,
            );
        }
    }
    ExitCode::SUCCESS
}

fn history_as_json(rows: &[crawler_store::RunRecord]) -> serde_json::Value {
    serde_json::Value::Array(
        rows.iter()
            .map(|row| {
                serde_json::json!({
                    "id": row.id,
                    "started_at": row.started_at,
                    "completed_at": row.completed_at,
                    "status": row.status,
                    "candidates_discovered": row.counters.candidates_discovered,
                    "candidates_filtered": row.counters.candidates_filtered,
                    "candidates_scraped": row.counters.candidates_scraped,
                    "candidates_validated": row.counters.candidates_validated,
                    "records_upserted": row.counters.records_upserted,
                    "errors": row.counters.errors,
                })
            })
            .collect(),
    )
}

async fn cmd_health_check(config: CrawlerConfig, name: Option<String>, json: bool) -> ExitCode {
    let pool = match create_pool(&config.db_url, 5).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("could not open store: {e}");
            return ExitCode::from(1);
        }
    };
    let store = Store::new(pool);

    let targets: Vec<CanonicalMcp> = match name {
        Some(name) => match store.get_by_slug(&name).await {
            Ok(Some(record)) => vec![record],
            Ok(None) => {
                eprintln!("no MCP found with slug {name:?}");
                return ExitCode::from(1);
            }
            Err(e) => {
                eprintln!("lookup failed: {e}");
                return ExitCode::from(1);
            }
        },
        None => match store.list_all().await {
            Ok(records) => records,
            Err(e) => {
                eprintln!("listing failed: {e}");
                return ExitCode::from(1);
            }
        },
    };

    let collector_config = CollectorConfig {
        scratch_base_dir: std::env::temp_dir().join("mcp-registry-crawler-scratch"),
        timeouts: config.timeouts.clone(),
    };

    let mut any_unhealthy = false;
    let mut results = Vec::new();
    for record in &targets {
        let install_command = record
            .installation_methods
            .first()
            .map(|m| m.command.as_str())
            .unwrap_or(&record.endpoint_command);
        let candidate = synthetic_candidate(record);
        let collection_id = CollectionId::new();
        let report = collect(&candidate, install_command, &record.endpoint_command, &collection_id, &collector_config).await;
        let handshake_ok = report.protocol_version.is_some() || !report.tools.is_empty();
        let health = classify_health(handshake_ok, &report);
        if !matches!(health, crawler_protocol::HealthStatus::Healthy | crawler_protocol::HealthStatus::Degraded) {
            any_unhealthy = true;
        }
        results.push((record.slug.clone(), health));
    }

    if json {
        let payload: Vec<_> = results
            .iter()
            .map(|(slug, health)| serde_json::json!({ "slug": slug, "health_status": format!("{health:?}") }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    } else {
        for (slug, health) in &results {
            println!("{slug}: {health:?}");
        }
    }

    if any_unhealthy {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}

fn synthetic_candidate(record: &CanonicalMcp) -> crawler_protocol::Candidate {
    crawler_protocol::Candidate {
        ecosystem: record.ecosystem,
        identifier: record.ecosystem_identifier.clone(),
        declared_description: Some(record.short_description.value.clone()),
        declared_repository_url: record.repository_url.clone(),
        discovery_method: "health-check".to_string(),
        discovered_at: record.last_scraped_at,
    }
}

async fn cmd_schedule(config: CrawlerConfig, sub: ScheduleCommand) -> ExitCode {
    let crawler = match open_crawler(config).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("could not open store: {e}");
            return ExitCode::from(1);
        }
    };
    match sub {
        ScheduleCommand::Enable => {
            crawler.enable_schedule().await;
            println!("schedule enabled");
        }
        ScheduleCommand::Disable => {
            crawler.disable_schedule().await;
            println!("schedule disabled");
        }
    }
    ExitCode::SUCCESS
}

fn confirm(prompt: &str) -> bool {
    use std::io::Write;
    print!("{prompt} [y/N] ");
    let _ = std::io::stdout().flush();
    let mut line = String::new();
    if std::io::stdin().read_line(&mut line).is_err() {
        return false;
    }
    matches!(line.trim().to_lowercase().as_str(), "y" | "yes")
}

//! press-send - Generate and publish queued articles
//!
//! Shows queue status, runs a single publish attempt, or runs the
//! scheduler daemon that publishes one plan per interval.

use clap::{ArgGroup, Parser};
use libautopress::logging::{LogFormat, LoggingConfig};
use libautopress::{Config, Database, Publisher, Result, ScheduleSettings, Scheduler, StatusReport};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "press-send")]
#[command(version)]
#[command(about = "Generate and publish queued articles")]
#[command(group(ArgGroup::new("mode").args(["status", "publish_now", "daemon"])))]
#[command(long_about = "\
press-send - Generate and publish queued articles

DESCRIPTION:
    press-send takes the oldest pending plan from the Autopress queue,
    asks the generative API for an article and an illustration, publishes
    the result to WordPress and optionally mirrors a summary to the
    configured social networks.

    In daemon mode (the default) it polls the queue, publishes at most
    once per publish interval and waits out a cooldown after failures.

USAGE:
    # Show queue status and the next publish time
    press-send --status

    # Publish the next plan right now
    press-send --publish-now

    # Run the scheduler with a one-minute poll
    press-send --daemon --poll-interval 60

SIGNALS:
    SIGTERM, SIGINT - Graceful shutdown (finishes the current attempt)

CONFIGURATION:
    Configuration file: ~/.config/autopress/config.toml
    Database location: ~/.local/share/autopress/storage.db

    [scheduler]
    publish_interval = \"3days\"
    failure_cooldown = \"60m\"
    poll_interval = \"5m\"

    Override with environment variables (a .env file is read too):
        AUTOPRESS_CONFIG   - Path to config file
        AUTOPRESS_DB_PATH  - Path to database file
        GEMINI_API_KEY     - Generative API key
        WP_BASE_URL, WP_USERNAME, WP_APP_PASSWORD - WordPress access

EXIT CODES:
    0 - Success or clean shutdown
    1 - Queue empty, publish failed, or runtime error
    2 - Configuration error
    3 - Invalid input
")]
struct Cli {
    /// Print queue status and exit
    #[arg(long)]
    status: bool,

    /// Run one publish attempt and exit
    #[arg(long)]
    publish_now: bool,

    /// Run the scheduler loop (default)
    #[arg(long)]
    daemon: bool,

    /// Poll interval in seconds (overrides config)
    #[arg(long, value_name = "SECONDS")]
    poll_interval: Option<u64>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,

    /// Log format: text, json or pretty
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    LoggingConfig::from_env(cli.log_format, cli.verbose).init();

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<i32> {
    let config = Config::load()?;
    let db = Database::new(&config.database_path().to_string_lossy()).await?;

    let mut settings = ScheduleSettings::from_config(&config.scheduler)?;
    if let Some(seconds) = cli.poll_interval {
        settings = settings.with_poll_interval(std::time::Duration::from_secs(seconds.max(1)));
    }

    if cli.status {
        let report = StatusReport::collect(&db, settings.interval).await?;
        println!("{}", report);
        return Ok(0);
    }

    if cli.publish_now {
        return publish_now(&config, db).await;
    }

    run_daemon(&config, db, settings).await
}

async fn publish_now(config: &Config, db: Database) -> Result<i32> {
    // An empty queue needs no upstream credentials
    if db.next_pending_plan().await?.is_none() {
        eprintln!("Queue is empty, nothing to publish");
        return Ok(1);
    }

    let publisher = Publisher::from_config(config, db)?;
    match publisher.publish_next().await? {
        Some(outcome) => {
            println!("Published: {}", outcome.title);
            println!("CMS post:  {}", outcome.cms_post_id);
            if let Some(link) = &outcome.link {
                println!("Link:      {}", link);
            }
            for result in &outcome.mirror {
                match (&result.post_id, &result.error) {
                    (Some(id), _) => println!("  {}: {}", result.platform, id),
                    (None, Some(err)) => println!("  {}: failed ({})", result.platform, err),
                    (None, None) => println!("  {}: skipped", result.platform),
                }
            }
            Ok(0)
        }
        None => {
            eprintln!("Queue is empty, nothing to publish");
            Ok(1)
        }
    }
}

async fn run_daemon(config: &Config, db: Database, settings: ScheduleSettings) -> Result<i32> {
    let publisher = Publisher::from_config(config, db)?;
    let mut scheduler = Scheduler::new(publisher, settings);

    let shutdown = Arc::new(AtomicBool::new(false));
    if let Err(e) = setup_signal_handlers(shutdown.clone()) {
        error!("Signal setup failed: {:#}", e);
        return Ok(1);
    }

    info!("press-send daemon starting");
    scheduler.run(shutdown).await?;
    info!("press-send daemon stopped");
    Ok(0)
}

/// Set the shutdown flag on SIGINT or SIGTERM
#[cfg(unix)]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> anyhow::Result<()> {
    use anyhow::Context;
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let mut signals =
        Signals::new([SIGINT, SIGTERM]).context("registering SIGINT/SIGTERM handlers")?;

    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            info!("Received shutdown signal, stopping gracefully...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });

    Ok(())
}

/// Set the shutdown flag on Ctrl-C
#[cfg(not(unix))]
fn setup_signal_handlers(shutdown: Arc<AtomicBool>) -> anyhow::Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received shutdown signal, stopping gracefully...");
            shutdown.store(true, Ordering::Relaxed);
        }
    });
    Ok(())
}

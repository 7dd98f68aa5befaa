//! press-queue - Manage the article plan queue
//!
//! Unix-style tool for adding, importing and inspecting queued plans.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use libautopress::cms::wordpress::WordPressClient;
use libautopress::cms::Cms;
use libautopress::logging::LoggingConfig;
use libautopress::plans;
use libautopress::types::from_unix;
use libautopress::{AutopressError, Config, Database, NewPlan, PlanItem, PlanStatus, Result};
use std::collections::BTreeMap;
use std::path::PathBuf;

const LIST_LIMIT: usize = 10_000;

#[derive(Parser, Debug)]
#[command(name = "press-queue")]
#[command(version)]
#[command(about = "Manage the article plan queue")]
#[command(long_about = "\
press-queue - Manage the article plan queue

DESCRIPTION:
    press-queue adds article plans to the Autopress queue, imports plan
    files, and shows what is pending and what has been published.

COMMANDS:
    add        Queue a single plan
    import     Import an outline text file or a category,title CSV
    list       List plans
    stats      Show queue statistics
    show-post  Fetch a published post from WordPress

USAGE EXAMPLES:
    # Queue a plan with a category
    press-queue add \"How AI Changes Painting\" --category \"AI & Culture\"

    # Import a CSV plan; duplicates are skipped
    press-queue import plans/march.csv --csv

    # List pending plans as JSON
    press-queue list --status pending --format json

CONFIGURATION:
    Configuration file: ~/.config/autopress/config.toml
    Database location: ~/.local/share/autopress/storage.db

    Override with environment variables:
        AUTOPRESS_CONFIG    - Path to config file
        AUTOPRESS_DB_PATH   - Path to database file

EXIT CODES:
    0 - Success
    1 - Operation failed
    2 - Database or configuration error
    3 - Invalid input (empty seed, unreadable file, bad format)
")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Queue a single plan
    Add {
        /// Topic the article is generated from
        seed: String,

        /// Search phrase the article should target
        #[arg(long, default_value = "")]
        seo_focus: String,

        /// Blog category to file the post under
        #[arg(long)]
        category: Option<String>,
    },

    /// Import plans from a file
    Import {
        /// Outline text file, or CSV with --csv
        file: PathBuf,

        /// Treat the file as `category,title` rows
        #[arg(long)]
        csv: bool,
    },

    /// List plans
    List {
        /// pending, published or all
        #[arg(short, long, default_value = "all")]
        status: String,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show queue statistics
    Stats {
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Fetch a published post from the CMS
    ShowPost {
        /// WordPress post id
        cms_post_id: i64,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    LoggingConfig::new(Default::default(), level, cli.verbose).init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let db = Database::new(&config.database_path().to_string_lossy()).await?;

    match cli.command {
        Commands::Add {
            seed,
            seo_focus,
            category,
        } => cmd_add(&db, seed, seo_focus, category).await,
        Commands::Import { file, csv } => cmd_import(&db, &file, csv).await,
        Commands::List { status, format } => cmd_list(&db, &status, &format).await,
        Commands::Stats { format } => cmd_stats(&db, &format).await,
        Commands::ShowPost { cms_post_id } => cmd_show_post(&config, &db, cms_post_id).await,
    }
}

fn validate_format(format: &str) -> Result<()> {
    if format != "text" && format != "json" {
        return Err(AutopressError::InvalidInput(format!(
            "Invalid format '{}'. Must be 'text' or 'json'",
            format
        )));
    }
    Ok(())
}

fn parse_status_filter(status: &str) -> Result<Option<PlanStatus>> {
    if status.eq_ignore_ascii_case("all") {
        return Ok(None);
    }
    status
        .parse::<PlanStatus>()
        .map(Some)
        .map_err(AutopressError::InvalidInput)
}

async fn cmd_add(
    db: &Database,
    seed: String,
    seo_focus: String,
    category: Option<String>,
) -> Result<()> {
    if db.plan_exists_by_seed(seed.trim()).await? {
        return Err(AutopressError::InvalidInput(format!(
            "A plan with this seed already exists: {}",
            seed.trim()
        )));
    }

    let mut plan = NewPlan::new(seed).with_seo_focus(seo_focus);
    if let Some(category) = category {
        plan = plan.with_category(category);
    }

    let id = db.add_plan(&plan).await?;
    println!("{}", id);
    Ok(())
}

async fn cmd_import(db: &Database, file: &std::path::Path, csv: bool) -> Result<()> {
    let stats = plans::import_file(db, file, csv).await?;

    println!("Rows processed:     {}", stats.total_rows);
    println!("Added:              {}", stats.added);
    println!("Skipped duplicates: {}", stats.skipped_duplicates);
    println!("Errors:             {}", stats.errors);
    Ok(())
}

async fn cmd_list(db: &Database, status: &str, format: &str) -> Result<()> {
    validate_format(format)?;
    let filter = parse_status_filter(status)?;
    let plans = db.list_plans(filter, LIST_LIMIT).await?;

    if format == "json" {
        let json = serde_json::to_string_pretty(&plans).map_err(|e| {
            AutopressError::InvalidInput(format!("Failed to serialize plans: {}", e))
        })?;
        println!("{}", json);
    } else {
        output_list_text(&plans);
    }
    Ok(())
}

fn output_list_text(plans: &[PlanItem]) {
    for plan in plans {
        let category = plan.category.as_deref().unwrap_or("-");
        println!(
            "{} | {} | {} | {} | {}",
            plan.id,
            plan.status,
            format_timestamp(from_unix(plan.created_at)),
            category,
            truncate_content(&plan.seed, 60)
        );
    }
}

/// Truncate to `max_chars` characters with an ellipsis
fn truncate_content(content: &str, max_chars: usize) -> String {
    if content.chars().count() <= max_chars {
        content.to_string()
    } else {
        let cut: String = content.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}

fn format_timestamp(time: Option<DateTime<Utc>>) -> String {
    time.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

async fn cmd_stats(db: &Database, format: &str) -> Result<()> {
    validate_format(format)?;
    let status = db.queue_status().await?;

    let mut by_category: BTreeMap<String, i64> = BTreeMap::new();
    for plan in db.list_plans(None, LIST_LIMIT).await? {
        let key = plan.category.unwrap_or_else(|| "uncategorized".to_string());
        *by_category.entry(key).or_insert(0) += 1;
    }

    if format == "json" {
        let json = serde_json::json!({
            "pending": status.pending,
            "published": status.published,
            "total": status.total,
            "posts": status.posts,
            "last_publish": status.last_publish.map(|t| t.to_rfc3339()),
            "categories": by_category,
        });
        println!("{}", json);
        return Ok(());
    }

    println!("Pending:      {}", status.pending);
    println!("Published:    {}", status.published);
    println!("Total:        {}", status.total);
    println!("Posts:        {}", status.posts);
    println!("Last publish: {}", format_timestamp(status.last_publish));
    if !by_category.is_empty() {
        println!();
        println!("By category:");
        for (category, count) in &by_category {
            println!("  {}: {}", category, count);
        }
    }
    Ok(())
}

async fn cmd_show_post(config: &Config, db: &Database, cms_post_id: i64) -> Result<()> {
    let client = WordPressClient::new(&config.cms)?;
    let post = client.get_post(cms_post_id).await?;

    println!("ID:        {}", post.id);
    println!("Title:     {}", post.title);
    println!("Slug:      {}", post.slug);
    println!("Status:    {}", post.status);
    if let Some(link) = &post.link {
        println!("Link:      {}", link);
    }
    if let Some(date) = &post.date {
        println!("Date:      {}", date);
    }
    if let Some(media) = post.featured_media {
        println!("Media:     {}", media);
    }
    println!("Tags:      {}", post.tags.len());

    if let Some(record) = db.get_post_by_cms_id(cms_post_id).await? {
        println!("Keywords:  {}", record.keywords.join(", "));
        println!(
            "Recorded:  {}",
            format_timestamp(from_unix(record.published_at))
        );
    }

    if !post.excerpt.is_empty() {
        println!();
        println!("{}", post.excerpt);
    }
    println!();
    println!("{}", truncate_content(&post.content_text, 500));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_content_respects_char_boundaries() {
        assert_eq!(truncate_content("short", 10), "short");
        assert_eq!(truncate_content("Искусственный", 5), "Искус...");
    }

    #[test]
    fn test_status_filter() {
        assert_eq!(parse_status_filter("all").unwrap(), None);
        assert_eq!(
            parse_status_filter("pending").unwrap(),
            Some(PlanStatus::Pending)
        );
        assert_eq!(parse_status_filter("done").unwrap_err().exit_code(), 3);
    }

    #[test]
    fn test_validate_format() {
        assert!(validate_format("text").is_ok());
        assert!(validate_format("json").is_ok());
        assert!(validate_format("yaml").is_err());
    }
}

mod analytics;
mod api;
mod config;
mod content;
mod models;
mod pipeline;
mod scheduler;
mod scraper;
mod storage;
mod utils;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::analytics::ScraperAnalytics;
use crate::api::AppState;
use crate::config::AppConfig;
use crate::content::ContentGenerator;
use crate::models::TriggerType;
use crate::pipeline::{Orchestrator, ScrapeOutcome, ScrapeRequest};
use crate::scheduler::{spawn_worker, DailyRun, Scheduler, ScrapeQueue};
use crate::scraper::{build_adapters, Platform};
use crate::storage::Repository;

#[derive(Parser)]
#[command(name = "webinar-hub", about = "Free webinar discovery and registration backend", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API with the daily scheduler and background scrape worker
    Serve,

    /// Run one manual scrape across the enabled sources
    Scrape {
        #[arg(short, long)]
        category: Option<String>,

        #[arg(short, long)]
        keyword: Option<String>,

        /// Restrict to these sources (repeatable)
        #[arg(short, long = "source")]
        sources: Vec<String>,

        /// Ignore the recent-scrape cache
        #[arg(short, long)]
        force: bool,
    },

    /// Run the daily update once
    Daily,

    /// List source adapters and whether each is enabled
    Sources,

    /// Show database statistics
    Stats,

    /// Apply schema migrations
    Migrate,
}

fn open_repo(config: &AppConfig) -> Result<Arc<Repository>> {
    let repo = Repository::open(&config.storage.db_path)?;
    if config.storage.run_migrations {
        repo.run_migrations()?;
    }
    Ok(Arc::new(repo))
}

fn build_orchestrator(config: &AppConfig, repo: Arc<Repository>) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::new(
        build_adapters(&config.scraper),
        repo,
        Arc::new(ScraperAnalytics::new()),
        config.scraper.cache_window_mins,
    ))
}

fn build_scheduler(config: &AppConfig, repo: Arc<Repository>, orchestrator: Arc<Orchestrator>) -> Result<Arc<Scheduler>> {
    let content = Arc::new(ContentGenerator::new(repo, config.content.clone())?);
    Ok(Arc::new(Scheduler::new(orchestrator, content, config.scheduler.clone())))
}

fn print_outcome(outcome: &ScrapeOutcome) {
    println!("─────────────────────────────────────────────────────────");
    println!("  {:<14} {:>6} {:>6}  {}", "Source", "Found", "New", "Status");
    println!("─────────────────────────────────────────────────────────");
    for r in &outcome.results {
        let status = match &r.error {
            Some(e) => utils::clip(e, 28),
            None => "ok".to_string(),
        };
        println!(
            "  {:<14} {:>6} {:>6}  {}",
            utils::clip(&r.source, 14),
            r.webinars.len(),
            r.count,
            status
        );
    }
    println!("─────────────────────────────────────────────────────────");
    println!("  {}", outcome.message);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "webinar_hub=info,warn",
        1 => "webinar_hub=debug,info",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Serve => {
            let repo = open_repo(&config)?;
            let orchestrator = build_orchestrator(&config, repo.clone());
            let scheduler = build_scheduler(&config, repo.clone(), orchestrator.clone())?;

            let queue = if config.scheduler.background_scrapes {
                let (queue, rx) = ScrapeQueue::channel(config.scheduler.queue_capacity);
                spawn_worker(scheduler.clone(), rx);
                queue
            } else {
                info!("Background scrapes disabled");
                ScrapeQueue::disabled()
            };

            if config.scheduler.enabled {
                scheduler.clone().start();
            } else {
                info!("Daily scheduler disabled");
            }

            let state = Arc::new(AppState {
                repo,
                orchestrator,
                queue,
                server: config.server.clone(),
            });
            api::serve(state).await?;
        }

        Command::Scrape { category, keyword, sources, force } => {
            let _t = utils::Timer::start("Manual scrape");
            let repo = open_repo(&config)?;
            let orchestrator = build_orchestrator(&config, repo);

            let req = ScrapeRequest {
                sources: (!sources.is_empty()).then_some(sources),
                category,
                keyword,
                force,
                ..ScrapeRequest::new(TriggerType::Manual)
            };
            let outcome = orchestrator.scrape_all(&req).await;
            print_outcome(&outcome);
            orchestrator.analytics().log_health();
        }

        Command::Daily => {
            let repo = open_repo(&config)?;
            let orchestrator = build_orchestrator(&config, repo.clone());
            let scheduler = build_scheduler(&config, repo, orchestrator)?;

            match scheduler.run_daily_update().await {
                DailyRun::Skipped => println!("Daily update already running."),
                DailyRun::Completed { new_webinars, content_pieces } => println!(
                    "Daily update done: {} new webinars, {} content pieces.",
                    new_webinars, content_pieces
                ),
            }
        }

        Command::Sources => {
            println!("{} sources:", Platform::ALL.len());
            for p in Platform::ALL {
                let enabled = config
                    .scraper
                    .enabled_sources
                    .iter()
                    .any(|n| p.name().eq_ignore_ascii_case(n.trim()));
                println!(
                    "  {:<14} {:<8} {:>5}ms  {}",
                    p.name(),
                    if enabled { "enabled" } else { "off" },
                    p.rate_limit().as_millis(),
                    p.base_url()
                );
            }
        }

        Command::Stats => {
            let repo = open_repo(&config)?;
            let last = repo.last_scrape_at()?;
            println!("─────────────────────────────────");
            println!("  Webinar Hub — Database Stats");
            println!("─────────────────────────────────");
            println!("  Webinars      : {}", utils::fmt_number(repo.webinar_count()?));
            println!("  Registrations : {}", utils::fmt_number(repo.registration_count()?));
            println!("  Scrape logs   : {}", utils::fmt_number(repo.scrape_log_count()?));
            println!("  Blog posts    : {}", utils::fmt_number(repo.blog_post_count()?));
            println!("  Guides        : {}", utils::fmt_number(repo.guide_count()?));
            println!(
                "  Last scrape   : {}",
                last.map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or("—".into())
            );
            println!("─────────────────────────────────");
        }

        Command::Migrate => {
            Repository::open(&config.storage.db_path)?.run_migrations()?;
            println!("Migrations applied.");
        }
    }

    Ok(())
}

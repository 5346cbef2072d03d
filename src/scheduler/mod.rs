//! Daily refresh loop, user-triggered scrapes, and the background scrape
//! queue that read endpoints publish to.

use crate::config::SchedulerConfig;
use crate::content::ContentGenerator;
use crate::models::TriggerType;
use crate::pipeline::{Orchestrator, ScrapeOutcome, ScrapeRequest};
use crate::utils::Timer;
use chrono::{DateTime, Days, Local, NaiveDateTime, NaiveTime, TimeZone};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DailyRun {
    /// Another daily run was already in flight.
    Skipped,
    Completed { new_webinars: usize, content_pieces: usize },
}

/// Clears the in-flight flag however the run ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    content: Arc<ContentGenerator>,
    config: SchedulerConfig,
    running: AtomicBool,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, content: Arc<ContentGenerator>, config: SchedulerConfig) -> Self {
        Self {
            orchestrator,
            content,
            config,
            running: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Claim the in-flight flag shared by daily runs and user triggers.
    fn try_enter(&self) -> Option<InFlight<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| InFlight(&self.running))
    }

    pub async fn run_daily_update(&self) -> DailyRun {
        let Some(_flag) = self.try_enter() else {
            info!("Daily update already running, skipping...");
            return DailyRun::Skipped;
        };
        let _t = Timer::start("daily update");

        let req = ScrapeRequest { force: true, ..ScrapeRequest::new(TriggerType::Daily) };
        let outcome = self.orchestrator.scrape_all(&req).await;
        info!("Daily scrape completed: {} new webinars found", outcome.total_new_webinars);

        let mut content_pieces = 0;
        if outcome.total_new_webinars > 0 {
            content_pieces = self.regenerate_content().await;
            info!("Generated {} SEO content pieces", content_pieces);
            self.content.trigger_build_hook().await;
        }

        self.orchestrator.analytics().log_health();

        DailyRun::Completed {
            new_webinars: outcome.total_new_webinars,
            content_pieces,
        }
    }

    /// Non-forced scrape on behalf of a user request. A no-op while another
    /// scrape holds the in-flight flag.
    pub async fn handle_user_trigger(&self, category: Option<String>, keyword: Option<String>) -> ScrapeOutcome {
        let req = ScrapeRequest {
            category,
            keyword,
            ..ScrapeRequest::new(TriggerType::UserAction)
        };
        let Some(_flag) = self.try_enter() else {
            let message = format!("Scrape already running, skipping user trigger for {}", req.scope());
            info!("{}", message);
            return ScrapeOutcome {
                success: true,
                results: Vec::new(),
                total_new_webinars: 0,
                message,
            };
        };
        let outcome = self.orchestrator.scrape_all(&req).await;

        if outcome.total_new_webinars > self.config.user_trigger_threshold {
            info!(
                "User trigger found {} new webinars, regenerating content",
                outcome.total_new_webinars
            );
            self.regenerate_content().await;
        }
        outcome
    }

    /// Content generation is synchronous DuckDB work, so it runs on the blocking pool.
    async fn regenerate_content(&self) -> usize {
        let content = self.content.clone();
        match tokio::task::spawn_blocking(move || content.generate_daily_content()).await {
            Ok(run) => run.total,
            Err(e) => {
                error!("Content generation task failed: {}", e);
                0
            }
        }
    }

    /// Run the daily update at `daily_hour`:00 local time, every day.
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let delay = delay_until_next(self.config.daily_hour, Local::now());
                info!(
                    "Next daily update in {}h{:02}m",
                    delay.as_secs() / 3600,
                    delay.as_secs() % 3600 / 60
                );
                tokio::time::sleep(delay).await;
                self.run_daily_update().await;
            }
        })
    }
}

/// Time from `now` to the next `hour`:00 wall-clock time in `now`'s zone,
/// strictly in the future. An hour skipped by a DST jump resolves to the
/// first instant after the gap.
pub fn delay_until_next<Tz: TimeZone>(hour: u32, now: DateTime<Tz>) -> Duration {
    let day = Duration::from_secs(24 * 3600);
    let Some(at) = NaiveTime::from_hms_opt(hour, 0, 0) else {
        warn!("Invalid daily hour {}, retrying in 24h", hour);
        return day;
    };

    let tz = now.timezone();
    for offset in 0..=1 {
        let local = (now.date_naive() + Days::new(offset)).and_time(at);
        let Some(target) = resolve_local(&tz, local) else {
            continue;
        };
        if target > now {
            return (target - now.clone()).to_std().unwrap_or(day);
        }
    }
    day
}

fn resolve_local<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    tz.from_local_datetime(&local)
        .earliest()
        .or_else(|| tz.from_local_datetime(&(local + chrono::Duration::hours(1))).earliest())
}

// ── Background scrape queue ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeJob {
    pub category: Option<String>,
    pub keyword: Option<String>,
}

/// Sending half of the bounded scrape queue. Publishing never waits.
#[derive(Clone)]
pub struct ScrapeQueue {
    tx: Option<mpsc::Sender<ScrapeJob>>,
}

impl ScrapeQueue {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<ScrapeJob>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx: Some(tx) }, rx)
    }

    /// A queue that drops everything, for deployments without background scrapes.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Returns whether the job was queued.
    pub fn publish(&self, job: ScrapeJob) -> bool {
        let Some(tx) = &self.tx else {
            return false;
        };
        match tx.try_send(job) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(job)) => {
                warn!("Scrape queue full, dropping job {:?}", job);
                false
            }
            Err(mpsc::error::TrySendError::Closed(job)) => {
                warn!("Scrape worker gone, dropping job {:?}", job);
                false
            }
        }
    }
}

/// Drain jobs one at a time until every sender is dropped.
pub fn spawn_worker(scheduler: Arc<Scheduler>, mut rx: mpsc::Receiver<ScrapeJob>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            debug!("Scrape job {:?}", job);
            scheduler.handle_user_trigger(job.category, job.keyword).await;
        }
        info!("Scrape queue closed, worker exiting");
    })
}

pub mod catalog;
pub mod cleaner;

use crate::config::ScraperConfig;
use crate::models::Candidate;
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use self::cleaner::matches_scope;

// ── Source trait ──────────────────────────────────────────────────────────────

/// Swappable event source abstraction.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn name(&self) -> &str;

    /// Candidates whose tags, category or title match `scope`; everything when `None`.
    async fn fetch_candidates(&self, scope: Option<&str>) -> Result<Vec<Candidate>>;
}

// ── Platforms ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Eventbrite,
    Meetup,
    Devpost,
    Luma,
    WebinarNinja,
    GoToWebinar,
    ZoomWebinar,
}

impl Platform {
    pub const ALL: [Platform; 7] = [
        Platform::Eventbrite,
        Platform::Meetup,
        Platform::Devpost,
        Platform::Luma,
        Platform::WebinarNinja,
        Platform::GoToWebinar,
        Platform::ZoomWebinar,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Platform::Eventbrite => "Eventbrite",
            Platform::Meetup => "Meetup",
            Platform::Devpost => "Devpost",
            Platform::Luma => "Luma",
            Platform::WebinarNinja => "WebinarNinja",
            Platform::GoToWebinar => "GoToWebinar",
            Platform::ZoomWebinar => "ZoomWebinar",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Platform::Eventbrite => "https://www.eventbrite.com",
            Platform::Meetup => "https://www.meetup.com",
            Platform::Devpost => "https://devpost.com",
            Platform::Luma => "https://lu.ma",
            Platform::WebinarNinja => "https://webinarninja.com",
            Platform::GoToWebinar => "https://gotowebinar.logmein.com",
            Platform::ZoomWebinar => "https://zoom.us/webinar",
        }
    }

    /// Simulated per-request rate limit.
    pub fn rate_limit(&self) -> Duration {
        let ms = match self {
            Platform::Eventbrite => 1000,
            Platform::Meetup => 1500,
            Platform::Devpost => 1200,
            Platform::Luma => 1000,
            Platform::WebinarNinja => 2000,
            Platform::GoToWebinar => 2500,
            Platform::ZoomWebinar => 3000,
        };
        Duration::from_millis(ms)
    }

    pub fn from_name(name: &str) -> Option<Platform> {
        let name = name.trim();
        Platform::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── Canned source ─────────────────────────────────────────────────────────────

/// Serves a platform's fixed catalog after a simulated rate-limit pause.
pub struct CannedSource {
    platform: Platform,
    delay: Duration,
    jitter_ms: u64,
}

impl CannedSource {
    pub fn new(platform: Platform, config: &ScraperConfig) -> Self {
        let (delay, jitter_ms) = if config.simulate_delay {
            (platform.rate_limit(), config.jitter_ms)
        } else {
            (Duration::ZERO, 0)
        };
        Self { platform, delay, jitter_ms }
    }

    /// Sleep for the platform's rate limit + random jitter.
    async fn polite_delay(&self) {
        if self.delay.is_zero() && self.jitter_ms == 0 {
            return;
        }
        let jitter = if self.jitter_ms == 0 {
            0
        } else {
            rand::random::<u64>() % (self.jitter_ms + 1)
        };
        sleep(self.delay + Duration::from_millis(jitter)).await;
    }
}

#[async_trait]
impl SourceAdapter for CannedSource {
    fn name(&self) -> &str {
        self.platform.name()
    }

    async fn fetch_candidates(&self, scope: Option<&str>) -> Result<Vec<Candidate>> {
        self.polite_delay().await;

        info!(
            "Fetching {} ({}) scope={}",
            self.platform,
            self.platform.base_url(),
            scope.unwrap_or("*")
        );

        let now = Utc::now();
        let candidates: Vec<Candidate> = catalog::listings(self.platform)
            .iter()
            .map(|l| l.to_candidate(self.platform, now))
            .filter(|c| scope.is_none_or(|s| matches_scope(c, s)))
            .collect();

        debug!("{}: {} candidates matched", self.platform, candidates.len());
        Ok(candidates)
    }
}

/// Adapters enabled in config, in the canonical platform order.
pub fn build_adapters(config: &ScraperConfig) -> Vec<Arc<dyn SourceAdapter>> {
    for name in &config.enabled_sources {
        if Platform::from_name(name).is_none() {
            warn!("Unknown source {:?} in scraper.enabled_sources, ignoring", name);
        }
    }

    Platform::ALL
        .into_iter()
        .filter(|p| {
            config
                .enabled_sources
                .iter()
                .any(|n| p.name().eq_ignore_ascii_case(n.trim()))
        })
        .map(|p| Arc::new(CannedSource::new(p, config)) as Arc<dyn SourceAdapter>)
        .collect()
}

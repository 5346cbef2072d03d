//! Scrape orchestrator: ties source adapters → dedup → storage together.
//!
//! `scrape_all()` runs every selected adapter in turn for one scope:
//!   1. Skip the whole run if the same scope succeeded within the cache window
//!      (unless forced). The cache is keyed by the exact scope string.
//!   2. Fetch + validate each adapter's candidates, then insert the unseen ones
//!      and bump `last_fetched` on the rest. Identity is id or checksum.
//!   3. Append one scrape log entry per adapter, success or error.
//!   An adapter failure is isolated to its own result entry; the run as a whole
//!   always succeeds.

use crate::analytics::ScraperAnalytics;
use crate::models::{Candidate, LogStatus, ScrapeLogEntry, TriggerType};
use crate::scraper::cleaner::{to_record, valid_candidates};
use crate::scraper::SourceAdapter;
use crate::storage::WebinarStore;
use crate::utils::Timer;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRequest {
    /// Adapter names to run (case-insensitive). `None` runs every enabled adapter.
    #[serde(default)]
    pub sources: Option<Vec<String>>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(skip)]
    pub trigger: TriggerType,
    #[serde(default)]
    pub force: bool,
}

fn non_blank(s: &Option<String>) -> Option<&str> {
    s.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

impl ScrapeRequest {
    pub fn new(trigger: TriggerType) -> Self {
        Self { trigger, ..Default::default() }
    }

    pub fn category(&self) -> Option<&str> {
        non_blank(&self.category)
    }

    pub fn keyword(&self) -> Option<&str> {
        non_blank(&self.keyword)
    }

    /// Cache and log key: category, else keyword, else `"all"`.
    pub fn scope(&self) -> &str {
        self.category().or(self.keyword()).unwrap_or("all")
    }

    /// What adapters filter their catalog by.
    pub fn filter(&self) -> Option<&str> {
        self.category().or(self.keyword())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResult {
    pub source: String,
    pub webinars: Vec<Candidate>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// New webinars stored from this source.
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeOutcome {
    pub success: bool,
    pub results: Vec<SourceResult>,
    pub total_new_webinars: usize,
    pub message: String,
}

impl ScrapeOutcome {
    pub fn cached(&self) -> bool {
        self.results.is_empty() && self.message.starts_with("Cached results")
    }
}

#[derive(Debug, Default)]
struct PersistStats {
    added: usize,
    updated: usize,
    errors: Vec<String>,
}

pub struct Orchestrator {
    adapters: Vec<Arc<dyn SourceAdapter>>,
    store: Arc<dyn WebinarStore>,
    analytics: Arc<ScraperAnalytics>,
    cache_window: Duration,
}

impl Orchestrator {
    pub fn new(
        adapters: Vec<Arc<dyn SourceAdapter>>,
        store: Arc<dyn WebinarStore>,
        analytics: Arc<ScraperAnalytics>,
        cache_window_mins: i64,
    ) -> Self {
        Self {
            adapters,
            store,
            analytics,
            cache_window: Duration::minutes(cache_window_mins),
        }
    }

    pub fn analytics(&self) -> &Arc<ScraperAnalytics> {
        &self.analytics
    }

    pub async fn scrape_all(&self, req: &ScrapeRequest) -> ScrapeOutcome {
        let scope = req.scope().to_string();

        if !req.force && self.recently_scraped(&scope) {
            info!("Skipping scrape for {} - cached results available", scope);
            return ScrapeOutcome {
                success: true,
                results: Vec::new(),
                total_new_webinars: 0,
                message: format!("Cached results returned for {} (scraped within last hour)", scope),
            };
        }

        let selected: Vec<&Arc<dyn SourceAdapter>> = match &req.sources {
            Some(names) => self
                .adapters
                .iter()
                .filter(|a| names.iter().any(|n| a.name().eq_ignore_ascii_case(n.trim())))
                .collect(),
            None => self.adapters.iter().collect(),
        };

        info!(
            "=== Scrape: scope={} trigger={} force={} ({} sources) ===",
            scope,
            req.trigger,
            req.force,
            selected.len()
        );

        let mut results = Vec::with_capacity(selected.len());
        let mut total_new = 0usize;

        for adapter in selected {
            let result = self.run_adapter(adapter.as_ref(), req, &scope).await;
            total_new += result.count;
            results.push(result);
        }

        let message = format!(
            "Scraped {} new webinars from {} sources",
            total_new,
            results.len()
        );
        info!("=== Done: {} ===", message);

        ScrapeOutcome {
            success: true,
            results,
            total_new_webinars: total_new,
            message,
        }
    }

    fn recently_scraped(&self, scope: &str) -> bool {
        let since = Utc::now() - self.cache_window;
        match self.store.has_recent_success(scope, since) {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Scrape cache check failed for {}: {:#}", scope, e);
                false
            }
        }
    }

    async fn run_adapter(&self, adapter: &dyn SourceAdapter, req: &ScrapeRequest, scope: &str) -> SourceResult {
        let name = adapter.name().to_string();
        let run_id = self.analytics.start_run(&name, req.category(), req.keyword());
        let _t = Timer::start(format!("{} scrape", name));

        match adapter.fetch_candidates(req.filter()).await {
            Ok(candidates) => {
                let now = Utc::now();
                let valid = valid_candidates(&name, candidates, now);
                let stats = self.persist(&valid, now);

                self.append_log(
                    &name,
                    req.trigger,
                    scope,
                    stats.added,
                    LogStatus::Success,
                    Some(format!(
                        "Successfully scraped {} webinars, {} new",
                        valid.len(),
                        stats.added
                    )),
                );
                info!("{}: {} valid, {} new, {} updated", name, valid.len(), stats.added, stats.updated);
                self.analytics
                    .record_result(&run_id, valid.len(), stats.added, stats.updated, stats.errors);

                SourceResult {
                    source: name,
                    count: stats.added,
                    webinars: valid,
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                let msg = format!("{:#}", e);
                error!("Error in {} scraper: {}", name, msg);

                self.append_log(&name, req.trigger, scope, 0, LogStatus::Error, Some(msg.clone()));
                self.analytics.record_result(&run_id, 0, 0, 0, vec![msg.clone()]);

                SourceResult {
                    source: name,
                    webinars: Vec::new(),
                    success: false,
                    error: Some(msg),
                    count: 0,
                }
            }
        }
    }

    /// Insert unseen candidates; bump `last_fetched` on known ones. A storage
    /// error skips that candidate only.
    fn persist(&self, candidates: &[Candidate], now: DateTime<Utc>) -> PersistStats {
        let mut stats = PersistStats::default();

        for c in candidates {
            let record = to_record(c, now);

            let outcome = match self.store.find_existing(&record.id, &record.checksum) {
                Ok(Some(existing)) => self.store.touch_webinar(&existing, now).map(|_| false),
                Ok(None) => self.store.insert_webinar(&record).map(|_| true),
                Err(e) => Err(e),
            };

            match outcome {
                Ok(true) => {
                    debug!("new webinar {}", record.id);
                    stats.added += 1;
                }
                Ok(false) => stats.updated += 1,
                Err(e) => {
                    warn!("Skipping webinar {}: {:#}", record.id, e);
                    stats.errors.push(format!("{}: {:#}", record.id, e));
                }
            }
        }

        stats
    }

    fn append_log(
        &self,
        source: &str,
        trigger: TriggerType,
        scope: &str,
        new_count: usize,
        status: LogStatus,
        message: Option<String>,
    ) {
        let entry = ScrapeLogEntry {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            trigger,
            scope: scope.to_string(),
            new_count,
            status,
            message,
            run_at: Utc::now(),
        };
        if let Err(e) = self.store.append_scrape_log(&entry) {
            error!("Error logging scrape run for {}: {:#}", source, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::WebinarRecord;
    use crate::scraper::{build_adapters, CannedSource, Platform};
    use crate::storage::Repository;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps a real canned source and counts invocations.
    struct Counting {
        inner: CannedSource,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SourceAdapter for Counting {
        fn name(&self) -> &str {
            self.inner.name()
        }
        async fn fetch_candidates(&self, scope: Option<&str>) -> Result<Vec<Candidate>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_candidates(scope).await
        }
    }

    struct Broken;

    #[async_trait]
    impl SourceAdapter for Broken {
        fn name(&self) -> &str {
            "Broken"
        }
        async fn fetch_candidates(&self, _scope: Option<&str>) -> Result<Vec<Candidate>> {
            anyhow::bail!("upstream exploded")
        }
    }

    /// Refuses to insert webinars whose id contains `poison`.
    struct Flaky {
        inner: Arc<Repository>,
        poison: &'static str,
    }

    impl WebinarStore for Flaky {
        fn find_existing(&self, id: &str, checksum: &str) -> Result<Option<String>> {
            self.inner.find_existing(id, checksum)
        }
        fn insert_webinar(&self, w: &WebinarRecord) -> Result<()> {
            if w.id.contains(self.poison) {
                anyhow::bail!("disk full");
            }
            self.inner.insert_webinar(w)
        }
        fn touch_webinar(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
            self.inner.touch_webinar(id, at)
        }
        fn append_scrape_log(&self, e: &ScrapeLogEntry) -> Result<()> {
            self.inner.append_scrape_log(e)
        }
        fn has_recent_success(&self, scope: &str, since: DateTime<Utc>) -> Result<bool> {
            self.inner.has_recent_success(scope, since)
        }
    }

    fn repo() -> Arc<Repository> {
        let repo = Repository::open_in_memory().unwrap();
        repo.run_migrations().unwrap();
        Arc::new(repo)
    }

    fn counting_adapters() -> Vec<Arc<Counting>> {
        let cfg = AppConfig::for_tests().scraper;
        Platform::ALL
            .into_iter()
            .map(|p| Arc::new(Counting { inner: CannedSource::new(p, &cfg), calls: AtomicUsize::new(0) }))
            .collect()
    }

    fn orchestrator(adapters: Vec<Arc<dyn SourceAdapter>>, store: Arc<dyn WebinarStore>) -> Orchestrator {
        Orchestrator::new(adapters, store, Arc::new(ScraperAnalytics::new()), 60)
    }

    fn as_dyn(adapters: &[Arc<Counting>]) -> Vec<Arc<dyn SourceAdapter>> {
        adapters.iter().map(|a| a.clone() as Arc<dyn SourceAdapter>).collect()
    }

    fn total_calls(adapters: &[Arc<Counting>]) -> usize {
        adapters.iter().map(|a| a.calls.load(Ordering::SeqCst)).sum()
    }

    fn category(c: &str, force: bool) -> ScrapeRequest {
        ScrapeRequest {
            category: Some(c.into()),
            force,
            ..ScrapeRequest::new(TriggerType::UserAction)
        }
    }

    #[test]
    fn test_scope_resolution() {
        let mut req = ScrapeRequest::new(TriggerType::Manual);
        assert_eq!(req.scope(), "all");
        assert_eq!(req.filter(), None);

        req.keyword = Some("python".into());
        assert_eq!(req.scope(), "python");

        req.category = Some("Technology".into());
        assert_eq!(req.scope(), "Technology");

        req.category = Some("  ".into());
        assert_eq!(req.scope(), "python");
    }

    #[tokio::test]
    async fn test_technology_scenario() {
        let repo = repo();
        let adapters = counting_adapters();
        let orch = orchestrator(as_dyn(&adapters), repo.clone());

        let first = orch.scrape_all(&category("Technology", false)).await;
        assert!(first.success);
        assert_eq!(first.total_new_webinars, 6);
        assert_eq!(first.results.len(), 7);
        assert_eq!(total_calls(&adapters), 7);
        assert_eq!(repo.webinar_count().unwrap(), 6);

        let second = orch.scrape_all(&category("Technology", false)).await;
        assert!(second.success);
        assert!(second.cached());
        assert_eq!(second.total_new_webinars, 0);
        assert!(second.message.contains("Cached results"));
        assert_eq!(total_calls(&adapters), 7, "cached call must not invoke adapters");

        let before = repo.list_webinars().unwrap();

        let forced = orch.scrape_all(&category("Technology", true)).await;
        assert_eq!(forced.total_new_webinars, 0);
        assert_eq!(forced.results.iter().map(|r| r.webinars.len()).sum::<usize>(), 6);
        assert_eq!(total_calls(&adapters), 14);
        assert!(adapters.iter().all(|a| a.calls.load(Ordering::SeqCst) == 2));
        assert_eq!(repo.webinar_count().unwrap(), 6);

        for w in repo.list_webinars().unwrap() {
            let old = before.iter().find(|b| b.id == w.id).unwrap();
            assert!(w.last_fetched > old.last_fetched, "{} not refreshed", w.id);
        }
    }

    #[tokio::test]
    async fn test_rerun_updates_without_new_records() {
        let repo = repo();
        let orch = orchestrator(build_adapters(&AppConfig::for_tests().scraper), repo.clone());

        let req = ScrapeRequest { force: true, ..ScrapeRequest::new(TriggerType::Daily) };
        let first = orch.scrape_all(&req).await;
        let stored = repo.webinar_count().unwrap() as usize;
        assert_eq!(first.total_new_webinars, stored);
        assert_eq!(stored, 22);

        let before = repo.list_webinars().unwrap();
        let again = orch.scrape_all(&req).await;
        assert_eq!(again.total_new_webinars, 0);
        assert!(again.results.iter().all(|r| r.success && r.count == 0));

        let after = repo.list_webinars().unwrap();
        for w in &after {
            let old = before.iter().find(|b| b.id == w.id).unwrap();
            assert!(w.last_fetched > old.last_fetched, "{} not refreshed", w.id);
            assert_eq!(w.created_at, old.created_at);
        }
    }

    #[tokio::test]
    async fn test_failing_adapter_is_isolated() {
        let repo = repo();
        let good = counting_adapters();
        let mut adapters = as_dyn(&good);
        adapters.insert(2, Arc::new(Broken));
        let orch = orchestrator(adapters, repo.clone());

        let out = orch.scrape_all(&category("Technology", true)).await;
        assert!(out.success);
        assert_eq!(out.results.len(), 8);
        assert_eq!(out.total_new_webinars, 6);

        let failed: Vec<_> = out.results.iter().filter(|r| !r.success).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].source, "Broken");
        assert!(failed[0].error.as_deref().is_some_and(|e| e.contains("upstream exploded")));
        assert_eq!(failed[0].count, 0);

        let logs = repo.scrape_logs_for("Technology").unwrap();
        assert_eq!(logs.len(), 8);
        assert_eq!(logs.iter().filter(|l| l.status == LogStatus::Error).count(), 1);
        assert_eq!(orch.analytics().performance_report().error_summary.len(), 1);
    }

    #[tokio::test]
    async fn test_error_only_logs_do_not_count_as_cache_hit() {
        let repo = repo();
        let orch = orchestrator(vec![Arc::new(Broken)], repo.clone());

        orch.scrape_all(&category("Design", false)).await;
        let second = orch.scrape_all(&category("Design", false)).await;
        assert!(!second.cached());
        assert_eq!(second.results.len(), 1);
    }

    #[tokio::test]
    async fn test_cache_is_keyed_by_exact_scope() {
        let repo = repo();
        let adapters = counting_adapters();
        let orch = orchestrator(as_dyn(&adapters), repo.clone());

        orch.scrape_all(&category("Technology", false)).await;
        let other = ScrapeRequest {
            keyword: Some("python".into()),
            ..ScrapeRequest::new(TriggerType::UserAction)
        };
        let out = orch.scrape_all(&other).await;
        assert!(!out.cached());
        assert_eq!(total_calls(&adapters), 14);
    }

    #[tokio::test]
    async fn test_source_subset() {
        let repo = repo();
        let adapters = counting_adapters();
        let orch = orchestrator(as_dyn(&adapters), repo.clone());

        let req = ScrapeRequest {
            sources: Some(vec!["meetup".into(), "DEVPOST".into()]),
            force: true,
            ..ScrapeRequest::new(TriggerType::Manual)
        };
        let out = orch.scrape_all(&req).await;
        let names: Vec<_> = out.results.iter().map(|r| r.source.as_str()).collect();
        assert_eq!(names, vec!["Meetup", "Devpost"]);
        assert_eq!(total_calls(&adapters), 2);
        assert_eq!(out.total_new_webinars, 6);
    }

    #[tokio::test]
    async fn test_storage_failure_skips_record() {
        let repo = repo();
        let store = Arc::new(Flaky { inner: repo.clone(), poison: "techmasters" });
        let orch = orchestrator(build_adapters(&AppConfig::for_tests().scraper), store);

        let out = orch.scrape_all(&category("Technology", true)).await;
        assert!(out.success);
        assert_eq!(out.total_new_webinars, 5);
        let eventbrite = out.results.iter().find(|r| r.source == "Eventbrite").unwrap();
        assert!(eventbrite.success);
        assert_eq!(eventbrite.count, 0);
        assert_eq!(repo.webinar_count().unwrap(), 5);
    }
}

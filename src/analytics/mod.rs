//! In-memory metrics over recent adapter runs.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
use uuid::Uuid;

const MAX_RUNS: usize = 100;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetrics {
    pub run_id: String,
    pub scraper: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub duration_ms: Option<i64>,
    pub found: usize,
    pub added: usize,
    pub updated: usize,
    pub errors: Vec<String>,
    pub success: bool,
    pub category: Option<String>,
    pub keyword: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScraperScore {
    pub name: String,
    pub success_rate: f64,
    pub avg_webinars: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ErrorCount {
    pub error: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPerformance {
    pub category: String,
    pub webinars_found: usize,
    pub scrapers: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub total_runs: usize,
    pub success_rate: f64,
    pub average_duration_ms: i64,
    pub total_webinars_discovered: usize,
    pub top_performing_scrapers: Vec<ScraperScore>,
    pub error_summary: Vec<ErrorCount>,
    pub category_performance: Vec<CategoryPerformance>,
}

#[derive(Default)]
pub struct ScraperAnalytics {
    runs: Mutex<Vec<RunMetrics>>,
}

impl ScraperAnalytics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_run(&self, scraper: &str, category: Option<&str>, keyword: Option<&str>) -> String {
        let run_id = format!("{}-{}", scraper.to_lowercase(), Uuid::new_v4());
        let mut runs = self.runs.lock();
        runs.push(RunMetrics {
            run_id: run_id.clone(),
            scraper: scraper.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            duration_ms: None,
            found: 0,
            added: 0,
            updated: 0,
            errors: Vec::new(),
            success: false,
            category: category.map(str::to_string),
            keyword: keyword.map(str::to_string),
        });
        if runs.len() > MAX_RUNS {
            let excess = runs.len() - MAX_RUNS;
            runs.drain(..excess);
        }
        run_id
    }

    pub fn record_result(
        &self,
        run_id: &str,
        found: usize,
        added: usize,
        updated: usize,
        errors: Vec<String>,
    ) {
        let mut runs = self.runs.lock();
        let Some(m) = runs.iter_mut().find(|m| m.run_id == run_id) else {
            warn!("Analytics: unknown run {}", run_id);
            return;
        };
        let now = Utc::now();
        m.finished_at = Some(now);
        m.duration_ms = Some((now - m.started_at).num_milliseconds());
        m.found = found;
        m.added = added;
        m.updated = updated;
        m.success = errors.is_empty();
        m.errors = errors;
    }

    pub fn runs(&self) -> Vec<RunMetrics> {
        self.runs.lock().clone()
    }

    pub fn performance_report(&self) -> PerformanceReport {
        let runs = self.runs.lock();

        if runs.is_empty() {
            return PerformanceReport {
                total_runs: 0,
                success_rate: 0.0,
                average_duration_ms: 0,
                total_webinars_discovered: 0,
                top_performing_scrapers: Vec::new(),
                error_summary: Vec::new(),
                category_performance: Vec::new(),
            };
        }

        let total_runs = runs.len();
        let successes = runs.iter().filter(|m| m.success).count();
        let success_rate = successes as f64 / total_runs as f64 * 100.0;

        let durations: Vec<i64> = runs.iter().filter_map(|m| m.duration_ms).collect();
        let average_duration_ms = if durations.is_empty() {
            0
        } else {
            durations.iter().sum::<i64>() / durations.len() as i64
        };

        let total_webinars_discovered = runs.iter().map(|m| m.found).sum();

        // name → (runs, successes, found)
        let mut per_scraper: HashMap<&str, (usize, usize, usize)> = HashMap::new();
        for m in runs.iter() {
            let e = per_scraper.entry(m.scraper.as_str()).or_default();
            e.0 += 1;
            if m.success {
                e.1 += 1;
            }
            e.2 += m.found;
        }
        let mut top_performing_scrapers: Vec<ScraperScore> = per_scraper
            .into_iter()
            .map(|(name, (n, ok, found))| ScraperScore {
                name: name.to_string(),
                success_rate: ok as f64 / n as f64 * 100.0,
                avg_webinars: found as f64 / n as f64,
            })
            .collect();
        top_performing_scrapers.sort_by(|a, b| {
            b.success_rate
                .total_cmp(&a.success_rate)
                .then_with(|| a.name.cmp(&b.name))
        });
        top_performing_scrapers.truncate(10);

        let mut error_counts: HashMap<&str, usize> = HashMap::new();
        for e in runs.iter().flat_map(|m| m.errors.iter()) {
            *error_counts.entry(e.as_str()).or_default() += 1;
        }
        let mut error_summary: Vec<ErrorCount> = error_counts
            .into_iter()
            .map(|(error, count)| ErrorCount { error: error.to_string(), count })
            .collect();
        error_summary.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.error.cmp(&b.error)));
        error_summary.truncate(10);

        let mut per_category: HashMap<&str, (usize, HashSet<&str>)> = HashMap::new();
        for m in runs.iter() {
            if let Some(cat) = m.category.as_deref() {
                let e = per_category.entry(cat).or_default();
                e.0 += m.found;
                e.1.insert(m.scraper.as_str());
            }
        }
        let mut category_performance: Vec<CategoryPerformance> = per_category
            .into_iter()
            .map(|(category, (found, scrapers))| CategoryPerformance {
                category: category.to_string(),
                webinars_found: found,
                scrapers: scrapers.len(),
            })
            .collect();
        category_performance.sort_by(|a, b| {
            b.webinars_found
                .cmp(&a.webinars_found)
                .then_with(|| a.category.cmp(&b.category))
        });

        PerformanceReport {
            total_runs,
            success_rate,
            average_duration_ms,
            total_webinars_discovered,
            top_performing_scrapers,
            error_summary,
            category_performance,
        }
    }

    pub fn log_health(&self) {
        let report = self.performance_report();
        info!(
            "Scraper health: {} runs, {:.1}% success, avg {}ms, {} webinars found",
            report.total_runs,
            report.success_rate,
            report.average_duration_ms,
            report.total_webinars_discovered
        );
        for e in report.error_summary.iter().take(3) {
            warn!("  recent error: {} ({}x)", e.error, e.count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_report() {
        let a = ScraperAnalytics::new();
        let r = a.performance_report();
        assert_eq!(r.total_runs, 0);
        assert!(r.top_performing_scrapers.is_empty());
    }

    #[test]
    fn test_report_aggregates_runs() {
        let a = ScraperAnalytics::new();
        let r1 = a.start_run("Meetup", Some("Technology"), None);
        a.record_result(&r1, 3, 2, 1, vec![]);
        let r2 = a.start_run("Devpost", Some("Technology"), None);
        a.record_result(&r2, 0, 0, 0, vec!["boom".into()]);
        let r3 = a.start_run("Devpost", None, Some("python"));
        a.record_result(&r3, 1, 1, 0, vec![]);

        let r = a.performance_report();
        assert_eq!(r.total_runs, 3);
        assert!((r.success_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(r.total_webinars_discovered, 4);

        assert_eq!(r.top_performing_scrapers[0].name, "Meetup");
        assert_eq!(r.top_performing_scrapers[1].success_rate, 50.0);

        assert_eq!(r.error_summary, vec![ErrorCount { error: "boom".into(), count: 1 }]);

        assert_eq!(r.category_performance.len(), 1);
        assert_eq!(r.category_performance[0].webinars_found, 3);
        assert_eq!(r.category_performance[0].scrapers, 2);
    }

    #[test]
    fn test_keeps_only_recent_runs() {
        let a = ScraperAnalytics::new();
        for _ in 0..(MAX_RUNS + 5) {
            a.start_run("Luma", None, None);
        }
        assert_eq!(a.runs().len(), MAX_RUNS);
    }
}


use crate::models::{Candidate, WebinarRecord};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tracing::debug;

// ── Validity ──────────────────────────────────────────────────────────────────

/// A candidate is kept only with a title, host and registration URL, and a
/// start strictly after `now`.
pub fn is_valid(candidate: &Candidate, now: DateTime<Utc>) -> bool {
    !candidate.title.trim().is_empty()
        && !candidate.host.trim().is_empty()
        && !candidate.registration_url.trim().is_empty()
        && candidate.scheduled_at > now
}

pub fn valid_candidates(source: &str, candidates: Vec<Candidate>, now: DateTime<Utc>) -> Vec<Candidate> {
    let total = candidates.len();
    let valid: Vec<Candidate> = candidates
        .into_iter()
        .filter(|c| is_valid(c, now))
        .collect();
    debug!("{}: {} candidates, {} valid", source, total, valid.len());
    valid
}

// ── Scope matching ────────────────────────────────────────────────────────────

/// Case-insensitive substring match of `scope` against tags, category or title.
pub fn matches_scope(candidate: &Candidate, scope: &str) -> bool {
    let needle = scope.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    candidate.title.to_lowercase().contains(&needle)
        || candidate.category.to_lowercase().contains(&needle)
        || candidate
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(&needle))
}

// ── Identity ──────────────────────────────────────────────────────────────────

/// Hex SHA-256 over `title|date|platform|source`.
pub fn checksum(title: &str, date: &str, platform: &str, source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{}|{}|{}|{}", title, date, platform, source).as_bytes());
    hex::encode(hasher.finalize())
}

/// Lowercase, strip everything but `[a-z0-9]` and whitespace, join words with
/// `-`, cap at `max` chars.
pub fn slug(s: &str, max: usize) -> String {
    let cleaned: String = s
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();
    cleaned
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .chars()
        .take(max)
        .collect()
}

/// Stable identifier: `<host slug, 20>-<title slug, 50>`.
/// "TechMasters India" + "Free Python Workshop" → "techmasters-india-free-python-workshop"
pub fn webinar_id(title: &str, host: &str) -> String {
    format!("{}-{}", slug(host, 20), slug(title, 50))
}

// ── Conversion ────────────────────────────────────────────────────────────────

pub fn to_record(c: &Candidate, now: DateTime<Utc>) -> WebinarRecord {
    let date = c.scheduled_at.format("%Y-%m-%d").to_string();
    // The source platform fills both the platform and source fields.
    let checksum = checksum(&c.title, &date, &c.source_platform, &c.source_platform);

    WebinarRecord {
        id: webinar_id(&c.title, &c.host),
        title: c.title.clone(),
        host: c.host.clone(),
        platform: c.source_platform.clone(),
        scheduled_at: c.scheduled_at,
        duration_mins: c.duration_mins,
        category: c.category.clone(),
        description: c.description.clone(),
        tags: c.tags.clone(),
        registration_url: c.registration_url.clone(),
        meeting_url: c.meeting_url.clone(),
        image_url: c.image_url.clone(),
        source: c.source_platform.clone(),
        checksum,
        last_fetched: now,
        created_at: now,
        updated_at: now,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn candidate(now: DateTime<Utc>) -> Candidate {
        Candidate {
            title: "Free Python Workshop: Build REST APIs with FastAPI".into(),
            description: "APIs".into(),
            host: "TechMasters India".into(),
            scheduled_at: now + Duration::days(2),
            duration_mins: 120,
            category: "Technology".into(),
            tags: vec!["Python".into(), "FastAPI".into()],
            registration_url: "https://eventbrite.com/e/python-fastapi-workshop".into(),
            meeting_url: None,
            image_url: None,
            source_platform: "Eventbrite".into(),
        }
    }

    #[test]
    fn test_is_valid_requires_fields_and_future_start() {
        let now = Utc::now();
        assert!(is_valid(&candidate(now), now));

        let mut c = candidate(now);
        c.title = "   ".into();
        assert!(!is_valid(&c, now));

        let mut c = candidate(now);
        c.host.clear();
        assert!(!is_valid(&c, now));

        let mut c = candidate(now);
        c.registration_url.clear();
        assert!(!is_valid(&c, now));

        let mut c = candidate(now);
        c.scheduled_at = now;
        assert!(!is_valid(&c, now), "start equal to now is not in the future");

        c.scheduled_at = now - Duration::minutes(1);
        assert!(!is_valid(&c, now));
    }

    #[test]
    fn test_matches_scope() {
        let c = candidate(Utc::now());
        assert!(matches_scope(&c, "technology"));
        assert!(matches_scope(&c, "FASTAPI"));
        assert!(matches_scope(&c, "rest apis"));
        assert!(matches_scope(&c, "pyth"));
        assert!(!matches_scope(&c, "marketing"));
    }

    #[test]
    fn test_checksum_is_deterministic() {
        let a = checksum("Title", "2026-10-16", "Eventbrite", "Eventbrite");
        let b = checksum("Title", "2026-10-16", "Eventbrite", "Eventbrite");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_checksum_changes_with_each_input() {
        let base = checksum("Title", "2026-10-16", "Eventbrite", "Eventbrite");
        assert_ne!(base, checksum("Title 2", "2026-10-16", "Eventbrite", "Eventbrite"));
        assert_ne!(base, checksum("Title", "2026-10-17", "Eventbrite", "Eventbrite"));
        assert_ne!(base, checksum("Title", "2026-10-16", "Meetup", "Eventbrite"));
        assert_ne!(base, checksum("Title", "2026-10-16", "Eventbrite", "Meetup"));
    }

    #[test]
    fn test_webinar_id() {
        assert_eq!(
            webinar_id("Free Python Workshop: Build REST APIs", "TechMasters India"),
            "techmasters-india-free-python-workshop-build-rest-apis"
        );
        assert_eq!(slug("AI/ML Enthusiasts Delhi", 20), "aiml-enthusiasts-del");
    }

    #[test]
    fn test_to_record_uses_platform_for_source() {
        let now = Utc::now();
        let c = candidate(now);
        let r = to_record(&c, now);
        assert_eq!(r.platform, "Eventbrite");
        assert_eq!(r.source, "Eventbrite");
        let date = c.scheduled_at.format("%Y-%m-%d").to_string();
        assert_eq!(r.checksum, checksum(&c.title, &date, "Eventbrite", "Eventbrite"));
        assert_eq!(r.last_fetched, now);
    }
}

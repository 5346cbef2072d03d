//! SEO content: listicles and how-to guides built from the catalog's
//! trending categories, plus the static-site build hook.

use crate::config::ContentConfig;
use crate::models::{BlogPost, Guide, WebinarRecord};
use crate::storage::Repository;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use uuid::Uuid;

const RECENT_WEBINARS: usize = 50;
const FALLBACK_CATEGORY: &str = "Technology";
const GUIDE_TOPICS: [&str; 2] = ["attending-webinars", "career-development"];

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentRun {
    pub blogs: Vec<BlogPost>,
    pub guides: Vec<Guide>,
    /// Pieces generated and stored; 0 when the run failed part way.
    pub total: usize,
}

/// Lowercase, keep `[a-z0-9 ]`, collapse whitespace runs to `-`, cap at 60 chars.
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace())
        .collect();

    let mut out = String::with_capacity(kept.len());
    let mut in_space = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out.chars().take(60).collect()
}

/// Category counts, most frequent first (ties by name), top 10.
pub fn trending_categories(webinars: &[WebinarRecord]) -> Vec<CategoryCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for w in webinars.iter().filter(|w| !w.category.is_empty()) {
        *counts.entry(w.category.as_str()).or_default() += 1;
    }
    let mut out: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(category, count)| CategoryCount { category: category.to_string(), count })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.category.cmp(&b.category)));
    out.truncate(10);
    out
}

pub fn listicle(trending: &[CategoryCount], now: DateTime<Utc>) -> BlogPost {
    let top = trending
        .first()
        .map(|c| c.category.as_str())
        .unwrap_or(FALLBACK_CATEGORY);
    let lower = top.to_lowercase();
    let title = format!(
        "Top Free {} Webinars This Week - Updated {}",
        top,
        now.format("%-m/%-d/%Y")
    );

    let mut content = format!(
        "# {}\n\nThe best free {} webinars happening this week, all free to attend.\n\n## This Week's Top Picks\n\n",
        title, lower
    );
    for (i, c) in trending.iter().take(5).enumerate() {
        content.push_str(&format!("### {}. {} Webinars ({} events)\n\n", i + 1, c.category, c.count));
    }
    let total: usize = trending.iter().map(|c| c.count).sum();
    content.push_str(&format!(
        "---\n\n*Last updated: {} | Found {} free webinars*\n",
        now.format("%-m/%-d/%Y"),
        total
    ));

    BlogPost {
        id: Uuid::new_v4().to_string(),
        slug: slugify(&title),
        meta_description: format!(
            "Discover the best free {} webinars this week. Updated daily with new opportunities.",
            lower
        ),
        keywords: vec![
            "free webinars".to_string(),
            format!("free {} webinars", lower),
            "online workshops".to_string(),
            "professional development".to_string(),
        ],
        title,
        content,
        created_at: now,
    }
}

/// Unknown topics fall back to `attending-webinars`.
pub fn how_to_guide(topic: &str, now: DateTime<Utc>) -> Guide {
    let (topic, title, body, keywords): (&str, &str, &str, &[&str]) = match topic {
        "career-development" => (
            "career-development",
            "Using Free Webinars for Career Advancement: A Strategic Approach",
            "Pick sessions that close a skill gap, network before and after the event, \
             and apply what you learn within a week.",
            &["career development webinars", "professional growth", "skill development"],
        ),
        _ => (
            "attending-webinars",
            "Complete Guide to Attending Free Webinars",
            "Register early, test your setup, prepare two or three questions, \
             and follow up with the speaker afterwards.",
            &["how to attend webinars", "free webinar guide", "webinar best practices"],
        ),
    };

    Guide {
        id: Uuid::new_v4().to_string(),
        topic: topic.to_string(),
        title: title.to_string(),
        content: format!("# {}\n\n{}\n", title, body),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        created_at: now,
    }
}

pub struct ContentGenerator {
    repo: Arc<Repository>,
    config: ContentConfig,
    http: reqwest::Client,
}

impl ContentGenerator {
    pub fn new(repo: Arc<Repository>, config: ContentConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { repo, config, http })
    }

    pub fn generate_daily_content(&self) -> ContentRun {
        info!("Generating daily SEO content…");
        let mut run = ContentRun::default();
        match self.generate_into(&mut run) {
            Ok(()) => {
                run.total = run.blogs.len() + run.guides.len();
                info!("Generated {} blog posts and {} guides", run.blogs.len(), run.guides.len());
            }
            Err(e) => {
                error!("Error generating daily content: {:#}", e);
                run.total = 0;
            }
        }
        run
    }

    fn generate_into(&self, run: &mut ContentRun) -> Result<()> {
        let recent = self
            .repo
            .recent_webinars(RECENT_WEBINARS)
            .context("load recent webinars")?;
        let trending = trending_categories(&recent);
        let now = Utc::now();

        for _ in 0..self.config.listicles_per_run {
            let post = listicle(&trending, now);
            self.repo.insert_blog_post(&post)?;
            run.blogs.push(post);
        }

        let topic = GUIDE_TOPICS[(rand::random::<u64>() % GUIDE_TOPICS.len() as u64) as usize];
        let guide = how_to_guide(topic, now);
        self.repo.insert_guide(&guide)?;
        run.guides.push(guide);
        Ok(())
    }

    /// Ask the static site host to rebuild. Failures are logged only.
    pub async fn trigger_build_hook(&self) {
        let Some(url) = self.config.build_hook_url.as_deref() else {
            info!("No build hook configured, skipping site rebuild");
            return;
        };

        match self.http.post(url).send().await {
            Ok(resp) if resp.status().is_success() => {
                info!("Build hook triggered ({})", resp.status());
            }
            Ok(resp) => warn!("Build hook returned HTTP {}", resp.status()),
            Err(e) => error!("Build hook request failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::cleaner::to_record;
    use crate::models::Candidate;

    fn webinar(title: &str, category: &str) -> WebinarRecord {
        let now = Utc::now();
        to_record(
            &Candidate {
                title: title.into(),
                description: String::new(),
                host: "Host".into(),
                scheduled_at: now + chrono::Duration::days(1),
                duration_mins: 60,
                category: category.into(),
                tags: vec![],
                registration_url: "https://example.com".into(),
                meeting_url: None,
                image_url: None,
                source_platform: "Meetup".into(),
            },
            now,
        )
    }

    fn repo() -> Arc<Repository> {
        let repo = Repository::open_in_memory().unwrap();
        repo.run_migrations().unwrap();
        Arc::new(repo)
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Top Free AI/ML Webinars -  This Week!"), "top-free-aiml-webinars-this-week");
        let long = "word ".repeat(30);
        assert_eq!(slugify(&long).chars().count(), 60);
    }

    #[test]
    fn test_trending_categories() {
        let ws = vec![
            webinar("a", "Business"),
            webinar("b", "Technology"),
            webinar("c", "Business"),
            webinar("d", ""),
        ];
        let t = trending_categories(&ws);
        assert_eq!(
            t,
            vec![
                CategoryCount { category: "Business".into(), count: 2 },
                CategoryCount { category: "Technology".into(), count: 1 },
            ]
        );
    }

    #[test]
    fn test_listicle_falls_back_to_technology() {
        let post = listicle(&[], Utc::now());
        assert!(post.title.starts_with("Top Free Technology Webinars"));
        assert!(post.slug.starts_with("top-free-technology-webinars"));
        assert!(post.keywords.contains(&"free technology webinars".to_string()));
    }

    #[test]
    fn test_unknown_guide_topic_falls_back() {
        let g = how_to_guide("knitting", Utc::now());
        assert_eq!(g.topic, "attending-webinars");
        assert_eq!(how_to_guide("career-development", Utc::now()).topic, "career-development");
    }

    #[test]
    fn test_generate_daily_content_persists() {
        use crate::storage::WebinarStore;

        let repo = repo();
        repo.insert_webinar(&webinar("Design systems", "Design")).unwrap();
        let generator = ContentGenerator::new(repo.clone(), ContentConfig::default()).unwrap();

        let run = generator.generate_daily_content();
        assert_eq!(run.blogs.len(), 3);
        assert_eq!(run.guides.len(), 1);
        assert_eq!(run.total, 4);
        assert!(run.blogs[0].title.contains("Design"));
        assert_eq!(repo.blog_post_count().unwrap(), 3);
        assert_eq!(repo.guide_count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_build_hook_without_url_is_noop() {
        let generator = ContentGenerator::new(repo(), ContentConfig::default()).unwrap();
        generator.trigger_build_hook().await;
    }
}

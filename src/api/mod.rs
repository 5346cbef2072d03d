pub mod error;
pub mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use tracing::info;

use crate::config::ServerConfig;
use crate::pipeline::Orchestrator;
use crate::scheduler::ScrapeQueue;
use crate::storage::Repository;

pub struct AppState {
    pub repo: Arc<Repository>,
    pub orchestrator: Arc<Orchestrator>,
    /// Read endpoints publish background scrape jobs here.
    pub queue: ScrapeQueue,
    pub server: ServerConfig,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Catalog
        .route("/api/webinars", get(handlers::list_webinars))
        .route("/api/webinars/search", get(handlers::search_webinars))
        .route("/api/webinars/category/{category}", get(handlers::webinars_by_category))
        .route("/api/webinars/{id}", get(handlers::webinar_detail))
        .route("/api/webinars/{id}/registrations", get(handlers::webinar_registrations))
        // Registration / reminders
        .route("/api/webinar-action", post(handlers::webinar_action))
        // Admin
        .route("/api/admin/registrations", get(handlers::admin_registrations))
        .route("/api/admin/analytics", get(handlers::admin_analytics))
        .route("/api/scrape/trigger", post(handlers::trigger_scrape))
        .with_state(state)
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // method + path only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        )
}

pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let addr = format!("{}:{}", state.server.host, state.server.port);
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Webinar hub API listening on http://{}", addr);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::ScraperAnalytics;
    use crate::config::AppConfig;
    use crate::models::{TriggerType, WebinarRecord};
    use crate::pipeline::ScrapeRequest;
    use crate::scheduler::ScrapeJob;
    use crate::scraper::build_adapters;
    use crate::storage::WebinarStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    struct Harness {
        state: Arc<AppState>,
        jobs: mpsc::Receiver<ScrapeJob>,
    }

    fn harness() -> Harness {
        let cfg = AppConfig::for_tests();
        let repo = Repository::open_in_memory().unwrap();
        repo.run_migrations().unwrap();
        let repo = Arc::new(repo);
        let orchestrator = Arc::new(Orchestrator::new(
            build_adapters(&cfg.scraper),
            repo.clone(),
            Arc::new(ScraperAnalytics::new()),
            cfg.scraper.cache_window_mins,
        ));
        let (queue, jobs) = ScrapeQueue::channel(8);
        let state = Arc::new(AppState { repo, orchestrator, queue, server: cfg.server });
        Harness { state, jobs }
    }

    async fn seed(h: &Harness) {
        let req = ScrapeRequest { force: true, ..ScrapeRequest::new(TriggerType::Manual) };
        h.state.orchestrator.scrape_all(&req).await;
    }

    fn find(h: &Harness, host: &str) -> WebinarRecord {
        h.state
            .repo
            .list_webinars()
            .unwrap()
            .into_iter()
            .find(|w| w.host == host)
            .unwrap()
    }

    async fn call(h: &Harness, req: Request<Body>) -> (StatusCode, Value) {
        let resp = router(h.state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get_json(h: &Harness, uri: &str) -> (StatusCode, Value) {
        call(h, Request::builder().uri(uri).body(Body::empty()).unwrap()).await
    }

    async fn post_json(h: &Harness, uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        call(h, req).await
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let resp = router(h.state.clone())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"ok");
    }

    #[tokio::test]
    async fn test_list_publishes_background_job() {
        let mut h = harness();
        let (status, body) = get_json(&h, "/api/webinars").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
        assert_eq!(h.jobs.try_recv().unwrap(), ScrapeJob::default());
    }

    #[tokio::test]
    async fn test_list_serves_camel_case() {
        let h = harness();
        seed(&h).await;
        let (_, body) = get_json(&h, "/api/webinars").await;
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 22);
        assert!(list[0].get("registrationUrl").is_some());
        assert!(list[0].get("lastFetched").is_some());
    }

    #[tokio::test]
    async fn test_search() {
        let mut h = harness();
        let (status, body) = get_json(&h, "/api/webinars/search").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Search query required");

        let (status, _) = get_json(&h, "/api/webinars/search?q=%20%20").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        seed(&h).await;
        let (status, body) = get_json(&h, "/api/webinars/search?q=FASTAPI").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(
            h.jobs.try_recv().unwrap(),
            ScrapeJob { category: None, keyword: Some("FASTAPI".into()) }
        );
    }

    #[tokio::test]
    async fn test_category_is_case_insensitive() {
        let mut h = harness();
        seed(&h).await;
        let (status, body) = get_json(&h, "/api/webinars/category/healthcare").await;
        assert_eq!(status, StatusCode::OK);
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["category"], "Healthcare");
        assert_eq!(h.jobs.try_recv().unwrap().category.as_deref(), Some("healthcare"));
    }

    #[tokio::test]
    async fn test_detail() {
        let mut h = harness();
        let (status, body) = get_json(&h, "/api/webinars/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Webinar not found");
        assert!(h.jobs.try_recv().is_err());

        seed(&h).await;
        let w = find(&h, "TechMasters India");
        let (status, body) = get_json(&h, &format!("/api/webinars/{}", w.id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], w.id.as_str());
        assert_eq!(h.jobs.try_recv().unwrap().category.as_deref(), Some("Technology"));
    }

    #[tokio::test]
    async fn test_registration_uses_webinar_meeting_url() {
        let h = harness();
        seed(&h).await;
        let w = find(&h, "TechMasters India");

        let payload = json!({
            "type": "registration",
            "webinarId": w.id,
            "name": "Asha",
            "email": "asha@example.com",
            "whatsappNumber": "+91 90000 00000"
        });
        let (status, body) = post_json(&h, "/api/webinar-action", payload.clone()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["meetUrl"], "https://zoom.us/j/example-python-workshop");
        assert!(body["registrationId"].as_str().is_some_and(|s| !s.is_empty()));

        // second registration reuses the session
        post_json(&h, "/api/webinar-action", payload).await;
        assert!(h.state.repo.meeting_session_for(&w.id).unwrap().is_some());

        let (_, regs) = get_json(&h, &format!("/api/webinars/{}/registrations", w.id)).await;
        let regs = regs.as_array().unwrap();
        assert_eq!(regs.len(), 2);
        assert_eq!(regs[0]["registrationType"], "live_join");
        assert_eq!(regs[0]["whatsappNumber"], "+91 90000 00000");
    }

    #[tokio::test]
    async fn test_registration_falls_back_to_default_meeting_url() {
        let h = harness();
        seed(&h).await;
        let mut w = find(&h, "TechMasters India");
        w.id = "no-meeting-url".into();
        w.checksum = "no-meeting-url".into();
        w.meeting_url = None;
        h.state.repo.insert_webinar(&w).unwrap();

        let (status, body) = post_json(
            &h,
            "/api/webinar-action",
            json!({ "type": "registration", "webinarId": "no-meeting-url", "name": "Ravi", "email": "ravi@example.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["meetUrl"], "https://meet.google.com/pnz-piqy-vvx");
        assert!(h.state.repo.meeting_session_for("no-meeting-url").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reminder() {
        let h = harness();
        seed(&h).await;
        let w = find(&h, "Wellness Coaching Institute");

        let (status, body) = post_json(
            &h,
            "/api/webinar-action",
            json!({ "type": "reminder", "webinarId": w.id, "email": "me@example.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Reminder set successfully");
        assert!(body.get("meetUrl").is_none());

        let regs = h.state.repo.registrations_for(&w.id).unwrap();
        assert_eq!(regs.len(), 1);
        assert_eq!(regs[0].name, "Reminder User");
        assert_eq!(regs[0].id, body["registrationId"].as_str().unwrap());
    }

    #[tokio::test]
    async fn test_action_validation() {
        let h = harness();
        seed(&h).await;
        let w = find(&h, "TechMasters India");

        let (status, body) = post_json(&h, "/api/webinar-action", json!({ "type": "subscribe" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request type");

        let (status, body) = post_json(&h, "/api/webinar-action", json!({ "webinarId": w.id })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request type");

        let (status, body) = post_json(
            &h,
            "/api/webinar-action",
            json!({ "type": "registration", "webinarId": w.id, "name": "A", "email": "not-an-email" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request data");
        assert!(body["details"].as_array().is_some_and(|d| !d.is_empty()));

        let (status, body) = post_json(
            &h,
            "/api/webinar-action",
            json!({ "type": "reminder", "email": "me@example.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request data");

        let (status, body) = post_json(
            &h,
            "/api/webinar-action",
            json!({ "type": "reminder", "webinarId": "missing", "email": "me@example.com" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Webinar not found");

        assert_eq!(h.state.repo.registration_count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_admin_registrations() {
        let h = harness();
        seed(&h).await;
        let w = find(&h, "TechMasters India");
        post_json(
            &h,
            "/api/webinar-action",
            json!({ "type": "reminder", "webinarId": w.id, "email": "me@example.com" }),
        )
        .await;

        let (status, body) = get_json(&h, "/api/admin/registrations").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalRegistrations"], 1);
        let reg = &body["registrations"][0];
        assert_eq!(reg["webinarTitle"], w.title.as_str());
        assert_eq!(reg["webinarHost"], "TechMasters India");
        assert!(reg.get("webinarDate").is_some());
        assert_eq!(reg["email"], "me@example.com");
    }

    #[tokio::test]
    async fn test_trigger_scrape() {
        let h = harness();
        let (status, body) = post_json(&h, "/api/scrape/trigger", json!({ "category": "Technology" })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["totalNewWebinars"], 6);
        assert_eq!(body["results"].as_array().unwrap().len(), 7);

        let (_, body) = post_json(&h, "/api/scrape/trigger", json!({ "category": "Technology" })).await;
        assert_eq!(body["totalNewWebinars"], 0);
        assert!(body["message"].as_str().unwrap().starts_with("Cached results"));

        let (_, body) = post_json(
            &h,
            "/api/scrape/trigger",
            json!({ "category": "Technology", "force": true, "sources": ["devpost"] }),
        )
        .await;
        assert_eq!(body["results"].as_array().unwrap().len(), 1);
        assert_eq!(body["totalNewWebinars"], 0);

        let (status, _) = post_json(&h, "/api/scrape/trigger", json!({ "force": "yes" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let logs = h.state.repo.scrape_logs_for("Technology").unwrap();
        assert!(logs.iter().all(|l| l.trigger == TriggerType::Manual));
    }

    #[tokio::test]
    async fn test_admin_analytics() {
        let h = harness();
        seed(&h).await;
        let (status, body) = get_json(&h, "/api/admin/analytics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totalRuns"], 7);
        assert_eq!(body["totalWebinarsDiscovered"], 22);
    }
}

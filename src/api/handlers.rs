use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, Query, State},
    response::Json,
};
use chrono::{Duration, Utc};
use email_address::EmailAddress;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::error::{ApiError, OrInternal};
use super::AppState;
use crate::analytics::PerformanceReport;
use crate::models::{
    MeetingSession, RegistrationKind, RegistrationWithWebinar, UserRegistration, WebinarRecord,
};
use crate::pipeline::{ScrapeOutcome, ScrapeRequest};
use crate::scheduler::ScrapeJob;

type ApiResult<T> = Result<Json<T>, ApiError>;

// --- Request / response bodies ---

#[derive(Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegistrationRequest {
    webinar_id: String,
    name: String,
    email: String,
    #[serde(default)]
    whatsapp_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReminderRequest {
    webinar_id: String,
    email: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResponse {
    pub success: bool,
    pub meet_url: String,
    pub registration_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderResponse {
    pub success: bool,
    pub message: String,
    pub registration_id: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ActionResponse {
    Registration(RegistrationResponse),
    Reminder(ReminderResponse),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminRegistrations {
    pub total_registrations: usize,
    pub registrations: Vec<RegistrationWithWebinar>,
}

// --- Helpers ---

fn parse<T: serde::de::DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::invalid_data(vec![e.to_string()]))
}

fn check_email(email: &str, problems: &mut Vec<String>) {
    if !EmailAddress::is_valid(email.trim()) {
        problems.push(format!("email: invalid address {:?}", email));
    }
}

fn check_webinar_id(id: &str, problems: &mut Vec<String>) {
    if id.trim().is_empty() {
        problems.push("webinarId: required".to_string());
    }
}

fn finish(problems: Vec<String>) -> Result<(), ApiError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ApiError::invalid_data(problems))
    }
}

fn existing_webinar(state: &AppState, id: &str) -> Result<WebinarRecord, ApiError> {
    state
        .repo
        .get_webinar(id)
        .or_internal("Failed to process request")?
        .ok_or(ApiError::NotFound("Webinar not found"))
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

// --- Handlers ---

pub async fn list_webinars(State(state): State<Arc<AppState>>) -> ApiResult<Vec<WebinarRecord>> {
    state.queue.publish(ScrapeJob::default());
    let webinars = state.repo.list_webinars().or_internal("Failed to fetch webinars")?;
    Ok(Json(webinars))
}

pub async fn search_webinars(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchQuery>,
) -> ApiResult<Vec<WebinarRecord>> {
    let q = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::bad_request("Search query required"))?;

    state.queue.publish(ScrapeJob { category: None, keyword: Some(q.to_string()) });

    let needle = q.to_lowercase();
    let hits: Vec<WebinarRecord> = state
        .repo
        .list_webinars()
        .or_internal("Failed to search webinars")?
        .into_iter()
        .filter(|w| {
            contains_ci(&w.title, &needle)
                || contains_ci(&w.host, &needle)
                || contains_ci(&w.description, &needle)
        })
        .collect();
    Ok(Json(hits))
}

pub async fn webinars_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> ApiResult<Vec<WebinarRecord>> {
    state.queue.publish(ScrapeJob { category: Some(category.clone()), keyword: None });

    let hits: Vec<WebinarRecord> = state
        .repo
        .list_webinars()
        .or_internal("Failed to fetch webinars by category")?
        .into_iter()
        .filter(|w| w.category.eq_ignore_ascii_case(&category))
        .collect();
    Ok(Json(hits))
}

pub async fn webinar_detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<WebinarRecord> {
    let webinar = state
        .repo
        .get_webinar(&id)
        .or_internal("Failed to fetch webinar")?
        .ok_or(ApiError::NotFound("Webinar not found"))?;

    state.queue.publish(ScrapeJob { category: Some(webinar.category.clone()), keyword: None });
    Ok(Json(webinar))
}

pub async fn webinar_action(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<ActionResponse> {
    let Json(body) = body.map_err(|e| ApiError::invalid_data(vec![e.body_text()]))?;

    match body.get("type").and_then(Value::as_str) {
        Some("registration") => {
            let req: RegistrationRequest = parse(body)?;
            register(&state, req).map(|r| Json(ActionResponse::Registration(r)))
        }
        Some("reminder") => {
            let req: ReminderRequest = parse(body)?;
            remind(&state, req).map(|r| Json(ActionResponse::Reminder(r)))
        }
        _ => Err(ApiError::bad_request("Invalid request type")),
    }
}

fn register(state: &AppState, req: RegistrationRequest) -> Result<RegistrationResponse, ApiError> {
    let mut problems = Vec::new();
    check_webinar_id(&req.webinar_id, &mut problems);
    if req.name.trim().is_empty() {
        problems.push("name: required".to_string());
    }
    check_email(&req.email, &mut problems);
    finish(problems)?;

    let webinar = existing_webinar(state, &req.webinar_id)?;
    let now = Utc::now();

    let registration = UserRegistration {
        id: Uuid::new_v4().to_string(),
        webinar_id: webinar.id.clone(),
        name: req.name.trim().to_string(),
        email: req.email.trim().to_string(),
        phone: req.whatsapp_number.filter(|p| !p.trim().is_empty()),
        kind: RegistrationKind::LiveJoin,
        created_at: now,
    };
    state
        .repo
        .create_registration(&registration)
        .or_internal("Failed to process request")?;
    info!("Registration {} for webinar {}", registration.id, webinar.id);

    let mut session = state
        .repo
        .meeting_session_for(&webinar.id)
        .or_internal("Failed to process request")?;

    if session.is_none() {
        if let Some(url) = webinar.meeting_url.as_deref().filter(|u| !u.is_empty()) {
            let created = MeetingSession {
                id: Uuid::new_v4().to_string(),
                webinar_id: webinar.id.clone(),
                meeting_url: url.to_string(),
                session_token: format!("session_{}", now.timestamp_millis()),
                created_at: now,
                expires_at: now + Duration::hours(state.server.meeting_session_hours),
            };
            state
                .repo
                .create_meeting_session(&created)
                .or_internal("Failed to process request")?;
            session = Some(created);
        }
    }

    Ok(RegistrationResponse {
        success: true,
        meet_url: session
            .map(|s| s.meeting_url)
            .unwrap_or_else(|| state.server.default_meeting_url.clone()),
        registration_id: registration.id,
    })
}

fn remind(state: &AppState, req: ReminderRequest) -> Result<ReminderResponse, ApiError> {
    let mut problems = Vec::new();
    check_webinar_id(&req.webinar_id, &mut problems);
    check_email(&req.email, &mut problems);
    finish(problems)?;

    let webinar = existing_webinar(state, &req.webinar_id)?;

    let registration = UserRegistration {
        id: Uuid::new_v4().to_string(),
        webinar_id: webinar.id.clone(),
        name: "Reminder User".to_string(),
        email: req.email.trim().to_string(),
        phone: None,
        kind: RegistrationKind::Reminder,
        created_at: Utc::now(),
    };
    state
        .repo
        .create_registration(&registration)
        .or_internal("Failed to process request")?;
    info!("Reminder {} for webinar {}", registration.id, webinar.id);

    Ok(ReminderResponse {
        success: true,
        message: "Reminder set successfully".to_string(),
        registration_id: registration.id,
    })
}

pub async fn webinar_registrations(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Vec<UserRegistration>> {
    let regs = state
        .repo
        .registrations_for(&id)
        .or_internal("Failed to fetch registrations")?;
    Ok(Json(regs))
}

pub async fn admin_registrations(State(state): State<Arc<AppState>>) -> ApiResult<AdminRegistrations> {
    let registrations = state
        .repo
        .all_registrations_with_webinar()
        .or_internal("Failed to fetch all registrations")?;
    Ok(Json(AdminRegistrations {
        total_registrations: registrations.len(),
        registrations,
    }))
}

pub async fn admin_analytics(State(state): State<Arc<AppState>>) -> Json<PerformanceReport> {
    Json(state.orchestrator.analytics().performance_report())
}

/// Synchronous manual run. An empty body scrapes everything, unforced.
pub async fn trigger_scrape(State(state): State<Arc<AppState>>, body: Bytes) -> ApiResult<ScrapeOutcome> {
    let req: ScrapeRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ScrapeRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| ApiError::invalid_data(vec![e.to_string()]))?
    };

    info!("Manual scrape requested: scope={} force={}", req.scope(), req.force);
    let outcome = state.orchestrator.scrape_all(&req).await;
    Ok(Json(outcome))
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── Scraped candidate ─────────────────────────────────────────────────────────

/// One event as produced by a source adapter, before validation and dedup.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub title: String,
    pub description: String,
    pub host: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_mins: u32,
    pub category: String,
    pub tags: Vec<String>,
    pub registration_url: String,
    pub meeting_url: Option<String>,
    pub image_url: Option<String>,
    pub source_platform: String,
}

// ── Webinar ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebinarRecord {
    pub id: String,
    pub title: String,
    pub host: String,
    pub platform: String,
    pub scheduled_at: DateTime<Utc>,
    pub duration_mins: u32,
    pub category: String,
    pub description: String,
    pub tags: Vec<String>,
    pub registration_url: String,
    pub meeting_url: Option<String>,
    pub image_url: Option<String>,
    pub source: String,
    pub checksum: String,
    pub last_fetched: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ── Scrape log ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Daily,
    #[default]
    Manual,
    UserAction,
}

impl TriggerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerType::Daily => "daily",
            TriggerType::Manual => "manual",
            TriggerType::UserAction => "user_action",
        }
    }
}

impl fmt::Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TriggerType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(TriggerType::Daily),
            "manual" => Ok(TriggerType::Manual),
            "user_action" => Ok(TriggerType::UserAction),
            other => Err(anyhow::anyhow!("unknown trigger type {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Success,
    Error,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogStatus::Success => "success",
            LogStatus::Error => "error",
        }
    }
}

impl FromStr for LogStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(LogStatus::Success),
            "error" => Ok(LogStatus::Error),
            other => Err(anyhow::anyhow!("unknown log status {:?}", other)),
        }
    }
}

/// One row per adapter invocation. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeLogEntry {
    pub id: String,
    pub source: String,
    pub trigger: TriggerType,
    pub scope: String,
    pub new_count: usize,
    pub status: LogStatus,
    pub message: Option<String>,
    pub run_at: DateTime<Utc>,
}

// ── Registrations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationKind {
    LiveJoin,
    Reminder,
}

impl RegistrationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationKind::LiveJoin => "live_join",
            RegistrationKind::Reminder => "reminder",
        }
    }
}

impl FromStr for RegistrationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "live_join" => Ok(RegistrationKind::LiveJoin),
            "reminder" => Ok(RegistrationKind::Reminder),
            other => Err(anyhow::anyhow!("unknown registration kind {:?}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistration {
    pub id: String,
    pub webinar_id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "whatsappNumber")]
    pub phone: Option<String>,
    #[serde(rename = "registrationType")]
    pub kind: RegistrationKind,
    pub created_at: DateTime<Utc>,
}

/// Admin view: a registration joined with the webinar it belongs to.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationWithWebinar {
    #[serde(flatten)]
    pub registration: UserRegistration,
    pub webinar_title: String,
    pub webinar_host: String,
    pub webinar_date: DateTime<Utc>,
}

// ── Meeting sessions ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSession {
    pub id: String,
    pub webinar_id: String,
    pub meeting_url: String,
    pub session_token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// ── SEO content ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    pub keywords: Vec<String>,
    pub meta_description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Guide {
    pub id: String,
    pub topic: String,
    pub title: String,
    pub content: String,
    pub keywords: Vec<String>,
    pub created_at: DateTime<Utc>,
}

use crate::models::{
    BlogPost, Guide, LogStatus, MeetingSession, RegistrationKind, RegistrationWithWebinar,
    ScrapeLogEntry, TriggerType, UserRegistration, WebinarRecord,
};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use duckdb::{params, Connection};
use parking_lot::Mutex;
use std::path::Path;
use tracing::info;

// ── Schema ────────────────────────────────────────────────────────────────────

const DDL: &str = r#"
CREATE TABLE IF NOT EXISTS webinars (
    id                VARCHAR PRIMARY KEY,
    title             VARCHAR NOT NULL,
    host              VARCHAR NOT NULL,
    platform          VARCHAR NOT NULL,
    scheduled_at      TIMESTAMP NOT NULL,
    duration_mins     BIGINT NOT NULL DEFAULT 0,
    category          VARCHAR NOT NULL,
    description       VARCHAR NOT NULL DEFAULT '',
    -- JSON array of strings
    tags              VARCHAR NOT NULL DEFAULT '[]',
    registration_url  VARCHAR NOT NULL,
    meeting_url       VARCHAR,
    image_url         VARCHAR,
    source            VARCHAR NOT NULL,
    checksum          VARCHAR NOT NULL,
    last_fetched      TIMESTAMP NOT NULL,
    created_at        TIMESTAMP NOT NULL,
    updated_at        TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS scrape_logs (
    id          VARCHAR PRIMARY KEY,
    source      VARCHAR NOT NULL,
    trigger_type VARCHAR NOT NULL,
    scope       VARCHAR NOT NULL,
    new_count   BIGINT NOT NULL DEFAULT 0,
    status      VARCHAR NOT NULL,
    message     VARCHAR,
    run_at      TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS webinar_registrations (
    id          VARCHAR PRIMARY KEY,
    webinar_id  VARCHAR NOT NULL,
    name        VARCHAR NOT NULL,
    email       VARCHAR NOT NULL,
    phone       VARCHAR,
    kind        VARCHAR NOT NULL,
    created_at  TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS meeting_sessions (
    id            VARCHAR PRIMARY KEY,
    webinar_id    VARCHAR NOT NULL,
    meeting_url   VARCHAR NOT NULL,
    session_token VARCHAR NOT NULL,
    created_at    TIMESTAMP NOT NULL,
    expires_at    TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS blog_posts (
    id                VARCHAR PRIMARY KEY,
    title             VARCHAR NOT NULL,
    slug              VARCHAR NOT NULL,
    content           VARCHAR NOT NULL,
    keywords          VARCHAR NOT NULL DEFAULT '[]',
    meta_description  VARCHAR NOT NULL DEFAULT '',
    created_at        TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS guides (
    id          VARCHAR PRIMARY KEY,
    topic       VARCHAR NOT NULL,
    title       VARCHAR NOT NULL,
    content     VARCHAR NOT NULL,
    keywords    VARCHAR NOT NULL DEFAULT '[]',
    created_at  TIMESTAMP NOT NULL
);

CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TIMESTAMP NOT NULL
);
"#;

const INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_webinars_checksum  ON webinars (checksum);
CREATE INDEX IF NOT EXISTS idx_logs_scope         ON scrape_logs (scope);
CREATE INDEX IF NOT EXISTS idx_reg_webinar        ON webinar_registrations (webinar_id);
CREATE INDEX IF NOT EXISTS idx_sessions_webinar   ON meeting_sessions (webinar_id);
"#;

const WEBINAR_COLUMNS: &str = "id, title, host, platform, scheduled_at, duration_mins, category, \
     description, tags, registration_url, meeting_url, image_url, source, checksum, \
     last_fetched, created_at, updated_at";

// ── Orchestrator seam ─────────────────────────────────────────────────────────

/// The subset of storage the scrape orchestrator depends on.
pub trait WebinarStore: Send + Sync {
    /// Id of a stored webinar matching either the id or the checksum.
    fn find_existing(&self, id: &str, checksum: &str) -> Result<Option<String>>;
    fn insert_webinar(&self, webinar: &WebinarRecord) -> Result<()>;
    /// Bump `last_fetched` and `updated_at` on a webinar seen again.
    fn touch_webinar(&self, id: &str, at: DateTime<Utc>) -> Result<()>;
    fn append_scrape_log(&self, entry: &ScrapeLogEntry) -> Result<()>;
    /// Whether a successful run for exactly `scope` was logged after `since`.
    fn has_recent_success(&self, scope: &str, since: DateTime<Utc>) -> Result<bool>;
}

// ── Repository ────────────────────────────────────────────────────────────────

pub struct Repository {
    conn: Mutex<Connection>,
}

fn ts(dt: DateTime<Utc>) -> NaiveDateTime {
    dt.naive_utc()
}

fn webinar_from_row(r: &duckdb::Row<'_>) -> duckdb::Result<(WebinarRecord, String)> {
    let tags: String = r.get(8)?;
    let duration: i64 = r.get(5)?;
    let rec = WebinarRecord {
        id: r.get(0)?,
        title: r.get(1)?,
        host: r.get(2)?,
        platform: r.get(3)?,
        scheduled_at: r.get::<_, NaiveDateTime>(4)?.and_utc(),
        duration_mins: duration.max(0) as u32,
        category: r.get(6)?,
        description: r.get(7)?,
        tags: Vec::new(),
        registration_url: r.get(9)?,
        meeting_url: r.get(10)?,
        image_url: r.get(11)?,
        source: r.get(12)?,
        checksum: r.get(13)?,
        last_fetched: r.get::<_, NaiveDateTime>(14)?.and_utc(),
        created_at: r.get::<_, NaiveDateTime>(15)?.and_utc(),
        updated_at: r.get::<_, NaiveDateTime>(16)?.and_utc(),
    };
    Ok((rec, tags))
}

fn with_tags(row: duckdb::Result<(WebinarRecord, String)>) -> Result<WebinarRecord> {
    let (mut rec, tags) = row?;
    rec.tags = serde_json::from_str(&tags)
        .with_context(|| format!("decode tags for webinar {}", rec.id))?;
    Ok(rec)
}

/// A registration row as stored, before `kind` is parsed.
struct RegistrationRow {
    id: String,
    webinar_id: String,
    name: String,
    email: String,
    phone: Option<String>,
    kind: String,
    created_at: NaiveDateTime,
}

impl RegistrationRow {
    fn into_registration(self) -> Result<UserRegistration> {
        let kind: RegistrationKind = self
            .kind
            .parse()
            .with_context(|| format!("decode kind for registration {}", self.id))?;
        Ok(UserRegistration {
            id: self.id,
            webinar_id: self.webinar_id,
            name: self.name,
            email: self.email,
            phone: self.phone,
            kind,
            created_at: self.created_at.and_utc(),
        })
    }
}

fn registration_from_row(r: &duckdb::Row<'_>) -> duckdb::Result<RegistrationRow> {
    Ok(RegistrationRow {
        id: r.get(0)?,
        webinar_id: r.get(1)?,
        name: r.get(2)?,
        email: r.get(3)?,
        phone: r.get(4)?,
        kind: r.get(5)?,
        created_at: r.get(6)?,
    })
}

/// A scrape log row as stored, before the enum columns are parsed.
struct LogRow {
    id: String,
    source: String,
    trigger: String,
    scope: String,
    new_count: i64,
    status: String,
    message: Option<String>,
    run_at: NaiveDateTime,
}

impl LogRow {
    fn into_entry(self) -> Result<ScrapeLogEntry> {
        let trigger: TriggerType = self
            .trigger
            .parse()
            .with_context(|| format!("decode trigger for log {}", self.id))?;
        let status: LogStatus = self
            .status
            .parse()
            .with_context(|| format!("decode status for log {}", self.id))?;
        Ok(ScrapeLogEntry {
            id: self.id,
            source: self.source,
            trigger,
            scope: self.scope,
            new_count: self.new_count.max(0) as usize,
            status,
            message: self.message,
            run_at: self.run_at.and_utc(),
        })
    }
}

impl Repository {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Could not create dir {:?}", parent))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open DuckDB at {:?}", path))?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self { conn: Mutex::new(Connection::open_in_memory()?) })
    }

    pub fn run_migrations(&self) -> Result<()> {
        info!("Running migrations…");
        let conn = self.conn.lock();
        conn.execute_batch(DDL).context("DDL failed")?;
        conn.execute_batch(INDEXES).context("Index creation failed")?;
        conn.execute(
            "INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, ?)",
            params![Utc::now().naive_utc()],
        )?;
        info!("Migrations done.");
        Ok(())
    }

    // ── Webinars ──────────────────────────────────────────────────────────────

    /// All webinars, newest first.
    pub fn list_webinars(&self) -> Result<Vec<WebinarRecord>> {
        self.query_webinars(&format!(
            "SELECT {WEBINAR_COLUMNS} FROM webinars ORDER BY created_at DESC, id"
        ))
    }

    /// Most recently fetched webinars, used to rank trending categories.
    pub fn recent_webinars(&self, limit: usize) -> Result<Vec<WebinarRecord>> {
        self.query_webinars(&format!(
            "SELECT {WEBINAR_COLUMNS} FROM webinars ORDER BY last_fetched DESC, id LIMIT {limit}"
        ))
    }

    fn query_webinars(&self, sql: &str) -> Result<Vec<WebinarRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt.query_map([], webinar_from_row)?;
        rows.map(with_tags).collect()
    }

    pub fn get_webinar(&self, id: &str) -> Result<Option<WebinarRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(&format!("SELECT {WEBINAR_COLUMNS} FROM webinars WHERE id = ?"))?;
        let mut rows = stmt.query_map(params![id], webinar_from_row)?;
        rows.next().map(with_tags).transpose()
    }

    pub fn webinar_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM webinars")
    }

    // ── Registrations ─────────────────────────────────────────────────────────

    pub fn create_registration(&self, reg: &UserRegistration) -> Result<()> {
        self.conn
            .lock()
            .execute(
                r#"INSERT INTO webinar_registrations
                   (id, webinar_id, name, email, phone, kind, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    reg.id,
                    reg.webinar_id,
                    reg.name,
                    reg.email,
                    reg.phone,
                    reg.kind.as_str(),
                    ts(reg.created_at),
                ],
            )
            .with_context(|| format!("insert registration for {}", reg.webinar_id))?;
        Ok(())
    }

    /// Registrations for one webinar, newest first.
    pub fn registrations_for(&self, webinar_id: &str) -> Result<Vec<UserRegistration>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"SELECT id, webinar_id, name, email, phone, kind, created_at
               FROM webinar_registrations WHERE webinar_id = ?
               ORDER BY created_at DESC, id"#,
        )?;
        let rows = stmt.query_map(params![webinar_id], registration_from_row)?;
        rows.map(|row| row?.into_registration()).collect()
    }

    /// Every registration joined with its webinar, for the admin listing.
    pub fn all_registrations_with_webinar(&self) -> Result<Vec<RegistrationWithWebinar>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"SELECT r.id, r.webinar_id, r.name, r.email, r.phone, r.kind, r.created_at,
                      w.title, w.host, w.scheduled_at
               FROM webinar_registrations r
               JOIN webinars w ON w.id = r.webinar_id
               ORDER BY w.created_at DESC, r.created_at DESC, r.id"#,
        )?;
        let rows = stmt.query_map([], |r| {
            let reg = registration_from_row(r)?;
            let title: String = r.get(7)?;
            let host: String = r.get(8)?;
            let date: NaiveDateTime = r.get(9)?;
            Ok((reg, title, host, date))
        })?;
        rows.map(|row| {
            let (reg, title, host, date) = row?;
            Ok(RegistrationWithWebinar {
                registration: reg.into_registration()?,
                webinar_title: title,
                webinar_host: host,
                webinar_date: date.and_utc(),
            })
        })
        .collect()
    }

    pub fn registration_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM webinar_registrations")
    }

    // ── Meeting sessions ──────────────────────────────────────────────────────

    pub fn meeting_session_for(&self, webinar_id: &str) -> Result<Option<MeetingSession>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"SELECT id, webinar_id, meeting_url, session_token, created_at, expires_at
               FROM meeting_sessions WHERE webinar_id = ?
               ORDER BY created_at LIMIT 1"#,
        )?;
        let mut rows = stmt.query_map(params![webinar_id], |r| {
            Ok(MeetingSession {
                id: r.get(0)?,
                webinar_id: r.get(1)?,
                meeting_url: r.get(2)?,
                session_token: r.get(3)?,
                created_at: r.get::<_, NaiveDateTime>(4)?.and_utc(),
                expires_at: r.get::<_, NaiveDateTime>(5)?.and_utc(),
            })
        })?;
        Ok(rows.next().transpose()?)
    }

    pub fn create_meeting_session(&self, session: &MeetingSession) -> Result<()> {
        self.conn
            .lock()
            .execute(
                r#"INSERT INTO meeting_sessions
                   (id, webinar_id, meeting_url, session_token, created_at, expires_at)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
                params![
                    session.id,
                    session.webinar_id,
                    session.meeting_url,
                    session.session_token,
                    ts(session.created_at),
                    ts(session.expires_at),
                ],
            )
            .with_context(|| format!("insert meeting session for {}", session.webinar_id))?;
        Ok(())
    }

    // ── SEO content ───────────────────────────────────────────────────────────

    pub fn insert_blog_post(&self, post: &BlogPost) -> Result<()> {
        self.conn
            .lock()
            .execute(
                r#"INSERT INTO blog_posts
                   (id, title, slug, content, keywords, meta_description, created_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    post.id,
                    post.title,
                    post.slug,
                    post.content,
                    serde_json::to_string(&post.keywords)?,
                    post.meta_description,
                    ts(post.created_at),
                ],
            )
            .with_context(|| format!("insert blog post {}", post.slug))?;
        Ok(())
    }

    pub fn insert_guide(&self, guide: &Guide) -> Result<()> {
        self.conn
            .lock()
            .execute(
                r#"INSERT INTO guides (id, topic, title, content, keywords, created_at)
                   VALUES (?, ?, ?, ?, ?, ?)"#,
                params![
                    guide.id,
                    guide.topic,
                    guide.title,
                    guide.content,
                    serde_json::to_string(&guide.keywords)?,
                    ts(guide.created_at),
                ],
            )
            .with_context(|| format!("insert guide {}", guide.topic))?;
        Ok(())
    }

    pub fn blog_post_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM blog_posts")
    }

    pub fn guide_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM guides")
    }

    // ── Scrape log ────────────────────────────────────────────────────────────

    pub fn scrape_log_count(&self) -> Result<i64> {
        self.count("SELECT COUNT(*) FROM scrape_logs")
    }

    pub fn last_scrape_at(&self) -> Result<Option<DateTime<Utc>>> {
        let conn = self.conn.lock();
        let last: Option<NaiveDateTime> =
            conn.query_row("SELECT MAX(run_at) FROM scrape_logs", [], |r| r.get(0))?;
        Ok(last.map(|t| t.and_utc()))
    }

    /// Log entries for one scope, newest first.
    pub fn scrape_logs_for(&self, scope: &str) -> Result<Vec<ScrapeLogEntry>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"SELECT id, source, trigger_type, scope, new_count, status, message, run_at
               FROM scrape_logs WHERE scope = ? ORDER BY run_at DESC, id"#,
        )?;
        let rows = stmt.query_map(params![scope], |r| {
            Ok(LogRow {
                id: r.get(0)?,
                source: r.get(1)?,
                trigger: r.get(2)?,
                scope: r.get(3)?,
                new_count: r.get(4)?,
                status: r.get(5)?,
                message: r.get(6)?,
                run_at: r.get(7)?,
            })
        })?;
        rows.map(|row| row?.into_entry()).collect()
    }

    fn count(&self, sql: &str) -> Result<i64> {
        let conn = self.conn.lock();
        let mut s = conn.prepare(sql)?;
        Ok(s.query_row([], |r| r.get(0))?)
    }
}

impl WebinarStore for Repository {
    fn find_existing(&self, id: &str, checksum: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let mut stmt =
            conn.prepare("SELECT id FROM webinars WHERE id = ? OR checksum = ? LIMIT 1")?;
        let mut rows = stmt.query_map(params![id, checksum], |r| r.get::<_, String>(0))?;
        Ok(rows.next().transpose()?)
    }

    fn insert_webinar(&self, w: &WebinarRecord) -> Result<()> {
        self.conn
            .lock()
            .execute(
                &format!(
                    "INSERT INTO webinars ({WEBINAR_COLUMNS}) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
                ),
                params![
                    w.id,
                    w.title,
                    w.host,
                    w.platform,
                    ts(w.scheduled_at),
                    w.duration_mins as i64,
                    w.category,
                    w.description,
                    serde_json::to_string(&w.tags)?,
                    w.registration_url,
                    w.meeting_url,
                    w.image_url,
                    w.source,
                    w.checksum,
                    ts(w.last_fetched),
                    ts(w.created_at),
                    ts(w.updated_at),
                ],
            )
            .with_context(|| format!("insert webinar {}", w.id))?;
        Ok(())
    }

    fn touch_webinar(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        self.conn
            .lock()
            .execute(
                "UPDATE webinars SET last_fetched = ?, updated_at = ? WHERE id = ?",
                params![ts(at), ts(at), id],
            )
            .with_context(|| format!("touch webinar {}", id))?;
        Ok(())
    }

    fn append_scrape_log(&self, e: &ScrapeLogEntry) -> Result<()> {
        self.conn
            .lock()
            .execute(
                r#"INSERT INTO scrape_logs
                   (id, source, trigger_type, scope, new_count, status, message, run_at)
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    e.id,
                    e.source,
                    e.trigger.as_str(),
                    e.scope,
                    e.new_count as i64,
                    e.status.as_str(),
                    e.message,
                    ts(e.run_at),
                ],
            )
            .with_context(|| format!("append scrape log for {}", e.source))?;
        Ok(())
    }

    fn has_recent_success(&self, scope: &str, since: DateTime<Utc>) -> Result<bool> {
        let conn = self.conn.lock();
        let n: i64 = conn.query_row(
            r#"SELECT COUNT(*) FROM scrape_logs
               WHERE scope = ? AND status = 'success' AND run_at > ?"#,
            params![scope, ts(since)],
            |r| r.get(0),
        )?;
        Ok(n > 0)
    }
}

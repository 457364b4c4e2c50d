use axum::extract::{Form, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::location::resolve_with_deadline;
use crate::report::{ReportForm, ReportSubmission};

use super::page::{self, PageView};
use super::session::SESSION_COOKIE;
use super::state::AppState;
use super::static_files;

// ─── Error response ──────────────────────────────────────────────

pub struct PageError(minijinja::Error);

impl From<minijinja::Error> for PageError {
    fn from(e: minijinja::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "page render failed");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error while rendering the page").into_response()
    }
}

pub type PageResult = Result<(CookieJar, Html<String>), PageError>;

// ─── Session cookie ──────────────────────────────────────────────

fn session_id(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

fn with_session_cookie(jar: CookieJar, id: Uuid) -> CookieJar {
    jar.add(
        Cookie::build((SESSION_COOKIE, id.to_string()))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

// ─── Static file handlers ────────────────────────────────────────

pub async fn style() -> Response {
    ([(header::CONTENT_TYPE, "text/css")], static_files::STYLE_CSS).into_response()
}

pub async fn healthz() -> &'static str {
    "ok"
}

// ─── GET / ───────────────────────────────────────────────────────

pub async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> PageResult {
    let id = state.sessions().open(session_id(&jar));
    let session = state.sessions().snapshot(id);

    let html = page::render(&PageView {
        session: &session,
        lookup: None,
        submission: None,
    })?;
    Ok((with_session_cookie(jar, id), Html(html)))
}

// ─── POST /location ──────────────────────────────────────────────

pub async fn locate(State(state): State<Arc<AppState>>, jar: CookieJar) -> PageResult {
    let start = Instant::now();
    let id = state.sessions().open(session_id(&jar));
    state.sessions().update(id, |s| s.begin_resolving());

    // Dropping this handler (client disconnect) cancels the lookup.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();
    let outcome = resolve_with_deadline(state.resolver.clone(), state.lookup_timeout, cancel).await;

    let session = state.sessions().update(id, |s| {
        s.apply_resolution(&outcome);
        s.clone()
    });

    match &outcome {
        Ok(r) => tracing::info!(
            session = %id,
            source = %r.source,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "POST /location -> resolved"
        ),
        Err(e) => tracing::warn!(
            session = %id,
            error = %e,
            elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
            "POST /location -> unresolvable"
        ),
    }

    let html = page::render(&PageView {
        session: &session,
        lookup: Some(&outcome),
        submission: None,
    })?;
    Ok((with_session_cookie(jar, id), Html(html)))
}

// ─── POST /report ────────────────────────────────────────────────

pub async fn submit_report(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ReportForm>,
) -> PageResult {
    let id = state.sessions().open(session_id(&jar));
    let submission = ReportSubmission::from_form(form);
    let session = state.sessions().update(id, |s| {
        s.mark_submitted();
        s.clone()
    });

    // Field sizes only; report contents stay out of the logs.
    tracing::info!(
        session = %id,
        disaster_type = ?submission.disaster_type.known(),
        name_len = submission.name.len(),
        contact_len = submission.contact.len(),
        location_len = submission.location.len(),
        note_len = submission.note.len(),
        submitted_at = %submission.submitted_at.format("%H:%M:%S"),
        "POST /report -> accepted"
    );

    let html = page::render(&PageView {
        session: &session,
        lookup: None,
        submission: Some(&submission),
    })?;
    Ok((with_session_cookie(jar, id), Html(html)))
}

//! HTTP routes.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use leadledger_core::{
    Enquiry, EnquiryFilter, EnquiryId, EnquiryStats, EnquiryStatus, EnquiryStore, EnquiryUpdate,
    Error, FollowUpDispatcher, FollowUpReport, IntakeService, MailSender, Priority, RawSubmission,
    ReplyComposer, ReplyDraft, SortOrder, SubmissionReceipt, authorize_bearer,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::info;

use crate::config::Config;
use crate::error::ApiError;

const DEFAULT_LIST_LIMIT: u32 = 50;
const MAX_LIST_LIMIT: u32 = 200;

/// Services shared by all handlers.
pub struct AppState {
    store: Arc<dyn EnquiryStore>,
    intake: IntakeService,
    dispatcher: FollowUpDispatcher,
    composer: ReplyComposer,
    cron_secret: Option<String>,
    admin_token: Option<String>,
    /// Held for the duration of a follow-up batch so runs never overlap.
    follow_up_running: Mutex<()>,
}

/// Handler state.
pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire the core services together from configuration.
    #[must_use]
    pub fn new(store: Arc<dyn EnquiryStore>, mailer: Arc<dyn MailSender>, config: &Config) -> Self {
        let notifications = config.notification_settings();
        Self {
            intake: IntakeService::new(store.clone(), mailer.clone(), notifications.clone()),
            dispatcher: FollowUpDispatcher::new(store.clone(), mailer.clone(), notifications.clone())
                .with_settings(config.follow_up_settings()),
            composer: ReplyComposer::new(store.clone(), mailer, notifications),
            store,
            cron_secret: config.cron_secret.clone(),
            admin_token: config.admin_token.clone(),
            follow_up_running: Mutex::new(()),
        }
    }

    /// Whether admin routes are served.
    #[must_use]
    pub const fn admin_enabled(&self) -> bool {
        self.admin_token.is_some()
    }

    fn require_admin(&self, headers: &HeaderMap) -> Result<(), Error> {
        match self.admin_token.as_deref() {
            Some(token) => authorize_bearer(Some(token), authorization(headers)),
            None => Err(Error::Unauthorized),
        }
    }
}

/// Build the router. Admin routes are only mounted when an admin token is set.
pub fn router(state: SharedState) -> Router {
    let mut router: Router<SharedState> = Router::new()
        .route("/api/health", get(health))
        .route("/api/enquiries", post(submit_enquiry))
        .route("/api/cron/follow-up", get(run_follow_up).post(run_follow_up));

    if state.admin_enabled() {
        router = router
            .route("/api/admin/stats", get(stats))
            .route("/api/admin/enquiries", get(list_enquiries))
            .route(
                "/api/admin/enquiries/:id",
                get(get_enquiry).patch(update_enquiry).delete(delete_enquiry),
            )
            .route("/api/admin/enquiries/:id/reply", post(reply_to_enquiry));
    }

    router.with_state(state)
}

fn authorization(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
}

// ── public ──────────────────────────────────────────────────────────────

/// `GET /api/health`
pub async fn health(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    state.store.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}

/// `POST /api/enquiries`
pub async fn submit_enquiry(
    State(state): State<SharedState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), ApiError> {
    let raw = RawSubmission::from_json(&body);
    let receipt = state.intake.submit(&raw, Utc::now()).await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// `GET|POST /api/cron/follow-up`
pub async fn run_follow_up(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<FollowUpReport>, ApiError> {
    authorize_bearer(state.cron_secret.as_deref(), authorization(&headers))?;

    let _running = state.follow_up_running.lock().await;
    let report = state.dispatcher.run(Utc::now()).await?;
    Ok(Json(report))
}

// ── admin ───────────────────────────────────────────────────────────────

/// Query string for the admin list.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Status name.
    pub status: Option<String>,
    /// Priority name.
    pub priority: Option<String>,
    /// Maximum rows.
    pub limit: Option<u32>,
}

impl ListParams {
    fn to_filter(&self) -> Result<EnquiryFilter, Error> {
        let status = self
            .status
            .as_deref()
            .map(|s| {
                EnquiryStatus::try_parse(s)
                    .ok_or_else(|| Error::InvalidInput(format!("unknown status: {s}")))
            })
            .transpose()?;
        let priority = self
            .priority
            .as_deref()
            .map(|p| {
                Priority::try_parse(p)
                    .ok_or_else(|| Error::InvalidInput(format!("unknown priority: {p}")))
            })
            .transpose()?;

        Ok(EnquiryFilter {
            status,
            priorities: priority.into_iter().collect(),
            order: SortOrder::Newest,
            limit: Some(
                self.limit
                    .unwrap_or(DEFAULT_LIST_LIMIT)
                    .clamp(1, MAX_LIST_LIMIT),
            ),
            ..EnquiryFilter::default()
        })
    }
}

/// Admin edit of an enquiry.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminUpdate {
    /// New status.
    pub status: Option<String>,
    /// Priority override.
    pub priority: Option<String>,
    /// Replacement notes.
    pub notes: Option<String>,
}

impl AdminUpdate {
    fn to_update(&self) -> Result<EnquiryUpdate, Error> {
        let update = EnquiryUpdate {
            status: self
                .status
                .as_deref()
                .map(|s| {
                    EnquiryStatus::try_parse(s)
                        .ok_or_else(|| Error::InvalidInput(format!("unknown status: {s}")))
                })
                .transpose()?,
            priority: self
                .priority
                .as_deref()
                .map(|p| {
                    Priority::try_parse(p)
                        .ok_or_else(|| Error::InvalidInput(format!("unknown priority: {p}")))
                })
                .transpose()?,
            notes: self.notes.clone(),
            ..EnquiryUpdate::default()
        };

        if update.is_empty() {
            return Err(Error::InvalidInput("nothing to update".to_string()));
        }
        Ok(update)
    }
}

/// `GET /api/admin/stats`
pub async fn stats(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<EnquiryStats>, ApiError> {
    state.require_admin(&headers)?;
    Ok(Json(state.store.stats().await?))
}

/// `GET /api/admin/enquiries`
pub async fn list_enquiries(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Enquiry>>, ApiError> {
    state.require_admin(&headers)?;
    let filter = params.to_filter()?;
    Ok(Json(state.store.find_many(&filter).await?))
}

/// `GET /api/admin/enquiries/:id`
pub async fn get_enquiry(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Enquiry>, ApiError> {
    state.require_admin(&headers)?;
    let id = EnquiryId(id);
    let enquiry = state.store.find_by_id(id).await?.ok_or(Error::NotFound(id))?;
    Ok(Json(enquiry))
}

/// `PATCH /api/admin/enquiries/:id`
pub async fn update_enquiry(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<AdminUpdate>,
) -> Result<Json<Enquiry>, ApiError> {
    state.require_admin(&headers)?;
    let update = body.to_update()?;
    let enquiry = state.store.update(EnquiryId(id), &update).await?;
    info!(id, "Enquiry updated");
    Ok(Json(enquiry))
}

/// `DELETE /api/admin/enquiries/:id`
pub async fn delete_enquiry(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.require_admin(&headers)?;
    let id = EnquiryId(id);
    if state.store.delete(id).await? {
        info!(%id, "Enquiry deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound(id).into())
    }
}

/// `POST /api/admin/enquiries/:id/reply`
pub async fn reply_to_enquiry(
    State(state): State<SharedState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(draft): Json<ReplyDraft>,
) -> Result<Json<Enquiry>, ApiError> {
    state.require_admin(&headers)?;
    let enquiry = state
        .composer
        .send_reply(EnquiryId(id), &draft, Utc::now())
        .await?;
    Ok(Json(enquiry))
}

//! Route mounting for the admin dashboard.

use crate::extractor::AdminSession;
use crate::AdminErrorResponse;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post};
use axum::{Json, Router};
use base64::Engine;
use chrono::NaiveDate;
use ride_admin_core::error::AdminError;
use ride_admin_core::guard::AUTH_COOKIE;
use ride_admin_core::traits::AuthProvider;
use ride_admin_core::{
    AccountType, AdminIdentity, DateRange, Granularity, NewsArticle, Ride, RideCategory,
    WithdrawalRequest, WithdrawalStatus,
};
use ride_admin_dashboard::{
    AdminApi, AnalyticsReport, MediaUpload, NewsDraft, NewsListResponse, OverviewResponse,
    RideCategoryUpdate, RideListResponse, UserFilter, UserListResponse, WithdrawalFilter,
    WithdrawalListResponse,
};
use serde::Deserialize;
use std::sync::Arc;

type ApiResult<T> = Result<T, AdminErrorResponse>;

/// Shared state for dashboard routes.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<AdminApi>,
    pub auth: Arc<dyn AuthProvider>,
}

impl AppState {
    pub fn new(api: Arc<AdminApi>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { api, auth }
    }
}

/// Creates an Axum router with every dashboard route.
///
/// The guard is not applied here; wrap the router in
/// [`GuardLayer`](crate::GuardLayer). Every `/dashboard` route except
/// logout takes an [`AdminSession`], so the layer must verify tokens or
/// those routes answer 401.
///
/// # Example
///
/// ```rust,ignore
/// let app = admin_routes(state).layer(GuardLayer::new().verify_with(auth));
/// ```
pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", get(login_hint_handler))
        .route("/auth/session", post(create_session_handler))
        .route("/dashboard/me", get(me_handler))
        .route("/dashboard/logout", post(logout_handler))
        .route("/dashboard/overview", get(overview_handler))
        .route("/dashboard/analytics", get(analytics_handler))
        .route("/dashboard/users", get(users_handler))
        .route("/dashboard/rides", get(rides_handler))
        .route("/dashboard/rides/{id}/cancel", post(cancel_ride_handler))
        .route("/dashboard/ride-categories", get(ride_categories_handler))
        .route("/dashboard/ride-categories/{id}", patch(update_ride_category_handler))
        .route("/dashboard/withdrawals", get(withdrawals_handler))
        .route("/dashboard/withdrawals/{id}/status", post(withdrawal_status_handler))
        .route("/dashboard/news", get(list_news_handler).post(save_news_handler))
        .route("/dashboard/news/{id}", delete(delete_news_handler))
        .with_state(state)
}

// ==================== Session ====================

async fn login_hint_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Sign in with an admin account",
        "session_endpoint": "/auth/session"
    }))
}

#[derive(Debug, Deserialize)]
struct SessionRequest {
    id_token: String,
}

async fn create_session_handler(
    State(state): State<AppState>,
    Json(body): Json<SessionRequest>,
) -> ApiResult<Response> {
    let identity = state.auth.verify_token(&body.id_token).await?;
    let cookie = HeaderValue::from_str(&format!(
        "{AUTH_COOKIE}={}; Path=/; HttpOnly; SameSite=Lax",
        body.id_token
    ))
    .map_err(|_| AdminError::InvalidToken)?;

    tracing::info!(uid = %identity.uid, "Admin signed in");

    let mut response = Json(identity).into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

async fn me_handler(session: AdminSession) -> Json<AdminIdentity> {
    Json(session.identity)
}

/// Clears the cookie. Works with a stale token so a browser can always
/// sign out.
async fn logout_handler() -> ApiResult<Response> {
    let cookie = HeaderValue::from_str(&format!(
        "{AUTH_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax"
    ))
    .map_err(|_| AdminError::InvalidToken)?;
    tracing::info!("Admin signed out");

    let mut response = StatusCode::NO_CONTENT.into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    Ok(response)
}

// ==================== Dashboard ====================

#[derive(Debug, Deserialize)]
struct OverviewParams {
    limit: Option<usize>,
}

async fn overview_handler(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<OverviewParams>,
) -> ApiResult<Json<OverviewResponse>> {
    Ok(Json(state.api.overview(params.limit).await?))
}

#[derive(Debug, Deserialize)]
struct AnalyticsParams {
    from: Option<String>,
    to: Option<String>,
    granularity: Option<String>,
    limit: Option<usize>,
}

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, AdminError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| {
            NaiveDate::parse_from_str(v, "%Y-%m-%d")
                .map_err(|_| AdminError::invalid(field, "expected yyyy-MM-dd"))
        })
        .transpose()
}

async fn analytics_handler(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<AnalyticsParams>,
) -> ApiResult<Json<AnalyticsReport>> {
    let from = parse_date("from", params.from.as_deref())?;
    let to = parse_date("to", params.to.as_deref())?;
    let granularity = match params.granularity.as_deref() {
        Some(g) if !g.is_empty() => g.parse::<Granularity>()?,
        _ => Granularity::default(),
    };

    let mut query = state.api.config().query();
    query.range = DateRange::from_parts(from, to)?;
    query.granularity = granularity;
    query.activity_limit = params.limit;

    Ok(Json(state.api.analytics(&query).await?))
}

// ==================== Users ====================

#[derive(Debug, Deserialize)]
struct UserParams {
    q: Option<String>,
    account_type: Option<String>,
}

async fn users_handler(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<UserParams>,
) -> ApiResult<Json<UserListResponse>> {
    let filter = UserFilter {
        query: params.q,
        account_type: account_type(params.account_type.as_deref()),
    };
    Ok(Json(state.api.list_users(&filter).await?))
}

fn account_type(raw: Option<&str>) -> Option<AccountType> {
    raw.filter(|t| !t.is_empty() && *t != "all")
        .map(AccountType::parse)
}

// ==================== Rides ====================

async fn rides_handler(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<RideListResponse>> {
    Ok(Json(state.api.list_rides().await?))
}

async fn cancel_ride_handler(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Ride>> {
    tracing::info!(admin = %session.identity.uid, ride = %id, "Cancel ride requested");
    Ok(Json(state.api.cancel_ride(&id).await?))
}

// ==================== Ride categories ====================

async fn ride_categories_handler(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<RideCategory>>> {
    Ok(Json(state.api.list_ride_categories().await?))
}

async fn update_ride_category_handler(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<RideCategoryUpdate>,
) -> ApiResult<Json<RideCategory>> {
    tracing::info!(
        admin = %session.identity.uid,
        category = %id,
        "Ride category update requested"
    );
    Ok(Json(state.api.update_ride_category(&id, body).await?))
}

// ==================== Withdrawals ====================

#[derive(Debug, Deserialize)]
struct WithdrawalParams {
    q: Option<String>,
    account_type: Option<String>,
    status: Option<String>,
}

fn withdrawal_status(raw: &str) -> Result<WithdrawalStatus, AdminError> {
    match raw {
        "pending" => Ok(WithdrawalStatus::Pending),
        "approved" => Ok(WithdrawalStatus::Approved),
        "rejected" => Ok(WithdrawalStatus::Rejected),
        other => Err(AdminError::invalid(
            "status",
            format!("unknown withdrawal status '{other}'"),
        )),
    }
}

async fn withdrawals_handler(
    _session: AdminSession,
    State(state): State<AppState>,
    Query(params): Query<WithdrawalParams>,
) -> ApiResult<Json<WithdrawalListResponse>> {
    let status = match params.status.as_deref() {
        None | Some("") | Some("all") => None,
        Some(s) => Some(withdrawal_status(s)?),
    };
    let filter = WithdrawalFilter {
        query: params.q,
        account_type: account_type(params.account_type.as_deref()),
        status,
    };
    Ok(Json(state.api.list_withdrawals(&filter).await?))
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    status: String,
}

async fn withdrawal_status_handler(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> ApiResult<Json<WithdrawalRequest>> {
    let status = withdrawal_status(&body.status)?;
    tracing::info!(
        admin = %session.identity.uid,
        request = %id,
        status = status.as_str(),
        "Withdrawal decision requested"
    );
    Ok(Json(state.api.set_withdrawal_status(&id, status).await?))
}

// ==================== News ====================

async fn list_news_handler(
    _session: AdminSession,
    State(state): State<AppState>,
) -> ApiResult<Json<NewsListResponse>> {
    Ok(Json(state.api.list_news().await?))
}

#[derive(Debug, Deserialize)]
struct MediaPayload {
    file_name: String,
    content_type: String,
    /// Standard base64 file contents.
    data: String,
}

#[derive(Debug, Deserialize)]
struct NewsPayload {
    id: Option<String>,
    headline: String,
    article: String,
    #[serde(default)]
    video_link: String,
    #[serde(default)]
    instagram_link: String,
    #[serde(default)]
    twitter_link: String,
    #[serde(default)]
    linkedin_link: String,
    media: Option<MediaPayload>,
}

impl TryFrom<NewsPayload> for NewsDraft {
    type Error = AdminError;

    fn try_from(payload: NewsPayload) -> Result<Self, Self::Error> {
        let media = payload
            .media
            .map(|m| {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(m.data.as_bytes())
                    .map_err(|e| AdminError::invalid("media.data", e.to_string()))?;
                Ok::<_, AdminError>(MediaUpload {
                    file_name: m.file_name,
                    content_type: m.content_type,
                    bytes,
                })
            })
            .transpose()?;

        Ok(NewsDraft {
            id: payload.id.filter(|id| !id.is_empty()),
            headline: payload.headline,
            article: payload.article,
            video_link: payload.video_link,
            instagram_link: payload.instagram_link,
            twitter_link: payload.twitter_link,
            linkedin_link: payload.linkedin_link,
            media,
        })
    }
}

async fn save_news_handler(
    session: AdminSession,
    State(state): State<AppState>,
    Json(payload): Json<NewsPayload>,
) -> ApiResult<Json<NewsArticle>> {
    let draft = NewsDraft::try_from(payload)?;
    tracing::debug!(admin = %session.identity.uid, edit = draft.id.is_some(), "Saving news");
    Ok(Json(state.api.save_news(draft).await?))
}

async fn delete_news_handler(
    session: AdminSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    tracing::info!(admin = %session.identity.uid, news = %id, "Delete news requested");
    state.api.delete_news(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

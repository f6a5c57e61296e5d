use std::sync::Arc;

use anyhow::Context;
use axum::{
    Extension, Json, Router,
    extract::{FromRequest, Path, Query, Request, State, rejection::JsonRejection},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::session::Sessions;
use macrolog_core::Tracker;
use macrolog_core::models::{
    Credentials, Entry, EntryFilter, Food, FoodFields, FoodQuery, NewEntry, NewUser,
    NutritionGoals, NutritionSummary, UpdateEntry, UserProfile,
};

const BODY_LIMIT: usize = 1024 * 1024; // 1 MiB

#[derive(Clone)]
struct AppState {
    tracker: Arc<Tracker>,
    sessions: Arc<Sessions>,
}

impl AppState {
    fn new(tracker: Tracker) -> Self {
        Self {
            tracker: Arc::new(tracker),
            sessions: Arc::new(Sessions::default()),
        }
    }
}

/// Identity resolved from the bearer token by [`require_auth`].
#[derive(Clone)]
struct CurrentUser {
    id: String,
    token: String,
}

// --- Request / Response types ---

/// JSON body extractor whose rejections are reported as [`ApiError`]s.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
struct ApiJson<T>(T);

#[derive(Serialize)]
struct AuthResponse {
    #[serde(flatten)]
    user: UserProfile,
    token: String,
}

#[derive(Deserialize)]
struct WeeklyQuery {
    start_date: Option<String>,
}

// --- Error handling ---

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    Conflict(String),
    PayloadTooLarge,
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large".to_string(),
            ),
            Self::Internal(err) => {
                error!("internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };
        (status, message).into_response()
    }
}

impl From<macrolog_core::Error> for ApiError {
    fn from(err: macrolog_core::Error) -> Self {
        use macrolog_core::Error;
        match err {
            Error::BadRequest(msg) => Self::BadRequest(msg),
            Error::Unauthorized(msg) => Self::Unauthorized(msg),
            Error::Forbidden(msg) => Self::Forbidden(msg),
            Error::NotFound(msg) => Self::NotFound(msg),
            Error::Conflict(msg) => Self::Conflict(msg),
            Error::Store(err) => Self::Internal(err.into()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::BadRequest(rejection.body_text())
        }
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string);

    let Some(token) = token else {
        return ApiError::Unauthorized("Unauthorized".to_string()).into_response();
    };
    let Some(id) = state.sessions.resolve(&token) else {
        warn!("rejected unknown session token");
        return ApiError::Unauthorized("Unauthorized".to_string()).into_response();
    };

    request.extensions_mut().insert(CurrentUser { id, token });
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Auth handlers ---

async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<NewUser>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state.tracker.register(&req)?;
    let token = state.sessions.issue(&user.id);
    Ok(Json(AuthResponse { user, token }))
}

async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<Credentials>,
) -> Result<Json<AuthResponse>, ApiError> {
    let user = state
        .tracker
        .login(&req.email, &req.password)
        .inspect_err(|_| warn!("failed login attempt"))?;
    let token = state.sessions.issue(&user.id);
    info!(user_id = %user.id, "user logged in");
    Ok(Json(AuthResponse { user, token }))
}

async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> StatusCode {
    state.sessions.revoke(&user.token);
    StatusCode::NO_CONTENT
}

async fn get_current_user(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<UserProfile>, ApiError> {
    Ok(Json(state.tracker.current_user(&user.id)?))
}

// --- Food handlers ---

async fn list_foods(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<FoodQuery>,
) -> Result<Json<Vec<Food>>, ApiError> {
    Ok(Json(state.tracker.list_foods(&user.id, &query)?))
}

async fn get_food(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Food>, ApiError> {
    Ok(Json(state.tracker.get_food(&user.id, &id)?))
}

async fn create_food(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(fields): ApiJson<FoodFields>,
) -> Result<(StatusCode, Json<Food>), ApiError> {
    let food = state.tracker.create_food(&user.id, &fields)?;
    Ok((StatusCode::CREATED, Json(food)))
}

async fn update_food(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ApiJson(fields): ApiJson<FoodFields>,
) -> Result<Json<Food>, ApiError> {
    Ok(Json(state.tracker.update_food(&user.id, &id, &fields)?))
}

async fn delete_food(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.tracker.delete_food(&user.id, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Entry handlers ---

async fn list_entries(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(filter): Query<EntryFilter>,
) -> Result<Json<Vec<Entry>>, ApiError> {
    Ok(Json(state.tracker.list_entries(&user.id, &filter)?))
}

async fn get_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<Json<Entry>, ApiError> {
    Ok(Json(state.tracker.get_entry(&user.id, &id)?))
}

async fn create_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(req): ApiJson<NewEntry>,
) -> Result<(StatusCode, Json<Entry>), ApiError> {
    let entry = state.tracker.create_entry(&user.id, &req)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateEntry>,
) -> Result<Json<Entry>, ApiError> {
    Ok(Json(state.tracker.update_entry(&user.id, &id, &req)?))
}

async fn delete_entry(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.tracker.delete_entry(&user.id, &id)?;
    Ok(StatusCode::NO_CONTENT)
}

// --- Nutrition handlers ---

async fn get_daily_summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(date): Path<String>,
) -> Result<Json<NutritionSummary>, ApiError> {
    Ok(Json(state.tracker.daily_summary(&user.id, &date)?))
}

async fn get_weekly_summary(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<WeeklyQuery>,
) -> Result<Json<Vec<NutritionSummary>>, ApiError> {
    let week = state
        .tracker
        .weekly_summary(&user.id, query.start_date.as_deref())?;
    Ok(Json(week))
}

async fn get_goals(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<NutritionGoals>, ApiError> {
    Ok(Json(state.tracker.goals(&user.id)?))
}

async fn update_goals(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiJson(goals): ApiJson<NutritionGoals>,
) -> Result<Json<NutritionGoals>, ApiError> {
    Ok(Json(state.tracker.update_goals(&user.id, &goals)?))
}

fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/logout", post(logout))
        .route("/api/users/me", get(get_current_user))
        .route("/api/foods", get(list_foods).post(create_food))
        .route(
            "/api/foods/{id}",
            get(get_food).put(update_food).delete(delete_food),
        )
        .route("/api/entries", get(list_entries).post(create_entry))
        .route(
            "/api/entries/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/nutrition/daily/{date}", get(get_daily_summary))
        .route("/api/nutrition/weekly", get(get_weekly_summary))
        .route("/api/nutrition/goals", get(get_goals).put(update_goals))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

pub async fn start_server(tracker: Tracker, port: u16, bind: &str) -> anyhow::Result<()> {
    let data_dir = tracker.data_dir().display().to_string();
    let app = build_router(AppState::new(tracker));

    if bind != "127.0.0.1" && bind != "localhost" {
        warn!(
            "Listening on {bind} without TLS; credentials cross the network in plaintext."
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    info!(data_dir = %data_dir, "Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}

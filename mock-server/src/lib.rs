//! In-memory stand-in for the NotionShare backend.
//!
//! Serves the `/api/v1` routes the client uses with the same status codes and
//! `{"detail": ...}` error bodies as the real service. Notion itself is faked
//! by a fixed catalog that becomes visible once an account saves a Notion
//! token.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

pub mod models;
pub mod state;

pub use models::*;
pub use state::{HttpError, MockState};

/// Every route is mounted below this prefix.
pub const API_PREFIX: &str = "/api/v1";

pub type Db = Arc<RwLock<MockState>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(MockState::default()));
    let api = Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(current_user))
        .route("/auth/notion/token", post(save_notion_token))
        .route("/databases/list", get(list_databases))
        .route("/databases/{db_id}/structure", get(database_structure))
        .route("/databases/pages/search", get(search_pages))
        .route("/configs/", get(list_configs).post(create_config))
        .route(
            "/configs/{config_id}",
            get(get_config).put(update_config).delete(delete_config),
        )
        .route("/configs/{config_id}/properties", post(add_property_mapping))
        .route("/configs/{config_id}/filters", post(add_row_filter))
        .route("/configs/{config_id}/users", post(add_user_permission))
        .route("/sync/{config_id}/trigger", post(trigger_sync))
        .route("/sync/{config_id}/status", get(sync_status))
        .route("/sync/{config_id}/logs", get(sync_logs))
        .route("/sync/{config_id}/enable", put(toggle_sync))
        .with_state(db);
    Router::new().nest(API_PREFIX, api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

// --- auth ---

async fn register(
    State(db): State<Db>,
    Json(input): Json<Credentials>,
) -> Result<(StatusCode, Json<User>), HttpError> {
    let user = db.write().await.register(&input.email, &input.password)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login(State(db): State<Db>, Json(input): Json<Credentials>) -> Result<Json<Token>, HttpError> {
    let access_token = db.write().await.login(&input.email, &input.password)?;
    Ok(Json(Token {
        access_token,
        token_type: "bearer".to_string(),
    }))
}

async fn current_user(State(db): State<Db>, headers: HeaderMap) -> Result<Json<User>, HttpError> {
    let state = db.read().await;
    let user_id = state.authenticate(&headers)?;
    Ok(Json(state.user(user_id)?))
}

#[derive(Deserialize)]
struct NotionTokenParams {
    access_token: String,
    workspace_id: Option<String>,
}

async fn save_notion_token(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<NotionTokenParams>,
) -> Result<Json<Message>, HttpError> {
    let mut state = db.write().await;
    let user_id = state.authenticate(&headers)?;
    state.save_notion_token(user_id, &params.access_token, params.workspace_id.as_deref())?;
    Ok(Json(Message {
        message: "Notion token saved successfully".to_string(),
    }))
}

// --- databases ---

async fn list_databases(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Value>, HttpError> {
    let state = db.read().await;
    let user_id = state.authenticate(&headers)?;
    let databases = state.list_databases(user_id)?;
    Ok(Json(json!({ "databases": databases })))
}

async fn database_structure(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(db_id): Path<String>,
) -> Result<Json<NotionDatabase>, HttpError> {
    let state = db.read().await;
    let user_id = state.authenticate(&headers)?;
    Ok(Json(state.database_structure(user_id, &db_id)?))
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: String,
}

async fn search_pages(
    State(db): State<Db>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<Value>, HttpError> {
    let state = db.read().await;
    let user_id = state.authenticate(&headers)?;
    let pages = state.search_pages(user_id, &params.query)?;
    Ok(Json(json!({ "pages": pages })))
}

// --- configs ---

async fn list_configs(State(db): State<Db>, headers: HeaderMap) -> Result<Json<Vec<DatabaseConfig>>, HttpError> {
    let state = db.read().await;
    let user_id = state.authenticate(&headers)?;
    Ok(Json(state.list_configs(user_id)))
}

async fn create_config(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateConfig>,
) -> Result<(StatusCode, Json<DatabaseConfig>), HttpError> {
    let mut state = db.write().await;
    let user_id = state.authenticate(&headers)?;
    Ok((StatusCode::CREATED, Json(state.create_config(user_id, input))))
}

async fn get_config(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(config_id): Path<i64>,
) -> Result<Json<DatabaseConfig>, HttpError> {
    let state = db.read().await;
    let user_id = state.authenticate(&headers)?;
    Ok(Json(state.config(user_id, config_id)?.clone()))
}

async fn update_config(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(config_id): Path<i64>,
    Json(input): Json<UpdateConfig>,
) -> Result<Json<DatabaseConfig>, HttpError> {
    let mut state = db.write().await;
    let user_id = state.authenticate(&headers)?;
    Ok(Json(state.update_config(user_id, config_id, input)?))
}

async fn delete_config(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(config_id): Path<i64>,
) -> Result<StatusCode, HttpError> {
    let mut state = db.write().await;
    let user_id = state.authenticate(&headers)?;
    state.delete_config(user_id, config_id)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn add_property_mapping(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(config_id): Path<i64>,
    Json(input): Json<CreatePropertyMapping>,
) -> Result<Json<PropertyMapping>, HttpError> {
    let mut state = db.write().await;
    let user_id = state.authenticate(&headers)?;
    Ok(Json(state.add_property_mapping(user_id, config_id, input)?))
}

async fn add_row_filter(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(config_id): Path<i64>,
    Json(input): Json<CreateRowFilter>,
) -> Result<Json<RowFilter>, HttpError> {
    let mut state = db.write().await;
    let user_id = state.authenticate(&headers)?;
    Ok(Json(state.add_row_filter(user_id, config_id, input)?))
}

async fn add_user_permission(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(config_id): Path<i64>,
    Json(input): Json<CreateUserPermission>,
) -> Result<Json<UserPermission>, HttpError> {
    let mut state = db.write().await;
    let user_id = state.authenticate(&headers)?;
    Ok(Json(state.add_user_permission(user_id, config_id, input)?))
}

// --- sync ---

async fn trigger_sync(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(config_id): Path<i64>,
) -> Result<Json<SyncTrigger>, HttpError> {
    let mut state = db.write().await;
    let user_id = state.authenticate(&headers)?;
    let log = state.trigger_sync(user_id, config_id)?;
    Ok(Json(SyncTrigger {
        message: "Sync completed successfully".to_string(),
        sync_log_id: Some(log.id),
        status: log.status.unwrap_or_default(),
    }))
}

async fn sync_status(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(config_id): Path<i64>,
) -> Result<Json<SyncStatus>, HttpError> {
    let state = db.read().await;
    let user_id = state.authenticate(&headers)?;
    let config = state.config(user_id, config_id)?;
    let latest_sync_log = state.sync_logs(user_id, config_id, 1)?.into_iter().next();
    Ok(Json(SyncStatus {
        config_id,
        sync_enabled: config.sync_enabled,
        last_sync_at: config.last_sync_at,
        latest_sync_log,
    }))
}

#[derive(Deserialize)]
struct LogsParams {
    #[serde(default = "default_log_limit")]
    limit: usize,
}

fn default_log_limit() -> usize {
    50
}

async fn sync_logs(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(config_id): Path<i64>,
    Query(params): Query<LogsParams>,
) -> Result<Json<Vec<SyncLog>>, HttpError> {
    let state = db.read().await;
    let user_id = state.authenticate(&headers)?;
    Ok(Json(state.sync_logs(user_id, config_id, params.limit)?))
}

#[derive(Deserialize)]
struct EnableParams {
    enabled: bool,
}

async fn toggle_sync(
    State(db): State<Db>,
    headers: HeaderMap,
    Path(config_id): Path<i64>,
    Query(params): Query<EnableParams>,
) -> Result<Json<SyncToggle>, HttpError> {
    let mut state = db.write().await;
    let user_id = state.authenticate(&headers)?;
    state.set_sync_enabled(user_id, config_id, params.enabled)?;
    let verb = if params.enabled { "enabled" } else { "disabled" };
    Ok(Json(SyncToggle {
        message: format!("Sync {verb} successfully"),
        config_id,
        sync_enabled: params.enabled,
    }))
}

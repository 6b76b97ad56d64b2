//! Request client for the NotionShare API.
//!
//! # Design
//! `ApiClient` holds a base URL, a `Transport`, a `TokenStore` and the current
//! bearer token. Every endpoint method goes through `send`, which is the
//! composition of three steps that are also public on their own:
//! `build_request` (pure), one `Transport::execute` call, and
//! `parse_response` (pure). Only `login` and `logout` touch the token.
//!
//! The token sits behind a `std::sync::RwLock` that is never held across an
//! `.await`, so any number of calls may be in flight on one client.

use std::sync::{PoisonError, RwLock};

use log::{debug, error, info, warn};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{ApiError, GENERIC_ERROR_MESSAGE};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
use crate::store::{MemoryTokenStore, TokenStore};
use crate::transport::Transport;
use crate::types::{
    AccessToken, Credentials, DatabaseConfig, DatabaseConfigUpdate, DatabaseList, Message, NewDatabaseConfig,
    NewPropertyMapping, NewRowFilter, NewUserPermission, NotionDatabase, NotionPage, PageList, PropertyMapping,
    RowFilter, SyncLog, SyncStatus, SyncToggle, SyncTrigger, User, UserPermission,
};

/// Number of log entries `sync_logs` asks for when the caller has no preference.
pub const DEFAULT_SYNC_LOG_LIMIT: u32 = 50;

/// Client for the NotionShare backend.
///
/// Construct one per session and share it by reference.
pub struct ApiClient<T, S = MemoryTokenStore> {
    config: ClientConfig,
    transport: T,
    store: S,
    token: RwLock<Option<String>>,
}

impl<T: Transport, S: TokenStore> ApiClient<T, S> {
    /// Create a client, restoring any token previously persisted in `store`.
    pub fn new(config: ClientConfig, transport: T, store: S) -> Self {
        let token = match store.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("ignoring unreadable stored token: {e}");
                None
            }
        };
        Self {
            config,
            transport,
            store,
            token: RwLock::new(token),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// Headers sent with every request: JSON content type, plus the bearer
    /// token when one is set.
    pub fn compute_headers(&self) -> Vec<(String, String)> {
        let mut headers = vec![("Content-Type".to_string(), "application/json".to_string())];
        if let Some(token) = self.token.read().unwrap_or_else(PoisonError::into_inner).as_deref() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }

    /// Describe the request for `endpoint_path` without sending it.
    ///
    /// The path is appended to the base URL verbatim.
    pub fn build_request(&self, endpoint_path: &str, options: RequestOptions) -> HttpRequest {
        HttpRequest {
            method: options.method,
            url: format!("{}{endpoint_path}", self.config.base_url()),
            headers: self.compute_headers(),
            body: options.body,
        }
    }

    /// Decode a response to a request built by `build_request`.
    ///
    /// A 2xx body must be valid JSON for `R`; an empty one is a
    /// deserialization error. Failed responses take their message from the
    /// body's `detail` field, or `"Request failed"`.
    pub fn parse_response<R: DeserializeOwned>(&self, response: HttpResponse) -> Result<R, ApiError> {
        if !response.is_success() {
            return Err(ApiError::Http {
                status: response.status,
                message: error_message(&response.body),
            });
        }
        serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
    }

    /// Issue one request and decode the JSON reply. Failures are logged and
    /// returned; nothing is retried.
    pub async fn send<R: DeserializeOwned>(&self, endpoint_path: &str, options: RequestOptions) -> Result<R, ApiError> {
        self.dispatch(endpoint_path, options, |response| self.parse_response(response))
            .await
    }

    async fn dispatch<R, F>(&self, endpoint_path: &str, options: RequestOptions, decode: F) -> Result<R, ApiError>
    where
        F: FnOnce(HttpResponse) -> Result<R, ApiError>,
    {
        let request = self.build_request(endpoint_path, options);
        // The query string may carry credentials (`/auth/notion/token`).
        let route = endpoint_path.split('?').next().unwrap_or_default();
        debug!("{} {route}", request.method);

        let result = match self.transport.execute(request).await {
            Ok(response) => decode(response),
            Err(e) => Err(ApiError::from(e)),
        };
        if let Err(e) = &result {
            error!("API error on {route}: {e}");
        }
        result
    }

    async fn send_json<B, R>(&self, endpoint_path: &str, method: HttpMethod, body: &B) -> Result<R, ApiError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let options = match RequestOptions::new(method).with_json(body) {
            Ok(options) => options,
            Err(e) => {
                let err = ApiError::from(e);
                error!("API error on {endpoint_path}: {err}");
                return Err(err);
            }
        };
        self.send(endpoint_path, options).await
    }

    // --- auth ---

    pub async fn register(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.send_json("/auth/register", HttpMethod::Post, &credentials).await
    }

    /// Log in and keep the returned token for all later requests.
    ///
    /// The token is also written to the store; a store failure is logged and
    /// does not fail the login.
    pub async fn login(&self, email: &str, password: &str) -> Result<AccessToken, ApiError> {
        let credentials = Credentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        let token: AccessToken = self.send_json("/auth/login", HttpMethod::Post, &credentials).await?;

        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token.access_token.clone());
        if let Err(e) = self.store.save(&token.access_token) {
            warn!("token not persisted: {e}");
        }
        info!("logged in as {email}");
        Ok(token)
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.send("/auth/me", RequestOptions::default()).await
    }

    /// Attach a Notion integration token to the current user. An empty
    /// `workspace_id` is treated as absent.
    pub async fn save_notion_token(&self, access_token: &str, workspace_id: Option<&str>) -> Result<Message, ApiError> {
        let path = {
            let mut query = url::form_urlencoded::Serializer::new(String::new());
            query.append_pair("access_token", access_token);
            if let Some(workspace_id) = workspace_id.filter(|id| !id.is_empty()) {
                query.append_pair("workspace_id", workspace_id);
            }
            format!("/auth/notion/token?{}", query.finish())
        };
        self.send(&path, RequestOptions::new(HttpMethod::Post)).await
    }

    /// Forget the token, in memory and in the store. Never touches the network.
    pub fn logout(&self) {
        self.token.write().unwrap_or_else(PoisonError::into_inner).take();
        if let Err(e) = self.store.clear() {
            warn!("stored token not cleared: {e}");
        }
        info!("logged out");
    }

    // --- databases ---

    pub async fn list_databases(&self) -> Result<Vec<NotionDatabase>, ApiError> {
        let list: DatabaseList = self.send("/databases/list", RequestOptions::default()).await?;
        Ok(list.databases)
    }

    pub async fn database_structure(&self, database_id: &str) -> Result<NotionDatabase, ApiError> {
        self.send(&format!("/databases/{database_id}/structure"), RequestOptions::default())
            .await
    }

    pub async fn search_pages(&self, query: &str) -> Result<Vec<NotionPage>, ApiError> {
        let path = format!("/databases/pages/search?query={}", encode_component(query));
        let list: PageList = self.send(&path, RequestOptions::default()).await?;
        Ok(list.pages)
    }

    // --- configs ---

    pub async fn list_configs(&self) -> Result<Vec<DatabaseConfig>, ApiError> {
        self.send("/configs/", RequestOptions::default()).await
    }

    pub async fn create_config(&self, config: &NewDatabaseConfig) -> Result<DatabaseConfig, ApiError> {
        self.send_json("/configs/", HttpMethod::Post, config).await
    }

    pub async fn get_config(&self, config_id: i64) -> Result<DatabaseConfig, ApiError> {
        self.send(&format!("/configs/{config_id}"), RequestOptions::default())
            .await
    }

    pub async fn update_config(&self, config_id: i64, updates: &DatabaseConfigUpdate) -> Result<DatabaseConfig, ApiError> {
        self.send_json(&format!("/configs/{config_id}"), HttpMethod::Put, updates)
            .await
    }

    /// Delete a config. The backend answers 204 with no body; any JSON
    /// acknowledgement is accepted and ignored.
    pub async fn delete_config(&self, config_id: i64) -> Result<(), ApiError> {
        let path = format!("/configs/{config_id}");
        self.dispatch(&path, RequestOptions::new(HttpMethod::Delete), |response| {
            if response.is_success() && response.body.trim().is_empty() {
                return Ok(());
            }
            self.parse_response::<IgnoredAny>(response).map(|_| ())
        })
        .await
    }

    pub async fn add_property_mapping(
        &self,
        config_id: i64,
        mapping: &NewPropertyMapping,
    ) -> Result<PropertyMapping, ApiError> {
        self.send_json(&format!("/configs/{config_id}/properties"), HttpMethod::Post, mapping)
            .await
    }

    pub async fn add_row_filter(&self, config_id: i64, filter: &NewRowFilter) -> Result<RowFilter, ApiError> {
        self.send_json(&format!("/configs/{config_id}/filters"), HttpMethod::Post, filter)
            .await
    }

    pub async fn add_user_permission(
        &self,
        config_id: i64,
        permission: &NewUserPermission,
    ) -> Result<UserPermission, ApiError> {
        self.send_json(&format!("/configs/{config_id}/users"), HttpMethod::Post, permission)
            .await
    }

    // --- sync ---

    pub async fn trigger_sync(&self, config_id: i64) -> Result<SyncTrigger, ApiError> {
        self.send(&format!("/sync/{config_id}/trigger"), RequestOptions::new(HttpMethod::Post))
            .await
    }

    pub async fn sync_status(&self, config_id: i64) -> Result<SyncStatus, ApiError> {
        self.send(&format!("/sync/{config_id}/status"), RequestOptions::default())
            .await
    }

    /// Most recent sync logs first, at most `limit` of them.
    pub async fn sync_logs(&self, config_id: i64, limit: u32) -> Result<Vec<SyncLog>, ApiError> {
        self.send(&format!("/sync/{config_id}/logs?limit={limit}"), RequestOptions::default())
            .await
    }

    pub async fn toggle_sync(&self, config_id: i64, enabled: bool) -> Result<SyncToggle, ApiError> {
        self.send(
            &format!("/sync/{config_id}/enable?enabled={enabled}"),
            RequestOptions::new(HttpMethod::Put),
        )
        .await
    }
}

/// Message for a failed response: the `detail` string if there is one, the
/// JSON text of a structured `detail`, otherwise the generic fallback.
fn error_message(body: &str) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|mut value| value.get_mut("detail").map(Value::take));
    match detail {
        Some(Value::String(message)) if !message.is_empty() => message,
        Some(other) if !is_falsy(&other) => other.to_string(),
        _ => GENERIC_ERROR_MESSAGE.to_string(),
    }
}

/// `null`, `false`, `0` and `""` carry no message.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Percent-encode a query value, leaving `!'()*` literal like the
/// backend's web client does.
fn encode_component(raw: &str) -> String {
    let mut encoded = urlencoding::encode(raw).into_owned();
    for (escaped, literal) in [("%21", "!"), ("%27", "'"), ("%28", "("), ("%29", ")"), ("%2A", "*")] {
        encoded = encoded.replace(escaped, literal);
    }
    encoded
}

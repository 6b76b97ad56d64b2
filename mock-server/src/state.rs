//! In-memory backend state and the rules the real service enforces.

use std::collections::{BTreeMap, HashMap};

use axum::{
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{
    CreateConfig, CreatePropertyMapping, CreateRowFilter, CreateUserPermission, DatabaseConfig, NotionDatabase,
    NotionPage, NotionProperty, PropertyMapping, RowFilter, SyncLog, UpdateConfig, User, UserPermission,
};

/// Error answered as `{"detail": ...}`, the way the backend reports failures.
#[derive(Debug)]
pub struct HttpError {
    pub status: StatusCode,
    pub detail: Value,
}

impl HttpError {
    pub fn new(status: StatusCode, detail: &str) -> Self {
        Self {
            status,
            detail: Value::String(detail.to_string()),
        }
    }

    pub fn config_not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "Configuration not found")
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

struct Account {
    user: User,
    password: String,
    notion_token: Option<String>,
}

#[derive(Default)]
pub struct MockState {
    accounts: Vec<Account>,
    sessions: HashMap<String, i64>,
    configs: BTreeMap<i64, DatabaseConfig>,
    sync_logs: Vec<SyncLog>,
    catalog: Catalog,
    last_id: i64,
}

impl MockState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    // --- auth ---

    pub fn register(&mut self, email: &str, password: &str) -> Result<User, HttpError> {
        if !is_plausible_email(email) {
            return Err(HttpError {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                detail: json!([{
                    "loc": ["body", "email"],
                    "msg": "value is not a valid email address",
                    "type": "value_error",
                }]),
            });
        }
        if self.accounts.iter().any(|a| a.user.email == email) {
            return Err(HttpError::new(StatusCode::BAD_REQUEST, "Email already registered"));
        }
        let user = User {
            id: self.next_id(),
            email: email.to_string(),
            notion_workspace_id: None,
            created_at: Utc::now(),
        };
        self.accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
            notion_token: None,
        });
        Ok(user)
    }

    /// Issue a fresh opaque bearer token.
    pub fn login(&mut self, email: &str, password: &str) -> Result<String, HttpError> {
        let user_id = self
            .accounts
            .iter()
            .find(|a| a.user.email == email && a.password == password)
            .map(|a| a.user.id)
            .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "Incorrect email or password"))?;
        let token = Uuid::new_v4().to_string();
        self.sessions.insert(token.clone(), user_id);
        Ok(token)
    }

    /// Resolve the `Authorization: Bearer` header to a user id.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<i64, HttpError> {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "Not authenticated"))?;
        self.sessions
            .get(token)
            .copied()
            .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }

    pub fn user(&self, user_id: i64) -> Result<User, HttpError> {
        self.account(user_id).map(|a| a.user.clone())
    }

    pub fn save_notion_token(&mut self, user_id: i64, token: &str, workspace_id: Option<&str>) -> Result<(), HttpError> {
        let account = self
            .accounts
            .iter_mut()
            .find(|a| a.user.id == user_id)
            .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "Could not validate credentials"))?;
        account.notion_token = Some(token.to_string());
        if let Some(workspace_id) = workspace_id.filter(|id| !id.is_empty()) {
            account.user.notion_workspace_id = Some(workspace_id.to_string());
        }
        Ok(())
    }

    fn account(&self, user_id: i64) -> Result<&Account, HttpError> {
        self.accounts
            .iter()
            .find(|a| a.user.id == user_id)
            .ok_or_else(|| HttpError::new(StatusCode::UNAUTHORIZED, "Could not validate credentials"))
    }

    // --- Notion catalog ---

    fn require_notion(&self, user_id: i64) -> Result<(), HttpError> {
        match self.account(user_id)?.notion_token {
            Some(_) => Ok(()),
            None => Err(HttpError::new(StatusCode::BAD_REQUEST, "Notion token not configured")),
        }
    }

    pub fn list_databases(&self, user_id: i64) -> Result<Vec<NotionDatabase>, HttpError> {
        self.require_notion(user_id)?;
        Ok(self
            .catalog
            .databases
            .iter()
            .map(|db| NotionDatabase {
                properties: Vec::new(),
                ..db.clone()
            })
            .collect())
    }

    pub fn database_structure(&self, user_id: i64, db_id: &str) -> Result<NotionDatabase, HttpError> {
        self.require_notion(user_id)?;
        self.catalog
            .databases
            .iter()
            .find(|db| db.id == db_id)
            .cloned()
            .ok_or_else(|| HttpError::new(StatusCode::NOT_FOUND, "Database not found"))
    }

    pub fn search_pages(&self, user_id: i64, query: &str) -> Result<Vec<NotionPage>, HttpError> {
        self.require_notion(user_id)?;
        let needle = query.to_lowercase();
        Ok(self
            .catalog
            .pages
            .iter()
            .filter(|page| page.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    // --- configs ---

    pub fn list_configs(&self, user_id: i64) -> Vec<DatabaseConfig> {
        self.configs
            .values()
            .filter(|c| c.owner_user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn config(&self, user_id: i64, config_id: i64) -> Result<&DatabaseConfig, HttpError> {
        self.configs
            .get(&config_id)
            .filter(|c| c.owner_user_id == user_id)
            .ok_or_else(HttpError::config_not_found)
    }

    fn config_mut(&mut self, user_id: i64, config_id: i64) -> Result<&mut DatabaseConfig, HttpError> {
        self.configs
            .get_mut(&config_id)
            .filter(|c| c.owner_user_id == user_id)
            .ok_or_else(HttpError::config_not_found)
    }

    pub fn create_config(&mut self, user_id: i64, input: CreateConfig) -> DatabaseConfig {
        let config_id = self.next_id();
        let property_mappings = input
            .property_mappings
            .into_iter()
            .map(|mapping| self.new_mapping(config_id, mapping))
            .collect();
        let row_filters: Vec<RowFilter> = input
            .row_filters
            .into_iter()
            .map(|filter| self.new_filter(config_id, filter))
            .collect();
        let user_permissions = input
            .user_permissions
            .into_iter()
            .map(|permission| self.new_permission(config_id, permission, &row_filters))
            .collect();
        let config = DatabaseConfig {
            id: config_id,
            owner_user_id: user_id,
            source_database_id: input.source_database_id,
            parent_page_id: Some(input.parent_page_id),
            config_name: input.config_name,
            sync_enabled: input.sync_enabled,
            sync_interval_minutes: input.sync_interval_minutes,
            last_sync_at: None,
            created_at: Utc::now(),
            property_mappings,
            row_filters,
            user_permissions,
        };
        self.configs.insert(config_id, config.clone());
        config
    }

    pub fn update_config(&mut self, user_id: i64, config_id: i64, input: UpdateConfig) -> Result<DatabaseConfig, HttpError> {
        let config = self.config_mut(user_id, config_id)?;
        if let Some(name) = input.config_name {
            config.config_name = name;
        }
        if let Some(enabled) = input.sync_enabled {
            config.sync_enabled = enabled;
        }
        if let Some(interval) = input.sync_interval_minutes {
            config.sync_interval_minutes = interval;
        }
        if let Some(parent) = input.parent_page_id {
            config.parent_page_id = Some(parent);
        }
        Ok(config.clone())
    }

    pub fn delete_config(&mut self, user_id: i64, config_id: i64) -> Result<(), HttpError> {
        self.config(user_id, config_id)?;
        self.configs.remove(&config_id);
        self.sync_logs.retain(|log| log.config_id != config_id);
        Ok(())
    }

    pub fn add_property_mapping(
        &mut self,
        user_id: i64,
        config_id: i64,
        input: CreatePropertyMapping,
    ) -> Result<PropertyMapping, HttpError> {
        self.config(user_id, config_id)?;
        let mapping = self.new_mapping(config_id, input);
        self.config_mut(user_id, config_id)?.property_mappings.push(mapping.clone());
        Ok(mapping)
    }

    pub fn add_row_filter(&mut self, user_id: i64, config_id: i64, input: CreateRowFilter) -> Result<RowFilter, HttpError> {
        self.config(user_id, config_id)?;
        let filter = self.new_filter(config_id, input);
        self.config_mut(user_id, config_id)?.row_filters.push(filter.clone());
        Ok(filter)
    }

    pub fn add_user_permission(
        &mut self,
        user_id: i64,
        config_id: i64,
        input: CreateUserPermission,
    ) -> Result<UserPermission, HttpError> {
        let filters = self.config(user_id, config_id)?.row_filters.clone();
        let permission = self.new_permission(config_id, input, &filters);
        self.config_mut(user_id, config_id)?.user_permissions.push(permission.clone());
        Ok(permission)
    }

    fn new_mapping(&mut self, config_id: i64, input: CreatePropertyMapping) -> PropertyMapping {
        PropertyMapping {
            id: self.next_id(),
            config_id,
            property_name: input.property_name,
            property_type: input.property_type,
            is_visible: input.is_visible,
            is_writable: input.is_writable,
            created_at: Utc::now(),
        }
    }

    fn new_filter(&mut self, config_id: i64, input: CreateRowFilter) -> RowFilter {
        RowFilter {
            id: self.next_id(),
            config_id,
            filter_type: input.filter_type,
            property_name: input.property_name,
            operator: input.operator,
            value: input.value,
            formula: input.formula,
            created_at: Utc::now(),
        }
    }

    /// Permission linked to the subset of `filters` named by `row_filter_ids`.
    fn new_permission(&mut self, config_id: i64, input: CreateUserPermission, filters: &[RowFilter]) -> UserPermission {
        let row_filters = filters
            .iter()
            .filter(|f| input.row_filter_ids.contains(&f.id))
            .cloned()
            .collect();
        UserPermission {
            id: self.next_id(),
            config_id,
            user_email: input.user_email,
            access_level: input.access_level,
            user_page_id: None,
            target_database_id: None,
            notified: false,
            created_at: Utc::now(),
            row_filters,
        }
    }

    // --- sync ---

    /// Record a completed manual sync. Needs the owner's Notion token.
    pub fn trigger_sync(&mut self, user_id: i64, config_id: i64) -> Result<SyncLog, HttpError> {
        self.config(user_id, config_id)?;
        if self.require_notion(user_id).is_err() {
            return Err(HttpError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Sync failed: Notion token not configured",
            ));
        }
        let now = Utc::now();
        let log = SyncLog {
            id: self.next_id(),
            config_id,
            sync_type: Some("manual".to_string()),
            status: Some("success".to_string()),
            rows_created: 0,
            rows_updated: 0,
            rows_deleted: 0,
            error_message: None,
            started_at: now,
            completed_at: Some(now),
        };
        self.config_mut(user_id, config_id)?.last_sync_at = Some(now);
        self.sync_logs.push(log.clone());
        Ok(log)
    }

    /// Logs for a config, newest first.
    pub fn sync_logs(&self, user_id: i64, config_id: i64, limit: usize) -> Result<Vec<SyncLog>, HttpError> {
        self.config(user_id, config_id)?;
        Ok(self
            .sync_logs
            .iter()
            .rev()
            .filter(|log| log.config_id == config_id)
            .take(limit)
            .cloned()
            .collect())
    }

    pub fn set_sync_enabled(&mut self, user_id: i64, config_id: i64, enabled: bool) -> Result<(), HttpError> {
        self.config_mut(user_id, config_id)?.sync_enabled = enabled;
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Fixed Notion workspace every account sees once it has a Notion token.
struct Catalog {
    databases: Vec<NotionDatabase>,
    pages: Vec<NotionPage>,
}

impl Default for Catalog {
    fn default() -> Self {
        let property = |name: &str, kind: &str| {
            let mut config = serde_json::Map::new();
            config.insert("type".to_string(), json!(kind));
            config.insert(kind.to_string(), json!({}));
            NotionProperty {
                name: name.to_string(),
                kind: kind.to_string(),
                config: Value::Object(config),
            }
        };
        let database = |id: &str, title: &str, properties: Vec<NotionProperty>| NotionDatabase {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://www.notion.so/{}", id.replace('-', "")),
            properties,
        };
        let page = |id: &str, title: &str| NotionPage {
            id: id.to_string(),
            title: title.to_string(),
            url: format!("https://www.notion.so/{}", id.replace('-', "")),
        };
        Self {
            databases: vec![
                database(
                    "5b1c8f0e-0d0a-4c31-9a57-1f1d4b2e0001",
                    "Tasks",
                    vec![
                        property("Name", "title"),
                        property("Status", "select"),
                        property("Assignee", "people"),
                        property("Due", "date"),
                    ],
                ),
                database(
                    "5b1c8f0e-0d0a-4c31-9a57-1f1d4b2e0002",
                    "Contacts",
                    vec![property("Name", "title"), property("Email", "email")],
                ),
            ],
            pages: vec![
                page("9e4a7c21-3b6d-4f08-8c1e-2a7d5e6f0101", "Team Home"),
                page("9e4a7c21-3b6d-4f08-8c1e-2a7d5e6f0102", "Project Notes"),
                page("9e4a7c21-3b6d-4f08-8c1e-2a7d5e6f0103", "Client Portal"),
            ],
        }
    }
}

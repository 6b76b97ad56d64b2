//! Request and response DTOs for the NotionShare API.
//!
//! # Design
//! These mirror the backend's JSON schemas but are defined independently of
//! the mock-server crate; the integration tests catch drift between the two.
//! Optional server fields are `Option` with `#[serde(default)]` so that older
//! or trimmed responses still decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Body of `/auth/register` and `/auth/login`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Login response. Only `access_token` is required.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessToken {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub notion_workspace_id: Option<String>,
    #[serde(deserialize_with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
}

/// Plain acknowledgement, e.g. from `/auth/notion/token`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

// --- Notion catalog ---

/// A Notion database. Listings omit `properties`; `/structure` fills them in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotionDatabase {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub properties: Vec<NotionProperty>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotionProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Raw Notion property definition.
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotionPage {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DatabaseList {
    pub databases: Vec<NotionDatabase>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PageList {
    pub pages: Vec<NotionPage>,
}

// --- Sync configurations ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewPropertyMapping {
    pub property_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_type: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub is_writable: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PropertyMapping {
    pub id: i64,
    pub config_id: i64,
    pub property_name: String,
    #[serde(default)]
    pub property_type: Option<String>,
    pub is_visible: bool,
    pub is_writable: bool,
    #[serde(deserialize_with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
}

/// `filter_type` is one of `property_match`, `formula` or `manual_select`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewRowFilter {
    pub filter_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowFilter {
    pub id: i64,
    pub config_id: i64,
    pub filter_type: String,
    #[serde(default)]
    pub property_name: Option<String>,
    #[serde(default)]
    pub operator: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub formula: Option<String>,
    #[serde(deserialize_with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
}

/// `access_level` is `read` or `write`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewUserPermission {
    pub user_email: String,
    #[serde(default = "default_access_level")]
    pub access_level: String,
    #[serde(default)]
    pub row_filter_ids: Vec<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserPermission {
    pub id: i64,
    pub config_id: i64,
    pub user_email: String,
    pub access_level: String,
    #[serde(default)]
    pub user_page_id: Option<String>,
    #[serde(default)]
    pub target_database_id: Option<String>,
    pub notified: bool,
    #[serde(deserialize_with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub row_filters: Vec<RowFilter>,
}

/// Payload of `POST /configs/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewDatabaseConfig {
    pub source_database_id: String,
    pub parent_page_id: String,
    pub config_name: String,
    #[serde(default = "default_true")]
    pub sync_enabled: bool,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u32,
    #[serde(default)]
    pub property_mappings: Vec<NewPropertyMapping>,
    #[serde(default)]
    pub row_filters: Vec<NewRowFilter>,
    #[serde(default)]
    pub user_permissions: Vec<NewUserPermission>,
}

impl NewDatabaseConfig {
    /// Config with the backend's defaults: sync enabled every 15 minutes, no
    /// mappings, filters or permissions.
    pub fn new(
        config_name: impl Into<String>,
        source_database_id: impl Into<String>,
        parent_page_id: impl Into<String>,
    ) -> Self {
        Self {
            source_database_id: source_database_id.into(),
            parent_page_id: parent_page_id.into(),
            config_name: config_name.into(),
            sync_enabled: true,
            sync_interval_minutes: default_sync_interval(),
            property_mappings: Vec::new(),
            row_filters: Vec::new(),
            user_permissions: Vec::new(),
        }
    }
}

/// Payload of `PUT /configs/{id}`. Only the fields present are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfigUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync_interval_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_page_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub id: i64,
    pub owner_user_id: i64,
    pub source_database_id: String,
    #[serde(default)]
    pub parent_page_id: Option<String>,
    pub config_name: String,
    pub sync_enabled: bool,
    pub sync_interval_minutes: u32,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub last_sync_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::required")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub property_mappings: Vec<PropertyMapping>,
    #[serde(default)]
    pub row_filters: Vec<RowFilter>,
    #[serde(default)]
    pub user_permissions: Vec<UserPermission>,
}

// --- Sync ---

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncTrigger {
    pub message: String,
    #[serde(default)]
    pub sync_log_id: Option<i64>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncStatus {
    pub config_id: i64,
    pub sync_enabled: bool,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub last_sync_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latest_sync_log: Option<SyncLog>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncLog {
    pub id: i64,
    pub config_id: i64,
    /// `manual`, `scheduled` or `webhook`.
    #[serde(default)]
    pub sync_type: Option<String>,
    /// `success`, `error` or `partial`.
    #[serde(default)]
    pub status: Option<String>,
    pub rows_created: u32,
    pub rows_updated: u32,
    pub rows_deleted: u32,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(deserialize_with = "timestamp::required")]
    pub started_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncToggle {
    pub message: String,
    pub config_id: i64,
    pub sync_enabled: bool,
}

/// Timestamp decoding that accepts RFC 3339 with an offset or a naive ISO
/// 8601 date-time, which is read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, ParseError, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    fn parse(raw: &str) -> Result<DateTime<Utc>, ParseError> {
        match DateTime::parse_from_rfc3339(raw) {
            Ok(at) => Ok(at.with_timezone(&Utc)),
            Err(_) => NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|at| at.and_utc()),
        }
    }

    pub(super) fn required<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).map_err(D::Error::custom)
    }

    pub(super) fn optional<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse(&raw).map_err(D::Error::custom))
            .transpose()
    }
}

fn default_true() -> bool {
    true
}

fn default_sync_interval() -> u32 {
    15
}

fn default_access_level() -> String {
    "read".to_string()
}

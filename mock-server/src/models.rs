//! Wire types of the mock NotionShare API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub notion_workspace_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotionProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub config: serde_json::Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotionDatabase {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub properties: Vec<NotionProperty>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotionPage {
    pub id: String,
    pub title: String,
    pub url: String,
}

#[derive(Deserialize)]
pub struct CreatePropertyMapping {
    pub property_name: String,
    pub property_type: Option<String>,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub is_writable: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PropertyMapping {
    pub id: i64,
    pub config_id: i64,
    pub property_name: String,
    pub property_type: Option<String>,
    pub is_visible: bool,
    pub is_writable: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateRowFilter {
    pub filter_type: String,
    pub property_name: Option<String>,
    pub operator: Option<String>,
    pub value: Option<String>,
    pub formula: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RowFilter {
    pub id: i64,
    pub config_id: i64,
    pub filter_type: String,
    pub property_name: Option<String>,
    pub operator: Option<String>,
    pub value: Option<String>,
    pub formula: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct CreateUserPermission {
    pub user_email: String,
    #[serde(default = "default_access_level")]
    pub access_level: String,
    #[serde(default)]
    pub row_filter_ids: Vec<i64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserPermission {
    pub id: i64,
    pub config_id: i64,
    pub user_email: String,
    pub access_level: String,
    pub user_page_id: Option<String>,
    pub target_database_id: Option<String>,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
    pub row_filters: Vec<RowFilter>,
}

#[derive(Deserialize)]
pub struct CreateConfig {
    pub source_database_id: String,
    pub parent_page_id: String,
    pub config_name: String,
    #[serde(default = "default_true")]
    pub sync_enabled: bool,
    #[serde(default = "default_sync_interval")]
    pub sync_interval_minutes: u32,
    #[serde(default)]
    pub property_mappings: Vec<CreatePropertyMapping>,
    #[serde(default)]
    pub row_filters: Vec<CreateRowFilter>,
    #[serde(default)]
    pub user_permissions: Vec<CreateUserPermission>,
}

#[derive(Deserialize)]
pub struct UpdateConfig {
    pub config_name: Option<String>,
    pub sync_enabled: Option<bool>,
    pub sync_interval_minutes: Option<u32>,
    pub parent_page_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub id: i64,
    pub owner_user_id: i64,
    pub source_database_id: String,
    pub parent_page_id: Option<String>,
    pub config_name: String,
    pub sync_enabled: bool,
    pub sync_interval_minutes: u32,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub property_mappings: Vec<PropertyMapping>,
    pub row_filters: Vec<RowFilter>,
    pub user_permissions: Vec<UserPermission>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncLog {
    pub id: i64,
    pub config_id: i64,
    pub sync_type: Option<String>,
    pub status: Option<String>,
    pub rows_created: u32,
    pub rows_updated: u32,
    pub rows_deleted: u32,
    pub error_message: Option<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncTrigger {
    pub message: String,
    pub sync_log_id: Option<i64>,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncStatus {
    pub config_id: i64,
    pub sync_enabled: bool,
    pub last_sync_at: Option<DateTime<Utc>>,
    pub latest_sync_log: Option<SyncLog>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SyncToggle {
    pub message: String,
    pub config_id: i64,
    pub sync_enabled: bool,
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

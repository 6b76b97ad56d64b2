//! Async API client core for the NotionShare backend.
//!
//! # Overview
//! `ApiClient` wraps the `/api/v1` surface: authentication, Notion database
//! discovery, sync configurations and sync runs. It attaches the bearer token
//! obtained at login to every request and turns failed responses into
//! `ApiError`s carrying the server's `detail` message.
//!
//! # Design
//! - Requests and responses are plain data (`HttpRequest`, `HttpResponse`).
//!   `build_request` and `parse_response` are pure; `send` runs one
//!   `Transport::execute` between them.
//! - `Transport` is the only I/O seam. `UreqTransport` is bundled; tests plug
//!   in stubs.
//! - The token is the only mutable state. It is restored from a `TokenStore`
//!   at construction and changed only by `login` and `logout`.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod store;
pub mod transport;
pub mod types;

pub use client::{ApiClient, DEFAULT_SYNC_LOG_LIMIT};
pub use config::ClientConfig;
pub use error::{ApiError, GENERIC_ERROR_MESSAGE};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use store::{FileTokenStore, MemoryTokenStore, StoreError, TokenStore, TOKEN_STORAGE_KEY};
pub use transport::{Transport, TransportError, UreqTransport};
pub use types::{
    AccessToken, Credentials, DatabaseConfig, DatabaseConfigUpdate, Message, NewDatabaseConfig, NewPropertyMapping,
    NewRowFilter, NewUserPermission, NotionDatabase, NotionPage, NotionProperty, PropertyMapping, RowFilter, SyncLog,
    SyncStatus, SyncToggle, SyncTrigger, User, UserPermission,
};

//! End-to-end tests against the live mock server.
//!
//! # Design
//! Each test starts the mock server on a random port and drives it through
//! `ApiClient` over real HTTP with `UreqTransport`. This validates request
//! building, the transport, and response parsing together, and catches schema
//! drift between the client DTOs and the server.

use notionshare_core::{
    ApiClient, ApiError, ClientConfig, DatabaseConfigUpdate, FileTokenStore, MemoryTokenStore, NewDatabaseConfig,
    NewPropertyMapping, NewRowFilter, NewUserPermission, TokenStore, UreqTransport, DEFAULT_SYNC_LOG_LIMIT,
};

/// Start the mock server on a random port and return the API base URL.
async fn start_server() -> ClientConfig {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    ClientConfig::new(&format!("http://{addr}{}", mock_server::API_PREFIX))
}

fn memory_client(config: ClientConfig) -> ApiClient<UreqTransport> {
    ApiClient::new(config, UreqTransport::new(), MemoryTokenStore::new())
}

#[tokio::test(flavor = "multi_thread")]
async fn full_session_lifecycle() {
    let config = start_server().await;
    let dir = tempfile::tempdir().unwrap();
    let session_file = dir.path().join("session.json");

    // Step 1: register and log in; the token lands in the file store.
    let client = ApiClient::new(config.clone(), UreqTransport::new(), FileTokenStore::new(&session_file));
    assert!(!client.is_authenticated());
    let user = client.register("owner@example.com", "pw").await.unwrap();
    assert_eq!(user.email, "owner@example.com");

    let token = client.login("owner@example.com", "pw").await.unwrap();
    assert_eq!(token.token_type.as_deref(), Some("bearer"));
    assert_eq!(client.token(), Some(token.access_token.clone()));
    assert_eq!(client.store().load().unwrap(), Some(token.access_token.clone()));

    // Step 2: a fresh client on the same file resumes the session.
    let client = ApiClient::new(config, UreqTransport::new(), FileTokenStore::new(&session_file));
    assert_eq!(client.token(), Some(token.access_token.clone()));
    let me = client.current_user().await.unwrap();
    assert_eq!(me.id, user.id);

    // Step 3: connect Notion and browse the catalog.
    let err = client.list_databases().await.unwrap_err();
    assert_eq!(err.to_string(), "Notion token not configured");

    let ack = client.save_notion_token("secret_abc 123", Some("ws-1")).await.unwrap();
    assert_eq!(ack.message, "Notion token saved successfully");
    assert_eq!(client.current_user().await.unwrap().notion_workspace_id.as_deref(), Some("ws-1"));

    let databases = client.list_databases().await.unwrap();
    assert_eq!(databases.len(), 2);
    assert!(databases.iter().all(|db| db.properties.is_empty()));

    let structure = client.database_structure(&databases[0].id).await.unwrap();
    assert_eq!(structure.title, databases[0].title);
    assert!(!structure.properties.is_empty());

    let pages = client.search_pages("project notes").await.unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].title, "Project Notes");
    assert_eq!(client.search_pages("").await.unwrap().len(), 3);

    // Step 4: create and extend a config.
    let mut new_config = NewDatabaseConfig::new("Team view", databases[0].id.clone(), pages[0].id.clone());
    new_config.property_mappings.push(NewPropertyMapping {
        property_name: "Status".to_string(),
        property_type: Some("select".to_string()),
        is_visible: true,
        is_writable: false,
    });
    let created = client.create_config(&new_config).await.unwrap();
    assert_eq!(created.config_name, "Team view");
    assert_eq!(created.owner_user_id, user.id);
    assert_eq!(created.property_mappings.len(), 1);
    let id = created.id;

    let filter = client
        .add_row_filter(
            id,
            &NewRowFilter {
                filter_type: "property_match".to_string(),
                property_name: Some("Status".to_string()),
                operator: Some("equals".to_string()),
                value: Some("Done".to_string()),
                formula: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(filter.config_id, id);

    let permission = client
        .add_user_permission(
            id,
            &NewUserPermission {
                user_email: "guest@example.com".to_string(),
                access_level: "read".to_string(),
                row_filter_ids: vec![filter.id],
            },
        )
        .await
        .unwrap();
    assert_eq!(permission.row_filters, vec![filter]);

    let mapping = client
        .add_property_mapping(
            id,
            &NewPropertyMapping {
                property_name: "Due".to_string(),
                property_type: None,
                is_visible: true,
                is_writable: true,
            },
        )
        .await
        .unwrap();
    assert!(mapping.is_writable);

    // Step 5: update and read back.
    let update = DatabaseConfigUpdate {
        config_name: Some("Renamed".to_string()),
        sync_interval_minutes: Some(60),
        ..Default::default()
    };
    let updated = client.update_config(id, &update).await.unwrap();
    assert_eq!(updated.config_name, "Renamed");
    assert_eq!(updated.sync_interval_minutes, 60);
    assert!(updated.sync_enabled);

    let fetched = client.get_config(id).await.unwrap();
    assert_eq!(fetched, updated);
    assert_eq!(client.list_configs().await.unwrap(), vec![fetched]);

    // Step 6: sync.
    let status = client.sync_status(id).await.unwrap();
    assert!(status.latest_sync_log.is_none());

    let first = client.trigger_sync(id).await.unwrap();
    let second = client.trigger_sync(id).await.unwrap();
    assert_eq!(second.status, "success");

    let logs = client.sync_logs(id, DEFAULT_SYNC_LOG_LIMIT).await.unwrap();
    let log_ids: Vec<i64> = logs.iter().map(|log| log.id).collect();
    assert_eq!(log_ids, vec![second.sync_log_id.unwrap(), first.sync_log_id.unwrap()]);
    assert_eq!(client.sync_logs(id, 1).await.unwrap().len(), 1);

    let status = client.sync_status(id).await.unwrap();
    assert_eq!(status.latest_sync_log.map(|log| log.id), second.sync_log_id);
    assert!(status.last_sync_at.is_some());

    let toggle = client.toggle_sync(id, false).await.unwrap();
    assert_eq!(toggle.message, "Sync disabled successfully");
    assert!(!client.sync_status(id).await.unwrap().sync_enabled);

    // Step 7: delete.
    client.delete_config(id).await.unwrap();
    let err = client.get_config(id).await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Configuration not found");

    // Step 8: logout drops the token everywhere.
    client.logout();
    assert!(!client.is_authenticated());
    assert_eq!(FileTokenStore::new(&session_file).load().unwrap(), None);
    let err = client.current_user().await.unwrap_err();
    assert!(err.is_unauthorized());
    assert_eq!(err.to_string(), "Not authenticated");
}

#[tokio::test(flavor = "multi_thread")]
async fn server_errors_carry_detail() {
    let client = memory_client(start_server().await);

    client.register("dup@example.com", "pw").await.unwrap();
    let err = client.register("dup@example.com", "pw").await.unwrap_err();
    assert!(matches!(&err, ApiError::Http { status: 400, .. }));
    assert_eq!(err.to_string(), "Email already registered");

    let err = client.register("not-an-email", "pw").await.unwrap_err();
    assert_eq!(err.status(), Some(422));
    assert!(err.to_string().contains("value is not a valid email address"));

    let err = client.login("dup@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.to_string(), "Incorrect email or password");
    assert!(!client.is_authenticated());
}

#[tokio::test(flavor = "multi_thread")]
async fn configs_are_scoped_to_their_owner() {
    let config = start_server().await;
    let alice = memory_client(config.clone());
    let bob = memory_client(config);

    alice.register("alice@example.com", "pw").await.unwrap();
    alice.login("alice@example.com", "pw").await.unwrap();
    bob.register("bob@example.com", "pw").await.unwrap();
    bob.login("bob@example.com", "pw").await.unwrap();

    let created = alice
        .create_config(&NewDatabaseConfig::new("Private", "db-1", "p-1"))
        .await
        .unwrap();

    assert!(bob.get_config(created.id).await.unwrap_err().is_not_found());
    assert!(bob.list_configs().await.unwrap().is_empty());
    assert_eq!(alice.list_configs().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_requests_share_one_client() {
    let client = memory_client(start_server().await);
    client.register("c@example.com", "pw").await.unwrap();
    client.login("c@example.com", "pw").await.unwrap();

    let (me, configs, missing) = tokio::join!(client.current_user(), client.list_configs(), client.get_config(404));
    assert_eq!(me.unwrap().email, "c@example.com");
    assert!(configs.unwrap().is_empty());
    assert!(missing.unwrap_err().is_not_found());
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_server_is_a_transport_error() {
    let addr = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap();
    let client = memory_client(ClientConfig::new(&format!("http://{addr}/api/v1")));

    let err = client.list_configs().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert_eq!(err.status(), None);
}

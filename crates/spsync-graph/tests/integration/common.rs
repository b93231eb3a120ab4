//! Shared test helpers for Graph API integration tests
//!
//! Each helper mounts the endpoints a document library needs to open and
//! returns a client or library pointing at the mock server.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use spsync_core::ports::TokenProvider;
use spsync_graph::auth::StaticToken;
use spsync_graph::{ApiClient, DocumentLibrary};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const HOST: &str = "contoso.sharepoint.com";
pub const SITE: &str = "archive";
pub const LIBRARY: &str = "Documents";
pub const LIBRARY_ID: &str = "list-001";
pub const DRIVE_ID: &str = "drive-001";

/// `GET` path of the site's list collection
pub fn lists_path() -> String {
    format!("/sites/{HOST}:/sites/{SITE}:/lists")
}

/// Path of the library's column collection
pub fn columns_path() -> String {
    format!("{}/{LIBRARY_ID}/columns", lists_path())
}

/// Hands out `token-1`, `token-2`, ... and counts the calls
#[derive(Default)]
pub struct CountingTokens {
    calls: AtomicUsize,
}

impl CountingTokens {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TokenProvider for CountingTokens {
    async fn access_token(&self) -> anyhow::Result<Option<String>> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Some(format!("token-{n}")))
    }
}

/// Client with a fixed token against a fresh mock server
pub async fn setup_client() -> (MockServer, ApiClient) {
    let server = MockServer::start().await;
    let client = ApiClient::with_base_url(Arc::new(StaticToken::new("test-token")), server.uri());
    (server, client)
}

/// Mounts the list lookup and drive lookup for [`LIBRARY`]
pub async fn mount_library(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(lists_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"id": "list-other", "name": "Site Pages", "displayName": "Site Pages"},
                {"id": LIBRARY_ID, "name": LIBRARY, "displayName": "Documents"}
            ]
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{}/{LIBRARY_ID}/drive", lists_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": DRIVE_ID,
            "driveType": "documentLibrary"
        })))
        .mount(server)
        .await;
}

/// Opens [`LIBRARY`] against a fresh mock server
pub async fn setup_library() -> (MockServer, DocumentLibrary) {
    let (server, client) = setup_client().await;
    mount_library(&server).await;
    let library = DocumentLibrary::open(client, HOST, SITE, LIBRARY)
        .await
        .expect("library should open");
    (server, library)
}

/// Mounts a folder creation endpoint under `parent` (`None` for the root)
pub async fn mount_folder(server: &MockServer, parent: Option<&str>, id: &str) {
    let endpoint = match parent {
        None => format!("/sites/{HOST}/drives/{DRIVE_ID}/root/children"),
        Some(parent) => format!("/sites/{HOST}/drives/{DRIVE_ID}/items/{parent}/children"),
    };
    Mock::given(method("POST"))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": id,
            "folder": {"childCount": 0}
        })))
        .mount(server)
        .await;
}

/// Graph-style error body
pub fn error_body(code: &str) -> serde_json::Value {
    json!({"error": {"code": code, "message": "mocked failure"}})
}

//! DocumentLibrary: resolution, folders, uploads, annotation and loaders

use std::sync::Arc;

use serde_json::json;
use spsync_core::domain::{AttrValue, Attributes};
use spsync_core::ports::DocumentStore;
use spsync_graph::loaders::{FileLoader, FILE_SOURCE};
use spsync_graph::{DocumentLibrary, GraphError};
use wiremock::matchers::{body_bytes, body_json, body_partial_json, header, method, path};
use wiremock::{Mock, ResponseTemplate};

use crate::common::{self, DRIVE_ID, HOST, LIBRARY, LIBRARY_ID, SITE};

fn attrs(pairs: &[(&str, &str)]) -> Attributes {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), AttrValue::from(*v)))
        .collect()
}

// ============================================================================
// Resolution
// ============================================================================

#[tokio::test]
async fn test_open_resolves_library_and_drive() {
    let (_server, library) = common::setup_library().await;

    let handle = library.handle();
    assert_eq!(handle.host(), HOST);
    assert_eq!(handle.site(), SITE);
    assert_eq!(handle.library_id().as_str(), LIBRARY_ID);
    assert_eq!(handle.drive_id().as_str(), DRIVE_ID);
}

#[tokio::test]
async fn test_open_unknown_library_fails() {
    let (server, client) = common::setup_client().await;
    common::mount_library(&server).await;

    let err = DocumentLibrary::open(client, HOST, SITE, "Missing Library")
        .await
        .unwrap_err();
    match err {
        GraphError::LibraryNotFound { library, site } => {
            assert_eq!(library, "Missing Library");
            assert_eq!(site, SITE);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_open_scans_every_list_page() {
    let (server, client) = common::setup_client().await;

    Mock::given(method("GET"))
        .and(path(common::lists_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "list-a", "name": "Site Pages"}],
            "@odata.nextLink": format!("{}/lists-page-2", server.uri())
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/lists-page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{"id": "list-b", "name": LIBRARY}]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/list-b/drive", common::lists_path())))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "drive-b"})))
        .mount(&server)
        .await;

    let library = DocumentLibrary::open(client, HOST, SITE, LIBRARY).await.unwrap();
    assert_eq!(library.handle().drive_id().as_str(), "drive-b");
}

// ============================================================================
// Folders
// ============================================================================

#[tokio::test]
async fn test_mkdir_is_idempotent() {
    let (server, mut library) = common::setup_library().await;

    Mock::given(method("POST"))
        .and(path(format!("/sites/{HOST}/drives/{DRIVE_ID}/root/children")))
        .and(body_json(json!({
            "name": "Reports",
            "folder": {},
            "@microsoft.graph.conflictBehavior": "replace"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "folder-reports"})))
        .expect(2)
        .mount(&server)
        .await;

    let first = library.mkdir("/Reports", false).await.unwrap();
    let second = library.mkdir("Reports", false).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(library.cached_id("/Reports"), Some(&first));
}

#[tokio::test]
async fn test_mkdir_child_under_cached_parent() {
    let (server, mut library) = common::setup_library().await;
    common::mount_folder(&server, None, "folder-a").await;
    common::mount_folder(&server, Some("folder-a"), "folder-b").await;

    library.mkdir("/a", false).await.unwrap();
    let id = library.mkdir("/a/b", false).await.unwrap();
    assert_eq!(id.as_str(), "folder-b");
}

#[tokio::test]
async fn test_mkdir_missing_parent_without_make_parents() {
    let (server, mut library) = common::setup_library().await;

    let err = library.mkdir("/a/b/c", false).await.unwrap_err();
    assert!(matches!(
        err,
        GraphError::ParentNotResolved { ref parent, .. } if parent == "/a/b"
    ));

    // Only the two lookups made while opening reached the server
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_mkdir_make_parents_creates_chain() {
    let (server, mut library) = common::setup_library().await;
    common::mount_folder(&server, None, "folder-a").await;
    common::mount_folder(&server, Some("folder-a"), "folder-b").await;
    common::mount_folder(&server, Some("folder-b"), "folder-c").await;

    let id = library.mkdir("/a/b/c", true).await.unwrap();
    assert_eq!(id.as_str(), "folder-c");
    assert_eq!(library.cached_id("/a").unwrap().as_str(), "folder-a");
    assert_eq!(library.cached_id("/a/b").unwrap().as_str(), "folder-b");
}

#[tokio::test]
async fn test_mkdir_sanitizes_components() {
    let (server, mut library) = common::setup_library().await;

    Mock::given(method("POST"))
        .and(path(format!("/sites/{HOST}/drives/{DRIVE_ID}/root/children")))
        .and(body_partial_json(json!({"name": "Q1_ sales_draft"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "folder-q1"})))
        .expect(1)
        .mount(&server)
        .await;

    library.mkdir("/Q1: sales?draft", false).await.unwrap();
    assert!(library.cached_id("/Q1_ sales_draft").is_some());
}

#[tokio::test]
async fn test_mkdir_rejects_empty_path() {
    let (_server, mut library) = common::setup_library().await;
    let err = library.mkdir("", false).await.unwrap_err();
    assert!(matches!(err, GraphError::InvalidPath(_)));
}

// ============================================================================
// Uploads
// ============================================================================

#[tokio::test]
async fn test_upload_to_root_and_under_folder() {
    let (server, mut library) = common::setup_library().await;
    common::mount_folder(&server, None, "folder-reports").await;

    let content = b"%PDF-1.7 quarterly numbers".to_vec();
    let local = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(local.path(), &content).unwrap();

    Mock::given(method("PUT"))
        .and(path(format!("/drives/{DRIVE_ID}/items/root:/top.pdf:/content")))
        .and(header("Content-Type", "application/octet-stream"))
        .and(body_bytes(content.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "file-top"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!(
            "/drives/{DRIVE_ID}/items/folder-reports:/Q1%20summary%20%28final%29.pdf:/content"
        )))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "file-q1"})))
        .expect(1)
        .mount(&server)
        .await;

    let top = library.upload(local.path(), "/top.pdf", false).await.unwrap();
    assert_eq!(top.as_str(), "file-top");

    library.mkdir("/Reports", false).await.unwrap();
    let q1 = library
        .upload(local.path(), "/Reports/Q1 summary (final).pdf", false)
        .await
        .unwrap();
    assert_eq!(q1.as_str(), "file-q1");
    assert_eq!(
        library.cached_id("/Reports/Q1 summary (final).pdf"),
        Some(&q1)
    );
}

#[tokio::test]
async fn test_upload_missing_local_file() {
    let (_server, mut library) = common::setup_library().await;

    let err = library
        .upload(std::path::Path::new("/nonexistent/spsync.pdf"), "/x.pdf", false)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::LocalFile { .. }));
}

#[tokio::test]
async fn test_upload_missing_local_file_creates_no_folders() {
    let (server, mut library) = common::setup_library().await;
    common::mount_folder(&server, None, "folder-a").await;

    let err = library
        .upload(std::path::Path::new("/nonexistent/spsync.txt"), "/a/f.txt", true)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::LocalFile { .. }));
    assert!(library.cached_id("/a").is_none());
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_upload_missing_parent_without_make_parents() {
    let (server, mut library) = common::setup_library().await;
    let local = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(local.path(), b"body").unwrap();

    let err = library
        .upload(local.path(), "/a/b/f.txt", false)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GraphError::ParentNotResolved { ref parent, .. } if parent == "/a/b"
    ));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_upload_make_parents_creates_chain() {
    let (server, mut library) = common::setup_library().await;
    common::mount_folder(&server, None, "fa").await;
    common::mount_folder(&server, Some("fa"), "fb").await;

    Mock::given(method("PUT"))
        .and(path(format!("/drives/{DRIVE_ID}/items/fb:/f_.txt:/content")))
        .and(body_bytes(b"body".to_vec()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "file-f"})))
        .expect(1)
        .mount(&server)
        .await;

    let local = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(local.path(), b"body").unwrap();

    let id = library
        .upload(local.path(), "/a/b/f#.txt", true)
        .await
        .unwrap();
    assert_eq!(id.as_str(), "file-f");
    assert_eq!(library.cached_id("/a").unwrap().as_str(), "fa");
    assert_eq!(library.cached_id("/a/b").unwrap().as_str(), "fb");

    let requests = server.received_requests().await.unwrap();
    let calls: Vec<_> = requests[2..]
        .iter()
        .map(|r| format!("{} {}", r.method, r.url.path()))
        .collect();
    assert_eq!(
        calls,
        vec![
            format!("POST /sites/{HOST}/drives/{DRIVE_ID}/root/children"),
            format!("POST /sites/{HOST}/drives/{DRIVE_ID}/items/fa/children"),
            format!("PUT /drives/{DRIVE_ID}/items/fb:/f_.txt:/content"),
        ]
    );
}

// ============================================================================
// Annotation
// ============================================================================

#[tokio::test]
async fn test_annotate_keeps_separators_and_de_aliases() {
    let (server, mut library) = common::setup_library().await;
    library.alias("title", "Title");
    library.alias("authors", "Author0");

    Mock::given(method("GET"))
        .and(path(format!("/drives/{DRIVE_ID}/items/root:/Reports/2024/q1.pdf")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "item-q1"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path(format!(
            "/sites/{HOST}/drives/{DRIVE_ID}/items/item-q1/listItem/fields"
        )))
        .and(body_json(json!({"Title": "Q1 report", "Author0": "Ada, Grace"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Title": "Q1 report",
            "Author0": "Ada, Grace"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut attributes = attrs(&[("title", " Q1 report "), ("unmapped", "dropped")]);
    attributes.insert("authors".into(), AttrValue::from(vec!["Ada", "Grace"]));

    let fields = library.annotate("Reports/2024/q1.pdf", &attributes).await.unwrap();
    assert_eq!(fields["Title"], "Q1 report");
}

// ============================================================================
// Loaders
// ============================================================================

#[tokio::test]
async fn test_load_uploads_then_annotates() {
    let (server, mut library) = common::setup_library().await;
    library.loader(FILE_SOURCE, Arc::new(FileLoader::new()));
    library.alias("title", "Title");

    let local = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(local.path(), b"minutes").unwrap();

    Mock::given(method("PUT"))
        .and(path(format!("/drives/{DRIVE_ID}/items/root:/minutes.txt:/content")))
        .and(body_bytes(b"minutes".to_vec()))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "file-m"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/drives/{DRIVE_ID}/items/root:/minutes.txt")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "file-m"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path(format!(
            "/sites/{HOST}/drives/{DRIVE_ID}/items/file-m/listItem/fields"
        )))
        .and(body_json(json!({"Title": "Minutes"})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let uri = format!("file://{}", local.path().display());
    library
        .load(FILE_SOURCE, &uri, "/minutes.txt", &attrs(&[("title", "Minutes")]), true)
        .await
        .unwrap();

    assert_eq!(library.clock_check().0, 1);
    assert_eq!(library.cached_id("/minutes.txt").unwrap().as_str(), "file-m");
}

#[tokio::test]
async fn test_load_failure_skips_annotation() {
    let (server, mut library) = common::setup_library().await;
    DocumentStore::register_loader(&mut library, FILE_SOURCE, Arc::new(FileLoader::new()));

    let err = library
        .load(FILE_SOURCE, "/nonexistent/spsync.txt", "/x.txt", &Attributes::new(), true)
        .await
        .unwrap_err();
    assert!(matches!(err, GraphError::Loader { .. }));
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_store_trait_reports_errors() {
    let (_server, mut library) = common::setup_library().await;
    let store: &mut dyn DocumentStore = &mut library;

    let err = store
        .load("ftp", "ftp://host/file", "/f.txt", &Attributes::new(), true)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("ftp"));
}

//! Column listing, creation, update and deletion

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common;

async fn mount_columns(server: &MockServer, expected_fetches: u64) {
    Mock::given(method("GET"))
        .and(path(common::columns_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                {"id": "col-title", "name": "Title", "displayName": "Title", "text": {}},
                {"id": "col-author", "name": "Author0", "displayName": "Author", "hidden": false}
            ]
        })))
        .expect(expected_fetches)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_list_columns_is_cached_until_reload() {
    let (server, mut library) = common::setup_library().await;
    mount_columns(&server, 2).await;

    let columns = library.list_columns(false).await.unwrap();
    assert_eq!(columns.len(), 2);
    assert_eq!(columns["Author0"].display_name.as_deref(), Some("Author"));
    assert!(columns["Title"].config.contains_key("text"));

    library.list_columns(false).await.unwrap();
    library.list_columns(true).await.unwrap();
}

#[tokio::test]
async fn test_create_column_posts_merged_definition() {
    let (server, mut library) = common::setup_library().await;
    mount_columns(&server, 1).await;

    Mock::given(method("POST"))
        .and(path(common::columns_path()))
        .and(body_partial_json(json!({
            "name": "Year",
            "displayName": "Publication year",
            "columnGroup": "Custom Columns",
            "required": false,
            "number": {"decimalPlaces": "none"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "col-year",
            "name": "Year",
            "displayName": "Publication year"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let created = library
        .create_column(
            "Year",
            &json!({"displayName": "Publication year", "number": {"decimalPlaces": "none"}}),
        )
        .await
        .unwrap();
    assert_eq!(created.id.as_str(), "col-year");

    // Stored in the cache and usable as an attribute key right away
    assert!(library.list_columns(false).await.unwrap().contains_key("Year"));
    assert_eq!(library.registry().alias_for("Year"), Some("Year"));
}

#[tokio::test]
async fn test_create_existing_column_patches() {
    let (server, mut library) = common::setup_library().await;
    mount_columns(&server, 1).await;

    Mock::given(method("PATCH"))
        .and(path(format!("{}/col-title", common::columns_path())))
        .and(body_partial_json(json!({"name": "Title", "indexed": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "col-title",
            "name": "Title",
            "indexed": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let updated = library
        .create_column("Title", &json!({"indexed": true}))
        .await
        .unwrap();
    assert_eq!(updated.config["indexed"], true);
}

#[tokio::test]
async fn test_delete_column_by_supplied_name() {
    let (server, mut library) = common::setup_library().await;
    mount_columns(&server, 1).await;

    Mock::given(method("DELETE"))
        .and(path(format!("{}/col-author", common::columns_path())))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    assert!(library.delete_column("Author0").await.unwrap());
    assert!(!library.list_columns(false).await.unwrap().contains_key("Author0"));

    // Already gone: no request
    assert!(!library.delete_column("Author0").await.unwrap());
}

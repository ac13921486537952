//! Note CRUD, search and the hooks they fire.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_create_and_read_note() {
    let app = TestApp::new().await;
    let created = app
        .request(
            "POST",
            "/api/notes",
            Some(json!({ "path": "ideas/first", "content": "---\ntitle: First\n---\nHello" })),
        )
        .await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["data"]["path"], "ideas/first.md");

    let read = app.request("GET", "/api/notes/ideas/first.md", None).await;
    assert_eq!(read.status, StatusCode::OK);
    assert_eq!(read.body["data"]["front_matter"]["title"], "First");
    assert_eq!(read.body["data"]["folder"], "ideas");

    let list = app.request("GET", "/api/notes", None).await;
    assert_eq!(list.body["data"][0]["path"], "ideas/first.md");
}

#[tokio::test]
async fn test_create_existing_note_conflicts() {
    let app = TestApp::new().await;
    app.seed_note("a.md", "x").await;
    let response = app
        .request("POST", "/api/notes", Some(json!({ "path": "a.md", "content": "y" })))
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_save_runs_pipeline_of_enabled_extensions() {
    let app = TestApp::new().await;
    app.seed_note("a.md", "x").await;

    let saved = app
        .request("PUT", "/api/notes/a.md", Some(json!({ "content": "body" })))
        .await;
    assert_eq!(saved.status, StatusCode::OK);
    assert_eq!(saved.body["data"]["content"], "body\n#tagged");

    app.toggle("tagger", false).await;
    let saved = app
        .request("PUT", "/api/notes/a.md", Some(json!({ "content": "plain" })))
        .await;
    assert_eq!(saved.body["data"]["content"], "plain");

    let missing = app
        .request("PUT", "/api/notes/ghost.md", Some(json!({ "content": "x" })))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_and_search_fire_observing_hooks() {
    let app = TestApp::new().await;
    app.seed_note("alpha.md", "graph theory notes").await;
    app.seed_note("beta.md", "cooking").await;

    let search = app.request("GET", "/api/search?q=graph", None).await;
    assert_eq!(search.status, StatusCode::OK);
    assert_eq!(search.body["data"]["results"][0]["path"], "alpha.md");

    let deleted = app.request("DELETE", "/api/notes/beta.md", None).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
    assert_eq!(
        app.request("GET", "/api/notes/beta.md", None).await.status,
        StatusCode::NOT_FOUND
    );

    assert_eq!(
        app.events(),
        vec!["search:graph:alpha.md".to_string(), "note_delete:beta.md".to_string()]
    );

    app.toggle("recorder", false).await;
    app.request("GET", "/api/search?q=graph", None).await;
    assert_eq!(app.events().len(), 2);
}

#[tokio::test]
async fn test_invalid_paths_are_rejected() {
    let app = TestApp::new().await;
    let response = app
        .request("POST", "/api/notes", Some(json!({ "path": "../escape", "content": "" })))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/api/health", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "ok");
    assert_eq!(response.body["data"]["extensions"], 3);
}

#[tokio::test]
async fn test_faulty_extension_does_not_block_later_ones() {
    for mode in ["fail", "panic"] {
        let broken = format!("factory = \"faulty\"\n[settings]\nmode = \"{mode}\"\n");
        let app = TestApp::with_manifests(&[
            ("broken", broken.as_str()),
            ("tagger", "factory = \"tagger\"\n"),
            ("recorder", "factory = \"recorder\"\n"),
        ])
        .await;
        app.seed_note("a.md", "x").await;

        let saved = app
            .request("PUT", "/api/notes/a.md", Some(json!({ "content": "body" })))
            .await;
        assert_eq!(saved.status, StatusCode::OK, "{mode}");
        assert_eq!(saved.body["data"]["content"], "body\n#tagged", "{mode}");

        let read = app.request("GET", "/api/notes/a.md", None).await;
        assert_eq!(read.status, StatusCode::OK, "{mode}");
        assert_eq!(read.body["data"]["content"], "body\n#tagged", "{mode}");

        let assets = app.request("GET", "/api/plugins/assets", None).await;
        assert_eq!(assets.status, StatusCode::OK, "{mode}");
        assert!(assets.body["script"].as_str().unwrap().contains("window.tagger = true;"));

        let deleted = app.request("DELETE", "/api/notes/a.md", None).await;
        assert_eq!(deleted.status, StatusCode::NO_CONTENT, "{mode}");
        assert_eq!(app.events(), vec!["note_delete:a.md".to_string()], "{mode}");
    }
}

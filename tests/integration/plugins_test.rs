//! Extension administration over HTTP.

use axum::http::StatusCode;
use serde_json::Value;

use crate::helpers::TestApp;

fn ids(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_str().unwrap().to_string())
        .collect()
}

fn mounted(body: &Value, id: &str) -> usize {
    body["data"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|r| r["extension_id"] == id)
        .count()
}

#[tokio::test]
async fn test_list_plugins() {
    let app = TestApp::new().await;
    let response = app.request("GET", "/api/plugins", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), vec!["enhanced_graph", "recorder", "tagger"]);

    let graph = &response.body["data"][0];
    assert_eq!(graph["name"], "Enhanced Graph Visualization");
    assert_eq!(graph["version"], "1.0.0");
    assert_eq!(graph["enabled"], true);
    assert_eq!(graph["has_routes"], true);
    assert_eq!(graph["has_assets"], true);
    assert_eq!(graph["hooks"], serde_json::json!(["startup"]));
    assert!(graph["load_error"].is_null());
}

#[tokio::test]
async fn test_toggle_unmounts_and_remounts_routes() {
    let app = TestApp::new().await;
    assert_eq!(
        app.request("GET", "/api/plugins/tagger/ping", None).await.body["pong"],
        "tagger"
    );

    let off = app.toggle("tagger", false).await;
    assert_eq!(off.status, StatusCode::OK);
    assert_eq!(off.body["data"]["enabled"], false);
    assert_eq!(
        app.request("GET", "/api/plugins/tagger/ping", None).await.status,
        StatusCode::NOT_FOUND
    );
    let routes = app.request("GET", "/api/plugins/routes", None).await;
    assert_eq!(mounted(&routes.body, "tagger"), 0);

    // Enabling twice must not duplicate the mount.
    app.toggle("tagger", true).await;
    app.toggle("tagger", true).await;
    assert_eq!(
        app.request("GET", "/api/plugins/tagger/ping", None).await.status,
        StatusCode::OK
    );
    let routes = app.request("GET", "/api/plugins/routes", None).await;
    assert_eq!(mounted(&routes.body, "tagger"), 1);
    assert_eq!(mounted(&routes.body, "enhanced_graph"), 3);
}

#[tokio::test]
async fn test_toggle_unknown_extension_is_not_found() {
    let app = TestApp::new().await;
    let response = app.toggle("nope", true).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_toggle_state_survives_restart() {
    let app = TestApp::new().await;
    app.toggle("tagger", false).await;

    let state: Value =
        serde_json::from_str(&tokio::fs::read_to_string(app.path().join("state.json")).await.unwrap())
            .unwrap();
    assert_eq!(state["tagger"], false);

    let app = app.restart().await;
    let list = app.request("GET", "/api/plugins", None).await;
    let tagger = list.body["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["id"] == "tagger")
        .cloned()
        .unwrap();
    assert_eq!(tagger["enabled"], false);
    assert_eq!(
        app.request("GET", "/api/plugins/tagger/ping", None).await.status,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn test_assets_follow_enabled_set() {
    let app = TestApp::new().await;

    let assets = app.request("GET", "/api/plugins/assets", None).await;
    let script = assets.body["script"].as_str().unwrap();
    assert!(script.contains("// --- extension: tagger ---"));
    assert!(script.contains("window.tagger = true;"));
    assert!(script.contains("window.enhancedGraphReady = true;"));
    assert!(assets.body["style"].as_str().unwrap().contains(".graph-node-previewed"));

    app.toggle("tagger", false).await;
    let script = app
        .request("GET", "/api/plugins/assets/script.js", None)
        .await;
    assert_eq!(script.status, StatusCode::OK);
    assert!(
        script
            .content_type
            .as_deref()
            .unwrap()
            .starts_with("application/javascript")
    );
    assert!(!script.text.contains("window.tagger"));

    let style = app.request("GET", "/api/plugins/assets/style.css", None).await;
    assert!(style.content_type.as_deref().unwrap().starts_with("text/css"));
}

#[tokio::test]
async fn test_rescan_registers_new_manifests() {
    let app = TestApp::with_manifests(&[("tagger", "factory = \"tagger\"\n")]).await;
    app.add_manifest("second", "factory = \"tagger\"\n").await;
    app.add_manifest("broken", "factory = \"missing\"\n").await;

    let response = app.request("POST", "/api/plugins/rescan", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(ids(&response.body), vec!["broken", "second"]);
    assert!(response.body["data"][0]["load_error"].is_string());

    assert_eq!(
        app.request("GET", "/api/plugins/second/ping", None).await.body["pong"],
        "second"
    );
    let again = app.request("POST", "/api/plugins/rescan", None).await;
    assert!(ids(&again.body).is_empty());
}

#[tokio::test]
async fn test_reload_keeps_routes_mounted() {
    let app = TestApp::new().await;
    let response = app.request("POST", "/api/plugins/tagger/reload", None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["id"], "tagger");
    assert_eq!(
        app.request("GET", "/api/plugins/tagger/ping", None).await.status,
        StatusCode::OK
    );

    let missing = app.request("POST", "/api/plugins/nope/reload", None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_paths_are_not_found() {
    let app = TestApp::new().await;
    for uri in ["/api/plugins/nope/ping", "/api/plugins/tagger/missing", "/elsewhere"] {
        assert_eq!(
            app.request("GET", uri, None).await.status,
            StatusCode::NOT_FOUND,
            "{uri}"
        );
    }
}

//! The enhanced graph extension served through the runtime.

use axum::http::StatusCode;
use serde_json::Value;

use crate::helpers::TestApp;

/// hub -> a, hub -> b, a -> c, c -> hub, root -> hub
async fn seeded() -> TestApp {
    let app = TestApp::new().await;
    app.seed_note("hub.md", "---\ntitle: Hub\n---\nSee [[a]] and [[b]].")
        .await;
    app.seed_note("a.md", "Leads to [[c]].").await;
    app.seed_note("b.md", "Dead end.").await;
    app.seed_note("c.md", "Back to [[hub]].").await;
    app.seed_note("root.md", "Start at [[hub]].").await;
    app
}

fn node_ids(body: &Value) -> Vec<&str> {
    body["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_enhanced_view_starts_at_roots_and_hubs() {
    let app = seeded().await;
    let response = app
        .request("GET", "/api/plugins/enhanced_graph/graph/enhanced?depth=1", None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(node_ids(&response.body), vec!["hub.md", "root.md"]);
    assert_eq!(response.body["nodes"][0]["label"], "Hub");
    assert_eq!(response.body["nodes"][0]["is_top_level"], true);
    assert!(response.body["session"].is_string());
}

#[tokio::test]
async fn test_expand_within_session() {
    let app = seeded().await;
    let view = app
        .request("GET", "/api/plugins/enhanced_graph/graph/enhanced?depth=1", None)
        .await;
    let session = view.body["session"].as_str().unwrap().to_string();

    let pinned = app
        .request(
            "GET",
            &format!(
                "/api/plugins/enhanced_graph/graph/node/hub.md?session={session}&kind=pinned&depth=1"
            ),
            None,
        )
        .await;
    assert_eq!(pinned.status, StatusCode::OK);
    assert_eq!(pinned.body["kind"], "pinned");
    assert_eq!(node_ids(&pinned.body), vec!["a.md", "b.md", "c.md", "root.md"]);

    let transient = app
        .request(
            "GET",
            &format!(
                "/api/plugins/enhanced_graph/graph/node/hub.md?session={session}&kind=transient&depth=1"
            ),
            None,
        )
        .await;
    assert_eq!(transient.body["nodes"], pinned.body["nodes"]);
    assert_eq!(transient.body["edges"], pinned.body["edges"]);

    let chained = app
        .request(
            "GET",
            &format!(
                "/api/plugins/enhanced_graph/graph/node/a.md?session={session}&depth=1&chain=hub.md"
            ),
            None,
        )
        .await;
    assert_eq!(node_ids(&chained.body), vec!["c.md"]);
}

#[tokio::test]
async fn test_expand_rejects_depth_above_ceiling() {
    let app = seeded().await;
    let response = app
        .request(
            "GET",
            "/api/plugins/enhanced_graph/graph/node/hub.md?depth=7",
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_session_lifecycle() {
    let app = seeded().await;
    let view = app
        .request("GET", "/api/plugins/enhanced_graph/graph/enhanced", None)
        .await;
    let session = view.body["session"].as_str().unwrap().to_string();

    let closed = app
        .request(
            "DELETE",
            &format!("/api/plugins/enhanced_graph/graph/session/{session}"),
            None,
        )
        .await;
    assert_eq!(closed.status, StatusCode::NO_CONTENT);

    let stale = app
        .request(
            "GET",
            &format!("/api/plugins/enhanced_graph/graph/node/hub.md?session={session}"),
            None,
        )
        .await;
    assert_eq!(stale.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_graph_routes_disappear_when_disabled() {
    let app = seeded().await;
    app.toggle("enhanced_graph", false).await;
    let response = app
        .request("GET", "/api/plugins/enhanced_graph/graph/enhanced", None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

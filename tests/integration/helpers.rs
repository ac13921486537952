//! Shared test helpers for integration tests.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use notegraph_api::{AppState, build_app};
use notegraph_core::config::{AppConfig, NotesConfig, PluginConfig};
use notegraph_notes::{FsNoteStore, NoteLinkGraphSource};
use notegraph_plugin::prelude::*;
use notegraph_plugin::{ExtensionCatalog, PluginManager};

/// Observing events seen by the recorder extension, as `hook:detail`.
pub type EventLog = Arc<Mutex<Vec<String>>>;

/// Appends a tag on save and serves `GET ping`.
#[derive(Debug)]
struct Tagger {
    id: String,
}

#[async_trait]
impl Extension for Tagger {
    fn info(&self) -> ExtensionInfo {
        ExtensionInfo::new("Tagger", "0.1.0")
    }

    fn hooks(&self) -> Vec<HookKind> {
        vec![HookKind::NoteSave]
    }

    fn has_routes(&self) -> bool {
        true
    }

    fn has_assets(&self) -> bool {
        true
    }

    async fn on_note_save(&self, _path: &str, content: &str) -> Result<HookOutcome, HookFault> {
        Ok(HookOutcome::Replaced(format!("{content}\n#tagged")))
    }

    fn frontend_assets(&self) -> FrontendAssets {
        FrontendAssets {
            script: Some("window.tagger = true;".to_string()),
            style: None,
        }
    }

    fn route_set(&self) -> Vec<RouteBinding> {
        let id = self.id.clone();
        vec![RouteBinding::get(
            "ping",
            handler_fn(move |_| {
                let id = id.clone();
                async move { RouteResponse::ok(&serde_json::json!({ "pong": id })) }
            }),
        )]
    }
}

/// Records delete and search events.
#[derive(Debug)]
struct Recorder {
    log: EventLog,
}

#[async_trait]
impl Extension for Recorder {
    fn info(&self) -> ExtensionInfo {
        ExtensionInfo::new("Recorder", "0.1.0")
    }

    fn hooks(&self) -> Vec<HookKind> {
        vec![HookKind::NoteDelete, HookKind::Search]
    }

    async fn on_note_delete(&self, path: &str) -> Result<(), HookFault> {
        self.log.lock().push(format!("note_delete:{path}"));
        Ok(())
    }

    async fn on_search(&self, query: &str, results: &[String]) -> Result<(), HookFault> {
        self.log
            .lock()
            .push(format!("search:{query}:{}", results.join(",")));
        Ok(())
    }
}

/// Faults in every hook it declares, by error or by panic, and panics
/// when asked for assets.
#[derive(Debug)]
struct Faulty {
    panics: bool,
}

impl Faulty {
    fn fault(&self, hook: &str) -> HookFault {
        if self.panics {
            panic!("{hook} bug");
        }
        HookFault::failed(format!("{hook} refused"))
    }
}

#[async_trait]
impl Extension for Faulty {
    fn info(&self) -> ExtensionInfo {
        ExtensionInfo::new("Faulty", "0.1.0")
    }

    fn hooks(&self) -> Vec<HookKind> {
        vec![
            HookKind::Startup,
            HookKind::NoteSave,
            HookKind::NoteLoad,
            HookKind::NoteDelete,
        ]
    }

    fn has_assets(&self) -> bool {
        true
    }

    async fn on_startup(&self) -> Result<(), HookFault> {
        Err(self.fault("startup"))
    }

    async fn on_note_save(&self, _path: &str, _content: &str) -> Result<HookOutcome, HookFault> {
        Err(self.fault("note_save"))
    }

    async fn on_note_load(&self, _path: &str, _content: &str) -> Result<HookOutcome, HookFault> {
        Err(self.fault("note_load"))
    }

    async fn on_note_delete(&self, _path: &str) -> Result<(), HookFault> {
        Err(self.fault("note_delete"))
    }

    fn frontend_assets(&self) -> FrontendAssets {
        panic!("asset bug")
    }
}

/// Parsed response.
pub struct TestResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub text: String,
    pub body: Value,
}

/// A server over scratch directories.
pub struct TestApp {
    pub router: Router,
    pub plugins: Arc<PluginManager>,
    pub events: EventLog,
    dir: TempDir,
}

impl TestApp {
    /// Starts with the graph, tagger and recorder extensions installed.
    pub async fn new() -> Self {
        Self::with_manifests(&[
            ("enhanced_graph", "factory = \"enhanced_graph\"\n"),
            ("tagger", "factory = \"tagger\"\n"),
            ("recorder", "factory = \"recorder\"\n"),
        ])
        .await
    }

    /// Starts with the given `(id, manifest)` pairs.
    pub async fn with_manifests(manifests: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        for (id, body) in manifests {
            write_manifest(dir.path(), id, body).await;
        }
        Self::start(dir).await
    }

    /// Builds a fresh app over an existing scratch directory, as a restart would.
    pub async fn restart(self) -> Self {
        Self::start(self.dir).await
    }

    async fn start(dir: TempDir) -> Self {
        let config = AppConfig {
            notes: NotesConfig {
                notes_dir: dir.path().join("notes").display().to_string(),
                extension: "md".to_string(),
            },
            plugins: PluginConfig {
                directory: plugin_dir(dir.path()).display().to_string(),
                state_file: dir.path().join("state.json").display().to_string(),
                hook_timeout_ms: 2_000,
            },
            ..AppConfig::default()
        };

        let store = Arc::new(FsNoteStore::new(&config.notes));
        store.ensure_root().await.unwrap();

        let events = EventLog::default();
        let log = Arc::clone(&events);
        let mut catalog = ExtensionCatalog::new();
        catalog
            .register(plugin_enhanced_graph::FACTORY_NAME, plugin_enhanced_graph::factory)
            .register("tagger", |ctx: &ExtensionContext| {
                Ok(Arc::new(Tagger { id: ctx.id.clone() }) as Arc<dyn Extension>)
            })
            .register("recorder", move |_: &ExtensionContext| {
                Ok(Arc::new(Recorder {
                    log: Arc::clone(&log),
                }) as Arc<dyn Extension>)
            })
            .register("faulty", |ctx: &ExtensionContext| {
                let panics = ctx.settings.get("mode").and_then(|m| m.as_str()) == Some("panic");
                Ok(Arc::new(Faulty { panics }) as Arc<dyn Extension>)
            });

        let services = HostServices {
            link_graph: Arc::new(NoteLinkGraphSource::new(Arc::clone(&store))),
        };
        let plugins = Arc::new(PluginManager::new(&config.plugins, catalog, services));
        plugins.bootstrap().await.unwrap();

        let router = build_app(AppState::new(config, store, Arc::clone(&plugins)));
        Self {
            router,
            plugins,
            events,
            dir,
        }
    }

    /// Scratch root.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Adds a manifest to the plugin directory.
    pub async fn add_manifest(&self, id: &str, body: &str) {
        write_manifest(self.dir.path(), id, body).await;
    }

    /// Writes a note file directly, bypassing hooks.
    pub async fn seed_note(&self, path: &str, content: &str) {
        let full = self.dir.path().join("notes").join(path);
        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await.unwrap();
        }
        tokio::fs::write(full, content).await.unwrap();
    }

    /// Sends a request and parses the response.
    pub async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);

        TestResponse {
            status,
            content_type,
            text,
            body,
        }
    }

    /// Shorthand for `POST /api/plugins/{id}/toggle`.
    pub async fn toggle(&self, id: &str, enabled: bool) -> TestResponse {
        self.request(
            "POST",
            &format!("/api/plugins/{id}/toggle"),
            Some(serde_json::json!({ "enabled": enabled })),
        )
        .await
    }

    /// Recorded observing events.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

fn plugin_dir(root: &Path) -> PathBuf {
    root.join("plugins")
}

async fn write_manifest(root: &Path, id: &str, body: &str) {
    let dir = plugin_dir(root);
    tokio::fs::create_dir_all(&dir).await.unwrap();
    tokio::fs::write(dir.join(format!("{id}.toml")), body)
        .await
        .unwrap();
}

//! Enhanced graph extension, integrated with the NoteGraph extension runtime.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use notegraph_core::graph::LinkGraphView;
use notegraph_core::result::AppResult;
use notegraph_core::traits::LinkGraphSource;
use notegraph_plugin::prelude::*;

use crate::assets;
use crate::config::GraphSettings;
use crate::error::GraphError;
use crate::models::ExpansionKind;
use crate::session::{ExpandRequest, GraphSession, GraphSessions, validate_node_id};

/// Catalog name manifests use to select this extension.
pub const FACTORY_NAME: &str = "enhanced_graph";

/// Separator of the ancestor chain in the `chain` query parameter.
const CHAIN_SEPARATOR: char = '|';

/// Hierarchical graph view with hover previews and click pins.
#[derive(Debug)]
pub struct EnhancedGraphPlugin {
    id: String,
    settings: GraphSettings,
    service: Arc<GraphService>,
}

impl EnhancedGraphPlugin {
    /// Creates the extension over a link-graph source.
    pub fn new(
        id: impl Into<String>,
        settings: GraphSettings,
        source: Arc<dyn LinkGraphSource>,
    ) -> Self {
        let service = Arc::new(GraphService {
            sessions: GraphSessions::new(settings.clone()),
            source,
        });
        Self {
            id: id.into(),
            settings,
            service,
        }
    }

    /// Active settings.
    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }
}

/// Builds the extension from a manifest.
pub fn factory(ctx: &ExtensionContext) -> Result<Arc<dyn Extension>, String> {
    let settings = GraphSettings::from_value(&ctx.settings)?;
    Ok(Arc::new(EnhancedGraphPlugin::new(
        ctx.id.clone(),
        settings,
        Arc::clone(&ctx.services.link_graph),
    )))
}

#[async_trait]
impl Extension for EnhancedGraphPlugin {
    fn info(&self) -> ExtensionInfo {
        ExtensionInfo::new("Enhanced Graph Visualization", "1.0.0").with_description(
            "Hierarchical graph view with hover-to-preview and click-to-pin expansion",
        )
    }

    fn hooks(&self) -> Vec<HookKind> {
        vec![HookKind::Startup]
    }

    fn has_routes(&self) -> bool {
        true
    }

    fn has_assets(&self) -> bool {
        true
    }

    async fn on_startup(&self) -> Result<(), HookFault> {
        info!(
            plugin_id = %self.id,
            hub_threshold = self.settings.hub_threshold,
            max_depth = self.settings.max_depth,
            "Enhanced graph ready"
        );
        Ok(())
    }

    fn frontend_assets(&self) -> FrontendAssets {
        assets::frontend_assets()
    }

    fn route_set(&self) -> Vec<RouteBinding> {
        let enhanced = Arc::clone(&self.service);
        let node = Arc::clone(&self.service);
        let close = Arc::clone(&self.service);

        vec![
            RouteBinding::get(
                "graph/enhanced",
                handler_fn(move |req| {
                    let service = Arc::clone(&enhanced);
                    async move { service.enhanced(req).await }
                }),
            ),
            RouteBinding::get(
                "graph/node/{*path}",
                handler_fn(move |req| {
                    let service = Arc::clone(&node);
                    async move { service.expand(req).await }
                }),
            ),
            RouteBinding::delete(
                "graph/session/{session}",
                handler_fn(move |req| {
                    let service = Arc::clone(&close);
                    async move { service.close(req).await }
                }),
            ),
        ]
    }
}

/// Shared state behind the extension's routes.
#[derive(Debug)]
struct GraphService {
    sessions: GraphSessions,
    source: Arc<dyn LinkGraphSource>,
}

impl GraphService {
    async fn open(&self) -> AppResult<Arc<GraphSession>> {
        let graph: Arc<dyn LinkGraphView> = self.source.link_graph().await?;
        Ok(self.sessions.open(graph).await)
    }

    /// `GET graph/enhanced?depth=`
    async fn enhanced(&self, req: RouteRequest) -> AppResult<RouteResponse> {
        let depth = parse_depth(req.query_param("depth"))?;
        let session = self.open().await?;
        let view = session.top_level_view(depth).await?;
        RouteResponse::ok(&view)
    }

    /// `GET graph/node/{*path}?session=&kind=&depth=&chain=`
    async fn expand(&self, req: RouteRequest) -> AppResult<RouteResponse> {
        let depth = parse_depth(req.query_param("depth"))?;
        self.sessions.settings().resolve_depth(depth)?;
        let node_id = validate_node_id(req.param("path").unwrap_or_default())?;
        let kind = match req.query_param("kind") {
            Some(raw) => raw.parse::<ExpansionKind>()?,
            None => ExpansionKind::default(),
        };
        let ancestors = req
            .query_param("chain")
            .map(|chain| {
                chain
                    .split(CHAIN_SEPARATOR)
                    .filter(|a| !a.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        // A rejected request must not leave a fresh session behind.
        let session = match req.query_param("session") {
            Some(id) => self.sessions.get(id).await?,
            None => {
                let graph: Arc<dyn LinkGraphView> = self.source.link_graph().await?;
                if graph.note(&node_id).is_none() {
                    return Err(GraphError::UnknownNode(node_id).into());
                }
                self.sessions.open(graph).await
            }
        };

        let expansion = session
            .expand(ExpandRequest {
                node_id,
                kind,
                depth,
                ancestors,
            })
            .await?;
        RouteResponse::ok(&expansion)
    }

    /// `DELETE graph/session/{session}`
    async fn close(&self, req: RouteRequest) -> AppResult<RouteResponse> {
        let id = req.param("session").unwrap_or_default();
        if self.sessions.close(id).await? {
            Ok(RouteResponse::no_content())
        } else {
            Err(GraphError::UnknownSession(id.to_string()).into())
        }
    }
}

fn parse_depth(raw: Option<&str>) -> Result<Option<u32>, GraphError> {
    raw.map(|d| {
        d.trim()
            .parse::<u32>()
            .map_err(|_| GraphError::InvalidDepth(d.to_string()))
    })
    .transpose()
}

//! Manifest discovery and extension instantiation.
//!
//! Each `*.toml` file in the plugin directory describes one extension. The
//! file stem is the extension id; the manifest names a factory from the
//! [`ExtensionCatalog`] and may override identity fields:
//!
//! ```toml
//! factory = "enhanced_graph"
//! name = "Enhanced Graph Visualization"
//! enabled = true
//!
//! [settings]
//! hub_threshold = 3
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, warn};

use crate::catalog::{ExtensionCatalog, ExtensionContext, HostServices};
use crate::isolation::contain_panic;
use crate::registry::ExtensionDescriptor;

/// Ids that would shadow the host's own `/api/plugins/...` endpoints.
const RESERVED_IDS: [&str; 3] = ["assets", "routes", "rescan"];

/// Why a manifest could not be turned into a loaded extension.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The manifest file could not be read.
    #[error("failed to read manifest {path}: {source}")]
    Read {
        /// Manifest path.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The manifest is not valid TOML or misses required keys.
    #[error("malformed manifest: {0}")]
    Manifest(String),
    /// No factory with that name is compiled in.
    #[error("unknown extension factory '{0}'")]
    UnknownFactory(String),
    /// The factory returned an error.
    #[error("extension factory failed: {0}")]
    Factory(String),
    /// The factory or the new instance panicked.
    #[error("extension panicked while loading")]
    Panicked,
    /// A required identity field is empty.
    #[error("extension {0} must not be empty")]
    MissingIdentity(&'static str),
    /// The file stem is not a usable id.
    #[error("invalid extension id '{0}': use lowercase letters, digits, '-' or '_'")]
    InvalidId(String),
}

/// Contents of an extension manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionManifest {
    /// Catalog factory name.
    pub factory: String,
    /// Overrides the instance's display name.
    pub name: Option<String>,
    /// Overrides the instance's version.
    pub version: Option<String>,
    /// Overrides the instance's description.
    pub description: Option<String>,
    /// Initial enabled flag when no persisted state exists.
    pub enabled: Option<bool>,
    /// Free-form settings passed to the factory.
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
}

/// Discovers and instantiates extensions from a manifest directory.
#[derive(Debug, Clone)]
pub struct ExtensionLoader {
    directory: PathBuf,
    catalog: Arc<ExtensionCatalog>,
    services: HostServices,
}

impl ExtensionLoader {
    /// Creates a loader over `directory`.
    pub fn new(
        directory: impl Into<PathBuf>,
        catalog: Arc<ExtensionCatalog>,
        services: HostServices,
    ) -> Self {
        Self {
            directory: directory.into(),
            catalog,
            services,
        }
    }

    /// The scanned directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the manifest for `id`.
    pub fn manifest_path(&self, id: &str) -> PathBuf {
        self.directory.join(format!("{id}.toml"))
    }

    /// Loads every manifest in file-name order. Failures become descriptors
    /// with `load_error` set; discovery never aborts.
    pub async fn discover(&self) -> Vec<ExtensionDescriptor> {
        let paths = self.manifest_paths().await;
        let mut descriptors = Vec::with_capacity(paths.len());
        for path in paths {
            descriptors.push(self.load(&path).await);
        }

        info!(
            directory = %self.directory.display(),
            discovered = descriptors.len(),
            failed = descriptors.iter().filter(|d| d.load_error.is_some()).count(),
            "Extension discovery complete"
        );
        descriptors
    }

    /// Manifest files in the directory, sorted by file name.
    pub async fn manifest_paths(&self) -> Vec<PathBuf> {
        let mut entries = match fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    directory = %self.directory.display(),
                    error = %e,
                    "Plugin directory unavailable, no extensions discovered"
                );
                return Vec::new();
            }
        };

        let mut paths = Vec::new();
        loop {
            match entries.next_entry().await {
                Ok(Some(entry)) => {
                    let path = entry.path();
                    let is_manifest = path.extension().is_some_and(|ext| ext == "toml");
                    let is_file = entry.file_type().await.is_ok_and(|t| t.is_file());
                    if is_manifest && is_file {
                        paths.push(path);
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read plugin directory entry");
                    break;
                }
            }
        }
        paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
        paths
    }

    /// Loads one manifest into a descriptor.
    pub async fn load(&self, path: &Path) -> ExtensionDescriptor {
        let id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        match self.try_load(&id, path).await {
            Ok(descriptor) => {
                debug!(plugin_id = %id, path = %path.display(), "Extension loaded");
                descriptor
            }
            Err(e) => {
                warn!(plugin_id = %id, path = %path.display(), error = %e, "Extension failed to load");
                ExtensionDescriptor::failed(id, e)
            }
        }
    }

    async fn try_load(&self, id: &str, path: &Path) -> Result<ExtensionDescriptor, DiscoveryError> {
        validate_id(id)?;

        let raw = fs::read_to_string(path)
            .await
            .map_err(|source| DiscoveryError::Read {
                path: path.display().to_string(),
                source,
            })?;
        let manifest: ExtensionManifest =
            toml::from_str(&raw).map_err(|e| DiscoveryError::Manifest(e.to_string()))?;

        let factory = self
            .catalog
            .get(&manifest.factory)
            .ok_or_else(|| DiscoveryError::UnknownFactory(manifest.factory.clone()))?;

        let context = ExtensionContext {
            id: id.to_string(),
            settings: serde_json::Value::Object(manifest.settings.clone()),
            services: self.services.clone(),
        };
        let instance = contain_panic(id, "factory", || factory(&context))
            .ok_or(DiscoveryError::Panicked)?
            .map_err(DiscoveryError::Factory)?;

        let info = contain_panic(id, "info", || instance.info()).ok_or(DiscoveryError::Panicked)?;
        let name = manifest.name.unwrap_or(info.name);
        let version = manifest.version.unwrap_or(info.version);
        if name.trim().is_empty() {
            return Err(DiscoveryError::MissingIdentity("name"));
        }
        if version.trim().is_empty() {
            return Err(DiscoveryError::MissingIdentity("version"));
        }

        Ok(ExtensionDescriptor {
            id: id.to_string(),
            name,
            version,
            description: manifest.description.unwrap_or(info.description),
            enabled: manifest.enabled.unwrap_or(info.enabled),
            load_error: None,
            instance: Some(instance),
        })
    }
}

fn validate_id(id: &str) -> Result<(), DiscoveryError> {
    let well_formed = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
    if !well_formed || RESERVED_IDS.contains(&id) {
        return Err(DiscoveryError::InvalidId(id.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extension::{Extension, ExtensionInfo};
    use notegraph_core::graph::LinkGraph;
    use notegraph_core::traits::notes::StaticLinkGraph;

    #[derive(Debug)]
    struct Configurable {
        name: String,
    }

    impl Extension for Configurable {
        fn info(&self) -> ExtensionInfo {
            ExtensionInfo::new(self.name.clone(), "2.0.0").with_description("configurable")
        }
    }

    #[derive(Debug)]
    struct Faceless;

    impl Extension for Faceless {
        fn info(&self) -> ExtensionInfo {
            panic!("identity bug")
        }
    }

    fn loader(dir: &Path) -> ExtensionLoader {
        let mut catalog = ExtensionCatalog::new();
        catalog
            .register("configurable", |ctx: &ExtensionContext| {
                let name = ctx
                    .settings
                    .get("label")
                    .and_then(|v| v.as_str())
                    .unwrap_or("Configurable")
                    .to_string();
                Ok(Arc::new(Configurable { name }) as Arc<dyn Extension>)
            })
            .register("failing", |_: &ExtensionContext| Err("no database".to_string()))
            .register("panicking", |_: &ExtensionContext| panic!("factory bug"))
            .register("faceless", |_: &ExtensionContext| {
                Ok(Arc::new(Faceless) as Arc<dyn Extension>)
            });

        let services = HostServices {
            link_graph: Arc::new(StaticLinkGraph(Arc::new(LinkGraph::default()))),
        };
        ExtensionLoader::new(dir, Arc::new(catalog), services)
    }

    async fn write(dir: &Path, name: &str, body: &str) {
        tokio::fs::write(dir.join(name), body).await.unwrap();
    }

    #[tokio::test]
    async fn test_discovery_order_and_failures() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "b_good.toml", "factory = \"configurable\"\n[settings]\nlabel = \"Bee\"\n").await;
        write(dir.path(), "a_unknown.toml", "factory = \"nope\"").await;
        write(dir.path(), "c_broken.toml", "factory = ").await;
        write(dir.path(), "d_fail.toml", "factory = \"failing\"").await;
        write(dir.path(), "e_panic.toml", "factory = \"panicking\"").await;
        write(dir.path(), "f_blank.toml", "factory = \"configurable\"\nname = \"  \"").await;
        write(dir.path(), "g_faceless.toml", "factory = \"faceless\"").await;
        write(dir.path(), "Bad Id.toml", "factory = \"configurable\"").await;
        write(dir.path(), "notes.txt", "ignored").await;

        let descriptors = loader(dir.path()).discover().await;
        let ids: Vec<&str> = descriptors.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "Bad Id",
                "a_unknown",
                "b_good",
                "c_broken",
                "d_fail",
                "e_panic",
                "f_blank",
                "g_faceless"
            ]
        );

        let good = &descriptors[2];
        assert!(good.load_error.is_none());
        assert!(good.enabled);
        assert_eq!(good.name, "Bee");
        assert_eq!(good.version, "2.0.0");

        for failed in descriptors.iter().filter(|d| d.id != "b_good") {
            assert!(failed.load_error.is_some(), "{} should fail", failed.id);
            assert!(!failed.enabled);
            assert!(failed.instance.is_none());
        }
        assert_eq!(
            descriptors[7].load_error.as_deref(),
            Some("extension panicked while loading")
        );
    }

    #[tokio::test]
    async fn test_manifest_can_default_to_disabled() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "quiet.toml", "factory = \"configurable\"\nenabled = false").await;
        let descriptors = loader(dir.path()).discover().await;
        assert!(!descriptors[0].enabled);
        assert!(descriptors[0].load_error.is_none());
    }

    #[tokio::test]
    async fn test_missing_directory_discovers_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let descriptors = loader(&dir.path().join("absent")).discover().await;
        assert!(descriptors.is_empty());
    }

    #[test]
    fn test_reserved_ids_rejected() {
        assert!(validate_id("assets").is_err());
        assert!(validate_id("enhanced_graph").is_ok());
        assert!(validate_id("").is_err());
    }
}

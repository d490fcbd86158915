//! ---
//! pwrmon_section: "01-core-functionality"
//! pwrmon_subsection: "module"
//! pwrmon_type: "source"
//! pwrmon_scope: "code"
//! pwrmon_description: "Lazy asset loading driven by the activation service."
//! pwrmon_version: "v0.1.0"
//! pwrmon_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use indexmap::IndexMap;
use pwrmon_logging::{pm_info, pm_warn, LogContext};
use thiserror::Error;

use crate::activation::{
    ActivationService, ActivationState, ElementId, IntersectionEntry, VisibilityObserver,
};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read asset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("asset {0} is empty")]
    Empty(PathBuf),
}

/// Fetches the content behind an asset source.
pub trait AssetLoader {
    fn load(&self, source: &Path) -> Result<String, AssetError>;
}

/// Reads text assets from disk, resolving relative sources against `root`.
#[derive(Debug, Clone, Default)]
pub struct FileAssetLoader {
    root: Option<PathBuf>,
}

impl FileAssetLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, source: &Path) -> PathBuf {
        match &self.root {
            Some(root) if source.is_relative() => root.join(source),
            _ => source.to_path_buf(),
        }
    }
}

impl AssetLoader for FileAssetLoader {
    fn load(&self, source: &Path) -> Result<String, AssetError> {
        let path = self.resolve(source);
        let content = fs::read_to_string(&path).map_err(|source| AssetError::Io {
            path: path.clone(),
            source,
        })?;
        if content.trim().is_empty() {
            return Err(AssetError::Empty(path));
        }
        Ok(content)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    /// Not yet visible; renderers show a placeholder.
    Placeholder,
    Loaded(String),
    /// Load attempted and failed. The placeholder stays and no retry happens.
    Failed,
}

impl AssetState {
    pub fn content(&self) -> Option<&str> {
        match self {
            AssetState::Loaded(content) => Some(content),
            _ => None,
        }
    }
}

/// Lazily loaded assets: each source is fetched once its element activates.
pub struct LazyAssets<L: AssetLoader, O: VisibilityObserver> {
    loader: L,
    service: ActivationService<O>,
    sources: IndexMap<ElementId, PathBuf>,
    states: IndexMap<ElementId, AssetState>,
}

impl<L: AssetLoader, O: VisibilityObserver> LazyAssets<L, O> {
    pub fn new(loader: L, service: ActivationService<O>) -> Self {
        Self {
            loader,
            service,
            sources: IndexMap::new(),
            states: IndexMap::new(),
        }
    }

    /// Register a placeholder for `source`. In degraded mode it loads right away;
    /// once the service is shut down nothing is recorded.
    pub fn register(&mut self, id: impl Into<ElementId>, source: impl Into<PathBuf>) {
        let id = id.into();
        if self.states.contains_key(&id) {
            return;
        }
        let Some(state) = self.service.register(id.clone()) else {
            return;
        };
        self.sources.insert(id.clone(), source.into());
        self.states.insert(id.clone(), AssetState::Placeholder);
        if state == ActivationState::Active {
            self.load(&id);
        }
    }

    pub fn poll_batches(&mut self, now: Instant) -> usize {
        self.service.poll_batches(now)
    }

    /// Forward visibility reports and load whatever activated.
    pub fn on_intersection(&mut self, entries: &[IntersectionEntry]) -> Vec<ElementId> {
        let activated = self.service.on_intersection(entries);
        for id in &activated {
            self.load(id);
        }
        activated
    }

    fn load(&mut self, id: &ElementId) {
        let Some(source) = self.sources.get(id) else {
            return;
        };
        let ctx = LogContext::new().with_channel(id.as_str());
        let next = match self.loader.load(source) {
            Ok(content) => {
                pm_info!(context = ctx, "asset {} loaded", source.display());
                AssetState::Loaded(content)
            }
            Err(err) => {
                pm_warn!(context = ctx, "failed to load asset: {}", err);
                AssetState::Failed
            }
        };
        self.states.insert(id.clone(), next);
    }

    pub fn state(&self, id: &ElementId) -> Option<&AssetState> {
        self.states.get(id)
    }

    pub fn content(&self, id: &ElementId) -> Option<&str> {
        self.state(id).and_then(AssetState::content)
    }

    pub fn service(&self) -> &ActivationService<O> {
        &self.service
    }

    pub fn shutdown(&mut self) {
        self.service.shutdown();
    }
}

impl<L: AssetLoader, O: VisibilityObserver> std::fmt::Debug for LazyAssets<L, O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyAssets")
            .field("service", &self.service)
            .field("assets", &self.states.len())
            .finish()
    }
}

//! Builder for creating and configuring Board instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, warn};
use tokio::task;

use super::{Board, BoardConfig, Session, VIEW_MODE_PREFERENCE};
use crate::{
    cache::Cache,
    error::{BoardError, Result},
    gateway::{InMemoryGateway, RemoteGateway},
    models::ViewMode,
};

/// Builder for creating and configuring Board instances.
#[derive(Clone, Default)]
pub struct BoardBuilder {
    cache_path: Option<PathBuf>,
    in_memory_cache: bool,
    gateway: Option<Arc<dyn RemoteGateway>>,
    session: Session,
    config: BoardConfig,
}

impl BoardBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom cache file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_CACHE_HOME/taskboard/cache.db` or `~/.cache/taskboard/cache.db`
    pub fn with_cache_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.cache_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Keeps the cache in memory instead of on disk.
    pub fn with_in_memory_cache(mut self) -> Self {
        self.in_memory_cache = true;
        self
    }

    /// Remote store to sync with. Defaults to an empty [`InMemoryGateway`].
    pub fn with_gateway(mut self, gateway: Arc<dyn RemoteGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Owner whose projects the board lists. Boards without one are guests.
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.session.owner = Some(owner.into());
        self
    }

    /// Person performing edits, when different from the owner.
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.session.actor = Some(actor.into());
        self
    }

    pub fn with_config(mut self, config: BoardConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the configured board.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::FileSystem` if the cache directory cannot be created
    /// Returns `BoardError::Cache` if cache initialization fails
    pub async fn build(self) -> Result<Board> {
        let ttl = self.config.ttl;
        let cache_path = if self.in_memory_cache {
            None
        } else if let Some(path) = self.cache_path {
            Some(path)
        } else {
            Some(Self::default_cache_path()?)
        };

        if let Some(parent) = cache_path.as_deref().and_then(Path::parent) {
            std::fs::create_dir_all(parent).map_err(|e| BoardError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let (cache, view_mode) = task::spawn_blocking(move || {
            let cache = match &cache_path {
                Some(path) => {
                    debug!("Opening cache at {}", path.display());
                    Cache::open(path, ttl)?
                }
                None => Cache::in_memory(ttl)?,
            };
            let view_mode = Self::stored_view_mode(&cache)?;
            Ok::<_, BoardError>((cache, view_mode))
        })
        .await
        .map_err(|e| BoardError::Configuration {
            message: format!("Task join error: {e}"),
        })??;

        let gateway = self
            .gateway
            .unwrap_or_else(|| Arc::new(InMemoryGateway::new()));

        Ok(Board::new(cache, gateway, self.session, view_mode, self.config))
    }

    fn stored_view_mode(cache: &Cache) -> Result<ViewMode> {
        let Some(stored) = cache.preference(VIEW_MODE_PREFERENCE)? else {
            return Ok(ViewMode::default());
        };
        Ok(stored.parse().unwrap_or_else(|e| {
            warn!("Ignoring stored view mode: {e}");
            ViewMode::default()
        }))
    }

    /// Returns the default cache path following XDG Base Directory
    /// specification.
    fn default_cache_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("taskboard")
            .place_cache_file("cache.db")
            .map_err(|e| BoardError::XdgDirectory(e.to_string()))
    }
}

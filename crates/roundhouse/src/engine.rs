//! `RoundEngine` builder: assembles the spawn store, the round
//! controller, and the pre-registered services into a running engine.
//!
//! This is the entry point for embedding Roundhouse in a game server.
//! The host supplies a [`PlayerDirectory`] for everything player-facing
//! and (optionally) a persistence backend for spawn points; everything
//! else has defaults.

use std::path::Path;

use roundhouse_round::{spawn_round, GameService, PlayerDirectory, RoundConfig, RoundHandle};
use roundhouse_spawn::{JsonFileBackend, MemoryBackend, SpawnBackend, SpawnStore};
use tracing::info;

use crate::EngineError;

/// Builder for configuring and starting a [`RoundEngine`].
///
/// # Example
///
/// ```rust,ignore
/// use roundhouse::prelude::*;
///
/// let engine = RoundEngine::builder()
///     .config(RoundConfig::default())
///     .spawn_file("data/spawnpoints.json")
///     .service(Box::new(ScoreboardService::new()))
///     .directory(Box::new(my_server_adapter))
///     .build()
///     .await?;
/// ```
pub struct RoundEngineBuilder {
    config: RoundConfig,
    backend: Box<dyn SpawnBackend>,
    directory: Option<Box<dyn PlayerDirectory>>,
    services: Vec<Box<dyn GameService>>,
}

impl RoundEngineBuilder {
    /// Creates a new builder with default settings: default
    /// [`RoundConfig`], in-memory spawn persistence, no services.
    pub fn new() -> Self {
        Self {
            config: RoundConfig::default(),
            backend: Box::new(MemoryBackend::new()),
            directory: None,
            services: Vec::new(),
        }
    }

    /// Sets the round configuration.
    pub fn config(mut self, config: RoundConfig) -> Self {
        self.config = config;
        self
    }

    /// Persists spawn points to a JSON file at `path`. A missing file
    /// is treated as an empty set; a corrupt one fails [`build`].
    ///
    /// [`build`]: Self::build
    pub fn spawn_file(mut self, path: impl AsRef<Path>) -> Self {
        self.backend = Box::new(JsonFileBackend::new(path.as_ref().to_path_buf()));
        self
    }

    /// Sets a custom spawn-point persistence backend.
    pub fn spawn_backend(mut self, backend: Box<dyn SpawnBackend>) -> Self {
        self.backend = backend;
        self
    }

    /// Sets the player directory. Required.
    pub fn directory(mut self, directory: Box<dyn PlayerDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Queues a service for registration once the engine is running.
    pub fn service(mut self, service: Box<dyn GameService>) -> Self {
        self.services.push(service);
        self
    }

    /// Validates the configuration, loads persisted spawn points, and
    /// starts the round controller with all queued services registered.
    ///
    /// Fails if the configuration is invalid, the directory is missing,
    /// the spawn store cannot load, or a queued service id collides.
    pub async fn build(self) -> Result<RoundEngine, EngineError> {
        self.config.validate().map_err(EngineError::Startup)?;
        let directory = self
            .directory
            .ok_or_else(|| EngineError::Startup("no player directory supplied".into()))?;

        let store = SpawnStore::load(self.backend)?;
        info!(spawn_points = store.len(), "spawn store loaded");

        let handle = spawn_round(self.config, store, directory);
        for service in self.services {
            handle.register_service(service).await?;
        }

        Ok(RoundEngine { handle })
    }
}

impl Default for RoundEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running round engine.
///
/// Thin wrapper over the controller's [`RoundHandle`]; clone the handle
/// freely across tasks.
#[derive(Debug)]
pub struct RoundEngine {
    handle: RoundHandle,
}

impl RoundEngine {
    /// Creates a new builder.
    pub fn builder() -> RoundEngineBuilder {
        RoundEngineBuilder::new()
    }

    /// A handle to the round controller.
    pub fn handle(&self) -> RoundHandle {
        self.handle.clone()
    }

    /// Stops the controller: stops all services, cancels timers, and
    /// closes the command channel.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        self.handle.shutdown().await?;
        Ok(())
    }
}

/// Installs a formatted `tracing` subscriber filtered by `RUST_LOG`.
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

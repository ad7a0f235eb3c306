//! Runtime wiring for the offline write path
//!
//! [`OfflineRuntime`] owns everything the app needs to make writes survive
//! an outage: the on-disk queue storage, the connectivity signal the host
//! feeds, the queue itself and the [`OfflineStudyStore`] in front of the
//! remote store.

use std::sync::Arc;

use certprep_common::sync::queue::{KeyValueStore, OfflineQueue, QueueError};
use certprep_common::sync::NetworkMonitor;
use certprep_core::{OfflineStudyStore, StudyStore};
use certprep_domain::{Config, Result, StudyError, StudyWrite};

use crate::config;
use crate::logging::init_tracing;
use crate::storage::FileKeyValueStore;

/// Assembled offline write path
pub struct OfflineRuntime {
    pub config: Config,
    pub network: NetworkMonitor,
    pub storage: Arc<FileKeyValueStore>,
    pub study_store: Arc<OfflineStudyStore>,
}

impl OfflineRuntime {
    /// Full bootstrap: `.env`, configuration, logging, then wiring
    ///
    /// Must be called inside a Tokio runtime for reconnect processing to be
    /// active.
    pub fn bootstrap(remote: Arc<dyn StudyStore>) -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => tracing::info!(path = %path.display(), "Loaded .env file"),
            Err(err) if err.not_found() => tracing::debug!("No .env file found"),
            Err(err) => tracing::warn!(error = %err, "Failed to load .env file"),
        }

        let config = config::load()?;
        init_tracing(&config.logging)?;

        Self::with_config(config, remote, NetworkMonitor::online())
    }

    /// Wire the runtime from an already loaded configuration
    ///
    /// `network` is the connectivity signal the host updates; the queue
    /// replays whenever it flips back online.
    pub fn with_config(
        config: Config,
        remote: Arc<dyn StudyStore>,
        network: NetworkMonitor,
    ) -> Result<Self> {
        let storage = Arc::new(
            FileKeyValueStore::open(&config.storage.data_dir)
                .map_err(|e| StudyError::Storage(e.to_string()))?,
        );
        let queue_config = config::queue_config(&config.queue)?;

        let backend: Arc<dyn KeyValueStore> = storage.clone();
        let queue: OfflineQueue<StudyWrite> = OfflineQueue::builder(backend)
            .config(queue_config)
            .network(network.clone())
            .build()
            .map_err(startup_error)?;

        let restored = queue.len();
        tracing::info!(
            data_dir = %storage.dir().display(),
            storage_key = %config.queue.storage_key,
            restored,
            online = network.is_online(),
            "offline_runtime.ready"
        );

        let study_store = Arc::new(OfflineStudyStore::new(remote, queue));
        Ok(Self { config, network, storage, study_store })
    }

    pub fn queue(&self) -> &OfflineQueue<StudyWrite> {
        self.study_store.queue()
    }

    /// Report a connectivity change from the host
    pub fn set_online(&self, online: bool) {
        tracing::debug!(online, "offline_runtime.connectivity_changed");
        self.network.set_online(online);
    }

    /// Stop reconnect-driven processing; queued writes stay on disk
    pub fn shutdown(&self) {
        self.queue().teardown();
        tracing::info!(pending = self.queue().has_pending_operations(), "offline_runtime.stopped");
    }
}

fn startup_error(err: QueueError) -> StudyError {
    match err {
        QueueError::InvalidState(message) => StudyError::Config(message),
        other => StudyError::Queue(other.to_string()),
    }
}

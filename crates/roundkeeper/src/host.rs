//! `RoundHost` builder and tick loop.
//!
//! The host owns the registry behind an async mutex and drives
//! [`SessionRegistry::tick`] from a [`TickScheduler`]. Host-side event
//! handlers (joins, block changes, disconnects) lock the same registry
//! through [`RoundHost::registry`].

use std::future::Future;
use std::sync::Arc;

use roundkeeper_round::{Services, SessionRegistry};
use roundkeeper_session::{PlainSessions, SessionFactory};
use roundkeeper_store::{DocumentStore, FileStore};
use roundkeeper_tick::{TickConfig, TickScheduler};
use tokio::sync::Mutex;

use crate::{HostConfig, RoundkeeperError};

/// Registry handle shared between the tick loop and event handlers.
pub type SharedRegistry<F = PlainSessions> = Arc<Mutex<SessionRegistry<F>>>;

/// Builder for a [`RoundHost`].
///
/// # Example
///
/// ```rust,ignore
/// use roundkeeper::prelude::*;
///
/// let host = RoundHost::builder()
///     .config(HostConfig::from_file("roundkeeper.json")?)
///     .build(Services::new(resolver, inventories, world), PlainSessions)?;
/// host.run_until(tokio::signal::ctrl_c().map(|_| ())).await
/// ```
pub struct RoundHostBuilder {
    config: HostConfig,
    tick_config: Option<TickConfig>,
    store: Option<Arc<dyn DocumentStore>>,
}

impl RoundHostBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            config: HostConfig::default(),
            tick_config: None,
            store: None,
        }
    }

    pub fn config(mut self, config: HostConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the scheduler settings derived from the host config.
    pub fn tick_config(mut self, tick_config: TickConfig) -> Self {
        self.tick_config = Some(tick_config);
        self
    }

    /// Uses `store` instead of a [`FileStore`] under the data directory.
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Opens the registry and repairs any arena a previous run left dirty.
    pub fn build<F: SessionFactory>(
        self,
        services: Services,
        factory: F,
    ) -> Result<RoundHost<F>, RoundkeeperError> {
        let store = match self.store {
            Some(store) => store,
            None => Arc::new(FileStore::new(self.config.store_dir())),
        };
        let tick_config = self
            .tick_config
            .unwrap_or_else(|| self.config.tick_config());

        let mut registry = SessionRegistry::open(
            self.config.namespace.clone(),
            self.config.registry.clone(),
            store,
            services,
            factory,
        )?;

        let repaired = registry.check_rollbacks();
        if !repaired.is_empty() {
            tracing::info!(
                namespace = %self.config.namespace,
                arenas = repaired.len(),
                "repaired arenas left dirty by previous run"
            );
        }
        let stranded = registry.snapshots().pending()?;
        if !stranded.is_empty() {
            tracing::info!(
                count = stranded.len(),
                "inventory snapshots waiting for their owners to rejoin"
            );
        }

        Ok(RoundHost {
            namespace: self.config.namespace,
            registry: Arc::new(Mutex::new(registry)),
            tick_config,
        })
    }
}

impl Default for RoundHostBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A registry plus the clock that drives it.
///
/// Call [`run_until()`](Self::run_until) to start ticking.
pub struct RoundHost<F: SessionFactory = PlainSessions> {
    namespace: String,
    registry: SharedRegistry<F>,
    tick_config: TickConfig,
}

impl<F: SessionFactory> RoundHost<F> {
    /// Creates a new builder.
    pub fn builder() -> RoundHostBuilder {
        RoundHostBuilder::new()
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Shared handle to the registry.
    pub fn registry(&self) -> SharedRegistry<F> {
        Arc::clone(&self.registry)
    }

    /// Ticks the registry until `shutdown` resolves, then ends every round
    /// and flushes the change log.
    ///
    /// A failed flush between ticks is logged and retried on the next
    /// tick; only the final shutdown flush is reported as an error.
    pub async fn run_until(
        self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), RoundkeeperError> {
        let mut clock = TickScheduler::new(self.tick_config);
        tokio::pin!(shutdown);
        tracing::info!(namespace = %self.namespace, "round host running");

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                info = clock.wait_for_tick() => {
                    let mut registry = self.registry.lock().await;
                    registry.tick();
                    if let Err(e) = registry.flush() {
                        tracing::warn!(tick = info.tick, error = %e, "change log flush failed");
                    }
                    drop(registry);
                    clock.record_tick_end();
                }
            }
        }

        tracing::info!(
            namespace = %self.namespace,
            ticks = clock.tick_count(),
            "round host shutting down"
        );
        self.registry.lock().await.shutdown()?;
        Ok(())
    }
}

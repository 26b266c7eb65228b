//! Federated search across every registered museum adapter
//!
//! A search fans out to the selected adapters concurrently and merges
//! whatever comes back. An adapter that errors or panics contributes nothing;
//! the others are unaffected.

use crate::adapters::{AdapterKind, MuseumAdapter};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::models::{ArtworkResult, GlobalId, SearchOptions};
use futures::future::join_all;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How one adapter's part of a federated search ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterOutcome {
    Results(usize),
    Failed(String),
}

/// Instrumentation hooks around each adapter call. Hooks only observe.
pub trait FederationObserver: Send + Sync {
    fn on_adapter_start(&self, _adapter_id: &str) {}

    fn on_adapter_finish(&self, _adapter_id: &str, _outcome: &AdapterOutcome, _elapsed: Duration) {}
}

/// Tallies adapter calls, failures and merged result counts
#[derive(Debug, Default)]
pub struct CountingObserver {
    started: AtomicUsize,
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    results: AtomicUsize,
}

impl CountingObserver {
    pub fn started(&self) -> usize {
        self.started.load(Ordering::Relaxed)
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn results(&self) -> usize {
        self.results.load(Ordering::Relaxed)
    }
}

impl FederationObserver for CountingObserver {
    fn on_adapter_start(&self, _adapter_id: &str) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    fn on_adapter_finish(&self, _adapter_id: &str, outcome: &AdapterOutcome, _elapsed: Duration) {
        match outcome {
            AdapterOutcome::Results(count) => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                self.results.fetch_add(*count, Ordering::Relaxed);
            }
            AdapterOutcome::Failed(_) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
            }
        }
    }
}

/// Registry of adapters keyed by id, first registration wins
#[derive(Default)]
pub struct CollectionFederator {
    adapters: Vec<Arc<dyn MuseumAdapter>>,
    observer: Option<Arc<dyn FederationObserver>>,
}

impl CollectionFederator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_observer(mut self, observer: Arc<dyn FederationObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Open every enabled adapter whose store has been built. Adapters with
    /// no store yet are skipped with a warning.
    pub async fn open_configured(config: &Config) -> Result<Self> {
        let mut federator = Self::new();
        for kind in config.enabled_adapters() {
            match kind.open_configured(config).await {
                Ok(adapter) => {
                    federator.register(adapter);
                }
                Err(Error::StoreUnavailable(reason)) => {
                    warn!(adapter = %kind, %reason, "Store not available, adapter skipped");
                }
                Err(e) => return Err(e),
            }
        }
        info!(adapters = federator.len(), "Federation ready");
        Ok(federator)
    }

    /// Add an adapter. Returns `false` when its id is already taken.
    pub fn register(&mut self, adapter: Arc<dyn MuseumAdapter>) -> bool {
        if self.adapter(adapter.id()).is_some() {
            warn!(adapter = adapter.id(), "Adapter id already registered, keeping the first");
            return false;
        }
        debug!(adapter = adapter.id(), source = %adapter.data_source(), "Registered adapter");
        self.adapters.push(adapter);
        true
    }

    pub fn adapter(&self, id: &str) -> Option<Arc<dyn MuseumAdapter>> {
        self.adapters.iter().find(|a| a.id() == id).cloned()
    }

    pub fn adapters(&self) -> &[Arc<dyn MuseumAdapter>] {
        &self.adapters
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Adapters named by `museums`, or all of them when it is empty.
    /// Names may be ids or any alias `AdapterKind` accepts.
    pub fn select(&self, museums: &[String]) -> Vec<Arc<dyn MuseumAdapter>> {
        let wanted: Vec<String> = museums
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .map(|m| match m.parse::<AdapterKind>() {
                Ok(kind) => kind.id().to_string(),
                Err(_) => m.to_lowercase(),
            })
            .collect();

        if wanted.is_empty() {
            return self.adapters.clone();
        }
        self.adapters
            .iter()
            .filter(|a| wanted.iter().any(|w| w == a.id()))
            .cloned()
            .collect()
    }

    /// Search the selected adapters concurrently and merge their pages.
    /// Each adapter applies `limit` on its own, so the merge may hold up to
    /// `limit` results per adapter, grouped by adapter in registration order.
    pub async fn search(&self, options: &SearchOptions) -> Vec<ArtworkResult> {
        let selected = self.select(&options.museums);
        if selected.is_empty() {
            debug!(museums = ?options.museums, "No registered adapter matches the museum filter");
            return Vec::new();
        }

        let options = Arc::new(options.clone());
        let tasks = selected.into_iter().map(|adapter| {
            let options = Arc::clone(&options);
            let observer = self.observer.clone();
            let id = adapter.id().to_string();
            if let Some(observer) = &observer {
                observer.on_adapter_start(&id);
            }
            let started = Instant::now();
            let handle = tokio::spawn(async move { adapter.search(&options).await });

            async move {
                let outcome = match handle.await {
                    Ok(Ok(results)) => Ok(results),
                    Ok(Err(e)) => Err(e.to_string()),
                    Err(join_error) => Err(format!("adapter task aborted: {}", join_error)),
                };
                let elapsed = started.elapsed();

                let report = match &outcome {
                    Ok(results) => {
                        debug!(adapter = %id, results = results.len(), ?elapsed, "Adapter search finished");
                        AdapterOutcome::Results(results.len())
                    }
                    Err(reason) => {
                        warn!(adapter = %id, error = %reason, "Adapter search failed, contributing no results");
                        AdapterOutcome::Failed(reason.clone())
                    }
                };
                if let Some(observer) = &observer {
                    observer.on_adapter_finish(&id, &report, elapsed);
                }

                outcome.unwrap_or_default()
            }
        });

        join_all(tasks).await.into_iter().flatten().collect()
    }

    /// Route `<adapter id>:<local id>` to its adapter. Malformed ids and
    /// unregistered adapters give `None`.
    pub async fn get_by_id(&self, global_id: &str) -> Result<Option<ArtworkResult>> {
        let Some(id) = GlobalId::parse(global_id) else {
            debug!(global_id, "Malformed global id");
            return Ok(None);
        };
        let Some(adapter) = self.adapter(&id.adapter_id) else {
            debug!(adapter = %id.adapter_id, "No adapter registered for global id");
            return Ok(None);
        };
        adapter.get_by_id(&id.local_id).await
    }
}

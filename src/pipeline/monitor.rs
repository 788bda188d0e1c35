// src/pipeline/monitor.rs

//! Multi-region monitor.
//!
//! Owns one coordinator task per region. Regions poll independently; each
//! task owns its state exclusively and publishes through a watch channel.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result};
use crate::models::{Config, RegionConfig, RegionSnapshot};
use crate::pipeline::coordinator::RegionCoordinator;
use crate::services::{P2000Client, PageSource, RecordExtractor, TimestampNormalizer};

struct RegionHandle {
    config: RegionConfig,
    cancel: CancellationToken,
    task: JoinHandle<()>,
    receiver: watch::Receiver<RegionSnapshot>,
}

/// Running set of monitored regions, keyed by normalized region path.
pub struct Monitor {
    source: Arc<dyn PageSource>,
    extractor: Arc<RecordExtractor>,
    regions: HashMap<String, RegionHandle>,
}

impl Monitor {
    pub fn new(source: Arc<dyn PageSource>, extractor: Arc<RecordExtractor>) -> Self {
        Self {
            source,
            extractor,
            regions: HashMap::new(),
        }
    }

    /// Build the HTTP client and extractor from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = P2000Client::new(&config.scraper)?;
        let normalizer = TimestampNormalizer::new((&config.locale).into());
        let extractor = RecordExtractor::new(&config.selectors, normalizer)?;
        Ok(Self::new(Arc::new(source), Arc::new(extractor)))
    }

    /// Start monitoring a region.
    ///
    /// The first poll is awaited; if it fails hard the region is not started
    /// and the setup error is returned.
    pub async fn start(&mut self, region: RegionConfig) -> Result<watch::Receiver<RegionSnapshot>> {
        let mut coordinator = self.prepare(&region, &HashSet::new())?;
        coordinator.first_refresh().await?;
        Ok(self.spawn(coordinator))
    }

    /// Start several regions, running their first polls concurrently.
    ///
    /// Regions that fail setup are skipped; their errors are returned.
    pub async fn start_all(&mut self, regions: &[RegionConfig]) -> Vec<AppError> {
        let mut failures = Vec::new();
        let mut pending = Vec::new();
        let mut batch = HashSet::new();

        for region in regions {
            match self.prepare(region, &batch) {
                Ok(coordinator) => {
                    batch.insert(region.key());
                    pending.push(coordinator);
                }
                Err(e) => failures.push(e),
            }
        }

        let refreshed = join_all(pending.into_iter().map(|mut coordinator| async move {
            let result = coordinator.first_refresh().await;
            (coordinator, result)
        }))
        .await;

        for (coordinator, result) in refreshed {
            match result {
                Ok(_) => {
                    self.spawn(coordinator);
                }
                Err(e) => failures.push(e),
            }
        }
        failures
    }

    /// Subscribe to a running region's snapshots.
    pub fn subscribe(&self, region_path: &str) -> Option<watch::Receiver<RegionSnapshot>> {
        self.regions
            .get(&crate::utils::normalize_region_path(region_path))
            .map(|h| h.receiver.clone())
    }

    /// Latest snapshot of every running region, sorted by region path.
    pub fn snapshots(&self) -> Vec<RegionSnapshot> {
        let mut snapshots: Vec<_> = self
            .regions
            .values()
            .map(|h| h.receiver.borrow().clone())
            .collect();
        snapshots.sort_by(|a, b| a.region_path.cmp(&b.region_path));
        snapshots
    }

    pub fn region_config(&self, region_path: &str) -> Option<&RegionConfig> {
        self.regions
            .get(&crate::utils::normalize_region_path(region_path))
            .map(|h| &h.config)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Stop a region, cancelling any in-flight fetch. Returns whether it ran.
    pub async fn stop(&mut self, region_path: &str) -> bool {
        let key = crate::utils::normalize_region_path(region_path);
        let Some(handle) = self.regions.remove(&key) else {
            return false;
        };
        handle.cancel.cancel();
        if let Err(e) = handle.task.await {
            log::error!("Monitor task for {} ended abnormally: {}", key, e);
        }
        true
    }

    /// Stop all regions.
    pub async fn shutdown(&mut self) {
        let keys: Vec<String> = self.regions.keys().cloned().collect();
        for key in keys {
            self.stop(&key).await;
        }
    }

    fn prepare(&self, region: &RegionConfig, batch: &HashSet<String>) -> Result<RegionCoordinator> {
        region.validate()?;
        let key = region.key();
        if self.regions.contains_key(&key) || batch.contains(&key) {
            return Err(AppError::validation(
                format!("regions.{key}"),
                "already_configured",
            ));
        }
        Ok(RegionCoordinator::new(
            region.clone(),
            Arc::clone(&self.source),
            Arc::clone(&self.extractor),
        ))
    }

    fn spawn(&mut self, coordinator: RegionCoordinator) -> watch::Receiver<RegionSnapshot> {
        let config = coordinator.region().clone();
        let receiver = coordinator.subscribe();
        let cancel = CancellationToken::new();
        let task = tokio::spawn(coordinator.run(cancel.clone()));

        self.regions.insert(
            config.key(),
            RegionHandle {
                config,
                cancel,
                task,
                receiver: receiver.clone(),
            },
        );
        receiver
    }
}

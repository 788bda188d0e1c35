// src/pipeline/coordinator.rs

//! Polling coordinator.
//!
//! Each monitored region owns one [`RegionCoordinator`]. A poll fetches the
//! region page, extracts the latest record and reconciles it against the
//! retained [`CoordinatorState`]:
//!
//! ```text
//! Idle -> Polling -> Reconciled | Failed -> Idle
//! ```
//!
//! | outcome                        | record    | errors | healthy |
//! |--------------------------------|-----------|--------|---------|
//! | connection / parsing failure   | kept      | +1     | no      |
//! | no data (404) / no entry       | kept      | 0      | yes     |
//! | same record as before          | kept      | 0      | yes     |
//! | new record                     | replaced  | 0      | yes     |

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{AppError, Result, ScrapeError};
use crate::models::{HealthStatus, IncidentRecord, RegionConfig, RegionSnapshot, Transition};
use crate::services::{PageSource, RecordExtractor};

/// What one fetch + extract cycle produced.
pub type PollOutcome = std::result::Result<Option<IncidentRecord>, ScrapeError>;

/// Retained state of one region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoordinatorState {
    last_record: Option<IncidentRecord>,
    consecutive_errors: u32,
    last_error: bool,
    last_success: Option<DateTime<Utc>>,
}

impl CoordinatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the outcome of a poll.
    pub fn reconcile(&mut self, outcome: &PollOutcome, now: DateTime<Utc>) -> Transition {
        match outcome {
            Err(err) if err.is_hard() => {
                self.consecutive_errors += 1;
                self.last_error = true;
                Transition::Failed
            }
            Err(_) | Ok(None) => {
                self.clear_errors();
                Transition::Retained
            }
            Ok(Some(record)) if self.last_record.as_ref() == Some(record) => {
                self.clear_errors();
                self.last_success = Some(now);
                Transition::Unchanged
            }
            Ok(Some(record)) => {
                self.clear_errors();
                self.last_record = Some(record.clone());
                self.last_success = Some(now);
                Transition::Updated
            }
        }
    }

    fn clear_errors(&mut self) {
        self.consecutive_errors = 0;
        self.last_error = false;
    }

    pub fn current_record(&self) -> Option<&IncidentRecord> {
        self.last_record.as_ref()
    }

    pub fn is_healthy(&self) -> bool {
        !self.last_error
    }

    pub fn consecutive_errors(&self) -> u32 {
        self.consecutive_errors
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    pub fn status(&self) -> HealthStatus {
        if self.last_error {
            HealthStatus::Error
        } else {
            HealthStatus::Ok
        }
    }
}

/// Drives the polls of a single region and publishes snapshots.
pub struct RegionCoordinator {
    region: RegionConfig,
    source: Arc<dyn PageSource>,
    extractor: Arc<RecordExtractor>,
    state: CoordinatorState,
    sender: watch::Sender<RegionSnapshot>,
}

impl RegionCoordinator {
    pub fn new(
        region: RegionConfig,
        source: Arc<dyn PageSource>,
        extractor: Arc<RecordExtractor>,
    ) -> Self {
        let initial = RegionSnapshot::pending(&region.instance_name, region.key());
        let (sender, _) = watch::channel(initial);
        Self {
            region,
            source,
            extractor,
            state: CoordinatorState::new(),
            sender,
        }
    }

    pub fn region(&self) -> &RegionConfig {
        &self.region
    }

    pub fn state(&self) -> &CoordinatorState {
        &self.state
    }

    /// Receive a snapshot after every completed poll.
    pub fn subscribe(&self) -> watch::Receiver<RegionSnapshot> {
        self.sender.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> RegionSnapshot {
        self.sender.borrow().clone()
    }

    /// Fetch the region page and extract its latest record.
    pub async fn fetch_outcome(&self) -> PollOutcome {
        let key = self.region.key();
        log::debug!("Fetching P2000 data for {}", key);
        let markup = self.source.fetch(&key).await?;
        self.extractor.extract(&markup)
    }

    /// Reconcile an outcome and publish the resulting snapshot.
    ///
    /// Hard failures are returned after they have been recorded.
    pub fn apply(&mut self, outcome: PollOutcome) -> std::result::Result<Transition, ScrapeError> {
        let now = Utc::now();
        let transition = self.state.reconcile(&outcome, now);
        let key = self.region.key();

        match (&outcome, transition) {
            (Err(err), Transition::Failed) => log::error!(
                "Error communicating with/parsing alarmfase1.nl for {} ({} in a row): {}",
                key,
                self.state.consecutive_errors(),
                err
            ),
            (Err(err), _) => log::debug!("No data for {}, keeping last known record: {}", key, err),
            (Ok(None), _) => log::debug!("No incident found for {}, keeping last known record", key),
            (Ok(Some(_)), Transition::Unchanged) => {
                log::debug!("Record has not changed since last update for {}", key)
            }
            (Ok(Some(record)), _) => log::info!("New incident for {}: {}", key, record.summary()),
        }

        self.publish(transition, now);

        match outcome {
            Err(err) if err.is_hard() => Err(err),
            _ => Ok(transition),
        }
    }

    /// Run one complete poll.
    pub async fn poll(&mut self) -> std::result::Result<Transition, ScrapeError> {
        let outcome = self.fetch_outcome().await;
        self.apply(outcome)
    }

    /// First poll after startup; a hard failure aborts the region setup.
    pub async fn first_refresh(&mut self) -> Result<Transition> {
        self.poll()
            .await
            .map_err(|err| AppError::setup(self.region.key(), err))
    }

    /// Poll on the configured interval until cancelled.
    ///
    /// The next wait starts only after the previous poll has been reconciled.
    /// A poll interrupted by cancellation is discarded without reconciling.
    pub async fn run(mut self, cancel: CancellationToken) {
        let interval = Duration::from_secs(self.region.scan_interval_secs);
        log::info!(
            "Monitoring {} every {}s",
            self.region.key(),
            interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }

            let outcome = tokio::select! {
                _ = cancel.cancelled() => break,
                outcome = self.fetch_outcome() => outcome,
            };
            // Failures are logged and already reflected in the snapshot.
            let _ = self.apply(outcome);
        }

        log::info!("Stopped monitoring {}", self.region.key());
    }

    fn publish(&self, transition: Transition, attempted_at: DateTime<Utc>) {
        let record = self.state.current_record().cloned();
        let matches_filter = record
            .as_ref()
            .is_none_or(|r| self.region.filters.allows(r.service_type));

        self.sender.send_replace(RegionSnapshot {
            instance_name: self.region.instance_name.clone(),
            region_path: self.region.key(),
            record,
            matches_filter,
            status: self.state.status(),
            consecutive_errors: self.state.consecutive_errors(),
            last_success: self.state.last_success(),
            last_update_attempt: Some(attempted_at),
            transition,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::models::{FilterConfig, ServiceType};
    use crate::services::TimestampNormalizer;

    fn record(code: &str, service_type: ServiceType) -> IncidentRecord {
        IncidentRecord {
            priority_code: Some(code.to_string()),
            message: Some(format!("{code} test")),
            service_type,
            ..IncidentRecord::default()
        }
    }

    fn connection_error() -> ScrapeError {
        ScrapeError::connection("https://www.alarmfase1.nl/x/", "timeout")
    }

    #[test]
    fn new_record_updates_state() {
        let mut state = CoordinatorState::new();
        let now = Utc::now();
        let t = state.reconcile(&Ok(Some(record("A1", ServiceType::Ambulance))), now);

        assert_eq!(t, Transition::Updated);
        assert_eq!(state.current_record().unwrap().priority_code.as_deref(), Some("A1"));
        assert_eq!(state.last_success(), Some(now));
        assert!(state.is_healthy());
    }

    #[test]
    fn identical_record_is_unchanged() {
        let mut state = CoordinatorState::new();
        let rec = record("A1", ServiceType::Ambulance);
        state.reconcile(&Ok(Some(rec.clone())), Utc::now());
        let before = state.current_record().cloned();

        let t = state.reconcile(&Ok(Some(rec)), Utc::now());

        assert_eq!(t, Transition::Unchanged);
        assert_eq!(state.current_record().cloned(), before);
        assert_eq!(state.consecutive_errors(), 0);
    }

    #[test]
    fn hard_failure_keeps_record_and_counts() {
        let mut state = CoordinatorState::new();
        for code in ["A1", "A2", "A3"] {
            state.reconcile(&Ok(Some(record(code, ServiceType::Ambulance))), Utc::now());
        }

        let t = state.reconcile(&Err(connection_error()), Utc::now());

        assert_eq!(t, Transition::Failed);
        assert_eq!(state.consecutive_errors(), 1);
        assert!(!state.is_healthy());
        assert_eq!(state.status(), HealthStatus::Error);
        assert_eq!(state.current_record().unwrap().priority_code.as_deref(), Some("A3"));

        state.reconcile(&Err(ScrapeError::parsing("broken")), Utc::now());
        assert_eq!(state.consecutive_errors(), 2);

        let t = state.reconcile(&Ok(Some(record("A3", ServiceType::Ambulance))), Utc::now());
        assert_eq!(t, Transition::Unchanged);
        assert_eq!(state.consecutive_errors(), 0);
        assert!(state.is_healthy());
    }

    #[test]
    fn soft_outcomes_reset_errors_and_keep_record() {
        let mut state = CoordinatorState::new();
        state.reconcile(&Ok(Some(record("P 1", ServiceType::Police))), Utc::now());
        state.reconcile(&Err(connection_error()), Utc::now());

        let t = state.reconcile(&Err(ScrapeError::no_data("x", "404")), Utc::now());
        assert_eq!(t, Transition::Retained);
        assert_eq!(state.consecutive_errors(), 0);
        assert!(state.is_healthy());
        assert!(state.current_record().is_some());

        state.reconcile(&Err(connection_error()), Utc::now());
        let t = state.reconcile(&Ok(None), Utc::now());
        assert_eq!(t, Transition::Retained);
        assert_eq!(state.consecutive_errors(), 0);
        assert_eq!(state.current_record().unwrap().priority_code.as_deref(), Some("P 1"));
    }

    #[test]
    fn cold_start_soft_outcome_exposes_nothing() {
        let mut state = CoordinatorState::new();
        state.reconcile(&Ok(None), Utc::now());
        assert_eq!(state.current_record(), None);
        assert_eq!(state.last_success(), None);
        assert!(state.is_healthy());
    }

    /// Replays scripted outcomes, one per fetch.
    struct ScriptedSource {
        pages: Mutex<VecDeque<std::result::Result<String, ScrapeError>>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<std::result::Result<String, ScrapeError>>) -> Arc<Self> {
            Arc::new(Self {
                pages: Mutex::new(pages.into()),
            })
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch(&self, _region_path: &str) -> std::result::Result<String, ScrapeError> {
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }

    fn page(code: &str, icon: &str) -> String {
        format!(
            r#"<div id="calls"><div class="call"><h2><a><i class="fa {icon}"></i><b>{code}</b></a></h2><pre>{code} melding</pre></div></div>"#
        )
    }

    fn coordinator(
        source: Arc<ScriptedSource>,
        filters: FilterConfig,
    ) -> RegionCoordinator {
        let extractor = RecordExtractor::new(
            &Default::default(),
            TimestampNormalizer::default(),
        )
        .unwrap();
        let mut region = RegionConfig::new("Test", "/test-region/");
        region.filters = filters;
        RegionCoordinator::new(region, source, Arc::new(extractor))
    }

    #[tokio::test]
    async fn poll_publishes_snapshots() {
        let source = ScriptedSource::new(vec![
            Ok(page("A1", "fa-ambulance")),
            Err(connection_error()),
        ]);
        let mut coordinator = coordinator(source, FilterConfig::default());
        let mut rx = coordinator.subscribe();

        assert_eq!(rx.borrow().transition, Transition::Pending);

        assert_eq!(coordinator.poll().await.unwrap(), Transition::Updated);
        assert!(rx.has_changed().unwrap());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.region_path, "test-region");
        assert_eq!(
            snap.record.as_ref().unwrap().service_type,
            ServiceType::Ambulance
        );
        assert!(snap.is_healthy());
        assert!(snap.last_update_attempt.is_some());

        assert!(coordinator.poll().await.is_err());
        let snap = rx.borrow_and_update().clone();
        assert_eq!(snap.transition, Transition::Failed);
        assert_eq!(snap.status, HealthStatus::Error);
        assert_eq!(snap.consecutive_errors, 1);
        assert!(snap.record.is_some());
    }

    #[tokio::test]
    async fn filter_match_follows_service_type() {
        let source = ScriptedSource::new(vec![
            Ok(page("P 1", "fa-bell")),
            Ok(page("A1", "fa-ambulance")),
        ]);
        let filters = FilterConfig {
            other: false,
            ..FilterConfig::default()
        };
        let mut coordinator = coordinator(source, filters);

        coordinator.poll().await.unwrap();
        assert!(!coordinator.snapshot().matches_filter);

        coordinator.poll().await.unwrap();
        assert!(coordinator.snapshot().matches_filter);
    }

    #[tokio::test]
    async fn first_refresh_surfaces_hard_failure() {
        let source = ScriptedSource::new(vec![Err(connection_error())]);
        let mut coordinator = coordinator(source, FilterConfig::default());

        match coordinator.first_refresh().await {
            Err(AppError::Setup { region_path, source }) => {
                assert_eq!(region_path, "test-region");
                assert_eq!(source.setup_code(), "cannot_connect");
            }
            other => panic!("expected setup error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_refresh_accepts_missing_region_data() {
        let source = ScriptedSource::new(vec![Err(ScrapeError::no_data("test-region", "404"))]);
        let mut coordinator = coordinator(source, FilterConfig::default());

        assert_eq!(
            coordinator.first_refresh().await.unwrap(),
            Transition::Retained
        );
        assert!(coordinator.state().current_record().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn run_stops_when_cancelled() {
        let source = ScriptedSource::new(vec![Ok(page("A1", "fa-ambulance"))]);
        let coordinator = coordinator(source, FilterConfig::default());
        let mut rx = coordinator.subscribe();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(coordinator.run(cancel.clone()));

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().transition, Transition::Updated);

        cancel.cancel();
        task.await.unwrap();
        assert!(rx.changed().await.is_err());
    }

    /// Never answers; signals once a fetch has started.
    struct StalledSource {
        started: tokio::sync::Notify,
    }

    #[async_trait]
    impl PageSource for StalledSource {
        async fn fetch(&self, _region_path: &str) -> std::result::Result<String, ScrapeError> {
            self.started.notify_one();
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_discards_in_flight_fetch() {
        let source = Arc::new(StalledSource {
            started: tokio::sync::Notify::new(),
        });
        let extractor =
            RecordExtractor::new(&Default::default(), TimestampNormalizer::default()).unwrap();
        let coordinator = RegionCoordinator::new(
            RegionConfig::new("Test", "test-region"),
            source.clone(),
            Arc::new(extractor),
        );
        let rx = coordinator.subscribe();
        let cancel = CancellationToken::new();

        let task = tokio::spawn(coordinator.run(cancel.clone()));

        source.started.notified().await;
        cancel.cancel();
        task.await.unwrap();

        let snap = rx.borrow().clone();
        assert_eq!(snap.transition, Transition::Pending);
        assert_eq!(snap.status, HealthStatus::Ok);
        assert_eq!(snap.consecutive_errors, 0);
        assert_eq!(snap.last_update_attempt, None);
        assert!(snap.record.is_none());
    }
}

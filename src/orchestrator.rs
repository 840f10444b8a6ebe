//! # Scrape orchestrator
//! Owns all mutable pipeline state and drives fetch → parse → upload.
//! Runs are single-flight: a request while one is active is rejected,
//! never queued. The recurring timer goes through the same guard, so at
//! most one pipeline execution is in flight system-wide.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local, Utc};
use metrics::{counter, describe_counter, describe_gauge, gauge};
use once_cell::sync::OnceCell;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::dates;
use crate::error::ScrapeError;
use crate::event::{EconomicEvent, Impact};
use crate::fetch::PageFetcher;
use crate::parser::{self, Period};
use crate::upload::EventSink;

/// How long a finished run keeps showing its terminal status before
/// reverting to `Idle`.
const DISPLAY_GRACE: Duration = Duration::from_secs(5);

/// Where the pipeline currently is. Transitions are owned by
/// [`Orchestrator::run`]; observers only ever see the documented order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Scraping,
    Uploading,
    Success,
    Error(String),
}

/// Orchestrator settings. Persistence of these values belongs to the
/// caller; the orchestrator only reads them and reschedules on change.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub auto_update_enabled: bool,
    pub update_interval_secs: u64,
    pub upload_enabled: bool,
    pub period: Period,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_update_enabled: true,
            update_interval_secs: 3600,
            upload_enabled: true,
            period: Period::Week,
        }
    }
}

/// Read-only view of the run state.
#[derive(Debug, Clone)]
pub struct RunSnapshot {
    pub status: Status,
    pub events: Vec<EconomicEvent>,
    pub last_update: Option<DateTime<Utc>>,
    pub last_period: Period,
    pub last_error: Option<String>,
}

impl RunSnapshot {
    pub fn high_impact(&self) -> Vec<&EconomicEvent> {
        self.events
            .iter()
            .filter(|e| e.impact == Impact::High)
            .collect()
    }

    /// Events whose raw date token matches today's page-format token.
    pub fn today(&self) -> Vec<&EconomicEvent> {
        let (spaced, compact) = dates::today_tokens(Local::now().date_naive());
        self.events
            .iter()
            .filter(|e| e.date == spaced || e.date == compact)
            .collect()
    }
}

#[derive(Debug, Default)]
struct RunState {
    status: Status,
    events: Vec<EconomicEvent>,
    last_update: Option<DateTime<Utc>>,
    last_period: Period,
    last_error: Option<String>,
    // Bumped at every admitted run; lets the display-grace revert detect
    // that a newer run took over in the meantime.
    run_seq: u64,
}

/// Cheap cloneable handle; all clones share one state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    fetcher: Arc<dyn PageFetcher>,
    sink: Arc<dyn EventSink>,
    settings: Mutex<Settings>,
    state: Mutex<RunState>,
    is_running: AtomicBool,
    status_tx: watch::Sender<Status>,
    timer: Mutex<Option<JoinHandle<()>>>,
    grace: Duration,
}

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("scrape_runs_total", "Pipeline runs admitted.");
        describe_counter!(
            "scrape_rejected_total",
            "Run requests rejected while another run was in flight."
        );
        describe_counter!("scrape_errors_total", "Runs that ended in an error state.");
        describe_counter!("scrape_events_total", "Events parsed across all runs.");
        describe_gauge!("scrape_last_success_ts", "Unix ts of the last successful run.");
    });
}

impl Orchestrator {
    pub fn new(fetcher: Arc<dyn PageFetcher>, sink: Arc<dyn EventSink>, settings: Settings) -> Self {
        Self::with_grace(fetcher, sink, settings, DISPLAY_GRACE)
    }

    /// Same as [`new`](Self::new) with a custom display grace period
    /// before the terminal status reverts to idle.
    pub fn with_grace(
        fetcher: Arc<dyn PageFetcher>,
        sink: Arc<dyn EventSink>,
        settings: Settings,
        grace: Duration,
    ) -> Self {
        ensure_metrics_described();
        let (status_tx, _) = watch::channel(Status::Idle);
        Self {
            inner: Arc::new(Inner {
                fetcher,
                sink,
                settings: Mutex::new(settings),
                state: Mutex::new(RunState::default()),
                is_running: AtomicBool::new(false),
                status_tx,
                timer: Mutex::new(None),
                grace,
            }),
        }
    }

    /// Current state, cloned out. Observers never hold the lock.
    pub fn snapshot(&self) -> RunSnapshot {
        let state = self.inner.state.lock().expect("state mutex poisoned");
        RunSnapshot {
            status: state.status.clone(),
            events: state.events.clone(),
            last_update: state.last_update,
            last_period: state.last_period,
            last_error: state.last_error.clone(),
        }
    }

    /// Status stream; receives every transition in order.
    pub fn subscribe(&self) -> watch::Receiver<Status> {
        self.inner.status_tx.subscribe()
    }

    pub fn settings(&self) -> Settings {
        self.inner
            .settings
            .lock()
            .expect("settings mutex poisoned")
            .clone()
    }

    /// Replace the settings and atomically reschedule the timer.
    pub fn apply_settings(&self, settings: Settings) {
        *self.inner.settings.lock().expect("settings mutex poisoned") = settings;
        self.reschedule();
    }

    /// Start the recurring timer (when enabled) and kick off a first run.
    pub fn start(&self) {
        self.reschedule();
        let this = self.clone();
        tokio::spawn(async move {
            let period = this.settings().period;
            this.run(period).await;
        });
    }

    /// Stop the recurring timer. An in-flight run completes on its own;
    /// there is no mid-run cancellation.
    pub fn stop(&self) {
        if let Some(handle) = self
            .inner
            .timer
            .lock()
            .expect("timer mutex poisoned")
            .take()
        {
            handle.abort();
        }
    }

    fn reschedule(&self) {
        let settings = self.settings();
        let mut guard = self.inner.timer.lock().expect("timer mutex poisoned");
        // Tear the previous timer down before spawning a new one so two
        // schedules can never fire concurrently.
        if let Some(handle) = guard.take() {
            handle.abort();
        }
        if !settings.auto_update_enabled {
            tracing::info!(target: "scrape", "auto-update disabled");
            return;
        }
        let interval = Duration::from_secs(settings.update_interval_secs.max(1));
        let this = self.clone();
        *guard = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick of a tokio interval fires immediately; the
            // schedule starts one full period from now.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let period = this.settings().period;
                this.run(period).await;
            }
        }));
        tracing::info!(
            target: "scrape",
            interval_secs = settings.update_interval_secs,
            "auto-update scheduled"
        );
    }

    /// Execute one full pipeline run. Returns `false` when the request is
    /// rejected because another run is already in flight.
    pub async fn run(&self, period: Period) -> bool {
        if self.inner.is_running.swap(true, Ordering::SeqCst) {
            counter!("scrape_rejected_total").increment(1);
            tracing::debug!(target: "scrape", "run already in flight, request rejected");
            return false;
        }
        counter!("scrape_runs_total").increment(1);

        let seq = {
            let mut state = self.inner.state.lock().expect("state mutex poisoned");
            state.run_seq += 1;
            state.status = Status::Scraping;
            state.last_period = period;
            state.last_error = None;
            state.run_seq
        };
        self.inner.status_tx.send_replace(Status::Scraping);

        match self.execute(period).await {
            Ok(count) => {
                let now = Utc::now();
                {
                    let mut state = self.inner.state.lock().expect("state mutex poisoned");
                    state.status = Status::Success;
                    state.last_update = Some(now);
                }
                self.inner.status_tx.send_replace(Status::Success);
                counter!("scrape_events_total").increment(count as u64);
                gauge!("scrape_last_success_ts").set(now.timestamp() as f64);
                tracing::info!(target: "scrape", events = count, ?period, "run complete");
            }
            Err(e) => {
                let msg = e.to_string();
                {
                    let mut state = self.inner.state.lock().expect("state mutex poisoned");
                    state.status = Status::Error(msg.clone());
                    state.last_error = Some(msg.clone());
                }
                self.inner.status_tx.send_replace(Status::Error(msg.clone()));
                counter!("scrape_errors_total").increment(1);
                tracing::warn!(target: "scrape", error = %msg, "run failed");
            }
        }

        self.inner.is_running.store(false, Ordering::SeqCst);
        self.schedule_idle_revert(seq);
        true
    }

    async fn execute(&self, period: Period) -> Result<usize, ScrapeError> {
        let html = self.inner.fetcher.fetch_page().await?;
        let events = parser::parse_calendar(&html, period)?;
        let count = events.len();

        // The parsed list replaces the previous one wholesale. This
        // happens before the upload so a destination failure never
        // discards a good scrape; fetch/parse failures return above and
        // leave the old list alone.
        {
            let mut state = self.inner.state.lock().expect("state mutex poisoned");
            state.events = events.clone();
        }

        if self.settings().upload_enabled {
            {
                let mut state = self.inner.state.lock().expect("state mutex poisoned");
                state.status = Status::Uploading;
            }
            self.inner.status_tx.send_replace(Status::Uploading);
            self.inner.sink.upload(&events).await?;
        }

        Ok(count)
    }

    /// Revert a terminal status back to `Idle` after the grace period,
    /// unless a newer run has taken over.
    fn schedule_idle_revert(&self, seq: u64) {
        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(this.inner.grace).await;
            let mut state = this.inner.state.lock().expect("state mutex poisoned");
            if state.run_seq == seq
                && matches!(state.status, Status::Success | Status::Error(_))
            {
                state.status = Status::Idle;
                this.inner.status_tx.send_replace(Status::Idle);
            }
        });
    }
}

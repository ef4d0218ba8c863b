use crate::error::EngineError;
use crate::tracker::PriceTracker;
use alerter::AlertService;
use api_client::QuoteSource;
use configuration::BotConfig;
use core_types::AlertRecord;
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// What happened during one pass over the configured pairs.
#[derive(Debug, Default)]
pub struct TickSummary {
    pub pairs_polled: usize,
    pub failures: usize,
    pub alerts: Vec<AlertRecord>,
}

/// The polling loop: one tick per interval, every pair fetched concurrently.
///
/// Ticks never overlap. If a tick runs longer than the interval, the missed
/// ticks are skipped rather than queued, so a pair never has two fetches in
/// flight and its previous price always comes from its latest fetch.
pub struct PriceMonitor {
    pairs: Vec<String>,
    interval: Duration,
    bot_config_id: i32,
    quote_source: Arc<dyn QuoteSource>,
    tracker: PriceTracker,
    alerts: Arc<AlertService>,
    running: AtomicBool,
}

impl PriceMonitor {
    pub fn new(
        bot_config: &BotConfig,
        bot_config_id: i32,
        quote_source: Arc<dyn QuoteSource>,
        alerts: Arc<AlertService>,
    ) -> Self {
        let pairs = bot_config.unique_pairs();
        if pairs.len() != bot_config.pairs.len() {
            tracing::warn!(
                configured = bot_config.pairs.len(),
                unique = pairs.len(),
                "Duplicate pairs in configuration; each pair is polled once per tick."
            );
        }

        Self {
            pairs,
            // `tokio::time::interval` panics on a zero period.
            interval: bot_config.interval().max(Duration::from_millis(1)),
            bot_config_id,
            quote_source,
            tracker: PriceTracker::new(bot_config.threshold_pct),
            alerts,
            running: AtomicBool::new(false),
        }
    }

    pub fn pairs(&self) -> &[String] {
        &self.pairs
    }

    pub fn tracker(&self) -> &PriceTracker {
        &self.tracker
    }

    /// True from a successful `start` until the polling task has fully exited.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawns the polling loop.
    ///
    /// Fails with `AlreadyRunning` while a previous loop is still alive,
    /// including one that was asked to stop but is finishing its last tick.
    pub fn start(self: &Arc<Self>) -> Result<MonitorHandle, EngineError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning);
        }

        tracing::info!(
            pairs = ?self.pairs,
            interval_ms = self.interval.as_millis() as u64,
            threshold_pct = %self.tracker.threshold_pct(),
            bot_config_id = self.bot_config_id,
            "Starting price monitor."
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let monitor = Arc::clone(self);
        let task = tokio::spawn(async move {
            let _running = RunningGuard(&monitor.running);
            monitor.run(stop_rx).await;
            tracing::info!("Price monitor stopped.");
        });

        Ok(MonitorHandle {
            stop: StopSignal(Arc::new(stop_tx)),
            task,
        })
    }

    async fn run(&self, mut stop_rx: watch::Receiver<bool>) {
        let mut timer = interval(self.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            // The first tick completes immediately, so pairs are seeded right away.
            tokio::select! {
                biased;
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                    continue;
                }
                _ = timer.tick() => {}
            }

            if *stop_rx.borrow() {
                break;
            }

            // Not raced against the stop signal: an in-flight tick always completes.
            let summary = self.run_tick().await;
            tracing::debug!(
                polled = summary.pairs_polled,
                failures = summary.failures,
                alerts = summary.alerts.len(),
                "Tick complete."
            );
        }
    }

    /// Polls every pair once and processes the results.
    ///
    /// A failure for one pair is logged and counted; it never prevents the
    /// other pairs of the same tick from being fetched or processed.
    pub async fn run_tick(&self) -> TickSummary {
        let outcomes = join_all(self.pairs.iter().map(|pair| self.process_pair(pair))).await;

        let mut summary = TickSummary {
            pairs_polled: self.pairs.len(),
            ..TickSummary::default()
        };

        for (pair, outcome) in self.pairs.iter().zip(outcomes) {
            match outcome {
                Ok(Some(record)) => summary.alerts.push(record),
                Ok(None) => {}
                Err(e) => {
                    summary.failures += 1;
                    tracing::warn!(pair = %pair, error = %e, "Skipping pair for this tick.");
                }
            }
        }

        summary
    }

    async fn process_pair(&self, pair: &str) -> Result<Option<AlertRecord>, EngineError> {
        let price = self
            .quote_source
            .fetch_price(pair)
            .await
            .map_err(|source| EngineError::Fetch { pair: pair.to_string(), source })?;

        let Some(event) = self.tracker.record_and_compare(pair, price)? else {
            return Ok(None);
        };

        Ok(Some(self.alerts.emit(event, self.bot_config_id).await))
    }
}

/// Clears the running flag when the polling task exits, including by panic.
struct RunningGuard<'a>(&'a AtomicBool);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// A cloneable way to ask a running monitor to stop.
#[derive(Clone)]
pub struct StopSignal(Arc<watch::Sender<bool>>);

impl StopSignal {
    /// Requests a stop. No new tick begins after this returns; a tick
    /// already in progress finishes its fetches. Repeated calls are no-ops.
    pub fn stop(&self) {
        if !self.0.send_replace(true) {
            tracing::info!("Stop requested.");
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.0.borrow()
    }
}

/// Returned by `PriceMonitor::start`; controls and awaits the polling task.
pub struct MonitorHandle {
    stop: StopSignal,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Waits for the polling task to exit after a stop.
    pub async fn join(self) -> Result<(), EngineError> {
        self.task.await?;
        Ok(())
    }
}

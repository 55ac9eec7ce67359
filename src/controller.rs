//! The periodic power-cap adjustment controller.
//!
//! One controller runs per node. It owns the adjustment cycle, the daily
//! dataset refresh schedule, node initialization, and shutdown. The
//! refresh is message-passing: a background task only tells the event
//! loop that midnight has passed, and the loop itself performs the
//! refresh, so the loop stays the single writer of data-store state and
//! an adjustment never runs concurrently with a refresh.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::calc::PowerStrategy;
use crate::calc::period::period_label;
use crate::config::Config;
use crate::error::{InitError, SyncError};
use crate::node::{NodeState, NodeStateSync, keys};
use crate::powercap::PowercapManager;
use crate::store::CsvDataStore;

/// Controller lifecycle. `ShuttingDown` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Initializing,
    Running,
    ShuttingDown,
}

/// Owns the adjustment cycle and all collaborating components.
pub struct Controller<S: NodeStateSync> {
    config: Config,
    powercap: PowercapManager,
    store: CsvDataStore,
    strategy: PowerStrategy,
    sync: S,
    state: ControllerState,
    floor_warned: bool,
}

impl<S: NodeStateSync> Controller<S> {
    pub fn new(
        config: Config,
        powercap: PowercapManager,
        store: CsvDataStore,
        strategy: PowerStrategy,
        sync: S,
    ) -> Self {
        Self {
            config,
            powercap,
            store,
            strategy,
            sync,
            state: ControllerState::Uninitialized,
            floor_warned: false,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// The data store, for inspection.
    pub fn store(&self) -> &CsvDataStore {
        &self.store
    }

    /// The node state synchronizer, for inspection.
    pub fn sync(&self) -> &S {
        &self.sync
    }

    /// Loads today's dataset and initializes the node, entering the
    /// `Running` state.
    ///
    /// A failed initial load is not fatal; the controller degrades to
    /// floor behavior until data arrives.
    ///
    /// # Errors
    ///
    /// Returns an `InitError` when node initialization fails; per the
    /// startup contract this terminates the process.
    pub async fn start(&mut self) -> Result<(), InitError> {
        self.state = ControllerState::Initializing;

        let today = self.today();
        match self.store.load(today).await {
            Ok(points) => info!(day = %today, points, "initial dataset loaded"),
            Err(e) => warn!(day = %today, error = %e, "initial load failed, degrading to floor"),
        }

        self.initialize_node().await?;
        self.state = ControllerState::Running;
        Ok(())
    }

    /// Establishes the node's ceiling and provider identity exactly once.
    ///
    /// Guarded by the lifecycle marker: an already-initialized node gets
    /// no remote write.
    async fn initialize_node(&self) -> Result<(), InitError> {
        if self.sync.is_initialized().await? {
            info!("node already initialized, skipping");
            return Ok(());
        }

        let ceiling = self.powercap.find_maximum()?;
        let mut patch = NodeState::new();
        patch.insert(keys::MAX_POWER.to_string(), ceiling.to_string());
        patch.insert(keys::CURRENT_LIMIT.to_string(), ceiling.to_string());
        patch.insert(
            keys::PROVIDER.to_string(),
            self.store.provider_name().to_string(),
        );
        self.sync.set(patch).await?;
        self.sync.mark_initialized().await?;

        info!(ceiling_uw = ceiling, "node initialized");
        Ok(())
    }

    /// Runs the event loop until `shutdown` fires.
    ///
    /// An adjustment runs immediately on entry, then every stabilisation
    /// interval. A background task signals each local midnight; the loop
    /// reacts by refreshing the new day's dataset. Cancellation is
    /// cooperative: an in-flight cycle finishes, no new one starts.
    pub async fn run(&mut self, shutdown: watch::Receiver<bool>) {
        let (refresh_tx, refresh_rx) = mpsc::channel::<NaiveDate>(1);
        let midnight_task = tokio::spawn(signal_daily_refresh(self.config.timezone, refresh_tx));
        self.run_with_refresh(shutdown, refresh_rx).await;
        midnight_task.abort();
    }

    /// Event loop body with an externally supplied refresh signal.
    pub async fn run_with_refresh(
        &mut self,
        mut shutdown: watch::Receiver<bool>,
        mut refresh_rx: mpsc::Receiver<NaiveDate>,
    ) {
        let mut ticker = tokio::time::interval(self.config.stabilisation);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval_secs = self.config.stabilisation.as_secs(),
            "adjustment loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.adjust_power_cap().await {
                        warn!(error = %e, "adjustment cycle failed");
                    }
                }
                Some(day) = refresh_rx.recv() => {
                    match self.store.refresh(day).await {
                        Ok(()) => info!(day = %day, "midnight refresh completed"),
                        Err(e) => warn!(day = %day, error = %e, "midnight refresh failed"),
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        self.state = ControllerState::ShuttingDown;
        info!("controller shut down");
    }

    /// Runs one adjustment cycle against the current wall clock.
    ///
    /// # Errors
    ///
    /// Returns a `SyncError` when the remote baseline cannot be read.
    /// Everything downstream of that read is recoverable and only logged.
    pub async fn adjust_power_cap(&mut self) -> Result<(), SyncError> {
        let now = Utc::now().with_timezone(&self.config.timezone);
        self.adjust_at(now).await
    }

    /// Runs one adjustment cycle as of the given instant.
    ///
    /// Ordering within the cycle is fixed: remote read, compute,
    /// hardware write, remote write.
    pub async fn adjust_at(&mut self, now: DateTime<Tz>) -> Result<(), SyncError> {
        let remote = self.sync.get().await?;
        let Some(ceiling) = remote
            .get(keys::MAX_POWER)
            .and_then(|raw| raw.parse::<u64>().ok())
        else {
            warn!(key = keys::MAX_POWER, "remote ceiling missing or unparseable, skipping cycle");
            return Ok(());
        };

        let floor = self.config.floor_uw;
        if floor > ceiling && !self.floor_warned {
            warn!(floor_uw = floor, ceiling_uw = ceiling, "configured floor exceeds discovered ceiling");
            self.floor_warned = true;
        }

        let period = period_label(now.time());
        let source = self.strategy.compute(
            self.config.reference_max_uw,
            now.time(),
            self.store.current(),
        );
        let target = if source == 0 {
            info!(period = %period, "no data for current period, using floor");
            floor
        } else {
            source
        };

        let applied = if target > ceiling {
            ceiling
        } else if target > floor {
            target
        } else {
            floor
        };

        let failures = self.powercap.apply(applied);
        if !failures.is_empty() {
            let detail: Vec<String> = failures.iter().map(ToString::to_string).collect();
            warn!(
                failed = failures.len(),
                detail = %detail.join("; "),
                "some power limits were not applied"
            );
        }

        let mut patch = NodeState::new();
        patch.insert(keys::CURRENT_LIMIT.to_string(), applied.to_string());
        patch.insert(keys::LAST_UPDATE.to_string(), now.to_rfc3339());
        patch.insert(
            keys::PROVIDER.to_string(),
            self.store.provider_name().to_string(),
        );
        if let Some(point) = self
            .store
            .current()
            .iter()
            .find(|point| point.period == period)
        {
            patch.insert(keys::MARKET_PERIOD.to_string(), point.period.clone());
            patch.insert(
                keys::MARKET_VOLUME.to_string(),
                format!("{:.1}", point.volume),
            );
            patch.insert(
                keys::MARKET_PRICE.to_string(),
                format!("{:.2}", point.price),
            );
        }
        if let Err(e) = self.sync.set(patch).await {
            warn!(error = %e, "failed to persist node state, next cycle will retry");
        }

        info!(
            period = %period,
            source_uw = source,
            ceiling_uw = ceiling,
            floor_uw = floor,
            applied_uw = applied,
            "power cap adjusted"
        );
        Ok(())
    }

    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.config.timezone).date_naive()
    }
}

/// Sleeps until the next local midnight, signals the event loop, and
/// repeats. Recomputing the wait each round keeps the schedule aligned
/// across DST shifts.
async fn signal_daily_refresh(tz: Tz, tx: mpsc::Sender<NaiveDate>) {
    loop {
        let now = Utc::now().with_timezone(&tz);
        let Some(wait) = until_next_midnight(&now) else {
            tokio::time::sleep(std::time::Duration::from_secs(24 * 60 * 60)).await;
            continue;
        };
        info!(seconds = wait.as_secs(), "next dataset refresh scheduled");
        tokio::time::sleep(wait).await;

        let today = Utc::now().with_timezone(&tz).date_naive();
        if tx.send(today).await.is_err() {
            // Event loop is gone; nothing left to schedule.
            return;
        }
    }
}

fn until_next_midnight(now: &DateTime<Tz>) -> Option<std::time::Duration> {
    let midnight = now.date_naive().succ_opt()?.and_hms_opt(0, 0, 0)?;
    let midnight = now.timezone().from_local_datetime(&midnight).earliest()?;
    (midnight - *now).to_std().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn midnight_wait_is_positive_and_bounded() {
        let tz = chrono_tz::Europe::Paris;
        let now = tz.with_ymd_and_hms(2026, 8, 28, 13, 30, 0).single().expect("valid instant");
        let wait = until_next_midnight(&now).expect("wait");
        assert_eq!(wait.as_secs(), 10 * 3600 + 30 * 60);
    }

    #[test]
    fn midnight_wait_just_before_midnight() {
        let tz = chrono_tz::UTC;
        let now = tz.with_ymd_and_hms(2026, 8, 28, 23, 59, 59).single().expect("valid instant");
        let wait = until_next_midnight(&now).expect("wait");
        assert_eq!(wait.as_secs(), 1);
    }
}

//! Background self-update loop
//!
//! Once per interval bumps the bond's self-version and persists it. Stops
//! as soon as the shutdown signal fires, without waiting out the interval.

use crate::shutdown::Shutdown;
use crate::state::Bond;
use crate::store::BondStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Default time between self-updates
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(3600);

/// Shortest accepted interval; tokio intervals cannot have a zero period
const MIN_UPDATE_INTERVAL: Duration = Duration::from_millis(1);

pub struct Scheduler {
    bond: Bond,
    store: Arc<BondStore>,
    shutdown: Shutdown,
    period: Duration,
}

impl Scheduler {
    pub fn new(bond: Bond, store: Arc<BondStore>, shutdown: Shutdown) -> Self {
        Self {
            bond,
            store,
            shutdown,
            period: DEFAULT_UPDATE_INTERVAL,
        }
    }

    pub fn with_interval(mut self, period: Duration) -> Self {
        self.period = period.max(MIN_UPDATE_INTERVAL);
        self
    }

    /// Spawn the loop on the current tokio runtime
    pub fn spawn(self) -> JoinHandle<u64> {
        tokio::spawn(self.run())
    }

    /// Run until shutdown. Returns the number of completed cycles.
    pub async fn run(self) -> u64 {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick of a tokio interval completes immediately
        ticker.tick().await;

        info!(interval_secs = self.period.as_secs_f64(), "Self-update scheduler started");

        let mut cycles = 0;
        while self.shutdown.is_running() {
            tokio::select! {
                _ = self.shutdown.triggered() => break,
                _ = ticker.tick() => {}
            }

            self.fire().await;
            cycles += 1;
        }

        debug!(cycles, "Self-update scheduler stopped");
        cycles
    }

    async fn fire(&self) {
        self.bond.tick();

        let bond = self.bond.clone();
        let store = Arc::clone(&self.store);
        let saved = tokio::task::spawn_blocking(move || store.save_with(|| bond.snapshot())).await;

        match saved {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Saving memory failed, will retry next cycle"),
            Err(e) => warn!(error = %e, "Save task failed"),
        }
    }
}

//! Per-consumer auto-consume timers.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::error::EngineError;
use crate::handle::SimulationHandle;

struct AutoTask {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl AutoTask {
    fn is_active(&self) -> bool {
        !self.token.is_cancelled() && !self.handle.is_finished()
    }
}

/// Runs a periodic fetch for each consumer it was started for.
///
/// Timers are keyed by consumer id. Each tick re-checks cancellation under
/// the simulation lock, and a tick for a consumer that no longer exists
/// ends that timer quietly.
pub struct AutoConsumer {
    sim: SimulationHandle,
    interval: Duration,
    tasks: Mutex<HashMap<String, AutoTask>>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for AutoConsumer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutoConsumer")
            .field("interval", &self.interval)
            .field("running", &self.running())
            .finish()
    }
}

impl AutoConsumer {
    pub fn new(sim: SimulationHandle, interval: Duration) -> Self {
        Self {
            sim,
            interval,
            tasks: Mutex::new(HashMap::new()),
            shutdown: CancellationToken::new(),
        }
    }

    fn lock_tasks(&self) -> MutexGuard<'_, HashMap<String, AutoTask>> {
        match self.tasks.lock() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("auto-consume task table lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Start the timer for `consumer_id`. Returns `false` if it is already
    /// running.
    pub async fn start(&self, consumer_id: &str) -> Result<bool, EngineError> {
        let subscribed = self
            .sim
            .with(|sim| sim.consumer(consumer_id).map(|c| c.subscription.is_some()))
            .await
            .ok_or_else(|| EngineError::ConsumerNotFound(consumer_id.to_string()))?;
        if !subscribed {
            return Err(EngineError::InvalidArgument(format!(
                "consumer '{consumer_id}' has no subscription"
            )));
        }

        let mut tasks = self.lock_tasks();
        if tasks.get(consumer_id).is_some_and(AutoTask::is_active) {
            return Ok(false);
        }

        let token = self.shutdown.child_token();
        let handle = tokio::spawn(run_ticks(
            self.sim.clone(),
            consumer_id.to_string(),
            self.interval,
            token.clone(),
        ));
        tasks.insert(consumer_id.to_string(), AutoTask { token, handle });
        tracing::info!(consumer = %consumer_id, interval_ms = self.interval.as_millis() as u64, "auto-consume started");
        Ok(true)
    }

    /// Cancel the timer for `consumer_id`. Returns `true` if one was active.
    pub fn stop(&self, consumer_id: &str) -> bool {
        let Some(task) = self.lock_tasks().remove(consumer_id) else {
            return false;
        };
        let was_active = task.is_active();
        task.token.cancel();
        if was_active {
            tracing::info!(consumer = %consumer_id, "auto-consume stopped");
        }
        was_active
    }

    pub fn stop_all(&self) {
        for (id, task) in self.lock_tasks().drain() {
            task.token.cancel();
            tracing::debug!(consumer = %id, "auto-consume cancelled");
        }
    }

    pub fn is_running(&self, consumer_id: &str) -> bool {
        self.lock_tasks()
            .get(consumer_id)
            .is_some_and(AutoTask::is_active)
    }

    /// Consumer ids with an active timer, sorted.
    pub fn running(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .lock_tasks()
            .iter()
            .filter(|(_, t)| t.is_active())
            .map(|(id, _)| id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Cancel every timer and wait for them to finish.
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handles: Vec<JoinHandle<()>> =
            self.lock_tasks().drain().map(|(_, t)| t.handle).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }
}

async fn run_ticks(
    sim: SimulationHandle,
    consumer_id: String,
    period: Duration,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = sim
            .with(|s| (!token.is_cancelled()).then(|| s.consume(&consumer_id)))
            .await;
        match result {
            None => break,
            Some(Ok(outcome)) => {
                tracing::trace!(consumer = %consumer_id, ?outcome, "auto-consume tick");
            }
            Some(Err(e)) if e.is_not_found() => {
                tracing::debug!(consumer = %consumer_id, "consumer gone, auto-consume ends");
                break;
            }
            Some(Err(e)) => {
                tracing::warn!(consumer = %consumer_id, error = %e, "auto-consume tick failed");
            }
        }
    }
}

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::EngineError;
use crate::offsets::FetchOutcome;
use crate::simulation::Simulation;
use crate::snapshot::Snapshot;

/// Shared, serialized access to the simulation.
///
/// One lock guards the whole aggregate, so every closure passed to
/// [`SimulationHandle::with`] runs as a single atomic transition.
#[derive(Clone)]
pub struct SimulationHandle {
    inner: Arc<Mutex<Simulation>>,
}

impl std::fmt::Debug for SimulationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationHandle").finish_non_exhaustive()
    }
}

impl SimulationHandle {
    pub fn new(sim: Simulation) -> Self {
        Self {
            inner: Arc::new(Mutex::new(sim)),
        }
    }

    /// Run `f` with exclusive access to the simulation.
    pub async fn with<R>(&self, f: impl FnOnce(&mut Simulation) -> R) -> R {
        let mut guard = self.inner.lock().await;
        f(&mut guard)
    }

    pub async fn consume(&self, consumer_id: &str) -> Result<FetchOutcome, EngineError> {
        self.with(|sim| sim.consume(consumer_id)).await
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.with(|sim| sim.snapshot()).await
    }
}

use std::time::Duration;

use crate::config::SimConfig;
use crate::error::EngineError;
use crate::handle::SimulationHandle;
use crate::scheduler::AutoConsumer;
use crate::simulation::{EntityKind, Simulation};

/// The running engine: shared simulation state plus its auto-consume timers.
///
/// Operations that touch both (removal, reset) go through here so timers
/// never outlive the consumers they drive.
#[derive(Debug)]
pub struct Engine {
    sim: SimulationHandle,
    auto: AutoConsumer,
}

impl Engine {
    /// Build the engine from a parsed configuration.
    pub fn bootstrap(config: SimConfig) -> Result<Self, EngineError> {
        let interval = Duration::from_millis(config.auto_consume_interval_ms);
        let sim = Simulation::new(config)?;
        Ok(Self::from_simulation(sim, interval))
    }

    pub fn from_simulation(sim: Simulation, interval: Duration) -> Self {
        tracing::info!(
            topics = sim.topics().len(),
            producers = sim.producers().len(),
            consumers = sim.consumers().len(),
            "engine bootstrapped"
        );
        let sim = SimulationHandle::new(sim);
        let auto = AutoConsumer::new(sim.clone(), interval);
        Self { sim, auto }
    }

    pub fn sim(&self) -> &SimulationHandle {
        &self.sim
    }

    pub fn auto_consumer(&self) -> &AutoConsumer {
        &self.auto
    }

    /// Remove an entity; a removed consumer's timer is cancelled too.
    pub async fn remove_entity(&self, kind: EntityKind, id: &str) -> Result<(), EngineError> {
        self.sim.with(|sim| sim.remove_entity(kind, id)).await?;
        if kind == EntityKind::Consumer {
            self.auto.stop(id);
        }
        Ok(())
    }

    /// Cancel all timers and return the simulation to its initial state.
    pub async fn reset_all(&self) -> Result<(), EngineError> {
        self.auto.stop_all();
        self.sim.with(Simulation::reset_all).await
    }

    pub async fn shutdown(&self) {
        self.auto.shutdown().await;
        tracing::info!("engine stopped");
    }
}

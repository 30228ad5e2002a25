//! Read-only projection of the simulation handed to the tutor as context.

use serde::Serialize;

use crate::offsets::OffsetTable;
use crate::simulation::Simulation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub producers: Vec<String>,
    pub topics: Vec<TopicSnapshot>,
    pub consumers: Vec<ConsumerSnapshot>,
    pub group_offsets: OffsetTable,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TopicSnapshot {
    pub id: String,
    pub name: String,
    pub partitions: Vec<PartitionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionSnapshot {
    pub id: u32,
    pub message_count: usize,
    pub capacity: usize,
    pub next_offset: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumerSnapshot {
    pub name: String,
    pub group: String,
    /// Name of the subscribed topic; `None` when unsubscribed or removed.
    pub subscription: Option<String>,
    pub offset: Option<u64>,
}

impl Snapshot {
    pub fn capture(sim: &Simulation) -> Self {
        Self {
            producers: sim.producers().iter().map(|p| p.name.clone()).collect(),
            topics: sim
                .topics()
                .iter()
                .map(|t| TopicSnapshot {
                    id: t.id().to_string(),
                    name: t.name().to_string(),
                    partitions: t
                        .partitions()
                        .iter()
                        .map(|p| PartitionSnapshot {
                            id: p.id(),
                            message_count: p.len(),
                            capacity: p.capacity(),
                            next_offset: p.next_offset(),
                        })
                        .collect(),
                })
                .collect(),
            consumers: sim
                .consumers()
                .iter()
                .map(|c| ConsumerSnapshot {
                    name: c.name.clone(),
                    group: c.group.clone(),
                    subscription: c
                        .subscription
                        .as_deref()
                        .and_then(|id| sim.topic(id))
                        .map(|t| t.name().to_string()),
                    offset: c.last_consumed_offset,
                })
                .collect(),
            group_offsets: sim.offsets().clone(),
        }
    }

    /// Pretty JSON text for the tutor prompt.
    pub fn to_context_string(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "snapshot serialization failed");
            String::from("{}")
        })
    }
}

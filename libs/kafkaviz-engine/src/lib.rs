//! In-memory model of Kafka's partitioning, consumer-group offset and
//! retention semantics.

pub mod config;
pub mod engine;
pub mod error;
pub mod event_log;
pub mod handle;
pub mod offsets;
pub mod partition;
pub mod record;
pub mod router;
pub mod scheduler;
pub mod simulation;
pub mod snapshot;
pub mod topic;

pub use config::SimConfig;
pub use engine::Engine;
pub use error::EngineError;
pub use event_log::{Event, EventKind, EventLog};
pub use handle::SimulationHandle;
pub use offsets::{Delivery, FetchOutcome, OffsetTable, Unavailable};
pub use partition::PartitionLog;
pub use record::{Record, format_message_label};
pub use router::Produced;
pub use scheduler::AutoConsumer;
pub use simulation::{Consumer, EntityKind, NewConsumer, NewProducer, NewTopic, Producer, Simulation};
pub use snapshot::Snapshot;
pub use topic::{Topic, TopicRegistry};

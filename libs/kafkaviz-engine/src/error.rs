use crate::simulation::EntityKind;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(String),

    #[error("topic not found: {0}")]
    TopicNotFound(String),

    #[error("producer not found: {0}")]
    ProducerNotFound(String),

    #[error("consumer not found: {0}")]
    ConsumerNotFound(String),

    #[error("partition {partition} not found in topic '{topic}'")]
    PartitionNotFound { topic: String, partition: u32 },

    #[error("{kind} '{id}' already exists")]
    AlreadyExists { kind: EntityKind, id: String },

    #[error("partition capacity {requested} out of range 1..={max}")]
    InvalidCapacity { requested: usize, max: usize },

    #[error("topic '{0}' has no partitions")]
    EmptyTopic(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    /// Add context to the error.
    ///
    /// Only message-carrying variants are rewritten, the rest pass through.
    pub fn with_context(self, ctx: impl std::fmt::Display) -> Self {
        match self {
            EngineError::Config(msg) => EngineError::Config(format!("{ctx}: {msg}")),
            EngineError::InvalidArgument(msg) => {
                EngineError::InvalidArgument(format!("{ctx}: {msg}"))
            }
            other => other,
        }
    }

    /// `true` for the unknown-id family (topic, producer, consumer, partition).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::TopicNotFound(_)
                | EngineError::ProducerNotFound(_)
                | EngineError::ConsumerNotFound(_)
                | EngineError::PartitionNotFound { .. }
        )
    }
}

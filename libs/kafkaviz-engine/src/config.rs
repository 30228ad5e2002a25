use std::collections::HashSet;

use serde::Deserialize;

use crate::error::EngineError;
use crate::event_log::DEFAULT_EVENT_LOG_CAPACITY;
use crate::partition::DEFAULT_MAX_MESSAGES;

/// Simulation configuration, parsed from TOML.
///
/// The `topics`, `producers` and `consumers` tables describe the initial
/// state; `reset_all` returns to it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SimConfig {
    /// Retention bound given to every new partition.
    #[serde(default = "default_max_messages")]
    pub max_messages_per_partition: usize,

    /// Largest value accepted when a partition's capacity is changed.
    #[serde(default = "default_max_partition_capacity")]
    pub max_partition_capacity: usize,

    /// Largest partition count a topic may have.
    #[serde(default = "default_max_partitions_per_topic")]
    pub max_partitions_per_topic: u32,

    /// Partition count for topics created without one.
    #[serde(default = "default_new_topic_partitions")]
    pub new_topic_partitions: u32,

    #[serde(default = "default_event_log_capacity")]
    pub event_log_capacity: usize,

    /// Period of the auto-consume timer.
    #[serde(default = "default_auto_consume_interval_ms")]
    pub auto_consume_interval_ms: u64,

    #[serde(default = "default_topics")]
    pub topics: Vec<TopicConfig>,

    #[serde(default = "default_producers")]
    pub producers: Vec<ProducerConfig>,

    #[serde(default = "default_consumers")]
    pub consumers: Vec<ConsumerConfig>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TopicConfig {
    pub id: String,
    pub name: String,
    #[serde(default = "default_new_topic_partitions")]
    pub partitions: u32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProducerConfig {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConsumerConfig {
    pub id: String,
    pub name: String,
    pub group: String,
    /// Subscribed topic id.
    #[serde(default)]
    pub topic: Option<String>,
}

fn default_max_messages() -> usize {
    DEFAULT_MAX_MESSAGES
}
fn default_max_partition_capacity() -> usize {
    20
}
fn default_max_partitions_per_topic() -> u32 {
    8
}
fn default_new_topic_partitions() -> u32 {
    3
}
fn default_event_log_capacity() -> usize {
    DEFAULT_EVENT_LOG_CAPACITY
}
fn default_auto_consume_interval_ms() -> u64 {
    2000
}

fn default_topics() -> Vec<TopicConfig> {
    vec![TopicConfig {
        id: "topic-1".into(),
        name: "orders".into(),
        partitions: 2,
    }]
}

fn default_producers() -> Vec<ProducerConfig> {
    vec![ProducerConfig {
        id: "prod-1".into(),
        name: "Order Service".into(),
    }]
}

fn default_consumers() -> Vec<ConsumerConfig> {
    vec![ConsumerConfig {
        id: "cons-1".into(),
        name: "Email Sender".into(),
        group: "group-email".into(),
        topic: Some("topic-1".into()),
    }]
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            max_messages_per_partition: default_max_messages(),
            max_partition_capacity: default_max_partition_capacity(),
            max_partitions_per_topic: default_max_partitions_per_topic(),
            new_topic_partitions: default_new_topic_partitions(),
            event_log_capacity: default_event_log_capacity(),
            auto_consume_interval_ms: default_auto_consume_interval_ms(),
            topics: default_topics(),
            producers: default_producers(),
            consumers: default_consumers(),
        }
    }
}

impl SimConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse and validate configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// An empty playground: no topics, producers or consumers.
    pub fn empty() -> Self {
        Self {
            topics: Vec::new(),
            producers: Vec::new(),
            consumers: Vec::new(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        if self.max_messages_per_partition == 0 {
            return Err(EngineError::Config(
                "max_messages_per_partition must be at least 1".into(),
            ));
        }
        if self.max_messages_per_partition > self.max_partition_capacity {
            return Err(EngineError::Config(format!(
                "max_messages_per_partition ({}) exceeds max_partition_capacity ({})",
                self.max_messages_per_partition, self.max_partition_capacity
            )));
        }
        if self.new_topic_partitions == 0 {
            return Err(EngineError::Config("new_topic_partitions must be at least 1".into()));
        }
        if self.new_topic_partitions > self.max_partitions_per_topic {
            return Err(EngineError::Config(format!(
                "new_topic_partitions ({}) exceeds max_partitions_per_topic ({})",
                self.new_topic_partitions, self.max_partitions_per_topic
            )));
        }
        if self.event_log_capacity == 0 {
            return Err(EngineError::Config("event_log_capacity must be at least 1".into()));
        }
        if self.auto_consume_interval_ms == 0 {
            return Err(EngineError::Config(
                "auto_consume_interval_ms must be at least 1".into(),
            ));
        }

        let mut seen = HashSet::new();
        for topic in &self.topics {
            if topic.partitions == 0 {
                return Err(EngineError::Config(format!(
                    "topic '{}' must have at least one partition",
                    topic.id
                )));
            }
            if topic.partitions > self.max_partitions_per_topic {
                return Err(EngineError::Config(format!(
                    "topic '{}' has {} partitions, max_partitions_per_topic is {}",
                    topic.id, topic.partitions, self.max_partitions_per_topic
                )));
            }
            if !seen.insert(topic.id.as_str()) {
                return Err(EngineError::Config(format!("duplicate topic id '{}'", topic.id)));
            }
        }
        check_unique("producer", self.producers.iter().map(|p| p.id.as_str()))?;
        check_unique("consumer", self.consumers.iter().map(|c| c.id.as_str()))?;
        Ok(())
    }
}

fn check_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<(), EngineError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(EngineError::Config(format!("duplicate {kind} id '{id}'")));
        }
    }
    Ok(())
}

//! The simulation aggregate: topics, producers, consumers, the group
//! offset table and the activity log, mutated only through `&mut self`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::error::EngineError;
use crate::event_log::{Event, EventLog};
use crate::offsets::{FetchOutcome, OffsetTable, Unavailable};
use crate::record::{format_message_label, now_ms, random_id};
use crate::router::{self, Produced};
use crate::snapshot::Snapshot;
use crate::topic::{Topic, TopicRegistry};

const ENTITY_ID_LEN: usize = 5;
const RECORD_ID_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Producer {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Consumer {
    pub id: String,
    pub name: String,
    pub group: String,
    /// Subscribed topic id. May point at a removed topic.
    pub subscription: Option<String>,
    /// Display state of the last delivery; not part of group progress.
    pub last_consumed_payload: Option<String>,
    pub last_consumed_offset: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Producer,
    Consumer,
    Topic,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Producer => f.write_str("producer"),
            EntityKind::Consumer => f.write_str("consumer"),
            EntityKind::Topic => f.write_str("topic"),
        }
    }
}

impl FromStr for EntityKind {
    type Err = EngineError;

    /// Accepts singular and plural forms (`topic`, `topics`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "producer" | "producers" => Ok(EntityKind::Producer),
            "consumer" | "consumers" => Ok(EntityKind::Consumer),
            "topic" | "topics" => Ok(EntityKind::Topic),
            other => Err(EngineError::InvalidArgument(format!("unknown entity kind '{other}'"))),
        }
    }
}

/// Parameters of `create_topic`. Unset fields are generated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewTopic {
    pub id: Option<String>,
    pub name: Option<String>,
    pub partitions: Option<u32>,
}

/// Parameters of `create_producer`. Unset fields are generated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProducer {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Parameters of `add_consumer`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewConsumer {
    pub group: String,
    /// Topic to subscribe to; the first topic when unset.
    #[serde(default)]
    pub topic: Option<String>,
    /// Display name; `Consumer-<n>` when unset or blank.
    #[serde(default)]
    pub name: Option<String>,
}

pub struct Simulation {
    config: SimConfig,
    topics: TopicRegistry,
    producers: Vec<Producer>,
    consumers: Vec<Consumer>,
    offsets: OffsetTable,
    events: EventLog,
    message_seq: u64,
    consumer_seq: u64,
    rng: StdRng,
}

impl fmt::Debug for Simulation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("topics", &self.topics.topic_ids())
            .field("producers", &self.producers.len())
            .field("consumers", &self.consumers.len())
            .finish()
    }
}

impl Simulation {
    /// Build the initial state described by `config`.
    pub fn new(config: SimConfig) -> Result<Self, EngineError> {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Same as [`Simulation::new`] with a seeded random source.
    pub fn with_seed(config: SimConfig, seed: u64) -> Result<Self, EngineError> {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: SimConfig, rng: StdRng) -> Result<Self, EngineError> {
        config.validate()?;
        let mut sim = Self {
            events: EventLog::new(config.event_log_capacity),
            config,
            topics: TopicRegistry::new(),
            producers: Vec::new(),
            consumers: Vec::new(),
            offsets: OffsetTable::new(),
            message_seq: 1,
            consumer_seq: 1,
            rng,
        };
        sim.load_initial()?;
        Ok(sim)
    }

    fn load_initial(&mut self) -> Result<(), EngineError> {
        let mut topics = TopicRegistry::new();
        for t in &self.config.topics {
            topics.register(Topic::new(
                t.id.clone(),
                t.name.clone(),
                t.partitions,
                self.config.max_messages_per_partition,
            )?)?;
        }
        self.topics = topics;
        self.producers = self
            .config
            .producers
            .iter()
            .map(|p| Producer { id: p.id.clone(), name: p.name.clone() })
            .collect();
        self.consumers = self
            .config
            .consumers
            .iter()
            .map(|c| Consumer {
                id: c.id.clone(),
                name: c.name.clone(),
                group: c.group.clone(),
                subscription: c.topic.clone(),
                last_consumed_payload: None,
                last_consumed_offset: None,
            })
            .collect();
        self.offsets.clear();
        self.message_seq = 1;
        self.consumer_seq = 1;
        Ok(())
    }

    /// Return to the configured initial state. Offsets, counters and the
    /// activity log are cleared.
    pub fn reset_all(&mut self) -> Result<(), EngineError> {
        self.load_initial()?;
        self.events.clear();
        self.events.info("Simulation reset.");
        tracing::info!(
            topics = self.topics.len(),
            producers = self.producers.len(),
            consumers = self.consumers.len(),
            "simulation reset"
        );
        Ok(())
    }

    // -----------------------------------------------------------------
    // Administrative operations
    // -----------------------------------------------------------------

    /// Create a topic. A caller-supplied id must be unused; a generated
    /// one is drawn again until it is.
    pub fn create_topic(&mut self, spec: NewTopic) -> Result<&Topic, EngineError> {
        let partitions = spec.partitions.unwrap_or(self.config.new_topic_partitions);
        if partitions > self.config.max_partitions_per_topic {
            return Err(EngineError::InvalidArgument(format!(
                "topic cannot have {partitions} partitions, the limit is {}",
                self.config.max_partitions_per_topic
            )));
        }

        let (id, suffix) = match spec.id {
            Some(id) => (id, None),
            None => loop {
                let suffix = random_id(&mut self.rng, ENTITY_ID_LEN);
                let id = format!("topic-{suffix}");
                if !self.topics.contains(&id) {
                    break (id, Some(suffix));
                }
            },
        };
        let name = match spec.name {
            Some(name) => name,
            None => {
                let suffix = suffix.unwrap_or_else(|| random_id(&mut self.rng, ENTITY_ID_LEN));
                format!("Topic-{suffix}")
            }
        };

        let topic = Topic::new(id, name, partitions, self.config.max_messages_per_partition)?;
        let topic = self.topics.register(topic)?;
        self.events.success(format!("Created new Topic: {}", topic.name()));
        tracing::info!(topic = %topic.id(), name = %topic.name(), partitions, "created topic");
        Ok(topic)
    }

    pub fn create_producer(&mut self, spec: NewProducer) -> Result<&Producer, EngineError> {
        let id = match spec.id {
            Some(id) if self.producer(&id).is_some() => {
                return Err(EngineError::AlreadyExists { kind: EntityKind::Producer, id });
            }
            Some(id) => id,
            None => {
                let mut id = random_id(&mut self.rng, ENTITY_ID_LEN);
                while self.producer(&id).is_some() {
                    id = random_id(&mut self.rng, ENTITY_ID_LEN);
                }
                id
            }
        };
        let name = spec.name.unwrap_or_else(|| format!("Producer-{id}"));

        tracing::info!(producer = %id, name = %name, "created producer");
        self.events.info(format!("Added new Producer: {name}"));
        self.producers.push(Producer { id, name });
        Ok(&self.producers[self.producers.len() - 1])
    }

    /// Add a consumer to `group`, creating the group implicitly.
    pub fn add_consumer(&mut self, spec: NewConsumer) -> Result<&Consumer, EngineError> {
        let group = spec.group.trim().to_string();
        if group.is_empty() {
            return Err(EngineError::InvalidArgument("consumer group id is empty".into()));
        }

        let name = match spec.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => {
                let name = format!("Consumer-{}", self.consumer_seq);
                self.consumer_seq += 1;
                name
            }
        };
        let subscription = spec
            .topic
            .filter(|t| !t.is_empty())
            .or_else(|| self.topics.first().map(|t| t.id().to_string()));

        let mut id = random_id(&mut self.rng, ENTITY_ID_LEN);
        while self.consumer(&id).is_some() {
            id = random_id(&mut self.rng, ENTITY_ID_LEN);
        }

        tracing::info!(consumer = %id, name = %name, group = %group, topic = ?subscription, "added consumer");
        self.events.info(format!("Added {name} to Group \"{group}\""));
        self.consumers.push(Consumer {
            id,
            name,
            group,
            subscription,
            last_consumed_payload: None,
            last_consumed_offset: None,
        });
        Ok(&self.consumers[self.consumers.len() - 1])
    }

    /// Remove an entity. Group offsets and subscriptions that refer to it
    /// are left in place.
    pub fn remove_entity(&mut self, kind: EntityKind, id: &str) -> Result<(), EngineError> {
        let name = match kind {
            EntityKind::Producer => {
                let pos = self
                    .producers
                    .iter()
                    .position(|p| p.id == id)
                    .ok_or_else(|| EngineError::ProducerNotFound(id.to_string()))?;
                self.producers.remove(pos).name
            }
            EntityKind::Consumer => {
                let pos = self
                    .consumers
                    .iter()
                    .position(|c| c.id == id)
                    .ok_or_else(|| EngineError::ConsumerNotFound(id.to_string()))?;
                self.consumers.remove(pos).name
            }
            EntityKind::Topic => self
                .topics
                .remove(id)
                .ok_or_else(|| EngineError::TopicNotFound(id.to_string()))?
                .name()
                .to_string(),
        };

        let label = match kind {
            EntityKind::Producer => "Producer",
            EntityKind::Consumer => "Consumer",
            EntityKind::Topic => "Topic",
        };
        self.events.info(format!("Removed {label}: {name}"));
        tracing::info!(kind = %kind, id, "removed entity");
        Ok(())
    }

    /// Point a consumer at another topic. Only its display state is reset;
    /// the group's committed offsets stay as they are.
    pub fn subscribe(&mut self, consumer_id: &str, topic_id: &str) -> Result<(), EngineError> {
        let topic_name = self
            .topics
            .get(topic_id)
            .map(|t| t.name().to_string())
            .ok_or_else(|| EngineError::TopicNotFound(topic_id.to_string()))?;
        let consumer = self
            .consumers
            .iter_mut()
            .find(|c| c.id == consumer_id)
            .ok_or_else(|| EngineError::ConsumerNotFound(consumer_id.to_string()))?;

        consumer.subscription = Some(topic_id.to_string());
        consumer.last_consumed_payload = None;
        consumer.last_consumed_offset = None;

        tracing::info!(consumer = %consumer_id, topic = %topic_id, "updated subscription");
        let text = format!("{} subscribed to topic {topic_name}", consumer.name);
        self.events.info(text);
        Ok(())
    }

    pub fn set_partition_capacity(
        &mut self,
        topic_id: &str,
        partition: u32,
        limit: usize,
    ) -> Result<(), EngineError> {
        let max = self.config.max_partition_capacity;
        if !(1..=max).contains(&limit) {
            return Err(EngineError::InvalidCapacity { requested: limit, max });
        }
        let topic = self
            .topics
            .get_mut(topic_id)
            .ok_or_else(|| EngineError::TopicNotFound(topic_id.to_string()))?;
        let log = topic.partition_mut(partition).ok_or_else(|| EngineError::PartitionNotFound {
            topic: topic_id.to_string(),
            partition,
        })?;
        log.set_capacity(limit);

        tracing::info!(topic = %topic_id, partition, limit, "updated partition capacity");
        self.events.info(format!(
            "Updated partition limit for {topic_id} / Part-{partition} to {limit}"
        ));
        Ok(())
    }

    // -----------------------------------------------------------------
    // Write path
    // -----------------------------------------------------------------

    /// Append a record to `topic_id` on behalf of `producer_id`.
    ///
    /// Without a payload, `Msg-<n>` from the global message counter is used.
    /// Keyed records are routed by key hash, keyless ones at random.
    pub fn produce(
        &mut self,
        producer_id: &str,
        topic_id: &str,
        key: Option<&str>,
        payload: Option<String>,
    ) -> Result<Produced, EngineError> {
        if self.producer(producer_id).is_none() {
            return Err(EngineError::ProducerNotFound(producer_id.to_string()));
        }
        let topic = self
            .topics
            .get_mut(topic_id)
            .ok_or_else(|| EngineError::TopicNotFound(topic_id.to_string()))?;

        let payload = payload.unwrap_or_else(|| format!("Msg-{}", self.message_seq));
        self.message_seq += 1;
        let record_id = random_id(&mut self.rng, RECORD_ID_LEN);

        let produced = router::route(topic, key, record_id, payload, now_ms(), &mut self.rng)?;
        let topic_name = topic.name().to_string();

        for old in &produced.evicted {
            tracing::warn!(
                topic = %topic_id,
                partition = produced.partition,
                offset = old.offset,
                "retention evicted record"
            );
            self.events.warning(format!(
                "Retention: Oldest message expired in {topic_name} [Part-{}]",
                produced.partition
            ));
        }

        tracing::info!(
            producer = %producer_id,
            topic = %topic_id,
            partition = produced.partition,
            offset = produced.record.offset,
            "produced record"
        );
        self.events.success(format!(
            "Produced \"{}\" to {topic_name} [Part-{}]",
            format_message_label(Some(&produced.record.payload), Some(produced.record.offset)),
            produced.partition
        ));
        Ok(produced)
    }

    // -----------------------------------------------------------------
    // Read path
    // -----------------------------------------------------------------

    /// Fetch and commit the next record for a consumer's group.
    ///
    /// Unknown consumers are an error; a missing or dangling subscription
    /// is reported as [`FetchOutcome::Unavailable`].
    pub fn consume(&mut self, consumer_id: &str) -> Result<FetchOutcome, EngineError> {
        let idx = self
            .consumers
            .iter()
            .position(|c| c.id == consumer_id)
            .ok_or_else(|| EngineError::ConsumerNotFound(consumer_id.to_string()))?;
        let consumer = &self.consumers[idx];

        let Some(topic_id) = consumer.subscription.as_deref() else {
            tracing::debug!(consumer = %consumer_id, "consume without subscription");
            return Ok(FetchOutcome::Unavailable(Unavailable::NoSubscription));
        };
        let Some(topic) = self.topics.get(topic_id) else {
            tracing::debug!(consumer = %consumer_id, topic = %topic_id, "subscribed topic is gone");
            return Ok(FetchOutcome::Unavailable(Unavailable::TopicRemoved(topic_id.to_string())));
        };

        let outcome = self.offsets.fetch(&consumer.group, topic);

        let consumer = &mut self.consumers[idx];
        match &outcome {
            FetchOutcome::Consumed(delivery) | FetchOutcome::OffsetReset { delivery, .. } => {
                if let FetchOutcome::OffsetReset { expected, .. } = &outcome {
                    tracing::warn!(
                        group = %consumer.group,
                        topic = %delivery.topic_id,
                        partition = delivery.partition,
                        expected,
                        offset = delivery.record.offset,
                        "offset reset, skipping evicted records"
                    );
                    self.events.error(format!(
                        "Group {} offset reset: Skipping from offset {expected} to {} on Part-{}",
                        consumer.group, delivery.record.offset, delivery.partition
                    ));
                }
                consumer.last_consumed_payload = Some(delivery.record.payload.clone());
                consumer.last_consumed_offset = Some(delivery.record.offset);

                tracing::info!(
                    consumer = %consumer.id,
                    group = %consumer.group,
                    topic = %delivery.topic_id,
                    partition = delivery.partition,
                    offset = delivery.record.offset,
                    "consumed record"
                );
                self.events.info(format!(
                    "{} consumed \"{}\" from [Part-{}]",
                    consumer.name,
                    format_message_label(
                        Some(&delivery.record.payload),
                        Some(delivery.record.offset)
                    ),
                    delivery.partition
                ));
            }
            FetchOutcome::Empty => {
                tracing::debug!(consumer = %consumer.id, group = %consumer.group, "caught up");
                self.events
                    .info(format!("{} is caught up. No messages available.", consumer.name));
            }
            FetchOutcome::Unavailable(_) => {}
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------
    // Read-only views
    // -----------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn topics(&self) -> &TopicRegistry {
        &self.topics
    }

    pub fn topic(&self, id: &str) -> Option<&Topic> {
        self.topics.get(id)
    }

    pub fn producers(&self) -> &[Producer] {
        &self.producers
    }

    pub fn producer(&self, id: &str) -> Option<&Producer> {
        self.producers.iter().find(|p| p.id == id)
    }

    pub fn consumers(&self) -> &[Consumer] {
        &self.consumers
    }

    pub fn consumer(&self, id: &str) -> Option<&Consumer> {
        self.consumers.iter().find(|c| c.id == id)
    }

    pub fn offsets(&self) -> &OffsetTable {
        &self.offsets
    }

    /// Activity log, newest first.
    pub fn events(&self) -> Vec<Event> {
        self.events.recent()
    }

    /// Distinct group ids of the current consumers, sorted.
    pub fn groups(&self) -> Vec<String> {
        self.consumers
            .iter()
            .map(|c| c.group.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_log::EventKind;

    fn sim() -> Simulation {
        Simulation::with_seed(SimConfig::default(), 11).unwrap()
    }

    #[test]
    fn initial_state_follows_config() {
        let sim = sim();
        assert_eq!(sim.topics().topic_ids(), vec!["topic-1"]);
        assert_eq!(sim.producers()[0].name, "Order Service");
        assert_eq!(sim.consumers()[0].subscription.as_deref(), Some("topic-1"));
        assert!(sim.offsets().is_empty());
        assert!(sim.events().is_empty());
    }

    #[test]
    fn generated_names_and_ids() {
        let mut sim = sim();
        let topic = sim.create_topic(NewTopic::default()).unwrap().clone();
        assert!(topic.id().starts_with("topic-"));
        assert!(topic.name().starts_with("Topic-"));
        assert_eq!(topic.partitions().len(), 3);

        let producer = sim.create_producer(NewProducer::default()).unwrap().clone();
        assert_eq!(producer.name, format!("Producer-{}", producer.id));

        let c1 = sim
            .add_consumer(NewConsumer { group: "g".into(), ..Default::default() })
            .unwrap()
            .clone();
        let c2 = sim
            .add_consumer(NewConsumer { group: "g".into(), name: Some("  ".into()), ..Default::default() })
            .unwrap()
            .clone();
        assert_eq!(c1.name, "Consumer-1");
        assert_eq!(c2.name, "Consumer-2");
        assert_eq!(c1.subscription.as_deref(), Some("topic-1"));
    }

    #[test]
    fn partition_count_is_capped() {
        let mut sim = sim();
        for partitions in [9, u32::MAX] {
            let err = sim
                .create_topic(NewTopic { partitions: Some(partitions), ..Default::default() })
                .unwrap_err();
            assert!(matches!(err, EngineError::InvalidArgument(_)), "{err}");
        }
        assert_eq!(sim.topics().len(), 1);

        let topic = sim
            .create_topic(NewTopic { partitions: Some(8), ..Default::default() })
            .unwrap();
        assert_eq!(topic.partitions().len(), 8);
    }

    #[test]
    fn generated_ids_skip_taken_ones() {
        let first_topic = sim().create_topic(NewTopic::default()).unwrap().id().to_string();
        let first_producer = sim().create_producer(NewProducer::default()).unwrap().id.clone();

        let mut sim = sim();
        sim.create_topic(NewTopic {
            id: Some(first_topic.clone()),
            name: Some("taken".into()),
            partitions: Some(1),
        })
        .unwrap();
        let topic = sim.create_topic(NewTopic::default()).unwrap();
        assert_ne!(topic.id(), first_topic);
        assert_eq!(sim.topics().len(), 3);

        let mut sim = self::sim();
        sim.create_producer(NewProducer { id: Some(first_producer.clone()), name: None })
            .unwrap();
        let producer = sim.create_producer(NewProducer::default()).unwrap();
        assert_ne!(producer.id, first_producer);
        assert_eq!(sim.producers().len(), 3);
    }

    #[test]
    fn supplied_ids_must_be_unused() {
        let mut sim = sim();
        let err = sim
            .create_producer(NewProducer { id: Some("prod-1".into()), name: None })
            .unwrap_err();
        assert!(matches!(err, EngineError::AlreadyExists { kind: EntityKind::Producer, .. }));

        let err = sim
            .create_topic(NewTopic { id: Some("topic-1".into()), ..Default::default() })
            .unwrap_err();
        assert!(matches!(err, EngineError::AlreadyExists { kind: EntityKind::Topic, .. }));
    }

    #[test]
    fn blank_group_is_rejected() {
        let mut sim = sim();
        let err = sim.add_consumer(NewConsumer { group: " ".into(), ..Default::default() });
        assert!(matches!(err, Err(EngineError::InvalidArgument(_))));
    }

    #[test]
    fn produce_generates_sequential_payloads() {
        let mut sim = sim();
        let a = sim.produce("prod-1", "topic-1", None, None).unwrap();
        let b = sim.produce("prod-1", "topic-1", None, None).unwrap();
        assert_eq!(a.record.payload, "Msg-1");
        assert_eq!(b.record.payload, "Msg-2");
        assert_eq!(sim.events()[0].kind, EventKind::Success);
    }

    #[test]
    fn produce_rejects_unknown_ids() {
        let mut sim = sim();
        assert_eq!(
            sim.produce("nope", "topic-1", None, None).unwrap_err(),
            EngineError::ProducerNotFound("nope".into())
        );
        assert_eq!(
            sim.produce("prod-1", "nope", None, None).unwrap_err(),
            EngineError::TopicNotFound("nope".into())
        );
    }

    #[test]
    fn keyed_records_stick_to_one_partition() {
        let mut sim = sim();
        let partitions: BTreeSet<u32> = (0..10)
            .map(|_| sim.produce("prod-1", "topic-1", Some("order-9"), None).unwrap().partition)
            .collect();
        assert_eq!(partitions.len(), 1);
    }

    #[test]
    fn eviction_is_logged_as_warning() {
        let mut sim = sim();
        sim.set_partition_capacity("topic-1", 0, 1).unwrap();
        sim.set_partition_capacity("topic-1", 1, 1).unwrap();
        for _ in 0..3 {
            sim.produce("prod-1", "topic-1", None, None).unwrap();
        }
        assert!(sim.events().iter().any(|e| e.kind == EventKind::Warning));
    }

    #[test]
    fn capacity_bounds_are_enforced() {
        let mut sim = sim();
        assert_eq!(
            sim.set_partition_capacity("topic-1", 0, 0).unwrap_err(),
            EngineError::InvalidCapacity { requested: 0, max: 20 }
        );
        assert!(matches!(
            sim.set_partition_capacity("topic-1", 0, 21),
            Err(EngineError::InvalidCapacity { .. })
        ));
        assert!(matches!(
            sim.set_partition_capacity("topic-1", 9, 3),
            Err(EngineError::PartitionNotFound { partition: 9, .. })
        ));
        sim.set_partition_capacity("topic-1", 1, 20).unwrap();
        assert_eq!(sim.topic("topic-1").unwrap().partition(1).unwrap().capacity(), 20);
    }

    #[test]
    fn consume_reports_dangling_subscription() {
        let mut sim = sim();
        sim.remove_entity(EntityKind::Topic, "topic-1").unwrap();
        assert_eq!(
            sim.consume("cons-1").unwrap(),
            FetchOutcome::Unavailable(Unavailable::TopicRemoved("topic-1".into()))
        );
        assert_eq!(
            sim.consume("missing").unwrap_err(),
            EngineError::ConsumerNotFound("missing".into())
        );
    }

    #[test]
    fn consume_without_subscription() {
        let mut sim = Simulation::with_seed(SimConfig::empty(), 1).unwrap();
        let id = sim
            .add_consumer(NewConsumer { group: "g".into(), ..Default::default() })
            .unwrap()
            .id
            .clone();
        assert_eq!(
            sim.consume(&id).unwrap(),
            FetchOutcome::Unavailable(Unavailable::NoSubscription)
        );
    }

    #[test]
    fn subscribe_resets_display_only() {
        let mut sim = sim();
        sim.produce("prod-1", "topic-1", None, None).unwrap();
        sim.consume("cons-1").unwrap();
        assert!(sim.consumer("cons-1").unwrap().last_consumed_payload.is_some());

        let other = sim.create_topic(NewTopic { id: Some("t2".into()), ..Default::default() }).unwrap();
        let other_id = other.id().to_string();
        let committed_before = sim.offsets().clone();

        sim.subscribe("cons-1", &other_id).unwrap();
        let consumer = sim.consumer("cons-1").unwrap();
        assert_eq!(consumer.subscription.as_deref(), Some("t2"));
        assert_eq!(consumer.last_consumed_payload, None);
        assert_eq!(sim.offsets(), &committed_before);

        assert!(matches!(
            sim.subscribe("cons-1", "ghost"),
            Err(EngineError::TopicNotFound(_))
        ));
    }

    #[test]
    fn removal_reports_unknown_ids() {
        let mut sim = sim();
        assert!(matches!(
            sim.remove_entity(EntityKind::Producer, "x"),
            Err(EngineError::ProducerNotFound(_))
        ));
        sim.remove_entity(EntityKind::Producer, "prod-1").unwrap();
        assert!(sim.producers().is_empty());
    }

    #[test]
    fn group_offsets_survive_consumer_removal() {
        let mut sim = sim();
        sim.set_partition_capacity("topic-1", 0, 20).unwrap();
        for _ in 0..4 {
            sim.produce("prod-1", "topic-1", None, None).unwrap();
        }
        sim.consume("cons-1").unwrap();
        sim.remove_entity(EntityKind::Consumer, "cons-1").unwrap();

        let replacement = sim
            .add_consumer(NewConsumer {
                group: "group-email".into(),
                topic: Some("topic-1".into()),
                name: Some("Replacement".into()),
            })
            .unwrap()
            .id
            .clone();

        let mut seen = 1;
        while sim.consume(&replacement).unwrap().delivery().is_some() {
            seen += 1;
        }
        assert_eq!(seen, 4);
    }

    #[test]
    fn groups_are_distinct_and_sorted() {
        let mut sim = sim();
        for group in ["zeta", "alpha", "zeta"] {
            sim.add_consumer(NewConsumer { group: group.into(), ..Default::default() })
                .unwrap();
        }
        assert_eq!(sim.groups(), vec!["alpha", "group-email", "zeta"]);
    }

    #[test]
    fn entity_kind_parses_plural_paths() {
        assert_eq!("topics".parse::<EntityKind>().unwrap(), EntityKind::Topic);
        assert_eq!("consumer".parse::<EntityKind>().unwrap(), EntityKind::Consumer);
        assert!("brokers".parse::<EntityKind>().is_err());
    }
}

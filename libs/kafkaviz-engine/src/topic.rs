use serde::Serialize;

use crate::error::EngineError;
use crate::partition::PartitionLog;

/// A named set of partition logs. Partitions are fixed at creation and
/// kept in ascending index order.
#[derive(Debug, Clone, Serialize)]
pub struct Topic {
    id: String,
    name: String,
    partitions: Vec<PartitionLog>,
}

impl Topic {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        partitions: u32,
        capacity: usize,
    ) -> Result<Self, EngineError> {
        let id = id.into();
        if partitions == 0 {
            return Err(EngineError::EmptyTopic(id));
        }
        Ok(Self {
            id,
            name: name.into(),
            partitions: (0..partitions)
                .map(|p| PartitionLog::new(p, capacity))
                .collect(),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partitions(&self) -> &[PartitionLog] {
        &self.partitions
    }

    pub fn partition(&self, id: u32) -> Option<&PartitionLog> {
        self.partitions.iter().find(|p| p.id() == id)
    }

    pub(crate) fn partition_mut(&mut self, id: u32) -> Option<&mut PartitionLog> {
        self.partitions.iter_mut().find(|p| p.id() == id)
    }

    pub(crate) fn partition_at_mut(&mut self, index: usize) -> Option<&mut PartitionLog> {
        self.partitions.get_mut(index)
    }

    /// Total resident records across partitions.
    pub fn resident_records(&self) -> usize {
        self.partitions.iter().map(PartitionLog::len).sum()
    }
}

/// Registry of all topics, in creation order.
#[derive(Debug, Clone, Default)]
pub struct TopicRegistry {
    topics: Vec<Topic>,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a topic. Fails if the id is taken.
    pub fn register(&mut self, topic: Topic) -> Result<&Topic, EngineError> {
        if self.contains(topic.id()) {
            return Err(EngineError::AlreadyExists {
                kind: crate::simulation::EntityKind::Topic,
                id: topic.id().to_string(),
            });
        }
        self.topics.push(topic);
        Ok(&self.topics[self.topics.len() - 1])
    }

    pub fn get(&self, id: &str) -> Option<&Topic> {
        self.topics.iter().find(|t| t.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Topic> {
        self.topics.iter_mut().find(|t| t.id == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Topic> {
        let pos = self.topics.iter().position(|t| t.id == id)?;
        Some(self.topics.remove(pos))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.topics.iter().any(|t| t.id == id)
    }

    pub fn first(&self) -> Option<&Topic> {
        self.topics.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Topic> {
        self.topics.iter()
    }

    pub fn topic_ids(&self) -> Vec<String> {
        self.topics.iter().map(|t| t.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

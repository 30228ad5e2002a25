//! Consumer group commit offsets and the fused fetch+commit.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::record::Record;
use crate::topic::Topic;

/// group -> topic -> partition -> next offset to read.
type GroupOffsets = BTreeMap<String, BTreeMap<String, BTreeMap<u32, u64>>>;

/// Commit-offset table shared by all consumer groups.
///
/// Groups come into existence on first commit and are never dropped,
/// except by [`OffsetTable::clear`]. Missing entries read as 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct OffsetTable {
    groups: GroupOffsets,
}

/// A record handed to a consumer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Delivery {
    pub topic_id: String,
    pub partition: u32,
    pub record: Record,
}

/// Why a consumer cannot read at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "topic", rename_all = "snake_case")]
pub enum Unavailable {
    /// The consumer has no subscription.
    NoSubscription,
    /// The subscribed topic no longer exists.
    TopicRemoved(String),
}

/// Outcome of a fetch. None of these are errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The record at the committed position was delivered.
    Consumed(Delivery),
    /// The committed position was already evicted; the group skipped
    /// forward to the oldest resident record of that partition.
    OffsetReset { delivery: Delivery, expected: u64 },
    /// The group is caught up on every partition.
    Empty,
    /// Nothing can be read (no subscription, topic gone).
    Unavailable(Unavailable),
}

impl FetchOutcome {
    pub fn delivery(&self) -> Option<&Delivery> {
        match self {
            FetchOutcome::Consumed(d) | FetchOutcome::OffsetReset { delivery: d, .. } => Some(d),
            FetchOutcome::Empty | FetchOutcome::Unavailable(_) => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, FetchOutcome::Empty)
    }

    pub fn is_reset(&self) -> bool {
        matches!(self, FetchOutcome::OffsetReset { .. })
    }
}

impl OffsetTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next offset `group` will read from `topic`/`partition`.
    pub fn committed(&self, group: &str, topic: &str, partition: u32) -> u64 {
        self.groups
            .get(group)
            .and_then(|topics| topics.get(topic))
            .and_then(|partitions| partitions.get(&partition))
            .copied()
            .unwrap_or(0)
    }

    /// Store `next` as the group's position. Positions never move back.
    pub fn commit(&mut self, group: &str, topic: &str, partition: u32, next: u64) {
        let slot = self
            .groups
            .entry(group.to_string())
            .or_default()
            .entry(topic.to_string())
            .or_default()
            .entry(partition)
            .or_insert(0);
        *slot = (*slot).max(next);
    }

    /// Read the next record for `group` from `topic` and commit past it.
    ///
    /// Partitions are scanned in ascending index order and the first one
    /// holding the committed offset wins. A partition whose oldest
    /// resident record is newer than the committed offset lost data to
    /// retention; it is fast-forwarded to that oldest record. At most one
    /// record is returned per call.
    pub fn fetch(&mut self, group: &str, topic: &Topic) -> FetchOutcome {
        for partition in topic.partitions() {
            let expected = self.committed(group, topic.id(), partition.id());

            let (record, reset) = if let Some(record) = partition.lookup(expected) {
                (record, false)
            } else {
                match partition.oldest() {
                    Some(oldest) if oldest.offset > expected => (oldest, true),
                    _ => continue,
                }
            };

            self.commit(group, topic.id(), partition.id(), record.offset + 1);
            let delivery = Delivery {
                topic_id: topic.id().to_string(),
                partition: partition.id(),
                record: record.clone(),
            };
            return if reset {
                FetchOutcome::OffsetReset { delivery, expected }
            } else {
                FetchOutcome::Consumed(delivery)
            };
        }
        FetchOutcome::Empty
    }

    /// Group ids with at least one commit.
    pub fn groups(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic_with(partitions: u32, capacity: usize) -> Topic {
        Topic::new("t", "T", partitions, capacity).unwrap()
    }

    fn append(topic: &mut Topic, partition: u32, n: usize) {
        let log = topic.partition_mut(partition).unwrap();
        for i in 0..n {
            log.append(format!("id-{i}"), format!("Msg-{i}"), 0);
        }
    }

    #[test]
    fn unseen_keys_read_as_zero() {
        let table = OffsetTable::new();
        assert_eq!(table.committed("g", "t", 0), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn commit_never_moves_backwards() {
        let mut table = OffsetTable::new();
        table.commit("g", "t", 0, 5);
        table.commit("g", "t", 0, 3);
        assert_eq!(table.committed("g", "t", 0), 5);
    }

    #[test]
    fn fetch_reads_in_order_then_reports_empty() {
        let mut topic = topic_with(1, 5);
        append(&mut topic, 0, 2);
        let mut table = OffsetTable::new();

        let first = table.fetch("g", &topic);
        assert_eq!(first.delivery().map(|d| d.record.offset), Some(0));
        let second = table.fetch("g", &topic);
        assert_eq!(second.delivery().map(|d| d.record.offset), Some(1));
        assert_eq!(table.fetch("g", &topic), FetchOutcome::Empty);
        assert_eq!(table.fetch("g", &topic), FetchOutcome::Empty);
        assert_eq!(table.committed("g", "t", 0), 2);
    }

    #[test]
    fn lower_partitions_are_drained_first() {
        let mut topic = topic_with(3, 5);
        append(&mut topic, 2, 1);
        append(&mut topic, 0, 2);
        let mut table = OffsetTable::new();

        let partitions: Vec<u32> = (0..3)
            .filter_map(|_| table.fetch("g", &topic).delivery().map(|d| d.partition))
            .collect();
        assert_eq!(partitions, vec![0, 0, 2]);
        assert!(table.fetch("g", &topic).is_empty());
    }

    #[test]
    fn evicted_position_fast_forwards_to_oldest() {
        let mut topic = topic_with(1, 2);
        append(&mut topic, 0, 3);
        let mut table = OffsetTable::new();

        match table.fetch("fresh", &topic) {
            FetchOutcome::OffsetReset { delivery, expected } => {
                assert_eq!(expected, 0);
                assert_eq!(delivery.record.offset, 1);
            }
            other => panic!("expected reset, got {other:?}"),
        }
        assert_eq!(table.committed("fresh", "t", 0), 2);

        let next = table.fetch("fresh", &topic);
        assert!(!next.is_reset());
        assert_eq!(next.delivery().map(|d| d.record.offset), Some(2));
    }

    #[test]
    fn exact_match_never_resets() {
        let mut topic = topic_with(1, 2);
        append(&mut topic, 0, 3);
        let mut table = OffsetTable::new();
        table.commit("g", "t", 0, 1);

        let outcome = table.fetch("g", &topic);
        assert!(matches!(outcome, FetchOutcome::Consumed(_)));
        assert_eq!(outcome.delivery().map(|d| d.record.offset), Some(1));
    }

    #[test]
    fn groups_progress_independently() {
        let mut topic = topic_with(1, 5);
        append(&mut topic, 0, 1);
        let mut table = OffsetTable::new();

        assert!(table.fetch("a", &topic).delivery().is_some());
        assert!(table.fetch("b", &topic).delivery().is_some());
        assert!(table.fetch("a", &topic).is_empty());
        assert_eq!(table.groups().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn serializes_as_nested_maps() {
        let mut table = OffsetTable::new();
        table.commit("g", "t", 1, 4);
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json, serde_json::json!({ "g": { "t": { "1": 4 } } }));
    }
}

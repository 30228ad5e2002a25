//! Producer-side partition selection and the write path.
//!
//! Keyless records land on a uniformly random partition, so consecutive
//! sends visibly spread across the topic. Keyed records use Kafka's
//! default partitioner (murmur2 of the key bytes), which pins every key
//! to one partition and preserves per-key ordering.

use rand::Rng;
use serde::Serialize;

use crate::error::EngineError;
use crate::record::Record;
use crate::topic::Topic;

/// Result of a successful produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Produced {
    pub topic_id: String,
    pub partition: u32,
    pub record: Record,
    /// Records evicted from the destination partition by retention.
    pub evicted: Vec<Record>,
}

/// Pick a partition index in `0..partition_count`.
///
/// Returns `None` only for an empty topic.
pub fn select_partition<R: Rng + ?Sized>(
    partition_count: usize,
    key: Option<&str>,
    rng: &mut R,
) -> Option<usize> {
    if partition_count == 0 {
        return None;
    }
    Some(match key {
        Some(key) => (murmur2(key.as_bytes()) & 0x7fff_ffff) as usize % partition_count,
        None => rng.gen_range(0..partition_count),
    })
}

/// Route a record to one of the topic's partitions and append it.
pub fn route<R: Rng + ?Sized>(
    topic: &mut Topic,
    key: Option<&str>,
    record_id: String,
    payload: String,
    ts_ms: i64,
    rng: &mut R,
) -> Result<Produced, EngineError> {
    let topic_id = topic.id().to_string();
    let index = select_partition(topic.partitions().len(), key, rng)
        .ok_or_else(|| EngineError::EmptyTopic(topic_id.clone()))?;
    let partition = topic
        .partition_at_mut(index)
        .ok_or_else(|| EngineError::EmptyTopic(topic_id.clone()))?;

    let appended = partition.append(record_id, payload, ts_ms);
    Ok(Produced {
        topic_id,
        partition: partition.id(),
        record: appended.record,
        evicted: appended.evicted,
    })
}

/// Murmur2 as used by the Kafka Java client partitioner.
fn murmur2(data: &[u8]) -> u32 {
    const SEED: u32 = 0x9747_b28c;
    const M: u32 = 0x5bd1_e995;
    const R: u32 = 24;

    let mut h = SEED ^ data.len() as u32;

    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h = h.wrapping_mul(M);
        h ^= k;
    }

    let tail = chunks.remainder();
    if tail.len() >= 3 {
        h ^= (tail[2] as u32) << 16;
    }
    if tail.len() >= 2 {
        h ^= (tail[1] as u32) << 8;
    }
    if !tail.is_empty() {
        h ^= tail[0] as u32;
        h = h.wrapping_mul(M);
    }

    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn empty_topic_has_no_partition() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(select_partition(0, None, &mut rng), None);
        assert_eq!(select_partition(0, Some("k"), &mut rng), None);
    }

    #[test]
    fn random_routing_reaches_every_partition() {
        let mut rng = StdRng::seed_from_u64(42);
        let seen: HashSet<usize> = (0..200)
            .filter_map(|_| select_partition(3, None, &mut rng))
            .collect();
        assert_eq!(seen, HashSet::from([0, 1, 2]));
    }

    #[test]
    fn keyed_routing_is_deterministic() {
        let mut rng = StdRng::seed_from_u64(0);
        let first = select_partition(3, Some("customer-17"), &mut rng);
        for _ in 0..20 {
            assert_eq!(select_partition(3, Some("customer-17"), &mut rng), first);
        }
    }

    #[test]
    fn murmur2_matches_kafka_reference_values() {
        // Values from the Kafka client's partitioner test vectors.
        assert_eq!(murmur2(b"21") as i32, -973932308);
        assert_eq!(murmur2(b"foobar") as i32, -790332482);
        assert_eq!(murmur2(b"a-little-bit-long-string") as i32, -985981536);
        assert_eq!(murmur2(b"abc") as i32, 479470107);
    }

    #[test]
    fn route_appends_to_the_selected_partition() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut topic = Topic::new("t1", "orders", 1, 5).unwrap();

        let produced = route(&mut topic, None, "r0".into(), "Msg-1".into(), 10, &mut rng).unwrap();
        assert_eq!(produced.partition, 0);
        assert_eq!(produced.record.offset, 0);
        assert_eq!(produced.topic_id, "t1");
        assert_eq!(topic.partitions()[0].len(), 1);
    }
}

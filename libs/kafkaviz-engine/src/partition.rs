use std::collections::VecDeque;

use serde::Serialize;

use crate::record::Record;

/// Default per-partition retention bound.
pub const DEFAULT_MAX_MESSAGES: usize = 5;

/// Append-only, bounded log of one partition.
///
/// Resident records always form a contiguous run of offsets ending at
/// `next_offset - 1`. Retention drops records from the head; `next_offset`
/// never moves backwards, so offsets are never reused.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionLog {
    id: u32,
    records: VecDeque<Record>,
    capacity: usize,
    next_offset: u64,
}

/// Outcome of [`PartitionLog::append`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    pub record: Record,
    /// Records dropped from the head by retention, oldest first.
    pub evicted: Vec<Record>,
}

impl PartitionLog {
    pub fn new(id: u32, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            id,
            records: VecDeque::with_capacity(capacity.min(64) + 1),
            capacity,
            next_offset: 0,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn next_offset(&self) -> u64 {
        self.next_offset
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Oldest resident record.
    pub fn oldest(&self) -> Option<&Record> {
        self.records.front()
    }

    /// Resident records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    /// Append a record at `next_offset` and enforce retention.
    pub fn append(&mut self, id: String, payload: String, ts_ms: i64) -> Appended {
        let record = Record {
            id,
            payload,
            ts_ms,
            offset: self.next_offset,
        };
        self.next_offset += 1;
        self.records.push_back(record.clone());

        let mut evicted = Vec::new();
        while self.records.len() > self.capacity {
            if let Some(old) = self.records.pop_front() {
                evicted.push(old);
            }
        }
        Appended { record, evicted }
    }

    /// Record at `offset`, if it is still resident.
    pub fn lookup(&self, offset: u64) -> Option<&Record> {
        let head = self.records.front()?.offset;
        let idx = offset.checked_sub(head)?;
        self.records.get(usize::try_from(idx).ok()?)
    }

    /// Change the retention bound. Takes effect on the next append.
    pub(crate) fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill(log: &mut PartitionLog, n: usize) -> Vec<Appended> {
        (0..n)
            .map(|i| log.append(format!("r{i}"), format!("Msg-{i}"), 0))
            .collect()
    }

    #[test]
    fn offsets_are_assigned_sequentially() {
        let mut log = PartitionLog::new(0, 5);
        let appended = fill(&mut log, 3);
        let offsets: Vec<u64> = appended.iter().map(|a| a.record.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
        assert_eq!(log.next_offset(), 3);
        assert!(appended.iter().all(|a| a.evicted.is_empty()));
    }

    #[test]
    fn retention_evicts_oldest_and_keeps_counter() {
        let mut log = PartitionLog::new(0, 2);
        let appended = fill(&mut log, 3);

        assert_eq!(appended[2].evicted.len(), 1);
        assert_eq!(appended[2].evicted[0].offset, 0);
        let resident: Vec<u64> = log.records().map(|r| r.offset).collect();
        assert_eq!(resident, vec![1, 2]);
        assert_eq!(log.next_offset(), 3);
    }

    #[test]
    fn lookup_misses_evicted_and_future_offsets() {
        let mut log = PartitionLog::new(0, 2);
        fill(&mut log, 4);

        assert!(log.lookup(0).is_none());
        assert!(log.lookup(1).is_none());
        assert_eq!(log.lookup(2).map(|r| r.payload.as_str()), Some("Msg-2"));
        assert_eq!(log.lookup(3).map(|r| r.payload.as_str()), Some("Msg-3"));
        assert!(log.lookup(4).is_none());
    }

    #[test]
    fn lookup_on_empty_log() {
        let log = PartitionLog::new(1, 5);
        assert!(log.lookup(0).is_none());
        assert!(log.oldest().is_none());
    }

    #[test]
    fn shrinking_capacity_is_lazy() {
        let mut log = PartitionLog::new(0, 5);
        fill(&mut log, 5);

        log.set_capacity(2);
        assert_eq!(log.len(), 5);

        let appended = log.append("x".into(), "Msg-x".into(), 0);
        let evicted: Vec<u64> = appended.evicted.iter().map(|r| r.offset).collect();
        assert_eq!(evicted, vec![0, 1, 2, 3]);
        let resident: Vec<u64> = log.records().map(|r| r.offset).collect();
        assert_eq!(resident, vec![4, 5]);
    }

    #[test]
    fn capacity_floor_is_one() {
        let mut log = PartitionLog::new(0, 0);
        assert_eq!(log.capacity(), 1);
        log.set_capacity(0);
        assert_eq!(log.capacity(), 1);
    }
}

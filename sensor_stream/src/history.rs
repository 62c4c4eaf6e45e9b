//! Bounded store of clean records addressed by sequence id

use crate::aggregator::Tick;
use crate::data::CleanRecord;
use std::collections::VecDeque;

/// Keeps the most recent clean records.
///
/// Ids are dense and start at 0; records older than the capacity are
/// evicted, so lookups of evicted ids return `None`.
#[derive(Debug, Clone)]
pub struct RecordHistory {
    records: VecDeque<CleanRecord>,
    capacity: usize,
    next_id: u64,
}

impl RecordHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 0,
        }
    }

    /// Store a tick as the next record and return its id
    pub fn push(&mut self, tick: Tick) -> u64 {
        let id = self.next_id;
        self.records.push_back(CleanRecord {
            id,
            timestamp: tick.timestamp,
            value: tick.value,
            features: tick.features,
            prediction: None,
            interpolated: tick.interpolated,
        });
        self.next_id += 1;

        while self.records.len() > self.capacity {
            self.records.pop_front();
        }
        id
    }

    fn position(&self, id: u64) -> Option<usize> {
        let first = self.next_id - self.records.len() as u64;
        if id < first || id >= self.next_id {
            return None;
        }
        Some((id - first) as usize)
    }

    pub fn get(&self, id: u64) -> Option<&CleanRecord> {
        self.position(id).and_then(|i| self.records.get(i))
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut CleanRecord> {
        self.position(id).and_then(move |i| self.records.get_mut(i))
    }

    pub fn last(&self) -> Option<&CleanRecord> {
        self.records.back()
    }

    /// Records currently held, oldest first
    pub fn iter(&self) -> impl Iterator<Item = &CleanRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records ever pushed
    pub fn total(&self) -> u64 {
        self.next_id
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn tick(value: f64) -> Tick {
        Tick {
            timestamp: Utc::now(),
            value,
            features: vec![],
            interpolated: false,
        }
    }

    #[test]
    fn test_ids_are_dense_and_eviction_is_bounded() {
        let mut history = RecordHistory::new(3);
        for i in 0..5 {
            assert_eq!(history.push(tick(i as f64)), i);
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.total(), 5);
        assert!(history.get(1).is_none());
        assert_eq!(history.get(2).unwrap().value, 2.0);
        assert_eq!(history.get(4).unwrap().id, 4);
        assert!(history.get(5).is_none());
        assert_eq!(history.last().unwrap().id, 4);
    }

    #[test]
    fn test_prediction_is_the_only_field_updated() {
        let mut history = RecordHistory::new(2);
        let id = history.push(tick(1.0));
        assert_eq!(history.get(id).unwrap().prediction, None);

        history.get_mut(id).unwrap().prediction = Some(0.5);
        assert_eq!(history.get(id).unwrap().prediction, Some(0.5));
    }
}

//! Record ordering and filtering

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::types::MessageRecord;

/// Default number of records kept per partition
pub const DEFAULT_PER_PARTITION: usize = 20;

/// Largest accepted per-partition limit
pub const MAX_PER_PARTITION: usize = 1000;

/// Page order: highest partition first, newest offset first within a partition
pub fn record_order(a: &MessageRecord, b: &MessageRecord) -> Ordering {
    b.partition
        .cmp(&a.partition)
        .then_with(|| b.offset.cmp(&a.offset))
}

/// Clamp a requested per-partition count; out-of-range values fall back to the default
pub fn per_partition_limit(requested: usize) -> usize {
    if (1..=MAX_PER_PARTITION).contains(&requested) {
        requested
    } else {
        DEFAULT_PER_PARTITION
    }
}

/// Filter options for loaded records
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    /// Only keep this partition
    pub partition: Option<i32>,
    /// Keep at most this many newest records per partition
    pub per_partition: Option<usize>,
}

impl RecordFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }

    pub fn with_limit(mut self, per_partition: usize) -> Self {
        self.per_partition = Some(per_partition_limit(per_partition));
        self
    }

    /// Check if a record passes the partition filter
    pub fn matches(&self, record: &MessageRecord) -> bool {
        self.partition.map_or(true, |p| record.partition == p)
    }
}

/// Sort records into page order and apply `filter`
pub fn filter_records(mut records: Vec<MessageRecord>, filter: &RecordFilter) -> Vec<MessageRecord> {
    records.retain(|r| filter.matches(r));
    records.sort_by(record_order);

    if let Some(limit) = filter.per_partition {
        let mut seen: HashMap<i32, usize> = HashMap::new();
        records.retain(|r| {
            let count = seen.entry(r.partition).or_insert(0);
            *count += 1;
            *count <= limit
        });
    }

    records
}

//! # Record Pool
//!
//! A bounded lock-free free-list of [`Record`]s. Acquiring never blocks: an
//! empty pool simply allocates a fresh record, and releasing into a full pool
//! drops the record. Records are always handed out through [`PooledRecord`],
//! which scrubs and returns them when it goes out of scope, including when
//! formatting fails or a hook panics.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::queue::ArrayQueue;

use crate::loggers::record::Record;

/// Default number of idle records kept per logger.
pub const DEFAULT_POOL_CAPACITY: usize = 64;

/// Usage counters, mainly for tests and tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Records handed out.
    pub acquired: u64,
    /// Records that had to be freshly allocated.
    pub created: u64,
    /// Records currently idle in the pool.
    pub idle: usize,
}

pub struct RecordPool {
    free: ArrayQueue<Box<Record>>,
    acquired: AtomicU64,
    created: AtomicU64,
}

impl RecordPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: ArrayQueue::new(capacity.max(1)),
            acquired: AtomicU64::new(0),
            created: AtomicU64::new(0),
        }
    }

    /// Takes an idle record or allocates a new one.
    pub fn acquire(&self) -> PooledRecord<'_> {
        self.acquired.fetch_add(1, Ordering::Relaxed);
        let record = self.free.pop().unwrap_or_else(|| {
            self.created.fetch_add(1, Ordering::Relaxed);
            Box::default()
        });
        PooledRecord {
            record: Some(record),
            pool: self,
        }
    }

    fn release(&self, mut record: Box<Record>) {
        record.scrub();
        // A full pool means enough records are idle already.
        let _ = self.free.push(record);
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            acquired: self.acquired.load(Ordering::Relaxed),
            created: self.created.load(Ordering::Relaxed),
            idle: self.free.len(),
        }
    }
}

impl Default for RecordPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

/// A record on loan from a [`RecordPool`].
pub struct PooledRecord<'a> {
    record: Option<Box<Record>>,
    pool: &'a RecordPool,
}

impl Deref for PooledRecord<'_> {
    type Target = Record;

    fn deref(&self) -> &Record {
        // Only `drop` takes the record out.
        self.record.as_deref().unwrap_or_else(|| unreachable!())
    }
}

impl DerefMut for PooledRecord<'_> {
    fn deref_mut(&mut self) -> &mut Record {
        self.record.as_deref_mut().unwrap_or_else(|| unreachable!())
    }
}

impl Drop for PooledRecord<'_> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            self.pool.release(record);
        }
    }
}

//! # Hooks
//!
//! Side-effect callbacks fired after a record is formatted and before it is
//! written. Hooks run synchronously on the logging thread.

use std::error::Error as StdError;
use std::sync::Arc;

use crate::loggers::level::Level;
use crate::loggers::record::Record;

/// Error type returned by hooks.
pub type HookError = Box<dyn StdError + Send + Sync>;

pub trait Hook: Send + Sync {
    /// Levels this hook fires for. Queried once, when the hook is added.
    fn levels(&self) -> Vec<Level>;

    /// Called with the finished record; its bytes are final.
    fn fire(&self, record: &Record) -> Result<(), HookError>;
}

/// Adapts a closure into a [`Hook`].
pub struct HookFn<F> {
    levels: Vec<Level>,
    hook: F,
}

impl<F> HookFn<F>
where
    F: Fn(&Record) -> Result<(), HookError> + Send + Sync,
{
    pub fn new(levels: impl Into<Vec<Level>>, hook: F) -> Self {
        Self {
            levels: levels.into(),
            hook,
        }
    }
}

impl<F> Hook for HookFn<F>
where
    F: Fn(&Record) -> Result<(), HookError> + Send + Sync,
{
    fn levels(&self) -> Vec<Level> {
        self.levels.clone()
    }

    fn fire(&self, record: &Record) -> Result<(), HookError> {
        (self.hook)(record)
    }
}

/// Hooks indexed by level.
///
/// Filled during setup and read-only afterwards; the logger swaps in a new
/// bag when a hook is added rather than mutating a shared one.
#[derive(Clone, Default)]
pub struct HookBag {
    hooks: [Vec<Arc<dyn Hook>>; Level::COUNT],
}

impl HookBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `hook` under each valid level it declares. Invalid levels are
    /// dropped; a hook with no valid level is not stored.
    pub fn add(&mut self, hook: Arc<dyn Hook>) {
        let mut levels = hook.levels();
        levels.sort_by_key(|l| l.bits());
        levels.dedup();
        for index in levels.into_iter().filter_map(Level::index) {
            self.hooks[index].push(hook.clone());
        }
    }

    /// Levels with at least one hook, most severe first.
    pub fn levels(&self) -> Vec<Level> {
        crate::loggers::level::all_levels()
            .into_iter()
            .filter(|l| l.index().is_some_and(|i| !self.hooks[i].is_empty()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.iter().all(Vec::is_empty)
    }

    /// Fires the hooks for `record.level()` in registration order, stopping
    /// at the first error.
    pub fn fire(&self, record: &Record) -> Result<(), HookError> {
        let Some(index) = record.level().index() else {
            return Ok(());
        };
        for hook in &self.hooks[index] {
            hook.fire(record)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(level: Level) -> Record {
        let mut r = Record::default();
        r.level = level;
        r
    }

    #[test]
    fn fires_only_for_declared_levels() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let mut bag = HookBag::new();
        bag.add(Arc::new(HookFn::new(
            [Level::ERROR, Level::from_bits(3), Level::ERROR],
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            },
        )));
        assert_eq!(bag.levels(), vec![Level::ERROR]);

        bag.fire(&record(Level::INFO)).unwrap();
        bag.fire(&record(Level::ERROR)).unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn hook_without_valid_levels_is_not_stored() {
        let mut bag = HookBag::new();
        bag.add(Arc::new(HookFn::new([Level::from_bits(0)], |_| Ok(()))));
        assert!(bag.is_empty());
    }

    #[test]
    fn stops_at_first_error() {
        let later = Arc::new(AtomicUsize::new(0));
        let counter = later.clone();
        let mut bag = HookBag::new();
        bag.add(Arc::new(HookFn::new([Level::WARN], |_| Err("boom".into()))));
        bag.add(Arc::new(HookFn::new([Level::WARN], move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })));
        let err = bag.fire(&record(Level::WARN)).unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }
}

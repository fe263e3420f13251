//! Pending operation tracking.

use std::{sync::Arc, time::Duration};

use rustc_hash::FxHashMap;
use tokio::{sync::watch, time::timeout};
use vitrine::variants::VariantKey;

/// What a pending operation is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PendingKey {
    /// A media upload, with the variant it binds to.
    Upload(Option<VariantKey>),

    /// A variant persist.
    Variant(VariantKey),
}

/// Counts in-flight operations per key and lets a save wait for them.
#[derive(Debug, Clone)]
pub struct PendingOps {
    counts: Arc<watch::Sender<FxHashMap<PendingKey, usize>>>,
}

impl Default for PendingOps {
    fn default() -> Self {
        let (counts, _) = watch::channel(FxHashMap::default());

        Self {
            counts: Arc::new(counts),
        }
    }
}

impl PendingOps {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start an operation; it ends when the guard drops.
    #[must_use]
    pub fn begin(&self, key: PendingKey) -> PendingGuard {
        self.counts.send_modify(|counts| {
            *counts.entry(key).or_default() += 1;
        });

        PendingGuard {
            ops: self.clone(),
            key,
        }
    }

    /// Start a variant persist unless one is already running.
    #[must_use]
    pub fn begin_persist(&self, key: VariantKey) -> Option<PendingGuard> {
        let started = self.counts.send_if_modified(|counts| {
            if counts.keys().any(|key| matches!(key, PendingKey::Variant(_))) {
                return false;
            }

            counts.insert(PendingKey::Variant(key), 1);

            true
        });

        started.then(|| PendingGuard {
            ops: self.clone(),
            key: PendingKey::Variant(key),
        })
    }

    /// Number of operations in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.borrow().values().sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.borrow().is_empty()
    }

    /// Whether any variant persist is running.
    #[must_use]
    pub fn is_persisting(&self) -> bool {
        self.counts
            .borrow()
            .keys()
            .any(|key| matches!(key, PendingKey::Variant(_)))
    }

    /// Whether removing the variant at `removed` would move or drop the
    /// target of an upload still in flight.
    #[must_use]
    pub fn uploads_shifted_by(&self, removed: usize) -> bool {
        self.counts.borrow().keys().any(|key| match key {
            PendingKey::Upload(Some(target)) => target.after_removal(removed) != Some(*target),
            _ => false,
        })
    }

    /// Wait until nothing is in flight.
    ///
    /// # Errors
    ///
    /// Returns the number of operations still running when `limit` elapses.
    pub async fn settle(&self, limit: Duration) -> Result<(), usize> {
        let mut counts = self.counts.subscribe();

        let settled = matches!(
            timeout(limit, counts.wait_for(|counts| counts.is_empty())).await,
            Ok(Ok(_))
        );

        if settled { Ok(()) } else { Err(self.len()) }
    }

    fn finish(&self, key: PendingKey) {
        self.counts.send_modify(|counts| {
            if let Some(count) = counts.get_mut(&key) {
                *count = count.saturating_sub(1);

                if *count == 0 {
                    counts.remove(&key);
                }
            }
        });
    }
}

/// Marks an operation as running until dropped.
#[derive(Debug)]
pub struct PendingGuard {
    ops: PendingOps,
    key: PendingKey,
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        self.ops.finish(self.key);
    }
}

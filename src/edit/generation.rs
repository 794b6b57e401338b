//! Generation counters for discarding stale results.
//!
//! Every time the document being edited is replaced, the owning
//! [`GenerationCounter`] is bumped. Work started earlier carries a
//! [`GenerationToken`] and checks it before publishing a result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Shared, monotonically increasing generation number.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    current: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current generation.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    /// Move to a new generation, invalidating all outstanding tokens.
    pub fn bump(&self) -> GenerationToken {
        let generation = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        GenerationToken {
            generation,
            counter: Arc::clone(&self.current),
        }
    }

    /// A token for the current generation.
    pub fn token(&self) -> GenerationToken {
        GenerationToken {
            generation: self.current(),
            counter: Arc::clone(&self.current),
        }
    }
}

/// Snapshot of a generation, checked before a result is used.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    generation: u64,
    counter: Arc<AtomicU64>,
}

impl GenerationToken {
    /// The generation this token was issued for.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether no newer generation has started since the token was issued.
    pub fn is_current(&self) -> bool {
        self.counter.load(Ordering::Acquire) == self.generation
    }

    /// `Err(Error::Stale)` if the token has been superseded.
    pub fn check(&self) -> crate::Result<()> {
        if self.is_current() {
            Ok(())
        } else {
            Err(crate::Error::Stale)
        }
    }
}

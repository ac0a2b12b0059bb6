//! ConcurrencyEnvelope: the operation x concurrency-safety policy table,
//! reified as data so callers (and tests) can consult it instead of
//! re-deriving it from the lock discipline.

/// One row of the operation x safety matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationPolicy {
    /// May this operation run while a search is in flight?
    pub concurrent_with_searches: bool,
    /// May this operation run while another writer is in flight?
    pub concurrent_with_writers: bool,
    /// May this operation block the calling thread (I/O, k-means, ...)?
    pub may_block: bool,
}

/// Every operation the index exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `Searcher::search` / `IndexFacade::search`.
    Search,
    /// `IndexFacade::insert`.
    Insert,
    /// `IndexFacade::remove`.
    Remove,
    /// Edge truncation or path adjustment.
    GraphMaintenance,
    /// `IndexFacade::save`.
    Save,
    /// `IndexFacade::open` in read-only mode.
    OpenReadOnly,
}

impl Operation {
    /// Looks up this operation's row in the safety matrix.
    #[must_use]
    pub const fn policy(self) -> OperationPolicy {
        match self {
            Self::Search => OperationPolicy {
                concurrent_with_searches: true,
                concurrent_with_writers: false,
                may_block: true,
            },
            Self::Insert => OperationPolicy {
                concurrent_with_searches: false,
                concurrent_with_writers: false,
                may_block: true,
            },
            Self::Remove => OperationPolicy {
                concurrent_with_searches: false,
                concurrent_with_writers: false,
                may_block: false,
            },
            Self::GraphMaintenance => OperationPolicy {
                concurrent_with_searches: false,
                concurrent_with_writers: false,
                may_block: true,
            },
            Self::Save => OperationPolicy {
                concurrent_with_searches: false,
                concurrent_with_writers: false,
                may_block: true,
            },
            Self::OpenReadOnly => OperationPolicy {
                concurrent_with_searches: false,
                concurrent_with_writers: false,
                may_block: true,
            },
        }
    }
}

/// A single coarse-grained reader/writer guard spanning the whole index.
/// Every write operation (insert/remove/save/graph maintenance) takes the
/// exclusive half for its whole duration;
/// searches take the shared half, so arbitrarily many run concurrently
/// but never alongside a writer.
pub struct ConcurrencyEnvelope {
    guard: crate::sync::RwLock<()>,
}

impl ConcurrencyEnvelope {
    /// A fresh, unlocked envelope.
    #[must_use]
    pub fn new() -> Self {
        Self {
            guard: crate::sync::RwLock::new(()),
        }
    }

    /// Runs `f` holding a shared (reader) lock, for `Search`.
    pub fn with_read<T>(&self, f: impl FnOnce() -> T) -> T {
        let _lock = self.guard.read();
        f()
    }

    /// Runs `f` holding the exclusive (writer) lock, for
    /// insert/remove/save/graph-maintenance/open.
    pub fn with_write<T>(&self, f: impl FnOnce() -> T) -> T {
        let _lock = self.guard.write();
        f()
    }
}

impl Default for ConcurrencyEnvelope {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_is_concurrent_with_search_but_not_writers() {
        let p = Operation::Search.policy();
        assert!(p.concurrent_with_searches);
        assert!(!p.concurrent_with_writers);
    }

    #[test]
    fn every_writer_excludes_other_writers() {
        for op in [
            Operation::Insert,
            Operation::Remove,
            Operation::GraphMaintenance,
            Operation::Save,
        ] {
            assert!(!op.policy().concurrent_with_writers);
            assert!(!op.policy().concurrent_with_searches);
        }
    }

    #[test]
    fn envelope_serialises_reads_and_writes() {
        let envelope = ConcurrencyEnvelope::new();
        let result = envelope.with_read(|| 1 + 1);
        assert_eq!(result, 2);
        envelope.with_write(|| {});
    }
}

//! Transaction contexts and their archive.
//!
//! Every bundle execution happens under a [`ContextHandle`]: an ordered
//! append-only log of operation records bracketed by an open marker and
//! exactly one commit or rollback marker. A `transaction` bundle shares one
//! context across all entries; `batch` entries get a private context each
//! unless the surrounding request already opened one.
//!
//! Atomicity uses a compensating-action log: handlers stage an undo closure
//! for every mutation they apply, and [`ContextHandle::rollback`] runs the
//! staged closures in reverse order before writing the rollback marker.
//!
//! Finalized logs are handed to an injected [`TransactionArchive`] rather
//! than a process-wide static, so concurrent bundles cannot interfere with
//! each other's diagnostic state.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// One record in a transaction log.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TxRecord {
    /// The context was opened.
    Open {
        /// When the context was opened.
        at: DateTime<Utc>,
    },
    /// One entry execution. Appended exactly once per entry, regardless of
    /// whether the entry succeeded.
    Operation {
        /// When the entry executed.
        at: DateTime<Utc>,
        /// What operation happened (e.g. `read /Patient/1`).
        description: String,
    },
    /// The context committed.
    Commit {
        /// When the context committed.
        at: DateTime<Utc>,
    },
    /// The context rolled back.
    Rollback {
        /// When the context rolled back.
        at: DateTime<Utc>,
        /// Description of the failure that caused the rollback.
        reason: String,
    },
}

impl TxRecord {
    /// Returns `true` for an [`TxRecord::Operation`] record.
    #[must_use]
    pub const fn is_operation(&self) -> bool {
        matches!(self, Self::Operation { .. })
    }
}

/// Terminal state of a transaction context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxState {
    /// Still accepting records.
    Open,
    /// Finalized successfully.
    Committed,
    /// Finalized after a failure; compensations have run.
    RolledBack,
}

/// An immutable snapshot of a finalized transaction context.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionLog {
    records: Vec<TxRecord>,
}

impl TransactionLog {
    /// Returns the ordered records of the log.
    #[must_use]
    pub fn records(&self) -> &[TxRecord] {
        &self.records
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the log has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns `true` if the log ends in a commit marker.
    #[must_use]
    pub fn committed(&self) -> bool {
        matches!(self.records.last(), Some(TxRecord::Commit { .. }))
    }

    /// Returns `true` if the log ends in a rollback marker.
    #[must_use]
    pub fn rolled_back(&self) -> bool {
        matches!(self.records.last(), Some(TxRecord::Rollback { .. }))
    }

    /// Returns the number of operation records (excludes markers).
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.records.iter().filter(|r| r.is_operation()).count()
    }
}

/// Sink for finalized transaction logs.
///
/// Injected into every context at creation so observability state is
/// request- or test-scoped instead of process-wide.
pub trait TransactionArchive: Send + Sync {
    /// Records one finalized log.
    fn record(&self, log: TransactionLog);
}

/// In-memory archive, inspectable after the fact.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use galen_core::transaction::{ContextHandle, MemoryArchive};
///
/// let archive = Arc::new(MemoryArchive::new());
/// let ctx = ContextHandle::begin(archive.clone());
/// ctx.record("read /Patient/1");
/// ctx.commit();
///
/// let logs = archive.logs();
/// assert_eq!(logs.len(), 1);
/// assert_eq!(logs[0].len(), 3); // open, operation, commit
/// ```
#[derive(Default)]
pub struct MemoryArchive {
    logs: Mutex<Vec<TransactionLog>>,
}

impl MemoryArchive {
    /// Creates a new empty archive.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded logs, in finalization order.
    #[must_use]
    pub fn logs(&self) -> Vec<TransactionLog> {
        self.logs.lock().clone()
    }

    /// Returns the number of recorded logs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.logs.lock().len()
    }

    /// Returns `true` if no logs were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.logs.lock().is_empty()
    }
}

impl TransactionArchive for MemoryArchive {
    fn record(&self, log: TransactionLog) {
        self.logs.lock().push(log);
    }
}

/// Archive that emits one structured tracing event per finalized log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingArchive;

impl TransactionArchive for TracingArchive {
    fn record(&self, log: TransactionLog) {
        info!(
            records = log.len(),
            operations = log.operation_count(),
            committed = log.committed(),
            "transaction context finalized"
        );
    }
}

/// Staged undo action for one applied mutation.
type Compensation = Box<dyn FnOnce() + Send>;

struct TransactionContext {
    records: Vec<TxRecord>,
    state: TxState,
    compensations: Vec<Compensation>,
    archive: Arc<dyn TransactionArchive>,
}

impl TransactionContext {
    fn finalize(&mut self, record: TxRecord, run_compensations: bool) {
        if run_compensations {
            // Undo in reverse application order
            while let Some(compensation) = self.compensations.pop() {
                compensation();
            }
        } else {
            self.compensations.clear();
        }
        self.state = match record {
            TxRecord::Commit { .. } => TxState::Committed,
            _ => TxState::RolledBack,
        };
        self.records.push(record);
        self.archive.record(TransactionLog {
            records: self.records.clone(),
        });
    }
}

impl Drop for TransactionContext {
    fn drop(&mut self) {
        // Cancellation path: a context abandoned mid-flight must still undo
        // its effects and leave a rollback marker behind.
        if self.state == TxState::Open {
            warn!("transaction context dropped while open; rolling back");
            self.finalize(
                TxRecord::Rollback {
                    at: Utc::now(),
                    reason: "context dropped while open".to_string(),
                },
                true,
            );
        }
    }
}

/// Shared handle to one transaction context.
///
/// Cloning the handle shares the same underlying context; the dispatcher
/// passes a clone explicitly into every handler invocation instead of
/// relying on ambient per-request state.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use galen_core::transaction::{ContextHandle, MemoryArchive, TxState};
///
/// let archive = Arc::new(MemoryArchive::new());
/// let ctx = ContextHandle::begin(archive);
/// assert_eq!(ctx.state(), TxState::Open);
///
/// ctx.record("create /Patient");
/// ctx.push_compensation(|| { /* undo the create */ });
/// ctx.rollback("downstream entry failed");
/// assert_eq!(ctx.state(), TxState::RolledBack);
/// ```
#[derive(Clone)]
pub struct ContextHandle {
    inner: Arc<Mutex<TransactionContext>>,
}

impl ContextHandle {
    /// Opens a new context, appending the open marker.
    #[must_use]
    pub fn begin(archive: Arc<dyn TransactionArchive>) -> Self {
        debug!("transaction context opened");
        Self {
            inner: Arc::new(Mutex::new(TransactionContext {
                records: vec![TxRecord::Open { at: Utc::now() }],
                state: TxState::Open,
                compensations: Vec::new(),
                archive,
            })),
        }
    }

    /// Appends one operation record describing an entry execution.
    ///
    /// Ignored (with a warning) once the context is finalized.
    pub fn record(&self, description: impl Into<String>) {
        let mut inner = self.inner.lock();
        if inner.state != TxState::Open {
            warn!("operation record on finalized transaction context ignored");
            return;
        }
        inner.records.push(TxRecord::Operation {
            at: Utc::now(),
            description: description.into(),
        });
    }

    /// Stages an undo action for a mutation the caller just applied.
    ///
    /// Compensations run in reverse order on rollback and are discarded on
    /// commit. Ignored once the context is finalized.
    pub fn push_compensation<F>(&self, compensation: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut inner = self.inner.lock();
        if inner.state != TxState::Open {
            warn!("compensation on finalized transaction context ignored");
            return;
        }
        inner.compensations.push(Box::new(compensation));
    }

    /// Commits the context: appends the commit marker, discards staged
    /// compensations, and archives the log.
    ///
    /// Finalization happens exactly once; a second call is ignored with a
    /// warning.
    pub fn commit(&self) {
        let mut inner = self.inner.lock();
        if inner.state != TxState::Open {
            warn!(state = ?inner.state, "commit on finalized transaction context ignored");
            return;
        }
        inner.finalize(TxRecord::Commit { at: Utc::now() }, false);
    }

    /// Rolls the context back: runs staged compensations in reverse order,
    /// appends the rollback marker (with the failure description), and
    /// archives the log.
    ///
    /// Finalization happens exactly once; a second call is ignored with a
    /// warning.
    pub fn rollback(&self, reason: impl Into<String>) {
        let mut inner = self.inner.lock();
        if inner.state != TxState::Open {
            warn!(state = ?inner.state, "rollback on finalized transaction context ignored");
            return;
        }
        inner.finalize(
            TxRecord::Rollback {
                at: Utc::now(),
                reason: reason.into(),
            },
            true,
        );
    }

    /// Rolls the context back without running staged compensations.
    ///
    /// This is the log-only baseline: a rollback marker is written and the
    /// log archived, but already-applied effects are left in place. Use
    /// [`ContextHandle::rollback`] for the atomic contract.
    pub fn rollback_log_only(&self, reason: impl Into<String>) {
        let mut inner = self.inner.lock();
        if inner.state != TxState::Open {
            warn!(state = ?inner.state, "rollback on finalized transaction context ignored");
            return;
        }
        inner.finalize(
            TxRecord::Rollback {
                at: Utc::now(),
                reason: reason.into(),
            },
            false,
        );
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TxState {
        self.inner.lock().state
    }

    /// Returns `true` while the context accepts records.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state() == TxState::Open
    }

    /// Returns the number of records appended so far (markers included).
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.inner.lock().records.len()
    }
}

impl std::fmt::Debug for ContextHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("ContextHandle")
            .field("state", &inner.state)
            .field("records", &inner.records.len())
            .field("compensations", &inner.compensations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn archive() -> Arc<MemoryArchive> {
        Arc::new(MemoryArchive::new())
    }

    #[test]
    fn test_begin_appends_open_marker() {
        let ctx = ContextHandle::begin(archive());
        assert_eq!(ctx.record_count(), 1);
        assert!(ctx.is_open());
    }

    #[test]
    fn test_commit_archives_log() {
        let archive = archive();
        let ctx = ContextHandle::begin(archive.clone());
        ctx.record("read /Patient/1");
        ctx.record("read /Patient/2");
        ctx.commit();

        assert_eq!(ctx.state(), TxState::Committed);
        let logs = archive.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].len(), 4, "open, two operations, commit");
        assert_eq!(logs[0].operation_count(), 2);
        assert!(logs[0].committed());
        assert!(!logs[0].rolled_back());
    }

    #[test]
    fn test_rollback_records_reason() {
        let archive = archive();
        let ctx = ContextHandle::begin(archive.clone());
        ctx.record("update /Error/1");
        ctx.rollback("Operation error (501 Not Implemented): Not implemented");

        let logs = archive.logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].rolled_back());
        match logs[0].records().last() {
            Some(TxRecord::Rollback { reason, .. }) => {
                assert!(reason.contains("Not implemented"));
            }
            other => panic!("expected rollback marker, got {other:?}"),
        }
    }

    #[test]
    fn test_rollback_runs_compensations_in_reverse() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let ctx = ContextHandle::begin(archive());

        for i in 0..3 {
            let applied = applied.clone();
            ctx.push_compensation(move || applied.lock().push(i));
        }
        ctx.rollback("entry 3 failed");

        assert_eq!(*applied.lock(), vec![2, 1, 0]);
    }

    #[test]
    fn test_commit_discards_compensations() {
        let applied = Arc::new(Mutex::new(Vec::new()));
        let ctx = ContextHandle::begin(archive());

        let cloned = applied.clone();
        ctx.push_compensation(move || cloned.lock().push(1));
        ctx.commit();

        assert!(applied.lock().is_empty());
    }

    #[test]
    fn test_finalization_happens_exactly_once() {
        let archive = archive();
        let ctx = ContextHandle::begin(archive.clone());
        ctx.commit();
        ctx.commit();
        ctx.rollback("too late");

        assert_eq!(archive.len(), 1);
        assert_eq!(ctx.state(), TxState::Committed);
    }

    #[test]
    fn test_records_ignored_after_finalize() {
        let archive = archive();
        let ctx = ContextHandle::begin(archive.clone());
        ctx.commit();
        ctx.record("read /Patient/1");

        assert_eq!(archive.logs()[0].operation_count(), 0);
        assert_eq!(ctx.record_count(), 2, "open + commit only");
    }

    #[test]
    fn test_drop_while_open_rolls_back() {
        let archive = archive();
        let applied = Arc::new(Mutex::new(Vec::new()));
        {
            let ctx = ContextHandle::begin(archive.clone());
            ctx.record("create /Patient");
            let cloned = applied.clone();
            ctx.push_compensation(move || cloned.lock().push("undo create"));
            // dropped without finalizing, as if the request was canceled
        }

        let logs = archive.logs();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].rolled_back());
        assert_eq!(*applied.lock(), vec!["undo create"]);
    }

    #[test]
    fn test_drop_after_commit_does_not_archive_twice() {
        let archive = archive();
        {
            let ctx = ContextHandle::begin(archive.clone());
            ctx.commit();
        }
        assert_eq!(archive.len(), 1);
    }

    #[test]
    fn test_clones_share_one_context() {
        let archive = archive();
        let ctx = ContextHandle::begin(archive.clone());
        let clone = ctx.clone();
        clone.record("read /Patient/1");
        drop(clone);
        ctx.commit();

        assert_eq!(archive.logs()[0].operation_count(), 1);
        assert_eq!(archive.len(), 1, "clone drop must not finalize");
    }

    #[test]
    fn test_rollback_log_only_leaves_effects_in_place() {
        let archive = archive();
        let applied = Arc::new(Mutex::new(Vec::new()));
        let ctx = ContextHandle::begin(archive.clone());

        let cloned = applied.clone();
        ctx.push_compensation(move || cloned.lock().push("undone"));
        ctx.rollback_log_only("entry failed");

        assert!(applied.lock().is_empty(), "compensations must not run");
        assert!(archive.logs()[0].rolled_back());
        assert_eq!(ctx.state(), TxState::RolledBack);
    }

    #[test]
    fn test_tracing_archive_accepts_logs() {
        let ctx = ContextHandle::begin(Arc::new(TracingArchive));
        ctx.record("read /Patient/1");
        ctx.commit();
    }
}

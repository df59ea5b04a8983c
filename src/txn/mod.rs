//! Transaction lifecycle skeleton and saga orchestration.
//!
//! A [`TransactionRunnable`] is one unit of work with five hooks:
//! `pre_run` (locks, scratch cleanup), `run` (staging only), `commit` (the
//! renames that make work visible), `rollback` (undo from on-disk state), and
//! `complete` (scratch cleanup and lock release, always executed).
//!
//! [`Transaction`] drives the hooks. With several children it is a saga, not a
//! two-phase commit: children execute fully in order, and on the first failure
//! the already-run children are rolled back in reverse order before the failure
//! is surfaced.

use log::Level;
use serde_json::json;

use crate::logging::audit::{new_txn_id, AuditCtx};
use crate::logging::{AuditSink, FactsEmitter, Stage, TxnLogger};
use crate::types::errors::{Error, Result};

pub mod delete;
pub mod save;

pub use delete::FileDelete;
pub use save::FileSave;

/// A unit of work run under the fixed hook skeleton.
///
/// Hooks default to no-ops; concrete operations override the ones they need.
/// `on_run` must confine itself to scratch locations so `on_rollback` can undo
/// it, and `on_rollback` must also undo a completed `on_commit` (the saga rolls
/// back committed children when a later sibling fails).
pub trait TransactionRunnable: Send {
    /// Main path this runnable operates on; used as the `path` of audit facts.
    fn label(&self) -> String;

    /// Acquire locks and put scratch locations in order. Must not alter the
    /// visible state of the store.
    fn on_pre_run(&mut self) -> Result<()> {
        Ok(())
    }

    /// Stage the work. Must not touch anything outside scratch locations.
    fn on_run(&mut self) -> Result<()> {
        Ok(())
    }

    /// Make the staged work visible.
    fn on_commit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Restore the pre-operation state. Only invoked if `on_run` was invoked.
    fn on_rollback(&mut self) -> Result<()> {
        Ok(())
    }

    /// Clean up scratch state and release locks. Invoked for every runnable
    /// whose `on_pre_run` was invoked, whatever happened in between.
    fn on_complete(&mut self) -> Result<()> {
        Ok(())
    }
}

/// How an executed transaction ended.
#[derive(Debug)]
pub enum Outcome {
    /// All children committed; new state is visible.
    Committed,
    /// A recoverable failure occurred and the pre-transaction state was fully
    /// restored. `cause` is the error that forced the rollback.
    RolledBack { cause: Error },
}

impl Outcome {
    #[must_use]
    pub const fn is_committed(&self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Ordered set of runnables executed as one logical unit.
pub struct Transaction<E: FactsEmitter, A: AuditSink> {
    facts: E,
    audit: A,
    children: Vec<Box<dyn TransactionRunnable>>,
}

impl<E: FactsEmitter, A: AuditSink> Transaction<E, A> {
    #[must_use]
    pub fn new(facts: E, audit: A) -> Self {
        Self {
            facts,
            audit,
            children: Vec::new(),
        }
    }

    /// Transaction around a single runnable.
    #[must_use]
    pub fn single(facts: E, audit: A, child: Box<dyn TransactionRunnable>) -> Self {
        Self::new(facts, audit).add(child)
    }

    /// Append a child; children run in insertion order and roll back in
    /// reverse order.
    #[must_use]
    pub fn add(mut self, child: Box<dyn TransactionRunnable>) -> Self {
        self.children.push(child);
        self
    }

    /// Drive every child through the skeleton.
    ///
    /// Returns `Ok(Outcome::Committed)` when everything committed, and
    /// `Ok(Outcome::RolledBack { .. })` when a recoverable failure was fully
    /// undone.
    ///
    /// # Errors
    ///
    /// Returns the non-recoverable cases: a `pre_run` failure (the failing
    /// child staged nothing, though prior children are still rolled back), a
    /// fatal cause (`Cleanup`/`CorruptedState`), or any error raised while
    /// rolling back or completing. Secondary errors gathered during unwinding
    /// are aggregated into the returned error.
    pub fn execute(mut self) -> Result<Outcome> {
        let ctx = AuditCtx::new(&self.facts, new_txn_id());
        let slog = TxnLogger::new(&ctx);
        self.audit.log(Level::Info, "txn: starting");

        // Forward pass: each child fully executes before the next starts.
        let mut pre_run_called = 0;
        let mut run_called = 0;
        let mut failure: Option<(Error, bool)> = None; // (cause, failed_in_pre_run)
        for (i, child) in self.children.iter_mut().enumerate() {
            pre_run_called = i + 1;
            if let Err(e) = hook(child, Stage::PreRun, &slog, |c| c.on_pre_run()) {
                failure = Some((e, true));
                break;
            }
            run_called = i + 1;
            if let Err(e) = hook(child, Stage::Run, &slog, |c| c.on_run()) {
                failure = Some((e, false));
                break;
            }
            if let Err(e) = hook(child, Stage::Commit, &slog, |c| c.on_commit()) {
                failure = Some((e, false));
                break;
            }
        }

        // Reverse pass: roll back everything whose on_run was invoked. A child
        // that failed in pre_run staged nothing itself, but its already-committed
        // elder siblings still have to be undone. Does not stop at the first
        // failure; the remaining children still get their chance to restore
        // themselves.
        let mut rollback_errors: Vec<Error> = Vec::new();
        if failure.is_some() {
            for child in self.children[..run_called].iter_mut().rev() {
                if let Err(e) = hook(child, Stage::Rollback, &slog, |c| c.on_rollback()) {
                    rollback_errors.push(e);
                }
            }
        }

        // Completion always runs, in reverse order, for every child that was
        // pre-run; lock release lives here.
        let mut complete_errors: Vec<Error> = Vec::new();
        for child in self.children[..pre_run_called].iter_mut().rev() {
            if let Err(e) = hook(child, Stage::Complete, &slog, |c| c.on_complete()) {
                complete_errors.push(e);
            }
        }

        let result = resolve(failure, rollback_errors, complete_errors);
        let (decision, outcome_str) = match &result {
            Ok(Outcome::Committed) => ("success", "committed"),
            Ok(Outcome::RolledBack { .. }) => ("failure", "rolled_back"),
            Err(_) => ("failure", "failed"),
        };
        let ev = slog.summary().field("outcome", json!(outcome_str));
        if decision == "success" {
            ev.emit_success();
        } else {
            ev.emit_failure();
        }
        self.audit.log(Level::Info, "txn: finished");
        result
    }
}

fn hook(
    child: &mut Box<dyn TransactionRunnable>,
    stage: Stage,
    slog: &TxnLogger<'_>,
    f: impl FnOnce(&mut dyn TransactionRunnable) -> Result<()>,
) -> Result<()> {
    match f(child.as_mut()) {
        Ok(()) => {
            slog.stage(stage).path(child.label()).emit_success();
            Ok(())
        }
        Err(e) => {
            slog.stage(stage)
                .path(child.label())
                .field("error", json!(e.to_string()))
                .emit_failure();
            Err(e)
        }
    }
}

/// Map the gathered phase results onto the caller-visible result. A recoverable
/// cause that was cleanly rolled back and completed is an `Ok` outcome; anything
/// non-recoverable propagates as `Err` with secondary errors folded in.
fn resolve(
    failure: Option<(Error, bool)>,
    rollback_errors: Vec<Error>,
    mut complete_errors: Vec<Error>,
) -> Result<Outcome> {
    match failure {
        None => {
            if complete_errors.is_empty() {
                Ok(Outcome::Committed)
            } else {
                let primary = complete_errors.remove(0);
                Err(Error::aggregate("complete failed", primary, &complete_errors))
            }
        }
        Some((cause, failed_in_pre_run)) => {
            let mut secondary = rollback_errors;
            let unwound_cleanly = secondary.is_empty() && complete_errors.is_empty();
            secondary.extend(complete_errors);
            if failed_in_pre_run {
                Err(Error::aggregate("pre_run failed", cause, &secondary))
            } else if cause.is_fatal() || !unwound_cleanly {
                Err(Error::aggregate("transaction failed", cause, &secondary))
            } else {
                Ok(Outcome::RolledBack { cause })
            }
        }
    }
}

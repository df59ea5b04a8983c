//! Logging capabilities injected through constructors.
//!
//! There is no process-wide static logger in this crate: the orchestrator takes a
//! [`FactsEmitter`] for structured per-hook facts and an [`AuditSink`] for
//! free-form operational lines, so hosts decide where both go.

use log::Level;
use serde_json::Value;

/// Receives one structured JSON fact per emitted event.
pub trait FactsEmitter {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value);
}

/// Receives free-form operational log lines.
pub trait AuditSink {
    fn log(&self, level: Level, msg: &str);
}

/// Discards facts and audit lines. Useful default for tests and embedders that
/// only care about the returned outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonlSink;

impl FactsEmitter for JsonlSink {
    fn emit(&self, _subsystem: &str, _event: &str, _decision: &str, _fields: Value) {}
}

impl AuditSink for JsonlSink {
    fn log(&self, _level: Level, _msg: &str) {}
}

/// Routes audit lines into the host's `log` facade and facts to the same place
/// at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdLogSink;

impl AuditSink for StdLogSink {
    fn log(&self, level: Level, msg: &str) {
        log::log!(level, "{msg}");
    }
}

impl FactsEmitter for StdLogSink {
    fn emit(&self, subsystem: &str, event: &str, decision: &str, fields: Value) {
        log::debug!("{subsystem} {event} {decision} {fields}");
    }
}

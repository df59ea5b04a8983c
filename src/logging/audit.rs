//! Audit helpers that emit one JSON fact per transaction hook.
//!
//! Every fact carries a minimal envelope: `schema_version`, `txn_id`, `stage`,
//! `decision`, and `path` (the main path of the leaf the hook ran on, empty for
//! transaction-level summaries).

use serde_json::{json, Value};
use uuid::Uuid;

use crate::logging::FactsEmitter;

pub(crate) const SCHEMA_VERSION: i64 = 1;
const SUBSYSTEM: &str = "filetxn";

/// Fresh identifier for one `execute()` invocation.
#[must_use]
pub(crate) fn new_txn_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) struct AuditCtx<'a> {
    pub facts: &'a dyn FactsEmitter,
    pub txn_id: String,
}

impl<'a> AuditCtx<'a> {
    pub(crate) fn new(facts: &'a dyn FactsEmitter, txn_id: String) -> Self {
        Self { facts, txn_id }
    }
}

/// Transaction lifecycle stage for typed audit emission.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    PreRun,
    Run,
    Commit,
    Rollback,
    Complete,
    Summary,
}

impl Stage {
    fn as_event(self) -> &'static str {
        match self {
            Stage::PreRun => "pre_run",
            Stage::Run => "run",
            Stage::Commit => "commit",
            Stage::Rollback => "rollback",
            Stage::Complete => "complete",
            Stage::Summary => "summary",
        }
    }
}

/// Decision severity for audit events.
#[derive(Clone, Copy, Debug)]
pub enum Decision {
    Success,
    Failure,
}

impl Decision {
    fn as_str(self) -> &'static str {
        match self {
            Decision::Success => "success",
            Decision::Failure => "failure",
        }
    }
}

/// Builder facade over audit emission with a centralized envelope.
pub struct TxnLogger<'a> {
    ctx: &'a AuditCtx<'a>,
}

impl<'a> TxnLogger<'a> {
    pub(crate) fn new(ctx: &'a AuditCtx<'a>) -> Self {
        Self { ctx }
    }

    #[must_use]
    pub fn stage(&'a self, stage: Stage) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, stage)
    }

    #[must_use]
    pub fn summary(&'a self) -> EventBuilder<'a> {
        EventBuilder::new(self.ctx, Stage::Summary)
    }
}

pub struct EventBuilder<'a> {
    ctx: &'a AuditCtx<'a>,
    stage: Stage,
    fields: serde_json::Map<String, Value>,
}

impl<'a> EventBuilder<'a> {
    fn new(ctx: &'a AuditCtx<'a>, stage: Stage) -> Self {
        let mut fields = serde_json::Map::new();
        fields.insert("stage".to_string(), json!(stage.as_event()));
        Self { ctx, stage, fields }
    }

    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.fields.insert("path".into(), json!(path.into()));
        self
    }

    #[must_use]
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.insert(key.to_string(), value);
        self
    }

    pub fn emit(self, decision: Decision) {
        let mut fields = Value::Object(self.fields);
        if let Some(obj) = fields.as_object_mut() {
            obj.entry("schema_version").or_insert(json!(SCHEMA_VERSION));
            obj.entry("txn_id").or_insert(json!(self.ctx.txn_id));
            obj.entry("decision").or_insert(json!(decision.as_str()));
            obj.entry("path").or_insert(json!(""));
        }
        self.ctx
            .facts
            .emit(SUBSYSTEM, self.stage.as_event(), decision.as_str(), fields);
    }

    pub fn emit_success(self) {
        self.emit(Decision::Success);
    }

    pub fn emit_failure(self) {
        self.emit(Decision::Failure);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct TestEmitter {
        events: Arc<Mutex<Vec<(String, String, Value)>>>,
    }

    impl FactsEmitter for TestEmitter {
        fn emit(&self, _subsystem: &str, event: &str, decision: &str, fields: Value) {
            self.events
                .lock()
                .unwrap()
                .push((event.to_string(), decision.to_string(), fields));
        }
    }

    #[test]
    fn envelope_fields_are_always_present() {
        let facts = TestEmitter::default();
        let ctx = AuditCtx::new(&facts, new_txn_id());
        let slog = TxnLogger::new(&ctx);
        slog.stage(Stage::Commit).path("/data/a.bin").emit_success();

        let events = facts.events.lock().unwrap();
        let (event, decision, fields) = &events[0];
        assert_eq!(event, "commit");
        assert_eq!(decision, "success");
        assert_eq!(fields["schema_version"], json!(SCHEMA_VERSION));
        assert_eq!(fields["path"], json!("/data/a.bin"));
        assert!(fields["txn_id"].as_str().is_some());
    }
}

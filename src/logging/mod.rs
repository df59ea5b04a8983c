pub mod audit;
pub mod facts;

pub use audit::{Decision, EventBuilder, Stage, TxnLogger};
pub use facts::{AuditSink, FactsEmitter, JsonlSink, StdLogSink};

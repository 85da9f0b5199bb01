//! Field-level mutation of host objects from raw strings.
//!
//! A field goes through the special-case rules first, then alias
//! resolution and a property-then-field member lookup. Conversion problems
//! are recovered with the per-type fallback; member problems fail only that
//! field; missing targets and empty batches abort the batch.

pub mod alias;
mod applier;
mod context;
mod history;
mod report;
mod rules;
mod types;

pub use applier::{apply_batch, apply_field};
pub use context::{Diagnostic, DiagnosticLog, DiagnosticSink, MutationContext, Severity};
pub use history::{
    apply_field_recorded, capture_snapshot, restore_snapshot, HistoryEntry, HistoryRecorder,
    HistoryStep, Snapshot, UndoHistory,
};
pub use report::{summarize, BatchResult};
pub use types::{BatchError, FieldErrorCode, FieldOutcome, FieldRequest};

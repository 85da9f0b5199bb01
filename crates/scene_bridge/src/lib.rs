//! Applies loosely typed, string-valued property edits to typed host
//! objects: value parsing with documented fallbacks, member aliasing,
//! special-case rules, batch reporting, and an undo history around it.

pub mod commands;
pub mod mutation;
pub mod reflect;
pub mod scene;
pub mod values;

pub use commands::{CommandRouter, Operation, Response, RouterError};
pub use mutation::{
    apply_batch, apply_field, summarize, BatchError, BatchResult, FieldErrorCode, FieldOutcome,
    FieldRequest, MutationContext,
};
pub use reflect::{DynamicObject, MemberInfo, Reflect};
pub use scene::{InMemoryScene, ObjectId, SceneStore, TargetHandle, TargetRef};
pub use values::{convert, ConversionOutcome, TypeDescriptor, TypedValue};

use serde::Serialize;
use thiserror::Error;

use crate::scene::LookupError;

/// One requested assignment: a member name (possibly an alias) and the raw
/// string to convert for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequest {
    pub name: String,
    pub raw_value: String,
}

impl FieldRequest {
    pub fn new(name: impl Into<String>, raw_value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            raw_value: raw_value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FieldErrorCode {
    MalformedValue,
    MemberNotFound,
    EnumParseFailure,
    ReadOnly,
    RuleFailed,
}

/// Result for one field. An applied outcome may still carry
/// `MalformedValue` when a fallback value was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldOutcome {
    pub name: String,
    pub applied: bool,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<FieldErrorCode>,
}

impl FieldOutcome {
    pub fn applied(name: &str, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            applied: true,
            detail: detail.into(),
            code: None,
        }
    }

    pub fn applied_with_fallback(name: &str, detail: impl Into<String>) -> Self {
        Self {
            code: Some(FieldErrorCode::MalformedValue),
            ..Self::applied(name, detail)
        }
    }

    pub fn failed(name: &str, code: FieldErrorCode, detail: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            applied: false,
            detail: detail.into(),
            code: Some(code),
        }
    }
}

/// Preconditions that abort a whole batch before any field is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error(transparent)]
    Lookup(#[from] LookupError),
    #[error("no fields supplied")]
    NoFields,
}

impl BatchError {
    pub fn code(&self) -> &'static str {
        match self {
            BatchError::Lookup(LookupError::TargetNotFound { .. }) => "TargetNotFound",
            BatchError::Lookup(LookupError::KindNotFound { .. }) => "KindNotFound",
            BatchError::NoFields => "NoFields",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_codes_serialize_by_name() {
        let outcome = FieldOutcome::failed("bogus", FieldErrorCode::MemberNotFound, "nope");
        let json = serde_json::to_value(&outcome).expect("json");
        assert_eq!(json["code"], "MemberNotFound");
        assert_eq!(json["applied"], false);

        let applied = serde_json::to_value(FieldOutcome::applied("x", "5")).expect("json");
        assert!(applied.get("code").is_none());
    }

    #[test]
    fn batch_errors_report_stable_codes() {
        let missing = BatchError::from(LookupError::TargetNotFound {
            target: "Ghost".to_string(),
        });
        assert_eq!(missing.code(), "TargetNotFound");
        assert_eq!(missing.to_string(), "no object matches target 'Ghost'");
        assert_eq!(BatchError::NoFields.code(), "NoFields");
    }
}

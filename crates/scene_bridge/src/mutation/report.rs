use serde::Serialize;

use super::types::FieldOutcome;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    pub full_success: bool,
    pub partial_success: bool,
    pub outcomes: Vec<FieldOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_members: Option<Vec<String>>,
}

impl BatchResult {
    pub fn applied_count(&self) -> usize {
        self.outcomes.iter().filter(|outcome| outcome.applied).count()
    }

    pub fn with_available_members(mut self, members: Vec<String>) -> Self {
        self.available_members = Some(members);
        self
    }
}

/// Folds field outcomes into the batch envelope. Never fails; an empty
/// slice is neither a full nor a partial success.
pub fn summarize(outcomes: Vec<FieldOutcome>) -> BatchResult {
    let applied = outcomes.iter().filter(|outcome| outcome.applied).count();
    BatchResult {
        full_success: !outcomes.is_empty() && applied == outcomes.len(),
        partial_success: applied > 0 && applied < outcomes.len(),
        outcomes,
        available_members: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::types::FieldErrorCode;

    #[test]
    fn one_failure_in_three_is_partial() {
        let result = summarize(vec![
            FieldOutcome::applied("x", "1"),
            FieldOutcome::failed("bogus", FieldErrorCode::MemberNotFound, "nope"),
            FieldOutcome::applied("y", "2"),
        ]);
        assert!(result.partial_success);
        assert!(!result.full_success);
        assert_eq!(result.outcomes.len(), 3);
        assert_eq!(result.applied_count(), 2);
    }

    #[test]
    fn all_or_nothing_batches() {
        let all = summarize(vec![FieldOutcome::applied("x", "1")]);
        assert!(all.full_success);
        assert!(!all.partial_success);

        let none = summarize(vec![FieldOutcome::failed(
            "x",
            FieldErrorCode::ReadOnly,
            "no",
        )]);
        assert!(!none.full_success);
        assert!(!none.partial_success);

        let empty = summarize(Vec::new());
        assert!(!empty.full_success);
        assert!(!empty.partial_success);
    }

    #[test]
    fn serializes_camel_case_and_omits_members_on_success() {
        let json = serde_json::to_value(summarize(vec![FieldOutcome::applied("x", "1")]))
            .expect("json");
        assert_eq!(json["fullSuccess"], true);
        assert!(json.get("availableMembers").is_none());

        let json = serde_json::to_value(
            summarize(Vec::new()).with_available_members(vec!["position".to_string()]),
        )
        .expect("json");
        assert_eq!(json["availableMembers"][0], "position");
    }
}

//! Reconciliation of batch outcomes with record identities.

use crate::concurrency::ConcurrencyCheck;
use crate::error::{Operation, WriterError};
use crate::statement::Shape;
use feature_types::ModificationFailure;
use tracing::warn;

/// Message for a zero-row outcome without concurrency checking.
pub const OBJECT_DOES_NOT_EXIST: &str = "Object does not exist";

/// Message for a zero-row outcome with concurrency checking. The store cannot
/// tell a missing record from a token mismatch, so both are reported alike.
pub const OBJECT_DOES_NOT_EXIST_OR_UUID_MISMATCH: &str = "Object does not exist or UUID mismatch";

/// Turns zero-row outcomes into [`ModificationFailure`]s and decides escalation.
#[derive(Debug, Clone, Copy)]
pub struct FailureAggregator {
    operation: Operation,
    check: ConcurrencyCheck,
}

impl FailureAggregator {
    pub fn new(operation: Operation, check: ConcurrencyCheck) -> Self {
        Self { operation, check }
    }

    pub fn message(&self) -> &'static str {
        if self.check.is_requested() {
            OBJECT_DOES_NOT_EXIST_OR_UUID_MISMATCH
        } else {
            OBJECT_DOES_NOT_EXIST
        }
    }

    /// Walk `outcomes` in lockstep with the `ids` submitted for `shape`.
    ///
    /// Appends one failure per zero-row outcome and returns how many were
    /// added. A length mismatch is fatal and records nothing.
    pub fn reconcile(
        &self,
        shape: Shape,
        ids: &[String],
        outcomes: &[u64],
        failures: &mut Vec<ModificationFailure>,
    ) -> Result<usize, WriterError> {
        verify_outcome_count(self.operation, shape, ids.len(), outcomes.len())?;

        let before = failures.len();
        failures.extend(
            ids.iter()
                .zip(outcomes)
                .filter(|(_, affected)| **affected == 0)
                .map(|(id, _)| ModificationFailure::new(id.clone(), self.message())),
        );
        Ok(failures.len() - before)
    }

    /// Convert a non-empty failure list into a batch-level error.
    pub fn escalate(&self, failures: &[ModificationFailure]) -> Result<(), WriterError> {
        if failures.is_empty() {
            return Ok(());
        }
        warn!(
            "{} failed for {} object(s), first: {}",
            self.operation,
            failures.len(),
            failures[0].id()
        );
        Err(WriterError::ModificationFailed {
            operation: self.operation,
            failures: failures.len(),
        })
    }
}

/// Fail unless the store returned exactly one outcome per submitted row.
pub fn verify_outcome_count(
    operation: Operation,
    shape: Shape,
    submitted: usize,
    returned: usize,
) -> Result<(), WriterError> {
    if submitted != returned {
        return Err(WriterError::OutcomeCountMismatch {
            operation,
            shape,
            submitted,
            returned,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_zero_rows_become_failures_in_order() {
        let aggregator = FailureAggregator::new(Operation::Update, ConcurrencyCheck::disabled());
        let mut failures = Vec::new();

        let added = aggregator
            .reconcile(
                Shape::Update { checked: false },
                &ids(&["a", "b", "c", "d"]),
                &[1, 0, 1, 0],
                &mut failures,
            )
            .unwrap();

        assert_eq!(added, 2);
        assert_eq!(
            failures,
            vec![
                ModificationFailure::new("b", OBJECT_DOES_NOT_EXIST),
                ModificationFailure::new("d", OBJECT_DOES_NOT_EXIST),
            ]
        );
    }

    #[test]
    fn test_checked_message_mentions_mismatch() {
        let aggregator = FailureAggregator::new(Operation::Delete, ConcurrencyCheck::enabled());
        let mut failures = Vec::new();
        aggregator
            .reconcile(Shape::Delete { checked: true }, &ids(&["a"]), &[0], &mut failures)
            .unwrap();

        assert_eq!(failures[0].message(), "Object does not exist or UUID mismatch");
    }

    #[test]
    fn test_length_mismatch_is_fatal() {
        let aggregator = FailureAggregator::new(Operation::Update, ConcurrencyCheck::disabled());
        let mut failures = Vec::new();

        let err = aggregator
            .reconcile(
                Shape::UpdateWithoutGeometry { checked: false },
                &ids(&["a", "b"]),
                &[0],
                &mut failures,
            )
            .unwrap_err();

        assert!(matches!(
            err,
            WriterError::OutcomeCountMismatch {
                submitted: 2,
                returned: 1,
                ..
            }
        ));
        assert!(failures.is_empty());
    }

    #[test]
    fn test_multi_row_outcomes_are_not_failures() {
        let aggregator = FailureAggregator::new(Operation::Delete, ConcurrencyCheck::disabled());
        let mut failures = Vec::new();
        let added = aggregator
            .reconcile(Shape::Delete { checked: false }, &ids(&["a"]), &[2], &mut failures)
            .unwrap();
        assert_eq!(added, 0);
    }

    #[test]
    fn test_escalate() {
        let aggregator = FailureAggregator::new(Operation::Delete, ConcurrencyCheck::disabled());
        assert!(aggregator.escalate(&[]).is_ok());

        let err = aggregator
            .escalate(&[ModificationFailure::new("c", OBJECT_DOES_NOT_EXIST)])
            .unwrap_err();
        assert!(matches!(
            err,
            WriterError::ModificationFailed {
                operation: Operation::Delete,
                failures: 1
            }
        ));
    }
}

//! Flat result of a mutating operation, for hosts that render or log it.

use serde::Serialize;

use crate::error::LifecycleError;
use crate::model::OverlapPeriod;
use crate::service::AllocationOutcome;
use crate::types::AllocationId;

/// Success flag, message, id, total and warnings in one serializable value.
///
/// On a capacity rejection `total_percentage` is the existing commitment
/// during the worst window and `warnings` is the full breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllocationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allocation_id: Option<AllocationId>,
    pub total_percentage: i64,
    pub warnings: Vec<OverlapPeriod>,
}

impl AllocationResult {
    pub fn ok(outcome: AllocationOutcome) -> Self {
        Self {
            success: true,
            error_message: None,
            allocation_id: Some(outcome.allocation_id),
            total_percentage: outcome.total_percentage,
            warnings: outcome.warnings,
        }
    }

    pub fn error(err: &LifecycleError) -> Self {
        let (total_percentage, warnings) = err
            .capacity_exceeded()
            .map(|details| (details.existing_percentage, details.overlapping_periods.clone()))
            .unwrap_or_default();
        Self {
            success: false,
            error_message: Some(err.to_string()),
            allocation_id: None,
            total_percentage,
            warnings,
        }
    }
}

impl From<Result<AllocationOutcome, LifecycleError>> for AllocationResult {
    fn from(result: Result<AllocationOutcome, LifecycleError>) -> Self {
        match result {
            Ok(outcome) => Self::ok(outcome),
            Err(err) => Self::error(&err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CapacityExceeded, Operation};
    use crate::test_support::{date, range};

    #[test]
    fn test_ok_result_serializes_without_error() {
        let result = AllocationResult::ok(AllocationOutcome {
            allocation_id: AllocationId::new(3).unwrap(),
            total_percentage: 90,
            warnings: vec![OverlapPeriod {
                start: date(1, 15),
                end: date(1, 31),
                total_percentage: 40,
                project_names: vec!["Project X".to_string()],
            }],
        });

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "success": true,
                "allocation_id": 3,
                "total_percentage": 90,
                "warnings": [{
                    "start": "2026-01-15",
                    "end": "2026-01-31",
                    "total_percentage": 40,
                    "project_names": ["Project X"],
                }],
            })
        );
    }

    #[test]
    fn test_capacity_error_carries_existing_total_and_breakdown() {
        let err = LifecycleError::CapacityExceeded(Box::new(CapacityExceeded {
            operation: Operation::Create,
            requested_percentage: 70,
            max_total_percentage: 110,
            existing_percentage: 40,
            window: range((1, 10), (1, 20)),
            overlapping_periods: vec![OverlapPeriod {
                start: date(1, 10),
                end: date(1, 20),
                total_percentage: 110,
                project_names: vec!["Project X".to_string()],
            }],
        }));

        let result = AllocationResult::from(Err(err));
        assert!(!result.success);
        assert_eq!(result.total_percentage, 40);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.allocation_id.is_none());
    }

    #[test]
    fn test_other_errors_have_no_breakdown() {
        let result = AllocationResult::error(&LifecycleError::PercentageRequired);
        assert!(!result.success);
        assert_eq!(
            result.error_message.as_deref(),
            Some("Percentage is required for this role")
        );
        assert_eq!(result.total_percentage, 0);
        assert!(result.warnings.is_empty());
    }
}

//! Capacity analysis over a resource's overlapping allocations.
//!
//! # Algorithm Summary
//!
//! 1. Lay the candidate range on a day grid as the half-open span `[start, end + 1)`
//! 2. Collect boundaries: the candidate's own, plus every existing start and
//!    `end + 1` that falls strictly inside the candidate span
//! 3. Sweep consecutive boundary pairs; each pair is a sub-period during which
//!    no allocation starts or stops, so one representative day (the midpoint)
//!    decides which allocations are active for the whole sub-period
//! 4. Sum the candidate's percentage with the active allocations' percentages
//!    (clamped to the `i64` range) and keep the earliest maximal sub-period
//!
//! Working with `end + 1` keeps days shared by touching ranges inside a
//! sub-period instead of on its edge, so a Jan 31 overlap is counted.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{Allocation, OverlapPeriod};
use crate::range::{DateRange, date_from_ordinal};
use crate::types::clamped_total;

/// Result of analyzing a candidate allocation against existing overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CapacityAnalysis {
    /// Highest total percentage reached during any sub-period.
    pub max_total_percentage: i64,

    /// Share held by existing allocations during `worst_period`, candidate excluded.
    pub existing_percentage: i64,

    /// The earliest sub-period reaching `max_total_percentage`.
    pub worst_period: DateRange,

    /// Every sub-period with a positive total, in ascending order.
    pub overlapping_periods: Vec<OverlapPeriod>,
}

impl CapacityAnalysis {
    /// Analysis for a candidate that shares no days with existing allocations.
    pub const fn uncontested(candidate: DateRange, candidate_percentage: i64) -> Self {
        Self {
            max_total_percentage: candidate_percentage,
            existing_percentage: 0,
            worst_period: candidate,
            overlapping_periods: Vec::new(),
        }
    }
}

/// Analyzes the commitment of a resource if `candidate_percentage` were added
/// over `candidate`.
///
/// `existing` should hold the resource's allocations overlapping the
/// candidate (see [`crate::find_overlapping`]); allocations outside the
/// candidate range never become active and are ignored. Untracked
/// percentages count as zero but their projects are still named.
pub fn analyze(
    existing: &[Allocation],
    candidate: DateRange,
    candidate_percentage: i64,
) -> CapacityAnalysis {
    if existing.is_empty() {
        return CapacityAnalysis::uncontested(candidate, candidate_percentage);
    }

    let span_start = candidate.start_ordinal();
    let span_end = candidate.end_ordinal();

    let mut boundaries = BTreeSet::from([span_start, span_end]);
    for allocation in existing {
        for boundary in [allocation.range.start_ordinal(), allocation.range.end_ordinal()] {
            if boundary > span_start && boundary < span_end {
                boundaries.insert(boundary);
            }
        }
    }
    let boundaries: Vec<i64> = boundaries.into_iter().collect();

    let mut worst: Option<(i64, i64, DateRange)> = None;
    let mut overlapping_periods = Vec::new();

    for pair in boundaries.windows(2) {
        let &[from, until] = pair else {
            continue;
        };
        let (Some(first_day), Some(last_day)) = (date_from_ordinal(from), date_from_ordinal(until - 1))
        else {
            continue;
        };
        let midpoint = from + (until - from) / 2;

        let active: Vec<&Allocation> = existing
            .iter()
            .filter(|a| a.range.start_ordinal() <= midpoint && midpoint < a.range.end_ordinal())
            .collect();

        let contributions = active.iter().map(|a| a.percentage.contribution());
        let total =
            clamped_total(std::iter::once(candidate_percentage).chain(contributions.clone()));

        if worst.is_none_or(|(max, _, _)| total > max) {
            let period = DateRange::new(first_day, last_day).unwrap_or(candidate);
            worst = Some((total, clamped_total(contributions), period));
        }

        if total > 0 {
            overlapping_periods.push(OverlapPeriod {
                start: first_day,
                end: last_day,
                total_percentage: total,
                project_names: active.iter().map(|a| a.project.name.clone()).collect(),
            });
        }
    }

    match worst {
        Some((max_total_percentage, existing_percentage, worst_period)) => CapacityAnalysis {
            max_total_percentage,
            existing_percentage,
            worst_period,
            overlapping_periods,
        },
        None => CapacityAnalysis::uncontested(candidate, candidate_percentage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{allocation, date, range};
    use crate::types::Percentage;

    fn project_x() -> Allocation {
        allocation(1, 1, "Project X", range((1, 1), (1, 31)), Percentage::Percent(40))
    }

    #[test]
    fn test_no_overlaps_returns_candidate() {
        let candidate = range((1, 15), (2, 15));
        let analysis = analyze(&[], candidate, 50);

        assert_eq!(analysis.max_total_percentage, 50);
        assert_eq!(analysis.worst_period, candidate);
        assert!(analysis.overlapping_periods.is_empty());
    }

    #[test]
    fn test_partial_overlap_splits_into_sub_periods() {
        let analysis = analyze(&[project_x()], range((1, 15), (2, 15)), 50);

        assert_eq!(analysis.max_total_percentage, 90);
        assert_eq!(analysis.worst_period, range((1, 15), (1, 31)));
        assert_eq!(
            analysis.overlapping_periods,
            vec![
                OverlapPeriod {
                    start: date(1, 15),
                    end: date(1, 31),
                    total_percentage: 90,
                    project_names: vec!["Project X".to_string()],
                },
                OverlapPeriod {
                    start: date(2, 1),
                    end: date(2, 15),
                    total_percentage: 50,
                    project_names: vec![],
                },
            ]
        );
    }

    #[test]
    fn test_candidate_inside_existing_is_one_period() {
        let analysis = analyze(&[project_x()], range((1, 10), (1, 20)), 70);

        assert_eq!(analysis.max_total_percentage, 110);
        assert_eq!(analysis.existing_percentage, 40);
        assert_eq!(analysis.worst_period, range((1, 10), (1, 20)));
        assert_eq!(analysis.overlapping_periods.len(), 1);
    }

    #[test]
    fn test_huge_candidate_saturates_instead_of_wrapping() {
        let analysis = analyze(&[project_x()], range((1, 10), (1, 20)), i64::MAX);

        assert_eq!(analysis.max_total_percentage, i64::MAX);
        assert_eq!(analysis.existing_percentage, 40);
        assert_eq!(analysis.worst_period, range((1, 10), (1, 20)));
        assert_eq!(analysis.overlapping_periods[0].total_percentage, i64::MAX);
    }

    #[test]
    fn test_huge_existing_allocations_saturate() {
        let existing = vec![
            allocation(1, 1, "A", range((1, 1), (1, 31)), Percentage::Percent(i64::MAX)),
            allocation(2, 1, "B", range((1, 10), (1, 20)), Percentage::Percent(i64::MAX)),
        ];
        let analysis = analyze(&existing, range((1, 1), (1, 31)), 10);

        assert_eq!(analysis.max_total_percentage, i64::MAX);
        assert_eq!(analysis.existing_percentage, i64::MAX);
        assert_eq!(analysis.worst_period, range((1, 1), (1, 9)));
    }

    #[test]
    fn test_single_shared_day_is_counted() {
        let full = allocation(1, 1, "Project X", range((1, 1), (1, 31)), Percentage::Percent(100));
        let analysis = analyze(&[full], range((1, 31), (2, 15)), 50);

        assert_eq!(analysis.max_total_percentage, 150);
        assert_eq!(analysis.worst_period, range((1, 31), (1, 31)));
    }

    #[test]
    fn test_single_day_candidate_inside_existing() {
        let analysis = analyze(&[project_x()], range((1, 15), (1, 15)), 70);

        assert_eq!(analysis.max_total_percentage, 110);
        assert_eq!(analysis.worst_period, range((1, 15), (1, 15)));
    }

    #[test]
    fn test_stacked_allocations_find_peak() {
        let existing = vec![
            allocation(1, 1, "A", range((1, 1), (1, 31)), Percentage::Percent(30)),
            allocation(2, 1, "B", range((1, 10), (1, 20)), Percentage::Percent(30)),
            allocation(3, 1, "C", range((1, 18), (2, 10)), Percentage::Percent(30)),
        ];
        let analysis = analyze(&existing, range((1, 1), (2, 28)), 20);

        assert_eq!(analysis.max_total_percentage, 110);
        assert_eq!(analysis.worst_period, range((1, 18), (1, 20)));
        let peak = analysis
            .overlapping_periods
            .iter()
            .find(|p| p.total_percentage == 110)
            .unwrap();
        assert_eq!(peak.project_names, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ties_keep_earliest_period() {
        let existing = vec![
            allocation(1, 1, "A", range((1, 1), (1, 10)), Percentage::Percent(50)),
            allocation(2, 1, "B", range((1, 21), (1, 31)), Percentage::Percent(50)),
        ];
        let analysis = analyze(&existing, range((1, 1), (1, 31)), 30);

        assert_eq!(analysis.max_total_percentage, 80);
        assert_eq!(analysis.worst_period, range((1, 1), (1, 10)));
        assert_eq!(analysis.overlapping_periods.len(), 3);
        assert_eq!(analysis.overlapping_periods[1].total_percentage, 30);
    }

    #[test]
    fn test_untracked_allocations_named_but_not_summed() {
        let existing = vec![allocation(
            1,
            1,
            "Ceremonies",
            range((1, 1), (1, 31)),
            Percentage::Untracked,
        )];
        let analysis = analyze(&existing, range((1, 5), (1, 6)), 60);

        assert_eq!(analysis.max_total_percentage, 60);
        assert_eq!(analysis.overlapping_periods[0].project_names, vec!["Ceremonies"]);
    }

    #[test]
    fn test_zero_total_periods_are_omitted() {
        let existing = vec![allocation(
            1,
            1,
            "Ceremonies",
            range((1, 1), (1, 31)),
            Percentage::Untracked,
        )];
        let analysis = analyze(&existing, range((1, 5), (1, 6)), 0);

        assert_eq!(analysis.max_total_percentage, 0);
        assert!(analysis.overlapping_periods.is_empty());
    }

    #[test]
    fn test_existing_outside_candidate_is_ignored() {
        let existing = vec![allocation(1, 1, "Far", range((6, 1), (6, 30)), Percentage::Percent(90))];
        let analysis = analyze(&existing, range((1, 1), (1, 31)), 40);

        assert_eq!(analysis.max_total_percentage, 40);
        assert_eq!(analysis.worst_period, range((1, 1), (1, 31)));
    }

    #[test]
    fn test_total_is_sum_of_active_on_every_day() {
        // Brute-force check: every day's total must be at most the reported max,
        // and the worst period's days must all reach it.
        let existing = vec![
            allocation(1, 1, "A", range((1, 3), (1, 9)), Percentage::Percent(25)),
            allocation(2, 1, "B", range((1, 9), (1, 9)), Percentage::Percent(35)),
            allocation(3, 1, "C", range((1, 5), (1, 20)), Percentage::Percent(15)),
            allocation(4, 1, "D", range((1, 10), (1, 12)), Percentage::Untracked),
        ];
        let candidate = range((1, 1), (1, 25));
        let analysis = analyze(&existing, candidate, 10);

        let day_total = |day| {
            10 + existing
                .iter()
                .filter(|a| a.range.contains(day))
                .map(|a| a.percentage.contribution())
                .sum::<i64>()
        };

        let mut day = candidate.start();
        let mut brute_max = i64::MIN;
        while day <= candidate.end() {
            brute_max = brute_max.max(day_total(day));
            day = day.succ_opt().unwrap();
        }
        assert_eq!(analysis.max_total_percentage, brute_max);
        assert_eq!(analysis.max_total_percentage, 85);
        assert_eq!(analysis.worst_period, range((1, 9), (1, 9)));

        for period in &analysis.overlapping_periods {
            let mut day = period.start;
            while day <= period.end {
                assert_eq!(day_total(day), period.total_percentage);
                day = day.succ_opt().unwrap();
            }
        }
    }
}

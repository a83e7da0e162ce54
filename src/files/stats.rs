//! Aggregation of monthly upload counters.

use crate::catalog::MonthlyUploadCount;
use std::collections::BTreeMap;

/// Upload counts per year; slot `month - 1` holds that month's count.
pub type FileStats = BTreeMap<i32, [u64; 12]>;

/// Group counters by year into fixed 12-month arrays.
///
/// Months never seen stay at 0. Counters with a month outside 1..=12 are
/// skipped.
pub fn aggregate_stats(counts: &[MonthlyUploadCount]) -> FileStats {
    let mut stats = FileStats::new();
    for entry in counts {
        if !(1..=12).contains(&entry.month) {
            tracing::warn!(
                year = entry.year,
                month = entry.month,
                "Skipping monthly counter with invalid month"
            );
            continue;
        }
        stats.entry(entry.year).or_insert([0; 12])[(entry.month - 1) as usize] = entry.count;
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(year: i32, month: u32, count: u64) -> MonthlyUploadCount {
        MonthlyUploadCount { year, month, count }
    }

    #[test]
    fn test_fills_missing_months_with_zero() {
        let stats = aggregate_stats(&[count(2024, 1, 5), count(2024, 3, 2)]);
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[&2024], [5, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_groups_by_year() {
        let stats = aggregate_stats(&[count(2023, 12, 9), count(2024, 1, 1)]);
        assert_eq!(stats[&2023][11], 9);
        assert_eq!(stats[&2024][0], 1);
    }

    #[test]
    fn test_invalid_month_skipped() {
        let stats = aggregate_stats(&[count(2024, 0, 3), count(2024, 13, 4)]);
        assert!(stats.is_empty());
    }

    #[test]
    fn test_empty() {
        assert!(aggregate_stats(&[]).is_empty());
    }
}

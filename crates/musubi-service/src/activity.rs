//! Member activity metrics: rank, streak and heatmap.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum AttendanceRank {
    Beginner,
    Regular,
    Expert,
    Master,
    Legend,
}

impl AttendanceRank {
    pub fn from_count(attended: usize) -> Self {
        match attended {
            51.. => AttendanceRank::Legend,
            31.. => AttendanceRank::Master,
            16.. => AttendanceRank::Expert,
            6.. => AttendanceRank::Regular,
            _ => AttendanceRank::Beginner,
        }
    }
}

impl fmt::Display for AttendanceRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Number of consecutive check-ins counting back from the latest, where
/// each is at most one day before the previous one.
pub fn attendance_streak(check_ins: &[DateTime<Utc>]) -> u32 {
    let mut sorted = check_ins.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));

    let mut iter = sorted.into_iter();
    let Some(mut last) = iter.next() else {
        return 0;
    };
    let mut streak = 1;
    for current in iter {
        if (last - current).num_days() > 1 {
            break;
        }
        streak += 1;
        last = current;
    }
    streak
}

/// Calendar days (UTC) with at least one check-in.
pub fn attendance_heatmap(check_ins: &[DateTime<Utc>]) -> BTreeSet<NaiveDate> {
    check_ins.iter().map(|t| t.date_naive()).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn rank_thresholds() {
        assert_eq!(AttendanceRank::from_count(0), AttendanceRank::Beginner);
        assert_eq!(AttendanceRank::from_count(5), AttendanceRank::Beginner);
        assert_eq!(AttendanceRank::from_count(6), AttendanceRank::Regular);
        assert_eq!(AttendanceRank::from_count(16), AttendanceRank::Expert);
        assert_eq!(AttendanceRank::from_count(31), AttendanceRank::Master);
        assert_eq!(AttendanceRank::from_count(51), AttendanceRank::Legend);
        assert_eq!(AttendanceRank::Legend.to_string(), "Legend");
    }

    #[test]
    fn empty_history_has_no_streak() {
        assert_eq!(attendance_streak(&[]), 0);
    }

    #[test]
    fn streak_stops_at_first_gap() {
        let check_ins = [at(10, 18), at(9, 18), at(8, 9), at(3, 18), at(2, 18)];
        assert_eq!(attendance_streak(&check_ins), 3);
    }

    #[test]
    fn streak_ignores_input_order() {
        let check_ins = [at(8, 9), at(10, 18), at(9, 18)];
        assert_eq!(attendance_streak(&check_ins), 3);
    }

    #[test]
    fn gap_just_under_two_days_still_counts() {
        let latest = at(10, 12);
        let earlier = latest - Duration::hours(47);
        assert_eq!(attendance_streak(&[latest, earlier]), 2);
    }

    #[test]
    fn heatmap_collapses_same_day() {
        let days = attendance_heatmap(&[at(9, 9), at(9, 20), at(10, 1)]);
        assert_eq!(days.len(), 2);
        assert!(days.contains(&NaiveDate::from_ymd_opt(2025, 4, 9).unwrap()));
    }
}

use chrono::{Datelike, NaiveDate, Weekday};

/// Loss-of-pay weight of a single leave day: Sunday is free, Monday and
/// Saturday count double.
pub fn lop_weight(day: NaiveDate) -> i64 {
    match day.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon | Weekday::Sat => 2,
        _ => 1,
    }
}

/// Every non-Sunday day in `[start, end]`.
pub fn chargeable_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
        .filter(|d| d.weekday() != Weekday::Sun)
}

/// LOP days for an approved leave covering `[start, end]` inclusive.
pub fn lop_days(start: NaiveDate, end: NaiveDate) -> i64 {
    chargeable_days(start, end).map(lop_weight).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    // 2026-03-02 is a Monday.
    fn monday() -> NaiveDate {
        d(2026, 3, 2)
    }

    #[test]
    fn weights_per_weekday() {
        let weights: Vec<i64> = monday().iter_days().take(7).map(lop_weight).collect();
        assert_eq!(weights, vec![2, 1, 1, 1, 1, 2, 0]);
    }

    #[test]
    fn full_week_monday_to_sunday_is_eight() {
        // 2 (Mon) + 1+1+1+1 (Tue-Fri) + 2 (Sat) + 0 (Sun)
        assert_eq!(lop_days(monday(), d(2026, 3, 8)), 8);
    }

    #[test]
    fn sunday_to_saturday_week() {
        // Mon and Sat double, Tue-Fri single, Sunday free.
        assert_eq!(lop_days(d(2026, 3, 1), d(2026, 3, 7)), 2 * 2 + 4);
    }

    #[test]
    fn monday_to_wednesday_is_four() {
        assert_eq!(lop_days(monday(), d(2026, 3, 4)), 4);
        assert_eq!(chargeable_days(monday(), d(2026, 3, 4)).count(), 3);
    }

    #[test]
    fn single_days() {
        assert_eq!(lop_days(d(2026, 3, 1), d(2026, 3, 1)), 0);
        assert_eq!(lop_days(d(2026, 3, 7), d(2026, 3, 7)), 2);
        assert_eq!(lop_days(d(2026, 3, 5), d(2026, 3, 5)), 1);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert_eq!(lop_days(d(2026, 3, 5), d(2026, 3, 4)), 0);
    }

    #[test]
    fn sundays_are_never_marked() {
        assert!(chargeable_days(d(2026, 3, 1), d(2026, 3, 31)).all(|day| day.weekday() != Weekday::Sun));
        assert_eq!(chargeable_days(d(2026, 3, 1), d(2026, 3, 31)).count(), 26);
    }
}

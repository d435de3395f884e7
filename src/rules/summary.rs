use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use utoipa::ToSchema;

use super::lop::lop_weight;
use crate::model::{attendance::Attendance, status::AttendanceStatus};

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySummary {
    pub user_id: u64,
    pub month: u32,
    pub year: i32,
    /// Days of the month that are neither Sunday nor a company holiday.
    pub total_working_days: i64,
    pub present_days: i64,
    pub half_days: i64,
    pub leave_days: i64,
    /// Elapsed working days with no present, half-day or leave record.
    pub absent_days: i64,
    pub lop_days: i64,
    pub total_permission_minutes: i64,
    pub half_day_deduction: bool,
}

/// First and last day of a month, or `None` for an invalid month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    Some((first, next.pred_opt()?))
}

pub struct MonthInput<'a> {
    pub user_id: u64,
    pub year: i32,
    pub month: u32,
    /// Days after this one have not happened yet and are never absent.
    pub today: NaiveDate,
    pub records: &'a [Attendance],
    pub holidays: &'a [NaiveDate],
    /// Approved leave ranges, inclusive.
    pub approved_leaves: &'a [(NaiveDate, NaiveDate)],
}

pub fn summarize_month(input: &MonthInput<'_>) -> Option<MonthlySummary> {
    let (first, last) = month_bounds(input.year, input.month)?;
    let holidays: HashSet<NaiveDate> = input.holidays.iter().copied().collect();
    let by_day: HashMap<NaiveDate, &Attendance> = input
        .records
        .iter()
        .filter(|r| r.date >= first && r.date <= last)
        .map(|r| (r.date, r))
        .collect();

    let mut summary = MonthlySummary {
        user_id: input.user_id,
        month: input.month,
        year: input.year,
        total_working_days: 0,
        present_days: 0,
        half_days: 0,
        leave_days: 0,
        absent_days: 0,
        lop_days: 0,
        total_permission_minutes: 0,
        half_day_deduction: false,
    };

    for record in by_day.values() {
        summary.total_permission_minutes += record.total_permission_minutes;
        match record.status {
            AttendanceStatus::Present => summary.present_days += 1,
            AttendanceStatus::HalfDay => summary.half_days += 1,
            AttendanceStatus::OnLeave => summary.leave_days += 1,
            _ => {}
        }
    }

    for day in first.iter_days().take_while(|d| *d <= last) {
        if day.weekday() == Weekday::Sun || holidays.contains(&day) {
            continue;
        }
        summary.total_working_days += 1;

        let accounted = by_day.get(&day).is_some_and(|r| {
            matches!(
                r.status,
                AttendanceStatus::Present | AttendanceStatus::HalfDay | AttendanceStatus::OnLeave
            )
        });
        if day <= input.today && !accounted {
            summary.absent_days += 1;
        }
    }

    for &(start, end) in input.approved_leaves {
        let from = start.max(first);
        let to = end.min(last);
        summary.lop_days += from
            .iter_days()
            .take_while(|d| *d <= to)
            .map(lop_weight)
            .sum::<i64>();
    }

    summary.half_day_deduction = summary.half_days > 0;
    Some(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn rec(day: u32, status: AttendanceStatus, minutes: i64) -> Attendance {
        Attendance {
            id: day as u64,
            user_id: 7,
            date: d(day),
            shift_name: None,
            login_time: None,
            logout_time: None,
            lunch_out: None,
            lunch_in: None,
            late_minutes: 0,
            lunch_exceeded_minutes: 0,
            total_permission_minutes: minutes,
            is_half_day: status == AttendanceStatus::HalfDay,
            status,
            override_reason: None,
            version: 0,
        }
    }

    #[test]
    fn month_bounds_handle_december_and_leap_years() {
        assert_eq!(
            month_bounds(2026, 12),
            Some((
                NaiveDate::from_ymd_opt(2026, 12, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 12, 31).unwrap()
            ))
        );
        assert_eq!(
            month_bounds(2028, 2).map(|(_, last)| last.day()),
            Some(29)
        );
        assert_eq!(month_bounds(2026, 13), None);
    }

    #[test]
    fn counts_days_by_status() {
        let records = vec![
            rec(2, AttendanceStatus::Present, 20),
            rec(3, AttendanceStatus::HalfDay, 190),
            rec(4, AttendanceStatus::OnLeave, 0),
        ];
        let summary = summarize_month(&MonthInput {
            user_id: 7,
            year: 2026,
            month: 3,
            today: d(6),
            records: &records,
            holidays: &[d(5)],
            approved_leaves: &[(d(4), d(4))],
        })
        .unwrap();

        // 31 days, 5 Sundays, 1 holiday.
        assert_eq!(summary.total_working_days, 25);
        assert_eq!(summary.present_days, 1);
        assert_eq!(summary.half_days, 1);
        assert_eq!(summary.leave_days, 1);
        // Working days up to the 6th: 2, 3, 4, 6 (1st Sunday, 5th holiday); only the 6th is missing.
        assert_eq!(summary.absent_days, 1);
        assert_eq!(summary.lop_days, 1);
        assert_eq!(summary.total_permission_minutes, 210);
        assert!(summary.half_day_deduction);
    }

    #[test]
    fn leave_spanning_months_is_clipped() {
        let summary = summarize_month(&MonthInput {
            user_id: 7,
            year: 2026,
            month: 3,
            today: d(1),
            records: &[],
            holidays: &[],
            approved_leaves: &[(
                NaiveDate::from_ymd_opt(2026, 2, 26).unwrap(),
                d(2),
            )],
        })
        .unwrap();

        // Only Sun 1st (0) and Mon 2nd (2) fall inside March.
        assert_eq!(summary.lop_days, 2);
        assert_eq!(summary.absent_days, 0);
        assert!(!summary.half_day_deduction);
    }
}

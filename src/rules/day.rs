use super::HALF_DAY_THRESHOLD_MINUTES;
use crate::model::{attendance::Attendance, status::AttendanceStatus};

/// Late + lunch overrun + every approved permission of the day.
pub fn total_permission_minutes(late: i64, lunch_exceeded: i64, approved_permissions: &[i64]) -> i64 {
    late.max(0) + lunch_exceeded.max(0) + approved_permissions.iter().sum::<i64>()
}

/// Status and half-day flag implied by a day's permission total.
///
/// Leave, holiday and weekend days keep their status. A worked day goes to
/// Half-Day above the threshold and back to Present once it falls under it.
pub fn derive_day_status(current: AttendanceStatus, total_minutes: i64) -> (AttendanceStatus, bool) {
    match current {
        AttendanceStatus::OnLeave | AttendanceStatus::Holiday | AttendanceStatus::Weekend => {
            (current, false)
        }
        _ if total_minutes > HALF_DAY_THRESHOLD_MINUTES => (AttendanceStatus::HalfDay, true),
        AttendanceStatus::HalfDay => (AttendanceStatus::Present, false),
        _ => (current, false),
    }
}

/// Recomputes every derived field of `record` from its current inputs.
/// Running it twice on unchanged inputs leaves the record unchanged.
pub fn apply_day_totals(record: &mut Attendance, approved_permissions: &[i64]) {
    record.total_permission_minutes = total_permission_minutes(
        record.late_minutes,
        record.lunch_exceeded_minutes,
        approved_permissions,
    );
    let (status, half_day) = derive_day_status(record.status, record.total_permission_minutes);
    record.status = status;
    record.is_half_day = half_day;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(late: i64, lunch: i64, status: AttendanceStatus) -> Attendance {
        Attendance {
            id: 1,
            user_id: 7,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            shift_name: None,
            login_time: None,
            logout_time: None,
            lunch_out: None,
            lunch_in: None,
            late_minutes: late,
            lunch_exceeded_minutes: lunch,
            total_permission_minutes: 0,
            is_half_day: false,
            status,
            override_reason: None,
            version: 0,
        }
    }

    #[test]
    fn total_sums_all_sources() {
        assert_eq!(total_permission_minutes(20, 10, &[30, 45]), 105);
        assert_eq!(total_permission_minutes(0, 0, &[]), 0);
    }

    #[test]
    fn crossing_threshold_escalates() {
        let mut r = record(150, 40, AttendanceStatus::Present);
        apply_day_totals(&mut r, &[]);
        assert_eq!(r.total_permission_minutes, 190);
        assert_eq!(r.status, AttendanceStatus::HalfDay);
        assert!(r.is_half_day);
    }

    #[test]
    fn exactly_threshold_stays_present() {
        let mut r = record(150, 30, AttendanceStatus::Present);
        apply_day_totals(&mut r, &[]);
        assert_eq!(r.total_permission_minutes, 180);
        assert_eq!(r.status, AttendanceStatus::Present);
        assert!(!r.is_half_day);
    }

    #[test]
    fn recompute_is_idempotent() {
        let mut r = record(60, 20, AttendanceStatus::Present);
        apply_day_totals(&mut r, &[60, 50]);
        let first = r.clone();
        apply_day_totals(&mut r, &[60, 50]);
        assert_eq!(r, first);
        assert_eq!(r.total_permission_minutes, 190);
    }

    #[test]
    fn dropping_under_threshold_reverts_half_day() {
        let mut r = record(100, 0, AttendanceStatus::Present);
        apply_day_totals(&mut r, &[90]);
        assert_eq!(r.status, AttendanceStatus::HalfDay);

        apply_day_totals(&mut r, &[]);
        assert_eq!(r.status, AttendanceStatus::Present);
        assert!(!r.is_half_day);
    }

    #[test]
    fn leave_days_never_escalate() {
        let mut r = record(0, 0, AttendanceStatus::OnLeave);
        apply_day_totals(&mut r, &[120, 120]);
        assert_eq!(r.total_permission_minutes, 240);
        assert_eq!(r.status, AttendanceStatus::OnLeave);
        assert!(!r.is_half_day);
    }
}

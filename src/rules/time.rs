use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, Utc};

/// Parses a shift time-of-day as `HH:mm` or `hh:mm AM/PM`.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%I:%M %p"))
        .ok()
}

/// Minutes late for a login observed in local wall-clock time.
///
/// The shift start is anchored on the login's own calendar day. The grace
/// period only decides whether a penalty applies; when it does, lateness is
/// counted from the shift start itself. An unparseable shift start counts as
/// no shift.
pub fn late_minutes(observed_login: NaiveDateTime, shift_start: &str, grace_minutes: i64) -> i64 {
    let Some(start) = parse_time_of_day(shift_start) else {
        tracing::warn!(shift_start, "Invalid shift start time format");
        return 0;
    };

    let anchored = observed_login.date().and_time(start);
    let allowed = anchored + Duration::minutes(grace_minutes.max(0));

    if observed_login > allowed {
        (observed_login - anchored).num_minutes()
    } else {
        0
    }
}

/// Minutes of lunch taken beyond the allowance; 0 until both stamps exist.
pub fn lunch_exceeded_minutes(
    lunch_out: Option<DateTime<Utc>>,
    lunch_in: Option<DateTime<Utc>>,
    allowed_minutes: i64,
) -> i64 {
    match (lunch_out, lunch_in) {
        (Some(out), Some(back)) => ((back - out).num_minutes() - allowed_minutes).max(0),
        _ => 0,
    }
}

/// Same-day span between two times of day, in minutes. Negative when `end`
/// precedes `start`.
pub fn span_minutes(start: NaiveTime, end: NaiveTime) -> i64 {
    (end - start).num_minutes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn utc(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
    }

    #[test]
    fn parses_both_clock_formats() {
        assert_eq!(parse_time_of_day("09:30"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_time_of_day("02:15 PM"), NaiveTime::from_hms_opt(14, 15, 0));
        assert_eq!(parse_time_of_day(" 12:00 am "), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_time_of_day("9 o'clock"), None);
        assert_eq!(parse_time_of_day("25:00"), None);
    }

    #[test]
    fn login_at_end_of_grace_is_on_time() {
        for grace in [0, 1, 15, 30, 59] {
            let login = at(9, 0) + Duration::minutes(grace);
            assert_eq!(late_minutes(login, "09:00", grace), 0, "grace {grace}");
        }
    }

    #[test]
    fn one_minute_past_grace_counts_from_shift_start() {
        for grace in [0, 1, 15, 30, 59] {
            let login = at(9, 0) + Duration::minutes(grace + 1);
            assert_eq!(late_minutes(login, "09:00", grace), grace + 1, "grace {grace}");
        }
    }

    #[test]
    fn twenty_minutes_late_with_fifteen_grace() {
        assert_eq!(late_minutes(at(9, 20), "09:00", 15), 20);
        assert_eq!(late_minutes(at(9, 20), "09:00 AM", 15), 20);
    }

    #[test]
    fn seconds_do_not_round_up() {
        let login = at(9, 16) + Duration::seconds(59);
        assert_eq!(late_minutes(login, "09:00", 15), 16);
    }

    #[test]
    fn early_login_is_not_late() {
        assert_eq!(late_minutes(at(8, 40), "09:00", 0), 0);
    }

    #[test]
    fn unparseable_shift_start_is_ignored() {
        assert_eq!(late_minutes(at(11, 0), "nine", 10), 0);
    }

    #[test]
    fn lunch_needs_both_stamps() {
        assert_eq!(lunch_exceeded_minutes(None, Some(utc(14, 0)), 30), 0);
        assert_eq!(lunch_exceeded_minutes(Some(utc(13, 0)), None, 30), 0);
    }

    #[test]
    fn lunch_at_allowance_is_free() {
        assert_eq!(lunch_exceeded_minutes(Some(utc(13, 0)), Some(utc(13, 45)), 45), 0);
        assert_eq!(lunch_exceeded_minutes(Some(utc(13, 0)), Some(utc(13, 20)), 45), 0);
    }

    #[test]
    fn lunch_overrun_is_monotonic() {
        let mut previous = 0;
        for minutes in 0..180 {
            let back = utc(13, 0) + Duration::minutes(minutes);
            let exceeded = lunch_exceeded_minutes(Some(utc(13, 0)), Some(back), 45);
            assert!(exceeded >= previous);
            previous = exceeded;
        }
        assert_eq!(previous, 179 - 45);
    }

    #[test]
    fn span_is_signed() {
        let nine = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let ten_thirty = NaiveTime::from_hms_opt(10, 30, 0).unwrap();
        assert_eq!(span_minutes(nine, ten_thirty), 90);
        assert_eq!(span_minutes(ten_thirty, nine), -90);
    }
}

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use utoipa::ToSchema;

use super::time::{late_minutes, lunch_exceeded_minutes};
use crate::error::AppError;
use crate::model::{attendance::Attendance, shift::Shift, status::AttendanceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum MarkType {
    Login,
    LunchOut,
    LunchIn,
    Logout,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkRequest {
    #[serde(rename = "type")]
    pub kind: MarkType,
    /// Log in even though the day is covered by approved leave.
    #[serde(rename = "override", default)]
    pub override_leave: bool,
    pub override_reason: Option<String>,
}

/// Side effects the caller has to carry out after a successful mark.
#[derive(Debug, Default, PartialEq)]
pub struct MarkEffect {
    /// Reason to copy onto the approved leave covering the day.
    pub leave_override: Option<String>,
}

/// The moment of a mark, in UTC for storage and in the organisation's wall
/// clock for shift comparisons.
#[derive(Debug, Clone, Copy)]
pub struct MarkClock {
    pub now: DateTime<Utc>,
    pub local: NaiveDateTime,
}

/// Applies one punch to the day's record. `record` is the locked row,
/// possibly a skeleton created for this login. Derived totals are left to
/// [`super::day::apply_day_totals`].
pub fn apply_mark(
    record: &mut Attendance,
    request: &MarkRequest,
    clock: MarkClock,
    shift: Option<&Shift>,
) -> Result<MarkEffect, AppError> {
    let mut effect = MarkEffect::default();

    if request.kind != MarkType::Login && record.login_time.is_none() {
        return Err(AppError::validation("Must login first"));
    }

    match request.kind {
        MarkType::Login => {
            if record.login_time.is_some() {
                return Err(AppError::validation("Already logged in today"));
            }

            if record.status == AttendanceStatus::OnLeave {
                if !request.override_leave {
                    return Err(AppError::LeaveOverrideRequired);
                }
                let reason = request
                    .override_reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| AppError::validation("Override reason is required"))?;
                record.override_reason = Some(reason.to_string());
                effect.leave_override = Some(reason.to_string());
            }

            record.status = AttendanceStatus::Present;
            record.login_time = Some(clock.now);
            record.shift_name = shift.map(|s| s.name.clone());
            record.late_minutes = shift
                .map(|s| late_minutes(clock.local, &s.login_time, s.grace_time))
                .unwrap_or(0);
        }
        MarkType::LunchOut => {
            if record.lunch_out.is_some() {
                return Err(AppError::validation("Lunch already started"));
            }
            record.lunch_out = Some(clock.now);
        }
        MarkType::LunchIn => {
            if record.lunch_out.is_none() {
                return Err(AppError::validation("Must start lunch first"));
            }
            if record.lunch_in.is_some() {
                return Err(AppError::validation("Lunch already ended"));
            }
            record.lunch_in = Some(clock.now);
            record.lunch_exceeded_minutes = shift
                .map(|s| lunch_exceeded_minutes(record.lunch_out, record.lunch_in, s.lunch_duration))
                .unwrap_or(0);
        }
        MarkType::Logout => {
            if record.logout_time.is_some() {
                return Err(AppError::validation("Already logged out today"));
            }
            record.logout_time = Some(clock.now);
        }
    }

    Ok(effect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::day::apply_day_totals;
    use chrono::{NaiveDate, TimeZone};

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn clock(h: u32, m: u32) -> MarkClock {
        MarkClock {
            now: Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap(),
            local: day().and_hms_opt(h, m, 0).unwrap(),
        }
    }

    fn shift() -> Shift {
        Shift {
            id: 1,
            name: "General".into(),
            login_time: "09:00".into(),
            grace_time: 15,
            lunch_start_time: Some("13:00".into()),
            lunch_duration: 45,
            logout_time: "18:00".into(),
            is_active: true,
        }
    }

    fn skeleton(status: AttendanceStatus) -> Attendance {
        Attendance {
            id: 1,
            user_id: 7,
            date: day(),
            shift_name: None,
            login_time: None,
            logout_time: None,
            lunch_out: None,
            lunch_in: None,
            late_minutes: 0,
            lunch_exceeded_minutes: 0,
            total_permission_minutes: 0,
            is_half_day: false,
            status,
            override_reason: None,
            version: 0,
        }
    }

    fn mark(kind: MarkType) -> MarkRequest {
        MarkRequest {
            kind,
            override_leave: false,
            override_reason: None,
        }
    }

    #[test]
    fn late_login_is_recorded_as_present() {
        let mut r = skeleton(AttendanceStatus::Absent);
        let shift = shift();
        let effect = apply_mark(&mut r, &mark(MarkType::Login), clock(9, 20), Some(&shift)).unwrap();

        assert_eq!(effect, MarkEffect::default());
        assert_eq!(r.status, AttendanceStatus::Present);
        assert_eq!(r.late_minutes, 20);
        assert_eq!(r.shift_name.as_deref(), Some("General"));
        assert!(r.login_time.is_some());
    }

    #[test]
    fn no_shift_means_no_penalty() {
        let mut r = skeleton(AttendanceStatus::Absent);
        apply_mark(&mut r, &mark(MarkType::Login), clock(11, 0), None).unwrap();
        assert_eq!(r.late_minutes, 0);
    }

    #[test]
    fn punches_before_login_are_rejected() {
        for kind in [MarkType::LunchOut, MarkType::LunchIn, MarkType::Logout] {
            let mut r = skeleton(AttendanceStatus::Present);
            let err = apply_mark(&mut r, &mark(kind), clock(12, 0), None).unwrap_err();
            assert_eq!(err.to_string(), "Must login first");
        }
    }

    #[test]
    fn second_login_is_rejected() {
        let mut r = skeleton(AttendanceStatus::Absent);
        apply_mark(&mut r, &mark(MarkType::Login), clock(9, 0), None).unwrap();
        assert!(apply_mark(&mut r, &mark(MarkType::Login), clock(9, 5), None).is_err());
    }

    #[test]
    fn leave_day_requires_override() {
        let mut r = skeleton(AttendanceStatus::OnLeave);
        let err = apply_mark(&mut r, &mark(MarkType::Login), clock(9, 0), None).unwrap_err();
        assert!(matches!(err, AppError::LeaveOverrideRequired));
        assert_eq!(r.status, AttendanceStatus::OnLeave);

        let blank = MarkRequest {
            kind: MarkType::Login,
            override_leave: true,
            override_reason: Some("   ".into()),
        };
        assert!(matches!(
            apply_mark(&mut r, &blank, clock(9, 0), None),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn override_login_reverts_to_present_and_computes_lateness() {
        let mut r = skeleton(AttendanceStatus::OnLeave);
        let shift = shift();
        let request = MarkRequest {
            kind: MarkType::Login,
            override_leave: true,
            override_reason: Some(" Client visit ".into()),
        };
        let effect = apply_mark(&mut r, &request, clock(9, 30), Some(&shift)).unwrap();

        assert_eq!(r.status, AttendanceStatus::Present);
        assert_eq!(r.late_minutes, 30);
        assert_eq!(r.override_reason.as_deref(), Some("Client visit"));
        assert_eq!(effect.leave_override.as_deref(), Some("Client visit"));
    }

    #[test]
    fn long_lunch_feeds_half_day_rule() {
        let shift = shift();
        let mut r = skeleton(AttendanceStatus::Absent);
        // 150 minutes late.
        apply_mark(&mut r, &mark(MarkType::Login), clock(11, 30), Some(&shift)).unwrap();
        apply_mark(&mut r, &mark(MarkType::LunchOut), clock(13, 0), Some(&shift)).unwrap();

        let back = clock(14, 25); // 85 minutes, 40 over
        apply_mark(&mut r, &mark(MarkType::LunchIn), back, Some(&shift)).unwrap();
        assert_eq!(r.lunch_exceeded_minutes, 40);

        apply_day_totals(&mut r, &[]);
        assert_eq!(r.total_permission_minutes, 190);
        assert_eq!(r.status, AttendanceStatus::HalfDay);
    }

    #[test]
    fn lunch_in_needs_lunch_out() {
        let mut r = skeleton(AttendanceStatus::Absent);
        apply_mark(&mut r, &mark(MarkType::Login), clock(9, 0), None).unwrap();
        let err = apply_mark(&mut r, &mark(MarkType::LunchIn), clock(13, 0), None).unwrap_err();
        assert_eq!(err.to_string(), "Must start lunch first");
    }

    #[test]
    fn repeated_punches_are_rejected() {
        let mut r = skeleton(AttendanceStatus::Absent);
        let c = clock(9, 0);
        apply_mark(&mut r, &mark(MarkType::Login), c, None).unwrap();
        apply_mark(&mut r, &mark(MarkType::LunchOut), c, None).unwrap();
        assert!(apply_mark(&mut r, &mark(MarkType::LunchOut), c, None).is_err());
        apply_mark(&mut r, &mark(MarkType::LunchIn), c, None).unwrap();
        assert!(apply_mark(&mut r, &mark(MarkType::LunchIn), c, None).is_err());
        apply_mark(&mut r, &mark(MarkType::Logout), c, None).unwrap();
        assert!(apply_mark(&mut r, &mark(MarkType::Logout), c, None).is_err());
    }

    #[test]
    fn request_uses_wire_names() {
        let req: MarkRequest =
            serde_json::from_str(r#"{"type":"lunchOut"}"#).unwrap();
        assert_eq!(req.kind, MarkType::LunchOut);
        assert!(!req.override_leave);

        let req: MarkRequest = serde_json::from_str(
            r#"{"type":"login","override":true,"overrideReason":"urgent"}"#,
        )
        .unwrap();
        assert!(req.override_leave);
        assert_eq!(req.override_reason.as_deref(), Some("urgent"));
    }

    #[test]
    fn clock_offsets_are_respected() {
        // Stored instant differs from the local wall clock; lateness uses local.
        let mut r = skeleton(AttendanceStatus::Absent);
        let shift = shift();
        let c = MarkClock {
            now: Utc.with_ymd_and_hms(2026, 3, 2, 3, 50, 0).unwrap(),
            local: day().and_hms_opt(9, 20, 0).unwrap(),
        };
        apply_mark(&mut r, &mark(MarkType::Login), c, Some(&shift)).unwrap();
        assert_eq!(r.late_minutes, 20);
        assert_eq!(r.login_time, Some(c.now));
    }
}

use crate::api::StatusUpdate;
use crate::api::holiday::HolidayCheck;
use crate::api::profile::ProfileImage;
use crate::auth::handlers::{LoginResponse, MeResponse, TokenPair};
use crate::model::attendance::Attendance;
use crate::model::holiday::{CompanyHoliday, HolidayType};
use crate::model::leave_request::LeaveRequest;
use crate::model::permission::Permission;
use crate::model::role::Role;
use crate::model::shift::Shift;
use crate::model::status::{AttendanceStatus, RequestStatus};
use crate::model::user::UserView;
use crate::models::LoginReqDto;
use crate::rules::mark::{MarkRequest, MarkType};
use crate::rules::summary::MonthlySummary;
use crate::service::attendance::{AttendanceFilter, AttendanceListResponse};
use crate::service::holiday::HolidayPayload;
use crate::service::leave::{CreateLeave, LeaveFilter, LeaveListResponse, LeaveToday};
use crate::service::permission::{CreatePermission, PermissionFilter, PermissionListResponse};
use crate::service::report::{
    DashboardStats, Overview, PendingRequests, RecentActivity, RoleCount, TrendPoint,
};
use crate::service::shift::CreateShift;
use crate::service::user::CreateUser;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance HRM API",
        version = "1.0.0",
        description = r#"
## Attendance & HR Management

Backend for daily attendance tracking with shift-based penalties and the
leave / permission workflows around it.

### Key features
- **Attendance**: login, lunch-out, lunch-in and logout punches; late and
  lunch-overrun minutes; automatic Half-Day past 180 penalty minutes
- **Leave**: apply, approve or reject; Loss-of-Pay days with Monday and
  Saturday counted double
- **Permissions**: short absences of at most 3 hours, folded into the day's totals
- **Shifts, holidays, users and profiles**
- **Live updates**: `GET /api/attendance/stream` (Server-Sent Events)

### Security
Every `/api` route needs a JWT bearer access token. Refresh and logout
take the refresh token in the same header.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::user::list_users,
        crate::api::user::create_user,
        crate::api::user::update_user,

        crate::api::shift::list_shifts,
        crate::api::shift::create_shift,
        crate::api::shift::update_shift,
        crate::api::shift::delete_shift,

        crate::api::attendance::list_attendance,
        crate::api::attendance::today,
        crate::api::attendance::mark,
        crate::api::attendance::summary,
        crate::api::attendance::stream,

        crate::api::leave::create_leave,
        crate::api::leave::leave_list,
        crate::api::leave::check_today,
        crate::api::leave::update_status,

        crate::api::permission::create_permission,
        crate::api::permission::permission_list,
        crate::api::permission::update_status,

        crate::api::holiday::list_holidays,
        crate::api::holiday::month_holidays,
        crate::api::holiday::check_date,
        crate::api::holiday::create_holiday,
        crate::api::holiday::update_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::profile::get_profile,
        crate::api::profile::update_profile,
        crate::api::profile::set_image,
        crate::api::profile::remove_image,

        crate::api::dashboard::stats
    ),
    components(
        schemas(
            LoginReqDto,
            LoginResponse,
            TokenPair,
            MeResponse,
            Role,
            UserView,
            CreateUser,
            Shift,
            CreateShift,
            Attendance,
            AttendanceStatus,
            AttendanceFilter,
            AttendanceListResponse,
            MarkRequest,
            MarkType,
            MonthlySummary,
            RequestStatus,
            StatusUpdate,
            LeaveRequest,
            CreateLeave,
            LeaveFilter,
            LeaveListResponse,
            LeaveToday,
            Permission,
            CreatePermission,
            PermissionFilter,
            PermissionListResponse,
            CompanyHoliday,
            HolidayType,
            HolidayPayload,
            HolidayCheck,
            ProfileImage,
            DashboardStats,
            Overview,
            PendingRequests,
            RecentActivity,
            RoleCount,
            TrendPoint
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token refresh and logout"),
        (name = "User", description = "User management (HR/CEO)"),
        (name = "Shift", description = "Shift policies"),
        (name = "Attendance", description = "Daily attendance and monthly summaries"),
        (name = "Leave", description = "Leave workflow"),
        (name = "Permission", description = "Short-absence workflow"),
        (name = "Holiday", description = "Company holiday calendar"),
        (name = "Profile", description = "Self-service profile"),
        (name = "Dashboard", description = "HR/CEO statistics"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented_with_bearer_scheme() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;
        assert!(paths.contains_key("/api/attendance/mark"));
        assert!(paths.contains_key("/api/leaves/{leave_id}/status"));
        assert!(paths.contains_key("/auth/login"));

        let schemes = &doc.components.unwrap().security_schemes;
        assert!(schemes.contains_key("bearer_auth"));
    }
}

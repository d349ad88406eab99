use crate::api::announcements::CreateAnnouncement;
use crate::api::attendance::AttendanceNote;
use crate::api::leave::{CreateLeave, LeaveAction};
use crate::api::users::{UpdateBalanceReq, UpdateRoleReq};
use crate::model::announcement::AnnouncementResponse;
use crate::model::attendance::AttendanceRow;
use crate::model::leave::LeaveRequestRow;
use crate::model::user::{LeaveBalances, ProfileRow, UserResponse};
use crate::models::{LoginReqDto, RegisterReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRIS API",
        version = "1.0.0",
        description = r#"
## Human Resources Information System

This API powers an HRIS backend for leave management, attendance tracking,
announcements and employee profiles.

### Key Features
- **Leave Management**
  - Apply for leave, approve/reject with balance accounting, calendar and report projections
- **Attendance**
  - Daily check-in/check-out with derived work hours and status
- **User Administration**
  - Role assignment and per-type leave balance management
- **Announcements**
  - Role-targeted broadcasts

### Security
Protected endpoints require **JWT Bearer authentication**. Admin-only and
Manager/Admin gates are enforced per endpoint.

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::users::list_users,
        crate::api::users::update_role,
        crate::api::users::update_balance,

        crate::api::leave::apply,
        crate::api::leave::my_requests,
        crate::api::leave::pending,
        crate::api::leave::approve,
        crate::api::leave::reject,
        crate::api::leave::balance,
        crate::api::leave::calendar,
        crate::api::leave::report,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::my_records,
        crate::api::attendance::report,

        crate::api::announcements::create,
        crate::api::announcements::list,
        crate::api::announcements::delete,

        crate::api::profile::my_profile,
        crate::api::profile::update_my_profile,
        crate::api::profile::user_profile,
    ),
    components(
        schemas(
            RegisterReq,
            LoginReqDto,
            UserResponse,
            LeaveBalances,
            UpdateRoleReq,
            UpdateBalanceReq,
            CreateLeave,
            LeaveAction,
            LeaveRequestRow,
            AttendanceNote,
            AttendanceRow,
            CreateAnnouncement,
            AnnouncementResponse,
            ProfileRow,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token APIs"),
        (name = "Users", description = "User administration APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Attendance", description = "Attendance APIs"),
        (name = "Announcements", description = "Announcement APIs"),
        (name = "Profile", description = "Employee profile APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
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
}

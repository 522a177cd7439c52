use crate::api::{
    attendance::{CorrectAttendance, RecordAttendance},
    dashboard::{AdminDashboard, AttendanceDashboard, EmployeeDashboard, SupervisorDashboard},
    documents::{RegisterDocument, RegisterSalarySlip},
    holiday::CreateHoliday,
    leave_request::{CreateLeave, LeaveDecision, TypeBalance},
    task::{AssignTask, UpdateTask},
    team::{TeamMemberStats, UpdateTeamMember},
    users::{CreateUser, UserListResponse},
};
use crate::leave::balance::BalanceSummary;
use crate::model::{
    attendance::Attendance,
    audit_log::AuditLog,
    document::Document,
    holiday::Holiday,
    leave_request::{LeaveRequest, LeaveStatus, LeaveType},
    role::Role,
    salary_slip::SalarySlip,
    task::{Task, TaskStatus},
    team::Team,
    user::UserView,
};
use crate::models::{LoginReqDto, TokenPair};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Office HRM API",
        version = "1.0.0",
        description = r#"
## Office HR management

Employees, supervisors and admins share one API:

- **Leave**: apply, track balances (casual, sick with carry-forward, earned by
  attendance accrual, maternity) and approve or reject as a supervisor
- **Attendance**: daily check-in/out, supervisor corrections with overtime
- **Team**: direct reports, task assignment and progress
- **Admin**: users, holidays, documents, salary slips and the audit trail

Authenticate with `POST /auth/login` and send the access token as
`Authorization: Bearer <token>`.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,

        crate::api::users::me,
        crate::api::users::list_users,
        crate::api::users::create_user,
        crate::api::users::get_user,
        crate::api::users::update_user,
        crate::api::users::delete_user,

        crate::api::leave_request::apply_leave,
        crate::api::leave_request::my_leaves,
        crate::api::leave_request::leave_balances,
        crate::api::leave_request::leave_balance,
        crate::api::leave_request::team_member_leaves,
        crate::api::leave_request::decide_leave,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::my_attendance,
        crate::api::attendance::team_member_attendance,
        crate::api::attendance::add_team_attendance,
        crate::api::attendance::update_team_attendance,

        crate::api::team::team_list,
        crate::api::team::team_member,
        crate::api::team::update_team_member,

        crate::api::task::assign_task,
        crate::api::task::team_member_tasks,
        crate::api::task::my_tasks,
        crate::api::task::update_task,

        crate::api::documents::my_documents,
        crate::api::documents::get_document,
        crate::api::documents::register_document,
        crate::api::documents::my_salary_slips,
        crate::api::documents::get_salary_slip,
        crate::api::documents::register_salary_slip,

        crate::api::holiday::list_holidays,
        crate::api::holiday::add_holiday,

        crate::api::audit::list_logs,

        crate::api::dashboard::employee_dashboard,
        crate::api::dashboard::supervisor_dashboard,
        crate::api::dashboard::admin_dashboard,
        crate::api::dashboard::attendance_dashboard
    ),
    components(
        schemas(
            LoginReqDto,
            TokenPair,
            Role,
            Team,
            UserView,
            CreateUser,
            UserListResponse,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            CreateLeave,
            LeaveDecision,
            BalanceSummary,
            TypeBalance,
            Attendance,
            RecordAttendance,
            CorrectAttendance,
            TeamMemberStats,
            UpdateTeamMember,
            Task,
            TaskStatus,
            AssignTask,
            UpdateTask,
            Document,
            SalarySlip,
            RegisterDocument,
            RegisterSalarySlip,
            Holiday,
            CreateHoliday,
            AuditLog,
            EmployeeDashboard,
            SupervisorDashboard,
            AdminDashboard,
            AttendanceDashboard
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Auth", description = "Login and token rotation"),
        (name = "Profile", description = "Own profile"),
        (name = "Leave", description = "Leave applications, balances and decisions"),
        (name = "Attendance", description = "Check-in/out and supervisor corrections"),
        (name = "Team", description = "Supervisor view of direct reports"),
        (name = "Task", description = "Task assignment and progress"),
        (name = "Documents", description = "Document and salary slip metadata"),
        (name = "Holiday", description = "Holiday calendar"),
        (name = "Dashboard", description = "Role dashboards"),
        (name = "Admin", description = "User administration and audit trail"),
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by protected paths.
pub struct BearerAuth;

impl Modify for BearerAuth {
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
    fn document_lists_every_route_group() {
        let doc = ApiDoc::openapi();
        for path in [
            "/auth/login",
            "/api/leave",
            "/api/leave/{leave_id}/decision",
            "/api/team/{emp_id}/attendance/{att_id}",
            "/api/admin/users/{user_id}",
            "/api/dashboard/supervisor",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("bearer_auth"));
    }
}

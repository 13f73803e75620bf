use crate::api::interactions::ChatEvent;
use crate::api::leave_request::{LeaveFilter, LeaveListResponse};
use crate::api::user::RegisterUser;
use crate::lifecycle::{BalanceLine, BalanceReport};
use crate::model::leave_request::{
    DayGranularity, LeaveApplication, LeaveRequest, LeaveStatus, LeaveType,
};
use crate::model::user::{LeaveLedger, User};
use crate::policy::PolicyVerdict;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Bot API",
        version = "1.0.0",
        description = r#"
## Leave management bot

Employees apply for leave from chat; every request is checked against the
leave policy before it is stored, and approvers decide pending requests.

### Key Features
- **Policy verification** for sick, burnout, casual, restricted holiday,
  menstrual, maternity, paternity, bereavement, unpaid, internship and
  work-from-home requests
- **Approval flow** with balance updates on approval
- **Balance report** per category
- **Chat events** acknowledged immediately and processed in the background

### Security
All endpoints take a **JWT Bearer** token whose subject is the chat user id.
Only **Approver** or **Admin** roles can list, approve or reject requests.
"#,
    ),
    paths(
        crate::api::leave_request::submit_leave,
        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::api::user::register_user,
        crate::api::user::my_balance,

        crate::api::interactions::handle_event
    ),
    components(
        schemas(
            LeaveApplication,
            LeaveRequest,
            LeaveType,
            LeaveStatus,
            DayGranularity,
            LeaveFilter,
            LeaveListResponse,
            PolicyVerdict,
            RegisterUser,
            User,
            LeaveLedger,
            BalanceLine,
            BalanceReport,
            ChatEvent
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request APIs"),
        (name = "User", description = "Registration and balances"),
        (name = "Events", description = "Chat interaction events"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/leave",
            "/api/leave/{leave_id}",
            "/api/leave/{leave_id}/approve",
            "/api/users",
            "/api/users/me/balance",
            "/api/events",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}

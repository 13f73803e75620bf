//! Chat-style interaction events: slash commands, submitted forms and
//! approve/reject buttons all arrive here.

use crate::api::{AppService, today};
use crate::auth::auth::AuthUser;
use crate::error::ServiceError;
use crate::lifecycle::LeaveService;
use crate::model::leave_request::LeaveApplication;
use crate::notify::Notifier;
use crate::store::LeaveStore;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum_macros::{Display, EnumString};
use tracing::{debug, warn};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ChatAction {
    SubmitLeave,
    ApproveLeave,
    RejectLeave,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[schema(example = json!({
    "action_id": "approve_leave",
    "payload": { "request_id": 1 }
}))]
pub struct ChatEvent {
    #[schema(example = "submit_leave")]
    pub action_id: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: Value,
}

#[derive(Debug, Deserialize)]
struct DecisionPayload {
    request_id: u64,
}

/// Acknowledges immediately; the work runs on a spawned task and its outcome
/// reaches people only as chat messages.
#[utoipa::path(
    post,
    path = "/api/events",
    request_body(content = ChatEvent, content_type = "application/json"),
    responses(
        (status = 202, description = "Event accepted", body = Object, example = json!({
            "message": "Accepted"
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Events"
)]
pub async fn handle_event(
    auth: AuthUser,
    service: web::Data<AppService>,
    event: web::Json<ChatEvent>,
) -> impl Responder {
    let event = event.into_inner();
    let service = service.into_inner();
    debug!(user_id = %auth.user_id, action_id = %event.action_id, "Event received");

    actix_web::rt::spawn(async move {
        dispatch(&service, &auth, event, today()).await;
    });

    HttpResponse::Accepted().json(json!({ "message": "Accepted" }))
}

/// Runs one event to completion. Every failure is reported to the actor.
pub async fn dispatch<S: LeaveStore, N: Notifier>(
    service: &LeaveService<S, N>,
    actor: &AuthUser,
    event: ChatEvent,
    today: NaiveDate,
) {
    let Ok(action) = event.action_id.parse::<ChatAction>() else {
        warn!(user_id = %actor.user_id, action_id = %event.action_id, "Unsupported action");
        let text = format!("Sorry, '{}' is not something I can do.", event.action_id);
        service.tell(&actor.user_id, &text).await;
        return;
    };

    let result = match action {
        ChatAction::SubmitLeave => match serde_json::from_value::<LeaveApplication>(event.payload) {
            // The requester has already been told the verdict.
            Ok(application) => service
                .submit(&actor.user_id, &application, today)
                .await
                .map(|_| ())
                .or_else(|e| match e {
                    ServiceError::Unavailable => Ok(()),
                    other => Err(other),
                }),
            Err(e) => {
                reject_payload(service, actor, action, e).await;
                return;
            }
        },
        ChatAction::ApproveLeave | ChatAction::RejectLeave => {
            let payload = match serde_json::from_value::<DecisionPayload>(event.payload) {
                Ok(payload) => payload,
                Err(e) => {
                    reject_payload(service, actor, action, e).await;
                    return;
                }
            };
            match actor.require_approver() {
                Err(e) => Err(e),
                Ok(()) if action == ChatAction::ApproveLeave => {
                    service.approve(payload.request_id).await.map(|_| ())
                }
                Ok(()) => service.reject(payload.request_id).await.map(|_| ()),
            }
        }
    };

    if let Err(e) = result {
        warn!(user_id = %actor.user_id, %action, error = %e, "Event failed");
        service.tell(&actor.user_id, &e.to_string()).await;
    }
}

async fn reject_payload<S: LeaveStore, N: Notifier>(
    service: &LeaveService<S, N>,
    actor: &AuthUser,
    action: ChatAction,
    error: serde_json::Error,
) {
    warn!(user_id = %actor.user_id, %action, error = %error, "Malformed event payload");
    let text = format!("Could not read the {action} form: {error}");
    service.tell(&actor.user_id, &text).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::holiday::Holidays;
    use crate::model::leave_request::LeaveStatus;
    use crate::model::role::Role;
    use crate::notify::testing::RecordingNotifier;
    use crate::policy::PolicyEngine;
    use crate::policy::calendar::Calendar;
    use crate::store::MemoryStore;
    use crate::utils::UserRegistry;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn service() -> LeaveService<MemoryStore, RecordingNotifier> {
        LeaveService::new(
            MemoryStore::new(),
            RecordingNotifier::default(),
            PolicyEngine::new(Calendar::new(&Holidays::default())),
            "#approvals",
            UserRegistry::empty(),
        )
    }

    fn actor(user_id: &str, role: Role) -> AuthUser {
        AuthUser {
            user_id: user_id.to_string(),
            role,
        }
    }

    fn event(action_id: &str, payload: Value) -> ChatEvent {
        ChatEvent {
            action_id: action_id.to_string(),
            payload,
        }
    }

    fn last_message(svc: &LeaveService<MemoryStore, RecordingNotifier>, channel: &str) -> String {
        svc.notifier().messages_to(channel).pop().unwrap()
    }

    #[test]
    fn action_ids_are_snake_case() {
        assert_eq!("approve_leave".parse::<ChatAction>().unwrap(), ChatAction::ApproveLeave);
        assert_eq!(ChatAction::SubmitLeave.to_string(), "submit_leave");
    }

    #[actix_web::test]
    async fn submit_then_approve_through_events() {
        let svc = service();
        let today = date("2026-01-05");
        svc.register("U1", date("2020-01-01")).await.unwrap();

        let submit = event(
            "submit_leave",
            json!({ "leave_type": "Sick_Leave", "from_date": "2026-01-05", "to_date": "2026-01-06" }),
        );
        dispatch(&svc, &actor("U1", Role::Employee), submit, today).await;
        assert!(last_message(&svc, "#approvals").contains("request #1"));

        let approve = event("approve_leave", json!({ "request_id": 1 }));
        dispatch(&svc, &actor("A1", Role::Approver), approve, today).await;
        assert_eq!(svc.get_leave(1).await.unwrap().status, LeaveStatus::Approved);
        assert!(last_message(&svc, "U1").contains("has been approved"));
    }

    #[actix_web::test]
    async fn employees_cannot_decide_through_events() {
        let svc = service();
        let reject = event("reject_leave", json!({ "request_id": 1 }));
        dispatch(&svc, &actor("U1", Role::Employee), reject, date("2026-01-05")).await;
        assert_eq!(last_message(&svc, "U1"), "Approver/Admin only");
    }

    #[actix_web::test]
    async fn decision_on_unknown_request_is_reported() {
        let svc = service();
        let approve = event("approve_leave", json!({ "request_id": 9 }));
        dispatch(&svc, &actor("A1", Role::Admin), approve, date("2026-01-05")).await;
        assert_eq!(last_message(&svc, "A1"), "Leave request 9 not found");
    }

    #[actix_web::test]
    async fn unknown_actions_and_bad_payloads_are_reported() {
        let svc = service();
        let today = date("2026-01-05");
        dispatch(&svc, &actor("U1", Role::Employee), event("dance", Value::Null), today).await;
        assert!(last_message(&svc, "U1").contains("'dance'"));

        let bad = event("approve_leave", json!({ "id": "x" }));
        dispatch(&svc, &actor("A1", Role::Approver), bad, today).await;
        assert!(last_message(&svc, "A1").starts_with("Could not read the approve_leave form"));
    }
}

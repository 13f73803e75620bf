use crate::api::{AppService, today};
use crate::auth::auth::AuthUser;
use crate::model::leave_request::{LeaveApplication, LeaveRequest, LeaveStatus};
use crate::store::LeaveQuery;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

#[derive(Serialize, ToSchema)]
#[schema(example = json!({
    "data": [
        {
            "id": 1,
            "user_id": "U024BE7LH",
            "leave_type": "Sick_Leave",
            "from_date": "2026-01-05",
            "to_date": "2026-01-07",
            "reason": "Fever",
            "status": "Pending",
            "granularity": "Full",
            "created_at": "2026-01-01T00:00:00Z"
        }
    ],
    "page": 1,
    "per_page": 10,
    "total": 1
}))]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u32,
    #[schema(example = 10)]
    pub per_page: u32,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = "U024BE7LH")]
    /// Filter by chat user id
    pub user_id: Option<String>,
    #[schema(example = "Pending")]
    /// Filter by leave status
    pub status: Option<String>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 10)]
    /// Pagination per page number
    pub per_page: Option<u64>,
}

/* =========================
Submit leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = LeaveApplication,
        description = "Leave request form",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request admitted and pending approval",
         body = Object,
         example = json!({
            "message": "Your sick leave request has been sent for approval. Get well soon! Requested: 3 working day(s).",
            "status": "Pending",
            "id": 1
         })
        ),
        (status = 400, description = "Request denied by the leave policy", body = Object, example = json!({
            "message": "Casual leave must be applied for at least 2 weeks in advance."
        })),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Leave service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    service: web::Data<AppService>,
    payload: web::Json<LeaveApplication>,
) -> actix_web::Result<impl Responder> {
    let outcome = service.submit(&auth.user_id, &payload, today()).await?;

    match outcome.request {
        Some(request) => Ok(HttpResponse::Ok().json(json!({
            "message": outcome.verdict.message,
            "status": request.status,
            "id": request.id
        }))),
        None => Ok(HttpResponse::BadRequest().json(json!({
            "message": outcome.verdict.message
        }))),
    }
}

/* =========================
Approve leave (Approver/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved and balance updated", body = LeaveRequest),
        (status = 404, description = "Leave request or its owner not found", body = Object, example = json!({
            "message": "Leave request 7 not found"
        })),
        (status = 409, description = "Leave request already decided", body = Object, example = json!({
            "message": "Leave request 7 is already Approved"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    service: web::Data<AppService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;
    let leave = service.approve(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Reject leave (Approver/Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected", body = LeaveRequest),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already decided"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    service: web::Data<AppService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;
    let leave = service.reject(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request 7 not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    service: web::Data<AppService>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;
    let leave = service.get_leave(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(leave))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 400, description = "Unknown status filter or page out of range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    service: web::Data<AppService>,
    query: web::Query<LeaveFilter>,
) -> actix_web::Result<impl Responder> {
    auth.require_approver()?;

    let per_page = query.per_page.unwrap_or(10).clamp(1, 100);
    let page = query.page.unwrap_or(1).max(1);
    let Ok(page_no) = u32::try_from(page) else {
        return Ok(HttpResponse::BadRequest().json(json!({
            "message": format!("Invalid page. Allowed: 1 to {}", u32::MAX)
        })));
    };
    // page < 2^32 and per_page <= 100, so this stays well inside u64
    let offset = (page - 1) * per_page;

    let status = match query.status.as_deref() {
        Some(raw) => match raw.parse::<LeaveStatus>() {
            Ok(status) => Some(status),
            Err(_) => {
                return Ok(HttpResponse::BadRequest().json(json!({
                    "message": "Invalid status. Allowed: Pending, Approved, Rejected"
                })));
            }
        },
        None => None,
    };

    let filter = LeaveQuery {
        user_id: query.user_id.clone(),
        status,
        limit: per_page,
        offset,
    };
    let (leaves, total) = service.list_leaves(&filter).await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page: page_no,
        per_page: per_page as u32,
        total,
    }))
}

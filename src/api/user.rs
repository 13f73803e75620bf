use crate::api::{AppService, today};
use crate::auth::auth::AuthUser;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema, Default)]
pub struct RegisterUser {
    /// Defaults to today
    #[schema(example = "2024-01-01", format = "date", value_type = Option<String>)]
    #[serde(default)]
    pub joined_on: Option<NaiveDate>,
}

/// Registers the caller with an empty leave ledger.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body(content = RegisterUser, content_type = "application/json"),
    responses(
        (status = 201, description = "User registered", body = crate::model::user::User),
        (status = 409, description = "Already registered", body = Object, example = json!({
            "message": "User U024BE7LH is already registered"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 503, description = "Leave service temporarily unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn register_user(
    auth: AuthUser,
    service: web::Data<AppService>,
    payload: web::Json<RegisterUser>,
) -> actix_web::Result<impl Responder> {
    let joined_on = payload.joined_on.unwrap_or_else(today);
    let user = service.register(&auth.user_id, joined_on).await?;
    Ok(HttpResponse::Created().json(user))
}

#[utoipa::path(
    get,
    path = "/api/users/me/balance",
    responses(
        (status = 200, description = "Consumed and remaining leave per category", body = crate::lifecycle::BalanceReport),
        (status = 404, description = "Caller is not registered"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "User"
)]
pub async fn my_balance(
    auth: AuthUser,
    service: web::Data<AppService>,
) -> actix_web::Result<impl Responder> {
    let report = service.balance(&auth.user_id, today()).await?;
    Ok(HttpResponse::Ok().json(report))
}

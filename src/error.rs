use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

use crate::model::leave_request::LeaveStatus;

pub const RETRY_LATER: &str = "The leave service is temporarily unavailable. Please try again later.";

/// Data-store failure. Callers log it and report a retry-later message.
#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "in-memory store lock poisoned")]
    Poisoned,
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::Database(e) => Some(e),
            StoreError::Poisoned => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        Self::Database(value)
    }
}

/// Outcome of a lifecycle step that did not complete.
#[derive(Debug, Display)]
pub enum ServiceError {
    #[display(fmt = "Leave request {} not found", _0)]
    NotFound(u64),
    #[display(fmt = "User {} not found", _0)]
    UserNotFound(String),
    #[display(fmt = "Leave request {} is already {}", id, status)]
    AlreadyDecided { id: u64, status: LeaveStatus },
    #[display(fmt = "User {} is already registered", _0)]
    AlreadyRegistered(String),
    #[display(fmt = "{}", _0)]
    Forbidden(&'static str),
    #[display(fmt = "{}", RETRY_LATER)]
    Unavailable,
}

impl std::error::Error for ServiceError {}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        tracing::error!(error = %value, "Store operation failed");
        Self::Unavailable
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) | ServiceError::UserNotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::AlreadyDecided { .. } | ServiceError::AlreadyRegistered(_) => {
                StatusCode::CONFLICT
            }
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "message": self.to_string()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_outcomes_to_http_statuses() {
        assert_eq!(ServiceError::NotFound(7).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::AlreadyDecided {
                id: 7,
                status: LeaveStatus::Approved
            }
            .status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::Unavailable.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn store_failures_surface_as_retry_later() {
        let err: ServiceError = StoreError::Poisoned.into();
        assert_eq!(err.to_string(), RETRY_LATER);
    }

    #[test]
    fn decided_message_names_the_status() {
        let err = ServiceError::AlreadyDecided {
            id: 3,
            status: LeaveStatus::Rejected,
        };
        assert_eq!(err.to_string(), "Leave request 3 is already Rejected");
    }
}

//! Leave-policy verification.
//!
//! A submission goes through three phases:
//! 1. [`PolicyEngine::precheck`] parses the leave type and dates and applies
//!    the start-date rule, with no I/O.
//! 2. [`PolicyEngine::gather`] reads the user record and whatever history the
//!    category needs.
//! 3. [`rules::evaluate`] counts working days, checks the quota and the
//!    category's structural constraints.

pub mod calendar;
pub mod rules;
pub mod table;
pub mod working_days;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::error::{RETRY_LATER, StoreError};
use crate::model::leave_request::{LeaveApplication, LeaveDraft, LeaveType};
use crate::store::LeaveStore;
use calendar::Calendar;
use rules::PolicyInputs;
use table::{CategoryPolicy, policy_for};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerdictKind {
    Admitted,
    InputError,
    PolicyViolation,
    Unregistered,
    Unavailable,
}

/// Admit/deny answer with the message shown to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyVerdict {
    pub is_valid: bool,
    pub message: String,
    #[serde(skip)]
    pub kind: VerdictKind,
}

impl PolicyVerdict {
    fn new(kind: VerdictKind, message: impl Into<String>) -> Self {
        Self {
            is_valid: kind == VerdictKind::Admitted,
            message: message.into(),
            kind,
        }
    }

    pub fn admit(message: impl Into<String>) -> Self {
        Self::new(VerdictKind::Admitted, message)
    }

    pub fn input_error(message: impl Into<String>) -> Self {
        Self::new(VerdictKind::InputError, message)
    }

    pub fn violation(message: impl Into<String>) -> Self {
        Self::new(VerdictKind::PolicyViolation, message)
    }

    pub fn unregistered() -> Self {
        Self::new(
            VerdictKind::Unregistered,
            "You are not registered. Please register before applying for leave.",
        )
    }

    pub fn unavailable() -> Self {
        Self::new(VerdictKind::Unavailable, RETRY_LATER)
    }

    pub fn invalid_leave_type() -> Self {
        Self::input_error("Invalid leave type.")
    }
}

/// Verdict plus, when admitted, the parsed request ready to persist.
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub verdict: PolicyVerdict,
    pub draft: Option<LeaveDraft>,
}

impl PolicyDecision {
    fn denied(verdict: PolicyVerdict) -> Self {
        Self {
            verdict,
            draft: None,
        }
    }
}

fn parse_date(value: Option<&str>) -> Result<NaiveDate, PolicyVerdict> {
    let value = value.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
        PolicyVerdict::input_error("Please provide both a start date and an end date.")
    })?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        PolicyVerdict::input_error(format!("Invalid date '{value}'. Use the YYYY-MM-DD format."))
    })
}

#[derive(Clone)]
pub struct PolicyEngine {
    calendar: Arc<Calendar>,
}

impl PolicyEngine {
    pub fn new(calendar: Calendar) -> Self {
        Self {
            calendar: Arc::new(calendar),
        }
    }


    /// Parsing, ordering, half-day shape and the start-date rule.
    pub fn precheck(
        &self,
        user_id: &str,
        application: &LeaveApplication,
        today: NaiveDate,
    ) -> Result<(LeaveDraft, &'static CategoryPolicy), PolicyVerdict> {
        let policy = LeaveType::from_str(application.leave_type.trim())
            .ok()
            .and_then(policy_for)
            .ok_or_else(PolicyVerdict::invalid_leave_type)?;

        let from_date = parse_date(application.from_date.as_deref())?;
        let to_date = parse_date(application.to_date.as_deref())?;
        if from_date > to_date {
            return Err(PolicyVerdict::input_error(
                "The start date cannot be after the end date.",
            ));
        }

        let granularity = application.granularity.unwrap_or_default();
        if granularity.is_half() {
            if !policy.half_day {
                return Err(PolicyVerdict::input_error(
                    "Half-day requests are only available for sick and casual leave.",
                ));
            }
            if from_date != to_date {
                return Err(PolicyVerdict::input_error(
                    "A half-day request must start and end on the same day.",
                ));
            }
        }

        let draft = LeaveDraft {
            user_id: user_id.to_string(),
            leave_type: policy.leave_type,
            from_date,
            to_date,
            reason: application.reason.clone().unwrap_or_default().trim().to_string(),
            granularity,
        };
        rules::check_timing(policy, &draft, today)?;
        Ok((draft, policy))
    }

    /// Read-only lookups the category's rule depends on.
    pub async fn gather<S: LeaveStore>(
        &self,
        store: &S,
        draft: &LeaveDraft,
        policy: &CategoryPolicy,
    ) -> Result<PolicyInputs, StoreError> {
        let user = store.get_user(&draft.user_id).await?;
        let history_count = if policy.needs_history_count() {
            store
                .count_requests_in_year(&draft.user_id, draft.leave_type, draft.from_date.year())
                .await?
        } else {
            0
        };
        let overlaps_approved = if policy.needs_overlap_check() {
            store
                .has_approved_overlap(&draft.user_id, draft.from_date, draft.to_date)
                .await?
        } else {
            false
        };
        Ok(PolicyInputs {
            user,
            history_count,
            overlaps_approved,
        })
    }

    pub fn evaluate(
        &self,
        draft: &LeaveDraft,
        policy: &CategoryPolicy,
        inputs: &PolicyInputs,
        today: NaiveDate,
    ) -> PolicyVerdict {
        rules::evaluate(&self.calendar, policy, draft, inputs, today)
    }

    /// Runs all three phases. Never writes to the store.
    pub async fn verify<S: LeaveStore>(
        &self,
        store: &S,
        user_id: &str,
        application: &LeaveApplication,
        today: NaiveDate,
    ) -> PolicyDecision {
        self.verify_with(store, user_id, application, today, false)
            .await
    }

    /// Like [`verify`](Self::verify), but when `known_absent` is set the
    /// store is skipped and the user is treated as unregistered. The
    /// precheck still runs first, so the verdict is the same either way.
    pub async fn verify_with<S: LeaveStore>(
        &self,
        store: &S,
        user_id: &str,
        application: &LeaveApplication,
        today: NaiveDate,
        known_absent: bool,
    ) -> PolicyDecision {
        let (draft, policy) = match self.precheck(user_id, application, today) {
            Ok(checked) => checked,
            Err(verdict) => return PolicyDecision::denied(verdict),
        };

        let inputs = if known_absent {
            PolicyInputs::default()
        } else {
            match self.gather(store, &draft, policy).await {
                Ok(inputs) => inputs,
                Err(e) => {
                    tracing::error!(error = %e, user_id, leave_type = %draft.leave_type, "Policy lookup failed");
                    return PolicyDecision::denied(PolicyVerdict::unavailable());
                }
            }
        };

        let verdict = self.evaluate(&draft, policy, &inputs, today);
        let draft = verdict.is_valid.then_some(draft);
        PolicyDecision { verdict, draft }
    }
}

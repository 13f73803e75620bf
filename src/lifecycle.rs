//! Request lifecycle: submit, decide, register and report balances.
//!
//! Every path that reaches a person ends in a notification; store failures
//! become [`ServiceError::Unavailable`] after the requester is told to retry.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::ServiceError;
use crate::model::leave_request::{
    DayGranularity, LeaveApplication, LeaveRequest, LeaveStatus, LeaveType,
};
use crate::model::user::User;
use crate::notify::{Notifier, deliver};
use crate::policy::table::{Quota, policy_for};
use crate::policy::{PolicyDecision, PolicyEngine, PolicyVerdict, VerdictKind};
use crate::store::{LeaveQuery, LeaveStore, Transition};
use crate::utils::UserRegistry;

/// What the requester sees after a submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub verdict: PolicyVerdict,
    pub request: Option<LeaveRequest>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceLine {
    pub leave_type: LeaveType,
    #[schema(example = "day(s)", value_type = String)]
    pub unit: &'static str,
    #[schema(example = 2.5)]
    pub consumed: f64,
    /// Absent for categories without a quota.
    pub limit: Option<u32>,
    pub remaining: Option<f64>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BalanceReport {
    pub user_id: String,
    pub lines: Vec<BalanceLine>,
}

pub struct LeaveService<S, N> {
    store: S,
    notifier: N,
    engine: PolicyEngine,
    approver_channel: String,
    registry: UserRegistry,
}

impl<S: LeaveStore, N: Notifier> LeaveService<S, N> {
    pub fn new(
        store: S,
        notifier: N,
        engine: PolicyEngine,
        approver_channel: impl Into<String>,
        registry: UserRegistry,
    ) -> Self {
        Self {
            store,
            notifier,
            engine,
            approver_channel: approver_channel.into(),
            registry,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn registry(&self) -> &UserRegistry {
        &self.registry
    }

    /// Sends a message that is not tied to a lifecycle step.
    pub async fn tell(&self, channel: &str, text: &str) {
        deliver(&self.notifier, channel, text).await;
    }

    pub async fn register(&self, user_id: &str, joined_on: NaiveDate) -> Result<User, ServiceError> {
        if self.registry.lookup(user_id).await == Some(true) {
            return Err(ServiceError::AlreadyRegistered(user_id.to_string()));
        }

        let user = User::new(user_id, joined_on);
        let inserted = self.store.insert_user(&user).await?;
        self.registry.remember(user_id).await;
        if !inserted {
            return Err(ServiceError::AlreadyRegistered(user_id.to_string()));
        }

        info!(user_id, %joined_on, "User registered");
        deliver(
            &self.notifier,
            user_id,
            "You are registered. You can now apply for leave.",
        )
        .await;
        Ok(user)
    }

    pub async fn submit(
        &self,
        user_id: &str,
        application: &LeaveApplication,
        today: NaiveDate,
    ) -> Result<SubmitOutcome, ServiceError> {
        let known_absent = self.registry.lookup(user_id).await == Some(false);
        let decision = self
            .engine
            .verify_with(&self.store, user_id, application, today, known_absent)
            .await;

        let PolicyDecision { verdict, draft } = decision;
        let Some(draft) = draft else {
            info!(user_id, leave_type = %application.leave_type, message = %verdict.message, "Leave request denied");
            deliver(&self.notifier, user_id, &verdict.message).await;
            if verdict.kind == VerdictKind::Unavailable {
                return Err(ServiceError::Unavailable);
            }
            return Ok(SubmitOutcome {
                verdict,
                request: None,
            });
        };

        let request = match self.store.insert_leave(&draft).await {
            Ok(request) => request,
            Err(e) => {
                let err = ServiceError::from(e);
                deliver(&self.notifier, user_id, &err.to_string()).await;
                return Err(err);
            }
        };
        self.registry.remember(user_id).await;

        info!(
            leave_id = request.id,
            user_id,
            leave_type = %request.leave_type,
            from = %request.from_date,
            to = %request.to_date,
            "Leave request submitted"
        );
        deliver(&self.notifier, user_id, &verdict.message).await;
        deliver(&self.notifier, &self.approver_channel, &approval_summary(&request)).await;

        Ok(SubmitOutcome {
            verdict,
            request: Some(request),
        })
    }

    /// Approves a pending request and charges its calendar span to the
    /// owner's ledger. The status change stays if the owner is missing.
    pub async fn approve(&self, id: u64) -> Result<LeaveRequest, ServiceError> {
        let request = self.decide(id, LeaveStatus::Approved).await?;

        let owner_known = match request.leave_type.ledger_field(request.granularity) {
            Some(field) => {
                self.store
                    .credit_ledger(&request.user_id, field, request.ledger_amount())
                    .await?
            }
            None => self.store.get_user(&request.user_id).await?.is_some(),
        };

        if !owner_known {
            warn!(leave_id = id, user_id = %request.user_id, "Approved request has no registered owner");
            let text = format!(
                "Request #{} was approved, but user {} is not registered. No balance was updated.",
                id, request.user_id
            );
            deliver(&self.notifier, &self.approver_channel, &text).await;
            return Err(ServiceError::UserNotFound(request.user_id));
        }

        info!(
            leave_id = id,
            user_id = %request.user_id,
            charged = request.ledger_amount(),
            "Leave request approved"
        );
        self.announce_decision(&request).await;
        Ok(request)
    }

    pub async fn reject(&self, id: u64) -> Result<LeaveRequest, ServiceError> {
        let request = self.decide(id, LeaveStatus::Rejected).await?;
        info!(leave_id = id, user_id = %request.user_id, "Leave request rejected");
        self.announce_decision(&request).await;
        Ok(request)
    }

    pub async fn get_leave(&self, id: u64) -> Result<LeaveRequest, ServiceError> {
        self.store
            .get_leave(id)
            .await?
            .ok_or(ServiceError::NotFound(id))
    }

    pub async fn list_leaves(
        &self,
        query: &LeaveQuery,
    ) -> Result<(Vec<LeaveRequest>, i64), ServiceError> {
        Ok(self.store.list_leaves(query).await?)
    }

    /// Consumed and remaining amounts per category, derived at read time.
    pub async fn balance(&self, user_id: &str, today: NaiveDate) -> Result<BalanceReport, ServiceError> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| ServiceError::UserNotFound(user_id.to_string()))?;
        let ledger = &user.ledger;

        let mut lines = Vec::new();
        for leave_type in LeaveType::iter() {
            let Some(policy) = policy_for(leave_type) else {
                continue;
            };
            let consumed = match policy.quota {
                Quota::Counter(field) | Quota::CappedCounter(field) => f64::from(ledger.get(field)),
                Quota::HalfDayCounter { full, half } => {
                    f64::from(ledger.get(full)) + f64::from(ledger.get(half)) / 2.0
                }
                Quota::WeeklyCounter(field) => f64::from(ledger.get(field).div_ceil(7)),
                Quota::YearlyRequestCount => f64::from(
                    self.store
                        .count_requests_in_year(user_id, leave_type, today.year())
                        .await?,
                ),
                Quota::Unlimited => leave_type
                    .ledger_field(DayGranularity::Full)
                    .map(|field| f64::from(ledger.get(field)))
                    .unwrap_or_default(),
            };
            lines.push(BalanceLine {
                leave_type,
                unit: policy.unit.noun(),
                consumed,
                limit: policy.annual_limit,
                remaining: policy
                    .annual_limit
                    .map(|limit| (f64::from(limit) - consumed).max(0.0)),
            });
        }

        Ok(BalanceReport {
            user_id: user.user_id,
            lines,
        })
    }

    async fn decide(&self, id: u64, to: LeaveStatus) -> Result<LeaveRequest, ServiceError> {
        match self.store.transition(id, to).await? {
            Transition::Applied(request) => Ok(request),
            Transition::NotFound => Err(ServiceError::NotFound(id)),
            Transition::AlreadyDecided(status) => Err(ServiceError::AlreadyDecided { id, status }),
        }
    }

    async fn announce_decision(&self, request: &LeaveRequest) {
        let status = request.status.as_ref().to_lowercase();
        let to_requester = format!(
            "Your {} request from {} to {} has been {}.",
            request.leave_type.label(),
            request.from_date,
            request.to_date,
            status
        );
        let to_approver = format!(
            "Request #{} from <@{}> was {}.",
            request.id, request.user_id, status
        );
        deliver(&self.notifier, &request.user_id, &to_requester).await;
        deliver(&self.notifier, &self.approver_channel, &to_approver).await;
    }
}

fn approval_summary(request: &LeaveRequest) -> String {
    let half = match request.granularity {
        DayGranularity::Full => "",
        DayGranularity::FirstHalf => " (first half)",
        DayGranularity::SecondHalf => " (second half)",
    };
    let reason = if request.reason.is_empty() {
        "none given"
    } else {
        request.reason.as_str()
    };
    format!(
        "<@{}> requested {} from {} to {}{}. Reason: {}. Approve or reject request #{}.",
        request.user_id,
        request.leave_type.label(),
        request.from_date,
        request.to_date,
        half,
        reason,
        request.id
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::holiday::Holidays;
    use crate::model::leave_request::LeaveDraft;
    use crate::model::user::LedgerField;
    use crate::notify::testing::RecordingNotifier;
    use crate::policy::calendar::Calendar;
    use crate::store::MemoryStore;

    const APPROVERS: &str = "#leave-approvals";

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    // Monday
    fn today() -> NaiveDate {
        date("2026-01-05")
    }

    fn service_with(notifier: RecordingNotifier) -> LeaveService<MemoryStore, RecordingNotifier> {
        LeaveService::new(
            MemoryStore::new(),
            notifier,
            PolicyEngine::new(Calendar::new(&Holidays::default())),
            APPROVERS,
            UserRegistry::empty(),
        )
    }

    fn service() -> LeaveService<MemoryStore, RecordingNotifier> {
        service_with(RecordingNotifier::default())
    }

    fn application(leave_type: &str, from: &str, to: &str) -> LeaveApplication {
        LeaveApplication {
            leave_type: leave_type.to_string(),
            from_date: Some(from.to_string()),
            to_date: Some(to.to_string()),
            reason: Some("flu".to_string()),
            granularity: None,
        }
    }

    async fn registered(svc: &LeaveService<MemoryStore, RecordingNotifier>, user_id: &str) {
        svc.register(user_id, date("2020-01-01")).await.unwrap();
    }

    async fn submitted(
        svc: &LeaveService<MemoryStore, RecordingNotifier>,
        app: &LeaveApplication,
    ) -> LeaveRequest {
        let outcome = svc.submit("U1", app, today()).await.unwrap();
        assert!(outcome.verdict.is_valid, "{}", outcome.verdict.message);
        outcome.request.unwrap()
    }

    async fn ledger_of(svc: &LeaveService<MemoryStore, RecordingNotifier>, field: LedgerField) -> u32 {
        svc.store()
            .get_user("U1")
            .await
            .unwrap()
            .unwrap()
            .ledger
            .get(field)
    }

    #[actix_web::test]
    async fn unregistered_verdict_ignores_registry_warmth() {
        let warm = service();
        let cold = LeaveService::new(
            MemoryStore::new(),
            RecordingNotifier::default(),
            PolicyEngine::new(Calendar::new(&Holidays::default())),
            APPROVERS,
            UserRegistry::cold(),
        );
        assert_eq!(warm.registry().lookup("U9").await, Some(false));
        assert_eq!(cold.registry().lookup("U9").await, None);

        for app in [
            application("Vacation", "2026-01-05", "2026-01-06"),
            application("Sick_Leave", "2026-01-07", "2026-01-05"),
            application("Sick_Leave", "2026-01-05", "2026-01-06"),
        ] {
            let from_warm = warm.submit("U9", &app, today()).await.unwrap();
            let from_cold = cold.submit("U9", &app, today()).await.unwrap();
            assert_eq!(from_warm.verdict, from_cold.verdict);
            assert!(from_warm.request.is_none());
        }

        let invalid = warm
            .submit("U9", &application("Vacation", "2026-01-05", "2026-01-06"), today())
            .await
            .unwrap();
        assert_eq!(invalid.verdict.message, "Invalid leave type.");
        let unregistered = cold
            .submit("U9", &application("Sick_Leave", "2026-01-05", "2026-01-06"), today())
            .await
            .unwrap();
        assert_eq!(unregistered.verdict.kind, VerdictKind::Unregistered);
    }

    #[actix_web::test]
    async fn admitted_request_is_pending_and_both_sides_are_told() {
        let svc = service();
        registered(&svc, "U1").await;
        let request = submitted(&svc, &application("Sick_Leave", "2026-01-05", "2026-01-07")).await;

        assert_eq!(request.status, LeaveStatus::Pending);
        assert_eq!(request.reason, "flu");
        let to_requester = svc.notifier.messages_to("U1");
        assert!(to_requester.last().unwrap().contains("Requested: 3 working day(s)."));
        let to_approvers = svc.notifier.messages_to(APPROVERS);
        assert_eq!(to_approvers.len(), 1);
        assert!(to_approvers[0].contains("request #1"));
        assert!(to_approvers[0].contains("sick leave"));
    }

    #[actix_web::test]
    async fn denied_request_is_not_persisted_and_only_the_requester_hears() {
        let svc = service();
        registered(&svc, "U1").await;
        let outcome = svc
            .submit("U1", &application("Casual_Leave", "2026-01-10", "2026-01-12"), today())
            .await
            .unwrap();

        assert!(!outcome.verdict.is_valid);
        assert!(outcome.request.is_none());
        assert!(svc.notifier.messages_to(APPROVERS).is_empty());
        assert_eq!(
            svc.notifier.messages_to("U1").last().unwrap(),
            &outcome.verdict.message
        );
        let (leaves, total) = svc.list_leaves(&LeaveQuery { limit: 10, ..LeaveQuery::default() }).await.unwrap();
        assert!(leaves.is_empty());
        assert_eq!(total, 0);
    }

    #[actix_web::test]
    async fn unknown_user_is_told_to_register() {
        let svc = service();
        let outcome = svc
            .submit("U9", &application("Sick_Leave", "2026-01-05", "2026-01-05"), today())
            .await
            .unwrap();
        assert_eq!(outcome.verdict.kind, VerdictKind::Unregistered);
        assert!(svc.notifier.messages_to("U9")[0].contains("not registered"));
    }

    #[actix_web::test]
    async fn approving_charges_the_span_and_notifies_both_sides() {
        let svc = service();
        registered(&svc, "U1").await;
        let request = submitted(&svc, &application("Sick_Leave", "2026-01-05", "2026-01-07")).await;

        let approved = svc.approve(request.id).await.unwrap();
        assert_eq!(approved.status, LeaveStatus::Approved);
        assert_eq!(svc.get_leave(request.id).await.unwrap().status, LeaveStatus::Approved);
        assert_eq!(ledger_of(&svc, LedgerField::Sick).await, 3);
        assert!(svc.notifier.messages_to("U1").last().unwrap().contains("has been approved"));
        assert!(svc.notifier.messages_to(APPROVERS).last().unwrap().contains("was approved"));
    }

    #[actix_web::test]
    async fn second_approval_is_refused_and_credits_nothing() {
        let svc = service();
        registered(&svc, "U1").await;
        let request = submitted(&svc, &application("Sick_Leave", "2026-01-05", "2026-01-07")).await;

        svc.approve(request.id).await.unwrap();
        let again = svc.approve(request.id).await;
        assert!(matches!(
            again,
            Err(ServiceError::AlreadyDecided { status: LeaveStatus::Approved, .. })
        ));
        assert_eq!(ledger_of(&svc, LedgerField::Sick).await, 3);
    }

    #[actix_web::test]
    async fn rejecting_leaves_the_ledger_alone() {
        let svc = service();
        registered(&svc, "U1").await;
        let request = submitted(&svc, &application("Sick_Leave", "2026-01-05", "2026-01-07")).await;

        let rejected = svc.reject(request.id).await.unwrap();
        assert_eq!(rejected.status, LeaveStatus::Rejected);
        let user = svc.store().get_user("U1").await.unwrap().unwrap();
        assert_eq!(user.ledger, Default::default());
        assert!(svc.notifier.messages_to("U1").last().unwrap().contains("has been rejected"));
        assert!(matches!(svc.approve(request.id).await, Err(ServiceError::AlreadyDecided { .. })));
    }

    #[actix_web::test]
    async fn approval_charges_calendar_days_not_working_days() {
        let svc = service();
        registered(&svc, "U1").await;
        // Friday to Monday: two working days, four calendar days.
        let request = submitted(&svc, &application("Casual_Leave", "2026-01-23", "2026-01-26")).await;

        svc.approve(request.id).await.unwrap();
        assert_eq!(ledger_of(&svc, LedgerField::Casual).await, 4);
    }

    #[actix_web::test]
    async fn half_day_approval_credits_the_half_day_counter() {
        let svc = service();
        registered(&svc, "U1").await;
        let mut app = application("Sick_Leave", "2026-01-06", "2026-01-06");
        app.granularity = Some(DayGranularity::FirstHalf);
        let request = submitted(&svc, &app).await;
        assert!(svc.notifier.messages_to(APPROVERS)[0].contains("(first half)"));

        svc.approve(request.id).await.unwrap();
        assert_eq!(ledger_of(&svc, LedgerField::SickHalfDay).await, 1);
        assert_eq!(ledger_of(&svc, LedgerField::Sick).await, 0);

        let report = svc.balance("U1", today()).await.unwrap();
        let sick = report
            .lines
            .iter()
            .find(|l| l.leave_type == LeaveType::Sick)
            .unwrap();
        assert_eq!(sick.consumed, 0.5);
        assert_eq!(sick.remaining, Some(11.5));
    }

    #[actix_web::test]
    async fn unknown_ids_are_not_found() {
        let svc = service();
        assert!(matches!(svc.approve(42).await, Err(ServiceError::NotFound(42))));
        assert!(matches!(svc.reject(42).await, Err(ServiceError::NotFound(42))));
        assert!(matches!(svc.get_leave(42).await, Err(ServiceError::NotFound(42))));
    }

    #[actix_web::test]
    async fn approval_for_a_missing_owner_keeps_the_new_status() {
        let svc = service();
        let orphan = svc
            .store()
            .insert_leave(&LeaveDraft {
                user_id: "U404".to_string(),
                leave_type: LeaveType::Burnout,
                from_date: date("2026-01-05"),
                to_date: date("2026-01-05"),
                reason: String::new(),
                granularity: DayGranularity::Full,
            })
            .await
            .unwrap();

        let result = svc.approve(orphan.id).await;
        assert!(matches!(result, Err(ServiceError::UserNotFound(ref u)) if u == "U404"));
        assert_eq!(svc.get_leave(orphan.id).await.unwrap().status, LeaveStatus::Approved);
        assert!(svc.notifier.messages_to(APPROVERS)[0].contains("not registered"));
    }

    #[actix_web::test]
    async fn registering_twice_is_a_conflict() {
        let svc = service();
        registered(&svc, "U1").await;
        let again = svc.register("U1", today()).await;
        assert!(matches!(again, Err(ServiceError::AlreadyRegistered(_))));
    }

    #[actix_web::test]
    async fn balance_reports_every_category() {
        let svc = service();
        registered(&svc, "U1").await;
        let request = submitted(&svc, &application("Menstrual_Leave", "2026-01-06", "2026-01-06")).await;
        svc.approve(request.id).await.unwrap();

        let report = svc.balance("U1", today()).await.unwrap();
        assert_eq!(report.lines.len(), LeaveType::iter().count());
        let menstrual = report
            .lines
            .iter()
            .find(|l| l.leave_type == LeaveType::Menstrual)
            .unwrap();
        assert_eq!(menstrual.consumed, 1.0);
        assert_eq!(menstrual.remaining, Some(17.0));
        let internship = report
            .lines
            .iter()
            .find(|l| l.leave_type == LeaveType::Internship)
            .unwrap();
        assert_eq!(internship.limit, None);
        assert_eq!(internship.remaining, None);
    }

    #[actix_web::test]
    async fn balance_of_unknown_user_is_not_found() {
        let svc = service();
        assert!(matches!(
            svc.balance("U9", today()).await,
            Err(ServiceError::UserNotFound(_))
        ));
    }

    #[actix_web::test]
    async fn notifier_outage_does_not_undo_a_decision() {
        let svc = service_with(RecordingNotifier {
            fail: true,
            ..RecordingNotifier::default()
        });
        registered(&svc, "U1").await;
        let request = submitted(&svc, &application("Sick_Leave", "2026-01-05", "2026-01-05")).await;
        svc.approve(request.id).await.unwrap();
        assert_eq!(ledger_of(&svc, LedgerField::Sick).await, 1);
    }
}

use chrono::{Datelike, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::{LeaveQuery, LeaveStore, Transition};
use crate::error::StoreError;
use crate::model::leave_request::{LeaveDraft, LeaveRequest, LeaveStatus, LeaveType};
use crate::model::user::{LedgerField, User};

#[derive(Default)]
struct Tables {
    users: HashMap<String, User>,
    leaves: Vec<LeaveRequest>,
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl LeaveStore for MemoryStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(user_id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        if tables.users.contains_key(&user.user_id) {
            return Ok(false);
        }
        let mut user = user.clone();
        user.created_at = Some(Utc::now());
        tables.users.insert(user.user_id.clone(), user);
        Ok(true)
    }

    async fn credit_ledger(
        &self,
        user_id: &str,
        field: LedgerField,
        amount: u32,
    ) -> Result<bool, StoreError> {
        match self.lock()?.users.get_mut(user_id) {
            Some(user) => {
                user.ledger.credit(field, amount);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_leave(&self, draft: &LeaveDraft) -> Result<LeaveRequest, StoreError> {
        let mut tables = self.lock()?;
        let request = LeaveRequest {
            id: tables.leaves.len() as u64 + 1,
            user_id: draft.user_id.clone(),
            leave_type: draft.leave_type,
            from_date: draft.from_date,
            to_date: draft.to_date,
            reason: draft.reason.clone(),
            status: LeaveStatus::Pending,
            granularity: draft.granularity,
            created_at: Some(Utc::now()),
        };
        tables.leaves.push(request.clone());
        Ok(request)
    }

    async fn get_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        Ok(self.lock()?.leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn transition(&self, id: u64, to: LeaveStatus) -> Result<Transition, StoreError> {
        let mut tables = self.lock()?;
        let Some(request) = tables.leaves.iter_mut().find(|l| l.id == id) else {
            return Ok(Transition::NotFound);
        };
        if request.status != LeaveStatus::Pending {
            return Ok(Transition::AlreadyDecided(request.status));
        }
        request.status = to;
        Ok(Transition::Applied(request.clone()))
    }

    async fn has_approved_overlap(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<bool, StoreError> {
        Ok(self.lock()?.leaves.iter().any(|l| {
            l.user_id == user_id
                && l.status == LeaveStatus::Approved
                && l.from_date <= to
                && l.to_date >= from
        }))
    }

    async fn count_requests_in_year(
        &self,
        user_id: &str,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<u32, StoreError> {
        Ok(self
            .lock()?
            .leaves
            .iter()
            .filter(|l| {
                l.user_id == user_id
                    && l.leave_type == leave_type
                    && l.status != LeaveStatus::Rejected
                    && l.from_date.year() == year
            })
            .count() as u32)
    }

    async fn list_leaves(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), StoreError> {
        let tables = self.lock()?;
        let matching: Vec<&LeaveRequest> = tables
            .leaves
            .iter()
            .rev()
            .filter(|l| query.user_id.as_deref().is_none_or(|u| l.user_id == u))
            .filter(|l| query.status.is_none_or(|s| l.status == s))
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .cloned()
            .collect();
        Ok((page, total))
    }
}

//! Persistence for users and leave requests.

pub mod memory;
pub mod mysql;

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::leave_request::{LeaveDraft, LeaveRequest, LeaveStatus, LeaveType};
use crate::model::user::{LedgerField, User};

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

/// Result of a conditional status change.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Applied(LeaveRequest),
    NotFound,
    AlreadyDecided(LeaveStatus),
}

/// Listing filter; `limit`/`offset` are already clamped by the caller.
#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    pub user_id: Option<String>,
    pub status: Option<LeaveStatus>,
    pub limit: u64,
    pub offset: u64,
}

#[allow(async_fn_in_trait)]
pub trait LeaveStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Inserts a user with a zeroed ledger. Returns false if the id exists.
    async fn insert_user(&self, user: &User) -> Result<bool, StoreError>;

    /// Adds `amount` to one ledger counter. Returns false if the user is missing.
    async fn credit_ledger(
        &self,
        user_id: &str,
        field: LedgerField,
        amount: u32,
    ) -> Result<bool, StoreError>;

    async fn insert_leave(&self, draft: &LeaveDraft) -> Result<LeaveRequest, StoreError>;

    async fn get_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;

    /// Moves a `Pending` request to `to`. Never touches a decided request.
    async fn transition(&self, id: u64, to: LeaveStatus) -> Result<Transition, StoreError>;

    /// Whether an approved request of the user intersects `from..=to`.
    async fn has_approved_overlap(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<bool, StoreError>;

    /// Non-rejected requests of `leave_type` starting in `year`.
    async fn count_requests_in_year(
        &self,
        user_id: &str,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<u32, StoreError>;

    async fn list_leaves(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), StoreError>;
}

/// Backend picked at startup from `DATABASE_URL`.
pub enum Store {
    MySql(MySqlStore),
    Memory(MemoryStore),
}

impl LeaveStore for Store {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        match self {
            Store::MySql(s) => s.get_user(user_id).await,
            Store::Memory(s) => s.get_user(user_id).await,
        }
    }

    async fn insert_user(&self, user: &User) -> Result<bool, StoreError> {
        match self {
            Store::MySql(s) => s.insert_user(user).await,
            Store::Memory(s) => s.insert_user(user).await,
        }
    }

    async fn credit_ledger(
        &self,
        user_id: &str,
        field: LedgerField,
        amount: u32,
    ) -> Result<bool, StoreError> {
        match self {
            Store::MySql(s) => s.credit_ledger(user_id, field, amount).await,
            Store::Memory(s) => s.credit_ledger(user_id, field, amount).await,
        }
    }

    async fn insert_leave(&self, draft: &LeaveDraft) -> Result<LeaveRequest, StoreError> {
        match self {
            Store::MySql(s) => s.insert_leave(draft).await,
            Store::Memory(s) => s.insert_leave(draft).await,
        }
    }

    async fn get_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        match self {
            Store::MySql(s) => s.get_leave(id).await,
            Store::Memory(s) => s.get_leave(id).await,
        }
    }

    async fn transition(&self, id: u64, to: LeaveStatus) -> Result<Transition, StoreError> {
        match self {
            Store::MySql(s) => s.transition(id, to).await,
            Store::Memory(s) => s.transition(id, to).await,
        }
    }

    async fn has_approved_overlap(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<bool, StoreError> {
        match self {
            Store::MySql(s) => s.has_approved_overlap(user_id, from, to).await,
            Store::Memory(s) => s.has_approved_overlap(user_id, from, to).await,
        }
    }

    async fn count_requests_in_year(
        &self,
        user_id: &str,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<u32, StoreError> {
        match self {
            Store::MySql(s) => s.count_requests_in_year(user_id, leave_type, year).await,
            Store::Memory(s) => s.count_requests_in_year(user_id, leave_type, year).await,
        }
    }

    async fn list_leaves(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), StoreError> {
        match self {
            Store::MySql(s) => s.list_leaves(query).await,
            Store::Memory(s) => s.list_leaves(query).await,
        }
    }
}

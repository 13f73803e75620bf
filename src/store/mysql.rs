use chrono::{NaiveDate, Utc};
use sqlx::MySqlPool;

use super::{LeaveQuery, LeaveStore, Transition};
use crate::error::StoreError;
use crate::model::leave_request::{LeaveDraft, LeaveRequest, LeaveStatus, LeaveType};
use crate::model::user::{LedgerField, User};

const USER_COLUMNS: &str = r#"
    user_id, joined_on,
    sick, sick_half_day, burnout, restricted_holiday, menstrual,
    casual, casual_half_day, maternity, paternity, bereavement,
    unpaid, work_from_home, created_at
"#;

const LEAVE_COLUMNS: &str = r#"
    id, user_id, leave_type, from_date, to_date, reason, status, granularity, created_at
"#;

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

impl LeaveStore for MySqlStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = ?");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_user(&self, user: &User) -> Result<bool, StoreError> {
        let result = sqlx::query(r#"INSERT INTO users (user_id, joined_on) VALUES (?, ?)"#)
            .bind(&user.user_id)
            .bind(user.joined_on)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code().as_deref() == Some("23000") {
                        return Ok(false);
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn credit_ledger(
        &self,
        user_id: &str,
        field: LedgerField,
        amount: u32,
    ) -> Result<bool, StoreError> {
        // Column name comes from the enum, never from input.
        let column = field.as_ref();
        let sql = format!("UPDATE users SET {column} = {column} + ? WHERE user_id = ?");
        let result = sqlx::query(&sql)
            .bind(amount)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_leave(&self, draft: &LeaveDraft) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (user_id, leave_type, from_date, to_date, reason, status, granularity)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.user_id)
        .bind(draft.leave_type.as_ref())
        .bind(draft.from_date)
        .bind(draft.to_date)
        .bind(&draft.reason)
        .bind(LeaveStatus::Pending.as_ref())
        .bind(draft.granularity.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(LeaveRequest {
            id: result.last_insert_id(),
            user_id: draft.user_id.clone(),
            leave_type: draft.leave_type,
            from_date: draft.from_date,
            to_date: draft.to_date,
            reason: draft.reason.clone(),
            status: LeaveStatus::Pending,
            granularity: draft.granularity,
            created_at: Some(Utc::now()),
        })
    }

    async fn get_leave(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        let leave = sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(leave)
    }

    async fn transition(&self, id: u64, to: LeaveStatus) -> Result<Transition, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?
            WHERE id = ?
            AND status = 'Pending'
            "#,
        )
        .bind(to.as_ref())
        .bind(id)
        .execute(&self.pool)
        .await?;

        let current = self.get_leave(id).await?;
        Ok(match current {
            None => Transition::NotFound,
            Some(leave) if result.rows_affected() == 0 => Transition::AlreadyDecided(leave.status),
            Some(leave) => Transition::Applied(leave),
        })
    }

    async fn has_approved_overlap(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM leave_requests
                WHERE user_id = ?
                AND status = 'Approved'
                AND from_date <= ?
                AND to_date >= ?
            )
            "#,
        )
        .bind(user_id)
        .bind(to)
        .bind(from)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists > 0)
    }

    async fn count_requests_in_year(
        &self,
        user_id: &str,
        leave_type: LeaveType,
        year: i32,
    ) -> Result<u32, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM leave_requests
            WHERE user_id = ?
            AND leave_type = ?
            AND status <> 'Rejected'
            AND YEAR(from_date) = ?
            "#,
        )
        .bind(user_id)
        .bind(leave_type.as_ref())
        .bind(year)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.max(0) as u32)
    }

    async fn list_leaves(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), StoreError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<&str> = Vec::new();

        if let Some(user_id) = query.user_id.as_deref() {
            where_sql.push_str(" AND user_id = ?");
            args.push(user_id);
        }

        if let Some(status) = query.status.as_ref() {
            where_sql.push_str(" AND status = ?");
            args.push(status.as_ref());
        }

        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{where_sql}");
        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = count_q.bind(*arg);
        }
        let total = count_q.fetch_one(&self.pool).await?;

        let data_sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests
            {where_sql}
            ORDER BY id DESC
            LIMIT ? OFFSET ?
            "#
        );
        let mut data_q = sqlx::query_as::<_, LeaveRequest>(&data_sql);
        for arg in args {
            data_q = data_q.bind(arg);
        }
        let leaves = data_q
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((leaves, total))
    }
}

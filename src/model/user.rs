use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter};
use utoipa::ToSchema;

/// A registered employee, keyed by chat-platform user id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct User {
    #[schema(example = "U024BE7LH")]
    pub user_id: String,
    #[schema(example = "2024-01-01", format = "date", value_type = String)]
    pub joined_on: NaiveDate,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub ledger: LeaveLedger,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(user_id: impl Into<String>, joined_on: NaiveDate) -> Self {
        Self {
            user_id: user_id.into(),
            joined_on,
            ledger: LeaveLedger::default(),
            created_at: None,
        }
    }
}

/// Consumed counters, one per leave category. Only ever increased, by the
/// approval step; remaining balances are derived from the policy table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveLedger {
    pub sick: u32,
    pub sick_half_day: u32,
    pub burnout: u32,
    pub restricted_holiday: u32,
    pub menstrual: u32,
    pub casual: u32,
    pub casual_half_day: u32,
    pub maternity: u32,
    pub paternity: u32,
    pub bereavement: u32,
    pub unpaid: u32,
    pub work_from_home: u32,
}

/// Ledger column names; `as_ref()` is the column in the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum LedgerField {
    Sick,
    SickHalfDay,
    Burnout,
    RestrictedHoliday,
    Menstrual,
    Casual,
    CasualHalfDay,
    Maternity,
    Paternity,
    Bereavement,
    Unpaid,
    WorkFromHome,
}

impl LeaveLedger {
    pub fn get(&self, field: LedgerField) -> u32 {
        match field {
            LedgerField::Sick => self.sick,
            LedgerField::SickHalfDay => self.sick_half_day,
            LedgerField::Burnout => self.burnout,
            LedgerField::RestrictedHoliday => self.restricted_holiday,
            LedgerField::Menstrual => self.menstrual,
            LedgerField::Casual => self.casual,
            LedgerField::CasualHalfDay => self.casual_half_day,
            LedgerField::Maternity => self.maternity,
            LedgerField::Paternity => self.paternity,
            LedgerField::Bereavement => self.bereavement,
            LedgerField::Unpaid => self.unpaid,
            LedgerField::WorkFromHome => self.work_from_home,
        }
    }

    pub fn credit(&mut self, field: LedgerField, amount: u32) {
        let slot = match field {
            LedgerField::Sick => &mut self.sick,
            LedgerField::SickHalfDay => &mut self.sick_half_day,
            LedgerField::Burnout => &mut self.burnout,
            LedgerField::RestrictedHoliday => &mut self.restricted_holiday,
            LedgerField::Menstrual => &mut self.menstrual,
            LedgerField::Casual => &mut self.casual,
            LedgerField::CasualHalfDay => &mut self.casual_half_day,
            LedgerField::Maternity => &mut self.maternity,
            LedgerField::Paternity => &mut self.paternity,
            LedgerField::Bereavement => &mut self.bereavement,
            LedgerField::Unpaid => &mut self.unpaid,
            LedgerField::WorkFromHome => &mut self.work_from_home,
        };
        *slot = slot.saturating_add(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn credit_only_touches_the_named_counter() {
        let mut ledger = LeaveLedger::default();
        ledger.credit(LedgerField::Casual, 3);
        ledger.credit(LedgerField::Casual, 2);

        for field in LedgerField::iter() {
            let expected = if field == LedgerField::Casual { 5 } else { 0 };
            assert_eq!(ledger.get(field), expected, "{field}");
        }
    }

    #[test]
    fn column_names_are_snake_case() {
        assert_eq!(LedgerField::SickHalfDay.as_ref(), "sick_half_day");
        assert_eq!(LedgerField::WorkFromHome.as_ref(), "work_from_home");
    }
}

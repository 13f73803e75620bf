use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use utoipa::ToSchema;

use crate::model::user::LedgerField;

/// Leave-type tags exchanged with the chat platform.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr, EnumIter,
)]
pub enum LeaveType {
    #[serde(rename = "Sick_Leave")]
    #[strum(serialize = "Sick_Leave")]
    Sick,
    #[serde(rename = "Burnout")]
    #[strum(serialize = "Burnout")]
    Burnout,
    #[serde(rename = "Casual_Leave")]
    #[strum(serialize = "Casual_Leave")]
    Casual,
    #[serde(rename = "Restricted_Holiday")]
    #[strum(serialize = "Restricted_Holiday")]
    RestrictedHoliday,
    #[serde(rename = "Menstrual_Leave")]
    #[strum(serialize = "Menstrual_Leave")]
    Menstrual,
    #[serde(rename = "Maternity_Leave")]
    #[strum(serialize = "Maternity_Leave")]
    Maternity,
    #[serde(rename = "Paternity_Leave")]
    #[strum(serialize = "Paternity_Leave")]
    Paternity,
    #[serde(rename = "Bereavement_Leave")]
    #[strum(serialize = "Bereavement_Leave")]
    Bereavement,
    #[serde(rename = "Unpaid_Leave")]
    #[strum(serialize = "Unpaid_Leave")]
    Unpaid,
    #[serde(rename = "Internship_Leave")]
    #[strum(serialize = "Internship_Leave")]
    Internship,
    #[serde(rename = "Work_From_Home")]
    #[strum(serialize = "Work_From_Home")]
    WorkFromHome,
}

impl LeaveType {
    /// Human wording used in verdicts and notifications.
    pub fn label(&self) -> &'static str {
        match self {
            LeaveType::Sick => "sick leave",
            LeaveType::Burnout => "burnout leave",
            LeaveType::Casual => "casual leave",
            LeaveType::RestrictedHoliday => "restricted holiday",
            LeaveType::Menstrual => "menstrual leave",
            LeaveType::Maternity => "maternity leave",
            LeaveType::Paternity => "paternity leave",
            LeaveType::Bereavement => "bereavement leave",
            LeaveType::Unpaid => "unpaid leave",
            LeaveType::Internship => "internship leave",
            LeaveType::WorkFromHome => "work from home",
        }
    }

    /// Ledger counter charged when a request of this type is approved.
    /// Internship leave has no counter.
    pub fn ledger_field(&self, granularity: DayGranularity) -> Option<LedgerField> {
        let half = granularity.is_half();
        match self {
            LeaveType::Sick if half => Some(LedgerField::SickHalfDay),
            LeaveType::Sick => Some(LedgerField::Sick),
            LeaveType::Casual if half => Some(LedgerField::CasualHalfDay),
            LeaveType::Casual => Some(LedgerField::Casual),
            LeaveType::Burnout => Some(LedgerField::Burnout),
            LeaveType::RestrictedHoliday => Some(LedgerField::RestrictedHoliday),
            LeaveType::Menstrual => Some(LedgerField::Menstrual),
            LeaveType::Maternity => Some(LedgerField::Maternity),
            LeaveType::Paternity => Some(LedgerField::Paternity),
            LeaveType::Bereavement => Some(LedgerField::Bereavement),
            LeaveType::Unpaid => Some(LedgerField::Unpaid),
            LeaveType::WorkFromHome => Some(LedgerField::WorkFromHome),
            LeaveType::Internship => None,
        }
    }
}

impl TryFrom<String> for LeaveType {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString,
    AsRefStr,
)]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

impl TryFrom<String> for LeaveStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display,
    EnumString, AsRefStr,
)]
pub enum DayGranularity {
    #[default]
    Full,
    FirstHalf,
    SecondHalf,
}

impl DayGranularity {
    pub fn is_half(&self) -> bool {
        !matches!(self, DayGranularity::Full)
    }
}

impl TryFrom<String> for DayGranularity {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Raw form submission. Dates stay strings until the policy engine parses them.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct LeaveApplication {
    #[schema(example = "Sick_Leave")]
    pub leave_type: String,
    #[schema(example = "2026-01-05", format = "date")]
    pub from_date: Option<String>,
    #[schema(example = "2026-01-07", format = "date")]
    pub to_date: Option<String>,
    #[schema(example = "Fever")]
    pub reason: Option<String>,
    #[serde(default)]
    pub granularity: Option<DayGranularity>,
}

/// A request that passed the policy engine and is ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveDraft {
    pub user_id: String,
    pub leave_type: LeaveType,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: String,
    pub granularity: DayGranularity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct LeaveRequest {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "U024BE7LH")]
    pub user_id: String,
    #[sqlx(try_from = "String")]
    pub leave_type: LeaveType,
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub from_date: NaiveDate,
    #[schema(example = "2026-01-07", format = "date", value_type = String)]
    pub to_date: NaiveDate,
    pub reason: String,
    #[sqlx(try_from = "String")]
    pub status: LeaveStatus,
    #[sqlx(try_from = "String")]
    pub granularity: DayGranularity,
    #[schema(example = "2026-01-01T00:00:00Z", format = "date-time", value_type = String)]
    pub created_at: Option<DateTime<Utc>>,
}

impl LeaveRequest {
    /// Inclusive calendar span, weekends and holidays included.
    pub fn calendar_days(&self) -> u32 {
        calendar_days(self.from_date, self.to_date)
    }

    /// Amount credited to the ledger on approval: one unit for a half day,
    /// otherwise the calendar span.
    pub fn ledger_amount(&self) -> u32 {
        if self.granularity.is_half() {
            1
        } else {
            self.calendar_days()
        }
    }
}

pub fn calendar_days(from: NaiveDate, to: NaiveDate) -> u32 {
    ((to - from).num_days() + 1).max(0) as u32
}

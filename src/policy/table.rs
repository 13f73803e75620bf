//! Quota limits and per-category constraints, kept in one immutable table.

use std::fmt;

use crate::model::leave_request::LeaveType;
use crate::model::user::LedgerField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Days,
    Weeks,
}

impl Unit {
    pub fn noun(&self) -> &'static str {
        match self {
            Unit::Days => "day(s)",
            Unit::Weeks => "week(s)",
        }
    }
}

/// How the requested amount is measured for quota and per-request caps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    WorkingDays,
    CalendarDays,
    /// `ceil(calendar span / 7)`
    CalendarWeeks,
}

/// Minimum gap between today and the start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Days(i64),
    Months(u32),
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Days(days) if days % 7 == 0 => write!(f, "{} weeks", days / 7),
            Notice::Days(days) => write!(f, "{days} days"),
            Notice::Months(months) => write!(f, "{months} months"),
        }
    }
}

/// Start-date rule applied before any balance lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Anytime,
    NoPastStart,
    MinNotice(Notice),
    /// Start may precede today by at most this many weeks.
    StartsWithinWeeksBefore(i64),
}

/// Where the consumed amount comes from and how the limit is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quota {
    Unlimited,
    /// `consumed + requested > limit` denies.
    Counter(LedgerField),
    /// Half-day capable: consumed is `2 * full + half`, compared in half-day units.
    HalfDayCounter { full: LedgerField, half: LedgerField },
    /// Consumed counter holds days; compared against a weekly limit.
    WeeklyCounter(LedgerField),
    /// Exhausted quota denies outright, otherwise requests are capped to what remains.
    CappedCounter(LedgerField),
    /// Consumed is the number of this year's non-rejected requests of the type.
    YearlyRequestCount,
}

/// Structural checks applied after the quota, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    MedicalProofAbove(u32),
    MaxConsecutive(u32),
    NoOverlapWithApproved,
    QuarterStartMonthsOnly,
    MaxPerRequest(u32),
    MultiplesAbove { threshold: u32, step: u32 },
    MinTenureYears(u32),
}

#[derive(Debug, Clone, Copy)]
pub struct CategoryPolicy {
    pub leave_type: LeaveType,
    pub annual_limit: Option<u32>,
    pub unit: Unit,
    pub measure: Measure,
    pub timing: Timing,
    pub quota: Quota,
    pub half_day: bool,
    pub constraints: &'static [Constraint],
    pub guidance: &'static str,
}

impl CategoryPolicy {
    pub fn needs_history_count(&self) -> bool {
        matches!(self.quota, Quota::YearlyRequestCount)
    }

    pub fn needs_overlap_check(&self) -> bool {
        self.constraints.contains(&Constraint::NoOverlapWithApproved)
    }
}

pub const POLICY_TABLE: &[CategoryPolicy] = &[
    CategoryPolicy {
        leave_type: LeaveType::Sick,
        annual_limit: Some(12),
        unit: Unit::Days,
        measure: Measure::WorkingDays,
        timing: Timing::NoPastStart,
        quota: Quota::HalfDayCounter {
            full: LedgerField::Sick,
            half: LedgerField::SickHalfDay,
        },
        half_day: true,
        constraints: &[Constraint::MedicalProofAbove(3)],
        guidance: "Your sick leave request has been sent for approval. Get well soon!",
    },
    CategoryPolicy {
        leave_type: LeaveType::Burnout,
        annual_limit: Some(6),
        unit: Unit::Days,
        measure: Measure::WorkingDays,
        timing: Timing::NoPastStart,
        quota: Quota::Counter(LedgerField::Burnout),
        half_day: false,
        constraints: &[
            Constraint::MaxConsecutive(2),
            Constraint::NoOverlapWithApproved,
        ],
        guidance: "Your burnout leave request has been sent for approval. Take the time to recharge.",
    },
    CategoryPolicy {
        leave_type: LeaveType::Casual,
        annual_limit: Some(6),
        unit: Unit::Days,
        measure: Measure::WorkingDays,
        timing: Timing::MinNotice(Notice::Days(14)),
        quota: Quota::HalfDayCounter {
            full: LedgerField::Casual,
            half: LedgerField::CasualHalfDay,
        },
        half_day: true,
        constraints: &[],
        guidance: "Your casual leave request has been sent for approval.",
    },
    CategoryPolicy {
        leave_type: LeaveType::RestrictedHoliday,
        annual_limit: Some(6),
        unit: Unit::Days,
        measure: Measure::WorkingDays,
        timing: Timing::Anytime,
        quota: Quota::Counter(LedgerField::RestrictedHoliday),
        half_day: false,
        constraints: &[Constraint::QuarterStartMonthsOnly],
        guidance: "Your restricted holiday request has been sent for approval.",
    },
    CategoryPolicy {
        leave_type: LeaveType::Menstrual,
        annual_limit: Some(18),
        unit: Unit::Days,
        measure: Measure::CalendarDays,
        timing: Timing::Anytime,
        quota: Quota::YearlyRequestCount,
        half_day: false,
        constraints: &[Constraint::MaxPerRequest(2)],
        guidance: "Your menstrual leave request has been sent for approval. Take care.",
    },
    CategoryPolicy {
        leave_type: LeaveType::Maternity,
        annual_limit: Some(13),
        unit: Unit::Weeks,
        measure: Measure::CalendarWeeks,
        timing: Timing::StartsWithinWeeksBefore(4),
        quota: Quota::WeeklyCounter(LedgerField::Maternity),
        half_day: false,
        constraints: &[],
        guidance: "Your maternity leave request has been sent for approval. Congratulations!",
    },
    CategoryPolicy {
        leave_type: LeaveType::Paternity,
        annual_limit: Some(20),
        unit: Unit::Days,
        measure: Measure::WorkingDays,
        timing: Timing::MinNotice(Notice::Days(14)),
        quota: Quota::Counter(LedgerField::Paternity),
        half_day: false,
        constraints: &[Constraint::MultiplesAbove {
            threshold: 10,
            step: 10,
        }],
        guidance: "Your paternity leave request has been sent for approval. Congratulations!",
    },
    CategoryPolicy {
        leave_type: LeaveType::Bereavement,
        annual_limit: Some(5),
        unit: Unit::Days,
        measure: Measure::WorkingDays,
        timing: Timing::Anytime,
        quota: Quota::CappedCounter(LedgerField::Bereavement),
        half_day: false,
        constraints: &[],
        guidance: "Your bereavement leave request has been sent for approval. Our condolences.",
    },
    CategoryPolicy {
        leave_type: LeaveType::Unpaid,
        annual_limit: Some(20),
        unit: Unit::Days,
        measure: Measure::WorkingDays,
        timing: Timing::MinNotice(Notice::Months(2)),
        quota: Quota::Counter(LedgerField::Unpaid),
        half_day: false,
        constraints: &[Constraint::MinTenureYears(2)],
        guidance: "Your unpaid leave request has been sent for approval.",
    },
    CategoryPolicy {
        leave_type: LeaveType::Internship,
        annual_limit: None,
        unit: Unit::Days,
        measure: Measure::WorkingDays,
        timing: Timing::MinNotice(Notice::Days(5)),
        quota: Quota::Unlimited,
        half_day: false,
        constraints: &[Constraint::MaxPerRequest(2)],
        guidance: "Your internship leave request has been sent for approval.",
    },
    CategoryPolicy {
        leave_type: LeaveType::WorkFromHome,
        annual_limit: None,
        unit: Unit::Days,
        measure: Measure::WorkingDays,
        timing: Timing::NoPastStart,
        quota: Quota::Unlimited,
        half_day: false,
        constraints: &[],
        guidance: "Your work from home request has been sent for approval.",
    },
];

pub fn policy_for(leave_type: LeaveType) -> Option<&'static CategoryPolicy> {
    POLICY_TABLE.iter().find(|p| p.leave_type == leave_type)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_leave_type_has_exactly_one_policy() {
        for leave_type in LeaveType::iter() {
            let count = POLICY_TABLE
                .iter()
                .filter(|p| p.leave_type == leave_type)
                .count();
            assert_eq!(count, 1, "{leave_type}");
        }
    }

    #[test]
    fn limits_match_the_leave_policy() {
        let limit = |t| policy_for(t).and_then(|p| p.annual_limit);
        assert_eq!(limit(LeaveType::Sick), Some(12));
        assert_eq!(limit(LeaveType::Burnout), Some(6));
        assert_eq!(limit(LeaveType::Casual), Some(6));
        assert_eq!(limit(LeaveType::RestrictedHoliday), Some(6));
        assert_eq!(limit(LeaveType::Menstrual), Some(18));
        assert_eq!(limit(LeaveType::Maternity), Some(13));
        assert_eq!(limit(LeaveType::Paternity), Some(20));
        assert_eq!(limit(LeaveType::Bereavement), Some(5));
        assert_eq!(limit(LeaveType::Unpaid), Some(20));
        assert_eq!(limit(LeaveType::Internship), None);
    }

    #[test]
    fn only_sick_and_casual_allow_half_days() {
        let half: Vec<_> = POLICY_TABLE
            .iter()
            .filter(|p| p.half_day)
            .map(|p| p.leave_type)
            .collect();
        assert_eq!(half, vec![LeaveType::Sick, LeaveType::Casual]);
    }

    #[test]
    fn notice_reads_naturally() {
        assert_eq!(Notice::Days(14).to_string(), "2 weeks");
        assert_eq!(Notice::Days(5).to_string(), "5 days");
        assert_eq!(Notice::Months(2).to_string(), "2 months");
    }
}

use chrono::{Datelike, Duration, Months, NaiveDate};

use super::calendar::Calendar;
use super::table::{CategoryPolicy, Constraint, Measure, Notice, Quota, Timing, Unit};
use super::PolicyVerdict;
use crate::model::leave_request::{calendar_days, LeaveDraft, LeaveType};
use crate::model::user::User;

/// Stored state a rule reads. Gathered up front so evaluation stays pure.
#[derive(Debug, Clone, Default)]
pub struct PolicyInputs {
    pub user: Option<User>,
    /// Non-rejected requests of the same type in the start date's year.
    pub history_count: u32,
    pub overlaps_approved: bool,
}

fn capitalized(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Start-date check that runs before anything is looked up.
pub(crate) fn check_timing(
    policy: &CategoryPolicy,
    draft: &LeaveDraft,
    today: NaiveDate,
) -> Result<(), PolicyVerdict> {
    let label = policy.leave_type.label();
    match policy.timing {
        Timing::Anytime => Ok(()),
        Timing::NoPastStart if draft.from_date < today => Err(PolicyVerdict::violation(format!(
            "You cannot apply for {label} with a start date in the past."
        ))),
        Timing::NoPastStart => Ok(()),
        Timing::MinNotice(notice) => {
            let earliest = match notice {
                Notice::Days(days) => today.checked_add_signed(Duration::days(days)),
                Notice::Months(months) => today.checked_add_months(Months::new(months)),
            };
            match earliest {
                Some(earliest) if draft.from_date >= earliest => Ok(()),
                _ => Err(PolicyVerdict::violation(format!(
                    "{} must be applied for at least {notice} in advance.",
                    capitalized(label)
                ))),
            }
        }
        Timing::StartsWithinWeeksBefore(weeks) => {
            if draft.from_date >= today - Duration::weeks(weeks) {
                Ok(())
            } else {
                Err(PolicyVerdict::violation(format!(
                    "{} can start at most {weeks} weeks before today.",
                    capitalized(label)
                )))
            }
        }
    }
}

/// Requested amount in the policy's measure.
fn requested(policy: &CategoryPolicy, draft: &LeaveDraft, working_days: u32) -> u32 {
    match policy.measure {
        Measure::WorkingDays => working_days,
        Measure::CalendarDays => calendar_days(draft.from_date, draft.to_date),
        Measure::CalendarWeeks => calendar_days(draft.from_date, draft.to_date).div_ceil(7),
    }
}

fn format_halves(halves: i64) -> String {
    if halves % 2 == 0 {
        (halves / 2).to_string()
    } else {
        format!("{:.1}", halves as f64 / 2.0)
    }
}

fn insufficient(policy: &CategoryPolicy, remaining: String, limit: u32) -> PolicyVerdict {
    PolicyVerdict::violation(format!(
        "Insufficient {} balance. You have {remaining} {} remaining out of {limit}.",
        policy.leave_type.label(),
        policy.unit.noun()
    ))
}

fn check_quota(
    policy: &CategoryPolicy,
    draft: &LeaveDraft,
    user: &User,
    inputs: &PolicyInputs,
    requested: u32,
) -> Result<(), PolicyVerdict> {
    let Some(limit) = policy.annual_limit else {
        return Ok(());
    };
    let ledger = &user.ledger;
    let limit_i = i64::from(limit);

    match policy.quota {
        Quota::Unlimited => Ok(()),
        Quota::Counter(field) => {
            let consumed = i64::from(ledger.get(field));
            if consumed + i64::from(requested) > limit_i {
                Err(insufficient(policy, (limit_i - consumed).max(0).to_string(), limit))
            } else {
                Ok(())
            }
        }
        Quota::HalfDayCounter { full, half } => {
            let consumed = 2 * i64::from(ledger.get(full)) + i64::from(ledger.get(half));
            let wanted = if draft.granularity.is_half() {
                1
            } else {
                2 * i64::from(requested)
            };
            if consumed + wanted > 2 * limit_i {
                let remaining = format_halves((2 * limit_i - consumed).max(0));
                Err(insufficient(policy, remaining, limit))
            } else {
                Ok(())
            }
        }
        Quota::WeeklyCounter(field) => {
            let consumed = i64::from(ledger.get(field).div_ceil(7));
            if consumed + i64::from(requested) > limit_i {
                Err(insufficient(policy, (limit_i - consumed).max(0).to_string(), limit))
            } else {
                Ok(())
            }
        }
        Quota::CappedCounter(field) => {
            let remaining = limit_i - i64::from(ledger.get(field));
            let label = policy.leave_type.label();
            if remaining <= 0 {
                Err(PolicyVerdict::violation(format!(
                    "You have used all {limit} {} of {label} for the year.",
                    policy.unit.noun()
                )))
            } else if i64::from(requested) > remaining {
                Err(PolicyVerdict::violation(format!(
                    "You can take at most {remaining} more {} of {label}.",
                    policy.unit.noun()
                )))
            } else {
                Ok(())
            }
        }
        Quota::YearlyRequestCount => {
            let consumed = i64::from(inputs.history_count);
            if consumed + 1 > limit_i {
                Err(insufficient(policy, (limit_i - consumed).max(0).to_string(), limit))
            } else {
                Ok(())
            }
        }
    }
}

fn check_constraint(
    constraint: Constraint,
    policy: &CategoryPolicy,
    user: &User,
    inputs: &PolicyInputs,
    requested: u32,
    today: NaiveDate,
) -> Result<(), PolicyVerdict> {
    let label = policy.leave_type.label();
    let deny = |message: String| -> Result<(), PolicyVerdict> {
        Err(PolicyVerdict::violation(message))
    };

    match constraint {
        Constraint::MedicalProofAbove(days) if requested > days => deny(format!(
            "{} of more than {days} days requires a doctor's note. \
             Please share medical proof with HR to apply.",
            capitalized(label)
        )),
        Constraint::MaxConsecutive(days) if requested > days => deny(format!(
            "You can take a maximum of {days} consecutive {label}s."
        )),
        Constraint::NoOverlapWithApproved if inputs.overlaps_approved => deny(format!(
            "Your {label} overlaps a leave that has already been approved."
        )),
        Constraint::QuarterStartMonthsOnly if !matches!(today.month(), 1 | 4 | 7 | 10) => deny(
            format!(
                "{} can only be requested in January, April, July or October.",
                capitalized(label)
            ),
        ),
        Constraint::MaxPerRequest(days) if requested > days => deny(format!(
            "You can take at most {days} days of {label} per request."
        )),
        Constraint::MultiplesAbove { threshold, step }
            if requested > threshold && requested % step != 0 =>
        {
            deny(format!(
                "{} beyond {threshold} days must be taken in multiples of {step} days.",
                capitalized(label)
            ))
        }
        Constraint::MinTenureYears(years) => {
            let eligible_from = user.joined_on.checked_add_months(Months::new(12 * years));
            match eligible_from {
                Some(date) if date <= today => Ok(()),
                _ => deny(format!(
                    "{} requires at least {years} years of service.",
                    capitalized(label)
                )),
            }
        }
        _ => Ok(()),
    }
}

/// Steps after the start-date check: working days, registration, quota,
/// structural constraints, guidance.
pub(crate) fn evaluate(
    calendar: &Calendar,
    policy: &CategoryPolicy,
    draft: &LeaveDraft,
    inputs: &PolicyInputs,
    today: NaiveDate,
) -> PolicyVerdict {
    let working_days = calendar.count_working_days(draft.from_date, draft.to_date);
    if policy.measure == Measure::WorkingDays && working_days == 0 {
        return PolicyVerdict::violation(
            "The selected dates fall on weekends or public holidays. No working days were requested.",
        );
    }
    let requested = requested(policy, draft, working_days);

    let Some(user) = inputs.user.as_ref() else {
        return PolicyVerdict::unregistered();
    };

    if let Err(verdict) = check_quota(policy, draft, user, inputs, requested) {
        return verdict;
    }

    for constraint in policy.constraints {
        if let Err(verdict) = check_constraint(*constraint, policy, user, inputs, requested, today)
        {
            return verdict;
        }
    }

    let mut message = policy.guidance.to_string();
    if policy.unit == Unit::Days && policy.measure == Measure::WorkingDays {
        let amount = if draft.granularity.is_half() {
            "half a working day".to_string()
        } else {
            format!("{working_days} working day(s)")
        };
        message.push_str(&format!(" Requested: {amount}."));
    }
    if policy.leave_type == LeaveType::RestrictedHoliday {
        let restricted: Vec<String> = calendar
            .restricted_between(draft.from_date, draft.to_date)
            .map(|h| format!("{} ({})", h.name, h.date))
            .collect();
        if !restricted.is_empty() {
            message.push_str(&format!(
                " Restricted holidays in this range: {}.",
                restricted.join(", ")
            ));
        }
    }
    PolicyVerdict::admit(message)
}

use chrono::NaiveDate;

use super::calendar::Calendar;

impl Calendar {
    /// Counts the days in `from..=to` that are not weekends or public holidays.
    /// Callers check `from <= to` first; a reversed range counts as zero.
    pub fn count_working_days(&self, from: NaiveDate, to: NaiveDate) -> u32 {
        from.iter_days()
            .take_while(|day| *day <= to)
            .filter(|day| !self.is_non_working_day(*day))
            .count() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::holiday::{Holiday, Holidays};
    use crate::model::leave_request::calendar_days;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn calendar() -> Calendar {
        Calendar::new(&Holidays {
            public: vec![
                Holiday::new(date("2026-01-26"), "Republic Day"),
                Holiday::new(date("2026-08-15"), "Independence Day"),
            ],
            restricted: vec![],
        })
    }

    #[test]
    fn full_week_has_five_working_days() {
        // Monday 2026-01-05 to Sunday 2026-01-11
        assert_eq!(
            calendar().count_working_days(date("2026-01-05"), date("2026-01-11")),
            5
        );
    }

    #[test]
    fn public_holiday_is_excluded() {
        // Monday 2026-01-26 is Republic Day
        assert_eq!(
            calendar().count_working_days(date("2026-01-26"), date("2026-01-30")),
            4
        );
    }

    #[test]
    fn single_day_counts_zero_or_one() {
        let calendar = calendar();
        assert_eq!(calendar.count_working_days(date("2026-01-06"), date("2026-01-06")), 1);
        assert_eq!(calendar.count_working_days(date("2026-01-10"), date("2026-01-10")), 0);
        assert_eq!(calendar.count_working_days(date("2026-01-26"), date("2026-01-26")), 0);
    }

    #[test]
    fn reversed_range_counts_nothing() {
        assert_eq!(
            calendar().count_working_days(date("2026-01-09"), date("2026-01-05")),
            0
        );
    }

    #[test]
    fn never_exceeds_the_calendar_span() {
        let calendar = calendar();
        let start = date("2026-01-01");
        for offset in 0..60 {
            let from = start + chrono::Duration::days(offset);
            for len in 0..20 {
                let to = from + chrono::Duration::days(len);
                let working = calendar.count_working_days(from, to);
                let span = calendar_days(from, to);
                let all_working = from
                    .iter_days()
                    .take_while(|d| *d <= to)
                    .all(|d| !calendar.is_non_working_day(d));
                assert!(working <= span);
                assert_eq!(working == span, all_working, "{from}..={to}");
            }
        }
    }
}

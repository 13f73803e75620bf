use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashSet;

use crate::model::holiday::{Holiday, Holidays};

/// Working-day calendar built from the holiday reference data.
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    public: HashSet<NaiveDate>,
    restricted: Vec<Holiday>,
}

impl Calendar {
    pub fn new(holidays: &Holidays) -> Self {
        Self {
            public: holidays.public.iter().map(|h| h.date).collect(),
            restricted: holidays.restricted.clone(),
        }
    }

    /// Weekend or exact match on a public holiday. Restricted holidays are
    /// optional and never make a day non-working.
    pub fn is_non_working_day(&self, date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun) || self.public.contains(&date)
    }

    /// Restricted holidays falling inside the inclusive range.
    pub fn restricted_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> impl Iterator<Item = &Holiday> {
        self.restricted
            .iter()
            .filter(move |h| h.date >= from && h.date <= to)
    }
}

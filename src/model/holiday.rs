use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Holiday {
    #[schema(example = "2026-01-26", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Republic Day")]
    pub name: String,
}

impl Holiday {
    pub fn new(date: NaiveDate, name: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
        }
    }
}

/// Reference data loaded once at startup. Public holidays are non-working days
/// for everyone; restricted holidays are optional and chosen per employee.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Holidays {
    #[serde(default)]
    pub public: Vec<Holiday>,
    #[serde(default)]
    pub restricted: Vec<Holiday>,
}

impl Holidays {
    pub fn from_json(json: &str) -> Result<Self> {
        let mut holidays: Holidays =
            serde_json::from_str(json).context("holiday data is not valid JSON")?;
        holidays.public.sort_by_key(|h| h.date);
        holidays.restricted.sort_by_key(|h| h.date);
        Ok(holidays)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read holiday file {}", path.display()))?;
        Self::from_json(&json)
    }
}

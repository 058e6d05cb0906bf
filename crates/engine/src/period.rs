//! Reporting periods for KPI summaries.
//!
//! Periods are resolved against a calendar day ("today") in the deployment
//! timezone and compared with the movement `date`, never with timestamps.

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Today,
    Week,
    Month,
}

/// Inclusive range of calendar days.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

impl Period {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Resolves the period around `today`.
    ///
    /// - `today`: the single day.
    /// - `week`: ISO week, Monday through Sunday.
    /// - `month`: the calendar month.
    pub fn range(self, today: NaiveDate) -> ResultEngine<DateRange> {
        let out_of_range = || EngineError::InvalidPeriod("date out of range".to_string());
        match self {
            Self::Today => Ok(DateRange {
                start: today,
                end: today,
            }),
            Self::Week => {
                let offset = u64::from(today.weekday().num_days_from_monday());
                let start = today
                    .checked_sub_days(Days::new(offset))
                    .ok_or_else(out_of_range)?;
                let end = start
                    .checked_add_days(Days::new(6))
                    .ok_or_else(out_of_range)?;
                Ok(DateRange { start, end })
            }
            Self::Month => {
                let start = today.with_day(1).ok_or_else(out_of_range)?;
                let end = start
                    .checked_add_months(Months::new(1))
                    .and_then(|next| next.pred_opt())
                    .ok_or_else(out_of_range)?;
                Ok(DateRange { start, end })
            }
        }
    }
}

impl TryFrom<&str> for Period {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "today" => Ok(Self::Today),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            other => Err(EngineError::InvalidPeriod(format!(
                "unknown period: {other}"
            ))),
        }
    }
}

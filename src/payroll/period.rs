use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("period '{0}' must be YYYY-MM or YYYY-MM-DD")]
    Malformed(String),
    #[error("no calendar month precedes {0}")]
    OutOfRange(NaiveDate),
}

/// Inclusive date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A payroll month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PayPeriod {
    first: NaiveDate,
    last: NaiveDate,
}

impl PayPeriod {
    pub fn from_ym(year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)?
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)?
        };
        Some(PayPeriod {
            first,
            last: next.pred_opt()?,
        })
    }

    pub fn containing(date: NaiveDate) -> Option<Self> {
        Self::from_ym(date.year(), date.month())
    }

    /// The calendar month before the one `today` falls in.
    pub fn preceding(today: NaiveDate) -> Result<Self, PeriodError> {
        Self::containing(today)
            .and_then(|current| current.previous())
            .ok_or(PeriodError::OutOfRange(today))
    }

    /// Resolves the optional run date of a payroll run to the month it pays.
    ///
    /// A run always pays the calendar month before its run date; `run_date`
    /// overrides `today` and accepts `YYYY-MM` or `YYYY-MM-DD`.
    pub fn resolve(run_date: Option<&str>, today: NaiveDate) -> Result<Self, PeriodError> {
        match run_date.map(str::trim).filter(|t| !t.is_empty()) {
            Some(run_date) => {
                let run_month: PayPeriod = run_date.parse()?;
                Self::preceding(run_month.first_day())
            }
            None => Self::preceding(today),
        }
    }

    pub fn previous(&self) -> Option<Self> {
        Self::containing(self.first.pred_opt()?)
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    pub fn window(&self) -> DateWindow {
        DateWindow {
            start: self.first,
            end: self.last,
        }
    }
}

impl FromStr for PayPeriod {
    type Err = PeriodError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let malformed = || PeriodError::Malformed(value.to_string());
        let value = value.trim();
        let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(&format!("{value}-01"), "%Y-%m-%d"))
            .map_err(|_| malformed())?;
        Self::containing(date).ok_or_else(malformed)
    }
}

impl fmt::Display for PayPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.first.format("%Y-%m"))
    }
}

impl Serialize for PayPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

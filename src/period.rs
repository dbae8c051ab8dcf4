//! Calendar periods used to bucket posts.
//!
//! A [`Period`] is a label plus the Unix timestamp at which it starts in a
//! given time zone. Periods are walked backwards from "now": years and months
//! step on calendar fields, days and hours step by subtracting a fixed number
//! of seconds from the start and relabelling, so month and year rollovers fall
//! out of the timestamp arithmetic.

use std::fmt;
use std::str::FromStr;

use chrono::{
    DateTime, Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Timelike,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;

const DAY_FORMAT: &str = "%d.%m.%Y";
const HOUR_FORMAT: &str = "%H.%d.%m.%Y";

/// Longest stretch of skipped wall-clock time searched past a DST jump.
const MAX_GAP_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("unknown period '{0}', expected year, month, day or hour")]
    UnknownGranularity(String),
    #[error("invalid {granularity} label: '{label}'")]
    InvalidLabel {
        granularity: Granularity,
        label: String,
    },
}

/// Size of the periods an aggregation run buckets posts into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Year,
    Month,
    Day,
    Hour,
}

impl Granularity {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Year => "year",
            Self::Month => "month",
            Self::Day => "day",
            Self::Hour => "hour",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "year" => Ok(Self::Year),
            "month" => Ok(Self::Month),
            "day" => Ok(Self::Day),
            "hour" => Ok(Self::Hour),
            _ => Err(PeriodError::UnknownGranularity(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Year(i32),
    Month { year: i32, month: u32 },
    Day,
    Hour,
}

/// One labelled period and the timestamp it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period {
    label: String,
    start: i64,
    anchor: Anchor,
}

impl Period {
    /// The period of the given size containing `now`, in `now`'s time zone.
    pub fn current<Tz>(granularity: Granularity, now: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let tz = now.timezone();
        let today = now.date_naive();
        match granularity {
            Granularity::Year => Self::year(today.year(), &tz),
            Granularity::Month => Self::month(today.year(), today.month(), &tz),
            Granularity::Day => {
                let start = local_timestamp(&tz, today.and_time(NaiveTime::MIN));
                Self::fixed(Anchor::Day, start, &tz)
            }
            Granularity::Hour => {
                let hour = today
                    .and_hms_opt(now.hour(), 0, 0)
                    .unwrap_or_else(|| today.and_time(NaiveTime::MIN));
                Self::fixed(Anchor::Hour, local_timestamp(&tz, hour), &tz)
            }
        }
    }

    /// Rebuild a period from its label and start timestamp.
    ///
    /// Year and month periods take their position from the label (a month
    /// label may omit the leading zero, e.g. `1.2021`). Day and hour periods
    /// step from `start`, so their label is kept as given.
    ///
    /// # Errors
    ///
    /// Returns an error if a year or month label cannot be parsed.
    pub fn from_label(granularity: Granularity, label: &str, start: i64) -> Result<Self, PeriodError> {
        let invalid = || PeriodError::InvalidLabel {
            granularity,
            label: label.to_string(),
        };
        let anchor = match granularity {
            Granularity::Year => Anchor::Year(label.trim().parse().map_err(|_| invalid())?),
            Granularity::Month => {
                let (month, year) = label.trim().split_once('.').ok_or_else(invalid)?;
                let month: u32 = month.parse().map_err(|_| invalid())?;
                let year: i32 = year.parse().map_err(|_| invalid())?;
                if !(1..=12).contains(&month) {
                    return Err(invalid());
                }
                Anchor::Month { year, month }
            }
            Granularity::Day => Anchor::Day,
            Granularity::Hour => Anchor::Hour,
        };
        Ok(Self {
            label: label.to_string(),
            start,
            anchor,
        })
    }

    /// The period immediately before this one.
    #[must_use]
    pub fn previous<Tz>(&self, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        match self.anchor {
            Anchor::Year(year) => Self::year(year - 1, tz),
            Anchor::Month { year, month } if month > 1 => Self::month(year, month - 1, tz),
            Anchor::Month { year, .. } => Self::month(year - 1, 12, tz),
            Anchor::Day => Self::fixed(Anchor::Day, self.start.saturating_sub(SECONDS_PER_DAY), tz),
            Anchor::Hour => {
                Self::fixed(Anchor::Hour, self.start.saturating_sub(SECONDS_PER_HOUR), tz)
            }
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// First second of the period, Unix time.
    #[must_use]
    pub fn start(&self) -> i64 {
        self.start
    }

    fn year<Tz: TimeZone>(year: i32, tz: &Tz) -> Self {
        Self::starting_on(
            year.to_string(),
            NaiveDate::from_ymd_opt(year, 1, 1),
            Anchor::Year(year),
            tz,
        )
    }

    fn month<Tz: TimeZone>(year: i32, month: u32, tz: &Tz) -> Self {
        Self::starting_on(
            format!("{month:02}.{year}"),
            NaiveDate::from_ymd_opt(year, month, 1),
            Anchor::Month { year, month },
            tz,
        )
    }

    fn starting_on<Tz: TimeZone>(
        label: String,
        first_day: Option<NaiveDate>,
        anchor: Anchor,
        tz: &Tz,
    ) -> Self {
        // Past the representable calendar every remaining post belongs here.
        let start = first_day.map_or(i64::MIN, |day| {
            local_timestamp(tz, day.and_time(NaiveTime::MIN))
        });
        Self {
            label,
            start,
            anchor,
        }
    }

    fn fixed<Tz>(anchor: Anchor, start: i64, tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let format = if anchor == Anchor::Hour {
            HOUR_FORMAT
        } else {
            DAY_FORMAT
        };
        let label = tz
            .timestamp_opt(start, 0)
            .earliest()
            .map_or_else(|| start.to_string(), |t| t.format(format).to_string());
        Self {
            label,
            start,
            anchor,
        }
    }
}

/// Step a period back by one unit.
///
/// # Errors
///
/// Returns an error if a year or month label cannot be parsed.
pub fn change_period<Tz>(
    granularity: Granularity,
    label: &str,
    start: i64,
    tz: &Tz,
) -> Result<Period, PeriodError>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    Ok(Period::from_label(granularity, label, start)?.previous(tz))
}

/// Unix timestamp of a wall-clock time in `tz`.
///
/// Repeated times take their earliest instant. Times skipped by a DST jump
/// resolve to the first minute that exists after the jump.
pub fn local_timestamp<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> i64 {
    let mut candidate = naive;
    for _ in 0..=MAX_GAP_MINUTES {
        if let Some(t) = tz.from_local_datetime(&candidate).earliest() {
            return t.timestamp();
        }
        match candidate.checked_add_signed(TimeDelta::minutes(1)) {
            Some(next) => candidate = next,
            None => break,
        }
    }
    naive.and_utc().timestamp()
}

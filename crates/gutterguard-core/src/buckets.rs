//! Fixed-size clogged/cleared histograms for the chart views.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::history::{ClogHistory, ClogStatus};
use crate::timestamp;

const MINUTES_PER_SLOT: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    /// Hour of day, all time.
    Hour,
    /// Sunday-based weekday, current week only.
    DayOfWeek,
    /// Month of year, current year only.
    Month,
    /// Three minute slot within the hour, all time.
    MinuteSlot,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Hour,
        Granularity::DayOfWeek,
        Granularity::Month,
        Granularity::MinuteSlot,
    ];

    pub fn len(self) -> usize {
        match self {
            Granularity::Hour => 24,
            Granularity::DayOfWeek => 7,
            Granularity::Month => 12,
            Granularity::MinuteSlot => (60 / MINUTES_PER_SLOT) as usize,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Granularity::Hour => "Hourly",
            Granularity::DayOfWeek => "This week",
            Granularity::Month => "This year",
            Granularity::MinuteSlot => "Per 3 minutes",
        }
    }

    pub fn next(self) -> Self {
        match self {
            Granularity::Hour => Granularity::DayOfWeek,
            Granularity::DayOfWeek => Granularity::Month,
            Granularity::Month => Granularity::MinuteSlot,
            Granularity::MinuteSlot => Granularity::Hour,
        }
    }

    /// Short axis label for a bucket index.
    pub fn bucket_label(self, idx: usize) -> String {
        const DAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
        const MONTHS: [&str; 12] = [
            "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
        ];
        match self {
            Granularity::Hour => format!("{idx:02}h"),
            Granularity::DayOfWeek => DAYS.get(idx).copied().unwrap_or("?").to_string(),
            Granularity::Month => MONTHS.get(idx).copied().unwrap_or("?").to_string(),
            Granularity::MinuteSlot => format!(":{:02}", idx as u32 * MINUTES_PER_SLOT),
        }
    }

    fn in_period(self, ts: &NaiveDateTime, now: &NaiveDateTime) -> bool {
        match self {
            Granularity::Hour | Granularity::MinuteSlot => true,
            Granularity::DayOfWeek => {
                let start = week_start(now.date());
                let date = ts.date();
                date >= start && start.checked_add_days(Days::new(7)).is_some_and(|end| date < end)
            }
            Granularity::Month => ts.year() == now.year(),
        }
    }

    fn index(self, ts: &NaiveDateTime) -> usize {
        match self {
            Granularity::Hour => ts.hour() as usize,
            Granularity::DayOfWeek => ts.weekday().num_days_from_sunday() as usize,
            Granularity::Month => ts.month0() as usize,
            Granularity::MinuteSlot => (ts.minute() / MINUTES_PER_SLOT) as usize,
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Granularity::Hour => "hour",
            Granularity::DayOfWeek => "day-of-week",
            Granularity::Month => "month",
            Granularity::MinuteSlot => "minute-slot",
        };
        f.write_str(name)
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hour" | "hourly" => Ok(Granularity::Hour),
            "day-of-week" | "day" | "week" | "weekly" => Ok(Granularity::DayOfWeek),
            "month" | "monthly" => Ok(Granularity::Month),
            "minute-slot" | "minute" | "minutes" => Ok(Granularity::MinuteSlot),
            other => Err(format!("unknown granularity: {other}")),
        }
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    let offset = u64::from(date.weekday().num_days_from_sunday());
    date.checked_sub_days(Days::new(offset)).unwrap_or(date)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketedSeries {
    pub granularity: Granularity,
    pub clogged: Vec<u32>,
    pub cleared: Vec<u32>,
}

impl BucketedSeries {
    pub fn empty(granularity: Granularity) -> Self {
        Self {
            granularity,
            clogged: vec![0; granularity.len()],
            cleared: vec![0; granularity.len()],
        }
    }

    pub fn total(&self) -> u32 {
        self.clogged.iter().sum::<u32>() + self.cleared.iter().sum::<u32>()
    }

    pub fn peak(&self) -> u32 {
        self.clogged
            .iter()
            .chain(self.cleared.iter())
            .copied()
            .max()
            .unwrap_or(0)
    }

    fn record(&mut self, ts: &NaiveDateTime, status: ClogStatus, now: &NaiveDateTime) {
        if !self.granularity.in_period(ts, now) {
            return;
        }
        let idx = self.granularity.index(ts);
        let slot = match status {
            ClogStatus::Clogged => self.clogged.get_mut(idx),
            ClogStatus::Cleared => self.cleared.get_mut(idx),
        };
        if let Some(slot) = slot {
            *slot += 1;
        }
    }
}

/// Buckets every decodable event of `histories`. `now` anchors the week and
/// year filters.
pub fn aggregate<'a, I>(histories: I, granularity: Granularity, now: NaiveDateTime) -> BucketedSeries
where
    I: IntoIterator<Item = &'a ClogHistory>,
{
    let mut series = BucketedSeries::empty(granularity);
    for history in histories {
        for event in history.events() {
            if let Some(ts) = timestamp::decode(&event.timestamp) {
                series.record(&ts, event.status, &now);
            }
        }
    }
    series
}

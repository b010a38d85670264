//! Calendar view: one entry per local calendar date.

use std::collections::BTreeMap;

use chrono::{Datelike, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::resolve::ResolvedTrade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub trade_count: usize,
    pub pnl: f64,
    pub wins: usize,
    pub losses: usize,
    /// Distinct emotion tags in the order the trades were stored.
    pub emotions: Vec<String>,
    /// The first emotion encountered that day, not the most frequent.
    pub dominant_emotion: Option<String>,
}

impl CalendarDay {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            trade_count: 0,
            pnl: 0.0,
            wins: 0,
            losses: 0,
            emotions: Vec::new(),
            dominant_emotion: None,
        }
    }
}

/// A calendar month, e.g. `2024-03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(self) -> NaiveDate {
        let (y, m) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(y, m, 1)
            .and_then(|d| d.pred_opt())
            .unwrap_or_default()
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::str::FromStr for CalendarMonth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || format!("invalid month '{s}' (expected YYYY-MM)");
        let (y, m) = s.trim().split_once('-').ok_or_else(err)?;
        let year = y.parse().map_err(|_| err())?;
        let month = m.parse().map_err(|_| err())?;
        Self::new(year, month).ok_or_else(err)
    }
}

/// Build calendar days from resolved trades in store (insertion) order.
///
/// Only closed trades with usable metrics contribute. Days are keyed by the
/// entry date in `offset` and returned in date order.
pub fn calendar_days(
    resolved: &[ResolvedTrade<'_>],
    offset: FixedOffset,
    month: Option<CalendarMonth>,
) -> Vec<CalendarDay> {
    let mut days: BTreeMap<NaiveDate, CalendarDay> = BTreeMap::new();

    for closed in resolved.iter().filter_map(|r| r.as_closed()) {
        let date = closed.trade.entry_time.with_timezone(&offset).date_naive();
        if month.is_some_and(|m| !m.contains(date)) {
            continue;
        }

        let day = days.entry(date).or_insert_with(|| CalendarDay::new(date));
        let pnl = closed.net_pnl();
        day.trade_count += 1;
        day.pnl += pnl;
        if pnl > 0.0 {
            day.wins += 1;
        } else if pnl < 0.0 {
            day.losses += 1;
        }
        if let Some(emotion) = closed.trade.emotion_key() {
            if day.dominant_emotion.is_none() {
                day.dominant_emotion = Some(emotion.clone());
            }
            if !day.emotions.contains(&emotion) {
                day.emotions.push(emotion);
            }
        }
    }

    days.into_values().collect()
}

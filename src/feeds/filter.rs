use crate::tweet::Tweet;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone};
use std::fmt;
use std::str::FromStr;

/// Time window applied before sorting. Cutoffs are computed in the time zone
/// of `now`, so local midnight means the viewer's midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeWindow {
    #[default]
    All,
    Today,
    Week,
    Month,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
    MostLiked,
}

impl TimeWindow {
    pub const ALL: [TimeWindow; 4] = [
        TimeWindow::All,
        TimeWindow::Today,
        TimeWindow::Week,
        TimeWindow::Month,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TimeWindow::All => "All Time",
            TimeWindow::Today => "Today",
            TimeWindow::Week => "This Week",
            TimeWindow::Month => "This Month",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|w| *w == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Earliest timestamp (ms) kept by this window, or `None` for no filtering.
    pub fn cutoff<Tz: TimeZone>(self, now: &DateTime<Tz>) -> Option<i64> {
        let today = now.date_naive();
        let start = match self {
            TimeWindow::All => return None,
            TimeWindow::Today => today,
            TimeWindow::Week => {
                today - Duration::days(today.weekday().num_days_from_sunday() as i64)
            }
            TimeWindow::Month => today.with_day(1).unwrap_or(today),
        };
        Some(start_of_day(&now.timezone(), start))
    }
}

/// Local midnight in ms. On a DST gap with no midnight, the first valid
/// instant that day is used.
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> i64 {
    let mut naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    for _ in 0..4 {
        if let Some(dt) = tz.from_local_datetime(&naive).earliest() {
            return dt.timestamp_millis();
        }
        naive += Duration::minutes(30);
    }
    naive.and_utc().timestamp_millis()
}

impl SortOrder {
    pub const ALL: [SortOrder; 3] = [SortOrder::Newest, SortOrder::Oldest, SortOrder::MostLiked];

    pub fn label(self) -> &'static str {
        match self {
            SortOrder::Newest => "Newest First",
            SortOrder::Oldest => "Oldest First",
            SortOrder::MostLiked => "Most Liked",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Stable: equal keys keep their incoming order.
    pub fn sort(self, tweets: &mut [Tweet]) {
        match self {
            SortOrder::Newest => tweets.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
            SortOrder::Oldest => tweets.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
            SortOrder::MostLiked => tweets.sort_by(|a, b| b.likes.cmp(&a.likes)),
        }
    }
}

/// Filter by window, then sort.
pub fn apply<Tz: TimeZone>(
    tweets: &[Tweet],
    window: TimeWindow,
    sort: SortOrder,
    now: &DateTime<Tz>,
) -> Vec<Tweet> {
    let mut out: Vec<Tweet> = match window.cutoff(now) {
        Some(cutoff) => tweets
            .iter()
            .filter(|t| t.timestamp >= cutoff)
            .cloned()
            .collect(),
        None => tweets.to_vec(),
    };
    sort.sort(&mut out);
    out
}

impl FromStr for TimeWindow {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "all" => Ok(TimeWindow::All),
            "today" => Ok(TimeWindow::Today),
            "week" => Ok(TimeWindow::Week),
            "month" => Ok(TimeWindow::Month),
            _ => Err(anyhow!(
                "Invalid window '{s}'. Valid options: all, today, week, month"
            )),
        }
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeWindow::All => write!(f, "all"),
            TimeWindow::Today => write!(f, "today"),
            TimeWindow::Week => write!(f, "week"),
            TimeWindow::Month => write!(f, "month"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            "mostliked" | "most-liked" | "most_liked" => Ok(SortOrder::MostLiked),
            _ => Err(anyhow!(
                "Invalid sort '{s}'. Valid options: newest, oldest, mostLiked"
            )),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Newest => write!(f, "newest"),
            SortOrder::Oldest => write!(f, "oldest"),
            SortOrder::MostLiked => write!(f, "mostLiked"),
        }
    }
}

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First day of the week used to align week boundaries on the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeekStart {
    #[default]
    Mon,
    Sun,
}

impl WeekStart {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeekStart::Mon => "Mon",
            WeekStart::Sun => "Sun",
        }
    }

    /// Latest date on or before `date` that falls on this week start.
    pub fn start_of_week(&self, date: NaiveDate) -> NaiveDate {
        let offset = match self {
            WeekStart::Mon => date.weekday().num_days_from_monday(),
            WeekStart::Sun => date.weekday().num_days_from_sunday(),
        };
        date.checked_sub_signed(Duration::days(i64::from(offset)))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for WeekStart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeekStart {
    type Err = String;

    // Accepts the spellings people type into a settings sheet.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mon" | "monday" => Ok(WeekStart::Mon),
            "sun" | "sunday" => Ok(WeekStart::Sun),
            other => Err(format!("unknown week start '{other}' (expected Mon or Sun)")),
        }
    }
}

/// Inclusive-inclusive overlap: a task ending on day D overlaps one starting on D.
pub fn intervals_overlap(
    a_start: NaiveDate,
    a_end: NaiveDate,
    b_start: NaiveDate,
    b_end: NaiveDate,
) -> bool {
    a_start <= b_end && b_start <= a_end
}

pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn quarter_start(date: NaiveDate) -> NaiveDate {
    let first_month = ((date.month() - 1) / 3) * 3 + 1;
    NaiveDate::from_ymd_opt(date.year(), first_month, 1).unwrap_or(date)
}

pub fn year_start(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 1, 1).unwrap_or(date)
}

/// Calendar-month step. Only ever called with first-of-month dates by the
/// boundary iterators, so no day clamping happens there. `None` past the
/// last representable date.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

/// Day after `date`, saturating at the last representable date.
pub fn next_day(date: NaiveDate) -> NaiveDate {
    date.succ_opt().unwrap_or(date)
}

pub fn quarter_of(date: NaiveDate) -> u32 {
    (date.month() - 1) / 3 + 1
}

/// Number of distinct calendar months touched by the inclusive range `[start, end]`.
pub fn months_touched(start: NaiveDate, end: NaiveDate) -> i64 {
    let years = i64::from(end.year()) - i64::from(start.year());
    let months = i64::from(end.month()) - i64::from(start.month());
    years * 12 + months + 1
}

/// `num_days_from_ce` of 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Days since 1970-01-01; polars stores `Date` columns in this unit.
pub fn epoch_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn from_epoch_days(days: i32) -> Option<NaiveDate> {
    days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(NaiveDate::from_num_days_from_ce_opt)
}

/// Days since 1970-01-01, the unit plotting backends use for date axes.
pub fn date_to_x(date: NaiveDate) -> f64 {
    f64::from(epoch_days(date))
}

/// Horizontal extent of a block: `[start, end + 1 day)`, so a same-day task is one day wide.
pub fn block_span_inclusive(start: NaiveDate, end: NaiveDate) -> (f64, f64) {
    (date_to_x(start), date_to_x(end) + 1.0)
}

pub fn week_starts(start: NaiveDate, end: NaiveDate, week_start: WeekStart) -> Vec<NaiveDate> {
    let mut current = week_start.start_of_week(start);
    let mut out = Vec::new();
    while current <= end {
        out.push(current);
        match current.checked_add_signed(Duration::days(7)) {
            Some(next) => current = next,
            None => break,
        }
    }
    out
}

pub fn month_starts(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    stepped_months(month_start(start), end, 1)
}

pub fn quarter_starts(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    stepped_months(quarter_start(start), end, 3)
}

pub fn year_starts(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    stepped_months(year_start(start), end, 12)
}

fn stepped_months(first: NaiveDate, end: NaiveDate, step: u32) -> Vec<NaiveDate> {
    let mut current = first;
    let mut out = Vec::new();
    while current <= end {
        out.push(current);
        match add_months(current, step) {
            Some(next) => current = next,
            None => break,
        }
    }
    out
}

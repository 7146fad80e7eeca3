//! Picks the timeline granularity for an overall date range and builds the
//! axis ticks and labelled header rows.
//!
//! The span is measured as the number of calendar months the inclusive range
//! touches; thresholds are lower-inclusive:
//!
//! | months touched | granularity |
//! |---|---|
//! | < 4 | weeks (months as a secondary header) |
//! | 4 ..= 12 | months |
//! | 13 ..= 24 | quarters |
//! | > 24 | years + quarters |

use crate::dates::{self, WeekStart};
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimelineError {
    #[error("overall end date {end} must be after overall start date {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Weeks,
    Months,
    Quarters,
    YearsQuarters,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Weeks => "weeks",
            Granularity::Months => "months",
            Granularity::Quarters => "quarters",
            Granularity::YearsQuarters => "years_quarters",
        }
    }

    fn first_boundary(&self, start: NaiveDate, week_start: WeekStart) -> NaiveDate {
        match self {
            Granularity::Weeks => week_start.start_of_week(start),
            Granularity::Months => dates::month_start(start),
            Granularity::Quarters => dates::quarter_start(start),
            Granularity::YearsQuarters => dates::year_start(start),
        }
    }

    fn step(&self, boundary: NaiveDate) -> Option<NaiveDate> {
        match self {
            Granularity::Weeks => boundary.checked_add_signed(Duration::days(7)),
            Granularity::Months => dates::add_months(boundary, 1),
            Granularity::Quarters => dates::add_months(boundary, 3),
            Granularity::YearsQuarters => dates::add_months(boundary, 12),
        }
    }

    fn tick_label(&self, boundary: NaiveDate) -> String {
        match self {
            Granularity::Weeks => boundary.format("%d %b").to_string(),
            Granularity::Months => boundary.format("%b %Y").to_string(),
            Granularity::Quarters => {
                format!("Q{} {}", dates::quarter_of(boundary), boundary.year())
            }
            Granularity::YearsQuarters => boundary.year().to_string(),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TickKind {
    /// Start of a granularity unit (may precede the overall start).
    Boundary,
    /// Closing tick, clamped to the overall end date.
    End,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tick {
    pub date: NaiveDate,
    pub label: String,
    pub kind: TickKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderRowKind {
    Weeks,
    Months,
    Quarters,
    Years,
}

/// A labelled cell of a header row covering `[start, end_exclusive)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub start: NaiveDate,
    pub end_exclusive: NaiveDate,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRow {
    pub kind: HeaderRowKind,
    pub segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineScale {
    pub granularity: Granularity,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub week_start: WeekStart,
    pub ticks: Vec<Tick>,
    /// Header rows from top to bottom.
    pub rows: Vec<HeaderRow>,
}

pub fn choose_granularity(start: NaiveDate, end: NaiveDate) -> Granularity {
    let months = dates::months_touched(start, end);
    if months < 4 {
        Granularity::Weeks
    } else if months <= 12 {
        Granularity::Months
    } else if months <= 24 {
        Granularity::Quarters
    } else {
        Granularity::YearsQuarters
    }
}

pub fn select_scale(
    start: NaiveDate,
    end: NaiveDate,
    week_start: WeekStart,
) -> Result<TimelineScale, TimelineError> {
    if end <= start {
        return Err(TimelineError::InvalidRange { start, end });
    }

    let granularity = choose_granularity(start, end);
    let ticks = build_ticks(granularity, start, end, week_start);
    let rows = build_rows(granularity, start, end, week_start);
    debug!(
        %start,
        %end,
        granularity = granularity.as_str(),
        ticks = ticks.len(),
        "selected timeline scale"
    );

    Ok(TimelineScale {
        granularity,
        start,
        end,
        week_start,
        ticks,
        rows,
    })
}

fn build_ticks(
    granularity: Granularity,
    start: NaiveDate,
    end: NaiveDate,
    week_start: WeekStart,
) -> Vec<Tick> {
    let mut ticks = Vec::new();
    let mut boundary = granularity.first_boundary(start, week_start);
    while boundary < end {
        ticks.push(Tick {
            date: boundary,
            label: granularity.tick_label(boundary),
            kind: TickKind::Boundary,
        });
        match granularity.step(boundary) {
            Some(next) => boundary = next,
            None => break,
        }
    }
    ticks.push(Tick {
        date: end,
        label: end.format("%d %b %Y").to_string(),
        kind: TickKind::End,
    });
    ticks
}

fn build_rows(
    granularity: Granularity,
    start: NaiveDate,
    end: NaiveDate,
    week_start: WeekStart,
) -> Vec<HeaderRow> {
    match granularity {
        Granularity::Weeks => vec![
            month_row(start, end),
            week_row(start, end, week_start),
        ],
        Granularity::Months => vec![month_row(start, end)],
        Granularity::Quarters => vec![quarter_row(start, end, true)],
        Granularity::YearsQuarters => vec![year_row(start, end), quarter_row(start, end, false)],
    }
}

/// Contiguous cells between boundaries, clamped to `[start, end_exclusive)`.
fn segments_from_boundaries(
    boundaries: &[NaiveDate],
    start: NaiveDate,
    end_exclusive: NaiveDate,
) -> Vec<(NaiveDate, NaiveDate)> {
    let mut out = Vec::with_capacity(boundaries.len());
    for (idx, boundary) in boundaries.iter().enumerate() {
        let seg_start = (*boundary).max(start);
        let next = boundaries.get(idx + 1).copied().unwrap_or(end_exclusive);
        let seg_end = next.min(end_exclusive);
        if seg_end > seg_start {
            out.push((seg_start, seg_end));
        }
    }
    out
}

fn month_row(start: NaiveDate, end: NaiveDate) -> HeaderRow {
    let boundaries = dates::month_starts(start, end);
    let cells = segments_from_boundaries(&boundaries, start, dates::next_day(end));

    let mut segments = Vec::with_capacity(cells.len());
    let mut prev_year: Option<i32> = None;
    for (idx, (s, e)) in cells.into_iter().enumerate() {
        let include_year = idx == 0 || prev_year != Some(s.year()) || s.month() == 1;
        let label = if include_year {
            s.format("%b %Y").to_string()
        } else {
            s.format("%b").to_string()
        };
        segments.push(Segment {
            start: s,
            end_exclusive: e,
            label,
        });
        prev_year = Some(s.year());
    }
    HeaderRow {
        kind: HeaderRowKind::Months,
        segments,
    }
}

fn week_row(start: NaiveDate, end: NaiveDate, week_start: WeekStart) -> HeaderRow {
    let boundaries = dates::week_starts(start, end, week_start);
    let cells = segments_from_boundaries(&boundaries, start, dates::next_day(end));

    let mut segments = Vec::with_capacity(cells.len());
    let mut prev_month: Option<(i32, u32)> = None;
    for (idx, (s, e)) in cells.into_iter().enumerate() {
        let month = (s.year(), s.month());
        let include_month = idx == 0 || prev_month != Some(month);
        let label = if include_month {
            s.format("%d %b").to_string()
        } else {
            s.format("%d").to_string()
        };
        segments.push(Segment {
            start: s,
            end_exclusive: e,
            label,
        });
        prev_month = Some(month);
    }
    HeaderRow {
        kind: HeaderRowKind::Weeks,
        segments,
    }
}

fn quarter_row(start: NaiveDate, end: NaiveDate, include_year: bool) -> HeaderRow {
    let boundaries = dates::quarter_starts(start, end);
    let cells = segments_from_boundaries(&boundaries, start, dates::next_day(end));

    let mut segments = Vec::with_capacity(cells.len());
    let mut prev_year: Option<i32> = None;
    for (idx, (s, e)) in cells.into_iter().enumerate() {
        let quarter = dates::quarter_of(s);
        let with_year =
            include_year && (idx == 0 || quarter == 1 || prev_year != Some(s.year()));
        let label = if with_year {
            format!("Q{} {}", quarter, s.year())
        } else {
            format!("Q{}", quarter)
        };
        segments.push(Segment {
            start: s,
            end_exclusive: e,
            label,
        });
        prev_year = Some(s.year());
    }
    HeaderRow {
        kind: HeaderRowKind::Quarters,
        segments,
    }
}

fn year_row(start: NaiveDate, end: NaiveDate) -> HeaderRow {
    let boundaries = dates::year_starts(start, end);
    let segments = segments_from_boundaries(&boundaries, start, dates::next_day(end))
        .into_iter()
        .map(|(s, e)| Segment {
            start: s,
            end_exclusive: e,
            label: s.year().to_string(),
        })
        .collect();
    HeaderRow {
        kind: HeaderRowKind::Years,
        segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn segments_are_clamped_to_range() {
        let boundaries = vec![d(2026, 1, 1), d(2026, 2, 1), d(2026, 3, 1)];
        let cells = segments_from_boundaries(&boundaries, d(2026, 1, 15), d(2026, 3, 10));
        assert_eq!(
            cells,
            vec![
                (d(2026, 1, 15), d(2026, 2, 1)),
                (d(2026, 2, 1), d(2026, 3, 1)),
                (d(2026, 3, 1), d(2026, 3, 10)),
            ]
        );
    }

    #[test]
    fn ranges_ending_on_last_representable_date_do_not_overflow() {
        let end = NaiveDate::MAX;
        for days in [20, 200, 400, 1200] {
            let start = end - Duration::days(days);
            let scale = select_scale(start, end, WeekStart::Sun).unwrap();
            let last = scale.ticks.last().unwrap();
            assert_eq!(last.kind, TickKind::End);
            assert_eq!(last.date, end);
            for row in &scale.rows {
                assert_eq!(row.segments.first().unwrap().start, start);
                assert_eq!(row.segments.last().unwrap().end_exclusive, end);
            }
        }
    }

    #[test]
    fn month_labels_show_year_on_first_and_january() {
        let row = month_row(d(2025, 11, 10), d(2026, 2, 20));
        let labels: Vec<&str> = row.segments.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Nov 2025", "Dec", "Jan 2026", "Feb"]);
    }
}

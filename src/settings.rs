use crate::calculations::stacking::OverlapPolicy;
use crate::dates::WeekStart;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Chart-wide settings. The core algorithms only read the overall range,
/// `week_start_day` and `overlap_policy`; the rest is carried for renderers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub chart_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart_subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidentiality_label: Option<String>,
    pub overall_start_date: NaiveDate,
    pub overall_end_date: NaiveDate,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub week_start_day: WeekStart,
    #[serde(default = "default_true")]
    pub show_today_line: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub today_line_date: Option<NaiveDate>,
    #[serde(default)]
    pub include_out_of_range: bool,
    #[serde(default)]
    pub overlap_policy: OverlapPolicy,
}

fn default_timezone() -> String {
    "America/Chicago".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            chart_title: "Roadmap".to_string(),
            chart_subtitle: None,
            confidentiality_label: None,
            overall_start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            overall_end_date: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
            timezone: default_timezone(),
            week_start_day: WeekStart::Mon,
            show_today_line: true,
            today_line_date: None,
            include_out_of_range: false,
            overlap_policy: OverlapPolicy::TouchingOverlaps,
        }
    }
}

impl Settings {
    pub fn with_range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            overall_start_date: start,
            overall_end_date: end,
            ..Self::default()
        }
    }
}

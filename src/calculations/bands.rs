use crate::calculations::stacking::LaneAssignment;
use crate::workstream::Workstream;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_GROUP_GAP: f64 = 0.35;
pub const DEFAULT_MIN_ROWS: usize = 1;

/// Vertical extent of one workstream, in row units (one sublane = 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkstreamBand {
    pub workstream: String,
    pub y0: f64,
    pub y1: f64,
    pub rows: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutRow {
    pub workstream: String,
    pub sublane: usize,
    pub y0: f64,
    pub y1: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BandLayout {
    pub bands: Vec<WorkstreamBand>,
    pub rows: Vec<LayoutRow>,
    pub total_height: f64,
}

impl BandLayout {
    pub fn row(&self, workstream: &str, sublane: usize) -> Option<&LayoutRow> {
        self.rows
            .iter()
            .find(|row| row.workstream == workstream && row.sublane == sublane)
    }

    pub fn band(&self, workstream: &str) -> Option<&WorkstreamBand> {
        self.bands.iter().find(|band| band.workstream == workstream)
    }
}

/// Stacks workstream bands top to bottom in the given order. A workstream with
/// no tasks still gets `min_rows` rows so it stays visible.
pub fn compute_bands(
    workstreams: &[Workstream],
    lanes: &BTreeMap<String, LaneAssignment>,
    group_gap: f64,
    min_rows: usize,
) -> BandLayout {
    let mut y = 0.0;
    let mut bands = Vec::with_capacity(workstreams.len());
    let mut rows = Vec::new();

    for ws in workstreams {
        let used = lanes.get(&ws.name).map(LaneAssignment::max_lanes).unwrap_or(0);
        let count = used.max(min_rows);
        let band_y0 = y;
        for sublane in 0..count {
            rows.push(LayoutRow {
                workstream: ws.name.clone(),
                sublane,
                y0: y,
                y1: y + 1.0,
            });
            y += 1.0;
        }
        bands.push(WorkstreamBand {
            workstream: ws.name.clone(),
            y0: band_y0,
            y1: y,
            rows: count,
            color: ws.color.clone(),
        });
        y += group_gap;
    }

    let total_height = if bands.is_empty() {
        0.0
    } else {
        (y - group_gap).max(0.0)
    };
    if let Some(last) = bands.last_mut() {
        last.y1 = total_height;
    }

    BandLayout {
        bands,
        rows,
        total_height,
    }
}

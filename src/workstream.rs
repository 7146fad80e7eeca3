use serde::{Deserialize, Serialize};

/// A named horizontal band grouping related tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workstream {
    pub name: String,
    /// Sort key; smaller values are drawn higher on the chart.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Workstream {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            order: None,
            color: None,
        }
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// Display order: stable sort on `order`, where a workstream without one is
/// keyed by its input position.
pub fn ordered_workstreams(workstreams: &[Workstream]) -> Vec<Workstream> {
    let mut keyed: Vec<(i64, usize, &Workstream)> = workstreams
        .iter()
        .enumerate()
        .map(|(idx, ws)| (ws.order.unwrap_or(idx as i64), idx, ws))
        .collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    keyed.into_iter().map(|(_, _, ws)| ws.clone()).collect()
}

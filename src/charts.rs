use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geo::{GeoBoundaries, FEATURE_NAME_KEY};
use crate::types::{GrowthPoint, Insight, StateRanking, TransactionType, YearlyValue};

pub const NO_DATA: &str = "No data available.";
pub const NO_GROWTH_DATA: &str = "No user growth data available.";
pub const NO_GEO_DATA: &str = "No geographical data available.";

/// Renderer-agnostic chart description served to the dashboard frontend.
/// Every constructor degrades to `NoData` on an empty result set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChartSpec {
    Bar {
        title: String,
        x_title: String,
        y_title: String,
        labels: Vec<String>,
        values: Vec<f64>,
        color_by_value: bool,
    },
    Line {
        title: String,
        x_title: String,
        y_title: String,
        labels: Vec<String>,
        values: Vec<f64>,
        markers: bool,
    },
    Choropleth {
        title: String,
        feature_key: String,
        locations: Vec<String>,
        values: Vec<f64>,
        color_scale: String,
        fit_bounds: bool,
    },
    NoData {
        message: String,
    },
}

impl ChartSpec {
    pub fn no_data(message: impl Into<String>) -> Self {
        Self::NoData {
            message: message.into(),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData { .. })
    }
}

pub fn yearly_values_chart(rows: &[YearlyValue]) -> ChartSpec {
    if rows.is_empty() {
        return ChartSpec::no_data(NO_DATA);
    }
    ChartSpec::Bar {
        title: "Yearly Total Transaction Value".to_string(),
        x_title: "Year".to_string(),
        y_title: "Total Transaction Value".to_string(),
        labels: rows.iter().map(|row| row.year.to_string()).collect(),
        values: rows.iter().map(|row| row.total_value).collect(),
        color_by_value: false,
    }
}

pub fn user_growth_chart(rows: &[GrowthPoint]) -> ChartSpec {
    if rows.is_empty() {
        return ChartSpec::no_data(NO_GROWTH_DATA);
    }
    ChartSpec::Line {
        title: "User Growth Over Time".to_string(),
        x_title: "Period".to_string(),
        y_title: "Total Users".to_string(),
        labels: rows.iter().map(GrowthPoint::period).collect(),
        values: rows.iter().map(|row| row.total_users as f64).collect(),
        markers: true,
    }
}

pub fn ranking_chart(insight: &Insight, rows: &[StateRanking]) -> ChartSpec {
    if rows.is_empty() {
        return ChartSpec::no_data(NO_DATA);
    }
    ChartSpec::Bar {
        title: insight.title(),
        x_title: "State".to_string(),
        y_title: insight.metric.axis_title().to_string(),
        labels: rows.iter().map(|row| row.state.clone()).collect(),
        values: rows.iter().map(|row| row.total).collect(),
        color_by_value: true,
    }
}

pub fn type_count_chart(counts: &[(TransactionType, u64)]) -> ChartSpec {
    if counts.is_empty() {
        return ChartSpec::no_data(NO_DATA);
    }
    ChartSpec::Bar {
        title: "Transaction Count by Type".to_string(),
        x_title: "Transaction Type".to_string(),
        y_title: "Transaction Count".to_string(),
        labels: counts.iter().map(|(ty, _)| ty.to_string()).collect(),
        values: counts.iter().map(|(_, count)| *count as f64).collect(),
        color_by_value: false,
    }
}

/// Choropleth keyed by canonical state name. When the boundary document is
/// available, names it does not contain are logged; the renderer would drop
/// them silently otherwise.
pub fn choropleth_chart(
    totals: &BTreeMap<String, f64>,
    boundaries: Option<&GeoBoundaries>,
) -> ChartSpec {
    if totals.is_empty() {
        return ChartSpec::no_data(NO_GEO_DATA);
    }
    if let Some(boundaries) = boundaries {
        for name in totals.keys() {
            if !boundaries.contains_region(name) {
                debug!(region = %name, "aggregated state not present in boundary file");
            }
        }
    }
    ChartSpec::Choropleth {
        title: "Total Transaction Amount by State".to_string(),
        feature_key: FEATURE_NAME_KEY.to_string(),
        locations: totals.keys().cloned().collect(),
        values: totals.values().copied().collect(),
        color_scale: "Viridis".to_string(),
        fit_bounds: true,
    }
}

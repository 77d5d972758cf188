use std::collections::BTreeMap;

use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};

use crate::charts;
use crate::pages::Metric;
use crate::types::{GrowthPoint, Insight, StateRanking, TransactionType, YearlyValue};

fn base_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

pub fn render_yearly_table(rows: &[YearlyValue]) -> String {
    if rows.is_empty() {
        return charts::NO_DATA.to_string();
    }
    let mut table = base_table(vec!["Year", "Total Transaction Value"]);
    for row in rows {
        table.add_row(vec![row.year.to_string(), format!("{:.2}", row.total_value)]);
    }
    table.to_string()
}

pub fn render_growth_table(rows: &[GrowthPoint]) -> String {
    if rows.is_empty() {
        return charts::NO_GROWTH_DATA.to_string();
    }
    let mut table = base_table(vec!["Period", "Total Users"]);
    for row in rows {
        table.add_row(vec![row.period(), row.total_users.to_string()]);
    }
    table.to_string()
}

pub fn render_rankings_table(insight: &Insight, rows: &[StateRanking]) -> String {
    if rows.is_empty() {
        return charts::NO_DATA.to_string();
    }
    let mut table = base_table(vec!["Rank", "State", insight.metric.axis_title()]);
    for (index, row) in rows.iter().enumerate() {
        table.add_row(vec![
            (index + 1).to_string(),
            row.state.clone(),
            format!("{:.2}", row.total),
        ]);
    }
    table.to_string()
}

pub fn render_geo_table(totals: &BTreeMap<String, f64>) -> String {
    if totals.is_empty() {
        return charts::NO_GEO_DATA.to_string();
    }
    let mut table = base_table(vec!["State", "Total Transaction Amount"]);
    for (state, amount) in totals {
        table.add_row(vec![state.clone(), format!("{amount:.2}")]);
    }
    table.to_string()
}

pub fn render_metrics_table(metrics: &[Metric]) -> String {
    let mut table = base_table(vec!["Metric", "Value"]);
    for metric in metrics {
        table.add_row(vec![metric.label.clone(), metric.value.clone()]);
    }
    table.to_string()
}

pub fn render_type_counts_table(counts: &[(TransactionType, u64)]) -> String {
    if counts.is_empty() {
        return charts::NO_DATA.to_string();
    }
    let mut table = base_table(vec!["Transaction Type", "Transaction Count"]);
    for (ty, count) in counts {
        table.add_row(vec![ty.to_string(), count.to_string()]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_rows_render_the_placeholder() {
        assert_eq!(render_yearly_table(&[]), "No data available.");
        assert_eq!(render_growth_table(&[]), "No user growth data available.");
        assert_eq!(
            render_geo_table(&BTreeMap::new()),
            "No geographical data available."
        );
    }

    #[test]
    fn rankings_are_numbered_from_one() {
        let rows = vec![
            StateRanking {
                state: "maharashtra".into(),
                total: 200.0,
            },
            StateRanking {
                state: "karnataka".into(),
                total: 100.0,
            },
        ];
        let rendered = render_rankings_table(&Insight::default(), &rows);
        assert!(rendered.contains("maharashtra"));
        assert!(rendered.contains('1'));
        assert!(rendered.contains("Total Transaction Amount"));
    }
}

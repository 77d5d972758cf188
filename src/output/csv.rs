use std::collections::BTreeMap;

use anyhow::Result;

use crate::types::{GrowthPoint, StateRanking, YearlyValue};

pub fn yearly_to_csv(rows: &[YearlyValue]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["year", "total_value"])?;
    for row in rows {
        writer.write_record([row.year.to_string(), format!("{:.2}", row.total_value)])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn growth_to_csv(rows: &[GrowthPoint]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["period", "total_users"])?;
    for row in rows {
        writer.write_record([row.period(), row.total_users.to_string()])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn rankings_to_csv(rows: &[StateRanking]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["rank", "state", "total"])?;
    for (index, row) in rows.iter().enumerate() {
        writer.write_record([
            (index + 1).to_string(),
            row.state.clone(),
            format!("{:.2}", row.total),
        ])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn geo_to_csv(totals: &BTreeMap<String, f64>) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["state", "total_amount"])?;
    for (state, amount) in totals {
        writer.write_record([state.clone(), format!("{amount:.2}")])?;
    }
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rankings_csv_has_header_and_rows() {
        let rows = vec![StateRanking {
            state: "bihar".into(),
            total: 1000.0,
        }];
        let rendered = rankings_to_csv(&rows).unwrap();
        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some("rank,state,total"));
        assert_eq!(lines.next(), Some("1,bihar,1000.00"));
    }
}

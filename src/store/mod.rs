pub mod cache;
pub mod mysql;

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::query::TransactionFilter;
use crate::types::{
    GrowthPoint, RankMetric, RankOrder, StateRanking, StateTotal, TransactionFact, YearlyValue,
};

/// A fully materialized query result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Scalar>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl Scalar {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(value) => Some(*value as f64),
            Self::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }
}

/// The named read-only queries the dashboard issues against the fact tables.
#[async_trait]
pub trait Datastore: Send + Sync {
    async fn fetch_transactions(&self, filter: &TransactionFilter) -> Result<Vec<TransactionFact>>;
    async fn yearly_transaction_values(&self) -> Result<Vec<YearlyValue>>;
    async fn user_growth(&self) -> Result<Vec<GrowthPoint>>;
    async fn state_rankings(
        &self,
        metric: RankMetric,
        order: RankOrder,
        limit: u32,
    ) -> Result<Vec<StateRanking>>;
    async fn state_transaction_totals(&self, year: Option<u16>) -> Result<Vec<StateTotal>>;
    async fn distinct_states(&self) -> Result<Vec<String>>;
    async fn distinct_years(&self) -> Result<Vec<u16>>;
}

pub(crate) mod decode {
    use super::*;

    pub fn transaction_fact(row: &[Scalar]) -> Result<TransactionFact> {
        anyhow::ensure!(row.len() == 6, "expected 6 columns, got {}", row.len());
        Ok(TransactionFact {
            state: text(&row[0], "State")?,
            year: int(&row[1], "Year")? as u16,
            quarter: int(&row[2], "Quarter")? as u8,
            transaction_type: text(&row[3], "TransactionType")?
                .parse()
                .context("unrecognized TransactionType value")?,
            count: int(&row[4], "TransactionCount")? as u64,
            amount: float(&row[5], "TransactionAmount")?,
        })
    }

    pub fn yearly_value(row: &[Scalar]) -> Result<YearlyValue> {
        anyhow::ensure!(row.len() == 2, "expected 2 columns, got {}", row.len());
        Ok(YearlyValue {
            year: int(&row[0], "Year")? as u16,
            total_value: float(&row[1], "TotalValue")?,
        })
    }

    pub fn growth_point(row: &[Scalar]) -> Result<GrowthPoint> {
        anyhow::ensure!(row.len() == 3, "expected 3 columns, got {}", row.len());
        Ok(GrowthPoint {
            year: int(&row[0], "Year")? as u16,
            quarter: int(&row[1], "Quarter")? as u8,
            total_users: int(&row[2], "TotalUsers")? as u64,
        })
    }

    pub fn state_ranking(row: &[Scalar]) -> Result<StateRanking> {
        anyhow::ensure!(row.len() == 2, "expected 2 columns, got {}", row.len());
        Ok(StateRanking {
            state: text(&row[0], "State")?,
            total: float(&row[1], "ranking total")?,
        })
    }

    pub fn state_total(row: &[Scalar]) -> Result<StateTotal> {
        anyhow::ensure!(row.len() == 2, "expected 2 columns, got {}", row.len());
        Ok(StateTotal {
            state: text(&row[0], "State")?,
            total_amount: float(&row[1], "TotalAmount")?,
        })
    }

    pub fn single_text(row: &[Scalar]) -> Result<String> {
        anyhow::ensure!(!row.is_empty(), "expected at least 1 column");
        text(&row[0], "value")
    }

    pub fn single_year(row: &[Scalar]) -> Result<u16> {
        anyhow::ensure!(!row.is_empty(), "expected at least 1 column");
        Ok(int(&row[0], "Year")? as u16)
    }

    fn text(value: &Scalar, column: &str) -> Result<String> {
        value
            .as_str()
            .map(str::to_string)
            .with_context(|| format!("column {column} is not text: {value:?}"))
    }

    fn int(value: &Scalar, column: &str) -> Result<i64> {
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|v| v as i64))
            .with_context(|| format!("column {column} is not an integer: {value:?}"))
    }

    fn float(value: &Scalar, column: &str) -> Result<f64> {
        value
            .as_f64()
            .with_context(|| format!("column {column} is not numeric: {value:?}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_transaction_fact_row() {
        let row = vec![
            Scalar::Text("bihar".into()),
            Scalar::Int(2022),
            Scalar::Int(1),
            Scalar::Text("Merchant payments".into()),
            Scalar::Int(5),
            Scalar::Float(1000.0),
        ];
        let fact = decode::transaction_fact(&row).unwrap();
        assert_eq!(fact.state, "bihar");
        assert_eq!(fact.year, 2022);
        assert_eq!(fact.count, 5);
        assert_eq!(fact.amount, 1000.0);
    }

    #[test]
    fn integer_sums_decode_as_floats() {
        // SUM over an integer column can come back as either type.
        let row = vec![Scalar::Text("goa".into()), Scalar::Int(42)];
        let ranking = decode::state_ranking(&row).unwrap();
        assert_eq!(ranking.total, 42.0);
    }

    #[test]
    fn rejects_malformed_rows() {
        assert!(decode::yearly_value(&[Scalar::Int(2022)]).is_err());
        assert!(decode::state_total(&[Scalar::Null, Scalar::Float(1.0)]).is_err());
    }
}

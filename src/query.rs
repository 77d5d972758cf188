use std::fmt::Write as _;

use thiserror::Error;

use crate::types::{RankMetric, RankOrder, TransactionType};

/// A SQL statement with `?` placeholders and the values bound to them.
/// Filter values never end up in the statement text itself.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
}

impl SqlQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Memoization key: statement text plus rendered parameters. Two queries
    /// with identical text but different bindings must not share a cache slot.
    pub fn cache_key(&self) -> String {
        let mut key = self.sql.clone();
        for param in &self.params {
            match param {
                SqlParam::Text(value) => {
                    let _ = write!(key, "\u{1f}s:{value}");
                }
                SqlParam::Int(value) => {
                    let _ = write!(key, "\u{1f}i:{value}");
                }
            }
        }
        key
    }
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid year selection: {0}")]
    InvalidYear(String),
    #[error("invalid quarter selection: {0} (expected 1-4)")]
    InvalidQuarter(String),
    #[error(transparent)]
    InvalidTransactionType(#[from] crate::types::TypeParseError),
}

/// Optional equality filters over the transaction fact table. `None` means
/// the "All" selection for that column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionFilter {
    pub state: Option<String>,
    pub year: Option<u16>,
    pub quarter: Option<u8>,
    pub transaction_type: Option<TransactionType>,
}

impl TransactionFilter {
    /// Builds a filter from the dashboard's selection strings, where the
    /// literal "All" (any case) leaves a column unfiltered.
    pub fn from_selections(
        state: &str,
        year: &str,
        quarter: &str,
        transaction_type: &str,
    ) -> Result<Self, FilterError> {
        let mut filter = TransactionFilter::default();
        if !is_all(state) {
            filter.state = Some(state.trim().to_string());
        }
        if !is_all(year) {
            let parsed = year
                .trim()
                .parse::<u16>()
                .map_err(|_| FilterError::InvalidYear(year.to_string()))?;
            filter.year = Some(parsed);
        }
        if !is_all(quarter) {
            let parsed = quarter
                .trim()
                .parse::<u8>()
                .map_err(|_| FilterError::InvalidQuarter(quarter.to_string()))?;
            if !(1..=4).contains(&parsed) {
                return Err(FilterError::InvalidQuarter(quarter.to_string()));
            }
            filter.quarter = Some(parsed);
        }
        if !is_all(transaction_type) {
            filter.transaction_type = Some(transaction_type.parse()?);
        }
        Ok(filter)
    }

    pub fn is_unfiltered(&self) -> bool {
        self.state.is_none()
            && self.year.is_none()
            && self.quarter.is_none()
            && self.transaction_type.is_none()
    }
}

fn is_all(selection: &str) -> bool {
    selection.trim().eq_ignore_ascii_case("all")
}

pub fn filtered_transactions(filter: &TransactionFilter) -> SqlQuery {
    let mut sql = String::from(
        "SELECT State, Year, Quarter, TransactionType, TransactionCount, TransactionAmount \
         FROM aggregated_transaction",
    );
    let mut predicates: Vec<&str> = Vec::new();
    let mut params: Vec<SqlParam> = Vec::new();

    if let Some(state) = &filter.state {
        predicates.push("State = ?");
        params.push(SqlParam::Text(state.clone()));
    }
    if let Some(year) = filter.year {
        predicates.push("Year = ?");
        params.push(SqlParam::Int(i64::from(year)));
    }
    if let Some(quarter) = filter.quarter {
        predicates.push("Quarter = ?");
        params.push(SqlParam::Int(i64::from(quarter)));
    }
    if let Some(transaction_type) = filter.transaction_type {
        predicates.push("TransactionType = ?");
        params.push(SqlParam::Text(transaction_type.dataset_label().to_string()));
    }

    if !predicates.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&predicates.join(" AND "));
    }

    SqlQuery { sql, params }
}

pub fn yearly_transaction_values() -> SqlQuery {
    SqlQuery::new(
        "SELECT Year, SUM(TransactionAmount) AS TotalValue \
         FROM aggregated_transaction \
         GROUP BY Year \
         ORDER BY Year",
    )
}

pub fn user_growth() -> SqlQuery {
    SqlQuery::new(
        "SELECT Year, Quarter, SUM(RegisteredUsers) AS TotalUsers \
         FROM aggregated_user \
         GROUP BY Year, Quarter \
         ORDER BY Year, Quarter",
    )
}

pub fn state_rankings(metric: RankMetric, order: RankOrder, limit: u32) -> SqlQuery {
    let (table, column, alias) = match metric {
        RankMetric::Amount => ("aggregated_transaction", "TransactionAmount", "TotalAmount"),
        RankMetric::Users => ("aggregated_user", "RegisteredUsers", "TotalUsers"),
        RankMetric::Volume => ("aggregated_transaction", "TransactionCount", "TotalVolume"),
    };
    let direction = match order {
        RankOrder::Top => "DESC",
        RankOrder::Bottom => "ASC",
    };
    SqlQuery::new(format!(
        "SELECT State, SUM({column}) AS {alias} \
         FROM {table} \
         GROUP BY State \
         ORDER BY {alias} {direction} \
         LIMIT {limit}",
    ))
}

pub fn state_transaction_totals(year: Option<u16>) -> SqlQuery {
    let mut sql = String::from(
        "SELECT State, SUM(TransactionAmount) AS TotalAmount FROM aggregated_transaction",
    );
    let mut params = Vec::new();
    if let Some(year) = year {
        sql.push_str(" WHERE Year = ?");
        params.push(SqlParam::Int(i64::from(year)));
    }
    sql.push_str(" GROUP BY State");
    SqlQuery { sql, params }
}

pub fn distinct_states() -> SqlQuery {
    SqlQuery::new("SELECT DISTINCT State FROM aggregated_transaction ORDER BY State")
}

pub fn distinct_years() -> SqlQuery {
    SqlQuery::new("SELECT DISTINCT Year FROM aggregated_transaction ORDER BY Year")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_selections_build_unfiltered_query() {
        let filter = TransactionFilter::from_selections("All", "ALL", "all", "All").unwrap();
        assert!(filter.is_unfiltered());
        let query = filtered_transactions(&filter);
        assert!(!query.sql.contains("WHERE"));
        assert!(query.params.is_empty());
    }

    #[test]
    fn predicate_count_matches_selected_filters() {
        let cases: [(TransactionFilter, usize); 4] = [
            (
                TransactionFilter {
                    state: Some("bihar".into()),
                    ..Default::default()
                },
                1,
            ),
            (
                TransactionFilter {
                    state: Some("bihar".into()),
                    year: Some(2022),
                    ..Default::default()
                },
                2,
            ),
            (
                TransactionFilter {
                    year: Some(2022),
                    quarter: Some(1),
                    transaction_type: Some(TransactionType::Merchant),
                    ..Default::default()
                },
                3,
            ),
            (
                TransactionFilter {
                    state: Some("goa".into()),
                    year: Some(2021),
                    quarter: Some(4),
                    transaction_type: Some(TransactionType::Others),
                },
                4,
            ),
        ];
        for (filter, expected) in cases {
            let query = filtered_transactions(&filter);
            assert_eq!(query.sql.matches('?').count(), expected);
            assert_eq!(query.params.len(), expected);
            let joins = query.sql.matches(" AND ").count();
            assert_eq!(joins, expected - 1);
        }
    }

    #[test]
    fn filter_values_never_reach_statement_text() {
        let hostile = "bihar'; DROP TABLE aggregated_transaction; --";
        let filter = TransactionFilter {
            state: Some(hostile.to_string()),
            ..Default::default()
        };
        let query = filtered_transactions(&filter);
        assert!(!query.sql.contains(hostile));
        assert!(!query.sql.contains('\''));
        assert_eq!(query.params, vec![SqlParam::Text(hostile.to_string())]);
    }

    #[test]
    fn quarter_selection_validates_range() {
        assert!(TransactionFilter::from_selections("All", "All", "5", "All").is_err());
        assert!(TransactionFilter::from_selections("All", "All", "0", "All").is_err());
        assert!(TransactionFilter::from_selections("All", "All", "4", "All").is_ok());
    }

    #[test]
    fn year_selection_must_be_numeric() {
        assert!(TransactionFilter::from_selections("All", "twenty", "All", "All").is_err());
    }

    #[test]
    fn ranking_queries_cover_both_fact_tables() {
        let top = state_rankings(RankMetric::Amount, RankOrder::Top, 10);
        assert!(top.sql.contains("SUM(TransactionAmount)"));
        assert!(top.sql.contains("DESC"));
        assert!(top.sql.contains("LIMIT 10"));

        let bottom_users = state_rankings(RankMetric::Users, RankOrder::Bottom, 10);
        assert!(bottom_users.sql.contains("aggregated_user"));
        assert!(bottom_users.sql.contains("ASC"));
    }

    #[test]
    fn geo_totals_bind_the_year() {
        let all_years = state_transaction_totals(None);
        assert!(!all_years.sql.contains("WHERE"));
        assert!(all_years.params.is_empty());

        let one_year = state_transaction_totals(Some(2023));
        assert!(one_year.sql.contains("WHERE Year = ?"));
        assert!(one_year.sql.ends_with("GROUP BY State"));
        assert_eq!(one_year.params, vec![SqlParam::Int(2023)]);
    }

    #[test]
    fn cache_key_distinguishes_bindings() {
        let a = state_transaction_totals(Some(2022));
        let b = state_transaction_totals(Some(2023));
        assert_eq!(a.sql, b.sql);
        assert_ne!(a.cache_key(), b.cache_key());
    }
}

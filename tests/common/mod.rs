use std::collections::{BTreeMap, BTreeSet};

use anyhow::Result;
use async_trait::async_trait;
use pulse_insights::query::TransactionFilter;
use pulse_insights::store::Datastore;
use pulse_insights::types::{
    GrowthPoint, RankMetric, RankOrder, StateRanking, StateTotal, TransactionFact, TransactionType,
    UserFact, YearlyValue,
};

/// In-memory stand-in for the MySQL fact tables, aggregating with the same
/// semantics as the SQL views.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub transactions: Vec<TransactionFact>,
    pub users: Vec<UserFact>,
}

impl MemoryStore {
    pub fn new(transactions: Vec<TransactionFact>, users: Vec<UserFact>) -> Self {
        Self {
            transactions,
            users,
        }
    }
}

pub fn fact(
    state: &str,
    year: u16,
    quarter: u8,
    transaction_type: TransactionType,
    count: u64,
    amount: f64,
) -> TransactionFact {
    TransactionFact {
        state: state.to_string(),
        year,
        quarter,
        transaction_type,
        count,
        amount,
    }
}

pub fn user(state: &str, year: u16, quarter: u8, registered_users: u64) -> UserFact {
    UserFact {
        state: state.to_string(),
        year,
        quarter,
        registered_users,
    }
}

fn matches(fact: &TransactionFact, filter: &TransactionFilter) -> bool {
    filter.state.as_deref().is_none_or(|s| s == fact.state)
        && filter.year.is_none_or(|y| y == fact.year)
        && filter.quarter.is_none_or(|q| q == fact.quarter)
        && filter
            .transaction_type
            .is_none_or(|t| t == fact.transaction_type)
}

fn sorted_rankings(mut totals: Vec<StateRanking>, order: RankOrder, limit: u32) -> Vec<StateRanking> {
    totals.sort_by(|a, b| match order {
        RankOrder::Top => b
            .total
            .partial_cmp(&a.total)
            .unwrap()
            .then_with(|| a.state.cmp(&b.state)),
        RankOrder::Bottom => a
            .total
            .partial_cmp(&b.total)
            .unwrap()
            .then_with(|| a.state.cmp(&b.state)),
    });
    totals.truncate(limit as usize);
    totals
}

#[async_trait]
impl Datastore for MemoryStore {
    async fn fetch_transactions(&self, filter: &TransactionFilter) -> Result<Vec<TransactionFact>> {
        Ok(self
            .transactions
            .iter()
            .filter(|fact| matches(fact, filter))
            .cloned()
            .collect())
    }

    async fn yearly_transaction_values(&self) -> Result<Vec<YearlyValue>> {
        let mut by_year: BTreeMap<u16, f64> = BTreeMap::new();
        for fact in &self.transactions {
            *by_year.entry(fact.year).or_insert(0.0) += fact.amount;
        }
        Ok(by_year
            .into_iter()
            .map(|(year, total_value)| YearlyValue { year, total_value })
            .collect())
    }

    async fn user_growth(&self) -> Result<Vec<GrowthPoint>> {
        let mut by_period: BTreeMap<(u16, u8), u64> = BTreeMap::new();
        for user in &self.users {
            *by_period.entry((user.year, user.quarter)).or_insert(0) += user.registered_users;
        }
        Ok(by_period
            .into_iter()
            .map(|((year, quarter), total_users)| GrowthPoint {
                year,
                quarter,
                total_users,
            })
            .collect())
    }

    async fn state_rankings(
        &self,
        metric: RankMetric,
        order: RankOrder,
        limit: u32,
    ) -> Result<Vec<StateRanking>> {
        let mut by_state: BTreeMap<String, f64> = BTreeMap::new();
        match metric {
            RankMetric::Amount => {
                for fact in &self.transactions {
                    *by_state.entry(fact.state.clone()).or_insert(0.0) += fact.amount;
                }
            }
            RankMetric::Volume => {
                for fact in &self.transactions {
                    *by_state.entry(fact.state.clone()).or_insert(0.0) += fact.count as f64;
                }
            }
            RankMetric::Users => {
                for user in &self.users {
                    *by_state.entry(user.state.clone()).or_insert(0.0) +=
                        user.registered_users as f64;
                }
            }
        }
        let totals = by_state
            .into_iter()
            .map(|(state, total)| StateRanking { state, total })
            .collect();
        Ok(sorted_rankings(totals, order, limit))
    }

    async fn state_transaction_totals(&self, year: Option<u16>) -> Result<Vec<StateTotal>> {
        let mut by_state: BTreeMap<String, f64> = BTreeMap::new();
        for fact in &self.transactions {
            if year.is_none_or(|y| y == fact.year) {
                *by_state.entry(fact.state.clone()).or_insert(0.0) += fact.amount;
            }
        }
        Ok(by_state
            .into_iter()
            .map(|(state, total_amount)| StateTotal {
                state,
                total_amount,
            })
            .collect())
    }

    async fn distinct_states(&self) -> Result<Vec<String>> {
        let states: BTreeSet<String> = self
            .transactions
            .iter()
            .map(|fact| fact.state.clone())
            .collect();
        Ok(states.into_iter().collect())
    }

    async fn distinct_years(&self) -> Result<Vec<u16>> {
        let years: BTreeSet<u16> = self.transactions.iter().map(|fact| fact.year).collect();
        Ok(years.into_iter().collect())
    }
}

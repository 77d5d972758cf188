use std::collections::BTreeMap;

use crate::types::{FilterSummary, TransactionFact, TransactionType};

/// Summary metrics shown above the filtered-transactions chart. An empty
/// result set yields zeroes rather than an error.
pub fn summarize(facts: &[TransactionFact]) -> FilterSummary {
    let total_transactions: u64 = facts.iter().map(|fact| fact.count).sum();
    let total_amount: f64 = facts.iter().map(|fact| fact.amount).sum();
    let average_amount = if facts.is_empty() {
        0.0
    } else {
        total_amount / facts.len() as f64
    };
    FilterSummary {
        total_transactions,
        average_amount,
        total_amount,
    }
}

/// Transaction counts summed per type, in the fixed type order. Types with
/// no rows are omitted.
pub fn count_by_type(facts: &[TransactionFact]) -> Vec<(TransactionType, u64)> {
    let mut totals: BTreeMap<TransactionType, u64> = BTreeMap::new();
    for fact in facts {
        *totals.entry(fact.transaction_type).or_insert(0) += fact.count;
    }
    totals.into_iter().collect()
}

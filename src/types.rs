use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    RechargeAndBills,
    PeerToPeer,
    Merchant,
    FinancialServices,
    Others,
}

impl TransactionType {
    pub const ALL: [TransactionType; 5] = [
        TransactionType::RechargeAndBills,
        TransactionType::PeerToPeer,
        TransactionType::Merchant,
        TransactionType::FinancialServices,
        TransactionType::Others,
    ];

    /// The exact string stored in the TransactionType column.
    pub fn dataset_label(&self) -> &'static str {
        match self {
            Self::RechargeAndBills => "Recharge & bill payments",
            Self::PeerToPeer => "Peer-to-peer payments",
            Self::Merchant => "Merchant payments",
            Self::FinancialServices => "Financial Services",
            Self::Others => "Others",
        }
    }
}

impl Display for TransactionType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.dataset_label())
    }
}

#[derive(Debug, Error)]
#[error("unknown transaction type: {0}")]
pub struct TypeParseError(pub String);

impl FromStr for TransactionType {
    type Err = TypeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "recharge & bill payments" | "recharge-and-bill-payments" | "recharge" => {
                Ok(Self::RechargeAndBills)
            }
            "peer-to-peer payments" | "peer-to-peer" | "p2p" => Ok(Self::PeerToPeer),
            "merchant payments" | "merchant" => Ok(Self::Merchant),
            "financial services" | "financial-services" => Ok(Self::FinancialServices),
            "others" | "other" => Ok(Self::Others),
            _ => Err(TypeParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    Amount,
    Users,
    Volume,
}

impl RankMetric {
    pub const ALL: [RankMetric; 3] = [RankMetric::Amount, RankMetric::Users, RankMetric::Volume];

    pub fn title_phrase(&self) -> &'static str {
        match self {
            Self::Amount => "Transaction Amount",
            Self::Users => "Users",
            Self::Volume => "Transaction Volume",
        }
    }

    pub fn axis_title(&self) -> &'static str {
        match self {
            Self::Amount => "Total Transaction Amount",
            Self::Users => "Total Number of Users",
            Self::Volume => "Total Transaction Volume",
        }
    }
}

impl Display for RankMetric {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title_phrase())
    }
}

#[derive(Debug, Error)]
#[error("unknown ranking metric: {0}")]
pub struct MetricParseError(pub String);

impl FromStr for RankMetric {
    type Err = MetricParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "amount" | "transaction-amount" => Ok(Self::Amount),
            "users" | "total-users" => Ok(Self::Users),
            "volume" | "transaction-volume" | "count" => Ok(Self::Volume),
            _ => Err(MetricParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RankOrder {
    Top,
    Bottom,
}

impl RankOrder {
    pub fn title_word(&self) -> &'static str {
        match self {
            Self::Top => "Top",
            Self::Bottom => "Least",
        }
    }
}

impl Display for RankOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title_word())
    }
}

#[derive(Debug, Error)]
#[error("unknown ranking order: {0}")]
pub struct OrderParseError(pub String);

impl FromStr for RankOrder {
    type Err = OrderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "top" | "desc" => Ok(Self::Top),
            "least" | "bottom" | "asc" => Ok(Self::Bottom),
            _ => Err(OrderParseError(s.to_string())),
        }
    }
}

/// One of the six selectable ranking views on the top-data page.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Insight {
    pub metric: RankMetric,
    pub order: RankOrder,
}

impl Insight {
    pub fn title(&self) -> String {
        format!(
            "{} 10 States by {}",
            self.order.title_word(),
            self.metric.title_phrase()
        )
    }
}

impl Default for Insight {
    fn default() -> Self {
        Self {
            metric: RankMetric::Amount,
            order: RankOrder::Top,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionFact {
    pub state: String,
    pub year: u16,
    pub quarter: u8,
    pub transaction_type: TransactionType,
    pub count: u64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserFact {
    pub state: String,
    pub year: u16,
    pub quarter: u8,
    pub registered_users: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct YearlyValue {
    pub year: u16,
    pub total_value: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthPoint {
    pub year: u16,
    pub quarter: u8,
    pub total_users: u64,
}

impl GrowthPoint {
    pub fn period(&self) -> String {
        format!("{} Q{}", self.year, self.quarter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateRanking {
    pub state: String,
    pub total: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTotal {
    pub state: String,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilterSummary {
    pub total_transactions: u64,
    pub average_amount: f64,
    pub total_amount: f64,
}

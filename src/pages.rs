use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Mutex;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::charts::{self, ChartSpec};
use crate::geo::{self, GeoBoundaries};
use crate::query::TransactionFilter;
use crate::store::Datastore;
use crate::types::Insight;
use crate::views;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    #[default]
    Overview,
    TransactionAnalysis,
    GeographicalInsights,
    TopDataInsights,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Page::Overview,
        Page::TransactionAnalysis,
        Page::GeographicalInsights,
        Page::TopDataInsights,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::TransactionAnalysis => "transaction-analysis",
            Self::GeographicalInsights => "geographical-insights",
            Self::TopDataInsights => "top-data-insights",
        }
    }
}

impl Display for Page {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Overview => "Overview",
            Self::TransactionAnalysis => "Transaction Analysis",
            Self::GeographicalInsights => "Geographical Insights",
            Self::TopDataInsights => "Top Data Insights",
        };
        write!(f, "{display}")
    }
}

#[derive(Debug, Error)]
#[error("unknown page: {0}")]
pub struct PageParseError(pub String);

impl FromStr for Page {
    type Err = PageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '_'], "-");
        match normalized.as_str() {
            "overview" => Ok(Self::Overview),
            "transaction-analysis" => Ok(Self::TransactionAnalysis),
            "geographical-insights" => Ok(Self::GeographicalInsights),
            "top-data-insights" => Ok(Self::TopDataInsights),
            _ => Err(PageParseError(s.to_string())),
        }
    }
}

/// Navigation state for one interactive session. Owned by the caller and
/// passed around explicitly; never stored as a process-global.
#[derive(Debug, Clone, Default)]
pub struct Session {
    current: Page,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Page {
        self.current
    }

    pub fn navigate(&mut self, page: Page) {
        self.current = page;
    }
}

/// Server-side session table. Sessions the registry has never seen start on
/// the overview page.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self, session_id: &str) -> Page {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .get(session_id)
            .map(Session::current)
            .unwrap_or_default()
    }

    pub fn navigate(&self, session_id: &str, page: Page) {
        self.sessions
            .lock()
            .expect("session registry mutex poisoned")
            .entry(session_id.to_string())
            .or_default()
            .navigate(page);
    }
}

/// Per-render inputs gathered from the filter form and selectors.
#[derive(Debug, Clone, Default)]
pub struct PageRequest {
    pub filter: TransactionFilter,
    pub geo_year: Option<u16>,
    pub insight: Insight,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metric {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageView {
    pub page: Page,
    pub title: String,
    pub rendered_at: DateTime<Utc>,
    pub metrics: Vec<Metric>,
    pub charts: Vec<ChartSpec>,
}

pub async fn render_page(
    store: &dyn Datastore,
    boundaries: Option<&GeoBoundaries>,
    page: Page,
    request: &PageRequest,
) -> Result<PageView> {
    match page {
        Page::Overview => render_overview(store).await,
        Page::TransactionAnalysis => render_transaction_analysis(store, &request.filter).await,
        Page::GeographicalInsights => {
            render_geographical_insights(store, boundaries, request.geo_year).await
        }
        Page::TopDataInsights => render_top_data_insights(store, &request.insight).await,
    }
}

async fn render_overview(store: &dyn Datastore) -> Result<PageView> {
    let yearly = store.yearly_transaction_values().await?;
    let growth = store.user_growth().await?;
    Ok(PageView {
        page: Page::Overview,
        title: "Overview of Pulse Transactions".to_string(),
        rendered_at: Utc::now(),
        metrics: Vec::new(),
        charts: vec![
            charts::yearly_values_chart(&yearly),
            charts::user_growth_chart(&growth),
        ],
    })
}

/// The metric trio shown above the filtered-transactions chart.
pub fn summary_metrics(summary: &crate::types::FilterSummary) -> Vec<Metric> {
    vec![
        Metric {
            label: "Total Transactions".to_string(),
            value: summary.total_transactions.to_string(),
        },
        Metric {
            label: "Average Transaction Amount".to_string(),
            value: format!("₹{:.2}", summary.average_amount),
        },
        Metric {
            label: "Total Transaction Amount".to_string(),
            value: format!("₹{:.2}", summary.total_amount),
        },
    ]
}

async fn render_transaction_analysis(
    store: &dyn Datastore,
    filter: &TransactionFilter,
) -> Result<PageView> {
    let facts = store.fetch_transactions(filter).await?;
    let summary = views::summarize(&facts);
    let counts = views::count_by_type(&facts);
    Ok(PageView {
        page: Page::TransactionAnalysis,
        title: "Detailed Transaction Analysis".to_string(),
        rendered_at: Utc::now(),
        metrics: summary_metrics(&summary),
        charts: vec![charts::type_count_chart(&counts)],
    })
}

async fn render_geographical_insights(
    store: &dyn Datastore,
    boundaries: Option<&GeoBoundaries>,
    year: Option<u16>,
) -> Result<PageView> {
    let totals = geo::aggregate_by_state(store, year).await?;
    Ok(PageView {
        page: Page::GeographicalInsights,
        title: "Geographical Insights".to_string(),
        rendered_at: Utc::now(),
        metrics: Vec::new(),
        charts: vec![charts::choropleth_chart(&totals, boundaries)],
    })
}

async fn render_top_data_insights(store: &dyn Datastore, insight: &Insight) -> Result<PageView> {
    let rankings = store
        .state_rankings(insight.metric, insight.order, 10)
        .await?;
    Ok(PageView {
        page: Page::TopDataInsights,
        title: "Top Data Insights".to_string(),
        rendered_at: Utc::now(),
        metrics: Vec::new(),
        charts: vec![charts::ranking_chart(insight, &rankings)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sessions_start_on_overview() {
        let session = Session::new();
        assert_eq!(session.current(), Page::Overview);

        let registry = SessionRegistry::new();
        assert_eq!(registry.current("nobody"), Page::Overview);
    }

    #[test]
    fn navigation_persists_within_a_session() {
        let registry = SessionRegistry::new();
        registry.navigate("a", Page::GeographicalInsights);
        assert_eq!(registry.current("a"), Page::GeographicalInsights);
        // Other sessions are unaffected.
        assert_eq!(registry.current("b"), Page::Overview);
    }

    #[test]
    fn page_parses_slugs_and_display_names() {
        for page in Page::ALL {
            assert_eq!(page.as_slug().parse::<Page>().unwrap(), page);
            assert_eq!(page.to_string().parse::<Page>().unwrap(), page);
        }
        assert!("settings".parse::<Page>().is_err());
    }
}

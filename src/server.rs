use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::config::Config;
use crate::geo::GeoBoundaries;
use crate::pages::{render_page, Page, PageRequest, PageView, SessionRegistry};
use crate::query::TransactionFilter;
use crate::store::cache::QueryCache;
use crate::store::mysql::MysqlStore;
use crate::store::Datastore;
use crate::types::{Insight, TransactionType};

#[derive(Clone)]
struct ApiState {
    config: Config,
    store: Arc<MysqlStore>,
    boundaries: Option<Arc<GeoBoundaries>>,
    sessions: Arc<SessionRegistry>,
}

#[derive(Debug, Serialize)]
struct ApiResponse<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Debug, Serialize)]
struct ApiErrorBody {
    ok: bool,
    error: String,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal(error: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ApiErrorBody {
            ok: false,
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<ApiResponse<T>>, ApiError>;

#[derive(Debug, Clone, Default, Deserialize)]
struct RenderQuery {
    session: Option<String>,
    state: Option<String>,
    year: Option<String>,
    quarter: Option<String>,
    transaction_type: Option<String>,
    metric: Option<String>,
    order: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct NavigateRequest {
    session: String,
    page: String,
}

#[derive(Debug, Serialize)]
struct NavigateResponse {
    session: String,
    page: Page,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct FiltersResponse {
    states: Vec<String>,
    years: Vec<u16>,
    quarters: [u8; 4],
    transaction_types: Vec<&'static str>,
}

pub async fn run_server(config: Config, bind: SocketAddr) -> Result<()> {
    let boundaries = match GeoBoundaries::load(&config.resolved_boundaries_path()) {
        Ok(boundaries) => Some(Arc::new(boundaries)),
        Err(err) => {
            warn!("boundary file unavailable, choropleth disabled: {err:#}");
            None
        }
    };
    let cache = QueryCache::new(
        Duration::from_secs(config.cache.ttl_secs),
        config.cache.max_entries,
    );
    let state = ApiState {
        store: Arc::new(MysqlStore::new(config.database.connection_url(), cache)),
        boundaries,
        sessions: Arc::new(SessionRegistry::new()),
        config,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(health))
        .route("/v1/filters", get(filters))
        .route("/v1/overview", get(overview))
        .route("/v1/transactions", get(transactions))
        .route("/v1/geo", get(geo))
        .route("/v1/insights", get(insights))
        .route("/v1/navigate", post(navigate))
        .route("/v1/page", get(page))
        .route("/v1/boundaries", get(boundaries_document))
        .route("/v1/config", get(show_config))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("dashboard API listening on http://{bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<ApiResponse<HealthResponse>> {
    ok(HealthResponse { status: "ok" })
}

async fn filters(State(state): State<ApiState>) -> ApiResult<FiltersResponse> {
    let states = state
        .store
        .distinct_states()
        .await
        .map_err(ApiError::internal)?;
    let years = state
        .store
        .distinct_years()
        .await
        .map_err(ApiError::internal)?;
    Ok(ok(FiltersResponse {
        states,
        years,
        quarters: [1, 2, 3, 4],
        transaction_types: TransactionType::ALL
            .iter()
            .map(TransactionType::dataset_label)
            .collect(),
    }))
}

async fn overview(State(state): State<ApiState>) -> ApiResult<PageView> {
    render(&state, Page::Overview, &PageRequest::default()).await
}

async fn transactions(
    State(state): State<ApiState>,
    Query(query): Query<RenderQuery>,
) -> ApiResult<PageView> {
    let request = page_request(&query)?;
    render(&state, Page::TransactionAnalysis, &request).await
}

async fn geo(
    State(state): State<ApiState>,
    Query(query): Query<RenderQuery>,
) -> ApiResult<PageView> {
    let request = page_request(&query)?;
    render(&state, Page::GeographicalInsights, &request).await
}

async fn insights(
    State(state): State<ApiState>,
    Query(query): Query<RenderQuery>,
) -> ApiResult<PageView> {
    let request = page_request(&query)?;
    render(&state, Page::TopDataInsights, &request).await
}

async fn navigate(
    State(state): State<ApiState>,
    Json(request): Json<NavigateRequest>,
) -> ApiResult<NavigateResponse> {
    let page: Page = request
        .page
        .parse()
        .map_err(|err: crate::pages::PageParseError| ApiError::bad_request(err.to_string()))?;
    state.sessions.navigate(&request.session, page);
    Ok(ok(NavigateResponse {
        session: request.session,
        page,
    }))
}

/// Renders whichever page the session last navigated to; sessions the
/// registry has never seen get the overview.
async fn page(
    State(state): State<ApiState>,
    Query(query): Query<RenderQuery>,
) -> ApiResult<PageView> {
    let session = query.session.clone().unwrap_or_default();
    let current = state.sessions.current(&session);
    let request = page_request(&query)?;
    render(&state, current, &request).await
}

async fn boundaries_document(
    State(state): State<ApiState>,
) -> ApiResult<serde_json::Value> {
    let boundaries = state
        .boundaries
        .as_ref()
        .ok_or_else(|| ApiError::bad_request("no boundary file configured"))?;
    Ok(ok(boundaries.document().clone()))
}

async fn show_config(State(state): State<ApiState>) -> Json<ApiResponse<Config>> {
    ok(state.config.redacted())
}

fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { ok: true, data })
}

async fn render(state: &ApiState, page: Page, request: &PageRequest) -> ApiResult<PageView> {
    let view = render_page(
        state.store.as_ref(),
        state.boundaries.as_deref(),
        page,
        request,
    )
    .await
    .map_err(ApiError::internal)?;
    Ok(ok(view))
}

fn page_request(query: &RenderQuery) -> std::result::Result<PageRequest, ApiError> {
    let filter = TransactionFilter::from_selections(
        query.state.as_deref().unwrap_or("All"),
        query.year.as_deref().unwrap_or("All"),
        query.quarter.as_deref().unwrap_or("All"),
        query.transaction_type.as_deref().unwrap_or("All"),
    )
    .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let mut insight = Insight::default();
    if let Some(metric) = &query.metric {
        insight.metric = metric
            .parse()
            .map_err(|err: crate::types::MetricParseError| ApiError::bad_request(err.to_string()))?;
    }
    if let Some(order) = &query.order {
        insight.order = order
            .parse()
            .map_err(|err: crate::types::OrderParseError| ApiError::bad_request(err.to_string()))?;
    }

    Ok(PageRequest {
        geo_year: filter.year,
        filter,
        insight,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_request_defaults_to_all_filters() {
        let request = page_request(&RenderQuery::default()).expect("default query must parse");
        assert!(request.filter.is_unfiltered());
        assert_eq!(request.insight, Insight::default());
        assert_eq!(request.geo_year, None);
    }

    #[test]
    fn page_request_rejects_bad_selections() {
        let query = RenderQuery {
            quarter: Some("7".into()),
            ..Default::default()
        };
        assert!(page_request(&query).is_err());

        let query = RenderQuery {
            metric: Some("revenue".into()),
            ..Default::default()
        };
        assert!(page_request(&query).is_err());
    }

    #[test]
    fn page_request_threads_the_year_into_geo() {
        let query = RenderQuery {
            year: Some("2022".into()),
            ..Default::default()
        };
        let request = page_request(&query).unwrap();
        assert_eq!(request.geo_year, Some(2022));
        assert_eq!(request.filter.year, Some(2022));
    }
}

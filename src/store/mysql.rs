use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlConnection, MySqlRow};
use sqlx::{Column, Connection, Row};
use tracing::warn;

use crate::query::{self, SqlParam, SqlQuery, TransactionFilter};
use crate::store::cache::QueryCache;
use crate::store::{decode, Datastore, Scalar, Table};
use crate::types::{
    GrowthPoint, RankMetric, RankOrder, StateRanking, StateTotal, TransactionFact, YearlyValue,
};

/// Data access layer over the MySQL fact tables. Each execution opens a
/// fresh connection, materializes the full result set, and closes the
/// connection whether or not the query succeeded.
pub struct MysqlStore {
    url: String,
    cache: QueryCache,
}

impl MysqlStore {
    pub fn new(url: impl Into<String>, cache: QueryCache) -> Self {
        Self {
            url: url.into(),
            cache,
        }
    }

    pub async fn execute(&self, query: &SqlQuery) -> Result<Arc<Table>> {
        let key = query.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let mut conn = MySqlConnection::connect(&self.url)
            .await
            .context("failed connecting to MySQL")?;
        let fetched = fetch_table(&mut conn, query).await;
        if let Err(err) = conn.close().await {
            warn!("failed closing MySQL connection: {err}");
        }
        let table = Arc::new(fetched?);
        self.cache.put(key, table.clone());
        Ok(table)
    }

    async fn fetch_rows<T>(
        &self,
        query: &SqlQuery,
        decode_row: fn(&[Scalar]) -> Result<T>,
    ) -> Result<Vec<T>> {
        let table = self.execute(query).await?;
        table.rows.iter().map(|row| decode_row(row)).collect()
    }
}

async fn fetch_table(conn: &mut MySqlConnection, query: &SqlQuery) -> Result<Table> {
    let mut prepared = sqlx::query(&query.sql);
    for param in &query.params {
        prepared = match param {
            SqlParam::Text(value) => prepared.bind(value.as_str()),
            SqlParam::Int(value) => prepared.bind(*value),
        };
    }
    let rows = prepared
        .fetch_all(conn)
        .await
        .with_context(|| format!("query failed: {}", query.sql))?;

    let columns = rows
        .first()
        .map(|row| {
            row.columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect()
        })
        .unwrap_or_default();
    let rows = rows
        .iter()
        .map(|row| (0..row.columns().len()).map(|i| decode_scalar(row, i)).collect())
        .collect();
    Ok(Table { columns, rows })
}

fn decode_scalar(row: &MySqlRow, index: usize) -> Scalar {
    if let Ok(value) = row.try_get::<Option<i64>, _>(index) {
        return value.map(Scalar::Int).unwrap_or(Scalar::Null);
    }
    if let Ok(value) = row.try_get::<Option<u64>, _>(index) {
        return value.map(|v| Scalar::Int(v as i64)).unwrap_or(Scalar::Null);
    }
    if let Ok(value) = row.try_get::<Option<f64>, _>(index) {
        return value.map(Scalar::Float).unwrap_or(Scalar::Null);
    }
    // SUM() over DECIMAL and integer columns comes back as DECIMAL.
    if let Ok(value) = row.try_get::<Option<Decimal>, _>(index) {
        return value
            .and_then(|v| v.to_f64())
            .map(Scalar::Float)
            .unwrap_or(Scalar::Null);
    }
    if let Ok(value) = row.try_get::<Option<String>, _>(index) {
        return value.map(Scalar::Text).unwrap_or(Scalar::Null);
    }
    Scalar::Null
}

#[async_trait]
impl Datastore for MysqlStore {
    async fn fetch_transactions(&self, filter: &TransactionFilter) -> Result<Vec<TransactionFact>> {
        self.fetch_rows(&query::filtered_transactions(filter), decode::transaction_fact)
            .await
    }

    async fn yearly_transaction_values(&self) -> Result<Vec<YearlyValue>> {
        self.fetch_rows(&query::yearly_transaction_values(), decode::yearly_value)
            .await
    }

    async fn user_growth(&self) -> Result<Vec<GrowthPoint>> {
        self.fetch_rows(&query::user_growth(), decode::growth_point)
            .await
    }

    async fn state_rankings(
        &self,
        metric: RankMetric,
        order: RankOrder,
        limit: u32,
    ) -> Result<Vec<StateRanking>> {
        self.fetch_rows(
            &query::state_rankings(metric, order, limit),
            decode::state_ranking,
        )
        .await
    }

    async fn state_transaction_totals(&self, year: Option<u16>) -> Result<Vec<StateTotal>> {
        self.fetch_rows(&query::state_transaction_totals(year), decode::state_total)
            .await
    }

    async fn distinct_states(&self) -> Result<Vec<String>> {
        self.fetch_rows(&query::distinct_states(), decode::single_text)
            .await
    }

    async fn distinct_years(&self) -> Result<Vec<u16>> {
        self.fetch_rows(&query::distinct_years(), decode::single_year)
            .await
    }
}

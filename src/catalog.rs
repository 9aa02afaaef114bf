//! Read-only access to the PostgreSQL catalog and statistics views, plus
//! direct execution of caller-supplied SQL. The SQL issued here is a fixed
//! contract: information_schema for columns, pg_indexes / pg_constraint for
//! structure, pg_stat_statements / pg_stat_activity / pg_class for runtime
//! statistics. System schemas (pg_catalog, information_schema) are excluded
//! everywhere.

use serde::Serialize;
use tokio_postgres::{Client, NoTls, SimpleQueryMessage};
use tracing::{debug, info};

use crate::config::DbConfig;
use crate::error::{Error, Result};

/// One (schema, table, column, type) row, ordered by ordinal position.
#[derive(Debug, Clone)]
pub struct ColumnRow {
    pub schema: String,
    pub table: String,
    pub column: String,
    pub data_type: String,
}

/// One row per index from pg_indexes.
#[derive(Debug, Clone, Serialize)]
pub struct IndexRow {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub definition: String,
}

impl IndexRow {
    pub fn qualified_table(&self) -> String {
        format!("{}.{}", self.schema, self.table)
    }
}

/// One row per constraint from pg_constraint.
#[derive(Debug, Clone)]
pub struct ConstraintRow {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub kind: String,
    pub definition: String,
}

/// One pg_stat_statements row.
#[derive(Debug, Clone, Serialize)]
pub struct SlowQuery {
    pub query: String,
    pub calls: i64,
    pub mean_time: f64,
    pub total_time: f64,
}

/// One active pg_stat_activity row; duration is pre-formatted HH:MM:SS.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveSession {
    pub pid: i32,
    pub user: Option<String>,
    pub query: String,
    pub state: String,
    pub duration: String,
}

/// Owns the single database session for the lifetime of the process.
pub struct Catalog {
    client: Client,
}

impl Catalog {
    /// Connect and spawn the connection driver task. Fatal on failure.
    pub async fn connect(cfg: &DbConfig) -> Result<Self> {
        let (client, connection) = tokio_postgres::connect(&cfg.conn_string(), NoTls)
            .await
            .map_err(Error::Connection)?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("database connection task ended: {}", e);
            }
        });
        info!("connected to postgres at {}:{}/{}", cfg.host, cfg.port, cfg.dbname);
        Ok(Self { client })
    }

    /// Column rows for all base tables outside system schemas, ordered by
    /// (schema, table, ordinal position).
    pub async fn fetch_columns(&self) -> Result<Vec<ColumnRow>> {
        let rows = self
            .client
            .query(
                "SELECT t.table_schema, t.table_name, c.column_name, c.data_type \
                 FROM information_schema.tables t \
                 JOIN information_schema.columns c \
                   ON t.table_schema = c.table_schema AND t.table_name = c.table_name \
                 WHERE t.table_schema NOT IN ('pg_catalog', 'information_schema') \
                   AND t.table_type = 'BASE TABLE' \
                 ORDER BY t.table_schema, t.table_name, c.ordinal_position",
                &[],
            )
            .await
            .map_err(Error::Catalog)?;
        debug!("fetched {} column rows", rows.len());
        Ok(rows
            .iter()
            .map(|r| ColumnRow {
                schema: r.get(0),
                table: r.get(1),
                column: r.get(2),
                data_type: r.get(3),
            })
            .collect())
    }

    /// Index rows from pg_indexes for user schemas, ordered by table name.
    pub async fn fetch_indexes(&self) -> Result<Vec<IndexRow>> {
        let rows = self
            .client
            .query(
                "SELECT schemaname, tablename, indexname, indexdef \
                 FROM pg_indexes \
                 WHERE schemaname NOT IN ('pg_catalog', 'information_schema') \
                 ORDER BY tablename",
                &[],
            )
            .await
            .map_err(Error::Catalog)?;
        debug!("fetched {} index rows", rows.len());
        Ok(rows
            .iter()
            .map(|r| IndexRow {
                schema: r.get(0),
                table: r.get(1),
                name: r.get(2),
                definition: r.get(3),
            })
            .collect())
    }

    /// Constraint rows from pg_constraint for user schemas, ordered by table
    /// name. contype arrives as a single character.
    pub async fn fetch_constraints(&self) -> Result<Vec<ConstraintRow>> {
        let rows = self
            .client
            .query(
                "SELECT n.nspname, c.relname, conname, contype::text, \
                        pg_get_constraintdef(pg_constraint.oid) \
                 FROM pg_constraint \
                 JOIN pg_class c ON c.oid = conrelid \
                 JOIN pg_namespace n ON n.oid = c.relnamespace \
                 WHERE n.nspname NOT IN ('pg_catalog', 'information_schema') \
                 ORDER BY c.relname",
                &[],
            )
            .await
            .map_err(Error::Catalog)?;
        debug!("fetched {} constraint rows", rows.len());
        Ok(rows
            .iter()
            .map(|r| ConstraintRow {
                schema: r.get(0),
                table: r.get(1),
                name: r.get(2),
                kind: r.get(3),
                definition: r.get(4),
            })
            .collect())
    }

    /// Top 10 queries from pg_stat_statements by mean execution time.
    pub async fn fetch_slow_queries(&self) -> Result<Vec<SlowQuery>> {
        self.stat_statements(
            "SELECT query, calls, mean_time, total_time \
             FROM pg_stat_statements \
             ORDER BY mean_time DESC \
             LIMIT 10",
        )
        .await
    }

    /// Top 10 queries whose mean execution time exceeds the fixed threshold,
    /// by call count.
    pub async fn fetch_frequent_slow_queries(&self) -> Result<Vec<SlowQuery>> {
        self.stat_statements(
            "SELECT query, calls, mean_time, total_time \
             FROM pg_stat_statements \
             WHERE mean_time > 100 \
             ORDER BY calls DESC \
             LIMIT 10",
        )
        .await
    }

    async fn stat_statements(&self, sql: &str) -> Result<Vec<SlowQuery>> {
        let rows = self.client.query(sql, &[]).await.map_err(Error::Catalog)?;
        Ok(rows
            .iter()
            .map(|r| SlowQuery {
                query: r.get(0),
                calls: r.get(1),
                mean_time: r.get(2),
                total_time: r.get(3),
            })
            .collect())
    }

    /// Up to 10 currently active sessions, oldest first.
    pub async fn fetch_active_sessions(&self) -> Result<Vec<ActiveSession>> {
        let rows = self
            .client
            .query(
                "SELECT pid, usename::text, query, state, \
                        to_char(now() - query_start, 'HH24:MI:SS') AS duration \
                 FROM pg_stat_activity \
                 WHERE state = 'active' \
                 ORDER BY query_start ASC \
                 LIMIT 10",
                &[],
            )
            .await
            .map_err(Error::Catalog)?;
        Ok(rows
            .iter()
            .map(|r| ActiveSession {
                pid: r.get(0),
                user: r.get(1),
                query: r.get(2),
                state: r.get(3),
                duration: r.get(4),
            })
            .collect())
    }

    /// Approximate row counts per user table from pg_class.reltuples,
    /// keyed by qualified name. Estimator-based, not exact.
    pub async fn fetch_table_counts(&self) -> Result<Vec<(String, i64)>> {
        let rows = self
            .client
            .query(
                "SELECT n.nspname, c.relname, c.reltuples::bigint \
                 FROM pg_class c \
                 JOIN pg_namespace n ON n.oid = c.relnamespace \
                 WHERE c.relkind = 'r' \
                   AND n.nspname NOT IN ('pg_catalog', 'information_schema') \
                 ORDER BY c.reltuples DESC",
                &[],
            )
            .await
            .map_err(Error::Catalog)?;
        Ok(rows
            .iter()
            .map(|r| {
                let schema: String = r.get(0);
                let table: String = r.get(1);
                (format!("{}.{}", schema, table), r.get::<_, i64>(2))
            })
            .collect())
    }

    /// Execute arbitrary caller-supplied SQL. Rows are converted to a
    /// generic JSON table shape; a statement that produces no result set
    /// (DDL/DML) returns `None`. This path is deliberately unrestricted.
    pub async fn execute_sql(&self, sql: &str) -> Result<Option<serde_json::Value>> {
        let msgs = self.client.simple_query(sql).await.map_err(Error::Sql)?;
        let mut cols: Vec<String> = Vec::new();
        let mut rows: Vec<Vec<serde_json::Value>> = Vec::new();
        for m in msgs {
            match m {
                SimpleQueryMessage::RowDescription(desc) => {
                    cols = desc.iter().map(|c| c.name().to_string()).collect();
                }
                SimpleQueryMessage::Row(r) => {
                    if cols.is_empty() {
                        cols = (0..r.len()).map(|i| r.columns()[i].name().to_string()).collect();
                    }
                    let mut out_row = Vec::with_capacity(r.len());
                    for i in 0..r.len() {
                        out_row.push(match r.get(i) {
                            Some(s) => serde_json::Value::String(s.to_string()),
                            None => serde_json::Value::Null,
                        });
                    }
                    rows.push(out_row);
                }
                _ => {}
            }
        }
        if cols.is_empty() && rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::json!({
            "columns": cols,
            "rows": rows,
        })))
    }
}

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{Column, Connection, PgConnection, Row, TypeInfo};
use thiserror::Error;
use tracing::debug;

use prestige_core::WarehouseSettings;

const WARRANTY_LOOKUP: &str = "SELECT * FROM WARRANTY WHERE ID = $1";
const PRODUCT_LOOKUP: &str = "SELECT * FROM PRODUCT WHERE NAME ILIKE $1";

#[derive(Debug, Clone, Error)]
pub enum LookupError {
    /// The connection itself is unusable — opening failed, or the wire broke
    /// mid-session. Remaining work on the same session must be skipped.
    #[error("warehouse session error: {0}")]
    Session(String),
    /// A single query failed; the session may still serve other queries.
    #[error("warehouse query error: {0}")]
    Query(String),
}

impl LookupError {
    pub fn is_session(&self) -> bool {
        matches!(self, LookupError::Session(_))
    }

    fn from_sqlx(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::Configuration(_)
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => LookupError::Session(e.to_string()),
            other => LookupError::Query(other.to_string()),
        }
    }
}

/// At most one row, with its column names in result order. Under multiple
/// matches (possible for the ILIKE product lookup) the engine decides which
/// row comes back; no ordering is imposed.
#[derive(Debug, Clone, Serialize)]
pub struct LookupResult {
    pub columns: Vec<String>,
    pub row: Option<Vec<String>>,
}

impl LookupResult {
    pub fn empty() -> Self {
        LookupResult {
            columns: Vec::new(),
            row: None,
        }
    }

    pub fn found(&self) -> bool {
        self.row.is_some()
    }
}

/// One open warehouse connection, scoped to a single upload request:
/// exactly two lookups at most, then `close`.
#[async_trait]
pub trait WarehouseSession: Send + std::fmt::Debug {
    /// `SELECT * FROM WARRANTY WHERE ID = <id>`, bound parameter, exact match.
    async fn find_warranty(&mut self, warranty_id: &str) -> Result<LookupResult, LookupError>;

    /// `SELECT * FROM PRODUCT WHERE NAME ILIKE <model>`, bound parameter.
    async fn find_product(&mut self, model: &str) -> Result<LookupResult, LookupError>;

    /// Release the connection. Callers must reach this on every exit path.
    async fn close(self: Box<Self>) -> Result<(), LookupError>;
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    async fn open_session(&self) -> Result<Box<dyn WarehouseSession>, LookupError>;
}

// ── Postgres-wire implementation ──────────────────────────────────────────────

/// Warehouse adapter speaking the Postgres wire protocol. The connection
/// descriptor maps account → host and schema → `search_path`; the virtual
/// warehouse name is informational and only logged.
pub struct PgWarehouse {
    options: PgConnectOptions,
    warehouse: String,
}

impl PgWarehouse {
    pub fn new(settings: &WarehouseSettings) -> Self {
        let options = PgConnectOptions::new()
            .host(&settings.account)
            .username(&settings.user)
            .password(&settings.password)
            .database(&settings.database)
            .options([("search_path", settings.schema.as_str())]);
        Self {
            options,
            warehouse: settings.warehouse.clone(),
        }
    }
}

#[async_trait]
impl Warehouse for PgWarehouse {
    async fn open_session(&self) -> Result<Box<dyn WarehouseSession>, LookupError> {
        let conn = PgConnection::connect_with(&self.options)
            .await
            .map_err(|e| LookupError::Session(e.to_string()))?;
        debug!(warehouse = %self.warehouse, "warehouse session opened");
        Ok(Box::new(PgSession { conn }))
    }
}

#[derive(Debug)]
struct PgSession {
    conn: PgConnection,
}

impl PgSession {
    async fn lookup(&mut self, sql: &str, key: &str) -> Result<LookupResult, LookupError> {
        let row = sqlx::query(sql)
            .bind(key)
            .fetch_optional(&mut self.conn)
            .await
            .map_err(LookupError::from_sqlx)?;

        Ok(match row {
            Some(row) => LookupResult {
                columns: row.columns().iter().map(|c| c.name().to_string()).collect(),
                row: Some(render_row(&row)),
            },
            None => LookupResult::empty(),
        })
    }
}

#[async_trait]
impl WarehouseSession for PgSession {
    async fn find_warranty(&mut self, warranty_id: &str) -> Result<LookupResult, LookupError> {
        self.lookup(WARRANTY_LOOKUP, warranty_id).await
    }

    async fn find_product(&mut self, model: &str) -> Result<LookupResult, LookupError> {
        self.lookup(PRODUCT_LOOKUP, model).await
    }

    async fn close(self: Box<Self>) -> Result<(), LookupError> {
        self.conn
            .close()
            .await
            .map_err(|e| LookupError::Session(e.to_string()))
    }
}

// ── Row rendering ─────────────────────────────────────────────────────────────

fn render_row(row: &PgRow) -> Vec<String> {
    (0..row.columns().len())
        .map(|idx| render_value(row, idx))
        .collect()
}

/// Stringify one column of a dynamically-typed row. `SELECT *` means the
/// column types are only known at runtime, so this walks the types the
/// WARRANTY and PRODUCT tables are known to use. NULL renders as empty.
fn render_value(row: &PgRow, idx: usize) -> String {
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return v.unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<i16>, _>(idx) {
        return v.map(|n| n.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return v.map(|n| n.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return v.map(|n| n.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(idx) {
        return v.map(|n| n.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return v.map(|n| n.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<Decimal>, _>(idx) {
        return v.map(|n| n.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return v.map(|b| b.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return v.map(|d| d.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<NaiveTime>, _>(idx) {
        return v.map(|t| t.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return v.map(|t| t.to_string()).unwrap_or_default();
    }
    if let Ok(v) = row.try_get::<Option<DateTime<Utc>>, _>(idx) {
        return v.map(|t| t.to_rfc3339()).unwrap_or_default();
    }
    format!("<{}>", row.column(idx).type_info().name())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_mark_the_session_unusable() {
        let e = sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "reset",
        ));
        assert!(LookupError::from_sqlx(e).is_session());
        assert!(LookupError::from_sqlx(sqlx::Error::PoolClosed).is_session());
        assert!(LookupError::from_sqlx(sqlx::Error::Protocol("bad frame".into())).is_session());
    }

    #[test]
    fn other_errors_stay_query_scoped() {
        let e = LookupError::from_sqlx(sqlx::Error::RowNotFound);
        assert!(!e.is_session());
        assert!(matches!(e, LookupError::Query(_)));
    }

    #[test]
    fn empty_result_reports_not_found() {
        assert!(!LookupResult::empty().found());
        let hit = LookupResult {
            columns: vec!["ID".to_string()],
            row: Some(vec!["482913".to_string()]),
        };
        assert!(hit.found());
    }

    #[test]
    fn queries_use_bound_parameters_only() {
        // The statements are fixed strings; keys travel as parameters.
        assert!(WARRANTY_LOOKUP.contains("$1"));
        assert!(PRODUCT_LOOKUP.contains("$1"));
        assert!(!WARRANTY_LOOKUP.contains('\''));
        assert!(!PRODUCT_LOOKUP.contains('\''));
    }
}

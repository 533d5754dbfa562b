use std::fmt;

use futures::TryStreamExt;
use serde_json::{Map, Value};
use sqlx::{postgres::PgPoolOptions, types::Json, PgPool};

use crate::{domain::Row, error::DataAccessError};

/// The four tables the dashboard reads. Table names never come from user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    VillageInputs,
    CompetitorOffers,
    Tariffs,
    WholesalePrices,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::VillageInputs => "village_inputs",
            Table::CompetitorOffers => "competitor_offers",
            Table::Tariffs => "en_tariffs",
            Table::WholesalePrices => "wholesale_price_nem",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only keyed access to the backing store.
#[async_trait::async_trait]
pub trait TableReader: Send + Sync {
    /// First row whose `filter_column` equals `filter_value` (both sides trimmed).
    async fn fetch_row(
        &self,
        table: Table,
        filter_column: &str,
        filter_value: &str,
    ) -> Result<Option<Row>, DataAccessError>;

    /// Every row of `table`, restricted to `columns` (all columns when empty).
    async fn fetch_all(&self, table: Table, columns: &[&str]) -> Result<Vec<Row>, DataAccessError>;
}

/// Column names are interpolated into SQL, so only plain identifiers pass.
pub fn validate_identifier(ident: &str) -> Result<&str, DataAccessError> {
    let mut chars = ident.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };

    if valid {
        Ok(ident)
    } else {
        Err(DataAccessError::InvalidIdentifier(ident.to_string()))
    }
}

fn select_row_sql(table: Table, filter_column: &str) -> Result<String, DataAccessError> {
    let column = validate_identifier(filter_column)?;
    Ok(format!(
        r#"SELECT to_jsonb(t) FROM {table} t WHERE btrim(t."{column}"::text) = $1 LIMIT 1"#
    ))
}

fn select_all_sql(table: Table, columns: &[&str]) -> Result<String, DataAccessError> {
    let projection = if columns.is_empty() {
        "*".to_string()
    } else {
        columns
            .iter()
            .map(|c| validate_identifier(c).map(|c| format!("\"{c}\"")))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ")
    };
    Ok(format!(
        "SELECT to_jsonb(t) FROM (SELECT {projection} FROM {table}) t"
    ))
}

/// Postgres-backed reader. Rows are converted server-side with `to_jsonb`,
/// which keeps column types (numeric, text, null) visible to the coercion layer.
#[derive(Debug, Clone)]
pub struct PgTableReader {
    pool: PgPool,
}

impl PgTableReader {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(uri: &str, max_connections: u32) -> Result<Self, DataAccessError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(uri)
            .await?;
        Ok(Self::new(pool))
    }
}

#[async_trait::async_trait]
impl TableReader for PgTableReader {
    async fn fetch_row(
        &self,
        table: Table,
        filter_column: &str,
        filter_value: &str,
    ) -> Result<Option<Row>, DataAccessError> {
        let sql = select_row_sql(table, filter_column)?;
        let row = sqlx::query_scalar::<_, Json<Map<String, Value>>>(&sql)
            .bind(filter_value.trim())
            .fetch_optional(&self.pool)
            .await?;

        metrics::counter!("tariff_client_rows_fetched_total", "table" => table.name())
            .increment(u64::from(row.is_some()));
        tracing::debug!(%table, filter_column, filter_value, found = row.is_some(), "fetched row");

        Ok(row.map(|Json(map)| Row::from(map)))
    }

    async fn fetch_all(&self, table: Table, columns: &[&str]) -> Result<Vec<Row>, DataAccessError> {
        let sql = select_all_sql(table, columns)?;
        let rows: Vec<Row> = sqlx::query_scalar::<_, Json<Map<String, Value>>>(&sql)
            .fetch(&self.pool)
            .map_ok(|Json(map)| Row::from(map))
            .try_collect()
            .await?;

        metrics::counter!("tariff_client_rows_fetched_total", "table" => table.name())
            .increment(rows.len() as u64);
        tracing::debug!(%table, rows = rows.len(), "fetched table");

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_validated() {
        assert!(validate_identifier("village_name").is_ok());
        assert!(validate_identifier("_usage").is_ok());
        assert!(validate_identifier("q1_usage_res").is_ok());
        assert!(validate_identifier("").is_err());
        assert!(validate_identifier("1abc").is_err());
        assert!(validate_identifier("name\"; DROP TABLE x; --").is_err());
    }

    #[test]
    fn builds_projection_sql() {
        let sql = select_all_sql(Table::Tariffs, &["village_name", "_usage"]).unwrap();
        assert_eq!(
            sql,
            r#"SELECT to_jsonb(t) FROM (SELECT "village_name", "_usage" FROM en_tariffs) t"#
        );

        let all = select_all_sql(Table::WholesalePrices, &[]).unwrap();
        assert!(all.contains("SELECT * FROM wholesale_price_nem"));
    }

    #[test]
    fn row_sql_rejects_bad_filter_column() {
        assert!(matches!(
            select_row_sql(Table::VillageInputs, "village name"),
            Err(DataAccessError::InvalidIdentifier(_))
        ));
    }
}

use std::collections::HashMap;

use crate::{
    db::reader::{validate_identifier, Table, TableReader},
    domain::Row,
    error::DataAccessError,
};

/// In-memory tables with the same lookup semantics as [`super::PgTableReader`].
///
/// Used by tests and by local fixtures when no database is configured.
#[derive(Debug, Clone, Default)]
pub struct MemoryTableReader {
    tables: HashMap<Table, Vec<Row>>,
}

impl MemoryTableReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, table: Table, rows: impl IntoIterator<Item = Row>) -> Self {
        self.tables.entry(table).or_default().extend(rows);
        self
    }

    fn rows(&self, table: Table) -> &[Row] {
        self.tables.get(&table).map(Vec::as_slice).unwrap_or_default()
    }
}

fn cell_matches(row: &Row, column: &str, value: &str) -> bool {
    match row.get(column) {
        Some(serde_json::Value::String(s)) => s.trim() == value,
        Some(serde_json::Value::Number(n)) => n.to_string() == value,
        _ => false,
    }
}

#[async_trait::async_trait]
impl TableReader for MemoryTableReader {
    async fn fetch_row(
        &self,
        table: Table,
        filter_column: &str,
        filter_value: &str,
    ) -> Result<Option<Row>, DataAccessError> {
        let column = validate_identifier(filter_column)?;
        let value = filter_value.trim();
        Ok(self
            .rows(table)
            .iter()
            .find(|row| cell_matches(row, column, value))
            .cloned())
    }

    async fn fetch_all(&self, table: Table, columns: &[&str]) -> Result<Vec<Row>, DataAccessError> {
        for c in columns {
            validate_identifier(c)?;
        }
        Ok(self.rows(table).iter().map(|r| r.project(columns)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reader() -> MemoryTableReader {
        MemoryTableReader::new().with_rows(
            Table::VillageInputs,
            [
                Row::new().with("village_name", "Classic Res  ").with("nmis_res", 100),
                Row::new().with("village_name", "Lakeside").with("nmis_res", 40),
            ],
        )
    }

    #[tokio::test]
    async fn fetch_row_matches_trimmed_value() {
        let row = reader()
            .fetch_row(Table::VillageInputs, "village_name", "Classic Res")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(row.count("nmis_res"), 100);
    }

    #[tokio::test]
    async fn fetch_row_returns_none_for_unknown_key() {
        let row = reader()
            .fetch_row(Table::VillageInputs, "village_name", "Nowhere")
            .await
            .unwrap();
        assert!(row.is_none());
    }

    #[tokio::test]
    async fn fetch_all_projects_columns() {
        let rows = reader()
            .fetch_all(Table::VillageInputs, &["village_name"])
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.get("nmis_res").is_none()));
    }

    #[tokio::test]
    async fn empty_table_yields_no_rows() {
        let rows = reader().fetch_all(Table::Tariffs, &[]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn invalid_column_is_rejected() {
        let err = reader()
            .fetch_all(Table::VillageInputs, &["bad column"])
            .await
            .unwrap_err();
        assert!(matches!(err, DataAccessError::InvalidIdentifier(_)));
    }
}

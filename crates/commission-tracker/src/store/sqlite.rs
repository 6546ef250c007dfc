//! Local SQLite ledger
//!
//! Mirrors the hosted tables so the tracker works without a backend account.

use async_trait::async_trait;
use serde_json::Value;
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions};
use sqlx::{FromRow, Sqlite, SqlitePool};
use std::path::Path;

use super::{Store, StoreResult};
use crate::entries::{EntryId, RawRow};
use crate::error::StoreError;

/// Columns a caller may set on an entry
const ENTRY_COLUMNS: [&str; 5] = [
    "staff_name",
    "sales_amount",
    "commission_rate",
    "service_type",
    "timestamp",
];

/// Ledger database wrapper
pub struct SqliteStore {
    pool: SqlitePool,
}

/// Row type for entries query
#[derive(FromRow)]
struct EntryRow {
    id: i64,
    staff_name: String,
    sales_amount: f64,
    commission_rate: Option<f64>,
    service_type: Option<String>,
    timestamp: String,
}

impl EntryRow {
    fn into_raw(self) -> RawRow {
        let mut row = RawRow::new();
        row.insert("id".into(), Value::from(self.id));
        row.insert("staff_name".into(), Value::from(self.staff_name));
        row.insert("sales_amount".into(), Value::from(self.sales_amount));
        row.insert(
            "commission_rate".into(),
            self.commission_rate.map(Value::from).unwrap_or(Value::Null),
        );
        row.insert(
            "service_type".into(),
            self.service_type.map(Value::from).unwrap_or(Value::Null),
        );
        row.insert("timestamp".into(), Value::from(self.timestamp));
        row
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

impl SqliteStore {
    /// Open or create the ledger database
    pub async fn open(path: &Path) -> StoreResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let url = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&url).await?;

        // WAL mode and a busy timeout keep a second CLI invocation from failing with SQLITE_BUSY
        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA busy_timeout=5000")
            .execute(&pool)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Private in-memory database (one connection, so every query sees the same data)
    pub async fn open_in_memory() -> StoreResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(
            "
            -- Staff members, unique by exact name
            CREATE TABLE IF NOT EXISTS staff (
                name TEXT PRIMARY KEY,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "
            -- Sale entries; staff_name is deliberately not a foreign key
            CREATE TABLE IF NOT EXISTS entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                staff_name TEXT NOT NULL,
                sales_amount REAL NOT NULL,
                commission_rate REAL,
                service_type TEXT,
                timestamp TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entries_timestamp ON entries(timestamp)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn fetch_entry(&self, id: i64) -> StoreResult<RawRow> {
        let row: EntryRow = sqlx::query_as(
            "SELECT id, staff_name, sales_amount, commission_rate, service_type, timestamp
             FROM entries WHERE id = ?",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_raw())
    }
}

#[async_trait]
impl Store for SqliteStore {
    // =========================================================================
    // Staff
    // =========================================================================

    async fn list_staff(&self) -> StoreResult<Vec<String>> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM staff ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }

    async fn insert_staff(&self, name: &str) -> StoreResult<()> {
        sqlx::query("INSERT INTO staff (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_staff(&self, name: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM staff WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn rename_staff(&self, old: &str, new: &str) -> StoreResult<()> {
        sqlx::query("UPDATE staff SET name = ? WHERE name = ?")
            .bind(new)
            .bind(old)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Entries
    // =========================================================================

    async fn list_entries(&self) -> StoreResult<Vec<RawRow>> {
        let rows: Vec<EntryRow> = sqlx::query_as(
            "SELECT id, staff_name, sales_amount, commission_rate, service_type, timestamp
             FROM entries
             ORDER BY timestamp, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(EntryRow::into_raw).collect())
    }

    async fn insert_entry(&self, row: &RawRow) -> StoreResult<RawRow> {
        let present: Vec<&str> = ENTRY_COLUMNS
            .iter()
            .copied()
            .filter(|c| row.contains_key(*c))
            .collect();
        let placeholders = vec!["?"; present.len()].join(", ");
        let sql = format!(
            "INSERT INTO entries ({}) VALUES ({})",
            present.join(", "),
            placeholders
        );

        let mut query = sqlx::query(&sql);
        for column in &present {
            query = bind_value(query, column, &row[*column])?;
        }
        let result = query.execute(&self.pool).await?;

        self.fetch_entry(result.last_insert_rowid()).await
    }

    async fn update_entry(&self, id: &EntryId, row: &RawRow) -> StoreResult<()> {
        let present: Vec<&str> = ENTRY_COLUMNS
            .iter()
            .copied()
            .filter(|c| row.contains_key(*c))
            .collect();
        if present.is_empty() {
            return Ok(());
        }

        let assignments: Vec<String> = present.iter().map(|c| format!("{} = ?", c)).collect();
        let sql = format!("UPDATE entries SET {} WHERE id = ?", assignments.join(", "));

        let mut query = sqlx::query(&sql);
        for column in &present {
            query = bind_value(query, column, &row[*column])?;
        }
        bind_id(query, id).execute(&self.pool).await?;
        Ok(())
    }

    async fn delete_entry(&self, id: &EntryId) -> StoreResult<()> {
        bind_id(sqlx::query("DELETE FROM entries WHERE id = ?"), id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn reassign_entries(&self, old: &str, new: &str) -> StoreResult<()> {
        sqlx::query("UPDATE entries SET staff_name = ? WHERE staff_name = ?")
            .bind(new)
            .bind(old)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Helper functions
// =============================================================================

/// Bind a JSON value to the next placeholder
fn bind_value<'q>(query: SqliteQuery<'q>, column: &str, value: &Value) -> StoreResult<SqliteQuery<'q>> {
    Ok(match value {
        Value::Null => query.bind(None::<String>),
        Value::Number(n) => query.bind(n.as_f64()),
        Value::String(s) => query.bind(s.clone()),
        other => {
            return Err(StoreError::Malformed(format!(
                "column '{}' cannot hold {}",
                column, other
            )));
        }
    })
}

fn bind_id<'q>(query: SqliteQuery<'q>, id: &EntryId) -> SqliteQuery<'q> {
    match id {
        EntryId::Number(n) => query.bind(*n),
        EntryId::Text(s) => query.bind(s.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RawRow {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_staff_roundtrip() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        store.insert_staff("Bea").await.unwrap();
        store.insert_staff("Ana").await.unwrap();
        assert!(store.insert_staff("Ana").await.is_err());

        assert_eq!(store.list_staff().await.unwrap(), vec!["Ana", "Bea"]);

        store.rename_staff("Ana", "Anna").await.unwrap();
        store.delete_staff("Bea").await.unwrap();
        assert_eq!(store.list_staff().await.unwrap(), vec!["Anna"]);
    }

    #[tokio::test]
    async fn test_entry_lifecycle() {
        let store = SqliteStore::open_in_memory().await.unwrap();

        let later = store
            .insert_entry(&row(json!({
                "staff_name": "Ana",
                "sales_amount": 80.0,
                "timestamp": "2025-03-05T17:00:00.000Z"
            })))
            .await
            .unwrap();
        let earlier = store
            .insert_entry(&row(json!({
                "staff_name": "Bea",
                "sales_amount": 40.0,
                "commission_rate": 0.6,
                "service_type": "Pedicure",
                "timestamp": "2025-03-04T17:00:00.000Z"
            })))
            .await
            .unwrap();

        assert_eq!(later["commission_rate"], Value::Null);
        assert_eq!(earlier["service_type"], json!("Pedicure"));

        let listed = store.list_entries().await.unwrap();
        assert_eq!(listed, vec![earlier.clone(), later.clone()]);

        let later_id = EntryId::Number(later["id"].as_i64().unwrap());
        store
            .update_entry(&later_id, &row(json!({"sales_amount": 90.0, "commission_rate": 0.6})))
            .await
            .unwrap();
        let listed = store.list_entries().await.unwrap();
        assert_eq!(listed[1]["sales_amount"], json!(90.0));
        assert_eq!(listed[1]["commission_rate"], json!(0.6));

        store.delete_entry(&later_id).await.unwrap();
        // Deleting again matches nothing and still succeeds
        store.delete_entry(&later_id).await.unwrap();
        assert_eq!(store.list_entries().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_reassign_entries() {
        let store = SqliteStore::open_in_memory().await.unwrap();
        for name in ["Ana", "Ana", "Bea"] {
            store
                .insert_entry(&row(json!({
                    "staff_name": name,
                    "sales_amount": 10.0,
                    "timestamp": "2025-03-05T17:00:00.000Z"
                })))
                .await
                .unwrap();
        }

        store.reassign_entries("Ana", "Anna").await.unwrap();
        let names: Vec<String> = store
            .list_entries()
            .await
            .unwrap()
            .iter()
            .map(|r| r["staff_name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Anna", "Anna", "Bea"]);
    }
}

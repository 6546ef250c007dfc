//! Backing store for staff and entries
//!
//! The store is the single source of truth. Rows cross this boundary in the
//! persisted (snake_case) shape; normalization happens in the session.

mod rest;
mod sqlite;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;

use crate::entries::{EntryId, RawRow};
use crate::error::StoreError;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Remote tables the session reads and writes.
///
/// Updates and deletes that match no row succeed; callers rely on that for
/// idempotent edits and deletes.
#[async_trait]
pub trait Store: Send + Sync {
    /// Staff names, alphabetically
    async fn list_staff(&self) -> StoreResult<Vec<String>>;

    async fn insert_staff(&self, name: &str) -> StoreResult<()>;

    async fn delete_staff(&self, name: &str) -> StoreResult<()>;

    async fn rename_staff(&self, old: &str, new: &str) -> StoreResult<()>;

    /// Entry rows, oldest first
    async fn list_entries(&self) -> StoreResult<Vec<RawRow>>;

    /// Insert and return the stored row, including its assigned id
    async fn insert_entry(&self, row: &RawRow) -> StoreResult<RawRow>;

    async fn update_entry(&self, id: &EntryId, row: &RawRow) -> StoreResult<()>;

    async fn delete_entry(&self, id: &EntryId) -> StoreResult<()>;

    /// Relabel every entry tagged `old` with `new`
    async fn reassign_entries(&self, old: &str, new: &str) -> StoreResult<()>;
}

//! The in-memory snapshot of staff and entries, kept in step with the store
//!
//! Every write goes to the store first. The local collections are only
//! replaced once the store has confirmed, so a failed write leaves the
//! snapshot exactly as it was.

use chrono::TimeZone;
use serde_json::Value;

use crate::entries::{
    EntryId, EntryInput, RawRow, SaleEntry, normalize_field_names, to_persisted_shape,
};
use crate::error::{LedgerError, StoreError, ValidationError};
use crate::period::noon_on;
use crate::store::Store;

pub type LedgerResult<T> = std::result::Result<T, LedgerError>;

/// Staff list and entries for one salon, backed by `S`
pub struct Session<S, Tz> {
    store: S,
    tz: Tz,
    staff: Vec<String>,
    entries: Vec<SaleEntry>,
}

impl<S: Store, Tz: TimeZone> Session<S, Tz> {
    /// Empty session; call `load` to fetch the current snapshot
    pub fn new(store: S, tz: Tz) -> Self {
        Self {
            store,
            tz,
            staff: Vec::new(),
            entries: Vec::new(),
        }
    }

    pub fn staff(&self) -> &[String] {
        &self.staff
    }

    pub fn entries(&self) -> &[SaleEntry] {
        &self.entries
    }

    pub fn find_entry(&self, id: &EntryId) -> Option<&SaleEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    // =========================================================================
    // Snapshot
    // =========================================================================

    /// Fetch staff and entries from the store.
    ///
    /// Rows that cannot be parsed are skipped with a warning.
    pub async fn load(&mut self) -> LedgerResult<()> {
        let staff = self.store.list_staff().await?;
        let rows = self.store.list_entries().await?;
        self.replace_snapshot(staff, &rows);
        tracing::info!(
            staff = self.staff.len(),
            entries = self.entries.len(),
            "loaded snapshot"
        );
        Ok(())
    }

    /// Swap in a fresh snapshot, e.g. after another client pushed changes
    pub fn replace_snapshot(&mut self, staff: Vec<String>, rows: &[RawRow]) {
        let entries = rows
            .iter()
            .filter_map(|row| match normalize_field_names(row) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable entry row");
                    None
                }
            })
            .collect();

        self.staff = staff;
        self.entries = entries;
    }

    // =========================================================================
    // Staff
    // =========================================================================

    pub async fn add_staff(&mut self, name: &str) -> LedgerResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.has_staff(name) {
            return Err(ValidationError::DuplicateStaff(name.to_string()).into());
        }

        self.store.insert_staff(name).await?;

        let mut staff = self.staff.clone();
        staff.push(name.to_string());
        self.staff = staff;
        tracing::info!(name, "added staff");
        Ok(())
    }

    /// Delete the staff row; their entries keep the old name
    pub async fn remove_staff(&mut self, name: &str) -> LedgerResult<()> {
        if !self.has_staff(name) {
            return Err(ValidationError::UnknownStaff(name.to_string()).into());
        }

        self.store.delete_staff(name).await?;

        self.staff = self.staff.iter().filter(|s| *s != name).cloned().collect();
        tracing::info!(name, "removed staff");
        Ok(())
    }

    /// Rename a staff member and relabel all of their entries.
    ///
    /// If the staff row is renamed but relabelling the entries fails, the
    /// local staff list follows the store and `LedgerError::PartialCascade`
    /// is returned; the entries still carry `old` in both places. Calling
    /// again with the same names then only relabels the entries.
    pub async fn rename_staff(&mut self, old: &str, new: &str) -> LedgerResult<()> {
        let new = new.trim();
        if new.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if !self.has_staff(old) && self.has_staff(new) && self.has_entries_for(old) {
            self.reassign_entries(old, new).await?;
            tracing::info!(old, new, "finished relabelling entries");
            return Ok(());
        }
        if !self.has_staff(old) {
            return Err(ValidationError::UnknownStaff(old.to_string()).into());
        }
        if old == new {
            return Ok(());
        }
        if self.has_staff(new) {
            return Err(ValidationError::DuplicateStaff(new.to_string()).into());
        }

        self.store.rename_staff(old, new).await?;

        self.staff = self
            .staff
            .iter()
            .map(|s| if s == old { new.to_string() } else { s.clone() })
            .collect();

        self.reassign_entries(old, new).await?;
        tracing::info!(old, new, "renamed staff");
        Ok(())
    }

    /// Second step of a rename: relabel entries in the store, then locally
    async fn reassign_entries(&mut self, old: &str, new: &str) -> LedgerResult<()> {
        if let Err(source) = self.store.reassign_entries(old, new).await {
            tracing::warn!(old, new, error = %source, "staff renamed but entries were not reassigned");
            return Err(LedgerError::PartialCascade {
                old: old.to_string(),
                new: new.to_string(),
                source,
            });
        }

        self.entries = self
            .entries
            .iter()
            .map(|e| {
                let mut e = e.clone();
                if e.staff_name == old {
                    e.staff_name = new.to_string();
                }
                e
            })
            .collect();
        Ok(())
    }

    // =========================================================================
    // Entries
    // =========================================================================

    /// Record a sale stamped at noon (local) on the input date
    pub async fn add_entry(&mut self, input: &EntryInput) -> LedgerResult<EntryId> {
        input.validate()?;
        if !self.has_staff(input.staff_name.trim()) {
            return Err(ValidationError::UnknownStaff(input.staff_name.clone()).into());
        }

        let draft = self.entry_from_input(EntryId::pending(), input);
        let stored = self.store.insert_entry(&to_persisted_shape(&draft)).await?;
        let entry = normalize_field_names(&stored)
            .map_err(|e| StoreError::Malformed(format!("inserted row: {}", e)))?;

        let id = entry.id.clone();
        let mut entries = self.entries.clone();
        entries.push(entry);
        self.entries = entries;
        tracing::info!(%id, staff = %input.staff_name, "added entry");
        Ok(id)
    }

    /// Overwrite an entry. An id unknown locally still goes to the store and
    /// is otherwise a no-op.
    pub async fn edit_entry(&mut self, id: &EntryId, input: &EntryInput) -> LedgerResult<()> {
        input.validate()?;
        let name = input.staff_name.trim();
        let keeps_own_name = self.find_entry(id).is_some_and(|e| e.staff_name == name);
        if !self.has_staff(name) && !keeps_own_name {
            return Err(ValidationError::UnknownStaff(input.staff_name.clone()).into());
        }

        let updated = self.entry_from_input(id.clone(), input);
        let mut row = to_persisted_shape(&updated);
        // Explicit nulls so an edit can clear a rate or service
        row.entry("commission_rate").or_insert(Value::Null);
        row.entry("service_type").or_insert(Value::Null);

        self.store.update_entry(id, &row).await?;

        self.entries = self
            .entries
            .iter()
            .map(|e| if &e.id == id { updated.clone() } else { e.clone() })
            .collect();
        tracing::info!(%id, "updated entry");
        Ok(())
    }

    /// Delete an entry; deleting an id that is already gone succeeds
    pub async fn delete_entry(&mut self, id: &EntryId) -> LedgerResult<()> {
        self.store.delete_entry(id).await?;

        self.entries = self.entries.iter().filter(|e| &e.id != id).cloned().collect();
        tracing::info!(%id, "deleted entry");
        Ok(())
    }

    fn has_staff(&self, name: &str) -> bool {
        self.staff.iter().any(|s| s == name)
    }

    fn has_entries_for(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.staff_name == name)
    }

    fn entry_from_input(&self, id: EntryId, input: &EntryInput) -> SaleEntry {
        SaleEntry {
            id,
            staff_name: input.staff_name.trim().to_string(),
            sales_amount: input.sales_amount,
            commission_rate: input.commission_rate,
            service_type: input
                .service_type
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            timestamp: noon_on(input.date, &self.tz),
        }
    }
}

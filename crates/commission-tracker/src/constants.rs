//! Centralized constants for the commission tracker
//!
//! Business rules that apply to every salon. Deployment-specific settings
//! (backend URL, keys) are loaded from config.toml.

// =============================================================================
// Commission Rules
// =============================================================================

/// Rate applied when an entry has no stored commission rate
pub const DEFAULT_COMMISSION_RATE: f64 = 0.7;

/// Fixed rates used by the legacy two-column export
pub const LEGACY_HIGH_RATE: f64 = 0.7;
pub const LEGACY_LOW_RATE: f64 = 0.6;

/// Hour of day (local) used to stamp entries recorded from a date-only input
pub const ENTRY_NOON_HOUR: u32 = 12;

// =============================================================================
// Hosted Backend (PostgREST)
// =============================================================================

/// REST path prefix appended to the configured project URL
pub const REST_PATH: &str = "/rest/v1";

/// Table holding staff names
pub const STAFF_TABLE: &str = "staff";

/// Table holding sale entries
pub const ENTRIES_TABLE: &str = "entries";

// =============================================================================
// File Names
// =============================================================================

/// Local ledger database filename
pub const LEDGER_FILENAME: &str = "ledger.sqlite";

/// Default config file path
pub const CONFIG_FILE: &str = "config.toml";

/// Default prefix for exported CSV files
pub const EXPORT_FILE_PREFIX: &str = "commissions";

// =============================================================================
// Formats
// =============================================================================

/// Date format used for CLI input and CSV cells
pub const DATE_FORMAT: &str = "%Y-%m-%d";

//! Salon commission tracking
//!
//! Sale entries are normalized from the backing store, filtered to a view
//! (today, this week, all time), and rolled up into totals, growth and a
//! per-staff leaderboard. `Session` keeps the local snapshot in step with the
//! store; everything else is pure computation over `&[SaleEntry]`.

pub mod aggregate;
pub mod avatar;
pub mod calendar;
pub mod config;
pub mod constants;
pub mod entries;
pub mod error;
pub mod growth;
pub mod money;
pub mod period;
pub mod reports;
pub mod session;
pub mod store;

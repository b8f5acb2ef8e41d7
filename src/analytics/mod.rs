//! Read-side rollups over the fetched visit and lead collections. Pure; no writes.

pub mod classify;
pub mod rollups;
pub mod summary;

pub use summary::DashboardSummary;

//! Billing rate resolution and monthly contract settlement for clinic
//! operations. The core (`billing`) is pure computation over tenant-scoped
//! snapshots; the document store and audit log sit behind traits.

pub mod billing;
pub mod config;
pub mod error;
pub mod telemetry;

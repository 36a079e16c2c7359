//! Core types and trait definitions for the daybook health journal.
//!
//! This crate has no database dependencies. It defines the
//! tracker payloads, the [`store::RecordStore`] abstraction backends
//! implement, the bucket aggregation used for charts, and the report data
//! contract.

pub mod aggregate;
pub mod error;
pub mod record;
pub mod report;
pub mod store;
pub mod tracker;

pub use error::{Error, Result};

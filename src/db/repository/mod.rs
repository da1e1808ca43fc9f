//! Repository layer: entity-scoped database operations.

mod defect;
mod library;

use chrono::{NaiveDateTime, Timelike, Utc};

pub use defect::*;
pub use library::*;

/// Storage format for every timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time truncated to the stored precision.
pub fn now_timestamp() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

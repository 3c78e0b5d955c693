//! Database models, one file per table.

pub mod alert_sent;

pub use self::alert_sent::*;

//! Domain types shared by the collector, the reshaper and the publisher.

pub mod fundamentals;
pub mod ticker;

pub use fundamentals::{FieldValue, FundamentalField, Fundamentals};
pub use ticker::display_ticker;

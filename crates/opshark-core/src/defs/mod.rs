//! Protocol definition tables, grouped by client expansion.

pub mod vanilla;

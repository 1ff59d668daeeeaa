//! Store access for the reconciliation run
//!
//! One module per concern: existence/updates on the texts table, updates on
//! the titles table, the two read-only mapping lookups, and seeding.

pub mod mapping;
pub mod seed;
pub mod texts;
pub mod titles;

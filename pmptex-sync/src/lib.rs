//! # pmptex-sync
//!
//! Reconciles text rows from an externally-produced spreadsheet against the
//! PMP text tables, optionally seeding base records for absent identifiers
//! before applying updates.
//!
//! Pipeline: spreadsheet → header normalization → identifier resolution
//! (when the sheet carries only category/group pairs) → existence partition
//! → guard checks → optional seed → per-table update passes.

pub mod db;
pub mod reconcile;
pub mod resolve;
pub mod rows;
pub mod sheet;

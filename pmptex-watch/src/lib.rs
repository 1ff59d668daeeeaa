//! # pmptex-watch
//!
//! Polls a drive-synced drop folder for new `.xlsx` files and hands each
//! unseen file to the pmptex-sync CLI. One file per tick, strictly serial;
//! already-handled files are recognized by content fingerprint and skipped
//! across restarts.

pub mod ledger;
pub mod runner;
pub mod sanitize;
pub mod scan;

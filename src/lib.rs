//! rowsplice - reversible data-extension changes for tabular projects
//!
//! A data-extension change inserts new columns next to a base column and
//! fills them from per-row payloads fetched elsewhere, splitting a row
//! into a record of several rows where a payload carries more than one
//! value row. Changes can be applied, reverted and re-applied, and are
//! persisted in a line-oriented text format.

pub mod cli;
pub mod codec;
pub mod config;
pub mod extension;
pub mod history;
pub mod model;
pub mod observability;

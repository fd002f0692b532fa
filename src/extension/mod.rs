//! Data extension
//!
//! Merges externally fetched, possibly one-to-many data into the table as
//! new columns, as a reversible change.
//!
//! # Components
//!
//! - `payload` - extension values and value-to-cell conversion
//! - `expand` - the row splicing pass
//! - `change` - the change record: apply / revert / cached snapshots
//!
//! # Invariants
//!
//! - Cell indices for the new columns are minted once, contiguously
//! - Expansion runs at most once per change, even across save/reload
//! - revert(apply(rows)) restores rows exactly

mod change;
mod errors;
mod expand;
mod payload;

pub use change::{ApplyOutcome, ChangeState, DataExtensionChange, ExtensionSnapshots, RowIndexPolicy};
pub use errors::{ChangeError, ChangeResult, Severity};
pub use expand::{expand_rows, Expansion, ExpansionPlan};
pub use payload::{DataExtension, ExtensionValue};

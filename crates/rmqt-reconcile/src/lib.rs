//! rmqt-reconcile
//!
//! Topology reconciliation: comparing snapshots, restoring them onto a broker
//! and auditing them.
//!
//! Architectural decisions:
//! - Diffing is pure and keyed by case-folded entity titles
//! - Restore is additive: it creates what is missing and never deletes
//! - One entity failing never aborts a restore; the report records it
//! - Snapshots are taken per vhost, without auto-delete entities
//!
//! Broker access goes through `rmqt_management::ManagementClient` only.

mod diff;
mod engine;
mod equality;
mod fetch;
mod masstransit;
mod restore;
mod types;

pub use diff::{diff_by, DiffItem, DiffKind, DiffList};
pub use engine::diff;
pub use equality::{
    arguments_equal, bindings_equal, bindings_equivalent, eq_ci, exchanges_equal, fold_key,
    queues_equal,
};
pub use fetch::fetch;
pub use masstransit::validate_masstransit;
pub use restore::restore;
pub use types::*;

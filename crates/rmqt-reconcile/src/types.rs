use std::fmt;

use rmqt_management::ManagementError;
use rmqt_schemas::{Binding, Exchange, Queue};

use crate::diff::DiffList;

// ---------------------------------------------------------------------------
// Diff
// ---------------------------------------------------------------------------

/// Per-kind differences between two schemas. VHosts are not compared.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SchemaDiff {
    pub exchanges: DiffList<Exchange>,
    pub queues: DiffList<Queue>,
    pub bindings: DiffList<Binding>,
}

impl SchemaDiff {
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty() && self.queues.is_empty() && self.bindings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.exchanges.len() + self.queues.len() + self.bindings.len()
    }
}

// ---------------------------------------------------------------------------
// Restore
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EntityKind {
    VHost,
    Exchange,
    Queue,
    Binding,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::VHost => "vhost",
            EntityKind::Exchange => "exchange",
            EntityKind::Queue => "queue",
            EntityKind::Binding => "binding",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What restore did for one entity that it handled without error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityOutcome {
    /// Already present on the broker; nothing sent.
    Existing,
    /// Missing and created.
    Created,
}

/// Tally for one restore stage.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StageCounts {
    pub created: usize,
    pub existing: usize,
    /// Malformed entries (blank names, unknown destination type).
    pub skipped: usize,
    pub failed: usize,
}

impl StageCounts {
    pub fn total(&self) -> usize {
        self.created + self.existing + self.skipped + self.failed
    }
}

impl fmt::Display for StageCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "created={} existing={} skipped={} failed={}",
            self.created, self.existing, self.skipped, self.failed
        )
    }
}

/// One entity restore could not handle. Later entities are still processed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestoreFailure {
    pub kind: EntityKind,
    pub title: String,
    pub error: ManagementError,
}

impl fmt::Display for RestoreFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.kind, self.title, self.error)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub vhosts: StageCounts,
    pub exchanges: StageCounts,
    pub queues: StageCounts,
    pub bindings: StageCounts,
    pub failures: Vec<RestoreFailure>,
}

impl RestoreReport {
    pub fn stage(&self, kind: EntityKind) -> &StageCounts {
        match kind {
            EntityKind::VHost => &self.vhosts,
            EntityKind::Exchange => &self.exchanges,
            EntityKind::Queue => &self.queues,
            EntityKind::Binding => &self.bindings,
        }
    }

    pub(crate) fn stage_mut(&mut self, kind: EntityKind) -> &mut StageCounts {
        match kind {
            EntityKind::VHost => &mut self.vhosts,
            EntityKind::Exchange => &mut self.exchanges,
            EntityKind::Queue => &mut self.queues,
            EntityKind::Binding => &mut self.bindings,
        }
    }

    pub fn created(&self) -> usize {
        self.stages().map(|s| s.created).sum()
    }

    pub fn failed(&self) -> usize {
        self.stages().map(|s| s.failed).sum()
    }

    /// No entity failed. Skipped entries do not count against a clean run.
    pub fn is_clean(&self) -> bool {
        self.failed() == 0
    }

    fn stages(&self) -> impl Iterator<Item = &StageCounts> {
        [&self.vhosts, &self.exchanges, &self.queues, &self.bindings].into_iter()
    }
}

// ---------------------------------------------------------------------------
// Masstransit
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MasstransitReport {
    /// Names present both as an exchange and as a queue, in exchange order.
    pub candidates: Vec<String>,
    /// Candidates with no self-named binding.
    pub missing_bindings: Vec<String>,
}

impl MasstransitReport {
    pub fn is_consistent(&self) -> bool {
        self.missing_bindings.is_empty()
    }
}

//! rmqt-schemas
//!
//! In-memory model of one vhost's declared topology (vhosts, exchanges, queues,
//! bindings) and the snapshot document it serializes to.
//!
//! A [`Schema`] is built once (by a fetch or by reading a snapshot file) and is
//! only read afterwards. Nothing here talks to a broker.

mod entities;

pub use entities::*;

use serde::{Deserialize, Serialize};

/// Human-readable identity used in logs, diff output and as the diff key.
pub trait Titled {
    fn title(&self) -> String;
}

/// `'<vhost>/<element>'` with the vhost's surrounding slashes trimmed, so the
/// default vhost renders as `'/orders'`.
pub fn element_title(vhost: &str, element: &str) -> String {
    format!("'{}/{}'", vhost.trim_matches('/'), element)
}

/// One snapshot: the topology of exactly one vhost.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    #[serde(rename = "VHosts", alias = "Vhosts", alias = "vhosts", default)]
    pub vhosts: Vec<VHost>,
    #[serde(rename = "Exchanges", alias = "exchanges", default)]
    pub exchanges: Vec<Exchange>,
    #[serde(rename = "Queues", alias = "queues", default)]
    pub queues: Vec<Queue>,
    #[serde(rename = "Bindings", alias = "bindings", default)]
    pub bindings: Vec<Binding>,
}

impl Schema {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a snapshot document. Unknown fields (broker statistics in older
    /// snapshots) are ignored.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        // Tolerate a UTF-8 BOM; snapshots are often produced on Windows.
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);
        serde_json::from_str(raw)
    }

    /// Pretty (two-space) snapshot document.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn entity_count(&self) -> usize {
        self.vhosts.len() + self.exchanges.len() + self.queues.len() + self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entity_count() == 0
    }
}

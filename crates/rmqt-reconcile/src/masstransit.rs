//! Consistency check for the convention where a consumer owns an exchange and
//! a queue of the same name, joined by a binding between the two.

use std::collections::HashSet;

use tracing::{debug, warn};

use rmqt_schemas::Schema;

use crate::equality::{eq_ci, fold_key};
use crate::types::MasstransitReport;

/// Read-only. Never fails; every finding is logged and returned.
pub fn validate_masstransit(schema: &Schema) -> MasstransitReport {
    let queue_names: HashSet<String> = schema.queues.iter().map(|q| fold_key(&q.name)).collect();

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();
    for exchange in &schema.exchanges {
        let key = fold_key(&exchange.name);
        if queue_names.contains(&key) && seen.insert(key) {
            debug!("Found: '{}'.", exchange.name);
            candidates.push(exchange.name.clone());
        }
    }

    let missing_bindings: Vec<String> = candidates
        .iter()
        .filter(|name| {
            !schema
                .bindings
                .iter()
                .any(|b| eq_ci(&b.source, name) && eq_ci(&b.destination, name))
        })
        .cloned()
        .collect();

    for name in &missing_bindings {
        warn!("Missing binding: '{name}' exchange -> '{name}' queue.");
    }

    MasstransitReport {
        candidates,
        missing_bindings,
    }
}

//! Build a [`Schema`] snapshot of one vhost from a live broker.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use rmqt_management::{ManagementClient, ManagementError};
use rmqt_schemas::{DestinationKind, Schema};

use crate::equality::eq_ci;

/// Snapshot `vhost`.
///
/// - vhosts: only the matching vhost (case-insensitive).
/// - exchanges/queues: auto-delete entities are dropped; sorted by vhost then
///   name.
/// - bindings: kept only when the source is a retained exchange and the
///   destination a retained queue or exchange (per destination type); sorted
///   by vhost, source, destination.
///
/// Any transport or API error aborts the fetch.
pub fn fetch(client: &dyn ManagementClient, vhost: &str) -> Result<Schema, ManagementError> {
    let vhosts: Vec<_> = client
        .list_vhosts()?
        .into_iter()
        .filter(|v| eq_ci(&v.name, vhost))
        .collect();

    let mut exchanges: Vec<_> = client
        .list_exchanges(vhost)?
        .into_iter()
        .filter(|e| !e.auto_delete && eq_ci(&e.vhost, vhost))
        .collect();
    exchanges.sort_by(|a, b| {
        ci_order(&a.vhost, &b.vhost).then_with(|| ci_order(&a.name, &b.name))
    });

    let mut queues: Vec<_> = client
        .list_queues(vhost)?
        .into_iter()
        .filter(|q| !q.auto_delete && eq_ci(&q.vhost, vhost))
        .collect();
    queues.sort_by(|a, b| ci_order(&a.vhost, &b.vhost).then_with(|| ci_order(&a.name, &b.name)));

    let exchange_names: HashSet<&str> = exchanges.iter().map(|e| e.name.as_str()).collect();
    let queue_names: HashSet<&str> = queues.iter().map(|q| q.name.as_str()).collect();

    let mut bindings: Vec<_> = client
        .list_bindings(vhost)?
        .into_iter()
        .filter(|b| eq_ci(&b.vhost, vhost))
        .filter(|b| exchange_names.contains(b.source.as_str()))
        .filter(|b| match b.destination_kind() {
            Some(DestinationKind::Queue) => queue_names.contains(b.destination.as_str()),
            Some(DestinationKind::Exchange) => exchange_names.contains(b.destination.as_str()),
            None => false,
        })
        .collect();
    bindings.sort_by(|a, b| {
        ci_order(&a.vhost, &b.vhost)
            .then_with(|| ci_order(&a.source, &b.source))
            .then_with(|| ci_order(&a.destination, &b.destination))
    });

    let schema = Schema {
        vhosts,
        exchanges,
        queues,
        bindings,
    };
    debug!(
        vhost,
        exchanges = schema.exchanges.len(),
        queues = schema.queues.len(),
        bindings = schema.bindings.len(),
        "fetched schema"
    );
    Ok(schema)
}

/// Case-insensitive order with an ordinal tie-break, so the output is total
/// and stable across runs.
fn ci_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

//! Additive restore of a schema onto a live broker.
//!
//! Stages run in a fixed order (vhosts, exchanges, queues, bindings) because
//! later stages depend on entities created by earlier ones. Nothing is ever
//! deleted. A failure on one entity is recorded in the report and the run
//! moves on to the next entity.

use tracing::{debug, error, info};

use rmqt_management::{BindingSpec, ExchangeSpec, ManagementClient, ManagementError, QueueSpec};
use rmqt_schemas::{Binding, DestinationKind, Exchange, Queue, Schema, Titled, VHost};

use crate::equality::bindings_equivalent;
use crate::types::{EntityKind, EntityOutcome, RestoreFailure, RestoreReport};

pub fn restore(schema: &Schema, client: &dyn ManagementClient) -> RestoreReport {
    let mut report = RestoreReport::default();

    run_stage(&mut report, EntityKind::VHost, &schema.vhosts, |v| {
        restore_vhost(client, v)
    });
    run_stage(&mut report, EntityKind::Exchange, &schema.exchanges, |e| {
        restore_exchange(client, e)
    });
    run_stage(&mut report, EntityKind::Queue, &schema.queues, |q| {
        restore_queue(client, q)
    });
    run_stage(&mut report, EntityKind::Binding, &schema.bindings, |b| {
        restore_binding(client, b)
    });

    report
}

/// Entities restore cannot act on. They are counted as skipped, never logged.
trait Restorable: Titled {
    fn is_malformed(&self) -> bool;
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

impl Restorable for VHost {
    fn is_malformed(&self) -> bool {
        blank(&self.name)
    }
}

impl Restorable for Exchange {
    fn is_malformed(&self) -> bool {
        blank(&self.name)
    }
}

impl Restorable for Queue {
    fn is_malformed(&self) -> bool {
        blank(&self.name)
    }
}

impl Restorable for Binding {
    fn is_malformed(&self) -> bool {
        blank(&self.source) || blank(&self.destination) || self.destination_kind().is_none()
    }
}

fn run_stage<T, F>(report: &mut RestoreReport, kind: EntityKind, items: &[T], mut restore_one: F)
where
    T: Restorable,
    F: FnMut(&T) -> Result<EntityOutcome, ManagementError>,
{
    for item in items {
        if item.is_malformed() {
            report.stage_mut(kind).skipped += 1;
            continue;
        }

        let title = item.title();
        match restore_one(item) {
            Ok(EntityOutcome::Existing) => {
                debug!("{} {} is alive.", title, kind);
                report.stage_mut(kind).existing += 1;
            }
            Ok(EntityOutcome::Created) => {
                info!("{} {} is created.", title, kind);
                report.stage_mut(kind).created += 1;
            }
            Err(e) => {
                error!(%title, %kind, error = %e, "could not restore entity");
                report.stage_mut(kind).failed += 1;
                report.failures.push(RestoreFailure {
                    kind,
                    title,
                    error: e,
                });
            }
        }
    }
}

/// Read first; create only when the read says the entity does not exist.
fn ensure<T>(
    lookup: Result<T, ManagementError>,
    create: impl FnOnce() -> Result<(), ManagementError>,
) -> Result<EntityOutcome, ManagementError> {
    match lookup {
        Ok(_) => Ok(EntityOutcome::Existing),
        Err(e) if e.is_not_found() => {
            create()?;
            Ok(EntityOutcome::Created)
        }
        Err(e) => Err(e),
    }
}

fn restore_vhost(
    client: &dyn ManagementClient,
    vhost: &VHost,
) -> Result<EntityOutcome, ManagementError> {
    ensure(client.get_vhost(&vhost.name), || {
        client.create_vhost(&vhost.name)
    })
}

fn restore_exchange(
    client: &dyn ManagementClient,
    exchange: &Exchange,
) -> Result<EntityOutcome, ManagementError> {
    ensure(client.get_exchange(&exchange.vhost, &exchange.name), || {
        client.create_exchange(&exchange.vhost, &ExchangeSpec::from(exchange))
    })
}

fn restore_queue(
    client: &dyn ManagementClient,
    queue: &Queue,
) -> Result<EntityOutcome, ManagementError> {
    ensure(client.get_queue(&queue.vhost, &queue.name), || {
        client.create_queue(&queue.vhost, &QueueSpec::from(queue))
    })
}

fn restore_binding(
    client: &dyn ManagementClient,
    binding: &Binding,
) -> Result<EntityOutcome, ManagementError> {
    let spec = BindingSpec::from_binding(binding).ok_or_else(|| {
        ManagementError::InvalidRequest(format!(
            "unsupported destination type '{}'",
            binding.destination_type
        ))
    })?;

    let live = match spec.destination_kind {
        DestinationKind::Queue => {
            client.get_bindings_for_queue(&binding.vhost, &binding.destination)?
        }
        DestinationKind::Exchange => {
            client.get_bindings_with_destination_exchange(&binding.vhost, &binding.destination)?
        }
    };

    if live.iter().any(|l| bindings_equivalent(l, binding)) {
        return Ok(EntityOutcome::Existing);
    }

    client.create_binding(&binding.vhost, &spec)?;
    Ok(EntityOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_creates_only_on_not_found() {
        let mut created = false;
        let out = ensure::<()>(Err(ManagementError::not_found("q")), || {
            created = true;
            Ok(())
        })
        .unwrap();
        assert_eq!(out, EntityOutcome::Created);
        assert!(created);

        let out = ensure(Ok(()), || panic!("must not create")).unwrap();
        assert_eq!(out, EntityOutcome::Existing);

        let err = ensure::<()>(
            Err(ManagementError::Transport("reset".into())),
            || panic!("must not create"),
        )
        .unwrap_err();
        assert!(matches!(err, ManagementError::Transport(_)));
    }

    #[test]
    fn bindings_need_source_destination_and_known_type() {
        let ok = Binding::new("/", "orders", "q1", DestinationKind::Queue, "rk");
        assert!(!ok.is_malformed());

        let mut b = ok.clone();
        b.source = " ".into();
        assert!(b.is_malformed());

        let mut b = ok.clone();
        b.destination_type = "stream".into();
        assert!(b.is_malformed());
    }
}

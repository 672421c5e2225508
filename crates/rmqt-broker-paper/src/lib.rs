//! Deterministic in-memory "paper" broker.
//!
//! Implements [`ManagementClient`] over plain maps so fetch and restore can be
//! exercised without a RabbitMQ node.
//!
//! Design decisions (kept intentionally simple/deterministic):
//! - Names are case-sensitive, as on a real broker.
//! - Declaring an entity that already exists with the same attributes is a
//!   no-op; with different attributes it fails with 400 "inequivalent arg",
//!   like the management API does.
//! - Exchanges and queues require their vhost; bindings require both ends.
//! - `properties_key` is derived deterministically: the routing key (or `~`
//!   when empty) for argument-less bindings, `rk~k=v,...` otherwise.
//! - Failures can be injected per operation and entity name to prove that
//!   callers isolate them.
//! - Every successful mutation is counted so idempotence can be asserted.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use rmqt_management::{BindingSpec, ExchangeSpec, ManagementClient, ManagementError, QueueSpec};
use rmqt_schemas::{Arguments, Binding, DestinationKind, Exchange, Queue, VHost};

/// Operations that can be made to fail via [`PaperBroker::fail_on`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Operation {
    GetVhost,
    CreateVhost,
    GetExchange,
    CreateExchange,
    GetQueue,
    CreateQueue,
    ListBindingsForDestination,
    CreateBinding,
}

#[derive(Clone, Debug, Default)]
struct BrokerState {
    vhosts: BTreeMap<String, VHost>,
    exchanges: BTreeMap<(String, String), Exchange>,
    queues: BTreeMap<(String, String), Queue>,
    bindings: Vec<Binding>,
    // (operation, entity name) -> message
    failures: BTreeMap<(Operation, String), String>,
    mutations: usize,
}

#[derive(Debug, Default)]
pub struct PaperBroker {
    state: Mutex<BrokerState>,
}

impl PaperBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// A broker that already has the given vhost.
    pub fn with_vhost(name: &str) -> Self {
        let b = Self::new();
        b.seed_vhost(name);
        b
    }

    fn state(&self) -> MutexGuard<'_, BrokerState> {
        // A panic in a test thread must not hide the broker state from the assertions.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // ---------------------------------------------------------------------
    // Test setup (not counted as mutations)
    // ---------------------------------------------------------------------

    pub fn seed_vhost(&self, name: &str) {
        self.state()
            .vhosts
            .insert(name.to_string(), VHost::new(name));
    }

    pub fn seed_exchange(&self, exchange: Exchange) {
        let key = (exchange.vhost.clone(), exchange.name.clone());
        self.state().exchanges.insert(key, exchange);
    }

    pub fn seed_queue(&self, queue: Queue) {
        let key = (queue.vhost.clone(), queue.name.clone());
        self.state().queues.insert(key, queue);
    }

    pub fn seed_binding(&self, binding: Binding) {
        self.state().bindings.push(binding);
    }

    /// Make `op` fail for the entity called `name` until cleared.
    pub fn fail_on(&self, op: Operation, name: &str, message: &str) {
        self.state()
            .failures
            .insert((op, name.to_string()), message.to_string());
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    // ---------------------------------------------------------------------
    // Inspection
    // ---------------------------------------------------------------------

    /// Number of successful create calls that changed broker state.
    pub fn mutation_count(&self) -> usize {
        self.state().mutations
    }

    pub fn has_vhost(&self, name: &str) -> bool {
        self.state().vhosts.contains_key(name)
    }

    pub fn has_exchange(&self, vhost: &str, name: &str) -> bool {
        self.state()
            .exchanges
            .contains_key(&(vhost.to_string(), name.to_string()))
    }

    pub fn has_queue(&self, vhost: &str, name: &str) -> bool {
        self.state()
            .queues
            .contains_key(&(vhost.to_string(), name.to_string()))
    }

    pub fn all_bindings(&self) -> Vec<Binding> {
        self.state().bindings.clone()
    }

    fn check_failure(&self, op: Operation, name: &str) -> Result<(), ManagementError> {
        match self.state().failures.get(&(op, name.to_string())) {
            Some(message) => Err(ManagementError::Api {
                status: 500,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn inequivalent(what: &str) -> ManagementError {
    ManagementError::Api {
        status: 400,
        message: format!("inequivalent arg for {what}"),
    }
}

fn properties_key(routing_key: &str, arguments: &Arguments) -> String {
    if arguments.is_empty() {
        if routing_key.is_empty() {
            "~".to_string()
        } else {
            routing_key.to_string()
        }
    } else {
        let args: Vec<String> = arguments.iter().map(|(k, v)| format!("{k}={v}")).collect();
        format!("{routing_key}~{}", args.join(","))
    }
}

impl ManagementClient for PaperBroker {
    fn list_vhosts(&self) -> Result<Vec<VHost>, ManagementError> {
        Ok(self.state().vhosts.values().cloned().collect())
    }

    fn get_vhost(&self, name: &str) -> Result<VHost, ManagementError> {
        self.check_failure(Operation::GetVhost, name)?;
        self.state()
            .vhosts
            .get(name)
            .cloned()
            .ok_or_else(|| ManagementError::not_found(format!("vhost '{name}'")))
    }

    fn create_vhost(&self, name: &str) -> Result<(), ManagementError> {
        self.check_failure(Operation::CreateVhost, name)?;
        let mut st = self.state();
        if !st.vhosts.contains_key(name) {
            st.vhosts.insert(name.to_string(), VHost::new(name));
            st.mutations += 1;
        }
        Ok(())
    }

    fn get_exchange(&self, vhost: &str, name: &str) -> Result<Exchange, ManagementError> {
        self.check_failure(Operation::GetExchange, name)?;
        self.state()
            .exchanges
            .get(&(vhost.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ManagementError::not_found(format!("exchange '{vhost}/{name}'")))
    }

    fn create_exchange(&self, vhost: &str, spec: &ExchangeSpec) -> Result<(), ManagementError> {
        self.check_failure(Operation::CreateExchange, &spec.name)?;
        let mut st = self.state();
        if !st.vhosts.contains_key(vhost) {
            return Err(ManagementError::not_found(format!("vhost '{vhost}'")));
        }
        let wanted = Exchange {
            name: spec.name.clone(),
            vhost: vhost.to_string(),
            kind: spec.kind.clone(),
            durable: spec.durable,
            auto_delete: spec.auto_delete,
            internal: spec.internal,
            arguments: spec.arguments.clone(),
        };
        let key = (vhost.to_string(), spec.name.clone());
        match st.exchanges.get(&key) {
            Some(existing) if *existing == wanted => Ok(()),
            Some(_) => Err(inequivalent(&format!("exchange '{vhost}/{}'", spec.name))),
            None => {
                st.exchanges.insert(key, wanted);
                st.mutations += 1;
                Ok(())
            }
        }
    }

    fn get_queue(&self, vhost: &str, name: &str) -> Result<Queue, ManagementError> {
        self.check_failure(Operation::GetQueue, name)?;
        self.state()
            .queues
            .get(&(vhost.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ManagementError::not_found(format!("queue '{vhost}/{name}'")))
    }

    fn create_queue(&self, vhost: &str, spec: &QueueSpec) -> Result<(), ManagementError> {
        self.check_failure(Operation::CreateQueue, &spec.name)?;
        let mut st = self.state();
        if !st.vhosts.contains_key(vhost) {
            return Err(ManagementError::not_found(format!("vhost '{vhost}'")));
        }
        let wanted = Queue {
            name: spec.name.clone(),
            vhost: vhost.to_string(),
            durable: spec.durable,
            auto_delete: spec.auto_delete,
            arguments: spec.arguments.clone(),
        };
        let key = (vhost.to_string(), spec.name.clone());
        match st.queues.get(&key) {
            Some(existing) if *existing == wanted => Ok(()),
            Some(_) => Err(inequivalent(&format!("queue '{vhost}/{}'", spec.name))),
            None => {
                st.queues.insert(key, wanted);
                st.mutations += 1;
                Ok(())
            }
        }
    }

    fn get_bindings_for_queue(
        &self,
        vhost: &str,
        queue: &str,
    ) -> Result<Vec<Binding>, ManagementError> {
        self.check_failure(Operation::ListBindingsForDestination, queue)?;
        let st = self.state();
        if !st.queues.contains_key(&(vhost.to_string(), queue.to_string())) {
            return Err(ManagementError::not_found(format!("queue '{vhost}/{queue}'")));
        }
        Ok(st
            .bindings
            .iter()
            .filter(|b| {
                b.vhost == vhost
                    && b.destination == queue
                    && b.destination_kind() == Some(DestinationKind::Queue)
            })
            .cloned()
            .collect())
    }

    fn get_bindings_with_destination_exchange(
        &self,
        vhost: &str,
        exchange: &str,
    ) -> Result<Vec<Binding>, ManagementError> {
        self.check_failure(Operation::ListBindingsForDestination, exchange)?;
        let st = self.state();
        if !st
            .exchanges
            .contains_key(&(vhost.to_string(), exchange.to_string()))
        {
            return Err(ManagementError::not_found(format!(
                "exchange '{vhost}/{exchange}'"
            )));
        }
        Ok(st
            .bindings
            .iter()
            .filter(|b| {
                b.vhost == vhost
                    && b.destination == exchange
                    && b.destination_kind() == Some(DestinationKind::Exchange)
            })
            .cloned()
            .collect())
    }

    fn create_binding(&self, vhost: &str, spec: &BindingSpec) -> Result<(), ManagementError> {
        self.check_failure(Operation::CreateBinding, &spec.destination)?;
        let mut st = self.state();
        if !st
            .exchanges
            .contains_key(&(vhost.to_string(), spec.source.clone()))
        {
            return Err(ManagementError::not_found(format!(
                "exchange '{vhost}/{}'",
                spec.source
            )));
        }
        let dest_key = (vhost.to_string(), spec.destination.clone());
        let dest_exists = match spec.destination_kind {
            DestinationKind::Queue => st.queues.contains_key(&dest_key),
            DestinationKind::Exchange => st.exchanges.contains_key(&dest_key),
        };
        if !dest_exists {
            return Err(ManagementError::not_found(format!(
                "{} '{vhost}/{}'",
                spec.destination_kind.as_str(),
                spec.destination
            )));
        }

        let binding = Binding {
            source: spec.source.clone(),
            vhost: vhost.to_string(),
            destination: spec.destination.clone(),
            destination_type: spec.destination_kind.as_str().to_string(),
            routing_key: spec.routing_key.clone(),
            arguments: spec.arguments.clone(),
            properties_key: properties_key(&spec.routing_key, &spec.arguments),
        };
        if !st.bindings.contains(&binding) {
            st.bindings.push(binding);
            st.mutations += 1;
        }
        Ok(())
    }

    fn list_exchanges(&self, vhost: &str) -> Result<Vec<Exchange>, ManagementError> {
        Ok(self
            .state()
            .exchanges
            .values()
            .filter(|e| e.vhost == vhost)
            .cloned()
            .collect())
    }

    fn list_queues(&self, vhost: &str) -> Result<Vec<Queue>, ManagementError> {
        Ok(self
            .state()
            .queues
            .values()
            .filter(|q| q.vhost == vhost)
            .cloned()
            .collect())
    }

    fn list_bindings(&self, vhost: &str) -> Result<Vec<Binding>, ManagementError> {
        Ok(self
            .state()
            .bindings
            .iter()
            .filter(|b| b.vhost == vhost)
            .cloned()
            .collect())
    }

    fn is_alive(&self, vhost: &str) -> Result<bool, ManagementError> {
        Ok(self.state().vhosts.contains_key(vhost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmqt_schemas::ExchangeType;

    fn exchange_spec(name: &str) -> ExchangeSpec {
        ExchangeSpec::from(&Exchange::new("/", name, ExchangeType::Direct))
    }

    #[test]
    fn declare_requires_vhost() {
        let b = PaperBroker::new();
        let err = b.create_exchange("/", &exchange_spec("ex")).unwrap_err();
        assert!(err.is_not_found());

        b.create_vhost("/").unwrap();
        b.create_exchange("/", &exchange_spec("ex")).unwrap();
        assert!(b.has_exchange("/", "ex"));
    }

    #[test]
    fn redeclare_is_idempotent_and_counted_once() {
        let b = PaperBroker::with_vhost("/");
        b.create_exchange("/", &exchange_spec("ex")).unwrap();
        b.create_exchange("/", &exchange_spec("ex")).unwrap();
        assert_eq!(b.mutation_count(), 1);
    }

    #[test]
    fn inequivalent_redeclare_is_rejected() {
        let b = PaperBroker::with_vhost("/");
        b.create_queue("/", &QueueSpec::from(&Queue::new("/", "q")))
            .unwrap();

        let mut transient = Queue::new("/", "q");
        transient.durable = false;
        let err = b.create_queue("/", &QueueSpec::from(&transient)).unwrap_err();
        assert!(matches!(err, ManagementError::Api { status: 400, .. }));
    }

    #[test]
    fn binding_requires_both_ends() {
        let b = PaperBroker::with_vhost("/");
        b.create_exchange("/", &exchange_spec("ex")).unwrap();
        let spec = BindingSpec {
            source: "ex".into(),
            destination: "q".into(),
            destination_kind: DestinationKind::Queue,
            routing_key: "".into(),
            arguments: Arguments::new(),
        };
        assert!(b.create_binding("/", &spec).unwrap_err().is_not_found());

        b.create_queue("/", &QueueSpec::from(&Queue::new("/", "q")))
            .unwrap();
        b.create_binding("/", &spec).unwrap();
        let bound = b.get_bindings_for_queue("/", "q").unwrap();
        assert_eq!(bound.len(), 1);
        assert_eq!(bound[0].properties_key, "~");
    }

    #[test]
    fn injected_failure_surfaces_as_api_error() {
        let b = PaperBroker::with_vhost("/");
        b.fail_on(Operation::CreateExchange, "ex", "boom");
        let err = b.create_exchange("/", &exchange_spec("ex")).unwrap_err();
        assert_eq!(err.to_string(), "management api error status=500: boom");

        b.clear_failures();
        b.create_exchange("/", &exchange_spec("ex")).unwrap();
    }

    #[test]
    fn names_are_case_sensitive() {
        let b = PaperBroker::with_vhost("/");
        b.seed_queue(Queue::new("/", "Orders"));
        assert!(b.get_queue("/", "orders").unwrap_err().is_not_found());
        assert!(b.get_queue("/", "Orders").is_ok());
    }

    #[test]
    fn properties_key_includes_arguments() {
        let mut args = Arguments::new();
        args.insert("x-match".into(), "all".into());
        assert_eq!(properties_key("rk", &args), "rk~x-match=all");
        assert_eq!(properties_key("", &Arguments::new()), "~");
    }
}

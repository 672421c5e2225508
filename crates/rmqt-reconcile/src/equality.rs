//! Equality policies for topology entities.
//!
//! Names, vhosts and exchange types compare case-insensitively; flags compare
//! exactly. The diff policies deliberately ignore `arguments`; the restore
//! presence check for bindings ([`bindings_equivalent`]) does not.

use rmqt_schemas::{Arguments, Binding, Exchange, Queue};

/// Case-insensitive string comparison used by every policy.
pub fn eq_ci(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Normalized form of a case-insensitive identity (diff keys, name sets).
pub fn fold_key(s: &str) -> String {
    s.to_lowercase()
}

pub fn exchanges_equal(a: &Exchange, b: &Exchange) -> bool {
    eq_ci(&a.vhost, &b.vhost)
        && eq_ci(&a.name, &b.name)
        && eq_ci(a.kind.as_str(), b.kind.as_str())
        && a.durable == b.durable
        && a.auto_delete == b.auto_delete
        && a.internal == b.internal
}

pub fn queues_equal(a: &Queue, b: &Queue) -> bool {
    eq_ci(&a.vhost, &b.vhost)
        && eq_ci(&a.name, &b.name)
        && a.durable == b.durable
        && a.auto_delete == b.auto_delete
}

pub fn bindings_equal(a: &Binding, b: &Binding) -> bool {
    eq_ci(&a.vhost, &b.vhost)
        && eq_ci(&a.source, &b.source)
        && eq_ci(&a.destination, &b.destination)
        && eq_ci(&a.destination_type, &b.destination_type)
        && eq_ci(&a.routing_key, &b.routing_key)
        && eq_ci(&a.properties_key, &b.properties_key)
}

/// Same size, and every key of `a` is present in `b` (exact key match) with a
/// case-insensitively equal value.
pub fn arguments_equal(a: &Arguments, b: &Arguments) -> bool {
    a.len() == b.len()
        && a
            .iter()
            .all(|(k, v)| b.get(k).is_some_and(|other| eq_ci(v, other)))
}

/// Binding presence check used by restore: [`bindings_equal`] plus arguments.
pub fn bindings_equivalent(a: &Binding, b: &Binding) -> bool {
    bindings_equal(a, b) && arguments_equal(&a.arguments, &b.arguments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmqt_schemas::{DestinationKind, ExchangeType};

    #[test]
    fn exchange_policy_ignores_case_and_arguments() {
        let a = Exchange::new("/", "Orders", ExchangeType::Topic);
        let mut b = Exchange::new("/", "orders", ExchangeType::Custom("TOPIC".into()));
        b.arguments.insert("alternate-exchange".into(), "ae".into());
        assert!(exchanges_equal(&a, &b));

        b.internal = true;
        assert!(!exchanges_equal(&a, &b));
    }

    #[test]
    fn queue_policy_compares_flags_exactly() {
        let a = Queue::new("/", "q1");
        let mut b = Queue::new("/", "Q1");
        assert!(queues_equal(&a, &b));
        b.durable = false;
        assert!(!queues_equal(&a, &b));
    }

    #[test]
    fn arguments_values_fold_case_keys_do_not() {
        let mut a = Arguments::new();
        a.insert("x-queue-mode".into(), "Lazy".into());
        let mut b = Arguments::new();
        b.insert("x-queue-mode".into(), "lazy".into());
        assert!(arguments_equal(&a, &b));

        let mut c = Arguments::new();
        c.insert("X-Queue-Mode".into(), "lazy".into());
        assert!(!arguments_equal(&a, &c));

        b.insert("x-max-length".into(), "10".into());
        assert!(!arguments_equal(&a, &b));
    }

    #[test]
    fn restore_policy_sees_arguments_the_diff_policy_does_not() {
        let a = Binding::new("/", "hdrs", "q1", DestinationKind::Queue, "");
        let mut b = a.clone();
        b.arguments.insert("x-match".into(), "all".into());

        assert!(bindings_equal(&a, &b));
        assert!(!bindings_equivalent(&a, &b));
    }
}

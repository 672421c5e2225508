use rmqt_schemas::{Schema, Titled};

use crate::diff::diff_by;
use crate::equality::{bindings_equal, exchanges_equal, fold_key, queues_equal};
use crate::types::SchemaDiff;

/// Compare exchanges, queues and bindings of two schemas.
///
/// Entities are keyed by their case-folded title, so a binding's identity is
/// vhost + source + destination + destination type. Routing key and
/// properties key differences produce `Changed`. Arguments are ignored.
pub fn diff(left: &Schema, right: &Schema) -> SchemaDiff {
    SchemaDiff {
        exchanges: diff_by(
            left.exchanges.iter().cloned(),
            right.exchanges.iter().cloned(),
            |e| fold_key(&e.title()),
            exchanges_equal,
        ),
        queues: diff_by(
            left.queues.iter().cloned(),
            right.queues.iter().cloned(),
            |q| fold_key(&q.title()),
            queues_equal,
        ),
        bindings: diff_by(
            left.bindings.iter().cloned(),
            right.bindings.iter().cloned(),
            |b| fold_key(&b.title()),
            bindings_equal,
        ),
    }
}

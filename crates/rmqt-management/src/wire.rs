//! Management API wire format.
//!
//! The HTTP API speaks snake_case JSON and carries argument values of any JSON
//! type. The raw structs below mirror those payloads; `into_model` converts
//! them into the snapshot model. Unknown fields (statistics, policies, node
//! names) are ignored so newer broker versions don't break decoding.

use rmqt_schemas::{argument_value_to_string, Arguments, Binding, Exchange, ExchangeType, Queue, VHost};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{BindingSpec, ExchangeSpec, QueueSpec};

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawVhost {
    pub name: String,
}

impl RawVhost {
    pub fn into_model(self) -> VHost {
        VHost::new(self.name)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawExchange {
    pub name: String,
    pub vhost: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub durable: bool,
    pub auto_delete: bool,
    pub internal: bool,
    pub arguments: Option<Map<String, Value>>,
}

impl RawExchange {
    pub fn into_model(self) -> Exchange {
        Exchange {
            name: self.name,
            vhost: self.vhost,
            kind: ExchangeType::parse(&self.kind),
            durable: self.durable,
            auto_delete: self.auto_delete,
            internal: self.internal,
            arguments: arguments_from_wire(self.arguments),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawQueue {
    pub name: String,
    pub vhost: String,
    pub durable: bool,
    pub auto_delete: bool,
    pub arguments: Option<Map<String, Value>>,
}

impl RawQueue {
    pub fn into_model(self) -> Queue {
        Queue {
            name: self.name,
            vhost: self.vhost,
            durable: self.durable,
            auto_delete: self.auto_delete,
            arguments: arguments_from_wire(self.arguments),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawBinding {
    pub source: String,
    pub vhost: String,
    pub destination: String,
    pub destination_type: String,
    pub routing_key: String,
    pub arguments: Option<Map<String, Value>>,
    pub properties_key: String,
}

impl RawBinding {
    pub fn into_model(self) -> Binding {
        Binding {
            source: self.source,
            vhost: self.vhost,
            destination: self.destination,
            destination_type: self.destination_type,
            routing_key: self.routing_key,
            arguments: arguments_from_wire(self.arguments),
            properties_key: self.properties_key,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawAliveness {
    pub status: String,
}

/// Error body shape: `{"error": "...", "reason": "..."}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawApiError {
    pub error: Option<String>,
    pub reason: Option<String>,
}

impl RawApiError {
    pub fn message(&self) -> Option<String> {
        match (&self.error, &self.reason) {
            (Some(e), Some(r)) => Some(format!("{e}: {r}")),
            (None, Some(r)) => Some(r.clone()),
            (Some(e), None) => Some(e.clone()),
            (None, None) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub(crate) struct ExchangeDeclare {
    #[serde(rename = "type")]
    pub kind: String,
    pub auto_delete: bool,
    pub durable: bool,
    pub internal: bool,
    pub arguments: Map<String, Value>,
}

impl From<&ExchangeSpec> for ExchangeDeclare {
    fn from(spec: &ExchangeSpec) -> Self {
        Self {
            kind: spec.kind.as_str().to_string(),
            auto_delete: spec.auto_delete,
            durable: spec.durable,
            internal: spec.internal,
            arguments: arguments_to_wire(&spec.arguments),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QueueDeclare {
    pub auto_delete: bool,
    pub durable: bool,
    pub arguments: Map<String, Value>,
}

impl From<&QueueSpec> for QueueDeclare {
    fn from(spec: &QueueSpec) -> Self {
        Self {
            auto_delete: spec.auto_delete,
            durable: spec.durable,
            arguments: arguments_to_wire(&spec.arguments),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct BindingDeclare {
    pub routing_key: String,
    pub arguments: Map<String, Value>,
}

impl From<&BindingSpec> for BindingDeclare {
    fn from(spec: &BindingSpec) -> Self {
        Self {
            routing_key: spec.routing_key.clone(),
            arguments: arguments_to_wire(&spec.arguments),
        }
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

fn arguments_from_wire(raw: Option<Map<String, Value>>) -> Arguments {
    raw.unwrap_or_default()
        .into_iter()
        .map(|(k, v)| {
            let s = argument_value_to_string(&v);
            (k, s)
        })
        .collect()
}

fn arguments_to_wire(args: &Arguments) -> Map<String, Value> {
    args.iter()
        .map(|(k, v)| (k.clone(), argument_value_for_broker(v)))
        .collect()
}

/// Inverse of the string rendering used in snapshots: values that are JSON
/// numbers or booleans are sent typed (the broker rejects a string
/// `x-message-ttl`), everything else stays a string.
///
/// Snapshots do not record the original JSON type, so an argument that was
/// the string `"2"` on the source broker is declared as the number `2`.
/// Headers-exchange bindings match those two differently.
pub fn argument_value_for_broker(raw: &str) -> Value {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(v @ Value::Number(_)) | Ok(v @ Value::Bool(_)) => v,
        _ => Value::String(raw.to_string()),
    }
}

//! Topology entities as they appear in a snapshot.
//!
//! Field order and wire names follow the snapshot files already in circulation
//! (PascalCase, one object per entity). Readers also accept the lower/snake-case
//! spellings used by the management API so hand-edited snapshots load too.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{element_title, Titled};

/// Free-form `x-*` arguments. Values are kept as strings; see the management
/// client for how non-string broker values are rendered.
pub type Arguments = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// VHost
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VHost {
    #[serde(rename = "Name", alias = "name", default, deserialize_with = "null_as_empty")]
    pub name: String,
}

impl VHost {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Titled for VHost {
    fn title(&self) -> String {
        format!("'{}'", self.name)
    }
}

// ---------------------------------------------------------------------------
// Exchange
// ---------------------------------------------------------------------------

/// Exchange routing type. Unknown plugin types are carried verbatim.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExchangeType {
    #[default]
    Direct,
    Fanout,
    Topic,
    Headers,
    Custom(String),
}

impl ExchangeType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "direct" => ExchangeType::Direct,
            "fanout" => ExchangeType::Fanout,
            "topic" => ExchangeType::Topic,
            "headers" => ExchangeType::Headers,
            _ => ExchangeType::Custom(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ExchangeType::Direct => "direct",
            ExchangeType::Fanout => "fanout",
            ExchangeType::Topic => "topic",
            ExchangeType::Headers => "headers",
            ExchangeType::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for ExchangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ExchangeType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExchangeType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        Ok(ExchangeType::parse(&raw))
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    #[serde(rename = "Name", alias = "name", default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(rename = "Vhost", alias = "vhost", default, deserialize_with = "null_as_empty")]
    pub vhost: String,
    #[serde(rename = "Type", alias = "type", default)]
    pub kind: ExchangeType,
    #[serde(rename = "Durable", alias = "durable", default)]
    pub durable: bool,
    #[serde(
        rename = "AutoDelete",
        alias = "autoDelete",
        alias = "auto_delete",
        default
    )]
    pub auto_delete: bool,
    #[serde(rename = "Internal", alias = "internal", default)]
    pub internal: bool,
    #[serde(rename = "Arguments", alias = "arguments", default, deserialize_with = "lenient_arguments")]
    pub arguments: Arguments,
}

impl Exchange {
    /// A durable, non-internal exchange with no arguments.
    pub fn new(vhost: impl Into<String>, name: impl Into<String>, kind: ExchangeType) -> Self {
        Self {
            name: name.into(),
            vhost: vhost.into(),
            kind,
            durable: true,
            auto_delete: false,
            internal: false,
            arguments: Arguments::new(),
        }
    }
}

impl Titled for Exchange {
    fn title(&self) -> String {
        element_title(&self.vhost, &self.name)
    }
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Queue {
    #[serde(rename = "Name", alias = "name", default, deserialize_with = "null_as_empty")]
    pub name: String,
    #[serde(rename = "Vhost", alias = "vhost", default, deserialize_with = "null_as_empty")]
    pub vhost: String,
    #[serde(rename = "Durable", alias = "durable", default)]
    pub durable: bool,
    #[serde(
        rename = "AutoDelete",
        alias = "autoDelete",
        alias = "auto_delete",
        default
    )]
    pub auto_delete: bool,
    #[serde(rename = "Arguments", alias = "arguments", default, deserialize_with = "lenient_arguments")]
    pub arguments: Arguments,
}

impl Queue {
    /// A durable queue with no arguments.
    pub fn new(vhost: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vhost: vhost.into(),
            durable: true,
            auto_delete: false,
            arguments: Arguments::new(),
        }
    }
}

impl Titled for Queue {
    fn title(&self) -> String {
        element_title(&self.vhost, &self.name)
    }
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// What a binding routes into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DestinationKind {
    Queue,
    Exchange,
}

impl DestinationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKind::Queue => "queue",
            DestinationKind::Exchange => "exchange",
        }
    }

    /// Case-insensitive; `None` for anything the broker would not accept.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "queue" => Some(DestinationKind::Queue),
            "exchange" => Some(DestinationKind::Exchange),
            _ => None,
        }
    }
}

/// A routing rule. `destination_type` is kept as the raw wire string so that
/// snapshots round-trip exactly; use [`Binding::destination_kind`] to branch.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(rename = "Source", alias = "source", default, deserialize_with = "null_as_empty")]
    pub source: String,
    #[serde(rename = "Vhost", alias = "vhost", default, deserialize_with = "null_as_empty")]
    pub vhost: String,
    #[serde(
        rename = "Destination",
        alias = "destination",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub destination: String,
    #[serde(
        rename = "DestinationType",
        alias = "destinationType",
        alias = "destination_type",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub destination_type: String,
    #[serde(
        rename = "RoutingKey",
        alias = "routingKey",
        alias = "routing_key",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub routing_key: String,
    #[serde(rename = "Arguments", alias = "arguments", default, deserialize_with = "lenient_arguments")]
    pub arguments: Arguments,
    #[serde(
        rename = "PropertiesKey",
        alias = "propertiesKey",
        alias = "properties_key",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub properties_key: String,
}

impl Binding {
    /// Binding with no arguments. `properties_key` mirrors what the broker
    /// derives for argument-less bindings (the routing key, or `~` when empty).
    pub fn new(
        vhost: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
        kind: DestinationKind,
        routing_key: impl Into<String>,
    ) -> Self {
        let routing_key = routing_key.into();
        let properties_key = if routing_key.is_empty() {
            "~".to_string()
        } else {
            routing_key.clone()
        };
        Self {
            source: source.into(),
            vhost: vhost.into(),
            destination: destination.into(),
            destination_type: kind.as_str().to_string(),
            routing_key,
            arguments: Arguments::new(),
            properties_key,
        }
    }

    pub fn destination_kind(&self) -> Option<DestinationKind> {
        DestinationKind::parse(&self.destination_type)
    }
}

impl Titled for Binding {
    fn title(&self) -> String {
        format!(
            "{} exchange -> {} {}",
            element_title(&self.vhost, &self.source),
            element_title(&self.vhost, &self.destination),
            self.destination_type
        )
    }
}

// ---------------------------------------------------------------------------
// serde helpers
// ---------------------------------------------------------------------------

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `null`, and renders non-string values (`"x-message-ttl": 60000`)
/// as compact JSON text.
fn lenient_arguments<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arguments, D::Error> {
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, argument_value_to_string(&v)))
        .collect())
}

/// String form of a broker argument value: strings verbatim, `null` as empty,
/// everything else as compact JSON.
pub fn argument_value_to_string(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! rmqt-management
//!
//! Boundary to a broker's management API.
//!
//! This crate defines the [`ManagementClient`] contract the reconcile engines
//! are written against, the error taxonomy they branch on, and one concrete
//! implementation over the RabbitMQ management HTTP API
//! ([`HttpManagementClient`]). Test doubles live in `rmqt-broker-paper`.

mod http;
mod wire;

pub use http::HttpManagementClient;
pub use wire::argument_value_for_broker;

use std::fmt;

use rmqt_schemas::{Arguments, Binding, DestinationKind, Exchange, ExchangeType, Queue, VHost};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors a [`ManagementClient`] implementation may return.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManagementError {
    /// The addressed entity does not exist. Expected during restore.
    NotFound { resource: String },
    /// Network or transport failure.
    Transport(String),
    /// The API answered with a non-success status other than 404.
    Api { status: u16, message: String },
    /// A response payload could not be decoded.
    Decode(String),
    /// The request could not be built (bad base URL, unusable name).
    InvalidRequest(String),
}

impl ManagementError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        ManagementError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ManagementError::NotFound { .. })
    }
}

impl fmt::Display for ManagementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManagementError::NotFound { resource } => write!(f, "not found: {resource}"),
            ManagementError::Transport(msg) => write!(f, "transport error: {msg}"),
            ManagementError::Api { status, message } => {
                write!(f, "management api error status={status}: {message}")
            }
            ManagementError::Decode(msg) => write!(f, "decode error: {msg}"),
            ManagementError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
        }
    }
}

impl std::error::Error for ManagementError {}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

/// Everything needed to declare an exchange inside a vhost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExchangeSpec {
    pub name: String,
    pub kind: ExchangeType,
    pub durable: bool,
    pub auto_delete: bool,
    pub internal: bool,
    pub arguments: Arguments,
}

impl From<&Exchange> for ExchangeSpec {
    fn from(e: &Exchange) -> Self {
        Self {
            name: e.name.clone(),
            kind: e.kind.clone(),
            durable: e.durable,
            auto_delete: e.auto_delete,
            internal: e.internal,
            arguments: e.arguments.clone(),
        }
    }
}

/// Everything needed to declare a queue inside a vhost.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueSpec {
    pub name: String,
    pub durable: bool,
    pub auto_delete: bool,
    pub arguments: Arguments,
}

impl From<&Queue> for QueueSpec {
    fn from(q: &Queue) -> Self {
        Self {
            name: q.name.clone(),
            durable: q.durable,
            auto_delete: q.auto_delete,
            arguments: q.arguments.clone(),
        }
    }
}

/// A binding to create. Arguments are sent along so that a binding restored
/// from a snapshot compares equal to its source on the next run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BindingSpec {
    pub source: String,
    pub destination: String,
    pub destination_kind: DestinationKind,
    pub routing_key: String,
    pub arguments: Arguments,
}

impl BindingSpec {
    /// `None` when the binding's destination type is neither queue nor exchange.
    pub fn from_binding(b: &Binding) -> Option<Self> {
        Some(Self {
            source: b.source.clone(),
            destination: b.destination.clone(),
            destination_kind: b.destination_kind()?,
            routing_key: b.routing_key.clone(),
            arguments: b.arguments.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Client trait
// ---------------------------------------------------------------------------

/// Management API contract.
///
/// Calls are synchronous and are issued one at a time by the engines; an
/// implementation does not need to tolerate concurrent use, only `Send + Sync`
/// so it can be held behind a `Box<dyn ManagementClient>`.
///
/// `get_*` methods return [`ManagementError::NotFound`] for absent entities.
pub trait ManagementClient: Send + Sync {
    fn list_vhosts(&self) -> Result<Vec<VHost>, ManagementError>;
    fn get_vhost(&self, name: &str) -> Result<VHost, ManagementError>;
    fn create_vhost(&self, name: &str) -> Result<(), ManagementError>;

    fn get_exchange(&self, vhost: &str, name: &str) -> Result<Exchange, ManagementError>;
    fn create_exchange(&self, vhost: &str, spec: &ExchangeSpec) -> Result<(), ManagementError>;

    fn get_queue(&self, vhost: &str, name: &str) -> Result<Queue, ManagementError>;
    fn create_queue(&self, vhost: &str, spec: &QueueSpec) -> Result<(), ManagementError>;

    /// Bindings whose destination is the named queue.
    fn get_bindings_for_queue(&self, vhost: &str, queue: &str)
        -> Result<Vec<Binding>, ManagementError>;

    /// Bindings whose destination is the named exchange.
    fn get_bindings_with_destination_exchange(
        &self,
        vhost: &str,
        exchange: &str,
    ) -> Result<Vec<Binding>, ManagementError>;

    fn create_binding(&self, vhost: &str, spec: &BindingSpec) -> Result<(), ManagementError>;

    fn list_exchanges(&self, vhost: &str) -> Result<Vec<Exchange>, ManagementError>;
    fn list_queues(&self, vhost: &str) -> Result<Vec<Queue>, ManagementError>;
    fn list_bindings(&self, vhost: &str) -> Result<Vec<Binding>, ManagementError>;

    /// Broker-side aliveness check for one vhost.
    fn is_alive(&self, vhost: &str) -> Result<bool, ManagementError>;
}

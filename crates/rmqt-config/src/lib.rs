//! Connection settings for the management API.
//!
//! Precedence, lowest to highest: built-in defaults, layered YAML profiles,
//! `RABBITMQTOOL_*` environment variables, explicit CLI flags. Every source
//! produces a [`PartialSettings`]; [`resolve`] overlays them in that order.

use std::fmt;

use serde::Deserialize;

mod env;
mod profile;

pub use env::{from_env, from_env_lookup, ENV_HOST, ENV_PASSWORD, ENV_PORT, ENV_USERNAME, ENV_VHOST};
pub use profile::{load_layered_yaml, load_layered_yaml_from_strings};

pub const DEFAULT_HOST: &str = "http://localhost";
pub const DEFAULT_PORT: u16 = 15672;
pub const DEFAULT_VHOST: &str = "/";
pub const DEFAULT_USERNAME: &str = "guest";
pub const DEFAULT_PASSWORD: &str = "guest";

/// Fully resolved settings. `Debug` and `Display` never print the password.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub host: String,
    pub port: u16,
    pub vhost: String,
    pub username: String,
    pub password: String,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            vhost: DEFAULT_VHOST.to_string(),
            username: DEFAULT_USERNAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
        }
    }
}

impl ConnectionSettings {
    /// `<host>:<port>`, with `http://` assumed when the host has no scheme.
    pub fn management_url(&self) -> String {
        let host = self.host.trim().trim_end_matches('/');
        if host.contains("://") {
            format!("{host}:{}", self.port)
        } else {
            format!("http://{host}:{}", self.port)
        }
    }

    fn overlay(&mut self, layer: &PartialSettings) {
        if let Some(v) = &layer.host {
            self.host = v.clone();
        }
        if let Some(v) = layer.port {
            self.port = v;
        }
        if let Some(v) = &layer.vhost {
            self.vhost = v.clone();
        }
        if let Some(v) = &layer.username {
            self.username = v.clone();
        }
        if let Some(v) = &layer.password {
            self.password = v.clone();
        }
    }
}

impl fmt::Display for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={} port={} vhost={} username={} password=<REDACTED>",
            self.host, self.port, self.vhost, self.username
        )
    }
}

impl fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("vhost", &self.vhost)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .finish()
    }
}

/// One configuration layer. `None` means "not set by this source".
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialSettings {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub vhost: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl fmt::Debug for PartialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PartialSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("vhost", &self.vhost)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<REDACTED>"))
            .finish()
    }
}

impl PartialSettings {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Defaults, then `profile`, then `env`, then `cli`.
pub fn resolve(
    profile: &PartialSettings,
    env: &PartialSettings,
    cli: &PartialSettings,
) -> ConnectionSettings {
    let mut out = ConnectionSettings::default();
    for layer in [profile, env, cli] {
        out.overlay(layer);
    }
    out
}

//! Environment layer.
//!
//! This is the only place that reads `RABBITMQTOOL_*` variables. Blank values
//! count as unset, and so does a port of `0`. Errors name the variable, never
//! its value.

use anyhow::{bail, Result};

use crate::PartialSettings;

pub const ENV_HOST: &str = "RABBITMQTOOL_HOST";
pub const ENV_PORT: &str = "RABBITMQTOOL_PORT";
pub const ENV_VHOST: &str = "RABBITMQTOOL_VHOST";
pub const ENV_USERNAME: &str = "RABBITMQTOOL_USERNAME";
pub const ENV_PASSWORD: &str = "RABBITMQTOOL_PASSWORD";

/// Read the environment layer from the process environment.
pub fn from_env() -> Result<PartialSettings> {
    from_env_lookup(|name| std::env::var(name).ok())
}

/// Read the environment layer through `lookup`, so tests need not touch the
/// process environment.
pub fn from_env_lookup<F>(lookup: F) -> Result<PartialSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    let port = match get(ENV_PORT) {
        None => None,
        Some(raw) => match raw.trim().parse::<u16>() {
            Ok(0) => None,
            Ok(p) => Some(p),
            Err(_) => bail!("{ENV_PORT} is not a valid port number"),
        },
    };

    Ok(PartialSettings {
        host: get(ENV_HOST),
        port,
        vhost: get(ENV_VHOST),
        username: get(ENV_USERNAME),
        password: get(ENV_PASSWORD),
    })
}

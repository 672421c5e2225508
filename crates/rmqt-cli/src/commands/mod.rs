//! Command handler modules for rmqt.
//!
//! Shared utilities used by multiple command paths live here.

pub mod masstransit;
pub mod schema;

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use rmqt_config::{ConnectionSettings, PartialSettings};
use rmqt_management::HttpManagementClient;
use rmqt_schemas::Schema;
use tracing::debug;

use crate::GlobalArgs;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Defaults < profiles < environment < flags.
pub fn resolve_settings(global: &GlobalArgs) -> Result<ConnectionSettings> {
    let profile = if global.profiles.is_empty() {
        PartialSettings::default()
    } else {
        rmqt_config::load_layered_yaml(global.profiles.as_slice())
            .context("failed to load --profile")?
    };
    let env = rmqt_config::from_env()?;
    let cli = PartialSettings {
        host: global.host.clone(),
        port: global.port.filter(|p| *p != 0),
        vhost: global.vhost.clone(),
        username: global.username.clone(),
        password: global.password.clone(),
    };

    let settings = rmqt_config::resolve(&profile, &env, &cli);
    if global.verbose {
        eprintln!("{settings}");
    }
    Ok(settings)
}

pub fn connect(global: &GlobalArgs) -> Result<(ConnectionSettings, HttpManagementClient)> {
    let settings = resolve_settings(global)?;
    let client = HttpManagementClient::new(
        &settings.management_url(),
        settings.username.clone(),
        settings.password.clone(),
    )
    .context("failed to build management client")?;
    Ok((settings, client))
}

pub fn read_schema_file(path: &Path) -> Result<Schema> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read snapshot failed: {}", path.display()))?;
    let schema = Schema::from_json(&raw)
        .with_context(|| format!("invalid snapshot: {}", path.display()))?;
    debug!(
        path = %path.display(),
        exchanges = schema.exchanges.len(),
        queues = schema.queues.len(),
        bindings = schema.bindings.len(),
        "snapshot loaded"
    );
    Ok(schema)
}

pub fn read_schema_stdin() -> Result<Schema> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("read snapshot from stdin failed")?;
    Schema::from_json(&raw).context("invalid snapshot on stdin")
}

//! `rmqt schema ...` handlers.

use std::fs;
use std::io::IsTerminal;
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use rmqt_management::ManagementClient;
use rmqt_reconcile::{DiffList, EntityKind, SchemaDiff};
use rmqt_schemas::Titled;
use tracing::{info, warn};

use super::{connect, read_schema_file, read_schema_stdin};
use crate::GlobalArgs;

pub fn is_alive(global: &GlobalArgs) -> Result<ExitCode> {
    let (settings, client) = connect(global)?;
    let alive = client
        .is_alive(&settings.vhost)
        .with_context(|| format!("aliveness test failed for vhost '{}'", settings.vhost))?;
    println!("{alive}");
    Ok(ExitCode::SUCCESS)
}

pub fn fetch(global: &GlobalArgs, out: Option<&Path>) -> Result<ExitCode> {
    let (settings, client) = connect(global)?;
    let schema = rmqt_reconcile::fetch(&client, &settings.vhost)
        .with_context(|| format!("fetch failed for vhost '{}'", settings.vhost))?;
    let json = schema
        .to_json_pretty()
        .context("serialize snapshot failed")?;

    match out {
        Some(path) => {
            fs::write(path, json)
                .with_context(|| format!("write snapshot failed: {}", path.display()))?;
            info!(path = %path.display(), "snapshot written");
        }
        None => println!("{json}"),
    }
    Ok(ExitCode::SUCCESS)
}

pub fn restore(global: &GlobalArgs, file: Option<&Path>, strict: bool) -> Result<ExitCode> {
    let schema = match file {
        Some(path) => read_schema_file(path)?,
        None => {
            if std::io::stdin().is_terminal() {
                bail!(
                    "no snapshot given: pipe one in (`rmqt schema restore < snapshot.json`) or pass --file"
                );
            }
            read_schema_stdin()?
        }
    };

    let (_, client) = connect(global)?;
    let report = rmqt_reconcile::restore(&schema, &client);

    for kind in [
        EntityKind::VHost,
        EntityKind::Exchange,
        EntityKind::Queue,
        EntityKind::Binding,
    ] {
        let counts = report.stage(kind);
        println!("{kind}s {counts} total={}", counts.total());
    }
    if !report.is_clean() {
        warn!(failed = report.failed(), "restore finished with failures");
    }
    println!("Done.");

    if strict && !report.is_clean() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

pub fn diff(left: &Path, right: &Path, exit_code: bool) -> Result<ExitCode> {
    let left = read_schema_file(left)?;
    let right = read_schema_file(right)?;

    let d = rmqt_reconcile::diff(&left, &right);
    print!("{}", render_diff(&d));

    if exit_code && !d.is_empty() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

fn render_diff(d: &SchemaDiff) -> String {
    let mut out = String::new();
    render_section(&mut out, "Exchanges", &d.exchanges);
    render_section(&mut out, "Queues", &d.queues);
    render_section(&mut out, "Bindings", &d.bindings);
    out.push_str("Done.\n");
    out
}

fn render_section<T: Titled>(out: &mut String, heading: &str, items: &DiffList<T>) {
    out.push_str(&format!("{heading}: {}\n", items.len()));
    for item in items {
        let left = item.left.as_ref().map(Titled::title);
        let right = item.right.as_ref().map(Titled::title);
        out.push_str(&format!(
            "{} left={} right={}\n",
            item.kind,
            left.as_deref().unwrap_or("-"),
            right.as_deref().unwrap_or("-"),
        ));
    }
}

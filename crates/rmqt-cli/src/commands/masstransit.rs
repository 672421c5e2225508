use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};

use super::{connect, read_schema_file};
use crate::GlobalArgs;

/// `rmqt masstransit validate`: findings are logged as warnings; the count
/// goes to stdout. Missing bindings do not change the exit code.
pub fn validate(global: &GlobalArgs, file: Option<&Path>) -> Result<ExitCode> {
    let schema = match file {
        Some(path) => read_schema_file(path)?,
        None => {
            let (settings, client) = connect(global)?;
            rmqt_reconcile::fetch(&client, &settings.vhost)
                .with_context(|| format!("fetch failed for vhost '{}'", settings.vhost))?
        }
    };

    let report = rmqt_reconcile::validate_masstransit(&schema);
    println!("candidates={}", report.candidates.len());
    println!("missing_bindings={}", report.missing_bindings.len());
    Ok(ExitCode::SUCCESS)
}

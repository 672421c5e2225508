//! Layered YAML profiles.
//!
//! Profiles are merged in order (a key in a later file replaces the same key
//! from an earlier one) before being read as one [`PartialSettings`] layer.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::{Map, Value};
use tracing::warn;

use crate::PartialSettings;

/// Top-level keys a profile may set. Profiles are flat.
const KNOWN_KEYS: &[&str] = &["host", "port", "vhost", "username", "password"];

pub fn load_layered_yaml<P: AsRef<Path>>(paths: &[P]) -> Result<PartialSettings> {
    let mut docs: Vec<String> = Vec::new();
    for p in paths {
        let p = p.as_ref();
        let raw = fs::read_to_string(p)
            .with_context(|| format!("failed to read profile: {}", p.display()))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    load_layered_yaml_from_strings(&doc_refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<PartialSettings> {
    let mut merged = Map::new();
    for raw in yaml_docs {
        let v_yaml: serde_yaml::Value = serde_yaml::from_str(raw).context("invalid yaml")?;
        let v_json = serde_json::to_value(v_yaml).context("yaml->json conversion failed")?;
        if v_json.is_null() {
            // Empty profile file.
            continue;
        }
        let Value::Object(doc) = v_json else {
            bail!("profile must be a mapping of connection settings");
        };
        merged.extend(doc);
    }

    reject_unknown_keys(&merged)?;
    warn_on_password_literal(&merged);

    let mut layer: PartialSettings =
        serde_json::from_value(Value::Object(merged)).context("invalid profile values")?;
    if layer.port == Some(0) {
        layer.port = None;
    }
    Ok(layer)
}

fn reject_unknown_keys(doc: &Map<String, Value>) -> Result<()> {
    let mut unknown: Vec<&str> = doc
        .keys()
        .map(String::as_str)
        .filter(|k| !KNOWN_KEYS.contains(k))
        .collect();
    unknown.sort_unstable();

    if !unknown.is_empty() {
        bail!(
            "CONFIG_UNKNOWN_KEYS: {} unknown profile key(s): {:?}",
            unknown.len(),
            unknown
        );
    }
    Ok(())
}

fn warn_on_password_literal(doc: &Map<String, Value>) {
    if doc
        .get("password")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty())
    {
        warn!(
            "profile contains a literal password; prefer {}",
            crate::ENV_PASSWORD
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_profile_replaces_whole_keys() {
        let layer = load_layered_yaml_from_strings(&[
            "host: http://a\nport: 1\n",
            "port: 2\n",
        ])
        .unwrap();
        assert_eq!(layer.host.as_deref(), Some("http://a"));
        assert_eq!(layer.port, Some(2));
    }

    #[test]
    fn nested_value_under_unknown_key_is_reported_once() {
        let err = load_layered_yaml_from_strings(&["tls:\n  verify: false\n  ca: x\n"])
            .unwrap_err()
            .to_string();
        assert!(err.contains("1 unknown profile key(s)"), "{err}");
        assert!(err.contains("\"tls\""), "{err}");
    }
}

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::fs;

use tb_portfolio::{OversellPolicy, PortfolioCalculator};

pub mod consumption;

/// Config consumption guard.
///
/// The CLI decides whether leftover keys are a warning or an error. A key is
/// consumed when its JSON pointer is listed in [`consumption::CONSUMED`] or
/// sits beneath a listed pointer. Anything else is usually a typo
/// ("oversel_policy") that would otherwise fall back to a default unnoticed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnusedKeyPolicy {
    Warn,
    Fail,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UnusedKeyReport {
    /// Leaf pointers nothing reads (sorted)
    pub unused_leaf_pointers: Vec<String>,
}

impl UnusedKeyReport {
    pub fn is_clean(&self) -> bool {
        self.unused_leaf_pointers.is_empty()
    }
}

/// Walk the merged document and report keys the engine never reads.
pub fn report_unused_keys(config_json: &Value, policy: UnusedKeyPolicy) -> Result<UnusedKeyReport> {
    let mut unused = Vec::new();
    unread_leaves(config_json, "", &mut unused);
    unused.sort();

    let report = UnusedKeyReport {
        unused_leaf_pointers: unused,
    };

    if policy == UnusedKeyPolicy::Fail && !report.is_clean() {
        let first: Vec<&String> = report.unused_leaf_pointers.iter().take(12).collect();
        bail!(
            "CONFIG_UNUSED_KEYS: {} config key(s) are not read by tb: {:?}",
            report.unused_leaf_pointers.len(),
            first
        );
    }

    Ok(report)
}

/// Push every leaf under `v` (whose pointer is `at`) that no consumed entry covers.
/// Consumed subtrees are not descended into.
fn unread_leaves(v: &Value, at: &str, out: &mut Vec<String>) {
    if consumption::covers(at) {
        return;
    }
    match v {
        Value::Object(map) => {
            for (key, child) in map {
                let token = key.replace('~', "~0").replace('/', "~1");
                unread_leaves(child, &format!("{at}/{token}"), out);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                unread_leaves(child, &format!("{at}/{i}"), out);
            }
        }
        _ if at.is_empty() => out.push("/".to_string()),
        _ => out.push(at.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Layered loading + hashing
// ---------------------------------------------------------------------------

/// Merged config plus the identity of exactly what was merged.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    /// sha256 of `canonical_json`, lowercase hex
    pub config_hash: String,
    pub canonical_json: String,
    pub config_json: Value,
}

impl LoadedConfig {
    /// Typed view of the merged document.
    pub fn engine_config(&self) -> Result<EngineConfig> {
        EngineConfig::from_json(&self.config_json)
    }
}

/// Read and merge YAML files; later paths override earlier ones.
pub fn load_layered_yaml(paths: &[&str]) -> Result<LoadedConfig> {
    let docs = paths
        .iter()
        .map(|p| fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}")))
        .collect::<Result<Vec<String>>>()?;
    let refs: Vec<&str> = docs.iter().map(String::as_str).collect();
    load_layered_yaml_from_strings(&refs)
}

pub fn load_layered_yaml_from_strings(yaml_docs: &[&str]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Map::new());
    for (i, raw) in yaml_docs.iter().enumerate() {
        let yaml: serde_yaml::Value =
            serde_yaml::from_str(raw).with_context(|| format!("invalid yaml in layer {i}"))?;
        let doc = serde_json::to_value(yaml).context("yaml->json conversion failed")?;
        // empty layer
        if doc.is_null() {
            continue;
        }
        overlay(&mut merged, doc);
    }

    // serde_json's default Map keeps keys sorted, so key order in the YAML
    // does not leak into the hash.
    let canonical_json = serde_json::to_string(&merged).context("canonical json serialize failed")?;
    let config_hash = hex::encode(Sha256::digest(canonical_json.as_bytes()));
    Ok(LoadedConfig {
        config_hash,
        canonical_json,
        config_json: merged,
    })
}

/// Objects merge key by key; any other value in `layer` replaces what was there.
fn overlay(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(dst), Value::Object(src)) => {
            for (key, val) in src {
                match dst.get_mut(&key) {
                    Some(slot) => overlay(slot, val),
                    None => {
                        dst.insert(key, val);
                    }
                }
            }
        }
        (slot, val) => *slot = val,
    }
}

// ---------------------------------------------------------------------------
// Typed settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub engine: EngineSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    pub oversell_policy: OversellPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// tracing `EnvFilter` directive; `RUST_LOG` wins when set.
    pub filter: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(v: &Value) -> Result<Self> {
        EngineConfig::deserialize(v).context("invalid engine config")
    }

    /// Calculator configured from this document.
    pub fn calculator(&self) -> PortfolioCalculator {
        PortfolioCalculator::with_oversell_policy(self.engine.oversell_policy)
    }
}

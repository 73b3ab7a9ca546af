//! Command handler modules for tb-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod portfolio;

use anyhow::Result;
use tb_config::{
    load_layered_yaml, report_unused_keys, EngineConfig, LoadedConfig, UnusedKeyPolicy,
};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Effective settings for one invocation.
pub struct Settings {
    pub engine: EngineConfig,
    loaded: Option<LoadedConfig>,
}

impl Settings {
    /// Load layered config, or defaults when no paths were given.
    pub fn load(paths: &[String]) -> Result<Self> {
        if paths.is_empty() {
            return Ok(Self {
                engine: EngineConfig::default(),
                loaded: None,
            });
        }
        let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
        let loaded = load_layered_yaml(&path_refs)?;
        let engine = loaded.engine_config()?;
        Ok(Self {
            engine,
            loaded: Some(loaded),
        })
    }

    /// Log (never fail on) config keys nothing reads. Call after tracing is up.
    pub fn warn_unused_keys(&self) -> Result<()> {
        let Some(loaded) = &self.loaded else {
            return Ok(());
        };
        debug!(config_hash = %loaded.config_hash, "config loaded");
        let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)?;
        for ptr in &report.unused_leaf_pointers {
            warn!(pointer = %ptr, "unused config key");
        }
        Ok(())
    }
}

/// Print the merged config hash and canonical JSON.
pub fn config_hash(paths: &[String]) -> Result<()> {
    let path_refs: Vec<&str> = paths.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml(&path_refs)?;
    println!("config_hash={}", loaded.config_hash);
    println!("{}", loaded.canonical_json);
    Ok(())
}

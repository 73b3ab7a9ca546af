//! Registry of config keys the engine actually reads.
//!
//! Entries are JSON-pointer prefixes; a prefix consumes every leaf beneath
//! it ("/logging" would consume "/logging/filter"). Keep this list to keys
//! some code path reads today.

pub static CONSUMED: &[&str] = &[
    // tb-portfolio::PortfolioCalculator::with_oversell_policy (via EngineConfig)
    "/engine/oversell_policy",
    // tb-cli tracing bootstrap
    "/logging/filter",
];

/// True when `pointer` is a consumed entry or lies beneath one.
/// "/engine/oversell_policy" covers itself and its children, not "/engine/oversell_policyx".
pub fn covers(pointer: &str) -> bool {
    CONSUMED.iter().any(|c| {
        pointer
            .strip_prefix(c)
            .map_or(false, |rest| rest.is_empty() || rest.starts_with('/'))
    })
}

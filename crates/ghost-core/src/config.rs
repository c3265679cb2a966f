//! Configuration loading. `GhostConfig` (the data shape) lives in
//! `ghost-types`; this module resolves it from disk/env via a small
//! priority ladder.

use crate::error::Result;
use ghost_types::GhostConfig;
use std::path::{Path, PathBuf};

/// Load `.ai-sessions/config.toml` if present, falling back to defaults.
/// Never fails on a missing or malformed file: a malformed config degrades
/// to defaults rather than erroring.
pub fn load(repo_root: &Path) -> GhostConfig {
    let path = crate::paths::config_path(repo_root);
    match std::fs::read_to_string(&path) {
        Ok(text) => toml::from_str(&text).unwrap_or_default(),
        Err(_) => GhostConfig::default(),
    }
}

pub fn save(repo_root: &Path, config: &GhostConfig) -> Result<()> {
    let path = crate::paths::config_path(repo_root);
    let text = toml::to_string_pretty(config)
        .map_err(|e| crate::error::Error::Config(e.to_string()))?;
    std::fs::write(path, text)?;
    Ok(())
}

/// Resolve an alternate `.ai-sessions` root: explicit override, then
/// `GHOST_PATH`, then the default in-repo location (teacher's
/// `AGTRACE_PATH` / `resolve_workspace_path` pattern, specialized to a
/// per-repo root instead of a single home-directory workspace since every
/// repository gets its own `.ai-sessions` tree).
pub fn resolve_root(repo_root: &Path, explicit: Option<&str>) -> PathBuf {
    if let Some(path) = explicit {
        return expand_tilde(path);
    }
    if let Ok(env_path) = std::env::var("GHOST_PATH") {
        return expand_tilde(&env_path);
    }
    repo_root.to_path_buf()
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load(dir.path());
        assert_eq!(cfg.score.file_match, 10);
    }

    #[test]
    fn malformed_config_degrades_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(crate::paths::root_dir(dir.path())).unwrap();
        std::fs::write(crate::paths::config_path(dir.path()), "not valid toml {{{").unwrap();
        let cfg = load(dir.path());
        assert_eq!(cfg.score.rule_bonus, 20);
    }

    #[test]
    fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(crate::paths::root_dir(dir.path())).unwrap();
        let mut cfg = GhostConfig::default();
        cfg.score.file_match = 42;
        save(dir.path(), &cfg).unwrap();
        let loaded = load(dir.path());
        assert_eq!(loaded.score.file_match, 42);
    }
}

//! Canonical filesystem layout under `<repo>/.ai-sessions/`.
//!
//! Every helper here is a pure function of the repository root; no helper
//! reads environment variables or touches the filesystem itself.

use chrono::Utc;
use ghost_types::SessionId;
use rand::Rng;
use std::path::{Path, PathBuf};

pub const ROOT_DIR: &str = ".ai-sessions";

pub fn root_dir(repo_root: &Path) -> PathBuf {
    repo_root.join(ROOT_DIR)
}

pub fn active_dir(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join("active")
}

pub fn completed_dir(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join("completed")
}

pub fn active_session_path(repo_root: &Path, id: &SessionId) -> PathBuf {
    active_dir(repo_root).join(format!("{}.md", id.as_str()))
}

pub fn completed_session_path(repo_root: &Path, id: &SessionId) -> PathBuf {
    completed_dir(repo_root).join(format!("{}.md", id.as_str()))
}

pub fn knowledge_path(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join("knowledge.md")
}

pub fn mistakes_path(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join("mistakes.md")
}

pub fn decisions_path(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join("decisions.md")
}

pub fn tags_path(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join("tags.json")
}

pub fn config_path(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join("config.toml")
}

pub fn current_id_path(repo_root: &Path) -> PathBuf {
    active_dir(repo_root).join("current-id")
}

pub fn session_map_path(repo_root: &Path) -> PathBuf {
    active_dir(repo_root).join("session-map.json")
}

pub fn comod_cache_path(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join(".comod-cache.json")
}

pub fn background_pid_path(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join(".background.pid")
}

pub fn background_log_path(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join(".background.log")
}

pub fn last_sync_path(repo_root: &Path) -> PathBuf {
    root_dir(repo_root).join(".last-sync")
}

/// Create the full fixed directory tree (used by `enable`).
pub fn ensure_tree(repo_root: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(active_dir(repo_root))?;
    std::fs::create_dir_all(completed_dir(repo_root))?;
    Ok(())
}

/// `YYYY-MM-DD-{8 lowercase hex}`, date = current UTC date, tail drawn from
/// a CSPRNG. `rand::thread_rng` is seeded from OS entropy and
/// reseeded periodically by a CSPRNG (ChaCha) under the hood, satisfying the
/// "cryptographically secure RNG" requirement without a direct `getrandom`
/// dependency.
pub fn new_session_id() -> SessionId {
    let date = Utc::now().format("%Y-%m-%d").to_string();
    let tail: u32 = rand::thread_rng().gen();
    SessionId(format!("{date}-{tail:08x}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_has_expected_shape() {
        let id = new_session_id();
        let s = id.as_str();
        assert_eq!(s.len(), "YYYY-MM-DD-".len() + 8);
        assert_eq!(&s[4..5], "-");
        assert_eq!(&s[7..8], "-");
        assert!(s[11..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn session_ids_are_not_trivially_repeated() {
        let a = new_session_id();
        let b = new_session_id();
        assert_ne!(a, b);
    }

    #[test]
    fn path_helpers_are_pure_and_relative_to_root() {
        let root = Path::new("/repo");
        assert_eq!(root_dir(root), Path::new("/repo/.ai-sessions"));
        assert_eq!(active_dir(root), Path::new("/repo/.ai-sessions/active"));
        assert_eq!(
            completed_dir(root),
            Path::new("/repo/.ai-sessions/completed")
        );
    }
}

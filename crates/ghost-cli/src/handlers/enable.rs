//! `enable`/`disable`/`reset`: install/remove hook wiring and
//! wipe the on-disk store. Hook wiring itself is a JSON settings file the
//! hosting agent reads at startup, plus a `post-commit` script for
//! `checkpoint` (the one hook event git itself triggers, not the agent).

use anyhow::{Context, Result};
use ghost_core::{paths, ScmAdapter};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};

const AGENT_HOOK_EVENTS: [&str; 6] =
    ["session-start", "session-end", "prompt", "stop", "post-write", "post-task"];

const POST_COMMIT_MARKER_BEGIN: &str = "# >>> ghost checkpoint hook >>>";
const POST_COMMIT_MARKER_END: &str = "# <<< ghost checkpoint hook <<<";

fn settings_path() -> PathBuf {
    if let Ok(path) = std::env::var("GHOST_HOOK_SETTINGS") {
        return PathBuf::from(path);
    }
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));
    home.join(".claude").join("settings.json")
}

fn read_settings(path: &Path) -> Value {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_else(|| json!({}))
}

fn write_settings(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(value)?)?;
    Ok(())
}

/// Whether a `hooks.<event>` entry was installed by this system, so
/// `disable` only removes ghost's own entries and leaves anything the host
/// agent or another tool wired up alone.
fn is_system_entry(entry: &Value) -> bool {
    entry
        .get("hooks")
        .and_then(|h| h.as_array())
        .map(|hooks| {
            hooks.iter().any(|h| {
                h.get("command").and_then(|c| c.as_str()).map(|c| c.starts_with("ghost ")).unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

fn install_hooks() -> Result<()> {
    let path = settings_path();
    let mut settings = read_settings(&path);
    let hooks = settings.as_object_mut().context("settings.json root is not an object")?;
    let entries = hooks.entry("hooks").or_insert_with(|| json!({}));
    let entries = entries.as_object_mut().context("settings.json .hooks is not an object")?;

    for event in AGENT_HOOK_EVENTS {
        entries.insert(
            event.to_string(),
            json!([{
                "matcher": "*",
                "hooks": [{"type": "command", "command": format!("ghost {event}")}],
            }]),
        );
    }
    write_settings(&path, &settings)
}

fn remove_hooks() -> Result<()> {
    let path = settings_path();
    if !path.exists() {
        return Ok(());
    }
    let mut settings = read_settings(&path);
    if let Some(hooks) = settings.get_mut("hooks").and_then(|h| h.as_object_mut()) {
        for event in AGENT_HOOK_EVENTS {
            let keep_event = hooks
                .get(event)
                .and_then(|v| v.as_array())
                .map(|entries| !entries.iter().any(is_system_entry))
                .unwrap_or(true);
            if !keep_event {
                hooks.remove(event);
            }
        }
    }
    write_settings(&path, &settings)
}

fn post_commit_hook_path(repo_root: &Path) -> PathBuf {
    repo_root.join(".git").join("hooks").join("post-commit")
}

/// `checkpoint` is wired via git's own `post-commit` hook, not the agent's
/// JSON settings, since git, not the coding agent, is what triggers it.
fn install_post_commit(repo_root: &Path) -> Result<()> {
    let path = post_commit_hook_path(repo_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let existing = std::fs::read_to_string(&path).unwrap_or_default();
    if existing.contains(POST_COMMIT_MARKER_BEGIN) {
        return Ok(());
    }
    let block = format!(
        "{POST_COMMIT_MARKER_BEGIN}\nghost checkpoint &\n{POST_COMMIT_MARKER_END}\n"
    );
    let new_content = if existing.trim().is_empty() {
        format!("#!/bin/sh\n{block}")
    } else {
        format!("{existing}\n{block}")
    };
    std::fs::write(&path, new_content)?;
    set_executable(&path);
    Ok(())
}

fn remove_post_commit(repo_root: &Path) -> Result<()> {
    let path = post_commit_hook_path(repo_root);
    let Ok(existing) = std::fs::read_to_string(&path) else { return Ok(()) };
    let Some(begin) = existing.find(POST_COMMIT_MARKER_BEGIN) else { return Ok(()) };
    let Some(end) = existing.find(POST_COMMIT_MARKER_END) else { return Ok(()) };
    let end = end + POST_COMMIT_MARKER_END.len();
    let mut stripped = String::new();
    stripped.push_str(&existing[..begin]);
    stripped.push_str(existing[end..].trim_start_matches('\n'));
    if stripped.trim() == "#!/bin/sh" || stripped.trim().is_empty() {
        std::fs::remove_file(&path)?;
    } else {
        std::fs::write(&path, stripped)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Ok(meta) = std::fs::metadata(path) {
        let mut perms = meta.permissions();
        perms.set_mode(perms.mode() | 0o111);
        let _ = std::fs::set_permissions(path, perms);
    }
}
#[cfg(not(unix))]
fn set_executable(_path: &Path) {}

pub fn handle(repo_root: &Path, force: bool, genesis: bool) -> Result<()> {
    if !force && paths::root_dir(repo_root).exists() {
        println!("ghost is already enabled for this repository; use --force to reinstall hooks");
        return Ok(());
    }

    paths::ensure_tree(repo_root)?;
    let scm = ScmAdapter::new(repo_root);
    scm.set_config("notes.displayRef", &format!("refs/notes/{}", ghost_core::scm::NOTES_REF));

    install_hooks().context("installing hook wiring")?;
    install_post_commit(repo_root).context("installing post-commit hook")?;

    ghost_sync::sync::init(&ScmAdapter::uncapped(repo_root))?;

    if genesis {
        ghost_store::graph::load_or_rebuild(repo_root)?;
        println!("seeded co-modification graph from existing completed sessions");
    }

    println!("ghost enabled: hooks installed, session store created at {}", paths::root_dir(repo_root).display());
    Ok(())
}

pub fn handle_disable(repo_root: &Path) -> Result<()> {
    remove_hooks().context("removing hook wiring")?;
    remove_post_commit(repo_root).context("removing post-commit hook")?;
    println!("ghost disabled: hook entries removed, session files left in place");
    Ok(())
}

pub fn handle_reset(repo_root: &Path) -> Result<()> {
    let root = paths::root_dir(repo_root);
    if root.exists() {
        std::fs::remove_dir_all(&root)?;
    }
    let scm = ScmAdapter::new(repo_root);
    scm.delete_notes_ref();
    if let Err(e) = ghost_sync::search::delete_collection(repo_root, None) {
        eprintln!("warning: could not delete external search collection: {e}");
    }
    println!("ghost reset: session store, notes ref, and search collection cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn post_commit_install_then_remove_restores_shebang_only() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git")).unwrap();
        install_post_commit(dir.path()).unwrap();
        let installed = std::fs::read_to_string(post_commit_hook_path(dir.path())).unwrap();
        assert!(installed.contains("ghost checkpoint"));

        remove_post_commit(dir.path()).unwrap();
        assert!(!post_commit_hook_path(dir.path()).exists());
    }

    #[test]
    fn post_commit_install_preserves_existing_script_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".git").join("hooks")).unwrap();
        std::fs::write(post_commit_hook_path(dir.path()), "#!/bin/sh\necho existing\n").unwrap();

        install_post_commit(dir.path()).unwrap();
        remove_post_commit(dir.path()).unwrap();

        let remaining = std::fs::read_to_string(post_commit_hook_path(dir.path())).unwrap();
        assert!(remaining.contains("echo existing"));
        assert!(!remaining.contains("ghost checkpoint"));
    }

    #[test]
    fn is_system_entry_recognizes_ghost_commands_only() {
        let ours = json!({"hooks": [{"type": "command", "command": "ghost session-start"}]});
        let theirs = json!({"hooks": [{"type": "command", "command": "some-other-tool"}]});
        assert!(is_system_entry(&ours));
        assert!(!is_system_entry(&theirs));
    }
}

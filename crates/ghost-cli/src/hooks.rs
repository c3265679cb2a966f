//! Hook Dispatcher. Every function here follows the hook-failure taxon:
//! callers must never let an error escape to the hosting agent's standard
//! streams or exit code.

use crate::{background_log, context, finalizer};
use ghost_core::ScmAdapter;
use ghost_types::{HookEvent, RawEnvelope};
use std::io::Read as _;
use std::path::{Path, PathBuf};

/// Set on the Background Finalizer's child process (and on anything it in
/// turn spawns, notably the summarizer invoking the hosting agent) so that
/// a re-entrant hook call from within that subtree is a silent no-op.
pub const REENTRANCY_GUARD: &str = "GHOST_INTERNAL";

pub fn is_internal_reentry() -> bool {
    std::env::var(REENTRANCY_GUARD).map(|v| v == "1").unwrap_or(false)
}

const HOOK_COMMANDS: [&str; 7] =
    ["session-start", "session-end", "prompt", "stop", "post-write", "post-task", "checkpoint"];

/// Whether `command` is one of the seven hook entry points, so `main` can
/// route it here before `clap` ever sees argv.
pub fn is_hook_command(command: &str) -> bool {
    HOOK_COMMANDS.contains(&command)
}

fn read_envelope() -> RawEnvelope {
    let mut input = String::new();
    if std::io::stdin().read_to_string(&mut input).is_err() {
        return RawEnvelope::default();
    }
    serde_json::from_str(&input).unwrap_or_default()
}

fn repo_root_for(cwd: Option<&str>) -> Option<PathBuf> {
    let dir = cwd.map(PathBuf::from).or_else(|| std::env::current_dir().ok())?;
    ScmAdapter::with_timeout(&dir, std::time::Duration::from_secs(3)).repo_root()
}

/// `command` is the dispatcher's first CLI token. Exits 0 unconditionally;
/// every branch below is infallible from the caller's point of view.
pub fn dispatch(command: &str) {
    if is_internal_reentry() {
        return;
    }

    let raw = read_envelope();
    let Some(event) = HookEvent::from_command(command, raw) else { return };
    let Some(repo_root) = repo_root_for(event.cwd()) else { return };

    match event {
        HookEvent::SessionStart { session_id, .. } => handle_session_start(&repo_root, session_id.as_deref()),
        HookEvent::SessionEnd { session_id, .. } => handle_session_end(&repo_root, session_id.as_deref()),
        HookEvent::Prompt { session_id, prompt, .. } => {
            let _ = ghost_store::session::append_prompt(&repo_root, session_id.as_deref(), &prompt);
        }
        HookEvent::Stop { session_id, .. } => {
            let _ = ghost_store::session::append_turn_delimiter(&repo_root, session_id.as_deref());
        }
        HookEvent::PostWrite { session_id, file_path, .. } => {
            if let Some(path) = file_path {
                let _ = ghost_store::session::append_file_modification(
                    &repo_root,
                    session_id.as_deref(),
                    &path,
                );
            }
        }
        HookEvent::PostTask { session_id, description, .. } => {
            if let Some(text) = description {
                let _ = ghost_store::session::append_task_note(&repo_root, session_id.as_deref(), &text);
            }
        }
        HookEvent::Checkpoint { .. } => {
            let _ = ghost_store::session::checkpoint(&repo_root);
        }
    }
}

fn handle_session_start(repo_root: &Path, session_id: Option<&str>) {
    if ghost_store::session::create(repo_root, session_id).is_err() {
        return;
    }
    let config = ghost_core::config::load(repo_root);
    print!("{}", context::build(repo_root, &config));
}

fn handle_session_end(repo_root: &Path, session_id: Option<&str>) {
    let redactor = ghost_core::Redactor::new();
    let Ok(Some(result)) = ghost_store::session::finalize(repo_root, session_id, &redactor) else {
        return;
    };
    finalizer::spawn_detached(repo_root, &result.path, result.internal_id.as_str());
    background_log::log(
        repo_root,
        &ghost_core::config::load(repo_root).retention,
        &format!("session-end: finalized {}, background finalizer spawned", result.internal_id),
    );
}

//! Session Store: create, append, finalize session
//! transcripts, and the session map / current-id marker they rely on.
//!
//! Every append is open-append-close: no buffered writer is held across
//! calls, so interleaved hook processes produce a well-defined
//! line-granular interleaving.

use crate::error::Result;
use crate::frontmatter::{self, FmValue, RawFrontmatter};
use chrono::Utc;
use ghost_core::{paths, ScmAdapter};
use ghost_types::{SessionFrontmatter, SessionId, SessionMap};
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::{Path, PathBuf};

/// First 8 hex characters of the prompt text's SHA-256, used both for the
/// `<!-- ph:{hash} -->` tag and for consecutive-duplicate dedup.
pub fn hash_prompt(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    format!("{:x}", digest)[..8].to_string()
}

fn read_session_map(repo_root: &Path) -> SessionMap {
    let path = paths::session_map_path(repo_root);
    std::fs::read_to_string(path)
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

fn write_session_map(repo_root: &Path, map: &SessionMap) -> Result<()> {
    let path = paths::session_map_path(repo_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(map)?)?;
    Ok(())
}

fn write_current_id(repo_root: &Path, id: &SessionId) -> Result<()> {
    let path = paths::current_id_path(repo_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, id.as_str())?;
    Ok(())
}

fn read_current_id(repo_root: &Path) -> Option<SessionId> {
    std::fs::read_to_string(paths::current_id_path(repo_root))
        .ok()
        .map(|s| SessionId(s.trim().to_string()))
}

fn clear_current_id_if_matches(repo_root: &Path, id: &SessionId) {
    if read_current_id(repo_root).as_ref() == Some(id) {
        let _ = std::fs::remove_file(paths::current_id_path(repo_root));
    }
}

/// Resolve which internal session an agent-originated hook call targets:
/// the Session Map first, since it's the authoritative resolver for hooks
/// with multiple concurrent sessions possibly sharing a repo.
fn resolve_active_id(repo_root: &Path, agent_session_id: Option<&str>) -> Option<SessionId> {
    if let Some(agent_id) = agent_session_id {
        if let Some(id) = read_session_map(repo_root).get(agent_id) {
            return Some(id);
        }
    }
    read_current_id(repo_root)
}

pub fn create(repo_root: &Path, agent_session_id: Option<&str>) -> Result<SessionId> {
    let id = paths::new_session_id();
    let scm = ScmAdapter::new(repo_root);
    let branch = scm.current_branch().unwrap_or_else(|| "unknown".to_string());
    let base_commit = scm.head_sha().unwrap_or_else(|| "unknown".to_string());

    let fm = SessionFrontmatter::new(id.clone(), branch, base_commit, Utc::now());
    let body = frontmatter::render_session_frontmatter(&fm);

    let path = paths::active_session_path(repo_root, &id);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&path, body)?;

    write_current_id(repo_root, &id)?;

    if let Some(agent_id) = agent_session_id {
        let mut map = read_session_map(repo_root);
        map.insert(agent_id.to_string(), id.clone());
        write_session_map(repo_root, &map)?;
    }

    Ok(id)
}

fn append_line(path: &Path, text: &str) -> Result<()> {
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(text.as_bytes())?;
    Ok(())
}

/// Count of `^## Prompt \d+` headings already present, used to compute the
/// next `N`.
fn prompt_count(content: &str) -> u32 {
    content
        .lines()
        .filter(|l| l.starts_with("## Prompt "))
        .count() as u32
}

fn last_prompt_hash(content: &str) -> Option<String> {
    content
        .lines()
        .filter(|l| l.starts_with("## Prompt "))
        .next_back()
        .and_then(|l| l.split("<!-- ph:").nth(1))
        .and_then(|rest| rest.split(' ').next())
        .map(|s| s.trim_end_matches("-->").to_string())
}

/// `append_prompt`: dedup on consecutive identical submissions.
pub fn append_prompt(repo_root: &Path, agent_session_id: Option<&str>, text: &str) -> Result<()> {
    let Some(id) = resolve_active_id(repo_root, agent_session_id) else { return Ok(()) };
    let path = paths::active_session_path(repo_root, &id);
    let Ok(content) = std::fs::read_to_string(&path) else { return Ok(()) };

    let hash = hash_prompt(text);
    if last_prompt_hash(&content).as_deref() == Some(hash.as_str()) {
        return Ok(());
    }

    let n = prompt_count(&content) + 1;
    let block = format!("\n## Prompt {n} <!-- ph:{hash} -->\n> {text}\n");
    append_line(&path, &block)
}

pub fn get_prompt_count(repo_root: &Path, agent_session_id: Option<&str>) -> u32 {
    let Some(id) = resolve_active_id(repo_root, agent_session_id) else { return 0 };
    let path = paths::active_session_path(repo_root, &id);
    std::fs::read_to_string(path).map(|c| prompt_count(&c)).unwrap_or(0)
}

fn normalize_rel_path(repo_root: &Path, raw_path: &str) -> String {
    let p = Path::new(raw_path);
    if let Ok(rel) = p.strip_prefix(repo_root) {
        rel.to_string_lossy().to_string()
    } else {
        raw_path.to_string()
    }
}

pub fn append_file_modification(
    repo_root: &Path,
    agent_session_id: Option<&str>,
    raw_path: &str,
) -> Result<()> {
    let Some(id) = resolve_active_id(repo_root, agent_session_id) else { return Ok(()) };
    let path = paths::active_session_path(repo_root, &id);
    if !path.exists() {
        return Ok(());
    }
    let rel = normalize_rel_path(repo_root, raw_path);
    append_line(&path, &format!("- Modified: {rel}\n"))
}

pub fn append_task_note(repo_root: &Path, agent_session_id: Option<&str>, text: &str) -> Result<()> {
    let Some(id) = resolve_active_id(repo_root, agent_session_id) else { return Ok(()) };
    let path = paths::active_session_path(repo_root, &id);
    if !path.exists() {
        return Ok(());
    }
    append_line(&path, &format!("- Task: {text}\n"))
}

pub fn append_turn_delimiter(repo_root: &Path, agent_session_id: Option<&str>) -> Result<()> {
    let Some(id) = resolve_active_id(repo_root, agent_session_id) else { return Ok(()) };
    let path = paths::active_session_path(repo_root, &id);
    if !path.exists() {
        return Ok(());
    }
    let now = Utc::now().to_rfc3339();
    let mut block = format!("\n---\n_turn completed: {now}_\n");
    let scm = ScmAdapter::new(repo_root);
    if let Some(stat) = scm.diff_stat() {
        block.push_str(&format!("```\n{stat}\n```\n"));
    }
    append_line(&path, &block)
}

pub struct FinalizeResult {
    pub path: PathBuf,
    pub internal_id: SessionId,
}

/// `finalize`: fast redaction, close frontmatter, move `active/` ->
/// `completed/`, drop the session-map entry, clear the current-id marker
/// if it still points here.
pub fn finalize(
    repo_root: &Path,
    agent_session_id: Option<&str>,
    redactor: &ghost_core::Redactor,
) -> Result<Option<FinalizeResult>> {
    let Some(id) = resolve_active_id(repo_root, agent_session_id) else { return Ok(None) };
    let active_path = paths::active_session_path(repo_root, &id);
    let Ok(content) = std::fs::read_to_string(&active_path) else { return Ok(None) };

    let redacted = redactor.fast_pass(&content);
    let (block, body) = frontmatter::split(&redacted);
    let mut raw: RawFrontmatter = frontmatter::parse_raw(block);
    raw.set("ended", FmValue::Scalar(Utc::now().to_rfc3339()));
    let new_content = format!("{}{}", raw.render(), body);

    std::fs::write(&active_path, &new_content)?;

    let completed_path = paths::completed_session_path(repo_root, &id);
    if let Some(parent) = completed_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::rename(&active_path, &completed_path)?;

    if let Some(agent_id) = agent_session_id {
        let mut map = read_session_map(repo_root);
        map.remove(agent_id);
        write_session_map(repo_root, &map)?;
    }
    clear_current_id_if_matches(repo_root, &id);

    Ok(Some(FinalizeResult { path: completed_path, internal_id: id }))
}

/// Most-recently-finalized session id: lexicographically greatest file
/// under `completed/` (ids sort correctly since they're `YYYY-MM-DD-hex`).
/// `checkpoint` uses this instead of the current-id marker, which races
/// under concurrent sessions.
pub fn most_recently_completed(repo_root: &Path) -> Option<SessionId> {
    let dir = paths::completed_dir(repo_root);
    let entries = std::fs::read_dir(dir).ok()?;
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|name| name.ends_with(".md"))
        .map(|name| name.trim_end_matches(".md").to_string())
        .max()
        .map(SessionId)
}

/// `checkpoint`: attach the most recently completed session's transcript
/// as a note on `HEAD`. Silent-fail on any missing input.
pub fn checkpoint(repo_root: &Path) -> Result<()> {
    let Some(id) = most_recently_completed(repo_root) else { return Ok(()) };
    let path = paths::completed_session_path(repo_root, &id);
    if !path.exists() {
        return Ok(());
    }
    let scm = ScmAdapter::new(repo_root);
    let Some(head) = scm.head_sha() else { return Ok(()) };
    scm.add_note(&head, &path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ghost_core::Redactor;
    use std::process::Command;

    fn init_repo(dir: &Path) {
        Command::new("git").args(["init", "-q"]).current_dir(dir).status().unwrap();
        Command::new("git")
            .args(["config", "user.email", "t@example.com"])
            .current_dir(dir)
            .status()
            .unwrap();
        Command::new("git").args(["config", "user.name", "T"]).current_dir(dir).status().unwrap();
        std::fs::write(dir.join("README.md"), "hi").unwrap();
        Command::new("git").args(["add", "."]).current_dir(dir).status().unwrap();
        Command::new("git")
            .args(["commit", "-q", "-m", "init"])
            .current_dir(dir)
            .status()
            .unwrap();
        paths::ensure_tree(dir).unwrap();
    }

    #[test]
    fn lifecycle_scenario() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let repo = dir.path();

        create(repo, Some("agentA")).unwrap();
        append_prompt(repo, Some("agentA"), "do thing one").unwrap();
        append_file_modification(repo, Some("agentA"), "src/a.rs").unwrap();
        append_file_modification(repo, Some("agentA"), "src/b.rs").unwrap();
        append_turn_delimiter(repo, Some("agentA")).unwrap();
        append_prompt(repo, Some("agentA"), "do thing two").unwrap();

        let redactor = Redactor::new();
        let result = finalize(repo, Some("agentA"), &redactor).unwrap().unwrap();
        let content = std::fs::read_to_string(&result.path).unwrap();

        assert!(content.contains("## Prompt 1"));
        assert!(content.contains("## Prompt 2"));
        assert!(content.contains("- Modified: src/a.rs"));
        assert!(content.contains("- Modified: src/b.rs"));
        assert!(content.contains("_turn completed:"));
        assert!(content.contains("ended:"));
        assert!(!paths::active_session_path(repo, &result.internal_id).exists());
    }

    #[test]
    fn concurrent_sessions_stay_isolated() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let repo = dir.path();

        let id_a = create(repo, Some("agentA")).unwrap();
        let id_b = create(repo, Some("agentB")).unwrap();
        assert_ne!(id_a, id_b);

        append_prompt(repo, Some("agentA"), "from A").unwrap();
        append_prompt(repo, Some("agentB"), "from B").unwrap();

        let content_a = std::fs::read_to_string(paths::active_session_path(repo, &id_a)).unwrap();
        let content_b = std::fs::read_to_string(paths::active_session_path(repo, &id_b)).unwrap();
        assert!(content_a.contains("from A"));
        assert!(!content_a.contains("from B"));
        assert!(content_b.contains("from B"));
        assert!(!content_b.contains("from A"));
    }

    #[test]
    fn dedup_of_consecutive_identical_prompts() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let repo = dir.path();

        create(repo, Some("agentA")).unwrap();
        append_prompt(repo, Some("agentA"), "fix").unwrap();
        append_prompt(repo, Some("agentA"), "fix").unwrap();

        assert_eq!(get_prompt_count(repo, Some("agentA")), 1);
    }

    #[test]
    fn append_on_absent_session_is_silent_noop() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let repo = dir.path();

        assert!(append_prompt(repo, Some("ghost-agent"), "hi").is_ok());
        assert!(append_file_modification(repo, Some("ghost-agent"), "x.rs").is_ok());
        assert!(append_task_note(repo, Some("ghost-agent"), "task").is_ok());
    }
}

//! Knowledge Sync: an orphan branch `ghost/knowledge`
//! holding `knowledge.md`, `mistakes.md`, `decisions.md`, `tags.json` at
//! its root, synced via the same subprocess plumbing the SCM Adapter uses
//! for everything else, no network or merge library, just `git`.

use crate::error::Result;
use chrono::{DateTime, Utc};
use ghost_core::paths;
use ghost_core::ScmAdapter;
use ghost_types::TagIndex;
use std::path::Path;

pub const BRANCH: &str = "ghost/knowledge";
const FILES: [&str; 4] = ["knowledge.md", "mistakes.md", "decisions.md", "tags.json"];
const PULL_INTERVAL_MINUTES: i64 = 5;

/// If the branch exists locally, nothing to do. Otherwise try a remote
/// fetch; failing that (or with no remote), seed it with an orphan commit.
pub fn init(scm: &ScmAdapter) -> Result<()> {
    if scm.branch_exists_locally(BRANCH) {
        return Ok(());
    }
    if scm.has_remote() && scm.fetch_branch(BRANCH) {
        return Ok(());
    }
    let seed: Vec<(String, String)> =
        FILES.iter().map(|f| (f.to_string(), String::new())).collect();
    scm.write_orphan_commit(BRANCH, &seed, "ghost: seed knowledge branch");
    Ok(())
}

fn read_last_sync(repo_root: &Path) -> Option<DateTime<Utc>> {
    std::fs::read_to_string(paths::last_sync_path(repo_root))
        .ok()?
        .trim()
        .parse()
        .ok()
}

fn write_last_sync(repo_root: &Path, now: DateTime<Utc>) -> Result<()> {
    std::fs::write(paths::last_sync_path(repo_root), now.to_rfc3339())?;
    Ok(())
}

fn due_for_remote_fetch(repo_root: &Path, now: DateTime<Utc>) -> bool {
    match read_last_sync(repo_root) {
        Some(last) => (now - last).num_minutes() >= PULL_INTERVAL_MINUTES,
        None => true,
    }
}

fn file_path(repo_root: &Path, name: &str) -> std::path::PathBuf {
    match name {
        "knowledge.md" => paths::knowledge_path(repo_root),
        "mistakes.md" => paths::mistakes_path(repo_root),
        "decisions.md" => paths::decisions_path(repo_root),
        "tags.json" => paths::tags_path(repo_root),
        other => paths::root_dir(repo_root).join(other),
    }
}

fn read_local(repo_root: &Path, name: &str) -> String {
    std::fs::read_to_string(file_path(repo_root, name)).unwrap_or_default()
}

/// Merge one of the four files per its dedicated strategy.
pub fn merge(name: &str, local: &str, remote: &str) -> String {
    match name {
        "knowledge.md" => merge_local_wins(local, remote),
        "mistakes.md" | "decisions.md" => merge_knowledge_log(local, remote),
        "tags.json" => merge_tags(local, remote),
        _ => local.to_string(),
    }
}

fn merge_local_wins(local: &str, remote: &str) -> String {
    if local.trim().is_empty() { remote.to_string() } else { local.to_string() }
}

fn merge_tags(local: &str, remote: &str) -> String {
    let local_index: TagIndex = serde_json::from_str(local).unwrap_or_default();
    let remote_index: TagIndex = serde_json::from_str(remote).unwrap_or_default();
    let merged = local_index.merge(&remote_index);
    serde_json::to_string_pretty(&merged).unwrap_or_default()
}

fn merge_knowledge_log(local: &str, remote: &str) -> String {
    let local_entries = ghost_store::knowledge::parse(local);
    let remote_entries = ghost_store::knowledge::parse(remote);

    let local_structured: Vec<_> = local_entries.iter().filter(|e| !e.is_legacy()).cloned().collect();
    let remote_structured: Vec<_> =
        remote_entries.iter().filter(|e| !e.is_legacy()).cloned().collect();

    if local_structured.is_empty() && remote_structured.is_empty() {
        return merge_blocks(local, remote);
    }

    let mut seen = std::collections::HashSet::new();
    let mut structured = Vec::new();
    for entry in local_structured.into_iter().chain(remote_structured) {
        if seen.insert(entry.dedup_key()) {
            structured.push(entry);
        }
    }

    let local_legacy = local_entries.into_iter().filter(|e| e.is_legacy());
    let remote_legacy = remote_entries.into_iter().filter(|e| e.is_legacy());
    let mut seen_legacy = std::collections::HashSet::new();
    let mut legacy = Vec::new();
    for entry in local_legacy.chain(remote_legacy) {
        if seen_legacy.insert(entry.dedup_key()) {
            legacy.push(entry);
        }
    }

    let mut out = String::new();
    for entry in structured.iter().chain(legacy.iter()) {
        out.push_str(&ghost_store::knowledge::render_entry(entry));
        out.push('\n');
    }
    out
}

/// Fallback for documents with no structured entries on either side: split
/// on blank-line runs, keep the first occurrence of each block.
fn merge_blocks(local: &str, remote: &str) -> String {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for block in local.split("\n\n").chain(remote.split("\n\n")) {
        let trimmed = block.trim();
        if trimmed.is_empty() {
            continue;
        }
        if seen.insert(trimmed.to_string()) {
            out.push(trimmed.to_string());
        }
    }
    out.join("\n\n")
}

/// `pull`: rate-limited remote fetch, then merge each of the four blobs
/// with the local copy, writing back only when the merge changed anything.
pub fn pull(repo_root: &Path, scm: &ScmAdapter) -> Result<()> {
    init(scm)?;

    let now = Utc::now();
    if scm.has_remote() && due_for_remote_fetch(repo_root, now) {
        scm.fetch_branch(BRANCH);
        write_last_sync(repo_root, now)?;
    }

    for name in FILES {
        let remote = scm.read_blob(BRANCH, name).unwrap_or_default();
        let local = read_local(repo_root, name);
        let merged = merge(name, &local, &remote);
        if merged != local {
            let path = file_path(repo_root, name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, merged)?;
        }
    }
    Ok(())
}

/// `push`: merge each non-empty local file with the branch tip's copy,
/// commit the result via plumbing, advance the ref, and push if a remote
/// exists. Never touches the working tree.
pub fn push(repo_root: &Path, scm: &ScmAdapter) -> Result<()> {
    init(scm)?;

    let mut files = Vec::new();
    for name in FILES {
        let local = read_local(repo_root, name);
        if local.trim().is_empty() {
            continue;
        }
        let remote = scm.read_blob(BRANCH, name).unwrap_or_default();
        let merged = merge(name, &local, &remote);
        files.push((name.to_string(), merged));
    }

    if files.is_empty() {
        return Ok(());
    }

    scm.write_orphan_commit(BRANCH, &files, "ghost: sync knowledge");

    if scm.has_remote() {
        scm.push_branch(BRANCH, true);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn knowledge_md_prefers_local_unless_blank() {
        assert_eq!(merge_local_wins("local content", "remote content"), "local content");
        assert_eq!(merge_local_wins("   \n", "remote content"), "remote content");
    }

    #[test]
    fn tags_merge_is_deep_union() {
        let local = r#"{"area:cart":["2026-01-01-aaaaaaaa"]}"#;
        let remote = r#"{"area:cart":["2026-01-02-bbbbbbbb"],"type:bug":["2026-01-03-cccccccc"]}"#;
        let merged_json = merge_tags(local, remote);
        let merged: TagIndex = serde_json::from_str(&merged_json).unwrap();
        assert_eq!(merged.sessions_for("area:cart").len(), 2);
        assert_eq!(merged.sessions_for("type:bug").len(), 1);
    }

    #[test]
    fn mistakes_md_dedups_structured_entries_by_title_and_description() {
        let local = "### Off-by-one\nLoop bound wrong.\n<!-- date:2026-01-01 -->\n";
        let remote = "### Off-by-one\nLoop bound wrong.\n<!-- date:2026-01-02 -->\n\n### Other\nSomething else.\n<!-- date:2026-01-03 -->\n";
        let merged = merge_knowledge_log(local, remote);
        let entries = ghost_store::knowledge::parse(&merged);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Off-by-one");
        assert_eq!(entries[0].date, "2026-01-01", "local copy wins on key collision (first occurrence)");
    }

    #[test]
    fn legacy_only_logs_fall_back_to_block_dedup() {
        let local = "- same note\n\n- local only note\n";
        let remote = "- same note\n\n- remote only note\n";
        let merged = merge_knowledge_log(local, remote);
        assert!(merged.contains("same note"));
        assert!(merged.contains("local only note"));
        assert!(merged.contains("remote only note"));
        assert_eq!(merged.matches("same note").count(), 1);
    }
}

//! `reindex`/`validate`/`update`/`version`: offline
//! housekeeping that doesn't fit the session/knowledge-store handlers.

use anyhow::{anyhow, bail, Result};
use ghost_core::paths;
use ghost_types::{SessionId, TagIndex};
use std::collections::HashSet;
use std::path::Path;

pub fn reindex(repo_root: &Path) -> Result<()> {
    let config = ghost_core::config::load(repo_root);
    let dir = paths::completed_dir(repo_root);
    ghost_sync::search::index(repo_root, &dir, config.search_engine_path.as_deref())
        .map_err(|e| anyhow!(e))?;
    println!("reindexed completed sessions into {}", ghost_sync::search::collection_name(repo_root));
    Ok(())
}

fn list_ids(dir: &Path) -> HashSet<String> {
    std::fs::read_dir(dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|n| n.ends_with(".md"))
                .map(|n| n.trim_end_matches(".md").to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// `## Prompt N` headings of whichever transcript (active or completed)
/// `id` resolves to, in appearance order.
fn prompt_numbers(repo_root: &Path, id: &str, active: &HashSet<String>) -> Vec<u32> {
    let path = if active.contains(id) {
        paths::active_session_path(repo_root, &SessionId::new(id))
    } else {
        paths::completed_session_path(repo_root, &SessionId::new(id))
    };
    std::fs::read_to_string(path)
        .map(|content| {
            content
                .lines()
                .filter_map(|l| l.strip_prefix("## Prompt "))
                .filter_map(|rest| rest.split(' ').next())
                .filter_map(|n| n.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Offline repair pass over the session store's on-disk invariants: no id
/// lives in both `active/` and `completed/`, `## Prompt N` headings are
/// sequential per transcript, and `tags.json` parses as a map of string to
/// array.
pub fn validate(repo_root: &Path, fix: bool) -> Result<()> {
    let mut problems = Vec::new();

    let active = list_ids(&paths::active_dir(repo_root));
    let completed = list_ids(&paths::completed_dir(repo_root));
    for id in active.intersection(&completed) {
        problems.push(format!("session {id} present in both active/ and completed/"));
    }

    for id in active.union(&completed) {
        let numbers = prompt_numbers(repo_root, id, &active);
        for (i, n) in numbers.iter().enumerate() {
            if *n != (i as u32) + 1 {
                problems.push(format!("session {id}: Prompt heading sequence broken at position {i}"));
                break;
            }
        }
    }

    let tags_path = paths::tags_path(repo_root);
    if let Ok(text) = std::fs::read_to_string(&tags_path) {
        if serde_json::from_str::<TagIndex>(&text).is_err() {
            problems.push("tags.json: malformed, not a map of tag to session-id array".to_string());
            if fix {
                std::fs::write(&tags_path, serde_json::to_string_pretty(&TagIndex::default())?)?;
                println!("repaired tags.json (reset to an empty index)");
            }
        }
    }

    if problems.is_empty() {
        println!("ghost validate: no problems found");
        return Ok(());
    }
    for p in &problems {
        println!("- {p}");
    }
    if fix {
        Ok(())
    } else {
        bail!("{} problem(s) found; re-run with --fix to repair what's repairable", problems.len());
    }
}

/// Informational only, distinct from the Background Finalizer's actual
/// knowledge-sync pull/push, which runs on every `SessionEnd` regardless.
pub fn update() -> Result<()> {
    println!("ghost {}", env!("CARGO_PKG_VERSION"));
    println!("install method: cargo (no bundled self-update mechanism)");
    Ok(())
}

pub fn version() -> Result<()> {
    println!("ghost {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}

//! SessionStart context assembly.
//!
//! Every sub-section is best-effort: a failure anywhere inside one section
//! omits that section silently rather than failing the whole block, since
//! this text is the one intentional thing a hook may print to standard
//! output and nothing else may ever reach it.

use crate::summary;
use chrono::{DateTime, Utc};
use ghost_core::{paths, ScmAdapter};
use ghost_store::{graph, knowledge};
use ghost_types::GhostConfig;
use std::path::Path;

const TOP_K: usize = 5;
const NEIGHBOUR_K: usize = 5;

fn continuity_paragraph(repo_root: &Path, current_branch: &str, window_hours: i64) -> Option<String> {
    let dir = paths::completed_dir(repo_root);
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .ok()?
        .filter_map(|e| e.ok())
        .filter_map(|e| e.file_name().into_string().ok())
        .filter(|n| n.ends_with(".md"))
        .collect();
    names.sort();
    names.reverse();

    let now = Utc::now();
    for name in names {
        let path = paths::completed_dir(repo_root).join(&name);
        let Ok(content) = std::fs::read_to_string(&path) else { continue };
        let (block, body) = ghost_store::frontmatter::split(&content);
        let fm = ghost_store::frontmatter::parse_session_frontmatter(block);
        if fm.branch != current_branch {
            continue;
        }
        let Some(ended) = fm.ended else { continue };
        if (now - ended).num_hours() > window_hours {
            continue;
        }
        let open_items = summary::find_section(&body, "Open Items").unwrap_or_default();
        if open_items.trim().is_empty() {
            continue;
        }
        return Some(format!(
            "Continuing from session {} (ended {}): {}",
            fm.id,
            format_relative(ended, now),
            open_items.trim()
        ));
    }
    None
}

fn format_relative(ended: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let hours = (now - ended).num_hours().max(0);
    if hours == 0 { "less than an hour ago".to_string() } else { format!("{hours}h ago") }
}

/// Assemble the full SessionStart text block: continuity,
/// top mistakes, top decisions, co-modified-neighbour review candidates,
/// a standing briefing.
pub fn build(repo_root: &Path, config: &GhostConfig) -> String {
    let mut out = String::new();
    let scm = ScmAdapter::new(repo_root);

    if let Some(branch) = scm.current_branch() {
        if let Some(paragraph) =
            continuity_paragraph(repo_root, &branch, config.retention.continuity_window_hours)
        {
            out.push_str(&paragraph);
            out.push_str("\n\n");
        }
    }

    let f = scm.changed_files();
    let cached_graph = graph::load_or_rebuild(repo_root).ok();
    let neighbours =
        cached_graph.as_ref().map(|g| graph::neighbours(g, &f, NEIGHBOUR_K)).unwrap_or_default();

    let mistakes = knowledge::read_mistakes(repo_root);
    let ranked_mistakes = graph::rank(mistakes, &f, &neighbours, &config.score, &scm, TOP_K);
    out.push_str(&graph::format_context("Relevant mistakes", &ranked_mistakes));

    let decisions = knowledge::read_decisions(repo_root);
    let ranked_decisions = graph::rank(decisions, &f, &neighbours, &config.score, &scm, TOP_K);
    out.push_str(&graph::format_context("Relevant decisions", &ranked_decisions));

    if !neighbours.is_empty() {
        out.push_str("## Review candidates (frequently co-modified)\n");
        for n in &neighbours {
            out.push_str(&format!("- {n}\n"));
        }
        out.push('\n');
    }

    out.push_str(
        "Remember to record decisions and mistakes as you go; they're mined into shared knowledge at session end.\n",
    );

    out
}

/// `resume [id]`: the continuity block for an explicit session, or the most
/// recently completed one if none is given. Unlike the SessionStart
/// continuity paragraph this ignores the branch/window filter, since the
/// caller asked for this session specifically.
pub fn resume_block(repo_root: &Path, id: Option<&str>) -> Option<String> {
    let target = match id {
        Some(explicit) => ghost_types::SessionId::new(explicit),
        None => ghost_store::session::most_recently_completed(repo_root)?,
    };
    let path = paths::completed_session_path(repo_root, &target);
    let content = std::fs::read_to_string(&path).ok()?;
    let (block, body) = ghost_store::frontmatter::split(&content);
    let fm = ghost_store::frontmatter::parse_session_frontmatter(block);
    let open_items = summary::find_section(&body, "Open Items").unwrap_or_default();

    match fm.ended {
        Some(ended) => Some(format!(
            "Session {} on {} (ended {}): {}",
            fm.id,
            fm.branch,
            format_relative(ended, Utc::now()),
            if open_items.trim().is_empty() { "(no open items recorded)" } else { open_items.trim() }
        )),
        None => Some(format!("Session {} on {}: still active", fm.id, fm.branch)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_repo_yields_a_non_empty_standing_briefing_only() {
        let dir = tempfile::tempdir().unwrap();
        paths::ensure_tree(dir.path()).unwrap();
        let out = build(dir.path(), &GhostConfig::default());
        assert!(out.contains("Remember to record"));
    }
}

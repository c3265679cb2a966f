//! `heatmap`/`stats`: read-only views over the co-modification
//! graph and the knowledge store. Both take optional `--tag` scoping and
//! `--json` output for scripting; `stats` also takes `--since`, which
//! `heatmap` has no dated data to support.

use anyhow::Result;
use ghost_core::paths;
use ghost_store::{graph, knowledge};
use ghost_types::TagIndex;
use std::collections::HashSet;
use std::path::Path;

fn read_tag_index(repo_root: &Path) -> TagIndex {
    std::fs::read_to_string(paths::tags_path(repo_root))
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

/// Paths touched by a decision/mistake recorded against a session carrying
/// `tag`. The co-mod graph itself has no per-path tag, so `--tag` scoping
/// is done through the knowledge entries that link sessions to tags.
fn tagged_files(repo_root: &Path, tag: &str) -> HashSet<String> {
    let sessions = read_tag_index(repo_root).sessions_for(tag);
    let mut files = HashSet::new();
    for e in knowledge::read_decisions(repo_root).into_iter().chain(knowledge::read_mistakes(repo_root)) {
        if e.session_id.as_deref().map(|id| sessions.contains(id)).unwrap_or(false) {
            files.extend(e.files);
        }
    }
    files
}

/// No `--since`: the co-mod graph's weights are cumulative edge counts with
/// no per-bump timestamp, so there is nothing to scope by date. `stats`
/// takes one because it reads the dated knowledge logs instead.
pub fn heatmap(repo_root: &Path, tag: Option<&str>, json: bool, top: usize) -> Result<()> {
    let g = graph::load_or_rebuild(repo_root)?;

    let mut totals: Vec<(String, u32)> = g
        .graph
        .iter()
        .map(|(path, neighbours)| (path.clone(), neighbours.iter().map(|(_, w)| *w).sum()))
        .collect();

    if let Some(t) = tag {
        let files = tagged_files(repo_root, t);
        totals.retain(|(p, _)| files.contains(p));
    }

    totals.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    totals.truncate(top);

    if json {
        println!("{}", serde_json::to_string_pretty(&totals)?);
    } else if totals.is_empty() {
        println!("no co-modification data");
    } else {
        for (path, weight) in &totals {
            println!("{weight:>5}  {path}");
        }
    }
    Ok(())
}

pub fn stats(repo_root: &Path, tag: Option<&str>, since: Option<&str>, json: bool, top: usize) -> Result<()> {
    let mut decisions = knowledge::read_decisions(repo_root);
    let mut mistakes = knowledge::read_mistakes(repo_root);

    if let Some(t) = tag {
        let files = tagged_files(repo_root, t);
        decisions.retain(|e| e.files.iter().any(|f| files.contains(f)));
        mistakes.retain(|e| e.files.iter().any(|f| files.contains(f)));
    }
    if let Some(s) = since {
        decisions.retain(|e| e.date.as_str() >= s);
        mistakes.retain(|e| e.date.as_str() >= s);
    }

    let mut by_area: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for e in decisions.iter().chain(mistakes.iter()) {
        *by_area.entry(e.area.clone()).or_default() += 1;
    }
    let mut areas: Vec<(String, usize)> = by_area.into_iter().collect();
    areas.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    areas.truncate(top);

    if json {
        let out = serde_json::json!({
            "decisions": decisions.len(),
            "mistakes": mistakes.len(),
            "top_areas": areas,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("decisions: {}", decisions.len());
        println!("mistakes:  {}", mistakes.len());
        println!("top areas:");
        for (area, count) in &areas {
            println!("  {area:<20} {count}");
        }
    }
    Ok(())
}

use anyhow::Result;
use ghost_core::paths;
use ghost_store::knowledge;
use ghost_types::TagIndex;
use std::path::Path;

fn read_tag_index(repo_root: &Path) -> TagIndex {
    std::fs::read_to_string(paths::tags_path(repo_root))
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

pub fn handle(repo_root: &Path, tag: Option<&str>) -> Result<()> {
    let entries = knowledge::read_decisions(repo_root);
    let filtered: Vec<_> = match tag {
        Some(t) => {
            let sessions = read_tag_index(repo_root).sessions_for(t);
            entries
                .into_iter()
                .filter(|e| e.session_id.as_deref().map(|id| sessions.contains(id)).unwrap_or(false))
                .collect()
        }
        None => entries,
    };

    if filtered.is_empty() {
        println!("no decisions recorded");
        return Ok(());
    }
    for e in &filtered {
        println!("- {} ({}, {})", e.title, e.area, e.date);
        if !e.description.is_empty() {
            println!("  {}", e.description);
        }
    }
    Ok(())
}

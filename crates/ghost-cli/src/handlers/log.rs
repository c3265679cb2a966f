use anyhow::Result;
use ghost_core::paths;
use ghost_store::frontmatter;
use std::path::Path;

pub fn handle(repo_root: &Path) -> Result<()> {
    let dir = paths::completed_dir(repo_root);
    let mut names: Vec<String> = std::fs::read_dir(&dir)
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter_map(|e| e.file_name().into_string().ok())
                .filter(|n| n.ends_with(".md"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names.reverse();

    if names.is_empty() {
        println!("no completed sessions");
        return Ok(());
    }

    for name in names.into_iter().take(20) {
        let Ok(content) = std::fs::read_to_string(dir.join(&name)) else { continue };
        let (block, _) = frontmatter::split(&content);
        let fm = frontmatter::parse_session_frontmatter(block);
        let ended = fm.ended.map(|e| e.to_rfc3339()).unwrap_or_else(|| "(active)".to_string());
        println!("{:<24} {:<24} {}", fm.id, fm.branch, ended);
    }
    Ok(())
}

use anyhow::Result;
use ghost_store::knowledge;
use ghost_types::KnowledgeEntry;
use std::path::Path;

/// `brief "<text>"`: a free-text knowledge lookup, independent of the
/// current file set. Unlike SessionStart's relevance scoring, a brief is
/// scoped to whatever topic the caller names, not to the worktree's diff.
pub fn handle(repo_root: &Path, text: &str) -> Result<()> {
    let needle = text.to_lowercase();
    let matches = |e: &KnowledgeEntry| {
        e.title.to_lowercase().contains(&needle)
            || e.description.to_lowercase().contains(&needle)
            || e.area.to_lowercase().contains(&needle)
    };

    let decisions: Vec<_> = knowledge::read_decisions(repo_root).into_iter().filter(matches).collect();
    let mistakes: Vec<_> = knowledge::read_mistakes(repo_root).into_iter().filter(matches).collect();

    if decisions.is_empty() && mistakes.is_empty() {
        println!("no recorded knowledge matches '{text}'");
        return Ok(());
    }

    if !mistakes.is_empty() {
        println!("## Mistakes matching '{text}'");
        for e in &mistakes {
            println!("- {}: {}", e.title, e.description);
            if let Some(rule) = e.rule.as_deref().filter(|r| !r.is_empty()) {
                println!("  RULE: {rule}");
            }
        }
    }
    if !decisions.is_empty() {
        println!("## Decisions matching '{text}'");
        for e in &decisions {
            println!("- {}: {}", e.title, e.description);
        }
    }
    Ok(())
}

use anyhow::Result;
use chrono::Utc;
use ghost_core::ScmAdapter;
use ghost_store::knowledge;
use ghost_types::KnowledgeEntry;
use std::path::Path;

/// `mistake "<text>"`: a manually recorded entry, distinct from ones mined
/// by the Background Finalizer. `files`/`area` default from the current
/// worktree's uncommitted changes.
pub fn handle(repo_root: &Path, text: &str) -> Result<()> {
    let scm = ScmAdapter::new(repo_root);
    let files = scm.changed_files();
    let entry = KnowledgeEntry {
        title: text.to_string(),
        description: String::new(),
        session_id: None,
        commit_sha: scm.head_sha(),
        area: knowledge::area(&files),
        date: Utc::now().format("%Y-%m-%d").to_string(),
        files,
        tried: Vec::new(),
        rule: None,
    };
    knowledge::append_mistake(repo_root, &entry)?;
    println!("recorded mistake: {text}");
    Ok(())
}

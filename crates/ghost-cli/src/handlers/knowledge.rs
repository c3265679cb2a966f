use anyhow::{Context, Result};
use ghost_core::paths;
use ghost_core::ScmAdapter;
use ghost_store::{graph, knowledge};
use std::path::Path;

/// `knowledge build`: force the co-modification graph cache current and
/// report the current aggregate counts. Decisions and mistakes themselves
/// accumulate continuously via the Background Finalizer; this just
/// refreshes the derived cache and summarizes what's there.
pub fn build(repo_root: &Path) -> Result<()> {
    let g = graph::load_or_rebuild(repo_root)?;
    println!(
        "co-modification graph: {} completed session(s), {} path(s) tracked",
        g.session_count,
        g.graph.len()
    );
    println!("decisions: {}", knowledge::read_decisions(repo_root).len());
    println!("mistakes:  {}", knowledge::read_mistakes(repo_root).len());
    Ok(())
}

/// `knowledge inject`: write the current SessionStart-style context block
/// to a fixed file under `.ai-sessions/`, for hosting agents that read an
/// on-disk context file directly rather than a hook's stdout.
pub fn inject(repo_root: &Path) -> Result<()> {
    let config = ghost_core::config::load(repo_root);
    let text = crate::context::build(repo_root, &config);
    let path = paths::root_dir(repo_root).join("context.md");
    std::fs::write(&path, &text).with_context(|| format!("writing {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(())
}

pub fn show(repo_root: &Path) -> Result<()> {
    for (label, path) in [
        ("Knowledge", paths::knowledge_path(repo_root)),
        ("Decisions", paths::decisions_path(repo_root)),
        ("Mistakes", paths::mistakes_path(repo_root)),
    ] {
        let content = std::fs::read_to_string(&path).unwrap_or_default();
        println!("## {label}\n{content}");
    }
    Ok(())
}

/// `knowledge diff`: compare each synced file against the local copy
/// without pulling or pushing.
pub fn diff(repo_root: &Path) -> Result<()> {
    let scm = ScmAdapter::uncapped(repo_root);
    ghost_sync::sync::init(&scm)?;
    for (name, path) in [
        ("knowledge.md", paths::knowledge_path(repo_root)),
        ("decisions.md", paths::decisions_path(repo_root)),
        ("mistakes.md", paths::mistakes_path(repo_root)),
        ("tags.json", paths::tags_path(repo_root)),
    ] {
        let local = std::fs::read_to_string(&path).unwrap_or_default();
        let remote = scm.read_blob(ghost_sync::sync::BRANCH, name).unwrap_or_default();
        if local.trim() == remote.trim() {
            println!("{name}: in sync");
        } else {
            println!("{name}: differs (local {} bytes, synced {} bytes)", local.len(), remote.len());
        }
    }
    Ok(())
}

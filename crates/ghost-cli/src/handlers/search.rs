use anyhow::anyhow;
use anyhow::Result;
use std::path::Path;

pub fn handle(repo_root: &Path, query: &str, tags: &[String]) -> Result<()> {
    let config = ghost_core::config::load(repo_root);
    let out = ghost_sync::search::query(repo_root, query, tags, config.search_engine_path.as_deref())
        .map_err(|e| anyhow!(e))?;
    print!("{out}");
    Ok(())
}

use anyhow::{bail, Result};
use std::path::Path;

pub fn handle(repo_root: &Path, id: Option<&str>) -> Result<()> {
    match crate::context::resume_block(repo_root, id) {
        Some(text) => {
            println!("{text}");
            Ok(())
        }
        None => bail!("no completed session{} found", id.map(|i| format!(" '{i}'")).unwrap_or_default()),
    }
}

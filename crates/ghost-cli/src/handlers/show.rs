use anyhow::{bail, Result};
use ghost_core::ScmAdapter;
use std::path::Path;

pub fn handle(repo_root: &Path, commit: &str) -> Result<()> {
    let scm = ScmAdapter::new(repo_root);
    match scm.show_note(commit) {
        Some(note) => {
            print!("{note}");
            Ok(())
        }
        None => bail!("no note attached to {commit}"),
    }
}

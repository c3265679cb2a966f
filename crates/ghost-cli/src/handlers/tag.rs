use anyhow::{bail, Result};
use ghost_store::{knowledge, session};
use ghost_types::SessionId;
use std::path::Path;

/// `ghost tag <id> <tags...>` or `ghost tag --last <tags...>`. clap can't
/// disambiguate a leading optional id from the tag list, so `args.rs` hands
/// us one flat positional bucket and the split happens here.
pub fn handle(repo_root: &Path, last: bool, args: &[String]) -> Result<()> {
    let (id, tags): (SessionId, Vec<String>) = if last {
        let id = session::most_recently_completed(repo_root)
            .ok_or_else(|| anyhow::anyhow!("no completed sessions to tag"))?;
        if args.is_empty() {
            bail!("tag requires at least one tag");
        }
        (id, args.to_vec())
    } else {
        let Some((id, tags)) = args.split_first() else {
            bail!("tag requires an id and at least one tag, or --last and at least one tag");
        };
        if tags.is_empty() {
            bail!("tag requires at least one tag");
        }
        (SessionId::new(id.clone()), tags.to_vec())
    };

    if !knowledge::add_tags(repo_root, &id, &tags)? {
        bail!("session {id} not found");
    }
    println!("tagged {id} with: {}", tags.join(", "));
    Ok(())
}

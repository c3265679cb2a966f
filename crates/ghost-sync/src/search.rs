//! Search Adapter.
//!
//! Wraps a separate `ghost-search` executable over subprocess, exactly as
//! the SCM Adapter wraps `git`; the engine is never linked in-process.
//! Indexing failures (finalizer-invoked) are swallowed and logged; query
//! failures (user-invoked) are a reportable command failure.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

const DEFAULT_ENGINE: &str = "ghost-search";
const TIMEOUT: Duration = Duration::from_secs(30);

pub fn collection_name(repo_root: &Path) -> String {
    let basename = repo_root.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
    format!("ghost-{basename}")
}

fn engine_path(configured: Option<&str>) -> String {
    configured.unwrap_or(DEFAULT_ENGINE).to_string()
}

fn run(engine: &str, args: &[&str], cwd: &Path) -> Option<std::process::Output> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let engine = engine.to_string();
    let cwd = cwd.to_path_buf();

    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let result = Command::new(&engine).args(&args).current_dir(&cwd).output();
        let _ = tx.send(result);
    });
    rx.recv_timeout(TIMEOUT).ok().and_then(|r| r.ok())
}

/// Invoked only from the Background Finalizer; failures are swallowed by
/// the caller (returns `Ok`/`Err`, never panics) and should be logged to
/// `.background.log`, not surfaced to the user.
pub fn index(repo_root: &Path, dir: &Path, engine_path_override: Option<&str>) -> Result<(), String> {
    let engine = engine_path(engine_path_override);
    let collection = collection_name(repo_root);
    let dir_str = dir.to_string_lossy().to_string();
    match run(&engine, &["index", "--collection", &collection, &dir_str], repo_root) {
        Some(out) if out.status.success() => Ok(()),
        Some(out) => Err(format!(
            "ghost-search index exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )),
        None => Err(format!("could not run search engine '{engine}'")),
    }
}

/// Invoked only from the `search` user command; a non-zero exit or missing
/// executable is a reportable failure, unlike `index`.
pub fn query(
    repo_root: &Path,
    text: &str,
    tags: &[String],
    engine_path_override: Option<&str>,
) -> Result<String, String> {
    let engine = engine_path(engine_path_override);
    let collection = collection_name(repo_root);
    let mut args: Vec<String> =
        vec!["query".to_string(), "--collection".to_string(), collection, text.to_string()];
    for tag in tags {
        args.push("--tag".to_string());
        args.push(tag.clone());
    }
    let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();

    match run(&engine, &arg_refs, repo_root) {
        Some(out) if out.status.success() => Ok(String::from_utf8_lossy(&out.stdout).to_string()),
        Some(out) => Err(format!(
            "ghost-search query exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )),
        None => Err(format!(
            "could not run search engine '{engine}'; install it or set search_engine_path in config.toml"
        )),
    }
}

/// Invoked only from `reset`; a missing executable is tolerated since
/// there is then nothing to delete.
pub fn delete_collection(repo_root: &Path, engine_path_override: Option<&str>) -> Result<(), String> {
    let engine = engine_path(engine_path_override);
    let collection = collection_name(repo_root);
    match run(&engine, &["delete", "--collection", &collection], repo_root) {
        Some(out) if out.status.success() => Ok(()),
        Some(out) => Err(format!(
            "ghost-search delete exited with {}: {}",
            out.status,
            String::from_utf8_lossy(&out.stderr).trim()
        )),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_name_derives_from_repo_basename() {
        let repo = Path::new("/home/user/my-project");
        assert_eq!(collection_name(repo), "ghost-my-project");
    }

    #[test]
    fn missing_engine_binary_is_reported_not_panicked() {
        let dir = tempfile::tempdir().unwrap();
        let result = query(dir.path(), "anything", &[], Some("ghost-search-does-not-exist-xyz"));
        assert!(result.is_err());
    }

    #[test]
    fn missing_engine_binary_index_reports_err_not_panic() {
        let dir = tempfile::tempdir().unwrap();
        let result = index(dir.path(), dir.path(), Some("ghost-search-does-not-exist-xyz"));
        assert!(result.is_err());
    }
}

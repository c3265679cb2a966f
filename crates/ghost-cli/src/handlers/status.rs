use anyhow::Result;
use ghost_core::{paths, ScmAdapter};
use std::path::Path;

pub fn handle(repo_root: &Path) -> Result<()> {
    let active_id = std::fs::read_to_string(paths::current_id_path(repo_root))
        .ok()
        .map(|s| s.trim().to_string());
    let completed_count = std::fs::read_dir(paths::completed_dir(repo_root))
        .map(|rd| {
            rd.filter_map(|e| e.ok())
                .filter(|e| e.file_name().to_string_lossy().ends_with(".md"))
                .count()
        })
        .unwrap_or(0);
    let pid = std::fs::read_to_string(paths::background_pid_path(repo_root))
        .ok()
        .map(|s| s.trim().to_string());
    let pid_alive = pid.as_deref().map(pid_is_alive).unwrap_or(false);

    println!("active session:       {}", active_id.as_deref().unwrap_or("none"));
    println!("completed sessions:    {completed_count}");
    println!(
        "background finalizer: {}",
        match (&pid, pid_alive) {
            (Some(p), true) => format!("running (pid {p})"),
            (Some(p), false) => format!("stale pid file ({p})"),
            (None, _) => "not running".to_string(),
        }
    );

    let scm = ScmAdapter::new(repo_root);
    println!(
        "knowledge branch:     {}",
        if scm.branch_exists_locally(ghost_sync::sync::BRANCH) { "present" } else { "absent" }
    );
    println!(
        "search engine:        {}",
        if which("ghost-search").is_some() { "found on PATH" } else { "not found on PATH" }
    );
    Ok(())
}

#[cfg(unix)]
fn pid_is_alive(pid: &str) -> bool {
    pid.parse::<i32>().map(|p| unsafe { libc::kill(p, 0) == 0 }).unwrap_or(false)
}
#[cfg(not(unix))]
fn pid_is_alive(_pid: &str) -> bool {
    false
}

fn which(bin: &str) -> Option<std::path::PathBuf> {
    std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).map(|dir| dir.join(bin)).find(|p| p.is_file()))?
}

//! Thin subprocess wrapper over `git`. No `git2`/libgit2 dependency;
//! everything shells out to the `git` binary.
//!
//! Every public method returns `Option<T>` (or `bool`/`()`): a missing
//! remote, branch, or note is `None`, never an `Err`. Spawn failure and a
//! non-zero exit are both folded into `None` as well: the adapter has no
//! notion of a "hard" SCM error; no call throws for a missing remote,
//! branch, or note.

use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::sync::mpsc;
use std::time::Duration;

pub const NOTES_REF: &str = "ai-sessions";

#[derive(Debug, Clone)]
pub struct ScmAdapter {
    repo_root: PathBuf,
    /// `None` means "no cap", used only by the Background Finalizer, which
    /// is allowed unbounded suspension at SCM-network calls.
    timeout: Option<Duration>,
}

impl ScmAdapter {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self { repo_root: repo_root.into(), timeout: Some(Duration::from_secs(3)) }
    }

    pub fn with_timeout(repo_root: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self { repo_root: repo_root.into(), timeout: Some(timeout) }
    }

    /// For Background Finalizer call sites that may legitimately block on
    /// a network fetch/push.
    pub fn uncapped(repo_root: impl Into<PathBuf>) -> Self {
        Self { repo_root: repo_root.into(), timeout: None }
    }

    fn run(&self, args: &[&str]) -> Option<Output> {
        run_capped(&self.repo_root, args, self.timeout)
    }

    fn run_ok(&self, args: &[&str]) -> Option<String> {
        let out = self.run(args)?;
        if !out.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }

    pub fn repo_root(&self) -> Option<PathBuf> {
        self.run_ok(&["rev-parse", "--show-toplevel"]).map(PathBuf::from)
    }

    pub fn current_branch(&self) -> Option<String> {
        self.run_ok(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    pub fn head_sha(&self) -> Option<String> {
        self.run_ok(&["rev-parse", "HEAD"])
    }

    /// Fenced diff-stat for the current worktree state, used by
    /// `append_turn_delimiter`.
    pub fn diff_stat(&self) -> Option<String> {
        let stat = self.run_ok(&["diff", "--stat"])?;
        if stat.trim().is_empty() { None } else { Some(stat) }
    }

    /// Repo-relative paths with uncommitted changes, used by SessionStart
    /// to seed the current file set `F` for the relevance scorer.
    pub fn changed_files(&self) -> Vec<String> {
        self.run_ok(&["diff", "--name-only"])
            .map(|out| out.lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect())
            .unwrap_or_default()
    }

    pub fn branch_exists_locally(&self, name: &str) -> bool {
        let refspec = format!("refs/heads/{name}");
        self.run(&["show-ref", "--verify", "--quiet", refspec.as_str()])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    pub fn has_remote(&self) -> bool {
        self.run_ok(&["remote"]).map(|s| !s.trim().is_empty()).unwrap_or(false)
    }

    pub fn fetch_branch(&self, name: &str) -> bool {
        let refspec = format!("{name}:refs/remotes/origin/{name}");
        self.run(&["fetch", "origin", refspec.as_str()])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    pub fn push_branch(&self, name: &str, no_verify: bool) -> bool {
        let mut args = vec!["push", "origin", name];
        if no_verify {
            args.push("--no-verify");
        }
        self.run(&args).map(|o| o.status.success()).unwrap_or(false)
    }

    /// `git show <notes_ref>:<sha>` equivalent via `notes show`.
    pub fn show_note(&self, sha: &str) -> Option<String> {
        self.run_ok(&["notes", "--ref", NOTES_REF, "show", sha])
    }

    /// Attach `file`'s contents as a note on `sha`, overwriting any
    /// existing note.
    pub fn add_note(&self, sha: &str, file: &Path) -> bool {
        let file_str = file.to_string_lossy().to_string();
        self.run(&["notes", "--ref", NOTES_REF, "add", "-f", "-F", file_str.as_str(), sha])
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Delete the notes ref outright, used by `reset`.
    pub fn delete_notes_ref(&self) -> bool {
        let refspec = format!("refs/notes/{NOTES_REF}");
        self.run(&["update-ref", "-d", refspec.as_str()]).map(|o| o.status.success()).unwrap_or(false)
    }

    pub fn set_config(&self, key: &str, value: &str) -> bool {
        self.run(&["config", key, value]).map(|o| o.status.success()).unwrap_or(false)
    }

    /// `<branch>:<path>` blob read, used by Knowledge Sync's pull.
    pub fn read_blob(&self, branch: &str, path: &str) -> Option<String> {
        let blobspec = format!("{branch}:{path}");
        self.run_ok(&["show", blobspec.as_str()])
    }

    /// Number of commits touching `path` since `since_date` (`YYYY-MM-DD`),
    /// backing the co-mod graph's staleness probe.
    pub fn commits_touching_since(&self, path: &str, since_date: &str) -> Option<u32> {
        let since_arg = format!("--since={since_date}");
        let out = self.run_ok(&[
            "log",
            "--oneline",
            since_arg.as_str(),
            "--",
            path,
        ])?;
        Some(out.lines().filter(|l| !l.trim().is_empty()).count() as u32)
    }

    /// Orphan-branch plumbing: hash the given files (repo-relative path ->
    /// content) into a new commit on `branch`, parented on its current tip
    /// if it has one, without touching the worktree or `HEAD`.
    pub fn write_orphan_commit(
        &self,
        branch: &str,
        files: &[(String, String)],
        message: &str,
    ) -> Option<String> {
        let index = TempIndex::new()?;
        let parent = self.run_ok(&["rev-parse", branch]);

        if let Some(parent_sha) = &parent {
            self.run_with_index(&index, &["read-tree", parent_sha.as_str()])?;
        }

        for (rel_path, content) in files {
            let blob_sha = self.hash_object_w(content)?;
            self.run_with_index(
                &index,
                &[
                    "update-index",
                    "--add",
                    "--cacheinfo",
                    "100644",
                    blob_sha.as_str(),
                    rel_path.as_str(),
                ],
            )?;
        }

        let tree_sha = self.run_with_index_ok(&index, &["write-tree"])?;

        let mut commit_args = vec!["commit-tree", tree_sha.as_str(), "-m", message];
        if let Some(parent_sha) = &parent {
            commit_args.push("-p");
            commit_args.push(parent_sha.as_str());
        }
        let commit_sha = self.run_ok(&commit_args)?;

        let update_ref_spec = format!("refs/heads/{branch}");
        let ok = self
            .run(&["update-ref", update_ref_spec.as_str(), commit_sha.as_str()])
            .map(|o| o.status.success())
            .unwrap_or(false);

        if ok { Some(commit_sha) } else { None }
    }

    fn hash_object_w(&self, content: &str) -> Option<String> {
        let mut child = Command::new("git")
            .args(["hash-object", "-w", "--stdin"])
            .current_dir(&self.repo_root)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .ok()?;
        child.stdin.take()?.write_all(content.as_bytes()).ok()?;
        let out = child.wait_with_output().ok()?;
        if !out.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }

    fn run_with_index(&self, index: &TempIndex, args: &[&str]) -> Option<()> {
        let out = run_capped_env(&self.repo_root, args, self.timeout, &index.env_pair())?;
        if out.status.success() { Some(()) } else { None }
    }

    fn run_with_index_ok(&self, index: &TempIndex, args: &[&str]) -> Option<String> {
        let out = run_capped_env(&self.repo_root, args, self.timeout, &index.env_pair())?;
        if !out.status.success() {
            return None;
        }
        Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
    }
}

/// RAII guard for the temporary `GIT_INDEX_FILE` used by orphan-branch
/// writes, removed on every exit path via `Drop`, not a manual cleanup at
/// each early return.
struct TempIndex {
    file: tempfile::NamedTempFile,
}

impl TempIndex {
    fn new() -> Option<Self> {
        tempfile::NamedTempFile::new().ok().map(|file| Self { file })
    }

    fn env_pair(&self) -> (String, String) {
        ("GIT_INDEX_FILE".to_string(), self.file.path().to_string_lossy().to_string())
    }
}

fn run_capped(cwd: &Path, args: &[&str], timeout: Option<Duration>) -> Option<Output> {
    run_capped_inner(cwd, args, timeout, None)
}

fn run_capped_inner(
    cwd: &Path,
    args: &[&str],
    timeout: Option<Duration>,
    env: Option<&(String, String)>,
) -> Option<Output> {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let cwd = cwd.to_path_buf();
    let env = env.cloned();

    let (tx, rx) = mpsc::channel();
    let handle = std::thread::spawn(move || {
        let mut cmd = Command::new("git");
        cmd.args(&args).current_dir(&cwd).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some((k, v)) = &env {
            cmd.env(k, v);
        }
        let result = cmd.output();
        let _ = tx.send(result);
    });

    let result = match timeout {
        Some(t) => rx.recv_timeout(t).ok(),
        None => rx.recv().ok(),
    };

    // The thread (and any still-running child) is intentionally not
    // joined/killed on timeout: joining would reintroduce the wait the
    // timeout exists to avoid. The hook path only needs a bound on when it
    // gives up *waiting*, not a guarantee the subprocess stops.
    drop(handle);

    result.and_then(|r| r.ok())
}

fn run_capped_env(
    cwd: &Path,
    args: &[&str],
    timeout: Option<Duration>,
    env: &(String, String),
) -> Option<Output> {
    run_capped_inner(cwd, args, timeout, Some(env))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn init_repo(dir: &Path) {
        StdCommand::new("git").args(["init", "-q"]).current_dir(dir).status().unwrap();
        StdCommand::new("git")
            .args(["config", "user.email", "t@example.com"])
            .current_dir(dir)
            .status()
            .unwrap();
        StdCommand::new("git")
            .args(["config", "user.name", "Test"])
            .current_dir(dir)
            .status()
            .unwrap();
    }

    #[test]
    fn absent_branch_is_none_not_error() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        let scm = ScmAdapter::new(dir.path());
        assert!(!scm.branch_exists_locally("does-not-exist"));
        assert!(scm.show_note("deadbeef").is_none());
    }

    #[test]
    fn head_sha_and_branch_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        StdCommand::new("git").args(["add", "."]).current_dir(dir.path()).status().unwrap();
        StdCommand::new("git")
            .args(["commit", "-q", "-m", "init"])
            .current_dir(dir.path())
            .status()
            .unwrap();

        let scm = ScmAdapter::new(dir.path());
        assert!(scm.head_sha().is_some());
        assert!(scm.current_branch().is_some());
    }

    #[test]
    fn orphan_commit_does_not_move_head() {
        let dir = tempfile::tempdir().unwrap();
        init_repo(dir.path());
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        StdCommand::new("git").args(["add", "."]).current_dir(dir.path()).status().unwrap();
        StdCommand::new("git")
            .args(["commit", "-q", "-m", "init"])
            .current_dir(dir.path())
            .status()
            .unwrap();

        let scm = ScmAdapter::uncapped(dir.path());
        let before_head = scm.head_sha().unwrap();

        let sha = scm
            .write_orphan_commit(
                "ghost/knowledge",
                &[("knowledge.md".to_string(), "# hi\n".to_string())],
                "seed knowledge",
            )
            .expect("orphan commit");
        assert!(!sha.is_empty());

        let after_head = scm.head_sha().unwrap();
        assert_eq!(before_head, after_head, "HEAD must not move");
        assert!(!dir.path().join("knowledge.md").exists(), "worktree must not change");
    }
}

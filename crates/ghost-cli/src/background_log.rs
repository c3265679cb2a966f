//! `.background.log` writer: plain
//! text lines `[ISO] message`, rotated once the file exceeds 50 kB by
//! keeping only the last 200 lines. Deliberately not a `tracing` layer:
//! this wire format is part of the on-disk contract and must stay stable
//! independent of the logging stack `ghost-cli`'s own diagnostics use.

use chrono::Utc;
use ghost_core::paths;
use ghost_types::RetentionConfig;
use std::io::Write as _;
use std::path::Path;

pub fn log(repo_root: &Path, retention: &RetentionConfig, message: &str) {
    let path = paths::background_log_path(repo_root);
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let line = format!("[{}] {message}\n", Utc::now().to_rfc3339());
    if let Ok(mut file) = std::fs::OpenOptions::new().create(true).append(true).open(&path) {
        let _ = file.write_all(line.as_bytes());
    }

    rotate_if_needed(&path, retention);
}

fn rotate_if_needed(path: &Path, retention: &RetentionConfig) {
    let Ok(meta) = std::fs::metadata(path) else { return };
    if meta.len() <= retention.background_log_max_bytes {
        return;
    }
    let Ok(content) = std::fs::read_to_string(path) else { return };
    let kept: Vec<&str> = content
        .lines()
        .rev()
        .take(retention.background_log_keep_lines)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    let mut rewritten = kept.join("\n");
    rewritten.push('\n');
    let _ = std::fs::write(path, rewritten);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_line_matches_fixed_format() {
        let dir = tempfile::tempdir().unwrap();
        paths::ensure_tree(dir.path()).unwrap();
        log(dir.path(), &RetentionConfig::default(), "summarize: ok");
        let content = std::fs::read_to_string(paths::background_log_path(dir.path())).unwrap();
        assert!(content.starts_with('['));
        assert!(content.contains("] summarize: ok"));
    }

    #[test]
    fn rotation_keeps_only_the_most_recent_lines() {
        let dir = tempfile::tempdir().unwrap();
        paths::ensure_tree(dir.path()).unwrap();
        let retention = RetentionConfig { background_log_max_bytes: 200, background_log_keep_lines: 3, ..RetentionConfig::default() };
        for i in 0..50 {
            log(dir.path(), &retention, &format!("step {i}"));
        }
        let content = std::fs::read_to_string(paths::background_log_path(dir.path())).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert!(lines.len() <= 3);
        assert!(lines.last().unwrap().contains("step 49"));
    }
}

//! Knowledge Store: append-only markdown logs of decisions
//! and mistakes, plus tagging of session transcripts.
//!
//! Both `knowledge.md` and `mistakes.md`/`decisions.md` share one on-disk
//! shape: structured `### ` entries with a trailing metadata comment,
//! interleaved with legacy `- ` one-line entries. The parser tolerates
//! both in the same file, in any order.

use crate::error::Result;
use crate::frontmatter;
use ghost_core::paths;
use ghost_types::{KnowledgeEntry, SessionId, TagIndex};
use std::collections::HashMap;
use std::path::Path;

const CODE_ROOT_PREFIXES: [&str; 3] = ["src", "app", "lib"];

/// Strip one leading `src`/`app`/`lib` segment then take the first
/// remaining segment; majority vote across `paths`, ties broken
/// lexicographically. Empty input or all-root-level files yield `general`.
pub fn area(paths_in: &[String]) -> String {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for p in paths_in {
        let mut segments = p.split('/');
        let first = match segments.next() {
            Some(s) => s,
            None => continue,
        };
        let rest = segments.next();
        let segment = match rest {
            Some(second) if CODE_ROOT_PREFIXES.contains(&first) => second,
            Some(_) => first,
            None => continue, // root-level file
        };
        *counts.entry(segment.to_string()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)))
        .map(|(seg, _)| seg)
        .unwrap_or_else(|| "general".to_string())
}

fn parse_metadata(comment: &str) -> HashMap<String, String> {
    let inner = comment
        .trim()
        .trim_start_matches("<!--")
        .trim_end_matches("-->")
        .trim();
    inner
        .split('|')
        .filter_map(|pair| pair.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// Parse one `### `-delimited chunk. Returns the structured entry plus any
/// `- ` legacy lines trailing after its metadata comment; the grammar
/// allows legacy entries between structured blocks too.
fn parse_entry(chunk: &str) -> (KnowledgeEntry, Vec<KnowledgeEntry>) {
    let mut lines = chunk.lines();
    let title = lines.next().unwrap_or("").trim().to_string();

    let rest: Vec<&str> = lines.collect();
    let meta_idx = rest.iter().position(|l| l.trim_start().starts_with("<!--"));
    let (desc_lines, meta, trailing) = match meta_idx {
        Some(idx) => (&rest[..idx], parse_metadata(rest[idx]), &rest[idx + 1..]),
        None => (&rest[..], HashMap::new(), &rest[rest.len()..]),
    };
    let description = desc_lines.join("\n").trim().to_string();

    let files = meta
        .get("files")
        .map(|s| s.split(',').map(|f| f.trim().to_string()).filter(|f| !f.is_empty()).collect())
        .unwrap_or_default();
    let tried = meta
        .get("tried")
        .map(|s| s.split(',').map(|f| f.trim().to_string()).filter(|f| !f.is_empty()).collect())
        .unwrap_or_default();

    let entry = KnowledgeEntry {
        title,
        description,
        session_id: meta.get("session").cloned(),
        commit_sha: meta.get("commit").cloned(),
        files,
        area: meta.get("area").cloned().unwrap_or_else(|| "general".to_string()),
        date: meta.get("date").cloned().unwrap_or_default(),
        tried,
        rule: meta.get("rule").cloned(),
    };

    let legacy = trailing
        .iter()
        .filter_map(|l| l.trim().strip_prefix("- "))
        .map(|title| KnowledgeEntry::legacy(title.trim()))
        .collect();

    (entry, legacy)
}

/// Parse a full knowledge/mistakes/decisions markdown body into entries,
/// tolerating structured and legacy entries interleaved.
pub fn parse(body: &str) -> Vec<KnowledgeEntry> {
    let mut entries = Vec::new();
    // Prepend a newline so a `### ` heading at the very start of the file
    // is matched by the same `"\n### "` delimiter as every other heading.
    let normalized = format!("\n{body}");
    let mut parts = normalized.split("\n### ");

    if let Some(preamble) = parts.next() {
        for line in preamble.lines() {
            let trimmed = line.trim();
            if let Some(title) = trimmed.strip_prefix("- ") {
                entries.push(KnowledgeEntry::legacy(title.trim()));
            }
        }
    }
    for chunk in parts {
        let (entry, trailing_legacy) = parse_entry(chunk);
        entries.push(entry);
        entries.extend(trailing_legacy);
    }
    entries
}

/// Render one entry back to markdown, omitting `area: general`, empty
/// `tried`, and empty `rule`.
pub fn render_entry(entry: &KnowledgeEntry) -> String {
    if entry.is_legacy() {
        return format!("- {}\n", entry.title);
    }

    let mut out = format!("### {}\n", entry.title);
    if !entry.description.is_empty() {
        out.push_str(&entry.description);
        out.push('\n');
    }

    let mut meta = Vec::new();
    if let Some(session) = &entry.session_id {
        meta.push(format!("session:{session}"));
    }
    if let Some(commit) = &entry.commit_sha {
        meta.push(format!("commit:{commit}"));
    }
    if !entry.files.is_empty() {
        meta.push(format!("files:{}", entry.files.join(",")));
    }
    if entry.area != "general" {
        meta.push(format!("area:{}", entry.area));
    }
    if !entry.date.is_empty() {
        meta.push(format!("date:{}", entry.date));
    }
    if !entry.tried.is_empty() {
        meta.push(format!("tried:{}", entry.tried.join(",")));
    }
    if let Some(rule) = &entry.rule {
        meta.push(format!("rule:{rule}"));
    }
    if !meta.is_empty() {
        out.push_str(&format!("<!-- {} -->\n", meta.join(" | ")));
    }
    out
}

fn append_entry(path: &Path, entry: &KnowledgeEntry) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io::Write as _;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(format!("\n{}", render_entry(entry)).as_bytes())?;
    Ok(())
}

pub fn append_decision(repo_root: &Path, entry: &KnowledgeEntry) -> Result<()> {
    append_entry(&paths::decisions_path(repo_root), entry)
}

pub fn append_mistake(repo_root: &Path, entry: &KnowledgeEntry) -> Result<()> {
    append_entry(&paths::mistakes_path(repo_root), entry)
}

pub fn append_knowledge(repo_root: &Path, entry: &KnowledgeEntry) -> Result<()> {
    append_entry(&paths::knowledge_path(repo_root), entry)
}

pub fn read_decisions(repo_root: &Path) -> Vec<KnowledgeEntry> {
    std::fs::read_to_string(paths::decisions_path(repo_root)).map(|s| parse(&s)).unwrap_or_default()
}

pub fn read_mistakes(repo_root: &Path) -> Vec<KnowledgeEntry> {
    std::fs::read_to_string(paths::mistakes_path(repo_root)).map(|s| parse(&s)).unwrap_or_default()
}

pub fn read_knowledge(repo_root: &Path) -> Vec<KnowledgeEntry> {
    std::fs::read_to_string(paths::knowledge_path(repo_root)).map(|s| parse(&s)).unwrap_or_default()
}

fn read_tag_index(repo_root: &Path) -> TagIndex {
    std::fs::read_to_string(paths::tags_path(repo_root))
        .ok()
        .and_then(|s| serde_json::from_str(&s).ok())
        .unwrap_or_default()
}

fn write_tag_index(repo_root: &Path, index: &TagIndex) -> Result<()> {
    let path = paths::tags_path(repo_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(index)?)?;
    Ok(())
}

/// `add_tags`: locate the session in `completed/` then `active/`, merge
/// into its frontmatter tag sequence (order-preserving, deduplicating),
/// then update `tags.json`.
pub fn add_tags(repo_root: &Path, id: &SessionId, tags: &[String]) -> Result<bool> {
    let completed = paths::completed_session_path(repo_root, id);
    let active = paths::active_session_path(repo_root, id);
    let path = if completed.exists() {
        completed
    } else if active.exists() {
        active
    } else {
        return Ok(false);
    };

    let content = std::fs::read_to_string(&path)?;
    let (block, body) = frontmatter::split(&content);
    let mut raw = frontmatter::parse_raw(block);
    raw.merge_tags(tags);
    std::fs::write(&path, format!("{}{}", raw.render(), body))?;

    let mut index = read_tag_index(repo_root);
    for tag in tags {
        index.add(tag, id.as_str());
    }
    write_tag_index(repo_root, &index)?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn area_strips_code_root_prefix_and_majority_votes() {
        let files = vec![
            "src/cart/checkout.rs".to_string(),
            "src/cart/totals.rs".to_string(),
            "src/auth/login.rs".to_string(),
        ];
        assert_eq!(area(&files), "cart");
    }

    #[test]
    fn area_of_root_level_files_is_general() {
        let files = vec!["README.md".to_string(), "Cargo.toml".to_string()];
        assert_eq!(area(&files), "general");
    }

    #[test]
    fn area_of_empty_input_is_general() {
        assert_eq!(area(&[]), "general");
    }

    #[test]
    fn parses_interleaved_structured_and_legacy_entries() {
        let body = "\
- legacy one
### Use explicit lifetimes
Parser borrowed input outlives the caller.
<!-- session:2026-01-01-abcd1234 | files:src/parse.rs | area:parse | date:2026-01-01 -->
- legacy two
";
        let entries = parse(body);
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_legacy());
        assert_eq!(entries[0].title, "legacy one");
        assert_eq!(entries[1].title, "Use explicit lifetimes");
        assert_eq!(entries[1].area, "parse");
        assert_eq!(entries[1].files, vec!["src/parse.rs"]);
        assert!(entries[2].is_legacy());
        assert_eq!(entries[2].title, "legacy two");
    }

    #[test]
    fn render_omits_general_area_and_empty_tried_and_rule() {
        let entry = KnowledgeEntry {
            title: "t".to_string(),
            description: "d".to_string(),
            area: "general".to_string(),
            date: "2026-01-01".to_string(),
            ..Default::default()
        };
        let rendered = render_entry(&entry);
        assert!(!rendered.contains("area:"));
        assert!(!rendered.contains("tried:"));
        assert!(!rendered.contains("rule:"));
        assert!(rendered.contains("date:2026-01-01"));
    }

    #[test]
    fn render_then_parse_roundtrips_structured_entry() {
        let entry = KnowledgeEntry {
            title: "Title".to_string(),
            description: "Body text.".to_string(),
            session_id: Some("2026-01-01-deadbeef".to_string()),
            commit_sha: Some("abc123".to_string()),
            files: vec!["src/x.rs".to_string(), "src/y.rs".to_string()],
            area: "x".to_string(),
            date: "2026-01-01".to_string(),
            tried: vec!["approach a".to_string()],
            rule: Some("always do y".to_string()),
        };
        let rendered = render_entry(&entry);
        let parsed = parse(&rendered);
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0], entry);
    }

    #[test]
    fn tagging_merges_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        paths::ensure_tree(repo).unwrap();
        let id = SessionId::new("2026-01-01-deadbeef");
        let path = paths::active_session_path(repo, &id);
        std::fs::write(&path, "---\nid: 2026-01-01-deadbeef\n---\nbody\n").unwrap();

        assert!(add_tags(repo, &id, &["area:cart".to_string()]).unwrap());
        assert!(add_tags(repo, &id, &["area:cart".to_string(), "type:bug".to_string()]).unwrap());

        let content = std::fs::read_to_string(&path).unwrap();
        let (block, _) = frontmatter::split(&content);
        let raw = frontmatter::parse_raw(block);
        assert_eq!(raw.tags(), vec!["area:cart", "type:bug"]);

        let index: TagIndex =
            serde_json::from_str(&std::fs::read_to_string(paths::tags_path(repo)).unwrap()).unwrap();
        assert_eq!(index.sessions_for("area:cart").len(), 1);
    }

    #[test]
    fn add_tags_on_missing_session_returns_false() {
        let dir = tempfile::tempdir().unwrap();
        let repo = dir.path();
        paths::ensure_tree(repo).unwrap();
        let id = SessionId::new("2026-01-01-missing0");
        assert!(!add_tags(repo, &id, &["x".to_string()]).unwrap());
    }
}

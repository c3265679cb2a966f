//! Minimal hand-rolled YAML-subset frontmatter: `---\nkey: value\n---\n`.
//!
//! Sessions carry a small, fixed set of scalar/list/bool fields, so a full
//! YAML library is unwarranted for a narrow, fixed grammar. Parsing never
//! fails: a malformed or partial block degrades to an empty frontmatter.

use chrono::{DateTime, Utc};
use ghost_types::{SessionFrontmatter, SessionId};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub enum FmValue {
    Scalar(String),
    List(Vec<String>),
    Bool(bool),
}

/// Order-preserving frontmatter map, used by tagging to round-trip
/// unrelated keys untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFrontmatter {
    order: Vec<String>,
    values: BTreeMap<String, FmValue>,
}

impl RawFrontmatter {
    pub fn get(&self, key: &str) -> Option<&FmValue> {
        self.values.get(key)
    }

    pub fn set(&mut self, key: &str, value: FmValue) {
        if !self.values.contains_key(key) {
            self.order.push(key.to_string());
        }
        self.values.insert(key.to_string(), value);
    }

    pub fn tags(&self) -> Vec<String> {
        match self.values.get("tags") {
            Some(FmValue::List(items)) => items.clone(),
            Some(FmValue::Scalar(s)) if !s.is_empty() => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    /// Merge `new_tags` into the existing tag list, preserving order and
    /// deduplicating.
    pub fn merge_tags(&mut self, new_tags: &[String]) {
        let mut tags = self.tags();
        for t in new_tags {
            if !tags.contains(t) {
                tags.push(t.clone());
            }
        }
        self.set("tags", FmValue::List(tags));
    }

    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        for key in &self.order {
            let value = &self.values[key];
            match value {
                FmValue::Scalar(s) => out.push_str(&format!("{key}: {s}\n")),
                FmValue::Bool(b) => out.push_str(&format!("{key}: {b}\n")),
                FmValue::List(items) => {
                    out.push_str(&format!("{key}: [{}]\n", items.join(", ")));
                }
            }
        }
        out.push_str("---\n");
        out
    }
}

/// Split a document into `(frontmatter_block_text, body)`. Returns an
/// empty frontmatter block when the document doesn't open with `---`.
pub fn split(doc: &str) -> (&str, &str) {
    if let Some(rest) = doc.strip_prefix("---\n") {
        if let Some(end) = rest.find("\n---\n") {
            return (&rest[..end], &rest[end + "\n---\n".len()..]);
        }
        if let Some(end) = rest.find("\n---") {
            return (&rest[..end], "");
        }
    }
    ("", doc)
}

pub fn parse_raw(block: &str) -> RawFrontmatter {
    let mut fm = RawFrontmatter::default();
    for line in block.lines() {
        let Some((key, raw_value)) = line.split_once(':') else { continue };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let raw_value = raw_value.trim();
        let value = if raw_value.starts_with('[') && raw_value.ends_with(']') {
            let inner = &raw_value[1..raw_value.len() - 1];
            let items = inner
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            FmValue::List(items)
        } else if raw_value == "true" {
            FmValue::Bool(true)
        } else if raw_value == "false" {
            FmValue::Bool(false)
        } else {
            FmValue::Scalar(raw_value.to_string())
        };
        fm.set(key, value);
    }
    fm
}

pub fn render_session_frontmatter(fm: &SessionFrontmatter) -> String {
    let mut raw = RawFrontmatter::default();
    raw.set("id", FmValue::Scalar(fm.id.clone()));
    raw.set("branch", FmValue::Scalar(fm.branch.clone()));
    raw.set("base_commit", FmValue::Scalar(fm.base_commit.clone()));
    raw.set("started", FmValue::Scalar(fm.started.to_rfc3339()));
    if let Some(ended) = fm.ended {
        raw.set("ended", FmValue::Scalar(ended.to_rfc3339()));
    }
    raw.set("tags", FmValue::List(fm.tags.clone()));
    if let Some(skip) = fm.skip_knowledge {
        raw.set("skip_knowledge", FmValue::Bool(skip));
    }
    raw.render()
}

/// Parse a `SessionFrontmatter`, degrading absent/malformed fields to
/// sensible defaults rather than failing.
pub fn parse_session_frontmatter(block: &str) -> SessionFrontmatter {
    let raw = parse_raw(block);
    let scalar = |k: &str| -> String {
        match raw.get(k) {
            Some(FmValue::Scalar(s)) => s.clone(),
            _ => String::new(),
        }
    };
    let started = scalar("started")
        .parse::<DateTime<Utc>>()
        .unwrap_or_else(|_| Utc::now());
    let ended = match raw.get("ended") {
        Some(FmValue::Scalar(s)) => s.parse::<DateTime<Utc>>().ok(),
        _ => None,
    };
    let skip_knowledge = match raw.get("skip_knowledge") {
        Some(FmValue::Bool(b)) => Some(*b),
        _ => None,
    };
    SessionFrontmatter {
        id: scalar("id"),
        branch: scalar("branch"),
        base_commit: scalar("base_commit"),
        started,
        ended,
        tags: raw.tags(),
        skip_knowledge,
    }
}

pub fn session_id_from(fm: &SessionFrontmatter) -> SessionId {
    SessionId(fm.id.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_extracts_block_and_body() {
        let doc = "---\nid: x\n---\nbody text\n";
        let (block, body) = split(doc);
        assert_eq!(block, "id: x");
        assert_eq!(body, "body text\n");
    }

    #[test]
    fn missing_frontmatter_yields_empty_block_and_full_body() {
        let doc = "just a body\n";
        let (block, body) = split(doc);
        assert_eq!(block, "");
        assert_eq!(body, doc);
    }

    #[test]
    fn roundtrips_tags_list() {
        let mut raw = RawFrontmatter::default();
        raw.set("tags", FmValue::List(vec!["area:cart".into(), "type:refactor".into()]));
        let rendered = raw.render();
        let parsed = parse_raw(&rendered);
        assert_eq!(parsed.tags(), vec!["area:cart", "type:refactor"]);
    }

    #[test]
    fn merge_tags_is_idempotent_and_order_preserving() {
        let mut raw = RawFrontmatter::default();
        raw.merge_tags(&["a".to_string(), "b".to_string()]);
        raw.merge_tags(&["b".to_string(), "c".to_string()]);
        assert_eq!(raw.tags(), vec!["a", "b", "c"]);
        let before = raw.tags();
        raw.merge_tags(&["a".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(raw.tags(), before);
    }

    #[test]
    fn malformed_block_degrades_to_defaults() {
        let fm = parse_session_frontmatter("not: even[ valid");
        assert_eq!(fm.branch, "");
    }
}

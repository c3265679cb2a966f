//! Summary Extractor: parses the fixed-schema markdown the
//! summarizer executable writes to standard output into typed blocks the
//! Background Finalizer promotes into knowledge entries.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static BLOCK_TITLE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*(.+?)\*\*:?\s*(.*)$").unwrap());

static NONE_VARIANT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^\s*(none|n/a|no\s+(significant|decisions|key|mistakes|errors|issues)\w*|nothing|not applicable)\s*$",
    )
    .unwrap()
});

static SKIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*skip\s*$").unwrap());

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Block {
    pub title: String,
    pub description: String,
    pub files: Vec<String>,
    pub tried: Vec<String>,
    pub rule: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedSummary {
    pub intent: String,
    pub changes: String,
    pub knowledge: Vec<Block>,
    pub decisions: Vec<Block>,
    pub strategies: Vec<Block>,
    pub mistakes: Vec<Block>,
    pub open_items: String,
    pub skip_knowledge: bool,
    pub tags: Vec<String>,
}

/// Split on `^## <Name>` headings into `{heading -> body}`.
fn sections(doc: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let normalized = format!("\n{doc}");
    let mut parts = normalized.split("\n## ");
    parts.next(); // text before the first heading carries no section
    for chunk in parts {
        let mut lines = chunk.lines();
        let heading = lines.next().unwrap_or("").trim().to_string();
        let body = lines.collect::<Vec<_>>().join("\n").trim().to_string();
        map.insert(heading, body);
    }
    map
}

/// Look up a single `## <name>` section's body, used by the SessionStart
/// continuity block to pull `Open Items` out of a prior session's
/// appended Summary section.
pub fn find_section(doc: &str, name: &str) -> Option<String> {
    sections(doc).remove(name)
}

pub fn is_valid_summary(doc: &str) -> bool {
    let s = sections(doc);
    s.contains_key("Intent") && s.contains_key("Tags")
}

fn parse_tags(body: &str) -> Vec<String> {
    body.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.starts_with('#'))
        .collect()
}

pub(crate) fn is_none_variant(body: &str) -> bool {
    NONE_VARIANT_RE.is_match(body.trim())
}

fn parse_block(chunk: &str) -> Block {
    let lines: Vec<&str> = chunk.lines().collect();
    let (title, first_desc) = match lines.first().and_then(|l| BLOCK_TITLE_RE.captures(l)) {
        Some(caps) => (caps[1].trim().to_string(), caps[2].trim().to_string()),
        None => (lines.first().unwrap_or(&"").trim().to_string(), String::new()),
    };

    let mut desc_lines = Vec::new();
    if !first_desc.is_empty() {
        desc_lines.push(first_desc);
    }
    let mut files = Vec::new();
    let mut tried = Vec::new();
    let mut rule = None;

    for line in lines.iter().skip(1) {
        let trimmed = line.trim();
        if let Some(value) = trimmed.strip_prefix("Files:") {
            files = split_csv(value);
        } else if let Some(value) = trimmed.strip_prefix("Tried:") {
            tried = split_csv(value);
        } else if let Some(value) = trimmed.strip_prefix("Rule:") {
            rule = Some(value.trim().to_string());
        } else if !trimmed.is_empty() {
            desc_lines.push(trimmed.to_string());
        }
    }

    Block { title, description: desc_lines.join(" "), files, tried, rule }
}

fn split_csv(s: &str) -> Vec<String> {
    s.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

/// Split a section body on lines starting with `**` to form blocks
///; `none`-variant bodies yield no blocks at all.
fn parse_blocks(body: &str) -> Vec<Block> {
    if body.is_empty() || is_none_variant(body) {
        return Vec::new();
    }
    let normalized = format!("\n{body}");
    normalized
        .split("\n**")
        .skip(1)
        .map(|chunk| parse_block(&format!("**{chunk}")))
        .collect()
}

pub fn parse(doc: &str) -> ParsedSummary {
    let s = sections(doc);
    let get = |name: &str| s.get(name).cloned().unwrap_or_default();

    ParsedSummary {
        intent: get("Intent"),
        changes: get("Changes"),
        knowledge: parse_blocks(&get("Knowledge")),
        decisions: parse_blocks(&get("Decisions")),
        strategies: parse_blocks(&get("Strategies")),
        mistakes: parse_blocks(&get("Mistakes")),
        open_items: get("Open Items"),
        skip_knowledge: SKIP_RE.is_match(get("Relevance").trim()),
        tags: parse_tags(&get("Tags")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "\
## Intent
Refactor the checkout flow.

## Changes
Split totals calculation into its own module.

## Decisions
**Use explicit lifetimes**: avoided a clone in the hot path.
Files: src/cart/totals.rs
Rule: prefer borrowing over cloning in totals

## Mistakes
None

## Relevance
skip

## Tags
area:cart, type:refactor, #ignored
";

    #[test]
    fn validates_minimal_required_sections() {
        assert!(is_valid_summary(DOC));
        assert!(!is_valid_summary("## Changes\nonly changes\n"));
    }

    #[test]
    fn parses_full_document() {
        let parsed = parse(DOC);
        assert_eq!(parsed.intent, "Refactor the checkout flow.");
        assert_eq!(parsed.decisions.len(), 1);
        assert_eq!(parsed.decisions[0].title, "Use explicit lifetimes");
        assert_eq!(parsed.decisions[0].files, vec!["src/cart/totals.rs"]);
        assert_eq!(
            parsed.decisions[0].rule.as_deref(),
            Some("prefer borrowing over cloning in totals")
        );
        assert!(parsed.mistakes.is_empty(), "a 'None' section yields no blocks");
        assert!(parsed.skip_knowledge);
        assert_eq!(parsed.tags, vec!["area:cart", "type:refactor"]);
    }

    #[test]
    fn none_variants_are_recognized_case_insensitively() {
        assert!(is_none_variant("none"));
        assert!(is_none_variant("N/A"));
        assert!(is_none_variant("No significant mistakes"));
        assert!(is_none_variant("Nothing"));
        assert!(is_none_variant("not applicable"));
        assert!(!is_none_variant("**Real finding**: something happened"));
    }

    #[test]
    fn multiple_blocks_in_one_section_are_split() {
        let body = "\
**First**: one thing.
Files: a.rs

**Second**: another thing.
Tried: approach a, approach b
";
        let blocks = parse_blocks(body);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].title, "First");
        assert_eq!(blocks[1].title, "Second");
        assert_eq!(blocks[1].tried, vec!["approach a", "approach b"]);
    }
}

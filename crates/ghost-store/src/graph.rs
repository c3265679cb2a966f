//! Co-mod Graph & Relevance Scorer.

use crate::error::Result;
use ghost_core::paths;
use ghost_core::ScmAdapter;
use ghost_types::{ComodGraph, KnowledgeEntry, ScoreWeights};
use std::collections::{HashMap, HashSet};
use std::path::Path;

fn modified_paths_in_turn(turn_text: &str) -> HashSet<String> {
    turn_text
        .lines()
        .filter_map(|l| l.strip_prefix("- Modified: "))
        .map(|s| s.trim().to_string())
        .collect()
}

/// Split a completed session body on lines equal to `---` (turn
/// delimiters), returning each turn's modified-file set in order.
fn turns_of(content: &str) -> Vec<HashSet<String>> {
    content
        .split("\n---\n")
        .map(modified_paths_in_turn)
        .filter(|set| !set.is_empty())
        .collect()
}

fn completed_session_bodies(repo_root: &Path) -> Vec<String> {
    let dir = paths::completed_dir(repo_root);
    let Ok(entries) = std::fs::read_dir(dir) else { return Vec::new() };
    entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|ext| ext == "md").unwrap_or(false))
        .filter_map(|e| std::fs::read_to_string(e.path()).ok())
        .collect()
}

/// All distinct `- Modified: ` paths in a transcript, in first-seen order.
/// Used by the Background Finalizer to default a knowledge entry's
/// `files` when the summarizer didn't assign any.
pub fn all_modified_paths(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for line in content.lines() {
        if let Some(path) = line.strip_prefix("- Modified: ") {
            let path = path.trim().to_string();
            if seen.insert(path.clone()) {
                out.push(path);
            }
        }
    }
    out
}

pub fn completed_session_count(repo_root: &Path) -> usize {
    let dir = paths::completed_dir(repo_root);
    std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().map(|ext| ext == "md").unwrap_or(false))
                .count()
        })
        .unwrap_or(0)
}

/// Build the full adjacency list from every completed session's turns.
/// Per-vertex lists are sorted by weight descending, ties broken
/// lexicographically.
pub fn build(repo_root: &Path) -> ComodGraph {
    let mut weights: HashMap<(String, String), u32> = HashMap::new();

    for body in completed_session_bodies(repo_root) {
        for turn in turns_of(&body) {
            let mut files: Vec<&String> = turn.iter().collect();
            files.sort();
            for i in 0..files.len() {
                for j in (i + 1)..files.len() {
                    bump(&mut weights, files[i], files[j]);
                    bump(&mut weights, files[j], files[i]);
                }
            }
        }
    }

    let mut graph: HashMap<String, Vec<(String, u32)>> = HashMap::new();
    for ((from, to), weight) in weights {
        graph.entry(from).or_default().push((to, weight));
    }
    for neighbours in graph.values_mut() {
        neighbours.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    }

    ComodGraph { session_count: completed_session_count(repo_root), graph }
}

fn bump(weights: &mut HashMap<(String, String), u32>, from: &str, to: &str) {
    *weights.entry((from.to_string(), to.to_string())).or_insert(0) += 1;
}

fn read_cache(repo_root: &Path) -> Option<ComodGraph> {
    let raw = std::fs::read_to_string(paths::comod_cache_path(repo_root)).ok()?;
    serde_json::from_str(&raw).ok()
}

fn write_cache(repo_root: &Path, graph: &ComodGraph) -> Result<()> {
    let path = paths::comod_cache_path(repo_root);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string(graph)?)?;
    Ok(())
}

/// Load the cached graph, rebuilding it if the completed-session count has
/// changed since it was cached.
pub fn load_or_rebuild(repo_root: &Path) -> Result<ComodGraph> {
    let current_count = completed_session_count(repo_root);
    if let Some(cached) = read_cache(repo_root) {
        if cached.session_count == current_count {
            return Ok(cached);
        }
    }
    let graph = build(repo_root);
    write_cache(repo_root, &graph)?;
    Ok(graph)
}

/// Co-modified-neighbours query: top `k` paths not already in `f`, ranked
/// by how many members of `f` co-modify them, ties broken lexicographically.
pub fn neighbours(graph: &ComodGraph, f: &[String], k: usize) -> Vec<String> {
    let f_set: HashSet<&String> = f.iter().collect();
    let mut counts: HashMap<String, u32> = HashMap::new();
    for path in f {
        for (n, _) in graph.neighbours_of(path) {
            if !f_set.contains(n) {
                *counts.entry(n.clone()).or_insert(0) += 1;
            }
        }
    }
    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(k).map(|(n, _)| n).collect()
}

/// Paths that were modified in at least two adjacent-turn pairs within a
/// session. The Background Finalizer synthesizes an automatic mistake
/// entry for these.
pub fn detect_corrections(session_body: &str) -> Vec<String> {
    let turns = turns_of(session_body);
    let mut correction_counts: HashMap<String, u32> = HashMap::new();
    for pair in turns.windows(2) {
        for path in pair[0].intersection(&pair[1]) {
            *correction_counts.entry(path.clone()).or_insert(0) += 1;
        }
    }
    let mut corrected: Vec<String> =
        correction_counts.into_iter().filter(|(_, n)| *n >= 2).map(|(p, _)| p).collect();
    corrected.sort();
    corrected
}

fn area_of(files: &[String]) -> String {
    crate::knowledge::area(files)
}

fn days_since(date: &str) -> Option<i64> {
    let parsed = chrono::NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let today = chrono::Utc::now().date_naive();
    Some((today - parsed).num_days())
}

/// Relevance score of one entry given the current file set `f`, its
/// co-modified neighbours, and `now`.
pub fn score_entry(entry: &KnowledgeEntry, f: &[String], neighbours: &[String], weights: &ScoreWeights) -> f64 {
    let f_set: HashSet<&String> = f.iter().collect();
    let neighbour_set: HashSet<&String> = neighbours.iter().collect();

    let file_match = entry.files.iter().filter(|p| f_set.contains(p)).count() as f64;
    let neighbour_match = entry.files.iter().filter(|p| neighbour_set.contains(p)).count() as f64;
    let area_match = if entry.area != "general" && entry.area == area_of(f) { 1.0 } else { 0.0 };
    let recency = days_since(&entry.date)
        .map(|days| (1.0 - (days as f64) / (weights.recency_window_days as f64)).max(0.0))
        .unwrap_or(0.0);
    let rule_bonus = if entry.rule.as_deref().unwrap_or("").is_empty() { 0.0 } else { 1.0 };
    let legacy_baseline = if entry.files.is_empty() { 1.0 } else { 0.0 };

    weights.file_match as f64 * file_match
        + weights.neighbour_match as f64 * neighbour_match
        + weights.area_match as f64 * area_match
        + weights.recency_max as f64 * recency
        + weights.rule_bonus as f64 * rule_bonus
        + weights.legacy_baseline as f64 * legacy_baseline
}

pub struct ScoredEntry {
    pub entry: KnowledgeEntry,
    pub score: f64,
}

/// Full ranking pipeline: score every candidate, probe the top `2k` for
/// staleness via `scm`, re-sort, and return the top `k` positive-score
/// entries, falling back to the `k` most recent by date if none score
/// positive.
pub fn rank(
    candidates: Vec<KnowledgeEntry>,
    f: &[String],
    neighbours: &[String],
    weights: &ScoreWeights,
    scm: &ScmAdapter,
    k: usize,
) -> Vec<ScoredEntry> {
    let mut scored: Vec<ScoredEntry> = candidates
        .into_iter()
        .map(|entry| {
            let score = score_entry(&entry, f, neighbours, weights);
            ScoredEntry { entry, score }
        })
        .collect();
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let probe_n = (2 * k).min(scored.len());
    for scored_entry in scored.iter_mut().take(probe_n) {
        let mut stale = false;
        for path in scored_entry.entry.files.iter().take(3) {
            if let Some(count) = scm.commits_touching_since(path, &scored_entry.entry.date) {
                if count > weights.staleness_commit_threshold {
                    stale = true;
                    break;
                }
            }
        }
        if stale {
            scored_entry.score -= weights.staleness_penalty as f64;
        }
    }
    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let positive: Vec<ScoredEntry> =
        scored.iter().filter(|s| s.score > 0.0).take(k).map(|s| ScoredEntry { entry: s.entry.clone(), score: s.score }).collect();
    if !positive.is_empty() {
        return positive;
    }

    let mut by_date = scored;
    by_date.sort_by(|a, b| b.entry.date.cmp(&a.entry.date));
    by_date.into_iter().take(k).collect()
}

/// Rule-precedence formatting for injected context under `heading`: entries
/// with a non-empty rule are emitted first under a dedicated warning
/// heading with the rule text verbatim; the rest follow grouped by file.
pub fn format_context(heading: &str, scored: &[ScoredEntry]) -> String {
    if scored.is_empty() {
        return String::new();
    }

    let (ruled, rest): (Vec<&ScoredEntry>, Vec<&ScoredEntry>) =
        scored.iter().partition(|s| s.entry.rule.as_deref().map(|r| !r.is_empty()).unwrap_or(false));

    let mut out = String::new();
    if !ruled.is_empty() {
        out.push_str(&format!("## {heading}: rules\n"));
        for s in &ruled {
            out.push_str(&format!("- {}: {}\n", s.entry.title, s.entry.rule.as_deref().unwrap_or("")));
        }
        out.push('\n');
    }

    if !rest.is_empty() {
        let mut by_file: HashMap<String, Vec<&ScoredEntry>> = HashMap::new();
        for s in &rest {
            if s.entry.files.is_empty() {
                by_file.entry("general".to_string()).or_default().push(s);
            } else {
                for f in &s.entry.files {
                    by_file.entry(f.clone()).or_default().push(s);
                }
            }
        }
        let mut files: Vec<&String> = by_file.keys().collect();
        files.sort();
        out.push_str(&format!("## {heading}\n"));
        for file in files {
            out.push_str(&format!("### {file}\n"));
            for s in &by_file[file] {
                out.push_str(&format!("- {}: {}\n", s.entry.title, s.entry.description));
            }
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graph_build_increments_both_directions_per_turn() {
        let dir = tempfile::tempdir().unwrap();
        paths::ensure_tree(dir.path()).unwrap();
        let session = "---\nid: x\n---\n\
- Modified: a.rs\n- Modified: b.rs\n\n---\n_turn completed: x_\n";
        std::fs::write(paths::completed_dir(dir.path()).join("s1.md"), session).unwrap();

        let graph = build(dir.path());
        assert_eq!(graph.neighbours_of("a.rs"), &[("b.rs".to_string(), 1)]);
        assert_eq!(graph.neighbours_of("b.rs"), &[("a.rs".to_string(), 1)]);
    }

    #[test]
    fn neighbours_query_excludes_input_set_and_ranks_by_count() {
        let mut graph = ComodGraph::default();
        graph.graph.insert("a.rs".to_string(), vec![("b.rs".to_string(), 3), ("c.rs".to_string(), 1)]);
        graph.graph.insert("d.rs".to_string(), vec![("c.rs".to_string(), 2)]);

        let result = neighbours(&graph, &["a.rs".to_string(), "d.rs".to_string()], 5);
        assert_eq!(result, vec!["c.rs".to_string(), "b.rs".to_string()]);
    }

    #[test]
    fn detects_correction_when_same_path_touched_in_adjacent_turns() {
        let body = "---\nid: x\n---\n- Modified: a.rs\n\n---\n_t_\n- Modified: a.rs\n\n---\n_t_\n- Modified: a.rs\n";
        let corrections = detect_corrections(body);
        assert_eq!(corrections, vec!["a.rs".to_string()]);
    }

    #[test]
    fn no_correction_when_path_touched_once() {
        let body = "---\nid: x\n---\n- Modified: a.rs\n\n---\n_t_\n- Modified: b.rs\n";
        assert!(detect_corrections(body).is_empty());
    }

    #[test]
    fn score_rewards_file_match_and_rule_bonus() {
        let weights = ScoreWeights::default();
        let entry = KnowledgeEntry {
            title: "t".to_string(),
            files: vec!["a.rs".to_string()],
            area: "general".to_string(),
            date: "1970-01-01".to_string(),
            rule: Some("always check x".to_string()),
            ..Default::default()
        };
        let score = score_entry(&entry, &["a.rs".to_string()], &[], &weights);
        assert_eq!(score, 10.0 + 20.0);
    }

    #[test]
    fn legacy_entry_gets_baseline_score() {
        let weights = ScoreWeights::default();
        let entry = KnowledgeEntry::legacy("just a title");
        let score = score_entry(&entry, &["a.rs".to_string()], &[], &weights);
        assert_eq!(score, weights.legacy_baseline as f64);
    }

    #[test]
    fn format_context_puts_ruled_entries_first_under_their_own_heading() {
        let ruled = ScoredEntry {
            entry: KnowledgeEntry {
                title: "Always validate input".to_string(),
                files: vec!["src/api.rs".to_string()],
                rule: Some("never trust the request body".to_string()),
                ..Default::default()
            },
            score: 30.0,
        };
        let plain = ScoredEntry {
            entry: KnowledgeEntry {
                title: "Cache warm-up".to_string(),
                description: "warm the cache on startup".to_string(),
                files: vec!["src/cache.rs".to_string()],
                ..Default::default()
            },
            score: 10.0,
        };

        let out = format_context("Relevant mistakes", &[ruled, plain]);

        let rules_pos = out.find("## Relevant mistakes: rules").unwrap();
        let rest_pos = out.find("## Relevant mistakes\n").unwrap();
        assert!(rules_pos < rest_pos, "rules heading must precede the grouped-by-file section");
        assert!(out.contains("never trust the request body"));
        assert!(out.contains("### src/cache.rs"));
    }

    #[test]
    fn format_context_is_empty_for_no_entries() {
        assert_eq!(format_context("Relevant mistakes", &[]), "");
    }
}

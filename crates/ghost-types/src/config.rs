use serde::{Deserialize, Serialize};

/// Score weights, retention windows, and latency budgets as one explicit
/// record threaded through every call site that needs them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GhostConfig {
    pub score: ScoreWeights,
    pub retention: RetentionConfig,
    pub latency: LatencyConfig,
    /// Path to an external secrets-detection binary/library shim, if any.
    pub secrets_detector_path: Option<String>,
    /// Path to the external semantic-search executable.
    pub search_engine_path: Option<String>,
    /// Path to the summarization executable.
    pub summarizer_path: Option<String>,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            score: ScoreWeights::default(),
            retention: RetentionConfig::default(),
            latency: LatencyConfig::default(),
            secrets_detector_path: None,
            search_engine_path: None,
            summarizer_path: None,
        }
    }
}

/// Weights for the knowledge-entry relevance-scoring formula.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub file_match: i32,
    pub neighbour_match: i32,
    pub area_match: i32,
    pub recency_max: i32,
    pub recency_window_days: i64,
    pub rule_bonus: i32,
    pub legacy_baseline: i32,
    pub staleness_penalty: i32,
    pub staleness_commit_threshold: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            file_match: 10,
            neighbour_match: 5,
            area_match: 5,
            recency_max: 3,
            recency_window_days: 30,
            rule_bonus: 20,
            legacy_baseline: 1,
            staleness_penalty: 5,
            staleness_commit_threshold: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    /// Background log rotation threshold.
    pub background_log_max_bytes: u64,
    pub background_log_keep_lines: usize,
    /// Minimum interval between remote `pull` fetches.
    pub sync_pull_interval_minutes: i64,
    /// "within 24 hours" window for SessionStart continuity.
    pub continuity_window_hours: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            background_log_max_bytes: 50_000,
            background_log_keep_lines: 200,
            sync_pull_interval_minutes: 5,
            continuity_window_hours: 24,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatencyConfig {
    pub hook_budget_ms: u64,
    pub scm_subprocess_timeout_secs: u64,
    pub search_subprocess_timeout_secs: u64,
}

impl Default for LatencyConfig {
    fn default() -> Self {
        Self {
            hook_budget_ms: 100,
            scm_subprocess_timeout_secs: 3,
            search_subprocess_timeout_secs: 30,
        }
    }
}

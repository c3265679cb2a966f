use serde::{Deserialize, Serialize};

/// A decision or mistake mined from a session summary. The same shape backs both `decisions.md` and `mistakes.md`;
/// `tried` is only ever populated for mistakes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit_sha: Option<String>,
    #[serde(default)]
    pub files: Vec<String>,
    pub area: String,
    pub date: String,
    #[serde(default)]
    pub tried: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule: Option<String>,
}

impl KnowledgeEntry {
    /// Identity used for cross-side deduplication during sync.
    pub fn dedup_key(&self) -> (String, String) {
        (self.title.to_lowercase(), self.description.to_lowercase())
    }

    /// A legacy plain-string entry: title only, everything else defaulted.
    pub fn legacy(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            area: "general".to_string(),
            ..Default::default()
        }
    }

    pub fn is_legacy(&self) -> bool {
        self.description.is_empty()
            && self.session_id.is_none()
            && self.commit_sha.is_none()
            && self.files.is_empty()
    }
}

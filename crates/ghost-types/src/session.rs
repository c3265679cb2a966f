use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `YYYY-MM-DD-{8 lowercase hex}`. See `ghost_core::paths::new_session_id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The UTC date embedded in the id, used as the fallback `date` for
    /// knowledge entries that don't carry their own.
    pub fn date(&self) -> Option<&str> {
        self.0.get(0..10)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// YAML frontmatter carried at the top of every session transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFrontmatter {
    pub id: String,
    pub branch: String,
    pub base_commit: String,
    pub started: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_knowledge: Option<bool>,
}

impl SessionFrontmatter {
    pub fn new(id: SessionId, branch: String, base_commit: String, started: DateTime<Utc>) -> Self {
        Self {
            id: id.0,
            branch,
            base_commit,
            started,
            ended: None,
            tags: Vec::new(),
            skip_knowledge: None,
        }
    }
}

/// A fully parsed (or parsed-with-defaults) session transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub frontmatter: SessionFrontmatter,
    pub body: String,
}

/// One `## Prompt N` block.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptBlock {
    pub n: u32,
    pub hash: String,
    pub text: String,
}

/// A single completed turn: the files modified and task notes recorded
/// between two `---` delimiters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Turn {
    pub modified: Vec<String>,
    pub tasks: Vec<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// External agent session id -> internal `SessionId`. Keys unique; an
/// entry is removed when the session finalizes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionMap(pub std::collections::HashMap<String, String>);

impl SessionMap {
    pub fn get(&self, agent_session_id: &str) -> Option<SessionId> {
        self.0.get(agent_session_id).cloned().map(SessionId)
    }

    pub fn insert(&mut self, agent_session_id: String, internal_id: SessionId) {
        self.0.insert(agent_session_id, internal_id.0);
    }

    pub fn remove(&mut self, agent_session_id: &str) {
        self.0.remove(agent_session_id);
    }
}

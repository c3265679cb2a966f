pub mod config;
pub mod error;
pub mod graph;
pub mod hook_envelope;
pub mod knowledge;
pub mod session;
pub mod tag_index;

pub use config::{GhostConfig, LatencyConfig, RetentionConfig, ScoreWeights};
pub use error::{Error, Result};
pub use graph::ComodGraph;
pub use hook_envelope::{HookEvent, RawEnvelope, ToolInput};
pub use knowledge::KnowledgeEntry;
pub use session::{PromptBlock, Session, SessionFrontmatter, SessionId, SessionMap, Turn};
pub use tag_index::TagIndex;

use serde::Deserialize;

/// Raw JSON shape delivered by the hosting agent on a hook's standard
/// input. All fields are optional at this layer: unknown or missing fields
/// are discarded during parsing, never rejected.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEnvelope {
    pub session_id: Option<String>,
    pub cwd: Option<String>,
    pub prompt: Option<String>,
    pub tool_name: Option<String>,
    pub tool_input: Option<ToolInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolInput {
    pub file_path: Option<String>,
    pub description: Option<String>,
}

/// The per-event view the Hook Dispatcher actually routes on; each
/// variant carries only the fields that hook consumes.
#[derive(Debug, Clone)]
pub enum HookEvent {
    SessionStart { session_id: Option<String>, cwd: Option<String> },
    SessionEnd { session_id: Option<String>, cwd: Option<String> },
    Prompt { session_id: Option<String>, cwd: Option<String>, prompt: String },
    Stop { session_id: Option<String>, cwd: Option<String> },
    PostWrite { session_id: Option<String>, cwd: Option<String>, file_path: Option<String> },
    PostTask { session_id: Option<String>, cwd: Option<String>, description: Option<String> },
    Checkpoint { cwd: Option<String> },
}

impl HookEvent {
    /// `command` is the dispatcher's first CLI token
    /// (`{session-start, session-end, prompt, stop, post-write, post-task, checkpoint}`).
    pub fn from_command(command: &str, raw: RawEnvelope) -> Option<Self> {
        let event = match command {
            "session-start" => HookEvent::SessionStart { session_id: raw.session_id, cwd: raw.cwd },
            "session-end" => HookEvent::SessionEnd { session_id: raw.session_id, cwd: raw.cwd },
            "prompt" => HookEvent::Prompt {
                session_id: raw.session_id,
                cwd: raw.cwd,
                prompt: raw.prompt.unwrap_or_default(),
            },
            "stop" => HookEvent::Stop { session_id: raw.session_id, cwd: raw.cwd },
            "post-write" => {
                let file_path = raw.tool_input.as_ref().and_then(|t| t.file_path.clone());
                HookEvent::PostWrite { session_id: raw.session_id, cwd: raw.cwd, file_path }
            }
            "post-task" => {
                let description = raw.tool_input.as_ref().and_then(|t| t.description.clone());
                HookEvent::PostTask { session_id: raw.session_id, cwd: raw.cwd, description }
            }
            "checkpoint" => HookEvent::Checkpoint { cwd: raw.cwd },
            _ => return None,
        };
        Some(event)
    }

    pub fn session_id(&self) -> Option<&str> {
        match self {
            HookEvent::SessionStart { session_id, .. }
            | HookEvent::SessionEnd { session_id, .. }
            | HookEvent::Prompt { session_id, .. }
            | HookEvent::Stop { session_id, .. }
            | HookEvent::PostWrite { session_id, .. }
            | HookEvent::PostTask { session_id, .. } => session_id.as_deref(),
            HookEvent::Checkpoint { .. } => None,
        }
    }

    pub fn cwd(&self) -> Option<&str> {
        match self {
            HookEvent::SessionStart { cwd, .. }
            | HookEvent::SessionEnd { cwd, .. }
            | HookEvent::Prompt { cwd, .. }
            | HookEvent::Stop { cwd, .. }
            | HookEvent::PostWrite { cwd, .. }
            | HookEvent::PostTask { cwd, .. }
            | HookEvent::Checkpoint { cwd } => cwd.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_top_level_fields_are_discarded() {
        let raw: RawEnvelope = serde_json::from_str(
            r#"{"session_id":"abc","cwd":"/repo","unknown_field":{"nested":true}}"#,
        )
        .unwrap();
        assert_eq!(raw.session_id.as_deref(), Some("abc"));
    }

    #[test]
    fn unrecognized_command_yields_none() {
        let raw = RawEnvelope::default();
        assert!(HookEvent::from_command("not-a-hook", raw).is_none());
    }

    #[test]
    fn post_write_pulls_file_path_from_tool_input() {
        let raw: RawEnvelope = serde_json::from_str(
            r#"{"tool_name":"Write","tool_input":{"file_path":"src/x.rs"}}"#,
        )
        .unwrap();
        match HookEvent::from_command("post-write", raw).unwrap() {
            HookEvent::PostWrite { file_path, .. } => {
                assert_eq!(file_path.as_deref(), Some("src/x.rs"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}

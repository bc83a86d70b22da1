//! Agent invocation contract types (spec.md §4.5, §6).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which persona an agent invocation plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Persona {
    Manager,
    Qa,
    Worker,
}

impl Persona {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Qa => "qa",
            Self::Worker => "worker",
        }
    }
}

/// The single JSON object written to the agent child's stdin (spec.md §6).
#[derive(Debug, Clone, Serialize)]
pub struct AgentRequest {
    pub prompt: String,
    #[serde(rename = "systemPrompt")]
    pub system_prompt: String,
    pub model: String,
    #[serde(rename = "allowedTools")]
    pub allowed_tools: Vec<String>,
    pub workdir: PathBuf,
    #[serde(rename = "resumeSessionId", skip_serializing_if = "Option::is_none")]
    pub resume_session_id: Option<String>,
}

/// One parsed NDJSON line from the agent child's stdout.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum AgentMessage {
    #[serde(rename = "system")]
    System {
        subtype: Option<String>,
        session_id: Option<String>,
    },
    #[serde(rename = "result")]
    Result {
        subtype: Option<String>,
        result: Option<String>,
        session_id: Option<String>,
    },
    /// Tool-use/tool-result/assistant-text/etc: present in the stream but
    /// not of interest to the core beyond accumulating into `raw_stream`.
    #[serde(other)]
    Other,
}

/// Owned result of consuming an agent's NDJSON stream end to end.
#[derive(Debug, Clone, Default)]
pub struct AgentOutcome {
    pub output: String,
    pub raw_stream: String,
    pub session_id: Option<String>,
    pub exit_code: i32,
}

/// Folds an NDJSON stream into `AgentOutcome`, applying the session-id
/// precedence rule from spec.md §4.3: the last `result` message's
/// `session_id` wins over any `system` message's, falling back to the
/// system-message value when no result ever carries one.
#[derive(Debug, Default)]
pub struct AgentStreamFold {
    output: String,
    raw_stream: String,
    system_session_id: Option<String>,
    result_session_id: Option<String>,
}

impl AgentStreamFold {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one raw NDJSON line. Unparseable lines are still appended to
    /// `raw_stream` (the agent transport is best-effort, not strict JSON).
    pub fn feed_line(&mut self, line: &str) {
        self.raw_stream.push_str(line);
        self.raw_stream.push('\n');

        let Ok(msg) = serde_json::from_str::<AgentMessage>(line) else {
            return;
        };

        match msg {
            AgentMessage::System { session_id: Some(id), .. } if !id.is_empty() => {
                self.system_session_id = Some(id);
            }
            AgentMessage::Result { result, session_id, .. } => {
                if let Some(text) = result {
                    self.output.push_str(&text);
                }
                if let Some(id) = session_id {
                    if !id.is_empty() {
                        self.result_session_id = Some(id);
                    }
                }
            }
            _ => {}
        }
    }

    pub fn finish(self, exit_code: i32) -> AgentOutcome {
        let session_id = self.result_session_id.or(self.system_session_id);
        AgentOutcome {
            output: self.output,
            raw_stream: self.raw_stream,
            session_id,
            exit_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_only_session_id_wins() {
        let mut fold = AgentStreamFold::new();
        fold.feed_line(r#"{"type":"system","subtype":"init","session_id":"A"}"#);
        let outcome = fold.finish(0);
        assert_eq!(outcome.session_id.as_deref(), Some("A"));
    }

    #[test]
    fn result_only_session_id_wins() {
        let mut fold = AgentStreamFold::new();
        fold.feed_line(r#"{"type":"result","subtype":"success","result":"done","session_id":"B"}"#);
        let outcome = fold.finish(0);
        assert_eq!(outcome.session_id.as_deref(), Some("B"));
        assert_eq!(outcome.output, "done");
    }

    #[test]
    fn result_session_id_beats_system_when_both_present_and_differ() {
        let mut fold = AgentStreamFold::new();
        fold.feed_line(r#"{"type":"system","subtype":"init","session_id":"A"}"#);
        fold.feed_line(r#"{"type":"result","subtype":"success","result":"done","session_id":"B"}"#);
        let outcome = fold.finish(0);
        assert_eq!(outcome.session_id.as_deref(), Some("B"));
    }

    #[test]
    fn empty_result_session_id_falls_back_to_system() {
        let mut fold = AgentStreamFold::new();
        fold.feed_line(r#"{"type":"system","subtype":"init","session_id":"A"}"#);
        fold.feed_line(r#"{"type":"result","subtype":"success","result":"done","session_id":""}"#);
        let outcome = fold.finish(0);
        assert_eq!(outcome.session_id.as_deref(), Some("A"));
    }

    #[test]
    fn unparseable_lines_still_accumulate_into_raw_stream() {
        let mut fold = AgentStreamFold::new();
        fold.feed_line("not json");
        fold.feed_line(r#"{"type":"result","result":"x","session_id":"C"}"#);
        let outcome = fold.finish(0);
        assert!(outcome.raw_stream.contains("not json"));
        assert_eq!(outcome.session_id.as_deref(), Some("C"));
    }
}

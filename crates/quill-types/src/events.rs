use serde::Serialize;
use serde_json::Value;

/// A decoded frame from the agent stream.
///
/// The first five variants mirror the wire shapes emitted by the generation
/// backend. `Unknown` and `Malformed` carry payloads the decoder could not map
/// onto a known shape so callers can log them; reducers never change state for
/// them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// An agent began running
    AgentStart {
        agent: String,
    },

    /// An agent finished, optionally with its structured result
    AgentEnd {
        agent: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
    },

    /// Token streamed by the model (`"type": "stream"` on the wire)
    #[serde(rename = "stream")]
    StreamToken {
        #[serde(skip_serializing_if = "Option::is_none")]
        agent: Option<String>,
        content: String,
    },

    /// A tool invocation began
    ToolStart {
        tool: String,
    },

    /// A tool invocation finished
    ToolEnd {
        tool: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        output: Option<Value>,
    },

    /// Valid JSON with an unrecognized `type` discriminator
    Unknown {
        raw: Value,
    },

    /// Payload that failed to decode
    Malformed {
        raw: String,
    },
}

impl Event {
    /// Short name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AgentStart { .. } => "agent_start",
            Self::AgentEnd { .. } => "agent_end",
            Self::StreamToken { .. } => "stream",
            Self::ToolStart { .. } => "tool_start",
            Self::ToolEnd { .. } => "tool_end",
            Self::Unknown { .. } => "unknown",
            Self::Malformed { .. } => "malformed",
        }
    }

    pub fn agent_start(agent: impl Into<String>) -> Self {
        Self::AgentStart { agent: agent.into() }
    }

    pub fn token(agent: Option<&str>, content: impl Into<String>) -> Self {
        Self::StreamToken {
            agent: agent.map(str::to_string),
            content: content.into(),
        }
    }
}

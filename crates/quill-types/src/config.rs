use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How events are folded into per-key buffers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Append streamed tokens; lifecycle ends carry no text
    #[default]
    LiveStream,
    /// A finished agent's output replaces its buffer
    Snapshot,
    /// Append tokens, agent results and tool outputs as a running log
    ToolLog,
}

impl std::str::FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.replace('-', "_").as_str() {
            "live_stream" | "live" => Ok(Self::LiveStream),
            "snapshot" => Ok(Self::Snapshot),
            "tool_log" => Ok(Self::ToolLog),
            other => Err(format!("unknown policy: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub policy: Policy,
    /// Keys registered with empty buffers at every reset, in display order
    pub agents: Vec<String>,
    /// Drop buffer writes for keys missing from `agents`
    pub strict_agents: bool,
    /// Snapshot policy only: append stream tokens to the active buffer
    pub snapshot_tokens: bool,
    /// Snapshot policy only: agent -> field of `output` holding its text
    pub snapshot_fields: BTreeMap<String, String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        let snapshot_fields = [
            ("writer", "draft"),
            ("editor", "edited_draft"),
            ("translator", "vietnamese_translation"),
        ]
        .into_iter()
        .map(|(agent, field)| (agent.to_string(), field.to_string()))
        .collect();

        Self {
            policy: Policy::default(),
            agents: Vec::new(),
            strict_agents: false,
            snapshot_tokens: true,
            snapshot_fields,
        }
    }
}

impl SessionConfig {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn with_agents<I, S>(mut self, agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.agents = agents.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_strict_agents(mut self, strict: bool) -> Self {
        self.strict_agents = strict;
        self
    }

    pub fn with_snapshot_tokens(mut self, enabled: bool) -> Self {
        self.snapshot_tokens = enabled;
        self
    }

    pub fn with_snapshot_field(mut self, agent: impl Into<String>, field: impl Into<String>) -> Self {
        self.snapshot_fields.insert(agent.into(), field.into());
        self
    }

    /// Output field holding `agent`'s text in snapshot policy
    pub fn snapshot_field(&self, agent: &str) -> Option<&str> {
        self.snapshot_fields.get(agent).map(String::as_str)
    }

    pub fn is_registered(&self, key: &str) -> bool {
        self.agents.iter().any(|agent| agent == key)
    }
}

use quill_types::TransportError;
use serde::Serialize;
use serde_json::Value;

/// Accumulated text and last structured output of one agent or tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgentState {
    pub key: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
}

impl AgentState {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: String::new(),
            output: None,
        }
    }
}

/// Display state of one submission.
///
/// Read-only outside this crate: every change goes through
/// [`SessionReducer`](crate::SessionReducer).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionState {
    session_id: String,
    agents: Vec<AgentState>,
    active_key: Option<String>,
    terminated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<TransportError>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            agents: Vec::new(),
            active_key: None,
            terminated: false,
            error: None,
        }
    }

    /// Fresh state with empty buffers for `keys`, in that order
    pub fn with_agents<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut state = Self::new();
        for key in keys {
            state.agent_mut(&key.into());
        }
        state
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Buffers in first-seen order
    pub fn agents(&self) -> &[AgentState] {
        &self.agents
    }

    pub fn agent(&self, key: &str) -> Option<&AgentState> {
        self.agents.iter().find(|agent| agent.key == key)
    }

    pub fn buffer(&self, key: &str) -> Option<&str> {
        self.agent(key).map(|agent| agent.text.as_str())
    }

    pub fn active_key(&self) -> Option<&str> {
        self.active_key.as_deref()
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    pub(crate) fn agent_mut(&mut self, key: &str) -> &mut AgentState {
        let index = match self.agents.iter().position(|agent| agent.key == key) {
            Some(index) => index,
            None => {
                self.agents.push(AgentState::new(key));
                self.agents.len() - 1
            }
        };
        &mut self.agents[index]
    }

    pub(crate) fn set_active(&mut self, key: Option<String>) {
        self.active_key = key;
    }

    pub(crate) fn mark_terminated(&mut self, error: Option<TransportError>) {
        self.terminated = true;
        self.active_key = None;
        self.error = error;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_empty() {
        let state = SessionState::new();

        assert!(state.agents().is_empty());
        assert_eq!(state.active_key(), None);
        assert!(!state.is_terminated());
        assert!(state.error().is_none());
    }

    #[test]
    fn test_registered_agents_keep_order() {
        let state = SessionState::with_agents(["writer", "editor", "translator"]);

        let keys: Vec<&str> = state.agents().iter().map(|a| a.key.as_str()).collect();
        assert_eq!(keys, vec!["writer", "editor", "translator"]);
        assert_eq!(state.buffer("editor"), Some(""));
        assert_eq!(state.buffer("critic"), None);
    }

    #[test]
    fn test_agent_mut_inserts_once() {
        let mut state = SessionState::new();
        state.agent_mut("writer").text.push_str("a");
        state.agent_mut("writer").text.push_str("b");

        assert_eq!(state.agents().len(), 1);
        assert_eq!(state.buffer("writer"), Some("ab"));
    }

    #[test]
    fn test_sessions_get_distinct_ids() {
        assert_ne!(SessionState::new().session_id(), SessionState::new().session_id());
    }

    #[test]
    fn test_serialization() {
        let mut state = SessionState::with_agents(["writer"]);
        state.set_active(Some("writer".to_string()));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["active_key"], "writer");
        assert_eq!(json["agents"][0]["key"], "writer");
        assert_eq!(json["terminated"], false);
        assert!(json.get("error").is_none());
    }
}

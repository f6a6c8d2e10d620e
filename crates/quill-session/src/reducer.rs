use quill_types::{Event, Policy, SessionConfig, TransportError};
use serde_json::Value;

use crate::render::{render_output, render_snapshot};
use crate::state::{AgentState, SessionState};

/// Folds events into [`SessionState`] under the configured [`Policy`].
///
/// Every transition takes the previous state by value and returns the next
/// one. Once a state is terminated it is returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct SessionReducer {
    config: SessionConfig,
}

impl SessionReducer {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    /// State for a new submission
    pub fn reset(&self) -> SessionState {
        SessionState::with_agents(self.config.agents.iter().cloned())
    }

    pub fn apply(&self, mut state: SessionState, event: &Event) -> SessionState {
        if state.is_terminated() {
            tracing::debug!(event = event.kind(), "Ignoring event after termination");
            return state;
        }

        match event {
            Event::AgentStart { agent } => self.start(&mut state, agent),
            Event::AgentEnd { agent, output } => self.agent_end(&mut state, agent, output.as_ref()),
            Event::StreamToken { agent, content } => {
                self.token(&mut state, agent.as_deref(), content)
            }
            Event::ToolStart { tool } => match self.config.policy {
                Policy::ToolLog => self.start(&mut state, tool),
                _ => tracing::debug!(tool = %tool, "Ignoring tool_start outside tool-log policy"),
            },
            Event::ToolEnd { tool, output } => match self.config.policy {
                Policy::ToolLog => self.tool_end(&mut state, tool, output.as_ref()),
                _ => tracing::debug!(tool = %tool, "Ignoring tool_end outside tool-log policy"),
            },
            // Logged where they were decoded
            Event::Unknown { .. } | Event::Malformed { .. } => {}
        }

        state
    }

    /// Termination sentinel or end of input
    pub fn terminate(&self, mut state: SessionState) -> SessionState {
        if !state.is_terminated() {
            state.mark_terminated(None);
        }
        state
    }

    /// Transport failure. Buffers collected so far are kept.
    pub fn fail(&self, mut state: SessionState, error: TransportError) -> SessionState {
        if !state.is_terminated() {
            state.mark_terminated(Some(error));
        }
        state
    }

    fn start(&self, state: &mut SessionState, key: &str) {
        state.set_active(Some(key.to_string()));
        // Registers the key so it is displayed from the moment it starts
        self.writable(state, key);
    }

    fn agent_end(&self, state: &mut SessionState, agent: &str, output: Option<&Value>) {
        let Some(output) = output else {
            return;
        };

        match self.config.policy {
            Policy::LiveStream => {}
            Policy::Snapshot => {
                let text = render_snapshot(output, self.config.snapshot_field(agent));
                if let Some(entry) = self.writable(state, agent) {
                    entry.text = text;
                    entry.output = Some(output.clone());
                }
            }
            Policy::ToolLog => {
                if let Some(entry) = self.writable(state, agent) {
                    entry.text.push_str("\n\n");
                    entry.text.push_str(&render_output(output));
                    entry.output = Some(output.clone());
                }
            }
        }
    }

    fn token(&self, state: &mut SessionState, agent: Option<&str>, content: &str) {
        let active = state.active_key().map(str::to_string);

        let key = match self.config.policy {
            Policy::LiveStream => agent.map(str::to_string).or(active),
            Policy::Snapshot if !self.config.snapshot_tokens => return,
            Policy::Snapshot | Policy::ToolLog => active.or_else(|| agent.map(str::to_string)),
        };

        let Some(key) = key else {
            tracing::debug!("Dropping token with no agent to attribute it to");
            return;
        };

        if let Some(entry) = self.writable(state, &key) {
            entry.text.push_str(content);
        }
    }

    fn tool_end(&self, state: &mut SessionState, tool: &str, output: Option<&Value>) {
        let Some(output) = output else {
            return;
        };

        if let Some(entry) = self.writable(state, tool) {
            entry.text.push_str("Tool output: ");
            entry.text.push_str(&render_output(output));
            entry.output = Some(output.clone());
        }
    }

    /// Buffer for `key`, unless strict mode rejects unregistered keys
    fn writable<'a>(&self, state: &'a mut SessionState, key: &str) -> Option<&'a mut AgentState> {
        if self.config.strict_agents && !self.config.is_registered(key) {
            tracing::debug!(key = %key, "Unknown agent");
            return None;
        }
        Some(state.agent_mut(key))
    }
}

use quill_session::SessionState;
use std::collections::HashMap;

/// One piece of terminal output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    /// Progress line for stderr
    Status(String),
    /// Rendered buffer text for stdout
    Content(String),
}

/// Turns successive snapshots into incremental terminal output.
///
/// Remembers what was already printed per key: appended text is streamed as
/// a delta, replaced text is reprinted in full under a fresh header.
#[derive(Debug, Default)]
pub struct TerminalView {
    session_id: Option<String>,
    printed: HashMap<String, String>,
    active: Option<String>,
    section: Option<String>,
    finished: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, state: &SessionState) -> Vec<Update> {
        if self.session_id.as_deref() != Some(state.session_id()) {
            *self = Self {
                session_id: Some(state.session_id().to_string()),
                ..Self::default()
            };
        }

        let mut updates = Vec::new();
        if self.finished {
            return updates;
        }

        if let Some(active) = state.active_key() {
            if self.active.as_deref() != Some(active) {
                updates.push(Update::Status(format!("{} is running...", display_name(active))));
                self.active = Some(active.to_string());
            }
        }

        for agent in state.agents() {
            let shown = self.printed.get(&agent.key).map(String::as_str).unwrap_or("");
            if agent.text == shown {
                continue;
            }

            if let Some(delta) = agent.text.strip_prefix(shown) {
                if self.section.as_deref() != Some(agent.key.as_str()) {
                    updates.push(self.header(&agent.key));
                }
                updates.push(Update::Content(delta.to_string()));
            } else {
                // Replaced, not extended
                updates.push(self.header(&agent.key));
                updates.push(Update::Content(agent.text.clone()));
            }

            self.printed.insert(agent.key.clone(), agent.text.clone());
        }

        if state.is_terminated() {
            self.finished = true;
            if self.section.is_some() {
                updates.push(Update::Content("\n".to_string()));
            }
            if let Some(error) = state.error() {
                updates.push(Update::Status(format!("Error: {}", error)));
            }
        }

        updates
    }

    fn header(&mut self, key: &str) -> Update {
        let separator = if self.section.is_some() { "\n\n" } else { "" };
        self.section = Some(key.to_string());
        Update::Content(format!("{}== {} ==\n", separator, display_name(key)))
    }
}

/// Key with its first letter capitalised, e.g. "writer" -> "Writer"
pub fn display_name(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

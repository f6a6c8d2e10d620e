use quill_types::{DecodeError, Event};
use serde::Deserialize;
use serde_json::Value;

/// Strategy for turning frame payloads into events.
///
/// The termination sentinel never reaches the decoder; see `Frame::is_done`.
pub trait PayloadDecoder: Send {
    /// Decode a payload. Failures are reported as `Event::Malformed`.
    fn decode(&self, payload: &str) -> Event;
}

/// Typed wire shapes, including the short lifecycle aliases some producers
/// emit. Any other discriminator lands in `Other`.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    #[serde(alias = "start")]
    AgentStart { agent: String },

    #[serde(alias = "end")]
    AgentEnd {
        agent: String,
        #[serde(default)]
        output: Option<Value>,
    },

    Stream {
        #[serde(default)]
        agent: Option<String>,
        content: String,
    },

    ToolStart { tool: String },

    ToolEnd {
        tool: String,
        #[serde(default)]
        output: Option<Value>,
    },

    #[serde(other)]
    Other,
}

impl WireEvent {
    /// `None` for discriminators without a typed shape
    fn into_event(self) -> Option<Event> {
        let event = match self {
            WireEvent::AgentStart { agent } => Event::AgentStart { agent },
            WireEvent::AgentEnd { agent, output } => Event::AgentEnd { agent, output },
            // An empty agent name means "whoever is active"
            WireEvent::Stream { agent, content } => Event::StreamToken {
                agent: agent.filter(|name| !name.is_empty()),
                content,
            },
            WireEvent::ToolStart { tool } => Event::ToolStart { tool },
            WireEvent::ToolEnd { tool, output } => Event::ToolEnd { tool, output },
            WireEvent::Other => return None,
        };
        Some(event)
    }
}

/// JSON event decoder for the agent stream wire format
#[derive(Debug, Clone, Copy, Default)]
pub struct EventDecoder;

impl EventDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a payload, surfacing the reason a payload was rejected.
    ///
    /// Valid JSON whose `type` is missing or unrecognized is not an error: it
    /// becomes `Event::Unknown`.
    pub fn try_decode(&self, payload: &str) -> Result<Event, DecodeError> {
        let value: Value =
            serde_json::from_str(payload).map_err(|e| DecodeError::Json(e.to_string()))?;

        let Some(kind) = value.get("type").and_then(Value::as_str) else {
            return Ok(Event::Unknown { raw: value });
        };

        let wire = WireEvent::deserialize(&value).map_err(|e| DecodeError::Shape {
            kind: kind.to_string(),
            message: e.to_string(),
        })?;

        Ok(wire.into_event().unwrap_or(Event::Unknown { raw: value }))
    }
}

impl PayloadDecoder for EventDecoder {
    fn decode(&self, payload: &str) -> Event {
        match self.try_decode(payload) {
            Ok(event) => {
                if let Event::Unknown { raw } = &event {
                    tracing::debug!(
                        event_type = ?raw.get("type"),
                        "Unknown event type"
                    );
                }
                event
            }
            Err(e) => {
                tracing::warn!(payload, error = %e, "Error parsing event data");
                Event::Malformed {
                    raw: payload.to_string(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn decode(payload: &str) -> Event {
        EventDecoder::new().decode(payload)
    }

    #[test]
    fn test_agent_start() {
        assert_eq!(
            decode(r#"{"type":"agent_start","agent":"writer"}"#),
            Event::AgentStart {
                agent: "writer".to_string()
            }
        );
    }

    #[test]
    fn test_agent_end_with_output() {
        let event = decode(r#"{"type":"agent_end","agent":"writer","output":{"draft":"Hi"}}"#);

        assert_eq!(
            event,
            Event::AgentEnd {
                agent: "writer".to_string(),
                output: Some(json!({"draft": "Hi"})),
            }
        );
    }

    #[test]
    fn test_agent_end_null_output() {
        let event = decode(r#"{"type":"agent_end","agent":"writer","output":null}"#);
        assert_eq!(
            event,
            Event::AgentEnd {
                agent: "writer".to_string(),
                output: None,
            }
        );
    }

    #[test]
    fn test_stream_without_agent() {
        assert_eq!(
            decode(r#"{"type":"stream","content":"Hel"}"#),
            Event::token(None, "Hel")
        );
        assert_eq!(
            decode(r#"{"type":"stream","agent":"","content":"lo"}"#),
            Event::token(None, "lo")
        );
    }

    #[test]
    fn test_tool_events() {
        assert_eq!(
            decode(r#"{"type":"tool_start","tool":"search"}"#),
            Event::ToolStart {
                tool: "search".to_string()
            }
        );
        assert_eq!(
            decode(r#"{"type":"tool_end","tool":"search","output":{"hits":2}}"#),
            Event::ToolEnd {
                tool: "search".to_string(),
                output: Some(json!({"hits": 2})),
            }
        );
    }

    #[test]
    fn test_lifecycle_aliases() {
        assert_eq!(
            decode(r#"{"type":"start","agent":"editor"}"#),
            Event::agent_start("editor")
        );
        assert!(matches!(
            decode(r#"{"type":"end","agent":"editor"}"#),
            Event::AgentEnd { ref agent, output: None } if agent == "editor"
        ));
    }

    #[test]
    fn test_unknown_type() {
        let event = decode(r#"{"type":"heartbeat","seq":3}"#);
        assert_eq!(
            event,
            Event::Unknown {
                raw: json!({"type": "heartbeat", "seq": 3})
            }
        );
    }

    #[test]
    fn test_missing_type_is_unknown() {
        assert!(matches!(decode(r#"{"agent":"writer"}"#), Event::Unknown { .. }));
        assert!(matches!(decode("42"), Event::Unknown { .. }));
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        assert_eq!(
            decode("{bad json"),
            Event::Malformed {
                raw: "{bad json".to_string()
            }
        );
    }

    #[test]
    fn test_missing_required_field_is_malformed() {
        let decoder = EventDecoder::new();
        let payload = r#"{"type":"stream","agent":"writer"}"#;

        match decoder.try_decode(payload) {
            Err(DecodeError::Shape { kind, .. }) => assert_eq!(kind, "stream"),
            other => panic!("Expected shape error, got {:?}", other),
        }
        assert!(matches!(decoder.decode(payload), Event::Malformed { .. }));
    }

    #[test]
    fn test_unknown_type_with_typed_fields_is_unknown() {
        // Fields of a known shape do not make an unknown discriminator valid
        let event = decode(r#"{"type":"agent_pause","agent":"writer","content":"x"}"#);
        assert!(matches!(event, Event::Unknown { .. }));
    }

    #[test]
    fn test_non_string_type_is_unknown() {
        assert!(matches!(decode(r#"{"type":7}"#), Event::Unknown { .. }));
    }

    #[test]
    fn test_quoted_sentinel_is_not_an_event() {
        assert!(matches!(decode(r#""[DONE]""#), Event::Unknown { .. }));
    }
}

use quill_cli::config::Config;
use quill_types::Policy;

// Environment variables are process-wide; this file holds the only test
// that sets them.
#[test]
fn test_load_applies_environment_layer() {
    std::env::set_var("ENV", "quill-config-test");
    std::env::set_var("QUILL_SERVER__ENDPOINT", "http://127.0.0.1:1/x");
    std::env::set_var("QUILL_SERVER__CONNECT_TIMEOUT_MS", "250");
    std::env::set_var("QUILL_SESSION__POLICY", "tool_log");
    std::env::set_var("QUILL_SESSION__AGENTS", "writer,editor");
    std::env::set_var("QUILL_SESSION__STRICT_AGENTS", "true");
    std::env::set_var("QUILL_LOGGING__FORMAT", "json");

    let config = Config::load().unwrap();

    assert_eq!(config.server.endpoint, "http://127.0.0.1:1/x");
    assert_eq!(config.server.connect_timeout_ms, 250);
    assert_eq!(config.session.policy, Policy::ToolLog);
    assert_eq!(config.session.agents, vec!["writer", "editor"]);
    assert!(config.session.strict_agents);
    assert_eq!(config.logging.format, "json");

    // Unset keys keep their defaults
    assert!(config.session.snapshot_tokens);
    assert_eq!(config.session.snapshot_field("writer"), Some("draft"));
    assert_eq!(config.logging.level, "warn");
}

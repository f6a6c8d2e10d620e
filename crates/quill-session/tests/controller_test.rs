use async_trait::async_trait;
use quill_session::{
    FragmentStream, ScriptedTransport, SessionConfig, SessionController, StreamDriver, Transport,
};
use quill_types::{GenerateRequest, TransportError};
use std::sync::Arc;
use std::time::Duration;

/// Serves a slow stream for "slow" and a fast one for anything else
struct ByInstruction {
    slow: ScriptedTransport,
    fast: ScriptedTransport,
}

#[async_trait]
impl Transport for ByInstruction {
    async fn open(&self, request: &GenerateRequest) -> Result<FragmentStream, TransportError> {
        if request.instruction == "slow" {
            self.slow.open(request).await
        } else {
            self.fast.open(request).await
        }
    }
}

fn controller() -> SessionController {
    let transport = ByInstruction {
        slow: ScriptedTransport::new([
            "data: {\"type\":\"agent_start\",\"agent\":\"writer\"}\n",
            "data: {\"type\":\"stream\",\"content\":\"stale \"}\n",
            "data: {\"type\":\"stream\",\"content\":\"stale \"}\n",
            "data: {\"type\":\"stream\",\"content\":\"stale\"}\n",
            "data: [DONE]\n",
        ])
        .with_delay(Duration::from_millis(40)),
        fast: ScriptedTransport::new([concat!(
            "data: {\"type\":\"agent_start\",\"agent\":\"writer\"}\n",
            "data: {\"type\":\"stream\",\"content\":\"fresh\"}\n",
            "data: [DONE]\n",
        )]),
    };

    SessionController::new(StreamDriver::new(Arc::new(transport), SessionConfig::default()))
}

#[tokio::test]
async fn test_resubmission_discards_stale_session() {
    let controller = controller();

    let first = controller.submit("slow");
    tokio::time::sleep(Duration::from_millis(60)).await;

    let second = controller.submit("fast");
    let finished = second.await.unwrap();
    let stale = first.await.unwrap();

    // Leave time for anything the old loop might still deliver
    tokio::time::sleep(Duration::from_millis(200)).await;

    let current = controller.current();
    assert_eq!(current.session_id(), finished.session_id());
    assert_ne!(current.session_id(), stale.session_id());
    assert_eq!(current.buffer("writer"), Some("fresh"));
    assert!(current.is_terminated());
    assert!(!stale.is_terminated());
}

#[tokio::test]
async fn test_submit_resets_published_state() {
    let controller = controller();

    let handle = controller.submit("fast");
    let first = handle.await.unwrap();
    assert_eq!(controller.current().buffer("writer"), Some("fresh"));

    let _handle = controller.submit("slow");
    let current = controller.current();

    assert_ne!(current.session_id(), first.session_id());
    assert!(current.agents().is_empty());
    assert!(!current.is_terminated());
}

#[tokio::test]
async fn test_cancel_terminates_current_session() {
    let controller = controller();
    let mut updates = controller.subscribe();

    let handle = controller.submit("slow");
    tokio::time::sleep(Duration::from_millis(60)).await;
    controller.cancel();

    let last = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .unwrap()
        .unwrap();
    assert!(!last.is_terminated());

    let current = updates.borrow_and_update().clone();
    assert!(current.is_terminated());
    assert!(current.error().is_none());
    assert_eq!(current.active_key(), None);
    assert_eq!(current.session_id(), last.session_id());
}

#[tokio::test]
async fn test_cancel_without_session_is_noop() {
    let controller = controller();
    let before = controller.current();

    controller.cancel();

    assert_eq!(controller.current(), before);
}

#[tokio::test]
async fn test_subscriber_sees_final_state() {
    let controller = controller();
    let mut updates = controller.subscribe();

    let _handle = controller.submit("fast");

    let state = tokio::time::timeout(
        Duration::from_secs(1),
        updates.wait_for(|state| state.is_terminated()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(state.buffer("writer"), Some("fresh"));
}

#[tokio::test]
async fn test_event_subscriber_sees_every_snapshot() {
    let transport = ScriptedTransport::new([concat!(
        "data: {\"type\":\"agent_start\",\"agent\":\"writer\"}\n",
        "data: {\"type\":\"stream\",\"content\":\"a\"}\n",
        "data: {\"type\":\"stream\",\"content\":\"b\"}\n",
        "data: {\"type\":\"stream\",\"content\":\"c\"}\n",
        "data: [DONE]\n",
    )]);
    let controller =
        SessionController::new(StreamDriver::new(Arc::new(transport), SessionConfig::default()));
    let mut events = controller.subscribe_events();

    controller.submit("abc").await.unwrap();

    let mut seen = Vec::new();
    while let Ok(state) = events.try_recv() {
        let text = state.buffer("writer").unwrap_or("-").to_string();
        seen.push((text, state.is_terminated()));
    }

    assert_eq!(
        seen,
        vec![
            ("-".to_string(), false),
            ("".to_string(), false),
            ("a".to_string(), false),
            ("ab".to_string(), false),
            ("abc".to_string(), false),
            ("abc".to_string(), true),
        ]
    );
}

#[tokio::test]
async fn test_event_subscriber_never_sees_stale_session_after_resubmit() {
    let controller = controller();
    let mut events = controller.subscribe_events();

    let first = controller.submit("slow");
    tokio::time::sleep(Duration::from_millis(60)).await;
    let fresh = controller.submit("fast").await.unwrap();
    first.await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let mut seen = Vec::new();
    while let Ok(state) = events.try_recv() {
        seen.push(state);
    }

    let start = seen
        .iter()
        .position(|s| s.session_id() == fresh.session_id())
        .unwrap();
    assert!(start > 0);
    assert!(seen[start..]
        .iter()
        .all(|s| s.session_id() == fresh.session_id()));
    // reset, agent_start, token, termination
    assert_eq!(seen.len() - start, 4);
    assert_eq!(seen.last().unwrap().buffer("writer"), Some("fresh"));
}

#[tokio::test]
async fn test_event_subscriber_sees_cancellation() {
    let controller = controller();
    let mut events = controller.subscribe_events();

    let handle = controller.submit("slow");
    tokio::time::sleep(Duration::from_millis(60)).await;
    controller.cancel();
    handle.await.unwrap();

    let mut last = None;
    while let Ok(state) = events.try_recv() {
        last = Some(state);
    }

    let last = last.unwrap();
    assert!(last.is_terminated());
    assert!(last.error().is_none());
}

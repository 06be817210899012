use std::sync::Arc;

use castlink_core::SessionDescription;
use castlink_session::{MemoryStore, SessionState, SignalStore};
use serde_json::json;

use crate::integration::{host_supervisor, init_tracing, test_config};
use crate::utils::{MockEngineFactory, MockMedia, run_polls, wait_for_state};

#[tokio::test(start_paused = true)]
async fn test_answer_applied_exactly_once() {
    init_tracing();

    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let engines = MockEngineFactory::new("host");
    let media = MockMedia::new();
    let mut host = host_supervisor(store.clone(), &engines, &media);

    let code = host.start_host().await.unwrap();

    // Nobody answered yet
    run_polls(&config, 5).await;
    assert!(engines.log().remote_descriptions.is_empty());
    assert_eq!(host.state(), SessionState::Offering);

    store
        .put(
            &format!("rooms/{}/answer", code),
            json!({"type": "answer", "sdp": "v=0 remote"}),
        )
        .await
        .unwrap();

    let mut state = host.subscribe_state();
    assert!(wait_for_state(&mut state, SessionState::Negotiating).await);

    run_polls(&config, 5).await;
    assert_eq!(
        engines.log().remote_descriptions,
        vec![SessionDescription::answer("v=0 remote")]
    );
    assert_eq!(host.state(), SessionState::Negotiating);

    host.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_malformed_answer_is_ignored() {
    init_tracing();

    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let engines = MockEngineFactory::new("host");
    let media = MockMedia::new();
    let mut host = host_supervisor(store.clone(), &engines, &media);

    let code = host.start_host().await.unwrap();
    let answer_path = format!("rooms/{}/answer", code);

    store.put(&answer_path, json!("garbage")).await.unwrap();
    run_polls(&config, 3).await;
    assert_eq!(host.state(), SessionState::Offering);

    // Right shape, wrong kind
    store
        .put(&answer_path, json!({"type": "offer", "sdp": "v=0"}))
        .await
        .unwrap();
    run_polls(&config, 3).await;
    assert_eq!(host.state(), SessionState::Offering);
    assert!(engines.log().remote_descriptions.is_empty());

    store
        .put(&answer_path, json!({"type": "answer", "sdp": "v=0 late"}))
        .await
        .unwrap();
    let mut state = host.subscribe_state();
    assert!(wait_for_state(&mut state, SessionState::Negotiating).await);
    assert_eq!(engines.log().remote_descriptions.len(), 1);

    host.stop().await;
}

use std::sync::Arc;

use castlink_session::{SessionState, SignalStore};
use serde_json::json;

use crate::integration::{host_supervisor, init_tracing, test_config};
use crate::utils::{FlakyStore, MockEngineFactory, MockMedia, run_polls, wait_for_state};

#[tokio::test(start_paused = true)]
async fn test_offer_write_retried_after_failure() {
    init_tracing();

    let store = Arc::new(FlakyStore::new());
    let engines = MockEngineFactory::new("host");
    let media = MockMedia::new();
    let mut host = host_supervisor(store.clone(), &engines, &media);

    store.fail_next_puts(1);
    let code = host.start_host().await.expect("store outage must not fail start");
    let offer_path = format!("rooms/{}/offer", code);
    assert_eq!(store.get(&offer_path).await.unwrap(), None);

    run_polls(&test_config(), 1).await;
    let offer = store.get(&offer_path).await.unwrap();
    assert!(offer.is_some(), "offer should be republished on the next poll");
    assert_eq!(host.state(), SessionState::Offering);

    host.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_answer_poll_is_skipped() {
    init_tracing();

    let store = Arc::new(FlakyStore::new());
    let engines = MockEngineFactory::new("host");
    let media = MockMedia::new();
    let mut host = host_supervisor(store.clone(), &engines, &media);

    let code = host.start_host().await.unwrap();
    store
        .put(
            &format!("rooms/{}/answer", code),
            json!({"type": "answer", "sdp": "v=0"}),
        )
        .await
        .unwrap();
    store.fail_next_gets(3);

    let mut state = host.subscribe_state();
    assert!(wait_for_state(&mut state, SessionState::Negotiating).await);
    assert_eq!(engines.log().remote_descriptions.len(), 1);
    assert!(host.last_failure().is_none());

    host.stop().await;
}

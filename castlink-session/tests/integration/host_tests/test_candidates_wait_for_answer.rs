use std::sync::Arc;

use castlink_session::{MemoryStore, SessionState, SignalStore};
use serde_json::{Value, json};

use crate::integration::{host_supervisor, init_tracing, test_config};
use crate::utils::{MockEngineFactory, MockMedia, run_polls, wait_for_state};

fn candidate(name: &str) -> Value {
    json!({"candidate": format!("candidate:{}", name), "sdpMid": "0", "sdpMLineIndex": 0})
}

#[tokio::test(start_paused = true)]
async fn test_remote_candidates_wait_for_answer() {
    init_tracing();

    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let engines = MockEngineFactory::new("host");
    let media = MockMedia::new();
    let mut host = host_supervisor(store.clone(), &engines, &media);

    let code = host.start_host().await.unwrap();
    let mailbox = format!("rooms/{}/viewer_ice", code);

    store
        .put(&format!("{}/100", mailbox), candidate("early"))
        .await
        .unwrap();
    run_polls(&config, 3).await;
    assert!(engines.log().remote_candidates.is_empty());

    store
        .put(
            &format!("rooms/{}/answer", code),
            json!({"type": "answer", "sdp": "v=0"}),
        )
        .await
        .unwrap();

    let mut state = host.subscribe_state();
    assert!(wait_for_state(&mut state, SessionState::Connected).await);
    run_polls(&config, 2).await;
    assert_eq!(engines.log().remote_candidates.len(), 1);

    host.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_mailbox_entries_ingested_once_per_key() {
    init_tracing();

    let config = test_config();
    let store = Arc::new(MemoryStore::new());
    let engines = MockEngineFactory::new("host");
    let media = MockMedia::new();
    let mut host = host_supervisor(store.clone(), &engines, &media);

    let code = host.start_host().await.unwrap();
    let mailbox = format!("rooms/{}/viewer_ice", code);
    store
        .put(
            &format!("rooms/{}/answer", code),
            json!({"type": "answer", "sdp": "v=0"}),
        )
        .await
        .unwrap();
    let mut state = host.subscribe_state();
    assert!(wait_for_state(&mut state, SessionState::Negotiating).await);

    // Same payload under two keys counts twice
    store.put(&format!("{}/101", mailbox), candidate("a")).await.unwrap();
    store.put(&format!("{}/102", mailbox), candidate("a")).await.unwrap();
    run_polls(&config, 3).await;
    assert_eq!(engines.log().remote_candidates.len(), 2);

    // Rewriting a seen key changes nothing
    store.put(&format!("{}/101", mailbox), candidate("a")).await.unwrap();
    run_polls(&config, 3).await;
    assert_eq!(engines.log().remote_candidates.len(), 2);

    // A candidate the engine rejects is skipped without ending the session
    store
        .put(&format!("{}/103", mailbox), json!({"bogus": true}))
        .await
        .unwrap();
    store.put(&format!("{}/104", mailbox), candidate("b")).await.unwrap();
    run_polls(&config, 3).await;
    assert_eq!(engines.log().remote_candidates.len(), 3);
    assert_eq!(host.state(), SessionState::Connected);

    host.stop().await;
}

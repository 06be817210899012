use std::sync::Arc;

use castlink_session::{MemoryStore, SessionState, SignalStore};

use crate::integration::{host_supervisor, init_tracing, viewer_supervisor};
use crate::utils::{MockEngineFactory, MockMedia, drain_events, entered, wait_for_state};

#[tokio::test(start_paused = true)]
async fn test_host_and_viewer_connect_through_store() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let host_engines = MockEngineFactory::new("host");
    let viewer_engines = MockEngineFactory::new("viewer");
    let media = MockMedia::new();

    let mut host = host_supervisor(store.clone(), &host_engines, &media);
    let mut viewer = viewer_supervisor(store.clone(), &viewer_engines);
    let mut host_events = host.subscribe_events();
    let mut viewer_events = viewer.subscribe_events();

    let code = host.start_host().await.expect("host should start");
    viewer
        .join_viewer(code.as_str())
        .await
        .expect("viewer should join");

    let mut host_state = host.subscribe_state();
    let mut viewer_state = viewer.subscribe_state();
    assert!(wait_for_state(&mut viewer_state, SessionState::Connected).await);
    assert!(wait_for_state(&mut host_state, SessionState::Connected).await);

    // Each side got exactly the other's candidates
    assert_eq!(host_engines.log().remote_candidates.len(), 2);
    assert_eq!(viewer_engines.log().remote_candidates.len(), 2);
    assert_eq!(host_engines.log().remote_descriptions.len(), 1);

    let host_events = drain_events(&mut host_events);
    assert_eq!(entered(&host_events, SessionState::Offering), 1);
    assert_eq!(entered(&host_events, SessionState::Negotiating), 1);
    assert_eq!(entered(&host_events, SessionState::Connected), 1);
    let viewer_events = drain_events(&mut viewer_events);
    assert_eq!(entered(&viewer_events, SessionState::AwaitingOffer), 1);
    assert_eq!(entered(&viewer_events, SessionState::Connected), 1);

    host.stop().await;
    assert_eq!(host.state(), SessionState::Idle);
    assert_eq!(store.get(&format!("rooms/{}", code)).await.unwrap(), None);

    viewer.stop().await;
    assert_eq!(viewer.state(), SessionState::Idle);
}

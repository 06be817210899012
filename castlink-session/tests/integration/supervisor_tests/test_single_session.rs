use std::sync::Arc;

use castlink_session::{MemoryStore, SessionError, SessionState};

use crate::integration::{host_supervisor, init_tracing};
use crate::utils::{MockEngineFactory, MockMedia};

#[tokio::test(start_paused = true)]
async fn test_second_session_is_refused() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let engines = MockEngineFactory::new("host");
    let media = MockMedia::new();
    let mut host = host_supervisor(store.clone(), &engines, &media);

    let code = host.start_host().await.unwrap();
    assert_eq!(host.start_host().await, Err(SessionError::SessionActive));
    assert_eq!(
        host.join_viewer(code.as_str()).await,
        Err(SessionError::SessionActive)
    );

    // The refused attempts never touched capture or the running session
    assert_eq!(media.acquired(), 1);
    assert_eq!(engines.log().created, 1);
    assert_eq!(host.state(), SessionState::Offering);

    host.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_denied_capture_fails_start() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let engines = MockEngineFactory::new("host");
    let media = MockMedia::denied();
    let mut host = host_supervisor(store.clone(), &engines, &media);
    let mut events = host.subscribe_events();

    let err = host.start_host().await.unwrap_err();
    assert!(matches!(
        &err,
        SessionError::MediaAcquisitionFailed(msg) if msg.contains("permission denied")
    ));
    assert_eq!(engines.log().created, 0);
    assert_eq!(host.state(), SessionState::Idle);
    assert!(store.is_empty());
    assert!(events.try_recv().is_err());
}

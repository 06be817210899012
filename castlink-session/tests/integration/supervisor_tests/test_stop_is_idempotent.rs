use std::sync::Arc;

use castlink_session::{
    MemoryStore, SessionConfig, SessionEvent, SessionState, SessionSupervisor, SignalStore,
};

use crate::integration::{host_supervisor, init_tracing, test_config};
use crate::utils::{MockEngineFactory, MockMedia, drain_events};

#[tokio::test(start_paused = true)]
async fn test_stop_twice_tears_down_once() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let engines = MockEngineFactory::new("host");
    let media = MockMedia::new();
    let mut host = host_supervisor(store.clone(), &engines, &media);

    // Nothing running yet
    host.stop().await;
    assert_eq!(host.state(), SessionState::Idle);

    let mut events = host.subscribe_events();
    let code = host.start_host().await.unwrap();
    host.stop().await;
    host.stop().await;

    assert_eq!(host.state(), SessionState::Idle);
    assert!(host.session().is_none());
    assert_eq!(engines.log().closed, 1);
    assert!(media.is_released().await);
    assert_eq!(store.get(&format!("rooms/{}", code)).await.unwrap(), None);

    assert_eq!(
        drain_events(&mut events),
        vec![
            SessionEvent::Transition {
                from: SessionState::Idle,
                to: SessionState::Offering,
            },
            SessionEvent::Transition {
                from: SessionState::Offering,
                to: SessionState::Closed,
            },
            SessionEvent::Transition {
                from: SessionState::Closed,
                to: SessionState::Idle,
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_room_kept_when_release_disabled() {
    init_tracing();

    let store = Arc::new(MemoryStore::new());
    let engines = MockEngineFactory::new("host");
    let media = MockMedia::new();
    let mut host = SessionSupervisor::new(
        SessionConfig {
            release_room_on_stop: false,
            ..test_config()
        },
        store.clone(),
        Arc::new(engines.clone()),
        Arc::new(media.clone()),
    );

    let code = host.start_host().await.unwrap();
    host.stop().await;

    assert!(store.get(&format!("rooms/{}/offer", code)).await.unwrap().is_some());
    assert_eq!(engines.log().closed, 1);
}

use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{Instrument, Span, debug, error, info, info_span};

use crate::config::SessionConfig;
use crate::coordinator::{
    Coordinator, CoordinatorCommand, Session, SessionEvent, SessionState, StateReporter,
};
use crate::engine::PeerEngineFactory;
use crate::error::SessionError;
use crate::media::MediaSource;
use crate::store::SignalStore;
use castlink_core::{Role, RoomCode, SessionId};

struct ActiveSession {
    id: SessionId,
    role: Role,
    code: RoomCode,
    created_at: SystemTime,
    command_tx: mpsc::Sender<CoordinatorCommand>,
    handle: JoinHandle<Result<(), SessionError>>,
}

/// Public entry point: runs at most one host or viewer session at a time.
///
/// Dropping the supervisor stops the running session in the background.
pub struct SessionSupervisor {
    config: SessionConfig,
    store: Arc<dyn SignalStore>,
    engines: Arc<dyn PeerEngineFactory>,
    media: Arc<dyn MediaSource>,
    reporter: StateReporter,
    active: Option<ActiveSession>,
    last_failure: Option<SessionError>,
}

impl SessionSupervisor {
    pub fn new(
        config: SessionConfig,
        store: Arc<dyn SignalStore>,
        engines: Arc<dyn PeerEngineFactory>,
        media: Arc<dyn MediaSource>,
    ) -> Self {
        Self {
            config,
            store,
            engines,
            media,
            reporter: StateReporter::new(),
            active: None,
            last_failure: None,
        }
    }

    /// Acquires local media, publishes an offer under a fresh room code and
    /// returns the code to share with the viewer.
    pub async fn start_host(&mut self) -> Result<RoomCode, SessionError> {
        self.ensure_vacant().await?;

        let media = self.media.acquire().await.map_err(|e| {
            error!("Media acquisition failed: {:#}", e);
            SessionError::MediaAcquisitionFailed(format!("{:#}", e))
        })?;

        let code = RoomCode::generate(self.config.room_code_len);
        let (mut coordinator, command_tx) = self.coordinator(Role::Host, code.clone());
        let id = SessionId::new();
        let span = session_span(id, Role::Host, &code);

        if let Err(e) = coordinator.begin_host(media).instrument(span.clone()).await {
            self.last_failure = Some(e.clone());
            return Err(e);
        }
        self.launch(id, Role::Host, code.clone(), coordinator, command_tx, span);
        Ok(code)
    }

    /// Joins the room `code` as a viewer. Fails with `RoomNotFound` when no
    /// offer is published under it.
    pub async fn join_viewer(&mut self, code: &str) -> Result<(), SessionError> {
        self.ensure_vacant().await?;

        let code = RoomCode::parse(code)?;
        let (mut coordinator, command_tx) = self.coordinator(Role::Viewer, code.clone());
        let id = SessionId::new();
        let span = session_span(id, Role::Viewer, &code);

        if let Err(e) = coordinator.begin_viewer().instrument(span.clone()).await {
            self.last_failure = Some(e.clone());
            return Err(e);
        }
        self.launch(id, Role::Viewer, code, coordinator, command_tx, span);
        Ok(())
    }

    /// Tears the current session down and waits for it. No-op when idle.
    pub async fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            debug!("Stop requested with no running session");
            return;
        };
        // Fails only if the loop already exited on its own.
        let _ = active.command_tx.send(CoordinatorCommand::Shutdown).await;
        self.reap(active).await;
    }

    pub fn state(&self) -> SessionState {
        self.reporter.current()
    }

    /// The running session, if any.
    pub fn session(&self) -> Option<Session> {
        let state = self.reporter.current();
        self.active
            .as_ref()
            .filter(|_| state.is_live())
            .map(|active| Session {
                id: active.id,
                role: active.role,
                code: active.code.clone(),
                state,
                created_at: active.created_at,
            })
    }

    pub fn last_failure(&self) -> Option<&SessionError> {
        self.last_failure.as_ref()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.reporter.subscribe_state()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.reporter.subscribe_events()
    }

    fn coordinator(
        &self,
        role: Role,
        code: RoomCode,
    ) -> (Coordinator, mpsc::Sender<CoordinatorCommand>) {
        let (command_tx, command_rx) = mpsc::channel(8);
        let coordinator = Coordinator::new(
            role,
            code,
            self.config.clone(),
            self.store.clone(),
            self.engines.clone(),
            self.reporter.clone(),
            command_rx,
        );
        (coordinator, command_tx)
    }

    fn launch(
        &mut self,
        id: SessionId,
        role: Role,
        code: RoomCode,
        coordinator: Coordinator,
        command_tx: mpsc::Sender<CoordinatorCommand>,
        span: Span,
    ) {
        info!(parent: &span, "Session started");
        let handle = tokio::spawn(coordinator.run().instrument(span));
        self.active = Some(ActiveSession {
            id,
            role,
            code,
            created_at: SystemTime::now(),
            command_tx,
            handle,
        });
    }

    // A session that ended by itself (media ended, peer failure) still holds
    // its slot until reaped.
    async fn ensure_vacant(&mut self) -> Result<(), SessionError> {
        match self.active.take() {
            Some(active) if active.handle.is_finished() => {
                self.reap(active).await;
                Ok(())
            }
            Some(active) => {
                self.active = Some(active);
                Err(SessionError::SessionActive)
            }
            None => Ok(()),
        }
    }

    async fn reap(&mut self, active: ActiveSession) {
        match active.handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => self.last_failure = Some(e),
            Err(e) => {
                error!("Session task aborted: {}", e);
                let state = self.reporter.current();
                if state != SessionState::Idle {
                    self.reporter.publish(state, SessionState::Idle);
                }
            }
        }
    }
}

impl Drop for SessionSupervisor {
    fn drop(&mut self) {
        if let Some(active) = self.active.take() {
            debug!("Supervisor dropped, stopping session {}", active.code);
            let _ = active.command_tx.try_send(CoordinatorCommand::Shutdown);
        }
    }
}

fn session_span(id: SessionId, role: Role, code: &RoomCode) -> Span {
    info_span!("session", id = %id, role = %role, code = %code)
}

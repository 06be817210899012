use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::coordinator::{
    CandidateBuffer, CoordinatorCommand, Inbox, SessionState, StateReporter,
};
use crate::engine::{ConnectionState, EngineEvent, NegotiationState, PeerEngine, PeerEngineFactory};
use crate::error::SessionError;
use crate::media::MediaStream;
use crate::store::SignalStore;
use castlink_core::{Role, RoomCode, SdpKind, SessionDescription, SignalMessage, SignalPath};

type Exit = ControlFlow<Result<(), SessionError>>;

/// Drives one session: owns the engine, the local media and the polling loop.
///
/// Setup (`begin_host` / `begin_viewer`) runs in the caller's task so that its
/// errors can be returned directly. `run` is then spawned and ends with
/// teardown, leaving the state at `Idle`.
pub struct Coordinator {
    /// Which side of the exchange this session plays
    role: Role,
    /// Room every path of this session lives under
    code: RoomCode,
    /// Current lifecycle state, mirrored to `reporter` on every transition
    state: SessionState,
    config: SessionConfig,

    /// Shared key-value store used as the signaling channel
    store: Arc<dyn SignalStore>,
    /// Builds the engine once setup knows the local media
    engines: Arc<dyn PeerEngineFactory>,
    /// Peer connection, `None` before setup and after teardown
    engine: Option<Box<dyn PeerEngine>>,
    /// Host capture, released on teardown
    media: Option<MediaStream>,
    /// Fires when the capture ends on its own
    media_ended: Option<oneshot::Receiver<()>>,

    /// Publishes state changes to the supervisor and subscribers
    reporter: StateReporter,
    /// Local candidates waiting to be written to our mailbox
    outbox: CandidateBuffer,
    /// Remote mailbox keys already applied to the engine
    inbox: Inbox,

    /// Offer or answer whose write has not succeeded yet.
    unpublished: Option<SignalMessage>,
    /// Whether the room holds our offer and must be released on teardown
    offer_published: bool,

    /// Commands from the supervisor (shutdown)
    command_rx: mpsc::Receiver<CoordinatorCommand>,
    /// Events forwarded from engine callbacks
    event_rx: mpsc::Receiver<EngineEvent>,
    /// Handed to the engine factory so callbacks can reach `event_rx`
    event_tx: mpsc::Sender<EngineEvent>,
}

impl Coordinator {
    pub fn new(
        role: Role,
        code: RoomCode,
        config: SessionConfig,
        store: Arc<dyn SignalStore>,
        engines: Arc<dyn PeerEngineFactory>,
        reporter: StateReporter,
        command_rx: mpsc::Receiver<CoordinatorCommand>,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel(256);

        Self {
            outbox: CandidateBuffer::new(code.clone(), role),
            inbox: Inbox::new(),
            role,
            code,
            state: SessionState::Idle,
            config,
            store,
            engines,
            engine: None,
            media: None,
            media_ended: None,
            reporter,
            unpublished: None,
            offer_published: false,
            command_rx,
            event_rx,
            event_tx,
        }
    }

    /// Creates the engine with `media` attached and publishes the offer.
    /// On error the session has already been torn down.
    pub async fn begin_host(&mut self, mut media: MediaStream) -> Result<(), SessionError> {
        self.media_ended = media.take_ended();
        self.media = Some(media);
        self.transition(SessionState::Offering);

        match self.try_begin_host().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.fail(e.clone()).await;
                Err(e)
            }
        }
    }

    async fn try_begin_host(&mut self) -> Result<(), SessionError> {
        let engine = self.open_engine().await?;
        let offer = prepare_offer(engine.as_ref(), self.media.as_ref()).await;
        self.engine = Some(engine);

        self.unpublished = Some(SignalMessage::Offer(offer?));
        self.publish_description().await;
        Ok(())
    }

    /// Reads the host's offer, answers it and publishes the answer.
    /// On error the session has already been torn down.
    pub async fn begin_viewer(&mut self) -> Result<(), SessionError> {
        self.transition(SessionState::AwaitingOffer);

        match self.try_begin_viewer().await {
            Ok(()) => Ok(()),
            Err(e) => {
                self.fail(e.clone()).await;
                Err(e)
            }
        }
    }

    async fn try_begin_viewer(&mut self) -> Result<(), SessionError> {
        let offer = self.read_offer().await?;
        let engine = self.open_engine().await?;
        let answer = prepare_answer(engine.as_ref(), offer).await;
        self.engine = Some(engine);

        self.unpublished = Some(SignalMessage::Answer(answer?));
        self.publish_description().await;
        self.transition(SessionState::Negotiating);
        Ok(())
    }

    async fn read_offer(&self) -> Result<SessionDescription, SessionError> {
        let path = SignalPath::Offer(self.code.clone()).to_string();
        let slot = match self.store.get(&path).await {
            Ok(Some(slot)) => slot,
            Ok(None) => return Err(SessionError::RoomNotFound(self.code.clone())),
            Err(e) => {
                warn!("Reading {} failed: {}", path, e);
                return Err(SessionError::RoomNotFound(self.code.clone()));
            }
        };
        SessionDescription::from_slot(slot, SdpKind::Offer).ok_or_else(|| {
            SessionError::NegotiationFailed(format!("malformed offer at {}", path))
        })
    }

    async fn open_engine(&self) -> Result<Box<dyn PeerEngine>, SessionError> {
        self.engines
            .create(self.event_tx.clone())
            .await
            .map_err(|e| SessionError::negotiation("create peer connection", e))
    }

    /// Main loop. Must be spawned after a successful `begin_*`.
    pub async fn run(mut self) -> Result<(), SessionError> {
        info!("Session loop started");

        let mut poll = time::interval(self.config.poll_interval());
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let outcome = loop {
            let step = tokio::select! {
                cmd = self.command_rx.recv() => match cmd {
                    Some(CoordinatorCommand::Shutdown) => {
                        info!("Stop requested");
                        ControlFlow::Break(Ok(()))
                    }
                    None => {
                        info!("Command channel closed. Stopping session.");
                        ControlFlow::Break(Ok(()))
                    }
                },

                ended = wait_media_ended(&mut self.media_ended) => {
                    if ended {
                        ControlFlow::Break(Err(SessionError::MediaEnded))
                    } else {
                        ControlFlow::Continue(())
                    }
                }

                Some(event) = self.event_rx.recv() => self.handle_engine_event(event).await,

                _ = poll.tick() => self.poll_once().await,
            };

            if let ControlFlow::Break(outcome) = step {
                break outcome;
            }
        };

        drop(poll);
        match &outcome {
            Ok(()) => self.teardown().await,
            Err(e) => self.fail(e.clone()).await,
        }

        info!("Session loop finished");
        outcome
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) -> Exit {
        match event {
            EngineEvent::LocalCandidate(Some(candidate)) => {
                if self.outbox.push(candidate) {
                    self.outbox.flush(self.store.as_ref()).await;
                }
            }

            EngineEvent::LocalCandidate(None) => {
                info!("Local candidate gathering complete");
                self.outbox.finish();
            }

            EngineEvent::StateChanged(ConnectionState::Connected) => {
                info!("Peer connection established");
                if self.role == Role::Host && self.state == SessionState::Negotiating {
                    self.transition(SessionState::Connected);
                }
            }

            EngineEvent::StateChanged(ConnectionState::Failed) => {
                return ControlFlow::Break(Err(SessionError::NegotiationFailed(
                    "peer connection failed".into(),
                )));
            }

            EngineEvent::StateChanged(ConnectionState::Closed) => {
                info!("Peer connection closed by engine");
                return ControlFlow::Break(Ok(()));
            }

            EngineEvent::StateChanged(ConnectionState::Disconnected) => {
                warn!("Peer connection disconnected, waiting for recovery");
            }

            EngineEvent::StateChanged(state) => {
                debug!("Peer connection state: {:?}", state);
            }

            EngineEvent::TrackReceived(track) => {
                info!("Remote {} track {} attached", track.kind, track.id);
                if self.role == Role::Viewer && self.state == SessionState::Negotiating {
                    self.transition(SessionState::Connected);
                }
            }
        }
        ControlFlow::Continue(())
    }

    async fn poll_once(&mut self) -> Exit {
        self.publish_description().await;
        self.outbox.flush(self.store.as_ref()).await;

        match self.state {
            SessionState::Offering => {
                if let Err(e) = self.poll_answer().await {
                    return ControlFlow::Break(Err(e));
                }
            }
            SessionState::Negotiating | SessionState::Connected => self.poll_candidates().await,
            _ => {}
        }
        ControlFlow::Continue(())
    }

    async fn poll_answer(&mut self) -> Result<(), SessionError> {
        let path = SignalPath::Answer(self.code.clone()).to_string();
        let slot = match self.store.get(&path).await {
            Ok(Some(slot)) => slot,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!("Polling {} failed: {}", path, e);
                return Ok(());
            }
        };
        let Some(answer) = SessionDescription::from_slot(slot, SdpKind::Answer) else {
            warn!("Ignoring malformed answer at {}", path);
            return Ok(());
        };
        let Some(engine) = self.engine.as_deref() else {
            return Ok(());
        };
        if engine.negotiation_state() != NegotiationState::HaveLocalOffer {
            debug!("Answer present but engine not expecting one");
            return Ok(());
        }

        engine
            .set_remote_description(answer)
            .await
            .map_err(|e| SessionError::negotiation("apply answer", e))?;
        info!("Applied remote answer");
        self.transition(SessionState::Negotiating);
        Ok(())
    }

    async fn poll_candidates(&mut self) {
        let path = SignalPath::Mailbox(self.code.clone(), self.role.peer()).to_string();
        let mailbox = match self.store.get(&path).await {
            Ok(Some(mailbox)) => mailbox,
            Ok(None) => return,
            Err(e) => {
                warn!("Polling {} failed: {}", path, e);
                return;
            }
        };

        let fresh = self.inbox.fresh(mailbox);
        let Some(engine) = self.engine.as_deref() else {
            return;
        };
        for entry in fresh {
            match engine.add_remote_candidate(entry.candidate).await {
                Ok(()) => debug!("Added remote candidate {}", entry.key),
                Err(e) => warn!("Remote candidate {} rejected: {:#}", entry.key, e),
            }
        }
    }

    async fn publish_description(&mut self) {
        let Some(message) = self.unpublished.take() else {
            return;
        };
        let path = message.path(&self.code).to_string();
        let value = match message.clone().into_value() {
            Ok(value) => value,
            Err(e) => {
                error!("Failed to encode {}: {}", path, e);
                return;
            }
        };

        match self.store.put(&path, value).await {
            Ok(()) => {
                info!("Published {}", path);
                if matches!(message, SignalMessage::Offer(_)) {
                    self.offer_published = true;
                }
            }
            Err(e) => {
                warn!("Publishing {} failed, retrying next poll: {}", path, e);
                self.unpublished = Some(message);
            }
        }
    }

    fn transition(&mut self, next: SessionState) -> bool {
        if !self.state.can_transition_to(next) {
            warn!("Rejected transition {} -> {}", self.state, next);
            return false;
        }
        let prev = std::mem::replace(&mut self.state, next);
        info!("Session {} -> {}", prev, next);
        self.reporter.publish(prev, next);
        true
    }

    async fn fail(&mut self, err: SessionError) {
        error!("Session failed: {}", err);
        self.transition(SessionState::Failed);
        self.reporter.report_failure(err);
        self.teardown().await;
    }

    /// Releases media, engine and room in that order, then resets to `Idle`.
    /// Every step runs at most once per session.
    async fn teardown(&mut self) {
        if let Some(media) = self.media.take() {
            media.stop();
            debug!("Local media released");
        }
        self.media_ended = None;

        if let Some(engine) = self.engine.take() {
            if let Err(e) = engine.close().await {
                warn!("Closing peer connection failed: {:#}", e);
            }
        }

        if self.role == Role::Host && self.config.release_room_on_stop && self.offer_published {
            self.offer_published = false;
            let path = SignalPath::Room(self.code.clone()).to_string();
            match self.store.put(&path, serde_json::Value::Null).await {
                Ok(()) => info!("Released {}", path),
                Err(e) => warn!("Releasing {} failed: {}", path, e),
            }
        }
        self.unpublished = None;

        if self.state.is_live() {
            self.transition(SessionState::Closed);
        }
        if self.state != SessionState::Idle {
            self.transition(SessionState::Idle);
        }
    }
}

async fn prepare_offer(
    engine: &dyn PeerEngine,
    media: Option<&MediaStream>,
) -> Result<SessionDescription, SessionError> {
    if let Some(media) = media {
        engine
            .add_stream(media)
            .await
            .map_err(|e| SessionError::negotiation("attach local media", e))?;
    }
    let offer = engine
        .create_offer()
        .await
        .map_err(|e| SessionError::negotiation("create offer", e))?;
    info!("Created local offer");
    Ok(offer)
}

async fn prepare_answer(
    engine: &dyn PeerEngine,
    offer: SessionDescription,
) -> Result<SessionDescription, SessionError> {
    engine
        .set_remote_description(offer)
        .await
        .map_err(|e| SessionError::negotiation("apply offer", e))?;
    let answer = engine
        .create_answer()
        .await
        .map_err(|e| SessionError::negotiation("create answer", e))?;
    info!("Created local answer");
    Ok(answer)
}

// Resolves with `true` once capture ends; never resolves when there is
// nothing to watch.
async fn wait_media_ended(ended: &mut Option<oneshot::Receiver<()>>) -> bool {
    let Some(rx) = ended.as_mut() else {
        return std::future::pending().await;
    };
    let fired = rx.await.is_ok();
    *ended = None;
    fired
}

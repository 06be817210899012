use crate::engine::{EngineEvent, NegotiationState};
use crate::media::MediaStream;
use anyhow::Result;
use async_trait::async_trait;
use castlink_core::{IceCandidate, SessionDescription};
use tokio::sync::mpsc;

/// The peer-connection engine as seen by the coordinator.
///
/// `create_offer` and `create_answer` also install the description locally,
/// which starts candidate gathering.
#[async_trait]
pub trait PeerEngine: Send + Sync {
    async fn add_stream(&self, stream: &MediaStream) -> Result<()>;

    async fn create_offer(&self) -> Result<SessionDescription>;

    async fn create_answer(&self) -> Result<SessionDescription>;

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    fn negotiation_state(&self) -> NegotiationState;

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()>;

    async fn close(&self) -> Result<()>;
}

/// Builds one engine per session. Events go to `events` for the engine's lifetime.
#[async_trait]
pub trait PeerEngineFactory: Send + Sync {
    async fn create(&self, events: mpsc::Sender<EngineEvent>) -> Result<Box<dyn PeerEngine>>;
}

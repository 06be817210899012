use crate::engine::{
    ConnectionState, EngineConfig, EngineEvent, NegotiationState, PeerEngine, PeerEngineFactory,
    RemoteTrackInfo,
};
use crate::media::MediaStream;
use anyhow::{Context, Result};
use async_trait::async_trait;
use castlink_core::{IceCandidate, SdpKind, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};
use webrtc::api::APIBuilder;
use webrtc::api::interceptor_registry::register_default_interceptors;
use webrtc::api::media_engine::MediaEngine;
use webrtc::ice_transport::ice_candidate::{RTCIceCandidate, RTCIceCandidateInit};
use webrtc::ice_transport::ice_server::RTCIceServer;
use webrtc::interceptor::registry::Registry;
use webrtc::peer_connection::RTCPeerConnection;
use webrtc::peer_connection::configuration::RTCConfiguration;
use webrtc::peer_connection::peer_connection_state::RTCPeerConnectionState;
use webrtc::peer_connection::sdp::session_description::RTCSessionDescription;
use webrtc::peer_connection::signaling_state::RTCSignalingState;
use webrtc::rtp_transceiver::rtp_receiver::RTCRtpReceiver;
use webrtc::rtp_transceiver::RTCRtpTransceiver;
use webrtc::track::track_remote::TrackRemote;

/// Receives remote tracks so the embedding application can render them.
pub type TrackSink = mpsc::Sender<Arc<TrackRemote>>;

pub struct WebRtcEngine {
    peer_connection: Arc<RTCPeerConnection>,
}

impl WebRtcEngine {
    pub async fn new(
        config: EngineConfig,
        event_tx: mpsc::Sender<EngineEvent>,
        track_sink: Option<TrackSink>,
    ) -> Result<Self> {
        // 1. Codecs and the default interceptor chain (NACK, RTCP reports)
        let mut m = MediaEngine::default();
        m.register_default_codecs()?;
        let registry = register_default_interceptors(Registry::new(), &mut m)?;

        // 2. API bound to that media engine
        let api = APIBuilder::new()
            .with_media_engine(m)
            .with_interceptor_registry(registry)
            .build();

        // 3. ICE servers from config
        let rtc_config = RTCConfiguration {
            ice_servers: config
                .ice_servers
                .into_iter()
                .map(|server| RTCIceServer {
                    urls: server.urls,
                    username: server.username.unwrap_or_default(),
                    credential: server.credential.unwrap_or_default(),
                })
                .collect(),
            ..Default::default()
        };

        // 4. The peer connection itself
        let peer_connection = Arc::new(api.new_peer_connection(rtc_config).await?);

        // 5. Forward connection state changes
        let state_tx = event_tx.clone();
        peer_connection.on_peer_connection_state_change(Box::new(
            move |s: RTCPeerConnectionState| {
                let tx = state_tx.clone();
                Box::pin(async move {
                    info!("Peer connection state changed: {}", s);
                    if let Some(state) = connection_state(s) {
                        let _ = tx.send(EngineEvent::StateChanged(state)).await;
                    }
                })
            },
        ));

        // 6. Forward gathered candidates, `None` marks end of gathering
        let ice_tx = event_tx.clone();
        peer_connection.on_ice_candidate(Box::new(move |c: Option<RTCIceCandidate>| {
            let tx = ice_tx.clone();
            Box::pin(async move {
                let Some(candidate) = c else {
                    let _ = tx.send(EngineEvent::LocalCandidate(None)).await;
                    return;
                };
                let Ok(init) = candidate.to_json() else {
                    return;
                };
                let Ok(value) = serde_json::to_value(init) else {
                    return;
                };
                let _ = tx
                    .send(EngineEvent::LocalCandidate(Some(IceCandidate::new(value))))
                    .await;
            })
        }));

        // 7. Hand remote tracks to the sink and report their arrival
        let track_tx = event_tx;
        peer_connection.on_track(Box::new(
            move |track: Arc<TrackRemote>,
                  _receiver: Arc<RTCRtpReceiver>,
                  _transceiver: Arc<RTCRtpTransceiver>| {
                let tx = track_tx.clone();
                let sink = track_sink.clone();
                Box::pin(async move {
                    let info = RemoteTrackInfo {
                        id: track.id(),
                        kind: track.kind().to_string(),
                    };
                    debug!("Remote track {} ({}) arrived", info.id, info.kind);
                    if let Some(sink) = sink {
                        let _ = sink.send(track).await;
                    }
                    let _ = tx.send(EngineEvent::TrackReceived(info)).await;
                })
            },
        ));

        Ok(Self { peer_connection })
    }
}

fn connection_state(s: RTCPeerConnectionState) -> Option<ConnectionState> {
    match s {
        RTCPeerConnectionState::New => Some(ConnectionState::New),
        RTCPeerConnectionState::Connecting => Some(ConnectionState::Connecting),
        RTCPeerConnectionState::Connected => Some(ConnectionState::Connected),
        RTCPeerConnectionState::Disconnected => Some(ConnectionState::Disconnected),
        RTCPeerConnectionState::Failed => Some(ConnectionState::Failed),
        RTCPeerConnectionState::Closed => Some(ConnectionState::Closed),
        _ => None,
    }
}

#[async_trait]
impl PeerEngine for WebRtcEngine {
    async fn add_stream(&self, stream: &MediaStream) -> Result<()> {
        for track in stream.tracks() {
            let sender = self
                .peer_connection
                .add_track(Arc::clone(track))
                .await
                .context("Failed to add local track")?;

            // RTCP has to be drained for the interceptors to work.
            tokio::spawn(async move {
                let mut buf = vec![0u8; 1500];
                while sender.read(&mut buf).await.is_ok() {}
            });
        }
        Ok(())
    }

    async fn create_offer(&self) -> Result<SessionDescription> {
        let offer = self.peer_connection.create_offer(None).await?;
        self.peer_connection
            .set_local_description(offer.clone())
            .await?;
        Ok(SessionDescription::offer(offer.sdp))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        let answer = self.peer_connection.create_answer(None).await?;
        self.peer_connection
            .set_local_description(answer.clone())
            .await?;
        Ok(SessionDescription::answer(answer.sdp))
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        let desc = match desc.kind {
            SdpKind::Offer => RTCSessionDescription::offer(desc.sdp)?,
            SdpKind::Answer => RTCSessionDescription::answer(desc.sdp)?,
        };
        self.peer_connection.set_remote_description(desc).await?;
        Ok(())
    }

    fn negotiation_state(&self) -> NegotiationState {
        match self.peer_connection.signaling_state() {
            RTCSignalingState::Stable => NegotiationState::Stable,
            RTCSignalingState::HaveLocalOffer => NegotiationState::HaveLocalOffer,
            RTCSignalingState::HaveRemoteOffer => NegotiationState::HaveRemoteOffer,
            RTCSignalingState::Closed => NegotiationState::Closed,
            _ => NegotiationState::Other,
        }
    }

    async fn add_remote_candidate(&self, candidate: IceCandidate) -> Result<()> {
        let init: RTCIceCandidateInit = serde_json::from_value(candidate.into_value())
            .context("Failed to parse ICE candidate JSON")?;
        self.peer_connection.add_ice_candidate(init).await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.peer_connection.close().await?;
        Ok(())
    }
}

/// Creates real WebRTC peer connections.
#[derive(Clone, Default)]
pub struct WebRtcEngineFactory {
    config: EngineConfig,
    track_sink: Option<TrackSink>,
}

impl WebRtcEngineFactory {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            track_sink: None,
        }
    }

    pub fn with_track_sink(mut self, sink: TrackSink) -> Self {
        self.track_sink = Some(sink);
        self
    }
}

#[async_trait]
impl PeerEngineFactory for WebRtcEngineFactory {
    async fn create(&self, events: mpsc::Sender<EngineEvent>) -> Result<Box<dyn PeerEngine>> {
        let engine =
            WebRtcEngine::new(self.config.clone(), events, self.track_sink.clone()).await?;
        Ok(Box::new(engine))
    }
}

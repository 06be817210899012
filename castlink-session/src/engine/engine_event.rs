use castlink_core::IceCandidate;

/// Aggregate connection state as reported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

/// Offer/answer progress of the engine, used to guard remote descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationState {
    Stable,
    HaveLocalOffer,
    HaveRemoteOffer,
    Closed,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTrackInfo {
    pub id: String,
    pub kind: String,
}

/// Events the engine pushes into the coordinator loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// A locally gathered candidate. `None` marks the end of gathering.
    LocalCandidate(Option<IceCandidate>),

    StateChanged(ConnectionState),

    /// A remote media track arrived.
    TrackReceived(RemoteTrackInfo),
}

use std::sync::Arc;
use tokio::sync::{oneshot, watch};
use webrtc::track::track_local::TrackLocal;

pub type LocalTrack = Arc<dyn TrackLocal + Send + Sync>;

/// Local capture handed to the session. Dropping or stopping it releases the
/// capture on the producer side.
pub struct MediaStream {
    tracks: Vec<LocalTrack>,
    ended_rx: Option<oneshot::Receiver<()>>,
    stop_tx: watch::Sender<bool>,
}

/// Producer half of a [`MediaStream`], held by whatever feeds the tracks.
pub struct CaptureControl {
    ended_tx: Option<oneshot::Sender<()>>,
    stop_rx: watch::Receiver<bool>,
}

impl MediaStream {
    pub fn new(tracks: Vec<LocalTrack>) -> (MediaStream, CaptureControl) {
        let (ended_tx, ended_rx) = oneshot::channel();
        let (stop_tx, stop_rx) = watch::channel(false);
        (
            MediaStream {
                tracks,
                ended_rx: Some(ended_rx),
                stop_tx,
            },
            CaptureControl {
                ended_tx: Some(ended_tx),
                stop_rx,
            },
        )
    }

    pub fn tracks(&self) -> &[LocalTrack] {
        &self.tracks
    }

    /// Resolves once the producer calls [`CaptureControl::end`]. Can be taken once.
    pub fn take_ended(&mut self) -> Option<oneshot::Receiver<()>> {
        self.ended_rx.take()
    }

    pub fn stop(&self) {
        self.stop_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_tx.borrow()
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop();
    }
}

impl CaptureControl {
    /// Signals that capture ended outside the session, e.g. the user revoked it.
    pub fn end(&mut self) {
        if let Some(tx) = self.ended_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop_rx.borrow()
    }

    /// Waits until the session releases the capture.
    pub async fn stopped(&mut self) {
        let _ = self.stop_rx.wait_for(|stopped| *stopped).await;
    }
}

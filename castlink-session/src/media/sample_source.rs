use crate::media::{CaptureControl, LocalTrack, MediaSource, MediaStream};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;
use webrtc::api::media_engine::MIME_TYPE_VP8;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

/// Media source backed by an application-driven encoder.
///
/// Every `acquire` creates a fresh track and hands its [`SampleFeed`] to the
/// receiver returned by [`SampleTrackSource::new`].
pub struct SampleTrackSource {
    mime_type: String,
    feeds: mpsc::Sender<SampleFeed>,
}

impl SampleTrackSource {
    pub fn new() -> (Self, mpsc::Receiver<SampleFeed>) {
        Self::with_mime_type(MIME_TYPE_VP8)
    }

    pub fn with_mime_type(mime_type: &str) -> (Self, mpsc::Receiver<SampleFeed>) {
        let (feeds, rx) = mpsc::channel(4);
        (
            Self {
                mime_type: mime_type.to_owned(),
                feeds,
            },
            rx,
        )
    }
}

#[async_trait]
impl MediaSource for SampleTrackSource {
    async fn acquire(&self) -> Result<MediaStream> {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: self.mime_type.clone(),
                ..Default::default()
            },
            "video".to_owned(),
            "castlink".to_owned(),
        ));
        let (stream, control) = MediaStream::new(vec![track.clone() as LocalTrack]);
        self.feeds
            .send(SampleFeed { track, control })
            .await
            .context("capture pipeline is not running")?;
        info!("Acquired {} sample track", self.mime_type);
        Ok(stream)
    }
}

/// Write side of one acquired track.
pub struct SampleFeed {
    track: Arc<TrackLocalStaticSample>,
    control: CaptureControl,
}

impl SampleFeed {
    pub async fn write(&self, data: Bytes, duration: Duration) -> Result<()> {
        if self.control.is_stopped() {
            bail!("capture was released");
        }
        self.track
            .write_sample(&Sample {
                data,
                duration,
                ..Default::default()
            })
            .await?;
        Ok(())
    }

    pub fn is_stopped(&self) -> bool {
        self.control.is_stopped()
    }

    pub async fn stopped(&mut self) {
        self.control.stopped().await
    }

    /// Ends capture from the producer side; the session tears down.
    pub fn end(&mut self) {
        self.control.end();
    }
}

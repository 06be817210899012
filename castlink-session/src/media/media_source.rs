use crate::media::MediaStream;
use anyhow::{Result, bail};
use async_trait::async_trait;

/// Produces the local capture a host session streams.
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self) -> Result<MediaStream>;
}

/// Source for viewer-only deployments; hosting always fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCapture;

#[async_trait]
impl MediaSource for NoCapture {
    async fn acquire(&self) -> Result<MediaStream> {
        bail!("no capture source configured")
    }
}

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;

use crate::voice::VoiceBinding;

/// External speech-synthesis capability. Audio bytes are opaque; the
/// dispatcher treats any error as a per-segment failure, never as a
/// reason to abort a batch.
#[async_trait]
pub trait Synthesizer: std::fmt::Debug + Send + Sync {
    async fn synthesize(&self, binding: &VoiceBinding, text: &str) -> Result<Bytes>;
}

use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use tap::TapFallible;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::audio;
use crate::dispatch::SynthesisResult;
use crate::effects;
use crate::script::{Segment, SegmentKind};

/// Fixed gap between consecutive segments, for perceptual separation.
pub const SEGMENT_PAUSE: Duration = Duration::from_millis(300);

/// Presentation target for an ordered segment sequence. `speech` and
/// `effect` return once the clip has fully been presented; the session
/// owns ordering and pacing, the sink owns rendering.
#[async_trait]
pub trait AudioSink: Send {
    /// Opaque encoded speech audio (MP3 from the synthesis capability).
    async fn speech(&mut self, audio: &[u8]) -> Result<()>;

    /// Raw mono PCM from the local effect generators.
    async fn effect(&mut self, samples: &[i16], sample_rate: u32) -> Result<()>;

    async fn pause(&mut self, duration: Duration) -> Result<()>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Playing(usize),
    Aborted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Finished,
    Aborted,
}

#[derive(Debug)]
pub struct AbortHandle(watch::Sender<bool>);

impl AbortHandle {
    /// Stops the currently sounding segment and suppresses all pending
    /// segment advances. Idempotent.
    pub fn abort(&self) {
        let _ = self.0.send(true);
    }
}

/// One playback session: owns at most one in-flight sink call at a time
/// and advances strictly by ascending segment index.
#[derive(Debug)]
pub struct PlaybackSession {
    state: SessionState,
    abort: watch::Receiver<bool>,
}

impl PlaybackSession {
    pub fn new() -> (Self, AbortHandle) {
        let (tx, rx) = watch::channel(false);

        (
            Self {
                state: SessionState::Idle,
                abort: rx,
            },
            AbortHandle(tx),
        )
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Presents the synthesis results in segment order. Failed or empty
    /// speech segments are skipped as zero-duration; a sink error on one
    /// segment is logged and skipped. The one hard error is a
    /// segment/result length mismatch.
    pub async fn play<S: AudioSink>(
        &mut self,
        segments: &[Segment],
        results: &[SynthesisResult],
        sink: &mut S,
    ) -> Result<Completion> {
        if segments.len() != results.len() {
            bail!(
                "Segment/result count mismatch: {} segments, {} results",
                segments.len(),
                results.len()
            );
        }

        for (index, (segment, result)) in segments.iter().zip(results).enumerate() {
            if *self.abort.borrow() {
                self.state = SessionState::Aborted;
                return Ok(Completion::Aborted);
            }

            self.state = SessionState::Playing(index);

            // Abort drops the in-flight sink future, releasing the clip
            // immediately.
            let aborted = tokio::select! {
                _ = self.abort.changed() => true,
                presented = present(segment, result, sink) => {
                    let _ = presented
                        .tap_err(|e| warn!(segment = index, "presentation failed, skipping: {e:#}"));
                    false
                }
            };

            if aborted {
                self.state = SessionState::Aborted;
                return Ok(Completion::Aborted);
            }

            if index + 1 < segments.len() {
                let aborted = tokio::select! {
                    _ = self.abort.changed() => true,
                    paused = sink.pause(SEGMENT_PAUSE) => {
                        let _ = paused.tap_err(|e| warn!("pause failed: {e:#}"));
                        false
                    }
                };

                if aborted {
                    self.state = SessionState::Aborted;
                    return Ok(Completion::Aborted);
                }
            }
        }

        self.state = SessionState::Idle;
        debug!(segments = segments.len(), "playback finished");

        Ok(Completion::Finished)
    }
}

async fn present<S: AudioSink>(
    segment: &Segment,
    result: &SynthesisResult,
    sink: &mut S,
) -> Result<()> {
    match segment.kind {
        SegmentKind::SoundEffect => {
            let description = segment.original.as_deref().unwrap_or(&segment.text);
            let samples = effects::render(description, audio::PIPELINE_RATE);

            sink.effect(&samples, audio::PIPELINE_RATE).await
        }
        SegmentKind::Speech => match &result.audio {
            Some(bytes) if !result.failed && !bytes.is_empty() => sink.speech(bytes).await,
            _ => {
                debug!(segment = result.segment_index, "no audio, skipping");
                Ok(())
            }
        },
    }
}

/// Sink that assembles the whole presentation into one WAV artifact:
/// speech is decoded and resampled to the pipeline rate, effects are
/// appended as-is, pauses become silence.
#[derive(Debug, Default)]
pub struct WavCollector {
    samples: Vec<i16>,
}

impl WavCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    pub fn finish(self) -> Result<Vec<u8>> {
        audio::wav_bytes(&self.samples, audio::PIPELINE_RATE)
    }
}

#[async_trait]
impl AudioSink for WavCollector {
    async fn speech(&mut self, audio_bytes: &[u8]) -> Result<()> {
        let (samples, rate) = audio::decode_mp3(audio_bytes, 1.0)?;
        self.samples
            .extend(audio::resample_linear(&samples, rate, audio::PIPELINE_RATE));

        Ok(())
    }

    async fn effect(&mut self, samples: &[i16], sample_rate: u32) -> Result<()> {
        self.samples
            .extend(audio::resample_linear(samples, sample_rate, audio::PIPELINE_RATE));

        Ok(())
    }

    async fn pause(&mut self, duration: Duration) -> Result<()> {
        self.samples
            .extend(audio::silence(duration, audio::PIPELINE_RATE));

        Ok(())
    }
}

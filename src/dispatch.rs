use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as base64_engine, Engine as _};
use bytes::Bytes;
use futures::future::join_all;
use serde::Serialize;
use tap::TapFallible;
use tracing::{debug, warn};

use crate::script::Segment;
use crate::tts::Synthesizer;
use crate::voice;

/// Outcome of one segment's synthesis attempt. Failures are data, not
/// exceptions; exactly one result exists per input segment, in order.
#[derive(Clone, Debug, PartialEq)]
pub struct SynthesisResult {
    pub segment_index: usize,
    pub audio: Option<Bytes>,
    /// Distinguishes a real failure from intentionally absent audio
    /// (sound-effect segments defer to local generation).
    pub failed: bool,
}

impl SynthesisResult {
    fn success(segment_index: usize, audio: Bytes) -> Self {
        Self {
            segment_index,
            audio: Some(audio),
            failed: false,
        }
    }

    fn empty(segment_index: usize) -> Self {
        Self {
            segment_index,
            audio: None,
            failed: false,
        }
    }

    fn failure(segment_index: usize) -> Self {
        Self {
            segment_index,
            audio: None,
            failed: true,
        }
    }

    pub fn has_audio(&self) -> bool {
        self.audio.as_ref().is_some_and(|audio| !audio.is_empty())
    }
}

/// Synthesizes every speech segment with one model, concurrently, and
/// returns results in segment order. A single segment's failure never
/// aborts the batch.
pub async fn synthesize_segments(
    synth: &dyn Synthesizer,
    segments: &[Segment],
    cloned_voice_id: &str,
    model_id: &str,
) -> Vec<SynthesisResult> {
    let calls = segments.iter().enumerate().map(|(index, segment)| async move {
        if segment.is_effect() {
            // Handled downstream by the local generation path.
            return SynthesisResult::empty(index);
        }

        let binding = voice::resolve(segment.character, cloned_voice_id, model_id);

        match synth
            .synthesize(&binding, &segment.text)
            .await
            .tap_err(|e| warn!(model_id, segment = index, "synthesis failed: {e:#}"))
        {
            Ok(audio) => SynthesisResult::success(index, audio),
            Err(_) => SynthesisResult::failure(index),
        }
    });

    // join_all yields in input order regardless of completion order.
    join_all(calls).await
}

#[derive(Clone, Debug)]
pub struct ModelReport {
    pub model_id: String,
    pub results: Vec<SynthesisResult>,
}

impl ModelReport {
    fn all_failed(model_id: String, segment_count: usize) -> Self {
        Self {
            model_id,
            results: (0..segment_count).map(SynthesisResult::failure).collect(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.has_audio()).count()
    }

    /// Transport shape: base64 blob per segment (empty string where audio
    /// is absent) plus the segment metadata, mirroring result order.
    pub fn to_response(&self, segments: &[Segment]) -> SynthesisResponse {
        SynthesisResponse {
            success: true,
            model_id: self.model_id.clone(),
            audio_segments: self
                .results
                .iter()
                .map(|r| {
                    r.audio
                        .as_ref()
                        .map_or_else(String::new, |audio| base64_engine.encode(audio))
                })
                .collect(),
            segments_info: segments.to_vec(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct SynthesisResponse {
    pub success: bool,
    pub model_id: String,
    pub audio_segments: Vec<String>,
    pub segments_info: Vec<Segment>,
}

/// Runs one synthesis pass per model, all in parallel, and joins them.
/// One model's failure is isolated: its report carries all-failed entries
/// with the full segment count, and sibling passes are unaffected.
pub async fn test_models(
    synth: Arc<dyn Synthesizer>,
    segments: Arc<[Segment]>,
    cloned_voice_id: &str,
    model_ids: &[&str],
) -> Vec<ModelReport> {
    let handles: Vec<_> = model_ids
        .iter()
        .map(|&model_id| {
            let synth = Arc::clone(&synth);
            let segments = Arc::clone(&segments);
            let cloned_voice_id = cloned_voice_id.to_owned();
            let model_id = model_id.to_owned();

            tokio::spawn(async move {
                debug!(%model_id, "model pass started");
                let results =
                    synthesize_segments(synth.as_ref(), &segments, &cloned_voice_id, &model_id)
                        .await;

                ModelReport { model_id, results }
            })
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());

    for (handle, &model_id) in handles.into_iter().zip(model_ids) {
        match handle.await {
            Ok(report) => reports.push(report),
            Err(e) => {
                warn!(model_id, "model pass died: {e}");
                reports.push(ModelReport::all_failed(model_id.to_owned(), segments.len()));
            }
        }
    }

    reports
}

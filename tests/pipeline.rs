//! End-to-end pipeline test: parse → dispatch → ordered assembly, with a
//! scripted synthesizer standing in for the external capability.

use std::sync::Arc;

use anyhow::{bail, Result};
use async_trait::async_trait;
use bytes::Bytes;

use story_tts::dispatch::{self, SynthesisResult};
use story_tts::playback::{Completion, PlaybackSession, WavCollector, SEGMENT_PAUSE};
use story_tts::script::{self, Character, Segment, SegmentKind};
use story_tts::tts::Synthesizer;
use story_tts::voice::VoiceBinding;
use story_tts::{audio, effects};

const SCRIPT: &str = "[Let vind blæser gennem trætoppene...]\n\
    Narrator: Lille Emma gik langsomt gennem den tykke skov.\n\
    [En svag puslen høres i buskene...]\n\
    Mikkel: \"Hej Emma!\"\n\
    Emma: \"Er det dig, der talte?\"";

/// Returns fake audio bytes, failing every text that contains the marker.
#[derive(Debug)]
struct ScriptedSynth {
    fail_text: Option<&'static str>,
}

#[async_trait]
impl Synthesizer for ScriptedSynth {
    async fn synthesize(&self, binding: &VoiceBinding, text: &str) -> Result<Bytes> {
        if self.fail_text.is_some_and(|marker| text.contains(marker)) {
            bail!("scripted failure");
        }

        Ok(Bytes::from(format!("{}:{}", binding.voice_id, text)))
    }
}

#[tokio::test]
async fn test_parse_and_dispatch_preserve_order_through_failures() {
    let segments = script::parse(SCRIPT);

    let kinds: Vec<SegmentKind> = segments.iter().map(|s| s.kind).collect();
    assert_eq!(
        kinds,
        vec![
            SegmentKind::SoundEffect,
            SegmentKind::Speech,
            SegmentKind::SoundEffect,
            SegmentKind::Speech,
            SegmentKind::Speech,
        ]
    );
    assert_eq!(segments[3].character, Character::Mikkel);

    let synth = ScriptedSynth {
        fail_text: Some("Hej Emma!"),
    };
    let results =
        dispatch::synthesize_segments(&synth, &segments, "cloned-voice", "eleven_turbo_v2_5")
            .await;

    assert_eq!(results.len(), segments.len());
    for (index, result) in results.iter().enumerate() {
        assert_eq!(result.segment_index, index);
    }

    // Effects carry no audio but are not failures.
    assert!(!results[0].failed && results[0].audio.is_none());
    assert!(!results[2].failed && results[2].audio.is_none());
    // Mikkel's line failed; its neighbors did not.
    assert!(results[3].failed);
    assert!(results[1].has_audio());
    assert!(results[4].has_audio());
    // The narrator spoke with the cloned voice.
    assert!(results[1].audio.as_ref().unwrap().starts_with(b"cloned-voice:"));
}

#[tokio::test]
async fn test_multi_model_reports_cover_every_segment() {
    let segments: Arc<[Segment]> = script::parse(SCRIPT).into();
    let synth = Arc::new(ScriptedSynth { fail_text: None });
    let models = ["eleven_turbo_v2_5", "eleven_multilingual_v2"];

    let reports = dispatch::test_models(synth, Arc::clone(&segments), "v", &models).await;

    assert_eq!(reports.len(), 2);
    for (report, model_id) in reports.iter().zip(models) {
        assert_eq!(report.model_id, model_id);
        assert_eq!(report.results.len(), segments.len());
        // Two effect segments are intentionally empty; all speech succeeded.
        assert_eq!(report.succeeded(), 3);
    }
}

#[tokio::test]
async fn test_assembled_artifact_matches_expected_layout() {
    // Fake speech bytes are not decodable MP3, so every speech segment is
    // skipped at the sink; the artifact carries the two effects and the
    // inter-segment pauses.
    let segments = script::parse(SCRIPT);
    let synth = ScriptedSynth { fail_text: None };
    let results =
        dispatch::synthesize_segments(&synth, &segments, "v", "eleven_multilingual_v2").await;

    let (mut session, _abort) = PlaybackSession::new();
    let mut collector = WavCollector::new();
    let completion = session.play(&segments, &results, &mut collector).await.unwrap();

    assert_eq!(completion, Completion::Finished);

    let rate = audio::PIPELINE_RATE;
    let wind = effects::render("Let vind blæser gennem trætoppene...", rate).len();
    let rustle = effects::render("En svag puslen høres i buskene...", rate).len();
    let pause = audio::silence(SEGMENT_PAUSE, rate).len();
    let expected = wind + rustle + pause * 4;

    assert_eq!(collector.sample_count(), expected);

    let wav = collector.finish().unwrap();
    let reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
    assert_eq!(reader.spec().sample_rate, rate);
    assert_eq!(reader.len() as usize, expected);
}

#[tokio::test]
async fn test_artifact_skips_failed_segments_entirely() {
    let segments = script::parse("[Vind]\nNarrator: Hej.");
    let results: Vec<SynthesisResult> = vec![
        SynthesisResult {
            segment_index: 0,
            audio: None,
            failed: false,
        },
        SynthesisResult {
            segment_index: 1,
            audio: None,
            failed: true,
        },
    ];

    let (mut session, _abort) = PlaybackSession::new();
    let mut collector = WavCollector::new();
    session.play(&segments, &results, &mut collector).await.unwrap();

    let rate = audio::PIPELINE_RATE;
    let expected = effects::render("Vind", rate).len() + audio::silence(SEGMENT_PAUSE, rate).len();
    assert_eq!(collector.sample_count(), expected);
}

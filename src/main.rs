use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use story_tts::config;
use story_tts::dispatch;
use story_tts::elevenlabs::ElevenLabs;
use story_tts::playback::{PlaybackSession, WavCollector};
use story_tts::script::{self, Segment};
use story_tts::voice::Model;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    config::init().with_context(|| {
        "Configuration is incomplete; ELEVENLABS_API_KEY must be set"
    })?;
    let config = config::get();

    let mut args = std::env::args().skip(1);
    let script_path = args
        .next()
        .map(PathBuf::from)
        .context("Usage: story-tts <script-file> [out.wav]")?;
    let out_path = args.next().map_or_else(|| PathBuf::from("story.wav"), PathBuf::from);

    let text = std::fs::read_to_string(&script_path)
        .with_context(|| format!("Failed to read {}", script_path.display()))?;
    let segments: Arc<[Segment]> = script::parse(&text).into();
    info!(segments = segments.len(), "script parsed");

    let synth = ElevenLabs::from_config(config)?;
    let cloned_voice_id = config
        .cloned_voice_id
        .clone()
        .context("CLONED_VOICE_ID is not set; clone a voice first")?;

    let model_ids: Vec<&str> = Model::ALL.iter().map(|model| model.id()).collect();
    let reports = dispatch::test_models(
        Arc::new(synth),
        Arc::clone(&segments),
        &cloned_voice_id,
        &model_ids,
    )
    .await;

    for report in &reports {
        info!(
            model = %report.model_id,
            ok = report.succeeded(),
            total = report.results.len(),
            "model pass finished"
        );
    }

    // Assemble the artifact from the best pass.
    let best = reports
        .iter()
        .max_by_key(|report| report.succeeded())
        .context("No models requested")?;
    if best.succeeded() == 0 {
        warn!("no segment synthesized successfully; the artifact will carry effects only");
    }

    let (mut session, abort) = PlaybackSession::new();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort.abort();
        }
    });

    let mut collector = WavCollector::new();
    session.play(&segments, &best.results, &mut collector).await?;

    std::fs::write(&out_path, collector.finish()?)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    info!(artifact = %out_path.display(), "artifact written");

    let responses: Vec<_> = reports
        .iter()
        .map(|report| report.to_response(&segments))
        .collect();
    let report_path = out_path.with_extension("json");
    std::fs::write(&report_path, serde_json::to_vec_pretty(&responses)?)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;
    info!(report = %report_path.display(), "per-model report written");

    Ok(())
}

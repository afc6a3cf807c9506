use std::io::Cursor;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

/// Sample rate the assembled presentation is normalized to. Synthesized
/// speech is decoded and resampled here; local effects render at this
/// rate directly.
pub const PIPELINE_RATE: u32 = 24_000;

/// Decodes MP3 bytes to mono 16-bit PCM, returning the samples and their
/// native sample rate. Decode errors on individual packets are skipped;
/// an IO error marks the end of the stream.
pub fn decode_mp3(data: &[u8], gain: f32) -> Result<(Vec<i16>, u32)> {
    use symphonia::core::audio::{AudioBufferRef, Signal};
    use symphonia::core::codecs::DecoderOptions;
    use symphonia::core::formats::FormatOptions;
    use symphonia::core::io::{MediaSourceStream, MediaSourceStreamOptions};
    use symphonia::core::meta::MetadataOptions;
    use symphonia::core::probe::Hint;

    let mss = MediaSourceStream::new(
        Box::new(Cursor::new(data.to_vec())),
        MediaSourceStreamOptions::default(),
    );
    let mut hint = Hint::new();
    hint.with_extension("mp3");

    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("No audio track found"))?;
    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    let track_id = track.id;
    let sample_rate = track.codec_params.sample_rate.unwrap_or(PIPELINE_RATE);
    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(_)) => break, // End of stream
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => match decoded {
                AudioBufferRef::F32(buf) => {
                    for &sample in buf.chan(0) {
                        let sample = sample * gain * f32::from(i16::MAX);
                        let sample = sample.min(f32::from(i16::MAX)).max(f32::from(i16::MIN));

                        #[allow(clippy::cast_possible_truncation)]
                        samples.push(sample as i16);
                    }
                }
                AudioBufferRef::S16(buf) => {
                    for &sample in buf.chan(0) {
                        let sample = f32::from(sample) * gain;
                        let sample = sample.min(f32::from(i16::MAX)).max(f32::from(i16::MIN));

                        #[allow(clippy::cast_possible_truncation)]
                        samples.push(sample as i16);
                    }
                }
                _ => anyhow::bail!("Unsupported audio format"),
            },
            Err(symphonia::core::errors::Error::IoError(_)) => break,
            Err(symphonia::core::errors::Error::DecodeError(_)) => {} // Skip decode errors
            Err(e) => return Err(e.into()),
        }
    }

    Ok((samples, sample_rate))
}

/// Linear-interpolation resampler, mono. Identity when the rates match.
pub fn resample_linear(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let out_len = (samples.len() as u64 * u64::from(to_rate) / u64::from(from_rate)) as usize;
    let last = samples.len() - 1;

    (0..out_len)
        .map(|i| {
            let pos = i as f64 * f64::from(from_rate) / f64::from(to_rate);

            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let index = (pos as usize).min(last);
            let frac = pos - index as f64;

            let a = f64::from(samples[index]);
            let b = f64::from(samples[(index + 1).min(last)]);

            #[allow(clippy::cast_possible_truncation)]
            {
                (a + (b - a) * frac) as i16
            }
        })
        .collect()
}

pub fn silence(duration: Duration, sample_rate: u32) -> Vec<i16> {
    vec![0; (sample_rate as f32 * duration.as_secs_f32()) as usize]
}

/// Encodes mono 16-bit PCM as an in-memory WAV file.
pub fn wav_bytes(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer =
        hound::WavWriter::new(&mut cursor, spec).with_context(|| "Failed to create wav")?;

    for &sample in samples {
        writer
            .write_sample(sample)
            .with_context(|| "Failed to write sample")?;
    }

    writer
        .finalize()
        .with_context(|| "Failed to finalize wav file")?;

    Ok(cursor.into_inner())
}

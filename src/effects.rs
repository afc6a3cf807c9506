use std::f32::consts::TAU;
use std::time::Duration;

/// Which local generator a sound-effect description maps to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EffectKind {
    Wind,
    Rustling,
    Birds,
    Ambient,
}

// Evaluated top to bottom; the first entry whose keyword appears in the
// lowercased description wins. Anything unmatched falls back to Ambient.
static KEYWORDS: &[(&[&str], EffectKind)] = &[
    (&["vind"], EffectKind::Wind),
    (&["puslen", "buske"], EffectKind::Rustling),
    (&["fugle"], EffectKind::Birds),
];

impl EffectKind {
    pub fn duration(self) -> Duration {
        match self {
            Self::Wind => Duration::from_millis(2000),
            Self::Rustling => Duration::from_millis(1500),
            Self::Birds => Duration::from_millis(3000),
            Self::Ambient => Duration::from_millis(1000),
        }
    }
}

pub fn select(description: &str) -> EffectKind {
    let description = description.to_lowercase();

    KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|word| description.contains(word)))
        .map_or(EffectKind::Ambient, |&(_, kind)| kind)
}

/// Renders a finite-duration mono PCM clip for a sound-effect description.
pub fn render(description: &str, sample_rate: u32) -> Vec<i16> {
    match select(description) {
        EffectKind::Wind => wind(sample_rate),
        EffectKind::Rustling => rustling(sample_rate),
        EffectKind::Birds => birds(sample_rate),
        EffectKind::Ambient => ambient(sample_rate),
    }
}

fn sample_count(sample_rate: u32, duration: Duration) -> usize {
    (sample_rate as f32 * duration.as_secs_f32()) as usize
}

#[allow(clippy::cast_possible_truncation)]
fn to_i16(value: f32) -> i16 {
    (value * f32::from(i16::MAX)).clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16
}

fn one_pole_alpha(cutoff_hz: f32, sample_rate: u32) -> f32 {
    1.0 - (-TAU * cutoff_hz / sample_rate as f32).exp()
}

// xorshift32; deterministic across runs, no RNG dependency.
struct Noise(u32);

impl Noise {
    fn new() -> Self {
        Self(0x2F6E_2B01)
    }

    fn next(&mut self) -> f32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;

        (self.0 as f32 / u32::MAX as f32) * 2.0 - 1.0
    }
}

/// White noise through a low-pass filter, fading out over the last 500 ms.
fn wind(sample_rate: u32) -> Vec<i16> {
    let len = sample_count(sample_rate, EffectKind::Wind.duration());
    let fade_len = sample_count(sample_rate, Duration::from_millis(500));
    let alpha = one_pole_alpha(200.0, sample_rate);

    let mut noise = Noise::new();
    let mut lowpass = 0.0f32;

    (0..len)
        .map(|i| {
            lowpass += alpha * (noise.next() * 0.1 - lowpass);

            let fade = if i + fade_len >= len {
                (len - i) as f32 / fade_len as f32
            } else {
                1.0
            };

            to_i16(lowpass * 0.3 * 8.0 * fade)
        })
        .collect()
}

/// Gated noise bursts through a high-pass filter.
fn rustling(sample_rate: u32) -> Vec<i16> {
    let len = sample_count(sample_rate, EffectKind::Rustling.duration());
    let alpha = one_pole_alpha(800.0, sample_rate);

    let mut noise = Noise::new();
    let mut lowpass = 0.0f32;

    (0..len)
        .map(|i| {
            let burst = if (i as f32 * 0.01).sin() > 0.7 { 1.0 } else { 0.0 };
            let sample = noise.next() * 0.2 * burst;

            lowpass += alpha * (sample - lowpass);
            let highpassed = sample - lowpass;

            to_i16(highpassed * 0.4 * 4.0)
        })
        .collect()
}

/// Three staggered sine chirps: up-sweep then down-sweep, short decay.
fn birds(sample_rate: u32) -> Vec<i16> {
    let len = sample_count(sample_rate, EffectKind::Birds.duration());
    let chirp_len = sample_count(sample_rate, Duration::from_millis(300));
    let stagger = sample_count(sample_rate, Duration::from_millis(400));

    let mut buffer = vec![0.0f32; len];

    for bird in 0..3u32 {
        let base = 800.0 + bird as f32 * 200.0;
        let start = bird as usize * stagger;
        let mut phase = 0.0f32;

        for i in 0..chirp_len.min(len.saturating_sub(start)) {
            let t = i as f32 / chirp_len as f32;

            // 800 → 1200 over the first third, back down to 600 after.
            let freq = if t < 1.0 / 3.0 {
                base + 400.0 * (t * 3.0)
            } else {
                base + 400.0 - 600.0 * ((t - 1.0 / 3.0) * 1.5)
            };

            phase += TAU * freq / sample_rate as f32;
            let envelope = 0.1 * (1.0 - t).powi(2);

            buffer[start + i] += phase.sin() * envelope;
        }
    }

    buffer.into_iter().map(to_i16).collect()
}

/// Generic fallback: a low sine tone with exponential decay.
fn ambient(sample_rate: u32) -> Vec<i16> {
    let len = sample_count(sample_rate, EffectKind::Ambient.duration());

    let mut phase = 0.0f32;

    (0..len)
        .map(|i| {
            let t = i as f32 / len as f32;

            phase += TAU * 200.0 / sample_rate as f32;
            let envelope = 0.05 * 0.2f32.powf(t);

            to_i16(phase.sin() * envelope)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_selection() {
        assert_eq!(select("Let vind blæser gennem trætoppene"), EffectKind::Wind);
        assert_eq!(select("En svag puslen høres"), EffectKind::Rustling);
        assert_eq!(select("noget rasler i buskene"), EffectKind::Rustling);
        assert_eq!(select("Fugle synger"), EffectKind::Birds);
        assert_eq!(select("En dør knirker"), EffectKind::Ambient);
    }

    #[test]
    fn test_selection_is_case_insensitive() {
        assert_eq!(select("VIND I TRÆERNE"), EffectKind::Wind);
    }

    #[test]
    fn test_ordered_dispatch_first_match_wins() {
        // Contains both a wind and a bird keyword; wind is listed first.
        assert_eq!(select("vind og fugle"), EffectKind::Wind);
    }

    #[test]
    fn test_render_durations() {
        let rate = 24_000;

        for (description, kind) in [
            ("vind", EffectKind::Wind),
            ("puslen", EffectKind::Rustling),
            ("fugle", EffectKind::Birds),
            ("torden", EffectKind::Ambient),
        ] {
            let samples = render(description, rate);
            assert_eq!(samples.len(), sample_count(rate, kind.duration()));
        }
    }

    #[test]
    fn test_render_is_audible_and_deterministic() {
        let first = render("vind", 24_000);
        let second = render("vind", 24_000);

        assert_eq!(first, second);
        assert!(first.iter().any(|&s| s.unsigned_abs() > 100));
    }

    #[test]
    fn test_wind_fades_out() {
        let samples = render("vind", 24_000);
        let tail = &samples[samples.len() - 24..];

        assert!(tail.iter().all(|&s| s.unsigned_abs() < 500));
    }
}

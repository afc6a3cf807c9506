use serde::Serialize;

use crate::script::Character;

// Fixed stock voices so repeated runs of the same script sound stable.
const EMMA_VOICE: &str = "21m00Tcm4TlvDq8ikWAM"; // Rachel, young female
const MIKKEL_VOICE: &str = "AZnzlk1XvdvUeBnXmlld"; // Domi, high-pitched
const EFFECT_VOICE: &str = "9BWtsMINqrJLrRacOk9x"; // Aria, neutral

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Model {
    TurboV25,
    MultilingualV2,
    MonolingualV1,
}

impl Model {
    pub const ALL: [Self; 3] = [Self::TurboV25, Self::MultilingualV2, Self::MonolingualV1];

    pub fn id(self) -> &'static str {
        match self {
            Self::TurboV25 => "eleven_turbo_v2_5",
            Self::MultilingualV2 => "eleven_multilingual_v2",
            Self::MonolingualV1 => "eleven_monolingual_v1",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|model| model.id() == id)
    }

    /// Only the turbo model accepts an explicit language tag.
    fn language_code(self) -> Option<&'static str> {
        (self == Self::TurboV25).then_some("da")
    }

    fn base_settings(self) -> VoiceSettings {
        match self {
            Self::TurboV25 => DEFAULT_SETTINGS,
            Self::MultilingualV2 => VoiceSettings {
                stability: 0.4,
                similarity_boost: 0.9,
                style: 0.3,
                use_speaker_boost: true,
            },
            Self::MonolingualV1 => VoiceSettings {
                stability: 0.6,
                similarity_boost: 0.8,
                style: 0.4,
                use_speaker_boost: true,
            },
        }
    }
}

/// Synthesis knobs in the 0.0–1.0 range, serialized as the wire-level
/// `voice_settings` object.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
}

const DEFAULT_SETTINGS: VoiceSettings = VoiceSettings {
    stability: 0.5,
    similarity_boost: 0.85,
    style: 1.0,
    use_speaker_boost: true,
};

impl VoiceSettings {
    fn clamped(self) -> Self {
        Self {
            stability: self.stability.clamp(0.0, 1.0),
            similarity_boost: self.similarity_boost.clamp(0.0, 1.0),
            style: self.style.clamp(0.0, 1.0),
            use_speaker_boost: self.use_speaker_boost,
        }
    }
}

/// Resolved synthesis identity for one segment. Computed fresh per segment
/// per request, never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct VoiceBinding {
    pub voice_id: String,
    pub model_id: String,
    pub settings: VoiceSettings,
    pub language_code: Option<&'static str>,
}

/// Maps a character and requested model to a concrete voice and parameter
/// set. Pure; always succeeds via fallback defaults.
pub fn resolve(character: Character, cloned_voice_id: &str, model_id: &str) -> VoiceBinding {
    let model = Model::from_id(model_id);
    let base = model.map_or(DEFAULT_SETTINGS, Model::base_settings);

    VoiceBinding {
        voice_id: voice_for(character, cloned_voice_id),
        model_id: model_id.to_owned(),
        settings: adjust(base, character).clamped(),
        language_code: model.and_then(Model::language_code),
    }
}

fn voice_for(character: Character, cloned_voice_id: &str) -> String {
    match character {
        Character::Emma => EMMA_VOICE.to_owned(),
        Character::Mikkel => MIKKEL_VOICE.to_owned(),
        Character::SoundEffect => EFFECT_VOICE.to_owned(),
        // The narrator speaks with the user's cloned voice, and unknown
        // characters fall back to it rather than a random stock voice.
        Character::Narrator | Character::Unknown => cloned_voice_id.to_owned(),
    }
}

fn adjust(base: VoiceSettings, character: Character) -> VoiceSettings {
    match character {
        // Very expressive.
        Character::Emma => VoiceSettings {
            style: (base.style + 0.3).min(1.0),
            ..base
        },
        // Animated and less stable.
        Character::Mikkel => VoiceSettings {
            stability: (base.stability - 0.2).max(0.1),
            style: (base.style + 0.4).min(1.0),
            ..base
        },
        // Calm, flat delivery for spoken effect descriptions.
        Character::SoundEffect => VoiceSettings {
            stability: 0.8,
            style: 0.1,
            ..base
        },
        Character::Narrator | Character::Unknown => base,
    }
}

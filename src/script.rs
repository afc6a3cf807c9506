use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

// Case- and position-sensitive: a label may appear anywhere in the line.
static LABEL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?<label>Narrator|Emma|Mikkel):").unwrap());

/// Marker word prepended to sound-effect descriptions so downstream
/// consumers can tell them apart from speech text.
pub const EFFECT_MARKER: &str = "Lydeffekt";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Character {
    Narrator,
    Emma,
    Mikkel,
    SoundEffect,
    /// Fallback for labels the script vocabulary does not know.
    /// Never produced by the parser; routed to the cloned voice downstream.
    Unknown,
}

impl Character {
    fn from_label(label: &str) -> Self {
        match label {
            "Narrator" => Self::Narrator,
            "Emma" => Self::Emma,
            "Mikkel" => Self::Mikkel,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Narrator => "narrator",
            Self::Emma => "emma",
            Self::Mikkel => "mikkel",
            Self::SoundEffect => "sound_effect",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Speech,
    SoundEffect,
}

/// One atomic unit of parsed script text. Immutable once produced;
/// sequence order is significant and preserved through the whole pipeline.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Segment {
    pub character: Character,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: SegmentKind,
    /// Raw bracketed description, present on sound-effect segments only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original: Option<String>,
}

impl Segment {
    pub fn speech(character: Character, text: impl Into<String>) -> Self {
        debug_assert!(character != Character::SoundEffect);

        Self {
            character,
            text: text.into(),
            kind: SegmentKind::Speech,
            original: None,
        }
    }

    pub fn sound_effect(original: impl Into<String>) -> Self {
        let original = original.into();

        Self {
            character: Character::SoundEffect,
            text: format!("{EFFECT_MARKER}: {original}"),
            kind: SegmentKind::SoundEffect,
            original: Some(original),
        }
    }

    pub fn is_effect(&self) -> bool {
        self.kind == SegmentKind::SoundEffect
    }
}

/// What to do with a line that contains a colon but no recognized label.
/// Dropping matches the observed behavior of user-authored scripts;
/// narrating keeps the text at the cost of misattributing unknown speakers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ColonPolicy {
    #[default]
    Drop,
    Narrate,
}

#[derive(Clone, Copy, Debug)]
pub struct ParserOptions {
    /// Speaker assigned to bare double-quoted dialogue lines.
    pub default_dialogue: Character,
    pub unlabeled_colon: ColonPolicy,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            default_dialogue: Character::Emma,
            unlabeled_colon: ColonPolicy::Drop,
        }
    }
}

/// Parses free-form story text into an ordered segment sequence.
/// Never fails; unrecognized lines are dropped, not rejected.
pub fn parse(text: &str) -> Vec<Segment> {
    parse_with(text, ParserOptions::default())
}

pub fn parse_with(text: &str, options: ParserOptions) -> Vec<Segment> {
    text.lines()
        .filter_map(|line| classify(line.trim(), options))
        .collect()
}

fn classify(line: &str, options: ParserOptions) -> Option<Segment> {
    if line.is_empty() {
        return None;
    }

    if let Some(original) = strip_wrapping(line, '[', ']') {
        return Some(Segment::sound_effect(original));
    }

    if let Some(captures) = LABEL_REGEX.captures(line) {
        let character = Character::from_label(&captures["label"]);
        let rest = LABEL_REGEX.replacen(line, 1, "");
        let rest = rest.trim();

        return (!rest.is_empty()).then(|| Segment::speech(character, rest));
    }

    if let Some(dialogue) = strip_wrapping(line, '"', '"') {
        return Some(Segment::speech(options.default_dialogue, dialogue));
    }

    if !line.contains(':') {
        return Some(Segment::speech(Character::Narrator, line));
    }

    match options.unlabeled_colon {
        ColonPolicy::Drop => None,
        ColonPolicy::Narrate => Some(Segment::speech(Character::Narrator, line)),
    }
}

fn strip_wrapping(line: &str, open: char, close: char) -> Option<&str> {
    (line.len() >= 2 && line.starts_with(open) && line.ends_with(close))
        .then(|| &line[open.len_utf8()..line.len() - close.len_utf8()])
}

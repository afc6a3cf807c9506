//! Script segmentation and multi-voice synthesis pipeline: parses
//! free-form story text into ordered segments, binds each one to a voice
//! and parameter profile, drives per-segment synthesis with failure
//! isolation, and presents the results strictly in order.

#![warn(clippy::pedantic)]

pub mod audio;
pub mod config;
pub mod dispatch;
pub mod effects;
pub mod elevenlabs;
pub mod playback;
pub mod script;
pub mod tts;
pub mod voice;

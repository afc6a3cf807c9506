use anyhow::{anyhow, Result};
use once_cell::sync::OnceCell;
use serde::Deserialize;

static CONFIG: OnceCell<Config> = OnceCell::new();

#[derive(Deserialize, Debug)]
pub struct Config {
    pub elevenlabs_api_key: String,

    #[serde(default = "default_api_base")]
    pub elevenlabs_api_base: String,

    /// The user's cloned voice, used for the narrator and as the fallback
    /// for unknown characters.
    pub cloned_voice_id: Option<String>,

    /// Upper bound on a single synthesis call. One hung call must not
    /// stall a segment forever.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api.elevenlabs.io".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

pub fn init() -> Result<()> {
    if CONFIG.set(envy::from_env()?).is_err() {
        return Err(anyhow!("Failed to set CONFIG"));
    }

    Ok(())
}

pub fn get() -> &'static Config {
    CONFIG.get().unwrap()
}

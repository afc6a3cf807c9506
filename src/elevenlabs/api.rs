use serde::{Deserialize, Serialize};

use crate::voice::VoiceSettings;

#[derive(Serialize, Debug)]
pub struct TtsRequest<'a> {
    pub text: &'a str,
    pub model_id: &'a str,
    pub voice_settings: VoiceSettings,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language_code: Option<&'a str>,
}

structstruck::strike! {
    #[derive(Deserialize, Debug)]
    pub struct ApiError {
        pub detail:
            #[derive(Deserialize, Debug)]
            pub struct ApiErrorDetail {
                pub status: String,
                pub message: String,
            },
    }
}

#[derive(Deserialize, Debug)]
pub struct AddVoiceResponse {
    pub voice_id: String,
}

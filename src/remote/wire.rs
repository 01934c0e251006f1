//! Request/response shapes for the `generateContent` endpoint and the rules
//! that turn a response into an [`EditResult`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EditOptions, EditResult, TargetResolution, NO_IMAGE_REASON};
use crate::codec::{self, ImageEncoding};
use crate::image_state::ImageState;

const RESPONSE_MODALITIES: [&str; 2] = ["IMAGE", "TEXT"];
const FINISH_REASON_STOP: &str = "STOP";

/// Transport-neutral description of one edit call: raw base64 payload,
/// declared MIME type, instruction, model id and an optional size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditWireRequest {
    pub image: InlineData,
    pub instruction: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(default, alias = "mime_type")]
    pub mime_type: String,
    #[serde(default)]
    pub data: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub image_size: TargetResolution,
}

impl EditWireRequest {
    pub fn new(image: &ImageState, instruction: &str, model: &str, options: &EditOptions) -> Self {
        let embeddable = image.display_handle();
        Self {
            image: InlineData {
                mime_type: image.encoding().mime().to_string(),
                data: codec::strip_embedding_prefix(embeddable.as_str()).to_string(),
            },
            instruction: instruction.to_string(),
            model: model.to_string(),
            image_config: options
                .effective_resolution()
                .map(|image_size| ImageConfig { image_size }),
        }
    }

    pub fn to_generate_content(&self) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![
                    RequestPart::Inline {
                        inline_data: self.image.clone(),
                    },
                    RequestPart::Text {
                        text: self.instruction.clone(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_modalities: RESPONSE_MODALITIES.to_vec(),
                image_config: self.image_config,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<RequestContent>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestContent {
    pub role: &'static str,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RequestPart {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerateContentResponse {
    pub candidates: Vec<Candidate>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CandidateContent {
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponsePart {
    pub text: Option<String>,
    #[serde(alias = "inline_data")]
    pub inline_data: Option<InlineData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .iter()
            .filter_map(|candidate| candidate.content.as_ref())
            .flat_map(|content| content.parts.iter())
    }
}

/// Applies the response rules:
/// an image part wins; otherwise the first text part is the failure reason;
/// otherwise a block or finish reason; otherwise a generic "no image".
pub fn normalize_response(
    response: &GenerateContentResponse,
    instruction: &str,
    completed_at: DateTime<Utc>,
) -> EditResult {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|feedback| feedback.block_reason.as_deref())
    {
        return EditResult::failure(format!("request blocked by the model: {reason}"));
    }

    let inline = response
        .parts()
        .filter_map(|part| part.inline_data.as_ref())
        .find(|inline| !inline.data.trim().is_empty());
    if let Some(inline) = inline {
        return match decode_inline_image(inline) {
            Some(image) => EditResult::Success {
                image,
                instruction: instruction.to_string(),
                completed_at,
            },
            None => EditResult::failure(NO_IMAGE_REASON),
        };
    }

    let text = response
        .parts()
        .filter_map(|part| part.text.as_deref())
        .map(str::trim)
        .find(|text| !text.is_empty());
    if let Some(text) = text {
        return EditResult::failure(text);
    }

    let stopped = response
        .candidates
        .iter()
        .filter_map(|candidate| candidate.finish_reason.as_deref())
        .find(|reason| *reason != FINISH_REASON_STOP);
    match stopped {
        Some(reason) => EditResult::failure(format!("generation stopped: {reason}")),
        None => EditResult::failure(NO_IMAGE_REASON),
    }
}

fn decode_inline_image(inline: &InlineData) -> Option<ImageState> {
    let bytes = match codec::decode_base64(&inline.data) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%err, "model image payload is not valid base64");
            return None;
        }
    };
    let declared = ImageEncoding::from_mime(&inline.mime_type).unwrap_or(ImageEncoding::Png);
    match ImageState::from_encoded(bytes, declared) {
        Ok(image) => Some(image),
        Err(err) => {
            tracing::warn!(%err, mime = %inline.mime_type, "model image payload is not decodable");
            None
        }
    }
}

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::api::client::{authorize, read_success_body, Endpoint};
use crate::api::{ApiError, ChatRequest};
use crate::utils::url::construct_api_url;

const CHAT_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Deserialize)]
struct CompletionBody {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

/// Fields are read loosely; a wrongly typed `message` must not hide a usable
/// `text`.
#[derive(Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    message: Option<Value>,
    #[serde(default)]
    text: Option<Value>,
}

impl CompletionChoice {
    fn content(&self) -> Option<&str> {
        self.message.as_ref()?.get("content")?.as_str()
    }

    fn text(&self) -> Option<&str> {
        self.text.as_ref()?.as_str()
    }
}

/// `POST {base}v1/chat/completions` and return the reply text.
pub async fn chat_completion(
    client: &reqwest::Client,
    endpoint: &Endpoint,
    request: &ChatRequest,
) -> Result<String, ApiError> {
    let chat_url = construct_api_url(&endpoint.base_url, "v1/chat/completions");
    debug!(
        url = %chat_url,
        model = %request.model,
        messages = request.messages.len(),
        "requesting chat completion"
    );

    let http_request = client
        .post(chat_url)
        .header("Content-Type", "application/json")
        .timeout(CHAT_TIMEOUT)
        .json(request);
    let response = authorize(http_request, &endpoint.api_key).send().await?;
    let body = read_success_body(response).await?;
    parse_completion_body(&body)
}

/// Reads `choices[0].message.content`, falling back to `choices[0].text`.
///
/// A non-empty message content wins; otherwise `text` is used when present,
/// and an explicitly empty content is returned as-is. Anything else is a
/// malformed response.
pub fn parse_completion_body(body: &str) -> Result<String, ApiError> {
    let parsed: CompletionBody = serde_json::from_str(body)
        .map_err(|err| ApiError::malformed(format!("invalid completion body ({err})")))?;

    let first = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::malformed("response contained no choices"))?;

    match (first.content(), first.text()) {
        (Some(content), _) if !content.is_empty() => Ok(content.to_string()),
        (_, Some(text)) => Ok(text.to_string()),
        (Some(content), None) => Ok(content.to_string()),
        (None, None) => Err(ApiError::malformed(
            "first choice has neither message.content nor text",
        )),
    }
}

use std::collections::HashSet;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::api::client::{authorize, read_success_body, Endpoint};
use crate::api::{ApiError, ModelInfo};
use crate::utils::url::construct_api_url;

const MODELS_TIMEOUT: Duration = Duration::from_secs(20);

/// Accepted shapes of a models-list body, tried in order.
#[derive(Deserialize)]
#[serde(untagged)]
enum ModelsBody {
    Wrapped { data: Vec<ModelEntry> },
    Bare(Vec<ModelEntry>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ModelEntry {
    Object {
        #[serde(default)]
        id: Option<serde_json::Value>,
        #[serde(default)]
        name: Option<serde_json::Value>,
    },
    Id(String),
    Other(serde::de::IgnoredAny),
}

impl ModelEntry {
    fn into_id(self) -> Option<String> {
        let non_empty = |value: Option<serde_json::Value>| match value {
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => Some(s),
            _ => None,
        };
        match self {
            ModelEntry::Object { id, name } => non_empty(id).or_else(|| non_empty(name)),
            ModelEntry::Id(id) if !id.trim().is_empty() => Some(id),
            ModelEntry::Id(_) | ModelEntry::Other(_) => None,
        }
    }
}

/// `GET {base}v1/models`, parsed into model ids in first-seen order.
pub async fn fetch_models(
    client: &reqwest::Client,
    endpoint: &Endpoint,
) -> Result<Vec<ModelInfo>, ApiError> {
    let models_url = construct_api_url(&endpoint.base_url, "v1/models");
    debug!(url = %models_url, "fetching models");

    let request = client.get(models_url).timeout(MODELS_TIMEOUT);
    let response = authorize(request, &endpoint.api_key).send().await?;
    let body = read_success_body(response).await?;
    parse_models_body(&body)
}

/// Extracts model ids from either `{"data": [...]}` or a top-level array.
///
/// Objects contribute their `id`, falling back to `name`; bare strings are
/// taken as ids; anything else is skipped. Duplicates keep their first
/// position.
pub fn parse_models_body(body: &str) -> Result<Vec<ModelInfo>, ApiError> {
    let parsed: ModelsBody = serde_json::from_str(body).map_err(|err| {
        ApiError::malformed(format!(
            "expected a `data` array or a top-level array of models ({err})"
        ))
    })?;

    let entries = match parsed {
        ModelsBody::Wrapped { data } => data,
        ModelsBody::Bare(entries) => entries,
    };

    Ok(dedupe_model_ids(
        entries.into_iter().filter_map(ModelEntry::into_id),
    ))
}

pub fn dedupe_model_ids<I>(ids: I) -> Vec<ModelInfo>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .map(ModelInfo::new)
        .collect()
}

/// Case-insensitive substring filter over model ids. An empty query matches
/// everything.
pub fn filter_models<'a>(models: &'a [ModelInfo], query: &str) -> Vec<&'a ModelInfo> {
    let needle = query.trim().to_lowercase();
    models
        .iter()
        .filter(|model| needle.is_empty() || model.id.to_lowercase().contains(&needle))
        .collect()
}

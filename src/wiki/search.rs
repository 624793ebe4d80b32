use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::core::config::settings::SearchSettings;
use crate::core::errors::ApiError;

// The search API rejects anonymous clients with 403, so identify ourselves.
const API_USER_AGENT: &str = "wiki-assistant/0.1 (https://github.com/wiki-assistant)";

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Client for the MediaWiki search API.
pub struct WikiSearchClient {
    client: Client,
    default_language: String,
    top_k: usize,
}

impl WikiSearchClient {
    pub fn new(settings: &SearchSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(API_USER_AGENT)
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            client,
            default_language: settings.language.clone(),
            top_k: settings.top_k.max(1),
        })
    }

    /// Search for pages matching `query` and return their article URLs,
    /// best match first. No matches is a normal empty result.
    pub async fn search(
        &self,
        query: &str,
        language: Option<&str>,
    ) -> Result<Vec<String>, ApiError> {
        let language = validate_language(language.unwrap_or(&self.default_language))?;

        let url = format!(
            "https://{}.wikipedia.org/w/api.php?action=query&list=search&srsearch={}&format=json&srlimit={}",
            language,
            urlencoding::encode(query),
            self.top_k
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ApiError::SearchFailed(format!("{query:?}: {e}")))?;

        if !response.status().is_success() {
            return Err(ApiError::SearchFailed(format!(
                "{query:?}: status {}",
                response.status()
            )));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| ApiError::SearchFailed(format!("{query:?}: {e}")))?;

        Ok(page_urls_from_response(&payload, language))
    }
}

// The language lands in a hostname; anything but a plain subdomain label
// is rejected.
fn validate_language(language: &str) -> Result<&str, ApiError> {
    if !language.is_empty()
        && language
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        Ok(language)
    } else {
        Err(ApiError::InvalidParameter(format!(
            "invalid language code: {language:?}"
        )))
    }
}

fn page_urls_from_response(payload: &Value, language: &str) -> Vec<String> {
    let results = payload
        .get("query")
        .and_then(|v| v.get("search"))
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default();

    results
        .iter()
        .filter_map(|result| result.get("title").and_then(|v| v.as_str()))
        .map(|title| {
            format!(
                "https://{}.wikipedia.org/wiki/{}",
                language,
                title.replace(' ', "_")
            )
        })
        .collect()
}

use std::time::Duration;

use reqwest::{Client, Url};
use scraper::{Html, Selector};

use crate::core::config::settings::FetcherSettings;
use crate::core::errors::ApiError;

// Wikipedia serves a reduced page to clients without a browser-style agent.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0";

/// Fetches a page and reduces it to paragraph text.
pub struct PageFetcher {
    client: Client,
    max_attempts: u32,
}

impl PageFetcher {
    pub fn new(settings: &FetcherSettings) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            client,
            max_attempts: settings.max_attempts.max(1),
        })
    }

    /// Fetch `url` and return its `<p>` text, newline-joined with blank
    /// paragraphs dropped. A failed request against a Wikipedia host gets
    /// exactly one more try against the mobile subdomain before the
    /// original failure is surfaced.
    pub async fn fetch_text(&self, url: &str) -> Result<String, ApiError> {
        let parsed = Url::parse(url)
            .map_err(|e| ApiError::FetchFailed(format!("invalid URL {url}: {e}")))?;

        let body = match self.fetch_html(&parsed).await {
            Ok(body) => body,
            Err(primary_err) => {
                let Some(mobile) = mobile_variant(&parsed) else {
                    return Err(primary_err);
                };
                tracing::debug!("Retrying {} via mobile variant {}", parsed, mobile);
                match self.fetch_html(&mobile).await {
                    Ok(body) => body,
                    Err(_) => return Err(primary_err),
                }
            }
        };

        extract_paragraphs(&body)
    }

    async fn fetch_html(&self, url: &Url) -> Result<String, ApiError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        return Err(ApiError::FetchFailed(format!(
                            "{url}: status {status}"
                        )));
                    }
                    return response
                        .text()
                        .await
                        .map_err(|e| ApiError::FetchFailed(format!("{url}: {e}")));
                }
                Err(err) if attempt < self.max_attempts && is_transient(&err) => {
                    tracing::debug!("Attempt {} for {} failed: {}; retrying", attempt, url, err);
                }
                Err(err) => {
                    return Err(ApiError::FetchFailed(format!("{url}: {err}")));
                }
            }
        }
    }
}

fn is_transient(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect()
}

/// Mobile-subdomain variant of a Wikipedia URL, e.g.
/// `en.wikipedia.org` -> `en.m.wikipedia.org`. Hosts that are not a plain
/// language subdomain of wikipedia.org (including already-mobile ones) get
/// no variant.
fn mobile_variant(url: &Url) -> Option<Url> {
    let host = url.host_str()?;
    let language = host.strip_suffix(".wikipedia.org")?;
    if language.is_empty() || language.contains('.') {
        return None;
    }

    let mut mobile = url.clone();
    mobile
        .set_host(Some(&format!("{language}.m.wikipedia.org")))
        .ok()?;
    Some(mobile)
}

fn extract_paragraphs(html: &str) -> Result<String, ApiError> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("p").map_err(|e| ApiError::Internal(e.to_string()))?;

    let mut paragraphs = Vec::new();
    for element in document.select(&selector) {
        let text: String = element.text().collect();
        if !text.trim().is_empty() {
            paragraphs.push(text);
        }
    }

    Ok(paragraphs.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(url: &str) -> Option<String> {
        mobile_variant(&Url::parse(url).expect("valid url")).map(|u| u.to_string())
    }

    #[test]
    fn wikipedia_host_gets_mobile_variant() {
        assert_eq!(
            variant("https://en.wikipedia.org/wiki/Rust_(programming_language)"),
            Some("https://en.m.wikipedia.org/wiki/Rust_(programming_language)".to_string())
        );
        assert_eq!(
            variant("https://de.wikipedia.org/wiki/Berlin"),
            Some("https://de.m.wikipedia.org/wiki/Berlin".to_string())
        );
    }

    #[test]
    fn mobile_host_gets_no_second_fallback() {
        assert_eq!(variant("https://en.m.wikipedia.org/wiki/Rust"), None);
    }

    #[test]
    fn non_wiki_hosts_get_no_fallback() {
        assert_eq!(variant("https://example.com/article"), None);
        assert_eq!(variant("https://wikipedia.org/"), None);
    }

    #[test]
    fn paragraph_extraction_joins_non_blank_paragraphs() {
        let html = r#"
            <html><body>
                <h1>Title</h1>
                <p>First paragraph.</p>
                <p>   </p>
                <div><p>Second paragraph.</p></div>
                <script>var x = 1;</script>
            </body></html>
        "#;
        let text = extract_paragraphs(html).expect("extraction should work");
        assert_eq!(text, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn page_without_paragraphs_yields_empty_text() {
        let text = extract_paragraphs("<html><body><h1>Only a title</h1></body></html>")
            .expect("extraction should work");
        assert!(text.is_empty());
    }
}

// OMDb title lookup service
// API Documentation: https://www.omdbapi.com/

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const OMDB_API_BASE: &str = "https://www.omdbapi.com/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Outcome of a title lookup, separating "nothing by that name" from "the
/// configured key is bad". The latter is admin-actionable and surfaced
/// differently.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LookupOutcome {
    Found(String),
    NotFound,
    InvalidKey,
}

/// OMDb response envelope. Failures come back as `Response: "False"` with a
/// human-readable `Error` instead of an HTTP error status.
#[derive(Debug, Deserialize)]
pub struct LookupResponse {
    #[serde(rename = "Response")]
    pub response: String,
    #[serde(rename = "imdbID")]
    pub imdb_id: Option<String>,
    #[serde(rename = "Error")]
    pub error: Option<String>,
}

/// OMDb API client
pub struct OmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OmdbClient {
    pub fn new(api_key: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key,
            base_url: OMDB_API_BASE.to_string(),
        }
    }

    /// Resolve a free-text title to an IMDb id. Transport failures degrade to
    /// NotFound; only an explicit key rejection from the service reports
    /// InvalidKey.
    pub async fn lookup_title(&self, query: &str) -> LookupOutcome {
        let url = format!(
            "{}?t={}&apikey={}",
            self.base_url,
            urlencoding::encode(query),
            self.api_key
        );

        match self.fetch(&url).await {
            Ok(body) => interpret(&body),
            Err(e) => {
                tracing::warn!("OMDb lookup for '{}' failed: {:#}", query, e);
                LookupOutcome::NotFound
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<LookupResponse> {
        self.client
            .get(url)
            .send()
            .await
            .context("Failed to reach OMDb")?
            .json()
            .await
            .context("Failed to parse OMDb response")
    }
}

/// Map the OMDb envelope onto an outcome. Key problems are flagged by an
/// `Error` mentioning "API key"; every other failure is a plain miss.
pub fn interpret(body: &LookupResponse) -> LookupOutcome {
    if body.response == "True" {
        return match body.imdb_id.clone() {
            Some(id) => LookupOutcome::Found(id),
            None => LookupOutcome::NotFound,
        };
    }

    match body.error.as_deref() {
        Some(msg) if msg.contains("API key") => LookupOutcome::InvalidKey,
        _ => LookupOutcome::NotFound,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(response: &str, imdb_id: Option<&str>, error: Option<&str>) -> LookupResponse {
        LookupResponse {
            response: response.to_string(),
            imdb_id: imdb_id.map(|s| s.to_string()),
            error: error.map(|s| s.to_string()),
        }
    }

    #[test]
    fn test_interpret_found() {
        let body = response("True", Some("tt1375666"), None);
        assert_eq!(
            interpret(&body),
            LookupOutcome::Found("tt1375666".to_string())
        );
    }

    #[test]
    fn test_interpret_not_found() {
        let body = response("False", None, Some("Movie not found!"));
        assert_eq!(interpret(&body), LookupOutcome::NotFound);
    }

    #[test]
    fn test_interpret_invalid_key() {
        let body = response("False", None, Some("Invalid API key!"));
        assert_eq!(interpret(&body), LookupOutcome::InvalidKey);

        let body = response("False", None, Some("No API key provided."));
        assert_eq!(interpret(&body), LookupOutcome::InvalidKey);
    }

    #[test]
    fn test_interpret_success_without_id_is_a_miss() {
        let body = response("True", None, None);
        assert_eq!(interpret(&body), LookupOutcome::NotFound);
    }
}

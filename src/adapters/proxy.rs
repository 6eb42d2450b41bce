//! Client for the rhyme relay server.
//!
//! Endpoint: POST /api/generate-rhyme
//! The relay holds the API key and builds the prompt itself.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{RhymeRequest, TextBackend};
use crate::domain::{Length, Style, Tone};
use crate::error::{Error, Result};

/// Request body for the relay
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RelayPayload<'a> {
    content: &'a str,
    style: Style,
    tone: Tone,
    length: Length,
    title: &'a str,
    custom_instructions: &'a str,
}

/// Relay response: `{success, rhyme, usage}` or `{error}`
#[derive(Debug, Deserialize)]
struct RelayResponse {
    #[serde(default)]
    success: bool,
    rhyme: Option<String>,
    error: Option<String>,
    #[serde(default)]
    usage: Option<serde_json::Value>,
}

/// Health response from GET /health
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Relay backend
pub struct ProxyBackend {
    base_url: String,
    client: reqwest::Client,
}

impl ProxyBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn parse_response(status: u16, body: &str) -> Result<String> {
        let response: RelayResponse = match serde_json::from_str(body) {
            Ok(r) => r,
            Err(e) if (200..300).contains(&status) => return Err(e.into()),
            Err(_) => {
                return Err(Error::Api {
                    status,
                    message: body.to_string(),
                })
            }
        };

        if !(200..300).contains(&status) || !response.success {
            let message = response
                .error
                .unwrap_or_else(|| format!("relay returned status {}", status));
            return Err(Error::Api { status, message });
        }

        if let Some(usage) = &response.usage {
            debug!(%usage, "Relay usage");
        }

        response
            .rhyme
            .filter(|r| !r.trim().is_empty())
            .ok_or_else(|| Error::MalformedResponse("relay response has no rhyme".to_string()))
    }

    /// Query GET /health
    pub async fn health(&self) -> Result<HealthResponse> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: "relay health check failed".to_string(),
            });
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl TextBackend for ProxyBackend {
    fn name(&self) -> &str {
        "proxy"
    }

    async fn generate(&self, request: &RhymeRequest) -> Result<String> {
        let options = &request.options;
        let payload = RelayPayload {
            content: &request.content,
            style: options.style,
            tone: options.tone,
            length: options.length,
            title: &options.title,
            custom_instructions: &options.custom_instructions,
        };

        let response = self
            .client
            .post(format!("{}/api/generate-rhyme", self.base_url))
            .json(&payload)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        Self::parse_response(status, &body)
    }

    async fn health_check(&self) -> Result<()> {
        let health = self.health().await?;
        if health.status.eq_ignore_ascii_case("ok") || health.status.eq_ignore_ascii_case("healthy") {
            Ok(())
        } else {
            Err(Error::Api {
                status: 503,
                message: format!("relay status: {}", health.status),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_uses_camel_case() {
        let payload = RelayPayload {
            content: "text",
            style: Style::Rap,
            tone: Tone::Chill,
            length: Length::Short,
            title: "T",
            custom_instructions: "none",
        };
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["style"], "rap");
        assert_eq!(json["tone"], "chill");
        assert_eq!(json["length"], "short");
        assert_eq!(json["customInstructions"], "none");
    }

    #[test]
    fn test_parse_success() {
        let body = r#"{"success":true,"rhyme":"Verse","usage":{"totalTokens":12}}"#;
        assert_eq!(ProxyBackend::parse_response(200, body).unwrap(), "Verse");
    }

    #[test]
    fn test_parse_rate_limited() {
        let body = r#"{"error":"Too many requests, please try again later."}"#;
        let err = ProxyBackend::parse_response(429, body).unwrap_err();
        assert!(matches!(err, Error::Api { status: 429, .. }));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_parse_missing_rhyme() {
        let err = ProxyBackend::parse_response(200, r#"{"success":true}"#).unwrap_err();
        assert!(matches!(err, Error::MalformedResponse(_)));
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let backend = ProxyBackend::new("http://localhost:3000/");
        assert_eq!(backend.base_url(), "http://localhost:3000");
    }
}

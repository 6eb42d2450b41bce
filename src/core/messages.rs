//! Typed request/response protocol for the message actions.
//!
//! Requests are JSON objects tagged by `action`; every reply carries a
//! `success` flag plus either a payload or an `error` string.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::adapters::{gemini, GeminiBackend, TextBackend};
use crate::domain::GenerationOptions;
use crate::extract::ContentExtractor;
use crate::generate::RhymeGenerator;
use crate::store::{ApiProvider, SettingsStore};

/// Incoming message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Request {
    ExtractContent {
        html: String,
        #[serde(default)]
        url: String,
    },
    GenerateRhyme {
        content: String,
        #[serde(default)]
        options: GenerationOptions,
    },
    CheckApiKey,
    TestApiKey {
        #[serde(default, rename = "apiKey", skip_serializing_if = "Option::is_none")]
        api_key: Option<String>,
    },
}

/// Reply to a [`Request`]
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub has_key: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Default::default()
        }
    }

    fn encode<T: Serialize>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(data) => Self::ok(data),
            Err(e) => Self::failure(format!("failed to encode response: {}", e)),
        }
    }
}

/// Dispatches messages to the extractor, the generator and the settings
pub struct MessageRouter {
    extractor: ContentExtractor,
    generator: Arc<RhymeGenerator>,
    settings: SettingsStore,
    env_key: Option<String>,
    gemini_model: String,
    gemini_base_url: String,
}

impl MessageRouter {
    pub fn new(generator: Arc<RhymeGenerator>, settings: SettingsStore) -> Self {
        Self {
            extractor: ContentExtractor::new(),
            generator,
            settings,
            env_key: None,
            gemini_model: gemini::DEFAULT_MODEL.to_string(),
            gemini_base_url: gemini::DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Key from the environment; counts as configured and wins over storage
    pub fn with_env_key(mut self, key: Option<String>) -> Self {
        self.env_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Model and endpoint used when testing a candidate key
    pub fn with_gemini(mut self, model: impl Into<String>, base_url: impl Into<String>) -> Self {
        self.gemini_model = model.into();
        self.gemini_base_url = base_url.into();
        self
    }

    /// Parse and dispatch a raw JSON message
    pub async fn dispatch_json(&self, raw: &str) -> Response {
        match serde_json::from_str::<Request>(raw) {
            Ok(request) => self.dispatch(request).await,
            Err(e) => {
                warn!(error = %e, "Rejected malformed message");
                Response::failure(format!("Invalid message: {}", e))
            }
        }
    }

    #[instrument(skip(self, request))]
    pub async fn dispatch(&self, request: Request) -> Response {
        match request {
            Request::ExtractContent { html, url } => {
                debug!(%url, "extractContent");
                Response::encode(&self.extractor.extract(&html, &url))
            }
            Request::GenerateRhyme { content, options } => {
                debug!(style = %options.style, "generateRhyme");
                let result = self.generator.transform(&content, &options).await;
                let mut response = Response::encode(&result);
                if response.success && !result.success {
                    response.success = false;
                    response.error = result.error.clone();
                }
                response
            }
            Request::CheckApiKey => match self.has_key().await {
                Ok(has_key) => Response {
                    success: true,
                    has_key: Some(has_key),
                    ..Default::default()
                },
                Err(e) => Response::failure(e.to_string()),
            },
            Request::TestApiKey { api_key } => {
                let outcome = match api_key.filter(|k| !k.trim().is_empty()) {
                    Some(key) => {
                        GeminiBackend::new(Some(key.trim().to_string()))
                            .with_model(self.gemini_model.clone())
                            .with_base_url(self.gemini_base_url.clone())
                            .health_check()
                            .await
                    }
                    None => self.generator.backend().health_check().await,
                };
                match outcome {
                    Ok(()) => Response {
                        success: true,
                        ..Default::default()
                    },
                    Err(e) => Response::failure(e.to_string()),
                }
            }
        }
    }

    async fn has_key(&self) -> crate::Result<bool> {
        if self.env_key.is_some() {
            return Ok(true);
        }
        Ok(self.settings.api_key(ApiProvider::Gemini).await?.is_some())
    }
}

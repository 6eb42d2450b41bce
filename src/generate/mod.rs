//! Rhyme generation.
//!
//! Builds a prompt, calls a [`TextBackend`] with bounded retry, and cleans
//! up the response. When every attempt fails the caller still gets a
//! result: `success: false` with a locally templated fallback rhyme.

pub mod fallback;
pub mod prompt;
pub mod retry;

use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::{error, info, instrument, warn};

use crate::adapters::{RhymeRequest, TextBackend};
use crate::domain::{GenerationOptions, RhymeResult};
use crate::error::{Error, Result};

pub use fallback::fallback_rhyme;
pub use prompt::build_prompt;
pub use retry::RetryPolicy;

/// Rhyme generator over a text backend
pub struct RhymeGenerator {
    backend: Arc<dyn TextBackend>,
    retry_policy: RetryPolicy,
}

impl RhymeGenerator {
    pub fn new(backend: Arc<dyn TextBackend>) -> Self {
        Self {
            backend,
            retry_policy: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn backend(&self) -> &dyn TextBackend {
        self.backend.as_ref()
    }

    /// Turn page content into a rhyme. Never fails.
    #[instrument(skip(self, content, options), fields(backend = self.backend.name(), style = %options.style))]
    pub async fn transform(&self, content: &str, options: &GenerationOptions) -> RhymeResult {
        let request = RhymeRequest {
            prompt: build_prompt(content, options),
            content: content.to_string(),
            options: options.clone(),
        };

        match self.generate_with_retry(&request).await {
            Ok(rhyme) => {
                info!(chars = rhyme.len(), "Rhyme generated");
                RhymeResult::success(rhyme, options)
            }
            Err(e) => {
                let fallback = fallback_rhyme(content, Some(options.style), options.length);
                RhymeResult::failure(e.to_string(), fallback, options)
            }
        }
    }

    async fn generate_with_retry(&self, request: &RhymeRequest) -> Result<String> {
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let result = self
                .backend
                .generate(request)
                .await
                .and_then(|raw| {
                    let cleaned = clean_response(&raw);
                    if cleaned.is_empty() {
                        Err(Error::MalformedResponse("empty rhyme".to_string()))
                    } else {
                        Ok(cleaned)
                    }
                });

            match result {
                Ok(rhyme) => return Ok(rhyme),
                Err(e) if e.is_retryable() && self.retry_policy.should_retry(attempt) => {
                    let delay = self.retry_policy.delay_for_attempt(attempt);
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Generation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(attempt, error = %e, "Generation failed permanently");
                    return Err(e);
                }
            }
        }
    }
}

fn preamble_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^\s*(?:(?:here['’]?s|here is)[^\n:]*:|(?:song|rhyme|lyrics)\s*:)\s*")
            .expect("preamble pattern is valid")
    })
}

fn blank_lines_regex() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\n[ \t]*\n(?:[ \t]*\n)+").expect("blank line pattern is valid")
    })
}

/// Strip preambles and markdown emphasis, squeeze blank lines
pub fn clean_response(raw: &str) -> String {
    let text = preamble_regex().replace(raw, "");
    let text = text.replace("**", "").replace("__", "").replace('*', "");
    let text = blank_lines_regex().replace_all(&text, "\n\n");
    text.trim().to_string()
}

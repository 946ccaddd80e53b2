use std::sync::Arc;

use async_trait::async_trait;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ProofreaderConfig;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Characters left untouched by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One suggestion returned by the checking service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestionMatch {
    pub message: String,
    pub context: MatchContext,
    pub replacements: Vec<Replacement>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchContext {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replacement {
    pub value: String,
}

impl SuggestionMatch {
    pub fn new(
        message: impl Into<String>,
        context: impl Into<String>,
        replacements: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            message: message.into(),
            context: MatchContext {
                text: context.into(),
            },
            replacements: replacements
                .into_iter()
                .map(|value| Replacement {
                    value: value.into(),
                })
                .collect(),
        }
    }

    pub fn replacement_values(&self) -> impl Iterator<Item = &str> + '_ {
        self.replacements.iter().map(|r| r.value.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    matches: Vec<SuggestionMatch>,
}

/// Why a check produced no suggestions.
///
/// Users see one generic message for every variant; the distinction only
/// reaches the logs.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("API error: {status} {reason}")]
    Status { status: u16, reason: String },
    #[error("malformed response: {0}")]
    Parse(#[from] serde_json::Error),
}

impl CheckError {
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::Network(_) => "network",
            CheckError::Status { .. } => "status",
            CheckError::Parse(_) => "parse",
        }
    }
}

/// Remote grammar checker.
#[async_trait]
pub trait Checker: Send + Sync {
    async fn check(&self, text: &str) -> Result<Vec<SuggestionMatch>, CheckError>;
}

#[async_trait]
impl<T: Checker + ?Sized> Checker for Arc<T> {
    async fn check(&self, text: &str) -> Result<Vec<SuggestionMatch>, CheckError> {
        (**self).check(text).await
    }
}

/// [`Checker`] backed by the LanguageTool `/v2/check` endpoint.
#[derive(Debug, Clone)]
pub struct LanguageToolClient {
    client: Client,
    api_url: String,
    language: String,
}

impl LanguageToolClient {
    pub fn new(config: &ProofreaderConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            api_url: config.api_url.clone(),
            language: config.language.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn language(&self) -> &str {
        &self.language
    }
}

#[async_trait]
impl Checker for LanguageToolClient {
    async fn check(&self, text: &str) -> Result<Vec<SuggestionMatch>, CheckError> {
        let response = self
            .client
            .post(&self.api_url)
            .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(form_body(text, &self.language))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(CheckError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let bytes = response.bytes().await?;
        let payload: CheckResponse = serde_json::from_slice(&bytes)?;
        debug!(
            url = %self.api_url,
            matches = payload.matches.len(),
            "LanguageTool response parsed"
        );
        Ok(payload.matches)
    }
}

/// Builds `text=<encoded>&language=<encoded>` with `encodeURIComponent` rules.
pub fn form_body(text: &str, language: &str) -> String {
    format!(
        "text={}&language={}",
        utf8_percent_encode(text, URI_COMPONENT),
        utf8_percent_encode(language, URI_COMPONENT)
    )
}

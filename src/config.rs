use std::time::Duration;

use crate::WORD_LIMIT;

pub const DEFAULT_API_URL: &str = "https://api.languagetoolplus.com/v2/check";
pub const DEFAULT_LANGUAGE: &str = "en-GB";
pub const DEFAULT_WORKER_SCRIPT: &str = "/sw.js";

/// Settings shared by every host that embeds a [`crate::ProofreadingClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofreaderConfig {
    /// Endpoint receiving the form-encoded check request.
    pub api_url: String,
    /// Language code sent alongside the text.
    pub language: String,
    pub word_limit: usize,
    /// No timeout is applied when unset.
    pub request_timeout: Option<Duration>,
    /// Root-relative path of the offline asset-caching worker.
    pub worker_script: String,
}

impl Default for ProofreaderConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            word_limit: WORD_LIMIT,
            request_timeout: None,
            worker_script: DEFAULT_WORKER_SCRIPT.to_string(),
        }
    }
}

impl ProofreaderConfig {
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_word_limit(mut self, word_limit: usize) -> Self {
        self.word_limit = word_limit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

//! Word-limited proofreading against the LanguageTool checking API.
//!
//! The [`ProofreadingClient`] controller owns the interaction: it counts words
//! as the text changes, gates submission behind the word limit, sends one
//! request per submission through a [`Checker`], and renders the returned
//! matches onto a [`Surface`]. Hosts (the web page, the JSON API, and the
//! terminal front end) only supply a surface and feed [`UiEvent`]s in.

pub mod checker;
pub mod client;
pub mod config;
pub mod page;
pub mod render;
pub mod surface;
#[cfg(feature = "web")]
pub mod web;
pub mod worker;

pub use checker::{CheckError, Checker, LanguageToolClient, MatchContext, Replacement, SuggestionMatch};
pub use client::{CheckReport, EventOutcome, ProofreadingClient, SubmitOutcome, SubmitRejection, UiEvent, UiState};
pub use config::ProofreaderConfig;
pub use page::{CounterState, HtmlPage};
pub use render::{Notice, ResultsView, SafeFragment, SuggestionCard, Tone, render_matches};
pub use surface::Surface;
pub use worker::{RegistrationError, WorkerRegistrar};

/// Maximum number of words accepted for a single check.
pub const WORD_LIMIT: usize = 5000;

pub const SUBMIT_LABEL: &str = "Proofread Text";
pub const BUSY_LABEL: &str = "Checking...";

pub const WORD_LIMIT_MESSAGE: &str = "Word limit exceeded.";
pub const EMPTY_INPUT_MESSAGE: &str = "Please enter some text to proofread.";
pub const CHECKING_MESSAGE: &str = "Checking your text for suggestions...";
pub const LOOKS_GOOD_MESSAGE: &str = "No suggestions found. Looks good!";
pub const CHECK_FAILED_MESSAGE: &str =
    "Could not get suggestions. Please check your internet connection and try again.";

/// Counts whitespace-delimited words in `text`.
///
/// Leading and trailing whitespace is ignored and any run of whitespace
/// separates two words, so whitespace-only input counts as zero.
pub fn count_words(text: &str) -> usize {
    text.split(is_word_separator)
        .filter(|word| !word.is_empty())
        .count()
}

/// Formats the counter label shown next to the input, e.g. `"12 / 5000 words"`.
pub fn word_count_label(count: usize, limit: usize) -> String {
    format!("{count} / {limit} words")
}

// Browsers treat U+FEFF as whitespace but not U+0085.
fn is_word_separator(c: char) -> bool {
    (c.is_whitespace() && c != '\u{85}') || c == '\u{feff}'
}

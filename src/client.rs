use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error, info};

use crate::checker::{CheckError, Checker, SuggestionMatch};
use crate::config::ProofreaderConfig;
use crate::render::{Notice, ResultsView, render_matches};
use crate::surface::Surface;
use crate::worker::register_offline_worker;
use crate::{
    BUSY_LABEL, CHECK_FAILED_MESSAGE, CHECKING_MESSAGE, EMPTY_INPUT_MESSAGE, SUBMIT_LABEL,
    WORD_LIMIT_MESSAGE, count_words, word_count_label,
};

/// Events a host forwards from its widgets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    InputChanged(String),
    SubmitClicked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UiState {
    #[default]
    Idle,
    OverLimit,
    Checking,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    #[error("no text to proofread")]
    EmptyInput,
    #[error("word limit exceeded")]
    OverLimit,
    #[error("a check is already in flight")]
    InFlight,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Checked(Vec<SuggestionMatch>),
    Failed(CheckError),
    Rejected(SubmitRejection),
}

#[derive(Debug)]
pub enum EventOutcome {
    Counted(usize),
    Submitted(SubmitOutcome),
}

/// Text accepted by [`ProofreadingClient::begin_check`] and awaiting a
/// result. Settling it through [`ProofreadingClient::complete_check`] is the
/// only way to leave the checking state.
#[derive(Debug)]
#[must_use = "a pending check keeps the submit action disabled until completed"]
pub struct PendingCheck {
    text: String,
}

impl PendingCheck {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Machine-readable summary of a successful check.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub word_count: usize,
    pub word_limit: usize,
    pub state: UiState,
    pub matches: Vec<SuggestionMatch>,
}

/// Controller behind the proofreading page.
pub struct ProofreadingClient<S, C> {
    surface: S,
    checker: C,
    word_limit: usize,
    worker_script: String,
    word_count: usize,
    in_flight: bool,
    last_check_failed: bool,
    state: UiState,
}

impl<S: Surface, C: Checker> ProofreadingClient<S, C> {
    pub fn new(surface: S, checker: C, config: &ProofreaderConfig) -> Self {
        Self {
            surface,
            checker,
            word_limit: config.word_limit,
            worker_script: config.worker_script.clone(),
            word_count: 0,
            in_flight: false,
            last_check_failed: false,
            state: UiState::Idle,
        }
    }

    /// Registers the offline worker when the surface supports one and brings
    /// the widgets in line with the current text.
    pub fn init(&mut self) {
        register_offline_worker(self.surface.worker_registrar(), &self.worker_script);
        self.update_word_count();
    }

    pub async fn handle(&mut self, event: UiEvent) -> EventOutcome {
        match event {
            UiEvent::InputChanged(text) => EventOutcome::Counted(self.input_changed(&text)),
            UiEvent::SubmitClicked => EventOutcome::Submitted(self.submit().await),
        }
    }

    pub fn input_changed(&mut self, text: &str) -> usize {
        self.surface.set_text(text);
        self.last_check_failed = false;
        self.update_word_count()
    }

    /// Recounts the text and updates the counter, error slot, and submit
    /// action. Returns the word count.
    pub fn update_word_count(&mut self) -> usize {
        let words = count_words(&self.surface.text());
        self.word_count = words;
        self.surface
            .set_word_count_label(&word_count_label(words, self.word_limit));

        let over_limit = words > self.word_limit;
        if over_limit {
            self.surface.set_counter_error(true);
            self.surface.set_error_message(WORD_LIMIT_MESSAGE);
            self.surface.set_submit_enabled(false);
        } else {
            self.surface.set_counter_error(false);
            self.surface.set_error_message("");
            self.surface.set_submit_enabled(words > 0 && !self.in_flight);
        }

        self.state = if self.in_flight {
            UiState::Checking
        } else if over_limit {
            UiState::OverLimit
        } else if self.last_check_failed {
            UiState::Error
        } else {
            UiState::Idle
        };
        words
    }

    /// Runs one complete check of the current text.
    pub async fn submit(&mut self) -> SubmitOutcome {
        let pending = match self.begin_check() {
            Ok(pending) => pending,
            Err(rejection) => return SubmitOutcome::Rejected(rejection),
        };
        let result = self.checker.check(pending.text()).await;
        self.complete_check(pending, result)
    }

    /// Validates the text and switches to the checking state.
    pub fn begin_check(&mut self) -> Result<PendingCheck, SubmitRejection> {
        if self.in_flight {
            debug!("submit ignored while a check is in flight");
            return Err(SubmitRejection::InFlight);
        }
        let text = self.surface.text();
        let words = count_words(&text);
        if words == 0 {
            self.surface
                .show_results(ResultsView::Notice(Notice::info(EMPTY_INPUT_MESSAGE)));
            return Err(SubmitRejection::EmptyInput);
        }
        if words > self.word_limit {
            debug!(words, limit = self.word_limit, "submit blocked by word limit");
            return Err(SubmitRejection::OverLimit);
        }

        self.in_flight = true;
        self.state = UiState::Checking;
        self.surface.set_submit_enabled(false);
        self.surface.set_submit_label(BUSY_LABEL);
        self.surface
            .show_results(ResultsView::Notice(Notice::info(CHECKING_MESSAGE)));
        info!(words, "Submitting text for proofreading");
        Ok(PendingCheck { text })
    }

    /// Settles a pending check, rendering matches or the failure notice, and
    /// returns the widgets to a ready state.
    pub fn complete_check(
        &mut self,
        _pending: PendingCheck,
        result: Result<Vec<SuggestionMatch>, CheckError>,
    ) -> SubmitOutcome {
        let outcome = match result {
            Ok(matches) => {
                info!(suggestions = matches.len(), "Proofreading finished");
                self.render(&matches);
                self.last_check_failed = false;
                SubmitOutcome::Checked(matches)
            }
            Err(err) => {
                error!(kind = err.kind(), error = %err, "Error during proofreading");
                self.surface
                    .show_results(ResultsView::Notice(Notice::error(CHECK_FAILED_MESSAGE)));
                self.last_check_failed = true;
                SubmitOutcome::Failed(err)
            }
        };

        self.in_flight = false;
        self.surface.set_submit_enabled(true);
        self.surface.set_submit_label(SUBMIT_LABEL);
        self.update_word_count();
        outcome
    }

    /// Replaces the results area with cards for `matches`.
    pub fn render(&mut self, matches: &[SuggestionMatch]) {
        self.surface.show_results(render_matches(matches));
    }

    pub fn report(&self, matches: Vec<SuggestionMatch>) -> CheckReport {
        CheckReport {
            word_count: self.word_count,
            word_limit: self.word_limit,
            state: self.state,
            matches,
        }
    }

    pub fn state(&self) -> UiState {
        self.state
    }

    pub fn word_count(&self) -> usize {
        self.word_count
    }

    pub fn word_limit(&self) -> usize {
        self.word_limit
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checker::testing::StubChecker;
    use crate::page::HtmlPage;
    use crate::{LOOKS_GOOD_MESSAGE, WORD_LIMIT};

    fn client(checker: StubChecker) -> ProofreadingClient<HtmlPage, StubChecker> {
        let mut client = ProofreadingClient::new(
            HtmlPage::new(),
            checker,
            &ProofreaderConfig::default(),
        );
        client.init();
        client
    }

    fn words(count: usize) -> String {
        vec!["word"; count].join(" ")
    }

    #[test]
    fn initial_state_is_idle_with_submit_disabled() {
        let client = client(StubChecker::Matches(Vec::new()));
        let page = client.surface();
        assert_eq!(client.state(), UiState::Idle);
        assert_eq!(page.word_count_label(), "0 / 5000 words");
        assert!(!page.submit_enabled());
        assert_eq!(page.submit_label(), SUBMIT_LABEL);
    }

    #[test]
    fn submit_enabled_iff_within_limit_and_non_empty() {
        let mut client = client(StubChecker::Matches(Vec::new()));
        for count in [0, 1, 2, 4999, WORD_LIMIT, WORD_LIMIT + 1, 6000] {
            client.input_changed(&words(count));
            let expected = count > 0 && count <= WORD_LIMIT;
            assert_eq!(
                client.surface().submit_enabled(),
                expected,
                "word count {count}"
            );
        }
    }

    #[test]
    fn exactly_at_limit_is_not_an_error() {
        let mut client = client(StubChecker::Matches(Vec::new()));
        client.input_changed(&words(WORD_LIMIT));
        let page = client.surface();
        assert_eq!(client.state(), UiState::Idle);
        assert!(!page.counter_error());
        assert_eq!(page.error_message(), "");
        assert_eq!(page.word_count_label(), "5000 / 5000 words");
    }

    #[test]
    fn one_over_limit_shows_error() {
        let mut client = client(StubChecker::Matches(Vec::new()));
        client.input_changed(&words(WORD_LIMIT + 1));
        let page = client.surface();
        assert_eq!(client.state(), UiState::OverLimit);
        assert!(page.counter_error());
        assert_eq!(page.error_message(), WORD_LIMIT_MESSAGE);
        assert!(!page.submit_enabled());

        client.input_changed("short again");
        assert_eq!(client.state(), UiState::Idle);
        assert!(!client.surface().counter_error());
        assert_eq!(client.surface().error_message(), "");
    }

    #[tokio::test]
    async fn empty_submit_prompts_without_request() {
        let mut client = client(StubChecker::Status(500));
        client.input_changed("   ");
        let outcome = client.submit().await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(SubmitRejection::EmptyInput)
        ));
        assert_eq!(
            client.surface().results().notice().map(|n| n.text.as_str()),
            Some(EMPTY_INPUT_MESSAGE)
        );
        assert_eq!(client.state(), UiState::Idle);
    }

    #[tokio::test]
    async fn over_limit_submit_is_rejected() {
        let mut client = client(StubChecker::Matches(Vec::new()));
        client.input_changed(&words(WORD_LIMIT + 1));
        let outcome = client.submit().await;
        assert!(matches!(
            outcome,
            SubmitOutcome::Rejected(SubmitRejection::OverLimit)
        ));
        assert_eq!(client.state(), UiState::OverLimit);
    }

    #[test]
    fn begin_check_shows_busy_state() {
        let mut client = client(StubChecker::Matches(Vec::new()));
        client.input_changed("Hello wrold");
        let pending = client.begin_check().unwrap();
        assert_eq!(pending.text(), "Hello wrold");
        let page = client.surface();
        assert_eq!(client.state(), UiState::Checking);
        assert!(!page.submit_enabled());
        assert_eq!(page.submit_label(), BUSY_LABEL);
        assert_eq!(
            page.results().notice().map(|n| n.text.as_str()),
            Some(CHECKING_MESSAGE)
        );
        let _ = client.complete_check(pending, Ok(Vec::new()));
    }

    #[test]
    fn in_flight_guard_rejects_second_check() {
        let mut client = client(StubChecker::Matches(Vec::new()));
        client.input_changed("some text");
        let pending = client.begin_check().unwrap();
        assert_eq!(
            client.begin_check().unwrap_err(),
            SubmitRejection::InFlight
        );

        // Typing while the request is outstanding keeps submit disabled.
        client.input_changed("some more text");
        assert!(!client.surface().submit_enabled());
        assert_eq!(client.state(), UiState::Checking);
        assert_eq!(client.surface().word_count_label(), "3 / 5000 words");

        let _ = client.complete_check(pending, Ok(Vec::new()));
        assert!(!client.is_in_flight());
        assert!(client.surface().submit_enabled());
        assert!(client.begin_check().is_ok());
    }

    #[tokio::test]
    async fn successful_check_renders_cards() {
        let matches = vec![SuggestionMatch::new(
            "Possible spelling mistake found.",
            "Hello wrold",
            ["world"],
        )];
        let mut client = client(StubChecker::Matches(matches.clone()));
        client.input_changed("Hello wrold");
        let outcome = client.submit().await;
        match outcome {
            SubmitOutcome::Checked(found) => assert_eq!(found, matches),
            other => panic!("unexpected outcome: {other:?}"),
        }
        let page = client.surface();
        assert_eq!(page.results().cards().len(), 1);
        assert_eq!(page.submit_label(), SUBMIT_LABEL);
        assert!(page.submit_enabled());
        assert_eq!(client.state(), UiState::Idle);
    }

    #[tokio::test]
    async fn clean_text_shows_looks_good() {
        let mut client = client(StubChecker::Matches(Vec::new()));
        client.input_changed("Everything is fine.");
        let _ = client.submit().await;
        assert_eq!(
            client.surface().results().notice().map(|n| n.text.as_str()),
            Some(LOOKS_GOOD_MESSAGE)
        );
    }

    #[tokio::test]
    async fn failed_check_shows_generic_message_and_recovers() {
        for checker in [StubChecker::Status(503), StubChecker::Malformed] {
            let mut client = client(checker);
            client.input_changed("Hello wrold");
            let outcome = client.submit().await;
            assert!(matches!(outcome, SubmitOutcome::Failed(_)));
            let page = client.surface();
            let notice = page.results().notice().unwrap();
            assert_eq!(notice.text, CHECK_FAILED_MESSAGE);
            assert!(notice.is_error());
            assert!(page.submit_enabled());
            assert_eq!(page.submit_label(), SUBMIT_LABEL);
            assert_eq!(client.state(), UiState::Error);

            client.input_changed("Hello world");
            assert_eq!(client.state(), UiState::Idle);
        }
    }

    #[test]
    fn completion_respects_limit_reached_during_flight() {
        let mut client = client(StubChecker::Matches(Vec::new()));
        client.input_changed("short text");
        let pending = client.begin_check().unwrap();
        client.input_changed(&words(WORD_LIMIT + 1));
        let _ = client.complete_check(pending, Ok(Vec::new()));
        assert_eq!(client.state(), UiState::OverLimit);
        assert!(!client.surface().submit_enabled());
        assert_eq!(client.surface().error_message(), WORD_LIMIT_MESSAGE);
        assert_eq!(client.surface().submit_label(), SUBMIT_LABEL);
    }

    #[tokio::test]
    async fn events_dispatch_to_operations() {
        let mut client = client(StubChecker::Matches(Vec::new()));
        let counted = client
            .handle(UiEvent::InputChanged("one two three".to_string()))
            .await;
        assert!(matches!(counted, EventOutcome::Counted(3)));
        let submitted = client.handle(UiEvent::SubmitClicked).await;
        assert!(matches!(
            submitted,
            EventOutcome::Submitted(SubmitOutcome::Checked(_))
        ));
        let report = client.report(Vec::new());
        assert_eq!(report.word_count, 3);
        assert_eq!(report.state, UiState::Idle);
    }
}

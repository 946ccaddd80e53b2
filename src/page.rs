use askama::Template;
use serde::Serialize;

use crate::render::{Notice, ResultsView, SuggestionCard};
use crate::surface::Surface;
use crate::worker::{RegistrationError, WorkerRegistrar, validate_script_path};
use crate::{BUSY_LABEL, CHECKING_MESSAGE, SUBMIT_LABEL, WORD_LIMIT, word_count_label};

/// Server-rendered proofreading page.
///
/// Records every widget update from the controller and renders the result as
/// a complete HTML document.
#[derive(Debug, Clone)]
pub struct HtmlPage {
    text: String,
    word_count_label: String,
    counter_error: bool,
    error_message: String,
    submit_enabled: bool,
    submit_label: String,
    results: ResultsView,
    workers_supported: bool,
    worker_script: Option<String>,
}

impl Default for HtmlPage {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlPage {
    pub fn new() -> Self {
        Self {
            text: String::new(),
            word_count_label: word_count_label(0, WORD_LIMIT),
            counter_error: false,
            error_message: String::new(),
            submit_enabled: false,
            submit_label: SUBMIT_LABEL.to_string(),
            results: ResultsView::Cleared,
            workers_supported: true,
            worker_script: None,
        }
    }

    pub fn with_worker_support(mut self, supported: bool) -> Self {
        self.workers_supported = supported;
        self
    }

    pub fn word_count_label(&self) -> &str {
        &self.word_count_label
    }

    pub fn counter_error(&self) -> bool {
        self.counter_error
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn submit_label(&self) -> &str {
        &self.submit_label
    }

    pub fn results(&self) -> &ResultsView {
        &self.results
    }

    pub fn worker_script(&self) -> Option<&str> {
        self.worker_script.as_deref()
    }

    pub fn counter_state(&self) -> CounterState {
        CounterState {
            word_count_label: self.word_count_label.clone(),
            counter_error: self.counter_error,
            error_message: self.error_message.clone(),
            submit_enabled: self.submit_enabled,
        }
    }

    pub fn render(&self) -> Result<String, askama::Error> {
        PageTemplate {
            page: self,
            notice: self.results.notice(),
            cards: self.results.cards(),
            worker_script: self.worker_script.as_deref(),
            busy_label: BUSY_LABEL,
            checking_message: CHECKING_MESSAGE,
            version: env!("CARGO_PKG_VERSION"),
        }
        .render()
    }
}

/// Counter widgets as sent to the page script after each keystroke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CounterState {
    pub word_count_label: String,
    pub counter_error: bool,
    pub error_message: String,
    pub submit_enabled: bool,
}

impl Surface for HtmlPage {
    fn text(&self) -> String {
        self.text.clone()
    }

    fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
    }

    fn set_word_count_label(&mut self, label: &str) {
        self.word_count_label = label.to_string();
    }

    fn set_counter_error(&mut self, error: bool) {
        self.counter_error = error;
    }

    fn set_error_message(&mut self, message: &str) {
        self.error_message = message.to_string();
    }

    fn set_submit_enabled(&mut self, enabled: bool) {
        self.submit_enabled = enabled;
    }

    fn set_submit_label(&mut self, label: &str) {
        self.submit_label = label.to_string();
    }

    fn show_results(&mut self, view: ResultsView) {
        self.results = view;
    }

    fn worker_registrar(&mut self) -> Option<&mut dyn WorkerRegistrar> {
        Some(self)
    }
}

impl WorkerRegistrar for HtmlPage {
    fn register(&mut self, script_path: &str) -> Result<(), RegistrationError> {
        if !self.workers_supported {
            return Err(RegistrationError::Unsupported);
        }
        validate_script_path(script_path)?;
        self.worker_script = Some(script_path.to_string());
        Ok(())
    }
}

#[derive(Template)]
#[template(
    source = r#"<!DOCTYPE html>
<html lang="en-GB">
  <head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
    <title>UK English Proofreader</title>
    <script src="https://cdn.jsdelivr.net/npm/@tailwindcss/browser@4"></script>
    <style>
      .error { color: #b91c1c; }
      .suggestion-card code { background: #f1f5f9; padding: 0 0.25rem; border-radius: 0.25rem; }
    </style>
  </head>
  <body class="bg-slate-50 text-slate-900">
    <main class="min-h-screen flex flex-col items-center justify-start py-10 px-4">
      <div class="max-w-3xl w-full space-y-6">
        <div>
          <p class="uppercase tracking-wide text-sm text-slate-500">Proofreader v{{ version }}</p>
          <h1 class="text-4xl font-extrabold tracking-tight">UK English Proofreader</h1>
        </div>
        <form id="proofread-form" method="post" action="/" class="space-y-3" data-busy-label="{{ busy_label }}" data-checking-message="{{ checking_message }}">
          <textarea id="text-input" name="text" rows="12" class="w-full rounded-md border border-slate-300 p-3" placeholder="Paste your text here...">
{{ page.text }}</textarea>
          <div class="flex items-center justify-between">
            <p id="word-count" class="text-sm text-slate-600{% if page.counter_error %} error{% endif %}">{{ page.word_count_label }}</p>
            <p id="error-message" class="text-sm error">{{ page.error_message }}</p>
          </div>
          <button id="proofread-btn" type="submit" class="inline-flex items-center rounded-md bg-slate-900 px-4 py-2 text-white font-semibold shadow hover:bg-slate-800 disabled:opacity-50"{% if !page.submit_enabled %} disabled{% endif %}>{{ page.submit_label }}</button>
        </form>
        <section id="results" class="space-y-4">
          {% if let Some(notice) = notice %}
          <p{% if notice.is_error() %} class="error"{% endif %}>{{ notice.text }}</p>
          {% endif %}
          {% for card in cards %}
          <div class="suggestion-card bg-white shadow rounded p-4 space-y-1">
            <p class="message font-medium">{{ card.message }}</p>
            <p><strong>Context: </strong><span class="context">{{ card.quoted_context() }}</span></p>
            {% if let Some(replacements) = card.replacements_markup() %}
            <p><strong>Suggestions: </strong><span class="replacements">{{ replacements|safe }}</span></p>
            {% endif %}
          </div>
          {% endfor %}
        </section>
      </div>
    </main>
    <script>
      (() => {
        const form = document.getElementById('proofread-form');
        const input = document.getElementById('text-input');
        const wordCount = document.getElementById('word-count');
        const errorMessage = document.getElementById('error-message');
        const button = document.getElementById('proofread-btn');
        const results = document.getElementById('results');
        let countSeq = 0;
        let inFlight = false;
        input.addEventListener('input', async () => {
          const seq = ++countSeq;
          try {
            const response = await fetch('/api/count', {
              method: 'POST',
              headers: { 'Content-Type': 'application/json' },
              body: JSON.stringify({ text: input.value }),
            });
            if (!response.ok || seq !== countSeq) {
              return;
            }
            const state = await response.json();
            // A later keystroke owns the widgets now.
            if (seq !== countSeq) {
              return;
            }
            wordCount.textContent = state.word_count_label;
            wordCount.classList.toggle('error', state.counter_error);
            errorMessage.textContent = state.error_message;
            button.disabled = inFlight || !state.submit_enabled;
          } catch (err) {
            console.error('Word count refresh failed:', err);
          }
        });
        form.addEventListener('submit', (event) => {
          if (inFlight) {
            event.preventDefault();
            return;
          }
          inFlight = true;
          button.disabled = true;
          button.textContent = form.dataset.busyLabel;
          const notice = document.createElement('p');
          notice.textContent = form.dataset.checkingMessage;
          results.replaceChildren(notice);
        });
      })();
    </script>
    {% if let Some(script) = worker_script %}
    <script>
      if ('serviceWorker' in navigator) {
        window.addEventListener('load', () => {
          navigator.serviceWorker.register('{{ script|safe }}')
            .then(reg => console.log('Service Worker registered.', reg))
            .catch(err => console.error('Service Worker registration failed:', err));
        });
      }
    </script>
    {% endif %}
  </body>
</html>"#,
    ext = "html"
)]
struct PageTemplate<'a> {
    page: &'a HtmlPage,
    notice: Option<&'a Notice>,
    cards: &'a [SuggestionCard],
    worker_script: Option<&'a str>,
    busy_label: &'static str,
    checking_message: &'static str,
    version: &'static str,
}

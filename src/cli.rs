use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use atty::Stream;
use clap::{Args, Parser, Subcommand};
use proofreader_rs::config::{DEFAULT_API_URL, DEFAULT_LANGUAGE};
use proofreader_rs::{
    CheckError, Checker, LanguageToolClient, ProofreaderConfig, ProofreadingClient, ResultsView,
    SubmitOutcome, SuggestionMatch, Surface, UiEvent, WORD_LIMIT,
};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "proofreader-rs",
    about = "Proofread British English text with LanguageTool",
    version
)]
pub struct Cli {
    /// Emit JSON instead of human-readable output.
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    proofreader: ProofreaderArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct ProofreaderArgs {
    /// Checking endpoint receiving the form-encoded text.
    #[arg(long, global = true, env = "PROOFREADER_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    /// Language code sent with every check.
    #[arg(long, global = true, env = "PROOFREADER_LANGUAGE", default_value = DEFAULT_LANGUAGE)]
    language: String,
    /// Maximum number of words accepted for a check.
    #[arg(
        long,
        global = true,
        env = "PROOFREADER_WORD_LIMIT",
        default_value_t = WORD_LIMIT,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    word_limit: usize,
    /// Abort a check after this many seconds (no timeout by default).
    #[arg(long, global = true, env = "PROOFREADER_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,
}

impl ProofreaderArgs {
    fn config(&self) -> ProofreaderConfig {
        ProofreaderConfig::default()
            .with_api_url(self.api_url.clone())
            .with_language(self.language.clone())
            .with_word_limit(self.word_limit)
            .with_request_timeout(self.timeout_secs.map(Duration::from_secs))
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Count words and report whether the text is within the limit.
    Count {
        /// File to read; stdin when omitted or `-`.
        file: Option<PathBuf>,
    },
    /// Send the text to the checking service and print its suggestions.
    Check {
        /// File to read; stdin when omitted or `-`.
        file: Option<PathBuf>,
    },
    /// Serve the proofreading page over HTTP.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Do not register the offline asset-caching worker.
        #[arg(long)]
        no_worker: bool,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config = cli.proofreader.config();
    match cli.command {
        Command::Count { file } => {
            init_tracing("warn");
            handle_count(read_input(file.as_ref())?, &config, cli.json)
        }
        Command::Check { file } => {
            init_tracing("warn");
            let text = read_input(file.as_ref())?;
            runtime()?.block_on(handle_check(text, config, cli.json))
        }
        #[cfg(feature = "web")]
        Command::Serve { addr, no_worker } => {
            init_tracing("info");
            let web = proofreader_rs::web::WebConfig {
                addr,
                offline_worker: !no_worker,
            };
            runtime()?.block_on(proofreader_rs::web::serve(web, config))?;
            Ok(())
        }
    }
}

fn init_tracing(default_directive: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
}

fn read_input(file: Option<&PathBuf>) -> Result<String, Box<dyn Error>> {
    match file {
        Some(path) if path.as_os_str() != "-" => fs::read_to_string(path)
            .map_err(|err| format!("Failed to read {}: {err}", path.display()).into()),
        _ => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}

fn handle_count(text: String, config: &ProofreaderConfig, as_json: bool) -> Result<(), Box<dyn Error>> {
    let mut client = ProofreadingClient::new(TerminalSurface::default(), CountOnly, config);
    client.init();
    let words = client.input_changed(&text);
    let surface = client.surface();

    if as_json {
        let payload = json!({
            "word_count": words,
            "word_limit": client.word_limit(),
            "state": client.state(),
            "word_count_label": surface.word_count_label,
            "error_message": surface.error_message,
            "submit_enabled": surface.submit_enabled,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        surface.print_counter();
    }
    Ok(())
}

async fn handle_check(
    text: String,
    config: ProofreaderConfig,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let checker = LanguageToolClient::new(&config)?;
    let mut client = ProofreadingClient::new(TerminalSurface::default(), checker, &config);
    client.init();
    client.handle(UiEvent::InputChanged(text)).await;

    match client.submit().await {
        SubmitOutcome::Checked(matches) => {
            if as_json {
                println!("{}", serde_json::to_string_pretty(&client.report(matches))?);
            } else {
                client.surface().print_counter();
                client.surface().print_results();
            }
            Ok(())
        }
        SubmitOutcome::Failed(err) => {
            client.surface().print_results();
            Err(format!("check failed ({err})").into())
        }
        SubmitOutcome::Rejected(rejection) => {
            client.surface().print_counter();
            client.surface().print_results();
            Err(rejection.to_string().into())
        }
    }
}

/// Checker for the `count` command, which never submits.
struct CountOnly;

#[async_trait]
impl Checker for CountOnly {
    async fn check(&self, _text: &str) -> Result<Vec<SuggestionMatch>, CheckError> {
        Ok(Vec::new())
    }
}

/// Surface that collects widget state and prints it once the command settles.
#[derive(Debug, Default)]
struct TerminalSurface {
    text: String,
    word_count_label: String,
    counter_error: bool,
    error_message: String,
    submit_enabled: bool,
    results: ResultsView,
}

impl Surface for TerminalSurface {
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

    // A terminal has no button to relabel.
    fn set_submit_label(&mut self, _label: &str) {}

    fn show_results(&mut self, view: ResultsView) {
        self.results = view;
    }
}

impl TerminalSurface {
    fn print_counter(&self) {
        if self.counter_error {
            println!("{} (limit exceeded)", self.word_count_label);
        } else {
            println!("{}", self.word_count_label);
        }
        if !self.error_message.is_empty() {
            eprintln!("{}", self.error_message);
        }
    }

    fn print_results(&self) {
        match &self.results {
            ResultsView::Cleared => {}
            ResultsView::Notice(notice) if notice.is_error() => eprintln!("{}", notice.text),
            ResultsView::Notice(notice) => println!("{}", notice.text),
            ResultsView::Cards(cards) => {
                render_heading(&format!("{} suggestion(s)", cards.len()));
                for (index, card) in cards.iter().enumerate() {
                    println!("\n{}. {}", index + 1, card.message);
                    println!("   Context: {}", card.quoted_context());
                    if card.has_replacements() {
                        println!("   Suggestions: {}", card.replacements.join(", "));
                    }
                }
            }
        }
    }
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_heading(title: &str) {
    print!("{}", heading(title, stdout_is_tty()));
}

fn heading(title: &str, styled: bool) -> String {
    if styled {
        let skin = MadSkin::default();
        let markdown = format!("## {title}");
        FmtText::from(&skin, &markdown, Some(markdown_width())).to_string()
    } else {
        format!("{title}:\n")
    }
}

use crate::checker::{Checker, LanguageToolClient};
use crate::client::{CheckReport, ProofreadingClient, SubmitOutcome, SubmitRejection, UiEvent, UiState};
use crate::config::ProofreaderConfig;
use crate::page::{CounterState, HtmlPage};
use crate::worker::service_worker_script;
use crate::{CHECK_FAILED_MESSAGE, EMPTY_INPUT_MESSAGE, WORD_LIMIT_MESSAGE};
use axum::{
    Form, Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::compression::CompressionLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{error, info};

type SharedState = Arc<AppState>;
type Session = ProofreadingClient<HtmlPage, Arc<dyn Checker>>;

pub struct AppState {
    pub checker: Arc<dyn Checker>,
    pub proofreader: ProofreaderConfig,
    pub offline_worker: bool,
}

impl AppState {
    fn session(&self) -> Session {
        let page = HtmlPage::new().with_worker_support(self.offline_worker);
        let mut session = ProofreadingClient::new(page, Arc::clone(&self.checker), &self.proofreader);
        session.init();
        session
    }
}

#[derive(Clone)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub offline_worker: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            offline_worker: true,
        }
    }
}

#[derive(Debug)]
pub enum WebError {
    Io(std::io::Error),
    Client(reqwest::Error),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::Io(err) => write!(f, "io error: {err}"),
            WebError::Client(err) => write!(f, "http client error: {err}"),
        }
    }
}

impl std::error::Error for WebError {}

impl From<std::io::Error> for WebError {
    fn from(value: std::io::Error) -> Self {
        WebError::Io(value)
    }
}

impl From<reqwest::Error> for WebError {
    fn from(value: reqwest::Error) -> Self {
        WebError::Client(value)
    }
}

pub async fn serve(config: WebConfig, proofreader: ProofreaderConfig) -> Result<(), WebError> {
    let checker = LanguageToolClient::new(&proofreader)?;
    info!(
        %config.addr,
        api = %proofreader.api_url,
        language = %proofreader.language,
        word_limit = proofreader.word_limit,
        offline_worker = config.offline_worker,
        "Binding HTTP listener"
    );
    let state = Arc::new(AppState {
        checker: Arc::new(checker),
        proofreader,
        offline_worker: config.offline_worker,
    });
    let router = build_router(state);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP server exited");
    Ok(())
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

impl From<SubmitRejection> for ApiError {
    fn from(rejection: SubmitRejection) -> Self {
        match rejection {
            SubmitRejection::EmptyInput => Self::new(StatusCode::BAD_REQUEST, EMPTY_INPUT_MESSAGE),
            SubmitRejection::OverLimit => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, WORD_LIMIT_MESSAGE)
            }
            SubmitRejection::InFlight => Self::new(StatusCode::CONFLICT, rejection.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.message });
        (self.status, Json(payload)).into_response()
    }
}

fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(home).post(proofread_form))
        .route("/api/count", post(api_count))
        .route("/api/check", post(api_check))
        .route("/sw.js", get(service_worker))
        .route("/healthz", get(health))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().include_headers(true))
                .on_response(DefaultOnResponse::new().include_headers(true)),
        )
        .layer(CompressionLayer::new())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        if let Ok(mut stream) = signal(SignalKind::terminate()) {
            let _ = stream.recv().await;
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

#[derive(Debug, Deserialize)]
struct TextPayload {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct CountPayload {
    word_count: usize,
    word_limit: usize,
    state: UiState,
    #[serde(flatten)]
    counter: CounterState,
}

async fn home(State(state): State<SharedState>) -> impl IntoResponse {
    render_page(state.session().into_surface())
}

async fn proofread_form(
    State(state): State<SharedState>,
    Form(form): Form<TextPayload>,
) -> impl IntoResponse {
    let mut session = state.session();
    session.handle(UiEvent::InputChanged(form.text)).await;
    session.handle(UiEvent::SubmitClicked).await;
    render_page(session.into_surface())
}

async fn api_count(
    State(state): State<SharedState>,
    Json(payload): Json<TextPayload>,
) -> Json<CountPayload> {
    let mut session = state.session();
    let word_count = session.input_changed(&payload.text);
    Json(CountPayload {
        word_count,
        word_limit: session.word_limit(),
        state: session.state(),
        counter: session.surface().counter_state(),
    })
}

async fn api_check(
    State(state): State<SharedState>,
    Json(payload): Json<TextPayload>,
) -> Result<Json<CheckReport>, ApiError> {
    let mut session = state.session();
    session.input_changed(&payload.text);
    match session.submit().await {
        SubmitOutcome::Checked(matches) => Ok(Json(session.report(matches))),
        SubmitOutcome::Failed(_) => Err(ApiError::new(StatusCode::BAD_GATEWAY, CHECK_FAILED_MESSAGE)),
        SubmitOutcome::Rejected(rejection) => Err(rejection.into()),
    }
}

async fn service_worker() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, mime::APPLICATION_JAVASCRIPT_UTF_8.to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        service_worker_script(),
    )
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "proofreader-web" }))
}

fn render_page(page: HtmlPage) -> Response {
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!(error = %err, "Page template failed to render");
            (StatusCode::INTERNAL_SERVER_ERROR, Html(render_error_page(&err.to_string())))
                .into_response()
        }
    }
}

fn render_error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en-GB">
  <head>
    <meta charset="utf-8" />
    <title>Proofreader • Error</title>
  </head>
  <body>
    <main>
      <h1>Something went wrong</h1>
      <p>{message}</p>
      <a href="/">Back to the proofreader</a>
    </main>
  </body>
</html>"#,
        message = crate::render::escape_text(message),
    )
}

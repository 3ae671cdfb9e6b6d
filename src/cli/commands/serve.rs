//! HTTP server: keep-alive endpoints plus a small JSON API over the bot.

use super::build_assistant;
use crate::bot::{Bot, Reply};
use crate::cli::preflight::Operation;
use crate::cli::Output;
use crate::config::Settings;
use crate::diagnostics::CacheSummary;
use crate::interaction_log::{Feedback, SqliteInteractionLog};
use crate::knowledge_base::RelevantArticle;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

/// Shared application state.
struct AppState {
    bot: Bot,
}

/// Run the HTTP server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    let assistant = Arc::new(build_assistant(Operation::Answer, &settings)?);
    let log = Arc::new(SqliteInteractionLog::new(
        &settings.interaction_log_path(),
        settings.interaction_log.utc_offset_hours,
    )?);

    let state = Arc::new(AppState {
        bot: Bot::new(assistant.clone(), log),
    });

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Load articles in the background so the keep-alive endpoints answer at once.
    tokio::spawn(async move {
        match assistant.refresh().await {
            Ok(report) => info!("Knowledge base loaded: {} articles", report.articles_cached),
            Err(e) => error!("Error loading articles: {}", e),
        }
    });

    Output::header("Deskbot Server");
    println!();
    Output::success(&format!("Listening on http://{}", addr));
    println!();
    println!("Endpoints:");
    Output::kv("Alive", "GET  /");
    Output::kv("Health", "GET  /health");
    Output::kv("Ask", "POST /ask");
    Output::kv("Command", "POST /command");
    Output::kv("Feedback", "POST /feedback");
    Output::kv("Refresh", "POST /refresh");
    Output::kv("Articles", "GET  /articles");
    println!();
    Output::info("Press Ctrl+C to stop the server.");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(alive))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/command", post(command))
        .route("/feedback", post(feedback))
        .route("/refresh", post(refresh))
        .route("/articles", get(articles))
        .layer(cors)
        .with_state(state)
}

// === Request/Response Types ===

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    /// The message as a chat client would show it, with its `Question: ` header.
    message: String,
    answer: String,
    sources: Vec<RelevantArticle>,
}

#[derive(Deserialize)]
struct CommandRequest {
    message: String,
}

#[derive(Deserialize)]
struct FeedbackRequest {
    /// The answer message the feedback refers to.
    message: String,
    feedback: Feedback,
}

#[derive(Serialize)]
struct FeedbackResponse {
    message: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// === Handlers ===

async fn alive() -> &'static str {
    "Bot is alive"
}

async fn health() -> &'static str {
    "OK"
}

async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> impl IntoResponse {
    let question = req.question.trim();
    if question.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "question must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    let (reply, answer) = state.bot.answer(question).await;
    Json(AskResponse {
        message: reply.content,
        answer: answer.text,
        sources: answer.sources,
    })
    .into_response()
}

async fn command(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CommandRequest>,
) -> impl IntoResponse {
    match state.bot.handle_message(&req.message).await {
        Some(reply) => Json::<Reply>(reply).into_response(),
        None => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse {
                error: "not a command; see !help".to_string(),
            }),
        )
            .into_response(),
    }
}

async fn feedback(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FeedbackRequest>,
) -> impl IntoResponse {
    let message = state.bot.handle_feedback(&req.message, req.feedback).await;
    Json(FeedbackResponse { message })
}

async fn refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.bot.assistant().refresh().await {
        Ok(report) => Json(report).into_response(),
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
            .into_response(),
    }
}

async fn articles(State(state): State<Arc<AppState>>) -> Json<CacheSummary> {
    Json(state.bot.assistant().diagnose_cache())
}

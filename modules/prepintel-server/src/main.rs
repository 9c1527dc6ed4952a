use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use claude_client::ClaudeClient;
use prepintel_common::{ChatMessage, Config, PrepIntelError};
use prepintel_engine::{ChatModel, Engine};
use prepintel_retrieval::{
    HttpFetcher, NoopSearcher, SourceAggregator, SourceEnricher, TavilySearcher, WebSearcher,
};

// --- App State ---

struct AppState {
    engine: Engine,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("prepintel=info".parse()?))
        .init();

    let config = Config::from_env();
    config.log_redacted();

    let intent_model: Arc<dyn ChatModel> =
        Arc::new(ClaudeClient::new(&config.anthropic_api_key, &config.intent_model));
    let analysis_model: Arc<dyn ChatModel> =
        Arc::new(ClaudeClient::new(&config.anthropic_api_key, &config.analysis_model));

    let searcher: Arc<dyn WebSearcher> = if config.tavily_api_key.is_empty() {
        Arc::new(NoopSearcher)
    } else {
        Arc::new(TavilySearcher::new(&config.tavily_api_key))
    };
    let enricher = SourceEnricher::new(Arc::new(HttpFetcher::new()));
    let aggregator = SourceAggregator::new(searcher, enricher);

    let state = Arc::new(AppState {
        engine: Engine::new(intent_model, analysis_model, aggregator),
    });

    let app = Router::new()
        .route("/", get(health))
        .route("/chat", post(chat))
        .with_state(state)
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("PrepIntel server starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

async fn health() -> impl IntoResponse {
    "ok"
}

#[derive(Deserialize)]
struct ChatRequest {
    query: String,
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

async fn chat(State(state): State<Arc<AppState>>, Json(req): Json<ChatRequest>) -> Response {
    match state.engine.handle(&req.query, &req.messages).await {
        Ok(turn) => Json(json!({
            "answer": turn.answer,
            "sources": turn.sources,
            "intent": turn.intent,
            "messages": turn.messages,
        }))
        .into_response(),
        Err(PrepIntelError::InvalidRequest(message)) => {
            (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Chat turn failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal error" })),
            )
                .into_response()
        }
    }
}

mod config;
mod error;
mod models;
mod services;
mod utils;

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
};
use serde::Serialize;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use config::{ServiceConfig, TranslatorConfig};
use models::RunReport;
use services::host::{Assistant, ChatSurface, FileStore, GuideStructure, Host, HostClient};
use services::llm::LLMClient;
use services::translator::translate_course;

const ACTION_ID: &str = "translateContentButton";
const ACTION_LABEL: &str = "Translate the assignment for me please!";

#[derive(Clone)]
struct AppState {
    config: Arc<TranslatorConfig>,
    structure: Arc<dyn GuideStructure>,
    files: Arc<dyn FileStore>,
    chat: Arc<dyn ChatSurface>,
    assistant: Arc<dyn Assistant>,
    // Held for the length of a run; a second press while it is held is refused.
    run_lock: Arc<Mutex<()>>,
}

#[derive(Debug, Serialize)]
struct RegisteredAction {
    id: &'static str,
    label: &'static str,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let service_config = ServiceConfig::from_env()?;
    let translator_config = TranslatorConfig::from_env()?;
    tracing::info!("Service config: {}", serde_json::to_string(&service_config)?);
    tracing::info!(
        "Translating {} ({}) to {} ({})",
        translator_config.source_language,
        translator_config.source_extension(),
        translator_config.target_language,
        translator_config.target_extension()
    );

    let host = Arc::new(HostClient::new(
        service_config.host_api_url.clone(),
        service_config.host_api_token.clone(),
    ));

    // Prompts go to the host's coach unless a model endpoint is configured
    let assistant: Arc<dyn Assistant> = if service_config.llm_api_url.is_some() {
        Arc::new(LLMClient::new(&service_config)?)
    } else {
        host.clone()
    };

    let app_state = AppState {
        config: Arc::new(translator_config),
        structure: host.clone(),
        files: host.clone(),
        chat: host,
        assistant,
        run_lock: Arc::new(Mutex::new(())),
    };

    let app = router(app_state);

    let listener = TcpListener::bind(&service_config.bind_addr).await?;
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/actions", get(list_actions))
        .route("/actions/:id", post(run_action))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::AllowMethods::any())
                .allow_headers(tower_http::cors::AllowHeaders::any()),
        )
}

async fn index() -> Html<&'static str> {
    Html(
        r#"
    <!DOCTYPE html>
    <html>
    <head>
        <title>Coach Translator</title>
        <meta charset="utf-8">
        <style>
            body { font-family: Arial, sans-serif; margin: 40px; }
            .endpoint { background-color: #f5f5f5; padding: 10px; margin: 10px 0; border-radius: 4px; font-family: monospace; }
        </style>
    </head>
    <body>
        <h1>Coach Translator</h1>
        <p>Translates a course guide from one programming language to another, page by page.</p>

        <h2>Available Endpoints:</h2>
        <div class="endpoint">GET /health - Health check</div>
        <div class="endpoint">GET /actions - Registered coach actions</div>
        <div class="endpoint">POST /actions/translateContentButton - Run the translation</div>
    </body>
    </html>
    "#,
    )
}

async fn health_check() -> &'static str {
    "OK"
}

async fn list_actions() -> Json<Vec<RegisteredAction>> {
    Json(vec![RegisteredAction {
        id: ACTION_ID,
        label: ACTION_LABEL,
    }])
}

async fn run_action(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RunReport>, StatusCode> {
    if id != ACTION_ID {
        return Err(StatusCode::NOT_FOUND);
    }

    let Ok(_running) = state.run_lock.try_lock() else {
        warn!("Ignoring {} while a translation is already running", id);
        return Err(StatusCode::CONFLICT);
    };

    let host = Host {
        structure: state.structure.as_ref(),
        files: state.files.as_ref(),
        chat: state.chat.as_ref(),
        assistant: state.assistant.as_ref(),
    };
    let report = translate_course(&host, &state.config).await;

    Ok(Json(report))
}

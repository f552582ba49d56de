//! Stateless text-analysis endpoint sharing the chat's document analyzer.

use std::sync::Arc;

use anyhow::Result;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::JokeBotConfig;
use crate::intent::DocumentAnalyzer;

pub const MISSING_TEXT: &str = "Text input is required.";
pub const SERVER_ERROR: &str = "A server error occurred.";

type SharedAnalyzer = Arc<dyn DocumentAnalyzer>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResponse {
    pub original_text: String,
    pub sentence_count: usize,
    pub nouns: Vec<String>,
    pub entities: Vec<String>,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
}

pub fn router(analyzer: SharedAnalyzer) -> Router {
    Router::new()
        .route("/analyze", post(analyze))
        .with_state(analyzer)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

async fn analyze(State(analyzer): State<SharedAnalyzer>, body: Bytes) -> Response {
    let text = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("text").and_then(Value::as_str).map(str::to_string))
        .filter(|t| !t.is_empty());
    let Some(text) = text else {
        return failure(StatusCode::BAD_REQUEST, MISSING_TEXT);
    };

    match analyzer.analyze(&text) {
        Ok(doc) => {
            let response = AnalyzeResponse {
                sentence_count: doc.sentence_count(),
                nouns: doc.nouns(),
                entities: doc.entities().iter().map(|e| e.value.clone()).collect(),
                original_text: text,
                message: "Analysis successful!",
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!(error = %e, analyzer = analyzer.name(), "analysis failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, SERVER_ERROR)
        }
    }
}

fn failure(status: StatusCode, error: &'static str) -> Response {
    (status, Json(ErrorBody { error })).into_response()
}

/// Binds `HOST:PORT` and serves until the process exits.
pub async fn serve(config: &JokeBotConfig, analyzer: SharedAnalyzer) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Analysis server running on http://{}", addr);

    axum::serve(listener, router(analyzer)).await?;
    Ok(())
}

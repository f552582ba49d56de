use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use jokebot::error::AnalysisError;
use jokebot::intent::analyzer::Document;
use jokebot::intent::{DocumentAnalyzer, LexiconAnalyzer};
use jokebot::services::analyze::router;

struct FailingAnalyzer;

impl DocumentAnalyzer for FailingAnalyzer {
    fn name(&self) -> &str {
        "failing"
    }

    fn analyze(&self, _text: &str) -> Result<Document, AnalysisError> {
        Err(AnalysisError::Failed("boom".into()))
    }
}

async fn post(analyzer: Arc<dyn DocumentAnalyzer>, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = router(analyzer).oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_analyze_success() {
    let (status, body) = post(
        Arc::new(LexiconAnalyzer::new()),
        r#"{"text": "The cat sat on the mat. Email bob@example.com today!"}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["originalText"], "The cat sat on the mat. Email bob@example.com today!");
    assert_eq!(body["sentenceCount"], 2);
    assert_eq!(body["message"], "Analysis successful!");
    assert!(body["nouns"].as_array().unwrap().contains(&json!("cat")));
    assert_eq!(body["entities"], json!(["bob@example.com"]));
}

#[tokio::test]
async fn test_analyze_requires_text() {
    for payload in [r#"{}"#, r#"{"text": ""}"#, r#"{"text": 42}"#, "not json"] {
        let (status, body) = post(Arc::new(LexiconAnalyzer::new()), payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "payload {:?}", payload);
        assert_eq!(body, json!({ "error": "Text input is required." }));
    }
}

#[tokio::test]
async fn test_analyzer_failure_is_500() {
    let (status, body) = post(Arc::new(FailingAnalyzer), r#"{"text": "hello"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({ "error": "A server error occurred." }));
}

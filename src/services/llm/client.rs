use std::io;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;
use tracing::{debug, info};

use crate::backend::engine::{ChatMessage, ChatRequest, FragmentStream, LoadOptions, ModelEngine, ProgressCallback};
use crate::config::DEFAULT_OLLAMA_URL;
use crate::error::EngineError;

/// Share of the progress bar covered by the download; warm-up takes the rest.
const PULL_PROGRESS_SHARE: f32 = 0.9;
const MAX_LINE_BYTES: usize = 1 << 20;

/// Local model runtime reached over the Ollama HTTP API.
#[derive(Clone)]
pub struct OllamaEngine {
    client: Client,
    base_url: String,
}

#[derive(Serialize)]
struct PullRequest<'a> {
    model: &'a str,
    stream: bool,
}

#[derive(Deserialize)]
struct PullProgress {
    #[serde(default)]
    status: String,
    total: Option<u64>,
    completed: Option<u64>,
    error: Option<String>,
}

#[derive(Serialize)]
struct WarmupRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize)]
struct StreamChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: SamplingOptions,
}

#[derive(Serialize, Default)]
struct SamplingOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

#[derive(Deserialize)]
struct ChatChunk {
    message: Option<ChunkMessage>,
    #[serde(default)]
    done: bool,
    error: Option<String>,
}

#[derive(Deserialize)]
struct ChunkMessage {
    #[serde(default)]
    content: String,
}

impl Default for OllamaEngine {
    fn default() -> Self {
        Self::new(DEFAULT_OLLAMA_URL)
    }
}

impl OllamaEngine {
    pub fn new(base_url: impl Into<String>) -> Self {
        // Loads and generations have no overall deadline; only connecting is bounded.
        Self {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(5))
                .build()
                .unwrap_or_default(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn pull(&self, model_id: &str, progress: &ProgressCallback) -> Result<(), EngineError> {
        let response = self
            .client
            .post(format!("{}/api/pull", self.base_url))
            .json(&PullRequest { model: model_id, stream: true })
            .send()
            .await?;
        let mut lines = ndjson_lines(check_status(response).await?);

        while let Some(line) = lines.next().await {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let update: PullProgress =
                serde_json::from_str(&line).map_err(|e| EngineError::Malformed(e.to_string()))?;
            if let Some(error) = update.error {
                return Err(EngineError::Load(error));
            }
            if let (Some(total), Some(completed)) = (update.total, update.completed) {
                if total > 0 {
                    let fraction = (completed as f64 / total as f64) as f32;
                    progress(fraction.min(1.0) * PULL_PROGRESS_SHARE);
                }
            }
            if update.status == "success" {
                progress(PULL_PROGRESS_SHARE);
                return Ok(());
            }
            debug!(status = %update.status, "pull progress");
        }

        Err(EngineError::Stream("pull stream closed before success".into()))
    }

    async fn warm_up(&self, model_id: &str, options: LoadOptions) -> Result<(), EngineError> {
        let request = WarmupRequest {
            model: model_id,
            prompt: "",
            stream: false,
            options: SamplingOptions {
                temperature: options.temperature,
                top_p: Some(options.top_p),
                num_predict: None,
            },
        };
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl ModelEngine for OllamaEngine {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn reload(
        &self,
        model_id: &str,
        options: LoadOptions,
        progress: ProgressCallback,
    ) -> Result<(), EngineError> {
        info!(model = model_id, url = %self.base_url, "pulling model");
        self.pull(model_id, &progress).await?;
        self.warm_up(model_id, options).await?;
        progress(1.0);
        Ok(())
    }

    async fn stream_chat(&self, request: ChatRequest) -> Result<FragmentStream, EngineError> {
        let body = StreamChatRequest {
            model: &request.model,
            messages: &request.messages,
            stream: true,
            options: SamplingOptions {
                temperature: request.temperature,
                top_p: None,
                num_predict: Some(request.max_tokens),
            },
        };
        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await?;
        let lines = ndjson_lines(check_status(response).await?);

        let fragments = stream::unfold(Some(lines), |state| async move {
            let mut lines = state?;
            loop {
                let line = match lines.next().await {
                    Some(Ok(line)) => line,
                    Some(Err(e)) => return Some((Err(e), None)),
                    None => {
                        let eof = EngineError::Stream("chat stream closed before completion".into());
                        return Some((Err(eof), None));
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                let chunk: ChatChunk = match serde_json::from_str(&line) {
                    Ok(chunk) => chunk,
                    Err(e) => return Some((Err(EngineError::Malformed(e.to_string())), None)),
                };
                if let Some(error) = chunk.error {
                    return Some((Err(EngineError::Generation(error)), None));
                }
                let content = chunk.message.map(|m| m.content).unwrap_or_default();
                if chunk.done {
                    return if content.is_empty() { None } else { Some((Ok(content), None)) };
                }
                if !content.is_empty() {
                    return Some((Ok(content), Some(lines)));
                }
            }
        });

        Ok(fragments.boxed())
    }
}

async fn check_status(response: Response) -> Result<Response, EngineError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(EngineError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Splits a newline-delimited JSON body into lines as bytes arrive.
fn ndjson_lines(response: Response) -> BoxStream<'static, Result<String, EngineError>> {
    let bytes = response.bytes_stream().map(|chunk| chunk.map_err(io::Error::other));
    FramedRead::new(StreamReader::new(bytes), LinesCodec::new_with_max_length(MAX_LINE_BYTES))
        .map(|line| line.map_err(|e| EngineError::Stream(e.to_string())))
        .boxed()
}

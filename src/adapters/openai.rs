use crate::config::OpenAiSettings;
use crate::domain::model::{ChatMessage, ChatRequest};
use crate::domain::ports::{ByteStream, ChatModel, Embedder};
use crate::utils::error::{RagError, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "openai";

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

/// Embeddings and chat completions over the OpenAI REST API.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    base_url: String,
    api_key: String,
    embedding_model: String,
    request_timeout: Duration,
}

impl OpenAiClient {
    pub fn new(settings: &OpenAiSettings, api_key: impl Into<String>) -> Result<Self> {
        let request_timeout = Duration::from_secs(settings.timeout_seconds);
        // 串流回應可能很久，只限制連線與每次讀取的間隔
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_seconds))
            .read_timeout(request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            embedding_model: settings.embedding_model.clone(),
            request_timeout,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// `total` caps the whole exchange; streamed bodies pass `None` and rely on the read timeout.
    async fn post<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        total: Option<Duration>,
    ) -> Result<Response> {
        let url = self.endpoint(path);
        tracing::debug!("POST {}", url);

        let mut builder = self.client.post(&url).bearer_auth(&self.api_key).json(body);
        if let Some(total) = total {
            builder = builder.timeout(total);
        }
        let response = builder.send().await?;

        ensure_success(SERVICE, response).await
    }
}

/// Turns a non-2xx response into `UpstreamStatus`, keeping the body for the logs.
pub(crate) async fn ensure_success(service: &str, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::warn!("{} responded with {}: {}", service, status, body);
    Err(RagError::UpstreamStatus {
        service: service.to_string(),
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            input: text,
            model: &self.embedding_model,
        };

        let response: EmbeddingResponse = self
            .post("embeddings", &request, Some(self.request_timeout))
            .await?
            .json()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|data| data.embedding)
            .ok_or_else(|| RagError::processing("Embedding response contained no data"))
    }
}

#[async_trait]
impl ChatModel for OpenAiClient {
    async fn complete(&self, mut request: ChatRequest) -> Result<String> {
        request.stream = false;

        let response: CompletionResponse = self
            .post("chat/completions", &request, Some(self.request_timeout))
            .await?
            .json()
            .await?;

        response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RagError::processing("Chat completion returned no choices"))
    }

    async fn stream(&self, mut request: ChatRequest) -> Result<ByteStream> {
        request.stream = true;

        let response = self.post("chat/completions", &request, None).await?;
        tracing::debug!("Completion stream opened ({})", response.status());

        Ok(Box::pin(response.bytes_stream().map_err(RagError::from)))
    }
}

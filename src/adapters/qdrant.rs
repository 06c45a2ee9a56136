use crate::adapters::openai::ensure_success;
use crate::config::QdrantSettings;
use crate::domain::model::{Point, ScoredPoint, SearchRequest};
use crate::domain::ports::VectorStore;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SERVICE: &str = "qdrant";

#[derive(Deserialize)]
struct SearchResponse {
    result: Vec<ScoredPoint>,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    points: &'a [Point],
}

/// Point search and upsert against one Qdrant collection over REST.
#[derive(Debug, Clone)]
pub struct QdrantClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    collection: String,
}

impl QdrantClient {
    pub fn new(settings: &QdrantSettings) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_seconds))
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            collection: settings.collection.clone(),
        })
    }

    fn points_url(&self, suffix: &str) -> String {
        format!(
            "{}/collections/{}/points{}",
            self.base_url, self.collection, suffix
        )
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header("api-key", key),
            None => builder,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantClient {
    async fn search(&self, request: SearchRequest) -> Result<Vec<ScoredPoint>> {
        let url = self.points_url("/search");
        tracing::debug!("Searching {} (limit {})", url, request.limit);

        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await?;
        let body: SearchResponse = ensure_success(SERVICE, response).await?.json().await?;

        tracing::debug!("Search returned {} points", body.result.len());
        Ok(body.result)
    }

    async fn upsert(&self, points: Vec<Point>) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let url = self.points_url("");
        let response = self
            .authorize(self.client.put(&url))
            .json(&UpsertRequest { points: &points })
            .send()
            .await?;
        ensure_success(SERVICE, response).await?;

        tracing::debug!("Upserted {} points into {}", points.len(), self.collection);
        Ok(())
    }
}

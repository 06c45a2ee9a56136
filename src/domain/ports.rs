use crate::domain::model::{ChatRequest, ExtractedPages, PageText, Point, ScoredPoint, SearchRequest};
use crate::utils::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// Raw response body of a streamed chat completion.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;

    /// Relative paths of every file under `prefix`, sorted.
    fn list_files(
        &self,
        prefix: &str,
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn search(&self, request: SearchRequest) -> Result<Vec<ScoredPoint>>;
    async fn upsert(&self, points: Vec<Point>) -> Result<()>;
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, request: ChatRequest) -> Result<String>;
    async fn stream(&self, request: ChatRequest) -> Result<ByteStream>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<ExtractedPages>;
    async fn transform(&self, pages: Vec<PageText>) -> Result<Vec<Point>>;
    /// Returns the number of points written.
    async fn load(&self, points: Vec<Point>) -> Result<usize>;
}

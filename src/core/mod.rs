pub mod answer;
pub mod context;
pub mod engine;
pub mod ingest;
pub mod ocr;
pub mod prompt;
pub mod sse;

pub use crate::domain::model::{
    ChatMessage, ChatRequest, ExtractedPages, Filter, IngestReport, PageText, Point, ScoredPoint,
    SearchRequest, TextbookPage,
};
pub use crate::domain::ports::{ByteStream, ChatModel, Embedder, Pipeline, Storage, VectorStore};
pub use crate::utils::error::Result;

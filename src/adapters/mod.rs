// Adapters layer: concrete implementations of the domain ports.

pub mod openai;
pub mod qdrant;
pub mod storage;

pub use openai::OpenAiClient;
pub use qdrant::QdrantClient;
pub use storage::LocalStorage;

pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::{AskArgs, IngestArgs, ServeArgs};

pub use crate::adapters::{LocalStorage, OpenAiClient, QdrantClient};
pub use crate::config::Settings;
pub use crate::core::{answer::AnswerEngine, engine::IngestEngine, ingest::IngestPipeline};
pub use crate::utils::error::{RagError, Result};

#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{AskArgs, IngestArgs, ServeArgs};
pub use toml_config::{
    IngestSettings, OpenAiSettings, QdrantSettings, RetrievalSettings, ServerSettings, Settings,
    TextbookSettings,
};

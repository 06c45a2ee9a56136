use crate::adapters::{OpenAiClient, QdrantClient};
use crate::config::{RetrievalSettings, Settings};
use crate::core::context::{pages_from_points, select_within_budget};
use crate::core::prompt::PromptBuilder;
use crate::core::sse::relay_body;
use crate::domain::model::{ChatRequest, Filter, SearchRequest, TextbookPage};
use crate::domain::ports::{ByteStream, ChatModel, Embedder, VectorStore};
use crate::utils::error::{RagError, Result};
use std::sync::Arc;

/// Question answering over the indexed textbook.
///
/// Each call runs the whole chain: predict a passage, embed it, search,
/// trim to the word budget, then ask the answer model.
#[derive(Clone)]
pub struct AnswerEngine {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    chat: Arc<dyn ChatModel>,
    prompts: PromptBuilder,
    retrieval: RetrievalSettings,
    hyde_model: String,
    answer_model: String,
    temperature: f32,
    filter: Option<Filter>,
}

impl AnswerEngine {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        chat: Arc<dyn ChatModel>,
        settings: &Settings,
    ) -> Self {
        Self {
            embedder,
            store,
            chat,
            prompts: PromptBuilder::new(&settings.textbook),
            retrieval: settings.retrieval.clone(),
            hyde_model: settings.openai.hyde_model.clone(),
            answer_model: settings.openai.answer_model.clone(),
            temperature: settings.openai.temperature,
            filter: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let openai = Arc::new(OpenAiClient::new(&settings.openai, settings.openai_api_key()?)?);
        let qdrant = Arc::new(QdrantClient::new(&settings.qdrant)?);

        Ok(Self::new(openai.clone(), qdrant, openai, settings))
    }

    /// Restricts every search to points whose payload matches `filter`.
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub async fn predict_answer(&self, query: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.hyde_model.clone(),
            messages: self.prompts.hypothetical_passage(query),
            temperature: self.temperature,
            stream: false,
        };

        let predicted = self.chat.complete(request).await?;
        tracing::debug!("Predicted passage: {}", predicted);
        Ok(predicted)
    }

    pub async fn retrieve(&self, query: &str) -> Result<Vec<TextbookPage>> {
        let query = validate_query(query)?;

        let search_text = if self.retrieval.hyde {
            self.predict_answer(query).await?
        } else {
            query.to_string()
        };

        let vector = self.embedder.embed(&search_text).await?;
        let points = self
            .store
            .search(SearchRequest {
                vector,
                limit: self.retrieval.limit,
                filter: self.filter.clone(),
                with_payload: true,
            })
            .await?;

        let candidates = pages_from_points(points, self.retrieval.page_offset);
        let found = candidates.len();
        let pages = select_within_budget(candidates, self.retrieval.word_limit);

        tracing::info!(
            "📚 Retrieved {} pages, {} within the {}-word budget: {:?}",
            found,
            pages.len(),
            self.retrieval.word_limit,
            pages.iter().map(|p| p.page_number).collect::<Vec<_>>()
        );
        Ok(pages)
    }

    fn answer_request(&self, query: &str, pages: &[TextbookPage], stream: bool) -> ChatRequest {
        ChatRequest {
            model: self.answer_model.clone(),
            messages: self.prompts.answer(query, pages),
            temperature: self.temperature,
            stream,
        }
    }

    /// Streams the answer text as it is generated.
    pub async fn answer_stream(&self, query: &str) -> Result<ByteStream> {
        let pages = self.retrieve(query).await?;
        let request = self.answer_request(query.trim(), &pages, true);

        let body = self.chat.stream(request).await?;
        Ok(relay_body(body))
    }

    pub async fn answer(&self, query: &str) -> Result<String> {
        let pages = self.retrieve(query).await?;
        let request = self.answer_request(query.trim(), &pages, false);

        self.chat.complete(request).await
    }
}

fn validate_query(query: &str) -> Result<&str> {
    let query = query.trim();
    if query.is_empty() {
        return Err(RagError::ValidationError {
            message: "query must not be empty".to_string(),
        });
    }
    Ok(query)
}

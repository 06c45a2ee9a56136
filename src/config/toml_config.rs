use crate::utils::error::{RagError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub openai: OpenAiSettings,
    pub qdrant: QdrantSettings,
    pub retrieval: RetrievalSettings,
    pub textbook: TextbookSettings,
    pub server: ServerSettings,
    pub ingest: IngestSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    pub api_key: Option<String>,
    pub base_url: String,
    pub embedding_model: String,
    pub hyde_model: String,
    pub answer_model: String,
    pub temperature: f32,
    /// Whole-request limit for embeddings and plain completions; idle limit between stream reads.
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            embedding_model: "text-embedding-ada-002".to_string(),
            hyde_model: "gpt-3.5-turbo-0613".to_string(),
            answer_model: "gpt-3.5-turbo-16k-0613".to_string(),
            temperature: 0.0,
            timeout_seconds: 120,
            connect_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QdrantSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub timeout_seconds: u64,
    pub connect_timeout_seconds: u64,
}

impl Default for QdrantSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:6333".to_string(),
            api_key: None,
            collection: "sociology-help".to_string(),
            timeout_seconds: 30,
            connect_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    /// Number of nearest pages requested from the vector store.
    pub limit: usize,
    /// Total words of retrieved text allowed into the answer prompt.
    pub word_limit: usize,
    /// Subtracted from point ids to get printed page numbers.
    pub page_offset: i64,
    /// Embed a model-written passage instead of the raw question.
    pub hyde: bool,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            limit: 5,
            word_limit: 2400,
            page_offset: 0,
            hyde: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TextbookSettings {
    pub title: String,
    pub subject: String,
}

impl Default for TextbookSettings {
    fn default() -> Self {
        Self {
            title: "Social Statistics for a Diverse Society".to_string(),
            subject: "statistics / sociology".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub source_dir: String,
    pub prefix: String,
    pub concurrent_requests: usize,
    pub upsert_batch_size: usize,
    pub skip_blank_pages: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            source_dir: "./data".to_string(),
            prefix: "ocr/".to_string(),
            concurrent_requests: 4,
            upsert_batch_size: 20,
            skip_blank_pages: false,
        }
    }
}

impl Settings {
    /// 從 TOML 檔案載入設定，再套用環境變數
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RagError::IoError)?;
        let mut settings = Self::from_toml_str(&content)?;
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// 沒有設定檔時只用預設值與環境變數
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        settings.apply_env_overrides();
        settings
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::from_env()),
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| RagError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換 ${VAR_NAME}；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| RagError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    fn apply_env_overrides(&mut self) {
        if let Some(key) = env_value("OPENAI_SECRET_KEY") {
            self.openai.api_key = Some(key);
        }
        if let Some(base_url) = env_value("OPENAI_BASE_URL") {
            self.openai.base_url = base_url;
        }
        if let Some(url) = env_value("QDRANT_URL") {
            self.qdrant.url = url;
        }
        if let Some(key) = env_value("QDRANT_API_KEY") {
            self.qdrant.api_key = Some(key);
        }
        if let Some(collection) = env_value("QDRANT_COLLECTION") {
            self.qdrant.collection = collection;
        }
    }

    pub fn openai_api_key(&self) -> Result<&str> {
        validation::validate_required_field("openai.api_key", &self.openai.api_key)
            .map(String::as_str)
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        let api_key = self.openai_api_key()?;
        validation::validate_non_empty_string("openai.api_key", api_key)?;
        if api_key.contains("${") {
            return Err(RagError::InvalidConfigValueError {
                field: "openai.api_key".to_string(),
                value: api_key.to_string(),
                reason: "Environment variable was not substituted".to_string(),
            });
        }

        validation::validate_url("openai.base_url", &self.openai.base_url)?;
        validation::validate_non_empty_string("openai.embedding_model", &self.openai.embedding_model)?;
        validation::validate_non_empty_string("openai.answer_model", &self.openai.answer_model)?;
        validation::validate_range("openai.temperature", self.openai.temperature, 0.0, 2.0)?;
        validation::validate_range("openai.timeout_seconds", self.openai.timeout_seconds, 1, 3600)?;
        validation::validate_range(
            "openai.connect_timeout_seconds",
            self.openai.connect_timeout_seconds,
            1,
            300,
        )?;

        validation::validate_url("qdrant.url", &self.qdrant.url)?;
        validation::validate_non_empty_string("qdrant.collection", &self.qdrant.collection)?;
        validation::validate_range("qdrant.timeout_seconds", self.qdrant.timeout_seconds, 1, 3600)?;
        validation::validate_range(
            "qdrant.connect_timeout_seconds",
            self.qdrant.connect_timeout_seconds,
            1,
            300,
        )?;

        validation::validate_positive_number("retrieval.limit", self.retrieval.limit, 1)?;
        validation::validate_range("retrieval.limit", self.retrieval.limit, 1, 100)?;
        validation::validate_positive_number("retrieval.word_limit", self.retrieval.word_limit, 1)?;

        validation::validate_path("ingest.source_dir", &self.ingest.source_dir)?;
        validation::validate_range(
            "ingest.concurrent_requests",
            self.ingest.concurrent_requests,
            1,
            64,
        )?;
        validation::validate_positive_number(
            "ingest.upsert_batch_size",
            self.ingest.upsert_batch_size,
            1,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_match_chat_endpoint() {
        let settings = Settings::default();

        assert_eq!(settings.retrieval.limit, 5);
        assert_eq!(settings.retrieval.word_limit, 2400);
        assert_eq!(settings.retrieval.page_offset, 0);
        assert_eq!(settings.openai.embedding_model, "text-embedding-ada-002");
        assert_eq!(settings.qdrant.collection, "sociology-help");
    }

    #[test]
    fn test_parse_partial_toml() {
        let toml_content = r#"
[openai]
api_key = "sk-test"

[retrieval]
limit = 3
page_offset = 28

[textbook]
title = "The Practice of Statistics"
subject = "AP Statistics"
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();

        assert_eq!(settings.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(settings.retrieval.limit, 3);
        assert_eq!(settings.retrieval.page_offset, 28);
        assert_eq!(settings.retrieval.word_limit, 2400);
        assert_eq!(settings.textbook.subject, "AP Statistics");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEXTBOOK_HELPER_TEST_COLLECTION", "stats-helper");

        let toml_content = r#"
[qdrant]
collection = "${TEXTBOOK_HELPER_TEST_COLLECTION}"
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert_eq!(settings.qdrant.collection, "stats-helper");

        std::env::remove_var("TEXTBOOK_HELPER_TEST_COLLECTION");
    }

    #[test]
    fn test_missing_api_key_fails_validation() {
        let settings = Settings::from_toml_str("[retrieval]\nlimit = 5\n").unwrap();
        let err = settings.validate().unwrap_err();
        assert!(matches!(err, RagError::MissingConfigError { .. }));
    }

    #[test]
    fn test_unsubstituted_api_key_fails_validation() {
        let toml_content = r#"
[openai]
api_key = "${TEXTBOOK_HELPER_TEST_UNSET_KEY}"
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert!(matches!(
            settings.validate(),
            Err(RagError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_invalid_qdrant_url() {
        let toml_content = r#"
[openai]
api_key = "sk-test"

[qdrant]
url = "not a url"
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_zero_timeout_fails_validation() {
        let toml_content = r#"
[openai]
api_key = "sk-test"

[qdrant]
timeout_seconds = 0
"#;

        let settings = Settings::from_toml_str(toml_content).unwrap();
        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("qdrant.timeout_seconds"));
    }

    #[test]
    fn test_settings_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nport = 8088\n\n[ingest]\nupsert_batch_size = 50\n")
            .unwrap();

        let settings = Settings::from_file(temp_file.path()).unwrap();
        assert_eq!(settings.server.port, 8088);
        assert_eq!(settings.ingest.upsert_batch_size, 50);
    }
}

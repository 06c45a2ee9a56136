use crate::adapters::{LocalStorage, OpenAiClient, QdrantClient};
use crate::config::{IngestSettings, Settings};
use crate::core::ocr::parse_ocr_output;
use crate::core::{Embedder, ExtractedPages, PageText, Pipeline, Point, Storage, VectorStore};
use crate::utils::error::{RagError, Result};
use futures::{StreamExt, TryStreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Loads OCR'd pages into the vector collection, one point per page.
pub struct IngestPipeline<S: Storage> {
    storage: S,
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    settings: IngestSettings,
}

impl<S: Storage> IngestPipeline<S> {
    pub fn new(
        storage: S,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            storage,
            embedder,
            store,
            settings,
        }
    }
}

impl IngestPipeline<LocalStorage> {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let storage = LocalStorage::new(&settings.ingest.source_dir);
        let openai = OpenAiClient::new(&settings.openai, settings.openai_api_key()?)?;
        let qdrant = QdrantClient::new(&settings.qdrant)?;

        Ok(Self::new(
            storage,
            Arc::new(openai),
            Arc::new(qdrant),
            settings.ingest.clone(),
        ))
    }
}

#[async_trait::async_trait]
impl<S: Storage> Pipeline for IngestPipeline<S> {
    async fn extract(&self) -> Result<ExtractedPages> {
        let files: Vec<String> = self
            .storage
            .list_files(&self.settings.prefix)
            .await?
            .into_iter()
            .filter(|path| path.ends_with(".json"))
            .collect();

        if files.is_empty() {
            return Err(RagError::processing(format!(
                "No OCR output found under '{}'",
                self.settings.prefix
            )));
        }

        let mut extracted = ExtractedPages {
            files: files.len(),
            ..ExtractedPages::default()
        };

        for path in &files {
            tracing::debug!("Reading {}", path);
            let data = self.storage.read_file(path).await?;
            let parsed = parse_ocr_output(path, &data, self.settings.skip_blank_pages)?;

            tracing::debug!("{}: {} pages", path, parsed.pages.len());
            extracted.skipped += parsed.skipped;
            extracted.pages.extend(parsed.pages);
        }

        Ok(extracted)
    }

    async fn transform(&self, pages: Vec<PageText>) -> Result<Vec<Point>> {
        let total = pages.len();
        let embedder = &self.embedder;

        futures::stream::iter(pages.into_iter().enumerate())
            .map(|(index, page)| async move {
                let vector = embedder.embed(&page.text).await?;
                if (index + 1) % 25 == 0 || index + 1 == total {
                    tracing::info!("🧮 Embedded {}/{} pages", index + 1, total);
                }

                let mut payload = Map::new();
                payload.insert("text".to_string(), Value::String(page.text));
                Ok::<_, RagError>(Point {
                    id: page.page_number,
                    payload,
                    vector,
                })
            })
            .buffered(self.settings.concurrent_requests.max(1))
            .try_collect()
            .await
    }

    async fn load(&self, mut points: Vec<Point>) -> Result<usize> {
        let total = points.len();
        let batch_size = self.settings.upsert_batch_size.max(1);

        while !points.is_empty() {
            let rest = points.split_off(batch_size.min(points.len()));
            let first = points.first().map(|p| p.id).unwrap_or_default();
            let last = points.last().map(|p| p.id).unwrap_or_default();

            self.store.upsert(points).await?;
            tracing::debug!("Upserted pages {}..={}", first, last);
            points = rest;
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ScoredPoint, SearchRequest};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MemoryStorage {
        files: HashMap<String, Vec<u8>>,
    }

    impl Storage for MemoryStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            self.files.get(path).cloned().ok_or_else(|| {
                RagError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
            let mut files: Vec<String> = self
                .files
                .keys()
                .filter(|k| k.starts_with(prefix))
                .cloned()
                .collect();
            files.sort();
            Ok(files)
        }
    }

    struct LengthEmbedder;

    #[async_trait]
    impl Embedder for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32])
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        batches: Mutex<Vec<Vec<u64>>>,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn search(&self, _request: SearchRequest) -> Result<Vec<ScoredPoint>> {
            Ok(Vec::new())
        }

        async fn upsert(&self, points: Vec<Point>) -> Result<()> {
            self.batches
                .lock()
                .unwrap()
                .push(points.iter().map(|p| p.id).collect());
            Ok(())
        }
    }

    fn ocr_json(pages: &[(u64, &str)]) -> Vec<u8> {
        let responses: Vec<Value> = pages
            .iter()
            .map(|(n, text)| {
                serde_json::json!({"context": {"pageNumber": n}, "fullTextAnnotation": {"text": text}})
            })
            .collect();
        serde_json::to_vec(&serde_json::json!({ "responses": responses })).unwrap()
    }

    fn pipeline(
        files: Vec<(&str, Vec<u8>)>,
        settings: IngestSettings,
    ) -> (IngestPipeline<MemoryStorage>, Arc<RecordingStore>) {
        let storage = MemoryStorage {
            files: files
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        };
        let store = Arc::new(RecordingStore::default());
        let pipeline = IngestPipeline::new(storage, Arc::new(LengthEmbedder), store.clone(), settings);
        (pipeline, store)
    }

    #[tokio::test]
    async fn test_extract_reads_json_files_in_order() {
        let (pipeline, _) = pipeline(
            vec![
                ("ocr/output-3-to-4.json", ocr_json(&[(3, "three"), (4, "four")])),
                ("ocr/output-1-to-2.json", ocr_json(&[(1, "one"), (2, "two")])),
                ("ocr/notes.txt", b"ignored".to_vec()),
            ],
            IngestSettings::default(),
        );

        let extracted = pipeline.extract().await.unwrap();

        assert_eq!(extracted.files, 2);
        assert_eq!(
            extracted.pages.iter().map(|p| p.page_number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
    }

    #[tokio::test]
    async fn test_extract_without_files_is_error() {
        let (pipeline, _) = pipeline(vec![], IngestSettings::default());
        assert!(pipeline.extract().await.is_err());
    }

    #[tokio::test]
    async fn test_transform_preserves_page_order_with_concurrency() {
        let settings = IngestSettings {
            concurrent_requests: 3,
            ..IngestSettings::default()
        };
        let (pipeline, _) = pipeline(vec![], settings);
        let pages = (1..=10)
            .map(|n| PageText {
                page_number: n,
                text: "x".repeat(n as usize),
            })
            .collect();

        let points = pipeline.transform(pages).await.unwrap();

        assert_eq!(points.len(), 10);
        for (i, point) in points.iter().enumerate() {
            assert_eq!(point.id, i as u64 + 1);
            assert_eq!(point.vector, vec![(i + 1) as f32]);
            assert_eq!(point.payload["text"], "x".repeat(i + 1));
        }
    }

    #[tokio::test]
    async fn test_load_upserts_in_batches() {
        let settings = IngestSettings {
            upsert_batch_size: 2,
            ..IngestSettings::default()
        };
        let (pipeline, store) = pipeline(vec![], settings);
        let points = (1..=5)
            .map(|id| Point {
                id,
                payload: Map::new(),
                vector: vec![0.0],
            })
            .collect();

        let written = pipeline.load(points).await.unwrap();

        assert_eq!(written, 5);
        assert_eq!(
            *store.batches.lock().unwrap(),
            vec![vec![1, 2], vec![3, 4], vec![5]]
        );
    }
}

use crate::core::{ExtractedPages, IngestReport, Pipeline};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use chrono::Utc;

pub struct IngestEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> IngestEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<IngestReport> {
        let started_at = Utc::now();
        tracing::info!("🚀 Starting ingest");
        self.monitor.log_stats("Start");

        // Extract
        let extracted = self.pipeline.extract().await?;
        let files = extracted.files;
        let skipped = extracted.skipped;
        let pages = extracted.pages.len();
        tracing::info!(
            "📄 Extracted {} pages from {} files ({} skipped)",
            pages,
            files,
            skipped
        );
        self.monitor.log_stats("Extract");

        // Transform
        let points = self.pipeline.transform(extracted.pages).await?;
        tracing::info!("🧮 Embedded {} pages", points.len());
        self.monitor.log_stats("Transform");

        // Load
        let written = self.pipeline.load(points).await?;
        tracing::info!("📥 Upserted {} points", written);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(IngestReport {
            files,
            pages,
            points: written,
            skipped,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Runs only the extract phase.
    pub async fn dry_run(&self) -> Result<ExtractedPages> {
        let extracted = self.pipeline.extract().await?;
        tracing::info!(
            "🔍 Would embed {} pages from {} files ({} skipped)",
            extracted.pages.len(),
            extracted.files,
            extracted.skipped
        );
        Ok(extracted)
    }
}

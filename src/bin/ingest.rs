use clap::Parser;
use textbook_helper::core::context::word_count;
use textbook_helper::utils::error::ErrorSeverity;
use textbook_helper::utils::{logger, validation::Validate};
use textbook_helper::{IngestArgs, IngestEngine, IngestPipeline, Settings};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = IngestArgs::parse();

    // 初始化日誌
    logger::init_cli_logger(args.verbose);
    tracing::info!("Starting textbook-ingest");

    let mut settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Failed to load configuration: {}", e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };
    args.apply(&mut settings);

    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    tracing::info!(
        "📁 Source: {}/{} -> collection '{}' (concurrency {}, batch {})",
        settings.ingest.source_dir,
        settings.ingest.prefix,
        settings.qdrant.collection,
        settings.ingest.concurrent_requests,
        settings.ingest.upsert_batch_size
    );

    let pipeline = IngestPipeline::from_settings(&settings)?;
    let engine = IngestEngine::new_with_monitoring(pipeline, args.monitor);

    if args.dry_run {
        let extracted = engine.dry_run().await?;
        for page in &extracted.pages {
            println!("page {:>4}: {} words", page.page_number, word_count(&page.text));
        }
        return Ok(());
    }

    match engine.run().await {
        Ok(report) => {
            let elapsed = report.finished_at - report.started_at;
            tracing::info!("✅ Ingest completed in {}s", elapsed.num_seconds());
            println!(
                "✅ Upserted {} points from {} pages in {} files ({} skipped)",
                report.points, report.pages, report.files, report.skipped
            );
        }
        Err(e) => {
            tracing::error!(
                "❌ Ingest failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());

            let exit_code = match e.severity() {
                ErrorSeverity::Low => 0,
                ErrorSeverity::Medium => 2,
                ErrorSeverity::High => 1,
                ErrorSeverity::Critical => 3,
            };
            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}

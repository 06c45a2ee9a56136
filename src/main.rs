use clap::Parser;
use textbook_helper::app::server;
use textbook_helper::utils::error::ErrorSeverity;
use textbook_helper::utils::{logger, validation::Validate};
use textbook_helper::{AnswerEngine, RagError, ServeArgs, Settings};

fn exit_code(e: &RagError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(context: &str, e: RagError) -> ! {
    tracing::error!(
        "❌ {}: {} (Category: {:?}, Severity: {:?})",
        context,
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());
    std::process::exit(exit_code(&e).max(1));
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = ServeArgs::parse();

    if args.json_logs {
        logger::init_json_logger(args.verbose);
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("Starting textbook-helper");

    let mut settings = match Settings::load(args.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => fail("Failed to load configuration", e),
    };
    args.apply(&mut settings);

    if let Err(e) = settings.validate() {
        fail("Configuration validation failed", e);
    }
    tracing::debug!("Settings: {:?}", settings.retrieval);

    let engine = match AnswerEngine::from_settings(&settings) {
        Ok(engine) => engine,
        Err(e) => fail("Failed to build answer engine", e),
    };

    tracing::info!(
        "📚 Serving \"{}\" from collection '{}'",
        settings.textbook.title,
        settings.qdrant.collection
    );

    server::run(engine, &settings.server)?.await
}

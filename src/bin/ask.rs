use anyhow::Context;
use clap::Parser;
use futures::StreamExt;
use std::io::Write;
use textbook_helper::utils::{logger, validation::Validate};
use textbook_helper::{AnswerEngine, AskArgs, Settings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AskArgs::parse();
    logger::init_cli_logger(args.verbose);

    let mut settings =
        Settings::load(args.config.as_deref()).context("failed to load configuration")?;
    args.apply(&mut settings);

    if let Err(e) = settings.validate() {
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(1);
    }

    let engine = AnswerEngine::from_settings(&settings)?;

    if args.no_stream {
        let answer = engine.answer(&args.query).await?;
        println!("{}", answer);
        return Ok(());
    }

    let mut answer = engine.answer_stream(&args.query).await?;
    let mut stdout = std::io::stdout().lock();
    while let Some(chunk) = answer.next().await {
        stdout.write_all(&chunk?)?;
        stdout.flush()?;
    }
    writeln!(stdout)?;

    Ok(())
}

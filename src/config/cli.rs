use crate::config::Settings;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "textbook-helper")]
#[command(about = "Chat endpoint answering questions from an indexed textbook")]
pub struct ServeArgs {
    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub host: Option<String>,

    #[arg(short, long)]
    pub port: Option<u16>,

    /// Emit JSON log lines
    #[arg(long)]
    pub json_logs: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ServeArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(host) = &self.host {
            settings.server.host = host.clone();
        }
        if let Some(port) = self.port {
            settings.server.port = port;
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "textbook-ask")]
#[command(about = "Answer a single question from the indexed textbook")]
pub struct AskArgs {
    /// The question to answer
    pub query: String,

    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override the id-to-page offset
    #[arg(long, allow_hyphen_values = true)]
    pub page_offset: Option<i64>,

    /// Embed the question directly instead of a predicted answer
    #[arg(long)]
    pub no_hyde: bool,

    /// Wait for the full answer instead of streaming it
    #[arg(long)]
    pub no_stream: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl AskArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(offset) = self.page_offset {
            settings.retrieval.page_offset = offset;
        }
        if self.no_hyde {
            settings.retrieval.hyde = false;
        }
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "textbook-ingest")]
#[command(about = "Embed OCR output and load it into the vector collection")]
pub struct IngestArgs {
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding the OCR output
    #[arg(long)]
    pub source_dir: Option<String>,

    /// Sub-directory of the OCR JSON files
    #[arg(long)]
    pub prefix: Option<String>,

    #[arg(long)]
    pub concurrent_requests: Option<usize>,

    /// Skip pages without recognized text instead of failing
    #[arg(long)]
    pub skip_blank_pages: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    /// List the pages that would be embedded without calling any API
    #[arg(long)]
    pub dry_run: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl IngestArgs {
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(dir) = &self.source_dir {
            settings.ingest.source_dir = dir.clone();
        }
        if let Some(prefix) = &self.prefix {
            settings.ingest.prefix = prefix.clone();
        }
        if let Some(concurrent) = self.concurrent_requests {
            settings.ingest.concurrent_requests = concurrent;
        }
        if self.skip_blank_pages {
            settings.ingest.skip_blank_pages = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ask_args_override_settings() {
        let args = AskArgs::parse_from([
            "textbook-ask",
            "--page-offset",
            "-28",
            "--no-hyde",
            "Why confidence instead of probability?",
        ]);
        let mut settings = Settings::default();
        args.apply(&mut settings);

        assert_eq!(settings.retrieval.page_offset, -28);
        assert!(!settings.retrieval.hyde);
        assert_eq!(args.query, "Why confidence instead of probability?");
    }

    #[test]
    fn test_ingest_args_keep_config_when_absent() {
        let args = IngestArgs::parse_from(["textbook-ingest", "--dry-run"]);
        let mut settings = Settings::default();
        settings.ingest.concurrent_requests = 8;
        args.apply(&mut settings);

        assert_eq!(settings.ingest.concurrent_requests, 8);
        assert!(args.dry_run);
        assert!(!settings.ingest.skip_blank_pages);
    }
}

use clap::{Parser, Subcommand};
use pubscrape::apis::ieee::IeeeJournalCrawler;
use pubscrape::apis::springer::SpringerConferenceCrawler;
use pubscrape::app::ports::HttpClientPort;
use pubscrape::config::{ApiKeys, Config};
use pubscrape::constants::{self, CONFERENCE_PIPELINE, JOURNAL_PIPELINE};
use pubscrape::infra::http_client::ReqwestHttp;
use pubscrape::logging;
use pubscrape::pipeline::Pipeline;
use pubscrape::types::PublicationSource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn, Instrument};

#[derive(Parser)]
#[command(name = "pubscrape")]
#[command(about = "Publication metadata scraper for conference proceedings and journal APIs")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (default: pubscrape.toml if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Target years, comma-separated, newest first (e.g. 2023,2022)
    #[arg(long, global = true)]
    years: Option<String>,

    /// Directory for the CSV output
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the conference proceedings (HTML)
    Conference,
    /// Query the journal article API (JSON)
    Journal,
    /// Run both pipelines, conference first
    Run,
}

fn create_source(
    name: &str,
    http: Arc<dyn HttpClientPort>,
    config: &Config,
) -> Option<Box<dyn PublicationSource>> {
    match name {
        CONFERENCE_PIPELINE => Some(Box::new(SpringerConferenceCrawler::new(http, config))),
        JOURNAL_PIPELINE => Some(Box::new(IeeeJournalCrawler::new(http, config))),
        _ => None,
    }
}

async fn run_pipelines(names: &[&str], http: Arc<dyn HttpClientPort>, config: &Config) {
    for name in names {
        let span = tracing::info_span!("Running pipeline", pipeline = %name);
        run_pipeline(name, http.clone(), config)
            .instrument(span)
            .await;
    }
}

async fn run_pipeline(name: &str, http: Arc<dyn HttpClientPort>, config: &Config) {
    let Some(source) = create_source(name, http, config) else {
        warn!("Unknown pipeline specified");
        println!("⚠️  Unknown pipeline: {}", name);
        return;
    };

    match Pipeline::run(source.as_ref(), config).await {
        Ok(result) => {
            info!("Pipeline finished");
            println!("\n📊 Pipeline Results for {}:", result.venue);
            println!("   Units processed: {}", result.units_processed);
            println!("   Units skipped: {}", result.units_skipped);
            println!("   Records written: {}", result.records_written);
            println!("   Output file: {}", result.output_file);

            if !result.errors.is_empty() {
                warn!("{} errors encountered during pipeline run", result.errors.len());
                println!("\n⚠️  Errors encountered:");
                for error in &result.errors {
                    println!("   - {}", error);
                }
            }
        }
        Err(e) => {
            error!("Pipeline failed: {}", e);
            println!("❌ Pipeline {} failed: {}", name, e);
        }
    }
}

fn parse_years(list: &str) -> Vec<String> {
    list.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _log_guard = logging::init_logging();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(years) = cli.years.as_deref() {
        config.target_years = parse_years(years);
    }
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    config.validate()?;
    let config = config.with_api_keys(ApiKeys::from_env());

    let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new());

    let names = match cli.command {
        Commands::Conference => vec![CONFERENCE_PIPELINE],
        Commands::Journal => vec![JOURNAL_PIPELINE],
        Commands::Run => constants::get_supported_pipelines(),
    };

    println!("🔄 Collecting years: {}", config.target_years.join(", "));
    run_pipelines(&names, http, &config).await;
    println!("--------------Data has been written----------------------------");
    Ok(())
}

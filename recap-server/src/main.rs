use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use recap_core::completion::{CompletionBackend, CompletionConfig, OpenRouterClient};
use recap_core::speech::{SpeechClient, SpeechConfig};
use recap_core::RecapConfig;
use tokio::sync::{broadcast, Semaphore};
use tracing_subscriber::{fmt, EnvFilter};

use recap_server::http::{self, HttpState};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "recap.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (dev convenience — production uses real env vars)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Init logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    // Load config
    let config = match RecapConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    // Connect to DB
    let pool = match recap_core::db::create_pool_with_retry(&config.database).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to connect to database: {}", e);
            std::process::exit(1);
        }
    };

    if args.health {
        match recap_core::db::health_check(&pool).await {
            Ok(v) => println!("✅ PostgreSQL connected: {}", v),
            Err(e) => {
                println!("❌ PostgreSQL connection failed: {}", e);
                std::process::exit(1);
            }
        }

        println!("✅ Recap DB health check passed");
        return Ok(());
    }

    // Shutdown signal
    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for Ctrl+C");
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    // Completion backend — built once here and injected; requests fail with a
    // configuration error when the key is absent rather than at startup.
    let summarizer: Option<Arc<dyn CompletionBackend>> = {
        let completion_config = CompletionConfig {
            api_key: std::env::var("OPENROUTER_API_KEY").unwrap_or_default(),
            max_tokens: config.summarizer.max_tokens,
            timeout: Duration::from_secs(config.summarizer.request_timeout_seconds),
            referer: config.summarizer.app_url.clone(),
            title: config.summarizer.app_title.clone(),
        };
        match OpenRouterClient::with_base_url(
            completion_config,
            config.summarizer.base_url.clone(),
        ) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("Summarization disabled: {}", e);
                None
            }
        }
    };

    // Speech client — same injection policy as the completion backend.
    let speech: Option<Arc<SpeechClient>> = {
        let speech_config = SpeechConfig {
            api_key: std::env::var("ELEVENLABS_API_KEY").unwrap_or_default(),
            model_id: config.speech.model_id.clone(),
            output_format: config.speech.output_format.clone(),
        };
        match SpeechClient::with_base_url(speech_config, config.speech.base_url.clone()) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                tracing::warn!("Text-to-speech disabled: {}", e);
                None
            }
        }
    };

    let limiter = Arc::new(Semaphore::new(config.summarizer.max_concurrent));

    let state = Arc::new(HttpState {
        pool,
        config,
        summarizer,
        speech,
        limiter,
    });

    http::start_http_server(state, tx.subscribe()).await?;

    Ok(())
}

//! recap-seed — load transcripts and the default login into the database
//!
//! Reads a JSON array of `{title, content}` records and upserts each
//! transcript by its unique title, so re-running the seed refreshes content
//! without duplicating rows. Also creates the default `admin` user when it
//! does not exist yet.

use clap::Parser;
use recap_core::{RecapConfig, RecapError};
use serde::Deserialize;
use sqlx::PgPool;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "recap.toml")]
    config: String,

    /// Path to the transcripts JSON file
    #[arg(short, long, default_value = "recap-seed/data/voice_transcripts.json")]
    data: String,
}

#[derive(Debug, Deserialize)]
struct SeedTranscript {
    title: String,
    content: String,
}

async fn seed_default_user(pool: &PgPool) -> Result<(), sqlx::Error> {
    // plaintext by product decision; see migrations/0001_init.sql
    let result = sqlx::query(
        "INSERT INTO users (username, password) VALUES ('admin', 'password')
         ON CONFLICT (username) DO NOTHING",
    )
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        tracing::info!("Created default user 'admin'");
    } else {
        tracing::info!("Default user 'admin' already present");
    }

    Ok(())
}

async fn seed_transcripts(
    pool: &PgPool,
    transcripts: &[SeedTranscript],
) -> Result<usize, sqlx::Error> {
    for transcript in transcripts {
        sqlx::query(
            "INSERT INTO transcripts (title, content) VALUES ($1, $2)
             ON CONFLICT (title) DO UPDATE SET content = EXCLUDED.content",
        )
        .bind(&transcript.title)
        .bind(&transcript.content)
        .execute(pool)
        .await?;
    }

    Ok(transcripts.len())
}

#[tokio::main]
async fn main() -> Result<(), RecapError> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();

    let config = match RecapConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    let pool = recap_core::db::create_pool(&config.database).await?;

    let raw = std::fs::read_to_string(&args.data)?;
    let transcripts: Vec<SeedTranscript> = serde_json::from_str(&raw)?;

    seed_default_user(&pool).await?;
    let count = seed_transcripts(&pool, &transcripts).await?;

    tracing::info!("Seeded {} transcripts from {}", count, args.data);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_file_parses() {
        let raw = include_str!("../data/voice_transcripts.json");
        let transcripts: Vec<SeedTranscript> =
            serde_json::from_str(raw).expect("Seed data must parse");

        assert!(!transcripts.is_empty());
        for t in &transcripts {
            assert!(!t.title.trim().is_empty(), "Every transcript needs a title");
            assert!(!t.content.trim().is_empty(), "Every transcript needs content");
        }
    }

    #[test]
    fn test_seed_titles_are_unique() {
        let raw = include_str!("../data/voice_transcripts.json");
        let transcripts: Vec<SeedTranscript> =
            serde_json::from_str(raw).expect("Seed data must parse");

        let mut titles: Vec<&str> = transcripts.iter().map(|t| t.title.as_str()).collect();
        titles.sort_unstable();
        titles.dedup();
        assert_eq!(titles.len(), transcripts.len(), "Titles are the upsert key");
    }
}

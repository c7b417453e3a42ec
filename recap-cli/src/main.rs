//! recap-cli — terminal frontend for the recap summarization server
//!
//! # Subcommands
//! - `transcripts`                       — list stored transcripts
//! - `summaries <transcript-id>`         — read persisted summaries
//! - `summarize <transcript-id> -m <model>…` — trigger a fan-out
//! - `status`                            — show server health

use clap::{Parser, Subcommand};
use serde::Deserialize;

const DEFAULT_SERVER: &str = "http://127.0.0.1:8780";

const DEFAULT_PROMPT: &str = "Please provide a concise summary of this voice note, \
highlighting the key points and main topics discussed.";

const DEFAULT_TEMPERATURE: f64 = 0.3;

// ============================================================================
// CLI Definition
// ============================================================================

#[derive(Debug, Parser)]
#[command(
    name = "recap-cli",
    version,
    about = "Recap — voice-note summarization from the terminal"
)]
struct Cli {
    /// Recap HTTP server URL (overrides RECAP_HTTP_URL env var)
    #[arg(long, env = "RECAP_HTTP_URL", default_value = DEFAULT_SERVER)]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List stored transcripts
    Transcripts {
        /// Output the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Read persisted summaries for a transcript
    Summaries {
        /// Transcript id (UUID)
        transcript_id: String,

        /// Restrict to one or more models (repeatable)
        #[arg(short, long)]
        model: Vec<String>,

        /// Output the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Generate summaries with 1–3 models
    Summarize {
        /// Transcript id (UUID)
        transcript_id: String,

        /// Model identifier (repeatable, max 3)
        #[arg(short, long, required = true)]
        model: Vec<String>,

        /// Summarization prompt
        #[arg(long, default_value = DEFAULT_PROMPT)]
        prompt: String,

        /// Sampling temperature, 0–1
        #[arg(short, long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f64,

        /// Output the raw JSON response
        #[arg(long)]
        json: bool,
    },

    /// Show recap server status
    Status,
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TranscriptItem {
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct TranscriptsResponse {
    pub transcripts: Vec<TranscriptItem>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryItem {
    pub id: String,
    pub content: String,
    #[serde(rename = "modelUsed")]
    pub model_used: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct SummariesResponse {
    pub summaries: Vec<SummaryItem>,
}

#[derive(Debug, Deserialize)]
pub struct SummaryEntry {
    pub model: String,
    pub status: String,
    pub persisted: bool,
    pub summary: Option<SummaryItem>,
    pub error: Option<EntryError>,
}

#[derive(Debug, Deserialize)]
pub struct EntryError {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SummarizeResponse {
    pub partial: bool,
    pub results: Vec<SummaryEntry>,
}

// ============================================================================
// Output helpers
// ============================================================================

/// Short display name for a model id: "meta-llama/llama-4-scout:free"
/// becomes "llama-4-scout".
pub fn model_display_name(model: &str) -> &str {
    model
        .split('/')
        .nth(1)
        .and_then(|rest| rest.split(':').next())
        .unwrap_or(model)
}

/// First `max` characters of a text, on one line.
pub fn preview(text: &str, max: usize) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(max)
        .collect()
}

fn print_summary_entry(entry: &SummaryEntry) {
    match (&entry.summary, &entry.error) {
        (Some(summary), _) if entry.status == "ok" => {
            println!("✅ {} [{}]", model_display_name(&entry.model), summary.id);
            println!("   {}\n", preview(&summary.content, 200));
        }
        (_, Some(error)) => {
            println!(
                "❌ {} — {}: {}\n",
                model_display_name(&entry.model),
                error.code,
                error.message
            );
        }
        _ => {
            println!("❓ {} — malformed entry\n", entry.model);
        }
    }
}

// ============================================================================
// HTTP Client Calls
// ============================================================================

fn http_client() -> anyhow::Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        // generation can take up to 45s per call server-side
        .timeout(std::time::Duration::from_secs(120))
        .build()?)
}

fn get_json(url: &str, query: &[(String, String)]) -> anyhow::Result<serde_json::Value> {
    let client = http_client()?;
    let resp = match client.get(url).query(query).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("recap-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("recap-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    Ok(resp.json()?)
}

fn do_transcripts(server: &str, json_output: bool) -> anyhow::Result<()> {
    let raw = get_json(&format!("{}/transcripts", server), &[])?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    let parsed: TranscriptsResponse = serde_json::from_value(raw)?;
    if parsed.transcripts.is_empty() {
        eprintln!("No transcripts found");
        return Ok(());
    }

    for t in &parsed.transcripts {
        println!("{}  {} ({})", t.id, t.title, t.created_at);
        println!("    {}\n", preview(&t.content, 200));
    }

    Ok(())
}

fn do_summaries(
    server: &str,
    transcript_id: &str,
    models: &[String],
    json_output: bool,
) -> anyhow::Result<()> {
    let mut query = vec![("transcriptId".to_string(), transcript_id.to_string())];
    for model in models {
        query.push(("model".to_string(), model.clone()));
    }

    let raw = get_json(&format!("{}/summaries", server), &query)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    let parsed: SummariesResponse = serde_json::from_value(raw)?;
    if parsed.summaries.is_empty() {
        eprintln!("No summaries found for transcript {}", transcript_id);
        return Ok(());
    }

    for s in &parsed.summaries {
        println!("{}  {} ({})", s.id, model_display_name(&s.model_used), s.created_at);
        println!("    {}\n", preview(&s.content, 200));
    }

    Ok(())
}

fn do_summarize(
    server: &str,
    transcript_id: &str,
    models: &[String],
    prompt: &str,
    temperature: f64,
    json_output: bool,
) -> anyhow::Result<()> {
    let client = http_client()?;
    let url = format!("{}/summarize", server);
    let body = serde_json::json!({
        "transcriptId": transcript_id,
        "models": models,
        "prompt": prompt,
        "temperature": temperature,
    });

    let resp = match client.post(&url).json(&body).send() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("recap-cli: connection failed to {}: {}", url, e);
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        eprintln!("recap-cli: server returned {}: {}", status, body);
        std::process::exit(1);
    }

    let raw: serde_json::Value = resp.json()?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&raw)?);
        return Ok(());
    }

    let parsed: SummarizeResponse = serde_json::from_value(raw)?;
    for entry in &parsed.results {
        print_summary_entry(entry);
    }
    if parsed.partial {
        eprintln!("Some models failed — the summaries above are a partial result.");
    }

    Ok(())
}

/// Show the server status by calling GET /health.
fn do_status(server: &str) -> anyhow::Result<()> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let url = format!("{}/health", server);
    let resp = client.get(&url).send();

    match resp {
        Ok(r) if r.status().is_success() => {
            let body: serde_json::Value = r.json().unwrap_or_default();
            println!("Recap server: {}", body["status"].as_str().unwrap_or("unknown"));
            println!("Version:      {}", body["version"].as_str().unwrap_or("?"));
            println!("PostgreSQL:   {}", body["postgresql"].as_str().unwrap_or("?"));
        }
        Ok(r) => {
            let status = r.status();
            eprintln!("recap-cli: server unhealthy (HTTP {})", status);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("recap-cli: cannot reach {} — {}", url, e);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ============================================================================
// Main
// ============================================================================

fn main() {
    let cli = Cli::parse();
    let server = cli.server.trim_end_matches('/').to_string();

    let result = match cli.command {
        Commands::Transcripts { json } => do_transcripts(&server, json),
        Commands::Summaries {
            transcript_id,
            model,
            json,
        } => do_summaries(&server, &transcript_id, &model, json),
        Commands::Summarize {
            transcript_id,
            model,
            prompt,
            temperature,
            json,
        } => do_summarize(&server, &transcript_id, &model, &prompt, temperature, json),
        Commands::Status => do_status(&server),
    };

    if let Err(e) = result {
        eprintln!("recap-cli: {}", e);
        std::process::exit(1);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // TEST 1: model_display_name strips the vendor and variant
    // ========================================================================
    #[test]
    fn test_model_display_name_strips_vendor_and_variant() {
        assert_eq!(
            model_display_name("meta-llama/llama-4-scout:free"),
            "llama-4-scout"
        );
        assert_eq!(model_display_name("openai/gpt-oss-20b:free"), "gpt-oss-20b");
    }

    // ========================================================================
    // TEST 2: model_display_name passes through ids without a slash
    // ========================================================================
    #[test]
    fn test_model_display_name_passthrough() {
        assert_eq!(model_display_name("gpt-4"), "gpt-4");
        assert_eq!(model_display_name(""), "");
    }

    // ========================================================================
    // TEST 3: preview flattens whitespace and truncates
    // ========================================================================
    #[test]
    fn test_preview_flattens_and_truncates() {
        let text = "line one\nline   two\n\nline three";
        assert_eq!(preview(text, 100), "line one line two line three");
        assert_eq!(preview(&"a".repeat(500), 10).len(), 10);
    }

    // ========================================================================
    // TEST 4: summarize response with a mixed outcome parses
    // ========================================================================
    #[test]
    fn test_summarize_response_parses_mixed_outcome() {
        let raw = serde_json::json!({
            "success": true,
            "partial": true,
            "results": [
                {
                    "model": "a",
                    "status": "ok",
                    "persisted": true,
                    "summary": {
                        "id": "7b5c24ab-1234-5678-9abc-def012345678",
                        "content": "short recap",
                        "modelUsed": "a",
                        "createdAt": "2026-08-06T10:00:00Z"
                    }
                },
                {
                    "model": "b",
                    "status": "error",
                    "persisted": false,
                    "error": { "code": "SERVER_ERROR", "message": "boom" }
                }
            ]
        });

        let parsed: SummarizeResponse = serde_json::from_value(raw).expect("Should parse");
        assert!(parsed.partial);
        assert_eq!(parsed.results.len(), 2);
        assert_eq!(parsed.results[0].status, "ok");
        assert!(parsed.results[0].summary.is_some());
        assert_eq!(
            parsed.results[1].error.as_ref().unwrap().code,
            "SERVER_ERROR"
        );
    }

    // ========================================================================
    // TEST 5: transcripts response parses camelCase fields
    // ========================================================================
    #[test]
    fn test_transcripts_response_parses() {
        let raw = serde_json::json!({
            "success": true,
            "transcripts": [
                {
                    "id": "7b5c24ab-1234-5678-9abc-def012345678",
                    "title": "Monday standup recap",
                    "content": "Quick recap of standup.",
                    "createdAt": "2026-08-06T09:00:00Z"
                }
            ]
        });

        let parsed: TranscriptsResponse = serde_json::from_value(raw).expect("Should parse");
        assert_eq!(parsed.transcripts.len(), 1);
        assert_eq!(parsed.transcripts[0].title, "Monday standup recap");
    }
}

pub mod completion;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod speech;

pub use completion::{
    CompletionBackend, CompletionConfig, CompletionError, CompletionRequest, OpenRouterClient,
    DEFAULT_MAX_TOKENS, DEFAULT_TIMEOUT_SECS, SYSTEM_PROMPT,
};
pub use config::RecapConfig;
pub use error::RecapError;
pub use speech::{SpeechClient, SpeechConfig, SpeechError, Voice};

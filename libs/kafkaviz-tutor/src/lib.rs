//! Chat tutor collaborator: a question plus a simulation snapshot in,
//! free text out.

pub mod config;
pub mod error;
pub mod gemini;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub use config::TutorConfig;
pub use error::TutorError;
pub use gemini::GeminiTutor;

/// Answer returned whenever the tutor cannot be reached or is not configured.
pub const DEGRADED_ANSWER: &str =
    "Sorry, I'm having trouble connecting to my brain (the API). Please try again.";

/// Answer returned when the model replies without any text.
pub const EMPTY_ANSWER: &str = "I couldn't generate an answer right now.";

/// Tutor collaborator. Never fails: unavailability yields
/// [`DEGRADED_ANSWER`].
pub trait Tutor: Send + Sync {
    fn ask<'a>(
        &'a self,
        question: &'a str,
        context: &'a str,
    ) -> Pin<Box<dyn Future<Output = String> + Send + 'a>>;
}

/// Tutor used when no API key is available.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineTutor;

impl Tutor for OfflineTutor {
    fn ask<'a>(
        &'a self,
        _question: &'a str,
        _context: &'a str,
    ) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        Box::pin(async { DEGRADED_ANSWER.to_string() })
    }
}

/// Build the tutor described by `config`, falling back to [`OfflineTutor`]
/// when the API key variable is unset or the client cannot be built.
pub fn from_config(config: &TutorConfig) -> Arc<dyn Tutor> {
    let key = match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            let err = TutorError::NotConfigured(format!("{} is not set", config.api_key_env));
            tracing::info!(reason = %err, "tutor running offline");
            return Arc::new(OfflineTutor);
        }
    };
    match GeminiTutor::new(config, key) {
        Ok(tutor) => {
            tracing::info!(model = %config.model, "tutor enabled");
            Arc::new(tutor)
        }
        Err(e) => {
            tracing::warn!(error = %e, "tutor client setup failed, running offline");
            Arc::new(OfflineTutor)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn offline_tutor_answers_with_degraded_message() {
        assert_eq!(OfflineTutor.ask("What is a topic?", "{}").await, DEGRADED_ANSWER);
    }

    #[tokio::test]
    async fn missing_key_selects_offline_tutor() {
        let config = TutorConfig {
            api_key_env: "KAFKAVIZ_TEST_KEY_THAT_IS_NEVER_SET".into(),
            ..TutorConfig::default()
        };
        let tutor = from_config(&config);
        assert_eq!(tutor.ask("q", "{}").await, DEGRADED_ANSWER);
    }
}

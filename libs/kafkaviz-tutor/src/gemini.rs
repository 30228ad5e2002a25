use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::TutorConfig;
use crate::error::TutorError;
use crate::{DEGRADED_ANSWER, EMPTY_ANSWER, Tutor};

/// Tutor backed by the Gemini `generateContent` endpoint.
pub struct GeminiTutor {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl std::fmt::Debug for GeminiTutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiTutor")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// System instruction carrying the simulation context.
pub fn system_instruction(context: &str) -> String {
    format!(
        "You are an expert, friendly Apache Kafka instructor teaching a complete beginner.
Your goal is to explain concepts simply, using analogies (like postal systems, logs, queues).
The user is interacting with a visual playground containing Producers, Topics (with Partitions), and Consumers.

Current Simulation Context:
{context}

Rules:
1. Keep answers concise (under 3 paragraphs).
2. Use markdown for formatting.
3. If the user asks about the simulation, refer to the \"Current Simulation Context\".
4. Be encouraging!
"
    )
}

/// Concatenated text of the first candidate, if any.
fn extract_text(response: GenerateResponse) -> Option<String> {
    let text: String = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect();
    (!text.trim().is_empty()).then_some(text)
}

impl GeminiTutor {
    pub fn new(config: &TutorConfig, api_key: String) -> Result<Self, TutorError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Ask the model; transport and protocol failures are returned as errors.
    pub async fn try_ask(&self, question: &str, context: &str) -> Result<String, TutorError> {
        let instruction = system_instruction(context);
        let body = GenerateRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part { text: &instruction }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: question }],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TutorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = resp
            .json()
            .await
            .map_err(|e| TutorError::Decode(e.to_string()))?;
        Ok(extract_text(parsed).unwrap_or_else(|| EMPTY_ANSWER.to_string()))
    }
}

impl Tutor for GeminiTutor {
    fn ask<'a>(
        &'a self,
        question: &'a str,
        context: &'a str,
    ) -> Pin<Box<dyn Future<Output = String> + Send + 'a>> {
        Box::pin(async move {
            match self.try_ask(question, context).await {
                Ok(answer) => answer,
                Err(e) => {
                    tracing::warn!(model = %self.model, error = %e, "tutor request failed");
                    DEGRADED_ANSWER.to_string()
                }
            }
        })
    }
}

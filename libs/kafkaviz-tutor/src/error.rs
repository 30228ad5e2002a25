#[derive(Debug, thiserror::Error)]
pub enum TutorError {
    #[error("tutor is not configured: {0}")]
    NotConfigured(String),

    #[error("tutor unreachable: {0}")]
    Unavailable(#[from] reqwest::Error),

    #[error("tutor returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("tutor response: {0}")]
    Decode(String),
}

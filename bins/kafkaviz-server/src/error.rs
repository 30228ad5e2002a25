#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("config ({context}): {detail}")]
    Config { context: &'static str, detail: String },

    #[error(transparent)]
    Engine(#[from] kafkaviz_engine::EngineError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

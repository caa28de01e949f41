use thiserror::Error;

#[derive(Debug, Error)]
pub enum PhoneClawError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Device control error: {0}")]
    Device(String),

    #[error("Screen capture failed: {0}")]
    Capture(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Agent is busy: a task is already running")]
    Busy,

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("TOML deserialize error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl serde::Serialize for PhoneClawError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        serializer.serialize_str(self.to_string().as_str())
    }
}

pub type PhoneClawResult<T> = Result<T, PhoneClawError>;

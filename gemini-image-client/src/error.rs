//! Error definitions for the client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// No API key could be resolved from any source.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// The provider declined to produce content. Revise the prompt or images.
    #[error("Content blocked by provider: {reason}")]
    ContentBlocked { reason: String },

    #[error("API returned no candidates")]
    EmptyResponse,

    #[error(
        "No image found in response (finishReason={}): {raw_excerpt}",
        .finish_reason.as_deref().unwrap_or("none")
    )]
    NoImageInResponse {
        finish_reason: Option<String>,
        raw_excerpt: String,
    },

    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Image encode error: {message}")]
    ImageEncode { message: String },

    #[error("IO error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl Error {
    /// 是否为内容审核拦截（非技术故障，重试无意义）。
    #[must_use]
    pub const fn is_content_blocked(&self) -> bool {
        matches!(self, Self::ContentBlocked { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;

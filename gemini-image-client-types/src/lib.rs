//! Wire types for the Gemini image generation client.

mod base64_serde;

pub mod config;
pub mod content;
pub mod enums;
pub mod http;
pub mod request;

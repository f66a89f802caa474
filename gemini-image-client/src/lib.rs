//! Gemini image generation client core for virtual try-on plugin nodes.
//!
//! A call resolves credentials and endpoint from the environment, the plugin's
//! `gemini_config.json` and the legacy `gemini_api_key.txt`, sends one
//! `generateContent` request with the prompt and PNG images, and returns the
//! first image in the response.

mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod generate;
pub mod media;
pub mod payload;
pub mod resolver;
pub mod response;

#[cfg(test)]
mod test_support;

pub use gemini_image_client_types as types;

pub use auth::AuthPlacement;
pub use client::{generate_image, generate_image_blocking, Client, ClientBuilder, HttpOptions};
pub use error::{Error, Result};
pub use generate::{GenerateImageRequest, PreparedRequest, DEFAULT_MODEL, DEFAULT_TIMEOUT};
pub use media::InputImage;
pub use resolver::{ConfigResolver, Resolved, ResolvedConfig, Source};

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Value};

use gemini_image_client::config::EnvLookup;
use gemini_image_client::Client;

pub const PNG_B64: &str = "iVBORw0KGgo=";

pub fn png_bytes() -> Vec<u8> {
    STANDARD.decode(PNG_B64).unwrap()
}

pub fn env(vars: &[(&str, &str)]) -> EnvLookup {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
        .collect();
    Arc::new(move |name| map.get(name).cloned())
}

/// 指向 mock server 的客户端，API key 来自环境变量。
pub fn build_client(plugin_dir: &Path, base_url: &str) -> Client {
    build_client_with_env(
        plugin_dir,
        &[("GOOGLE_API_KEY", "test-key"), ("GOOGLE_API_BASE_URL", base_url)],
    )
}

pub fn build_client_with_env(plugin_dir: &Path, vars: &[(&str, &str)]) -> Client {
    Client::builder()
        .plugin_dir(plugin_dir)
        .env_lookup(env(vars))
        .build()
        .unwrap()
}

pub fn write_config(plugin_dir: &Path, config: &Value) {
    std::fs::write(
        plugin_dir.join("gemini_config.json"),
        serde_json::to_string(config).unwrap(),
    )
    .unwrap();
}

pub fn image_response() -> Value {
    json!({
        "candidates": [{
            "content": {
                "role": "model",
                "parts": [
                    {"text": "Here is the try-on result."},
                    {"inlineData": {"mimeType": "image/png", "data": PNG_B64}}
                ]
            },
            "finishReason": "STOP"
        }]
    })
}

use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::content::Content;

/// `generateContent` 请求体。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::enums::Modality;

/// 生成配置。
///
/// 种子同时写入 `seed` 与 `random_seed`，兼容只识别其中一种写法的代理网关。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_modalities: Vec<Modality>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<Number>,
    #[serde(rename = "random_seed", skip_serializing_if = "Option::is_none")]
    pub random_seed: Option<Number>,
}

impl GenerationConfig {
    /// 图片生成默认配置：同时请求 IMAGE 与 TEXT。
    #[must_use]
    pub fn image_and_text() -> Self {
        Self {
            response_modalities: vec![Modality::Image, Modality::Text],
            ..Default::default()
        }
    }

    /// 设置种子（两个字段同步）。
    #[must_use]
    pub fn with_seed(mut self, seed: Option<Number>) -> Self {
        self.random_seed.clone_from(&seed);
        self.seed = seed;
        self
    }
}

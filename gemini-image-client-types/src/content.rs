use crate::base64_serde;
use crate::enums::Role;
use serde::{Deserialize, Serialize};

/// PNG 的 MIME 类型，所有请求图片都以该格式发送。
pub const PNG_MIME_TYPE: &str = "image/png";

/// 对话内容。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    /// 角色：user/model。
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// 消息内容片段，顺序即模型读取顺序。
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    /// 从 parts 构建用户内容。
    #[must_use]
    pub const fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some(Role::User),
            parts,
        }
    }
}

/// 内容部分。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

impl Part {
    /// 创建文本 Part。
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// 创建内联二进制数据 Part。
    pub fn inline_data(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self::InlineData {
            inline_data: Blob {
                mime_type: mime_type.into(),
                data,
            },
        }
    }

    /// 创建 PNG 图片 Part。
    #[must_use]
    pub fn png(data: Vec<u8>) -> Self {
        Self::inline_data(data, PNG_MIME_TYPE)
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text),
            Self::InlineData { .. } => None,
        }
    }

    #[must_use]
    pub const fn as_inline_data(&self) -> Option<&Blob> {
        match self {
            Self::InlineData { inline_data } => Some(inline_data),
            Self::Text { .. } => None,
        }
    }
}

/// 二进制数据。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    #[serde(with = "base64_serde")]
    pub data: Vec<u8>,
}

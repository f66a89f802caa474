//! Configuration sources: process environment, plugin config file, legacy key file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

/// API key environment variables, first non-empty wins.
pub const ENV_API_KEY: [&str; 2] = ["GOOGLE_API_KEY", "GEMINI_API_KEY"];
/// Base URL environment variables.
pub const ENV_BASE_URL: [&str; 2] = ["GOOGLE_API_BASE_URL", "GEMINI_API_BASE_URL"];
/// Full endpoint template environment variables (`{model}` placeholder).
pub const ENV_FULL_URL: [&str; 2] = ["GOOGLE_API_URL", "GEMINI_API_URL"];
pub const ENV_AUTH_HEADER_NAME: &str = "GEMINI_AUTH_HEADER_NAME";
/// Header value template (`{api_key}` placeholder).
pub const ENV_AUTH_HEADER_VALUE: &str = "GEMINI_AUTH_HEADER_VALUE";
pub const ENV_QUERY_PARAM_NAME: &str = "GEMINI_QUERY_PARAM_NAME";

pub const CONFIG_FILE_NAME: &str = "gemini_config.json";
pub const LEGACY_KEY_FILE_NAME: &str = "gemini_api_key.txt";

/// 环境变量读取函数，测试中可替换为内存映射。
pub type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// 读取进程环境变量。
#[must_use]
pub fn process_env() -> EnvLookup {
    Arc::new(|name| std::env::var(name).ok())
}

/// 插件目录下的 `gemini_config.json`。
///
/// 字段读取是宽松的：字符串原样使用，数字转为文本，空串、`null` 与其他结构视为缺失。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginConfig {
    fields: Map<String, Value>,
}

impl PluginConfig {
    /// 读取配置文件；文件缺失、无法读取或内容不是 JSON 对象时返回 `None`。
    #[must_use]
    pub fn load(path: &Path) -> Option<Self> {
        let content = std::fs::read_to_string(path).ok()?;
        let value = serde_json::from_str::<Value>(&content).ok()?;
        Self::from_value(value)
    }

    #[must_use]
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// 读取标量字段。
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        match self.fields.get(name)? {
            Value::String(value) if !value.is_empty() => Some(value.clone()),
            Value::Number(value) => Some(value.to_string()),
            _ => None,
        }
    }

    /// `extra_headers` 中的静态请求头；非对象时忽略。
    #[must_use]
    pub fn extra_headers(&self) -> Vec<(String, String)> {
        let Some(Value::Object(headers)) = self.fields.get("extra_headers") else {
            return Vec::new();
        };
        headers
            .iter()
            .filter_map(|(name, value)| {
                let value = match value {
                    Value::String(value) => value.clone(),
                    Value::Number(value) => value.to_string(),
                    Value::Bool(value) => value.to_string(),
                    _ => return None,
                };
                Some((name.clone(), value))
            })
            .collect()
    }
}

/// 读取旧版纯文本密钥文件（去除首尾空白，空文件视为缺失）。
#[must_use]
pub fn read_legacy_key(path: &Path) -> Option<String> {
    let content = std::fs::read_to_string(path).ok()?;
    let key = content.trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

/// 默认插件目录：当前可执行文件所在目录，无法确定时为工作目录。
#[must_use]
pub fn default_plugin_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

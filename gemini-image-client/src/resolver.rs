//! Layered resolution of API key, endpoint and auth placement.
//!
//! Every field is resolved by walking an ordered chain of lookups and taking the
//! first present value. The configuration file is read again on every
//! resolution, so edits take effect on the next call.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::auth::{AuthPlacement, DEFAULT_QUERY_PARAM_NAME};
use crate::config::{
    process_env, read_legacy_key, EnvLookup, PluginConfig, CONFIG_FILE_NAME, ENV_API_KEY,
    ENV_AUTH_HEADER_NAME, ENV_AUTH_HEADER_VALUE, ENV_BASE_URL, ENV_FULL_URL,
    ENV_QUERY_PARAM_NAME, LEGACY_KEY_FILE_NAME,
};
use crate::error::{Error, Result};

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const MODEL_PLACEHOLDER: &str = "{model}";
const ENDPOINT_TEMPLATE_FIELDS: [&str; 3] = ["endpoint_template", "endpoint", "full_url"];

/// 字段值的来源。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// 调用方显式传入。
    Explicit,
    Env(&'static str),
    ConfigFile(&'static str),
    LegacyKeyFile,
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit => f.write_str("explicit argument"),
            Self::Env(name) => write!(f, "environment variable {name}"),
            Self::ConfigFile(field) => write!(f, "{CONFIG_FILE_NAME} field `{field}`"),
            Self::LegacyKeyFile => f.write_str(LEGACY_KEY_FILE_NAME),
            Self::Default => f.write_str("built-in default"),
        }
    }
}

/// 带来源的解析结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Resolved<T> {
    pub const fn new(value: T, source: Source) -> Self {
        Self { value, source }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        Resolved {
            value: f(self.value),
            source: self.source,
        }
    }
}

type Lookup<'a, T> = &'a dyn Fn() -> Option<T>;

fn first_present<T>(chain: &[Lookup<'_, T>]) -> Option<T> {
    chain.iter().find_map(|lookup| lookup())
}

/// 一次调用的完整解析结果。
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub api_key: Resolved<String>,
    pub endpoint: Resolved<String>,
    pub extra_headers: Vec<(String, String)>,
    pub auth: AuthPlacement,
}

impl fmt::Debug for ResolvedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedConfig")
            .field("api_key_source", &self.api_key.source)
            .field("endpoint", &self.endpoint)
            .field("extra_headers", &self.extra_headers)
            .field("auth", &self.auth)
            .finish()
    }
}

/// 配置解析器：持有插件目录与环境变量读取函数，不缓存任何结果。
#[derive(Clone)]
pub struct ConfigResolver {
    plugin_dir: PathBuf,
    env: EnvLookup,
}

impl fmt::Debug for ConfigResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigResolver")
            .field("plugin_dir", &self.plugin_dir)
            .finish_non_exhaustive()
    }
}

impl ConfigResolver {
    /// 基于进程环境变量创建解析器。
    pub fn new(plugin_dir: impl Into<PathBuf>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            env: process_env(),
        }
    }

    /// 替换环境变量读取函数。
    #[must_use]
    pub fn with_env_lookup(mut self, env: EnvLookup) -> Self {
        self.env = env;
        self
    }

    #[must_use]
    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    /// 读取当前环境与配置文件，得到本次调用的来源快照。
    #[must_use]
    pub fn sources(&self) -> Sources<'_> {
        Sources {
            env: &self.env,
            file: PluginConfig::load(&self.plugin_dir.join(CONFIG_FILE_NAME)),
            legacy_key_path: self.plugin_dir.join(LEGACY_KEY_FILE_NAME),
        }
    }

    /// 解析一次调用所需的全部配置。
    ///
    /// 非空的 `explicit_key` 优先于所有来源。
    ///
    /// # Errors
    /// 当任何来源都没有 API key 时返回 [`Error::Configuration`]。
    pub fn resolve(&self, model: &str, explicit_key: Option<&str>) -> Result<ResolvedConfig> {
        let sources = self.sources();
        let api_key = match explicit_key.filter(|key| !key.is_empty()) {
            Some(key) => Resolved::new(key.to_string(), Source::Explicit),
            None => sources.api_key().ok_or_else(missing_api_key)?,
        };
        let endpoint = sources.endpoint(model);
        let auth = sources.auth_placement();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            api_key_source = %api_key.source,
            endpoint_source = %endpoint.source,
            auth = ?auth,
            "resolved Gemini request configuration"
        );

        Ok(ResolvedConfig {
            api_key,
            endpoint,
            extra_headers: sources.extra_headers(),
            auth,
        })
    }
}

fn missing_api_key() -> Error {
    Error::Configuration {
        message: format!(
            "API key not found. Provide it via environment variable '{}' (or '{}'), \
             config file '{CONFIG_FILE_NAME}' (field 'api_key'), \
             or a '{LEGACY_KEY_FILE_NAME}' file in the plugin directory.",
            ENV_API_KEY[0], ENV_API_KEY[1]
        ),
    }
}

/// 单次解析的来源快照，每个方法都是对当前环境与文件内容的纯函数。
pub struct Sources<'a> {
    env: &'a EnvLookup,
    file: Option<PluginConfig>,
    legacy_key_path: PathBuf,
}

impl Sources<'_> {
    fn env(&self, name: &'static str) -> Option<Resolved<String>> {
        (self.env)(name)
            .filter(|value| !value.is_empty())
            .map(|value| Resolved::new(value, Source::Env(name)))
    }

    fn file(&self, field: &'static str) -> Option<Resolved<String>> {
        self.file
            .as_ref()?
            .field(field)
            .map(|value| Resolved::new(value, Source::ConfigFile(field)))
    }

    fn legacy_key(&self) -> Option<Resolved<String>> {
        read_legacy_key(&self.legacy_key_path)
            .map(|value| Resolved::new(value, Source::LegacyKeyFile))
    }

    /// API key：环境变量 → 配置文件 → 旧版密钥文件。
    #[must_use]
    pub fn api_key(&self) -> Option<Resolved<String>> {
        let chain: [Lookup<'_, Resolved<String>>; 4] = [
            &|| self.env(ENV_API_KEY[0]),
            &|| self.env(ENV_API_KEY[1]),
            &|| self.file("api_key"),
            &|| self.legacy_key(),
        ];
        first_present(&chain)
    }

    /// 完整端点模板：环境变量 → 配置文件。
    #[must_use]
    pub fn endpoint_template(&self) -> Option<Resolved<String>> {
        let chain: [Lookup<'_, Resolved<String>>; 5] = [
            &|| self.env(ENV_FULL_URL[0]),
            &|| self.env(ENV_FULL_URL[1]),
            &|| self.file(ENDPOINT_TEMPLATE_FIELDS[0]),
            &|| self.file(ENDPOINT_TEMPLATE_FIELDS[1]),
            &|| self.file(ENDPOINT_TEMPLATE_FIELDS[2]),
        ];
        first_present(&chain)
    }

    /// 基础 URL：环境变量 → 配置文件 → 默认值。
    #[must_use]
    pub fn base_url(&self) -> Resolved<String> {
        let chain: [Lookup<'_, Resolved<String>>; 3] = [
            &|| self.env(ENV_BASE_URL[0]),
            &|| self.env(ENV_BASE_URL[1]),
            &|| self.file("base_url"),
        ];
        first_present(&chain)
            .unwrap_or_else(|| Resolved::new(DEFAULT_API_BASE_URL.to_string(), Source::Default))
    }

    /// 模型端点。完整模板优先，否则由基础 URL 拼接。
    #[must_use]
    pub fn endpoint(&self, model: &str) -> Resolved<String> {
        if let Some(template) = self.endpoint_template() {
            return template.map(|template| template.replace(MODEL_PLACEHOLDER, model));
        }
        self.base_url().map(|base| {
            format!(
                "{}/v1beta/models/{model}:generateContent",
                base.trim_end_matches('/')
            )
        })
    }

    /// 鉴权方式：环境变量请求头 → 配置文件请求头 → 查询参数。
    #[must_use]
    pub fn auth_placement(&self) -> AuthPlacement {
        if let (Some(name), Some(value)) = (
            self.env(ENV_AUTH_HEADER_NAME),
            self.env(ENV_AUTH_HEADER_VALUE),
        ) {
            return AuthPlacement::EnvHeader {
                name: name.value,
                value_template: value.value,
            };
        }
        if let (Some(name), Some(value)) = (
            self.file("auth_header_name"),
            self.file("auth_header_value_template"),
        ) {
            return AuthPlacement::ConfigHeader {
                name: name.value,
                value_template: value.value,
            };
        }
        let chain: [Lookup<'_, Resolved<String>>; 2] = [
            &|| self.env(ENV_QUERY_PARAM_NAME),
            &|| self.file("query_param_name"),
        ];
        let name = first_present(&chain)
            .map_or_else(|| DEFAULT_QUERY_PARAM_NAME.to_string(), |name| name.value);
        AuthPlacement::QueryParam { name }
    }

    /// 配置文件中的静态请求头。
    #[must_use]
    pub fn extra_headers(&self) -> Vec<(String, String)> {
        self.file
            .as_ref()
            .map(PluginConfig::extra_headers)
            .unwrap_or_default()
    }
}

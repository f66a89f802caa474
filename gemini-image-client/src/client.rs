//! Client configuration and transport layer.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client as HttpClient, Proxy};
use serde_json::Value;

use crate::auth::insert_headers;
use crate::config::{default_plugin_dir, EnvLookup};
use crate::error::{Error, Result};
use crate::generate::{self, GenerateImageRequest, PreparedRequest, DEFAULT_TIMEOUT};
use crate::media::InputImage;
use crate::resolver::ConfigResolver;

/// Gemini 图片生成客户端。
///
/// 克隆开销很小；客户端只持有不可变选项，API key、端点与鉴权方式在每次调用时重新解析。
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

pub(crate) struct ClientInner {
    pub http: HttpClient,
    pub resolver: ConfigResolver,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

/// HTTP 配置。
#[derive(Debug, Clone, Default)]
pub struct HttpOptions {
    /// 默认请求超时（秒），单次请求可覆盖。
    pub timeout: Option<u64>,
    pub proxy: Option<String>,
    /// 静态默认请求头，优先级低于配置文件与鉴权请求头。
    pub headers: HashMap<String, String>,
}

impl Client {
    /// 使用默认插件目录创建客户端。
    ///
    /// # Errors
    /// 当构建 HTTP 客户端失败时返回错误。
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// 以指定插件目录（`gemini_config.json` / `gemini_api_key.txt` 所在目录）创建客户端。
    ///
    /// # Errors
    /// 当构建 HTTP 客户端失败时返回错误。
    pub fn from_plugin_dir(plugin_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::builder().plugin_dir(plugin_dir).build()
    }

    /// 创建 Builder。
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::default()
    }

    /// 解析配置并构建请求，但不发送。
    ///
    /// # Errors
    /// 当 API key 缺失、配置非法或图片无法编码时返回错误。
    pub fn prepare(&self, request: &GenerateImageRequest) -> Result<PreparedRequest> {
        generate::prepare(
            &self.inner.resolver,
            self.inner.api_key.as_deref(),
            self.inner.timeout,
            request,
        )
    }

    /// 生成图片，返回响应中第一张图片的原始字节。
    ///
    /// # Errors
    /// 见 [`Error`]：配置缺失、网络故障、非成功状态码、响应无法解析、内容被拦截或响应中没有图片。
    pub async fn generate_image(&self, request: GenerateImageRequest) -> Result<Vec<u8>> {
        let prepared = self.prepare(&request)?;
        generate::execute(&self.inner.http, prepared).await
    }

    /// 阻塞版本：在当前线程创建单线程运行时并等待结果。
    ///
    /// 不能在异步运行时内部调用。
    ///
    /// # Errors
    /// 见 [`Client::generate_image`]；运行时创建失败时返回 [`Error::Io`]。
    pub fn generate_image_blocking(&self, request: GenerateImageRequest) -> Result<Vec<u8>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(self.generate_image(request))
    }
}

/// 客户端 Builder。
#[derive(Default)]
pub struct ClientBuilder {
    plugin_dir: Option<PathBuf>,
    api_key: Option<String>,
    env_lookup: Option<EnvLookup>,
    http_options: HttpOptions,
}

impl ClientBuilder {
    /// 设置插件目录。
    #[must_use]
    pub fn plugin_dir(mut self, plugin_dir: impl Into<PathBuf>) -> Self {
        self.plugin_dir = Some(plugin_dir.into());
        self
    }

    /// 设置客户端级 API key，优先于环境变量与配置文件，低于单次请求的显式 key。
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// 替换环境变量读取函数。
    #[must_use]
    pub fn env_lookup(mut self, env: EnvLookup) -> Self {
        self.env_lookup = Some(env);
        self
    }

    /// 设置默认请求超时（秒）。
    #[must_use]
    pub const fn timeout(mut self, secs: u64) -> Self {
        self.http_options.timeout = Some(secs);
        self
    }

    /// 设置代理。
    #[must_use]
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.http_options.proxy = Some(url.into());
        self
    }

    /// 增加默认 HTTP 头。
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.http_options.headers.insert(key.into(), value.into());
        self
    }

    /// 构建客户端。
    ///
    /// # Errors
    /// 当默认请求头、代理无效或构建 HTTP 客户端失败时返回错误。
    pub fn build(self) -> Result<Client> {
        let Self {
            plugin_dir,
            api_key,
            env_lookup,
            http_options,
        } = self;

        let headers = Self::build_headers(&http_options)?;
        let http = Self::build_http_client(&http_options, headers)?;

        let mut resolver = ConfigResolver::new(plugin_dir.unwrap_or_else(default_plugin_dir));
        if let Some(env) = env_lookup {
            resolver = resolver.with_env_lookup(env);
        }

        Ok(Client {
            inner: Arc::new(ClientInner {
                http,
                resolver,
                api_key: api_key.filter(|key| !key.is_empty()),
                timeout: http_options
                    .timeout
                    .map_or(DEFAULT_TIMEOUT, Duration::from_secs),
            }),
        })
    }

    fn build_headers(http_options: &HttpOptions) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        insert_headers(&mut headers, &http_options.headers)?;
        Ok(headers)
    }

    fn build_http_client(http_options: &HttpOptions, headers: HeaderMap) -> Result<HttpClient> {
        // Every call is independent; idle connections are not kept between calls.
        let mut http_builder = HttpClient::builder().pool_max_idle_per_host(0);

        if let Some(proxy_url) = &http_options.proxy {
            let proxy = Proxy::all(proxy_url).map_err(|e| Error::InvalidConfig {
                message: format!("Invalid proxy: {e}"),
            })?;
            http_builder = http_builder.proxy(proxy);
        }

        if !headers.is_empty() {
            http_builder = http_builder.default_headers(headers);
        }

        Ok(http_builder.build()?)
    }
}

/// 插件节点调用入口：一次请求，返回图片字节或分类错误。
///
/// 使用默认插件目录解析配置；`api_key` 非空时优先于所有配置来源。
///
/// # Errors
/// 见 [`Client::generate_image`]。
pub async fn generate_image(
    prompt: &str,
    images: Vec<InputImage>,
    model: &str,
    api_key: Option<&str>,
    timeout: Duration,
    seed: Option<Value>,
) -> Result<Vec<u8>> {
    let mut request = GenerateImageRequest::new(prompt)
        .images(images)
        .model(model)
        .timeout(timeout);
    request.api_key = api_key.map(ToString::to_string);
    request.seed = seed;
    Client::new()?.generate_image(request).await
}

/// [`generate_image`] 的阻塞版本。
///
/// # Errors
/// 见 [`Client::generate_image_blocking`]。
pub fn generate_image_blocking(
    prompt: &str,
    images: Vec<InputImage>,
    model: &str,
    api_key: Option<&str>,
    timeout: Duration,
    seed: Option<Value>,
) -> Result<Vec<u8>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(generate_image(prompt, images, model, api_key, timeout, seed))
}

//! One image generation call: resolve configuration, build the payload, send a
//! single request, and map the outcome to image bytes or a classified error.

use std::fmt;
use std::time::Duration;

use gemini_image_client_types::http::ErrorBody;
use gemini_image_client_types::request::GenerateContentRequest;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde_json::Value;

use crate::auth::insert_headers;
use crate::error::{Error, Result};
use crate::media::InputImage;
use crate::payload::build_payload;
use crate::resolver::ConfigResolver;
use crate::response::extract_image_bytes;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// 图片生成参数。
#[derive(Debug, Clone)]
pub struct GenerateImageRequest {
    pub prompt: String,
    /// 第一张为基准图，其余按顺序附加。
    pub images: Vec<InputImage>,
    pub model: String,
    /// 显式 API key，非空时优先于所有配置来源。
    pub api_key: Option<String>,
    /// 未设置时使用客户端默认值（60 秒）。
    pub timeout: Option<Duration>,
    /// 宿主传入的种子，无法转为整数时忽略。
    pub seed: Option<Value>,
}

impl GenerateImageRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            images: Vec::new(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout: None,
            seed: None,
        }
    }

    #[must_use]
    pub fn image(mut self, image: impl Into<InputImage>) -> Self {
        self.images.push(image.into());
        self
    }

    #[must_use]
    pub fn images(mut self, images: impl IntoIterator<Item = InputImage>) -> Self {
        self.images.extend(images);
        self
    }

    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn seed(mut self, seed: impl Into<Value>) -> Self {
        self.seed = Some(seed.into());
        self
    }
}

/// 已解析、待发送的请求。
#[derive(Clone)]
pub struct PreparedRequest {
    /// 含鉴权查询参数（如有）的完整 URL。
    pub url: Url,
    pub headers: HeaderMap,
    pub body: GenerateContentRequest,
    pub timeout: Duration,
}

impl PreparedRequest {
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        self.url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    fn endpoint_without_query(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }
}

impl fmt::Debug for PreparedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let query_names: Vec<String> = self.query_pairs().into_iter().map(|(key, _)| key).collect();
        f.debug_struct("PreparedRequest")
            .field("endpoint", &self.endpoint_without_query())
            .field("query", &query_names)
            .field("headers", &self.headers)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

pub(crate) fn prepare(
    resolver: &ConfigResolver,
    default_api_key: Option<&str>,
    default_timeout: Duration,
    request: &GenerateImageRequest,
) -> Result<PreparedRequest> {
    let explicit_key = request
        .api_key
        .as_deref()
        .filter(|key| !key.is_empty())
        .or(default_api_key);
    let resolved = resolver.resolve(&request.model, explicit_key)?;

    let mut url = Url::parse(&resolved.endpoint.value).map_err(|err| Error::InvalidConfig {
        message: format!("Invalid endpoint {}: {err}", resolved.endpoint.value),
    })?;
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    insert_headers(
        &mut headers,
        resolved.extra_headers.iter().map(|(key, value)| (key, value)),
    )?;
    resolved
        .auth
        .apply(&resolved.api_key.value, &mut headers, &mut url)?;

    let body = build_payload(&request.prompt, &request.images, request.seed.as_ref())?;

    Ok(PreparedRequest {
        url,
        headers,
        body,
        timeout: request.timeout.unwrap_or(default_timeout),
    })
}

pub(crate) async fn execute(http: &HttpClient, prepared: PreparedRequest) -> Result<Vec<u8>> {
    #[cfg(feature = "tracing")]
    tracing::debug!(endpoint = %prepared.endpoint_without_query(), "sending image generation request");

    let response = http
        .post(prepared.url)
        .headers(prepared.headers)
        .timeout(prepared.timeout)
        .json(&prepared.body)
        .send()
        .await
        .map_err(redact_url)?;
    let status = response.status();
    let body = response.text().await.map_err(redact_url)?;

    #[cfg(feature = "tracing")]
    tracing::debug!(status = status.as_u16(), bytes = body.len(), "received response");

    if !status.is_success() {
        return Err(api_error(status, &body));
    }

    let value: Value = serde_json::from_str(&body).map_err(|err| Error::ResponseParse {
        message: format!("Failed to parse response JSON: {err}"),
    })?;
    extract_image_bytes(&value)
}

/// 请求 URL 可能携带 API key，不随错误外露。
fn redact_url(err: reqwest::Error) -> Error {
    Error::from(err.without_url())
}

fn api_error(status: StatusCode, body: &str) -> Error {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message().map(ToString::to_string))
        .unwrap_or_else(|| body.to_string());
    Error::ApiError {
        status: status.as_u16(),
        message,
    }
}

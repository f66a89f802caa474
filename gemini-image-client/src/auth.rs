//! Auth placement: API key as a templated header or as a query parameter.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Url;

use crate::error::{Error, Result};

pub const DEFAULT_QUERY_PARAM_NAME: &str = "key";
const API_KEY_PLACEHOLDER: &str = "{api_key}";

/// 鉴权方式，每次请求只会应用其中一种。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthPlacement {
    /// `GEMINI_AUTH_HEADER_NAME` + `GEMINI_AUTH_HEADER_VALUE`。
    EnvHeader { name: String, value_template: String },
    /// 配置文件中的 `auth_header_name` + `auth_header_value_template`。
    ConfigHeader { name: String, value_template: String },
    /// 查询参数，值为 API key。
    QueryParam { name: String },
}

impl Default for AuthPlacement {
    fn default() -> Self {
        Self::QueryParam {
            name: DEFAULT_QUERY_PARAM_NAME.to_string(),
        }
    }
}

impl AuthPlacement {
    /// 将 API key 写入请求头或 URL 查询参数。
    ///
    /// # Errors
    /// 当请求头名称或值非法时返回错误。
    pub fn apply(&self, api_key: &str, headers: &mut HeaderMap, url: &mut Url) -> Result<()> {
        match self {
            Self::EnvHeader {
                name,
                value_template,
            }
            | Self::ConfigHeader {
                name,
                value_template,
            } => {
                let name =
                    HeaderName::from_bytes(name.as_bytes()).map_err(|_| Error::InvalidConfig {
                        message: format!("Invalid auth header name: {name}"),
                    })?;
                let value = value_template.replace(API_KEY_PLACEHOLDER, api_key);
                let mut value =
                    HeaderValue::from_str(&value).map_err(|_| Error::InvalidConfig {
                        message: format!("Invalid auth header value for {name}"),
                    })?;
                value.set_sensitive(true);
                headers.insert(name, value);
            }
            Self::QueryParam { name } => {
                url.query_pairs_mut().append_pair(name, api_key);
            }
        }
        Ok(())
    }
}

/// 合并静态请求头，同名时后写入者覆盖。
///
/// # Errors
/// 当请求头名称或值非法时返回错误。
pub fn insert_headers<I, K, V>(headers: &mut HeaderMap, extra: I) -> Result<()>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    for (key, value) in extra {
        let (key, value) = (key.as_ref(), value.as_ref());
        let name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| Error::InvalidConfig {
            message: format!("Invalid header name: {key}"),
        })?;
        let value = HeaderValue::from_str(value).map_err(|_| Error::InvalidConfig {
            message: format!("Invalid header value for {key}"),
        })?;
        headers.insert(name, value);
    }
    Ok(())
}

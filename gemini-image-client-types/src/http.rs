use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured error body returned by the API on non-success statuses.
///
/// `{"error": {"code": 429, "message": "...", "status": "RESOURCE_EXHAUSTED"}}`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<ErrorStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ErrorStatus {
    /// 官方接口为整数，部分网关返回字符串。
    #[serde(default)]
    pub code: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl ErrorBody {
    /// 非空的 `error.message`。
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.error
            .as_ref()
            .and_then(|status| status.message.as_deref())
            .filter(|message| !message.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_nested_message() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error":{"code":429,"message":"quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        )
        .unwrap();
        assert_eq!(body.message(), Some("quota exceeded"));
    }

    #[test]
    fn string_code_still_yields_message() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"error":{"code":"rate_limit_exceeded","message":"quota exceeded","type":"requests"}}"#,
        )
        .unwrap();
        assert_eq!(body.message(), Some("quota exceeded"));
        assert_eq!(
            body.error.and_then(|status| status.code),
            Some(Value::from("rate_limit_exceeded"))
        );
    }

    #[test]
    fn missing_error_object_has_no_message() {
        let body: ErrorBody = serde_json::from_str(r#"{"detail":"nope"}"#).unwrap();
        assert_eq!(body.message(), None);
    }
}

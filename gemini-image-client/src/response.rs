//! Image extraction from `generateContent` responses.
//!
//! The response shape varies across API versions and proxies (camelCase vs
//! snake_case keys, candidates vs a bare `contents` array), so extraction walks
//! an ordered list of strategies and takes the first image found.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine as _;
use serde_json::Value;

use crate::error::{Error, Result};

const RAW_EXCERPT_CHARS: usize = 800;

/// 标准字母表，填充可有可无。
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// 响应中找到的内联图片（尚未解码）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineImage<'a> {
    pub mime_type: &'a str,
    pub data: &'a str,
}

impl InlineImage<'_> {
    /// 解码 base64 数据。
    ///
    /// # Errors
    /// 当数据不是合法 base64 时返回错误。
    pub fn decode(&self) -> Result<Vec<u8>> {
        // 部分代理按行折断 base64。
        let compact: String = self
            .data
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        LENIENT_BASE64
            .decode(compact.as_bytes())
            .map_err(|err| Error::ResponseParse {
                message: format!("invalid base64 in {} inline data: {err}", self.mime_type),
            })
    }
}

type Strategy = for<'a> fn(&'a Value) -> Option<InlineImage<'a>>;

/// 按优先级排列的提取策略。
const STRATEGIES: [Strategy; 2] = [image_from_candidates, image_from_contents];

/// 从响应中提取第一张图片的字节。
///
/// # Errors
/// - 没有候选且带有拦截原因：[`Error::ContentBlocked`]
/// - 没有候选也没有拦截原因：[`Error::EmptyResponse`]
/// - 有候选但没有图片：[`Error::NoImageInResponse`]
pub fn extract_image_bytes(response: &Value) -> Result<Vec<u8>> {
    let candidates = candidates(response);
    if candidates.is_empty() {
        if let Some(reason) = block_reason(response) {
            return Err(Error::ContentBlocked { reason });
        }
        return Err(Error::EmptyResponse);
    }

    if let Some(image) = STRATEGIES.iter().find_map(|strategy| strategy(response)) {
        return image.decode();
    }

    Err(Error::NoImageInResponse {
        finish_reason: candidates.first().and_then(finish_reason),
        raw_excerpt: raw_excerpt(response),
    })
}

/// 在 `candidates[*].content.parts[*]` 中查找图片。
#[must_use]
pub fn image_from_candidates(response: &Value) -> Option<InlineImage<'_>> {
    candidates(response)
        .iter()
        .filter_map(|candidate| candidate.get("content"))
        .find_map(image_from_content)
}

/// 在顶层 `contents[*].parts[*]` 中查找图片。
#[must_use]
pub fn image_from_contents(response: &Value) -> Option<InlineImage<'_>> {
    response
        .get("contents")
        .and_then(Value::as_array)?
        .iter()
        .find_map(image_from_content)
}

fn image_from_content(content: &Value) -> Option<InlineImage<'_>> {
    content
        .get("parts")
        .and_then(Value::as_array)?
        .iter()
        .find_map(inline_image)
}

fn inline_image(part: &Value) -> Option<InlineImage<'_>> {
    let inline = first_field(part, &["inline_data", "inlineData"])
        .filter(|value| value.is_object())?;
    let mime_type = first_str(inline, &["mime_type", "mimeType"]).unwrap_or_default();
    let data = first_str(inline, &["data"])?;
    mime_type
        .starts_with("image/")
        .then_some(InlineImage { mime_type, data })
}

fn candidates(response: &Value) -> &[Value] {
    response
        .get("candidates")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn block_reason(response: &Value) -> Option<String> {
    let feedback = first_field(response, &["promptFeedback", "prompt_feedback"])?;
    let reason = first_field(feedback, &["blockReason", "block_reason"])?;
    match reason {
        Value::String(reason) => Some(reason.clone()),
        other => Some(other.to_string()),
    }
}

fn finish_reason(candidate: &Value) -> Option<String> {
    first_field(candidate, &["finishReason", "finish_reason"]).map(|reason| match reason {
        Value::String(reason) => reason.clone(),
        other => other.to_string(),
    })
}

/// 第一个"非空"字段，空串、`null`、空对象、空数组与 `false` 都视为缺失。
fn first_field<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| value.get(key))
        .find(|value| is_truthy(value))
}

fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    first_field(value, keys).and_then(Value::as_str)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64() != Some(0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

fn raw_excerpt(response: &Value) -> String {
    response.to_string().chars().take(RAW_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    const PNG_B64: &str = "iVBORw0KGgo=";

    fn png_bytes() -> Vec<u8> {
        STANDARD.decode(PNG_B64).unwrap()
    }

    #[test]
    fn blocked_prompt_is_content_blocked() {
        let err = extract_image_bytes(&json!({
            "candidates": [],
            "promptFeedback": {"blockReason": "SAFETY"}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::ContentBlocked { ref reason } if reason == "SAFETY"));
    }

    #[test]
    fn snake_case_block_reason_is_recognized() {
        let err = extract_image_bytes(&json!({
            "prompt_feedback": {"block_reason": "OTHER"}
        }))
        .unwrap_err();
        assert!(matches!(err, Error::ContentBlocked { ref reason } if reason == "OTHER"));
    }

    #[test]
    fn no_candidates_without_block_reason_is_empty() {
        assert!(matches!(
            extract_image_bytes(&json!({"candidates": [], "promptFeedback": {}})),
            Err(Error::EmptyResponse)
        ));
        assert!(matches!(
            extract_image_bytes(&json!({"candidates": null})),
            Err(Error::EmptyResponse)
        ));
        assert!(matches!(
            extract_image_bytes(&json!([])),
            Err(Error::EmptyResponse)
        ));
    }

    #[test]
    fn camel_case_inline_data_is_decoded() {
        let bytes = extract_image_bytes(&json!({
            "candidates": [{
                "content": {"parts": [
                    {"text": "here you go"},
                    {"inlineData": {"mimeType": "image/png", "data": PNG_B64}}
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(bytes, png_bytes());
    }

    #[test]
    fn snake_case_inline_data_is_decoded() {
        let bytes = extract_image_bytes(&json!({
            "candidates": [{
                "content": {"parts": [
                    {"inline_data": {"mime_type": "image/jpeg", "data": PNG_B64}}
                ]}
            }]
        }))
        .unwrap();
        assert_eq!(bytes, png_bytes());
    }

    #[test]
    fn non_image_and_empty_parts_are_skipped() {
        let bytes = extract_image_bytes(&json!({
            "candidates": [
                {"content": {"parts": [
                    {"inlineData": {"mimeType": "audio/wav", "data": "AAAA"}},
                    {"inlineData": {"mimeType": "image/png", "data": ""}},
                    {"inlineData": {}}
                ]}},
                {"content": {"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": PNG_B64}}
                ]}}
            ]
        }))
        .unwrap();
        assert_eq!(bytes, png_bytes());
    }

    #[test]
    fn first_image_wins() {
        let response = json!({
            "candidates": [{
                "content": {"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": "AQID"}},
                    {"inlineData": {"mimeType": "image/png", "data": PNG_B64}}
                ]}
            }]
        });
        assert_eq!(extract_image_bytes(&response).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn top_level_contents_is_a_fallback() {
        let response = json!({
            "candidates": [{"content": {"parts": [{"text": "see contents"}]}}],
            "contents": [{"parts": [
                {"inline_data": {"mimeType": "image/webp", "data": PNG_B64}}
            ]}]
        });
        assert!(image_from_candidates(&response).is_none());
        assert_eq!(extract_image_bytes(&response).unwrap(), png_bytes());
    }

    #[test]
    fn text_only_candidate_reports_finish_reason() {
        let err = extract_image_bytes(&json!({
            "candidates": [{"content": {"parts": [{"text": "no image"}]}, "finishReason": "STOP"}]
        }))
        .unwrap_err();
        assert!(err.to_string().contains("STOP"));
        let Error::NoImageInResponse {
            finish_reason,
            raw_excerpt,
        } = err
        else {
            panic!("expected NoImageInResponse");
        };
        assert_eq!(finish_reason.as_deref(), Some("STOP"));
        assert!(raw_excerpt.contains("no image"));
    }

    #[test]
    fn raw_excerpt_is_truncated() {
        let long_text = "x".repeat(5000);
        let err = extract_image_bytes(&json!({
            "candidates": [{"content": {"parts": [{"text": long_text}]}}]
        }))
        .unwrap_err();
        let Error::NoImageInResponse {
            finish_reason,
            raw_excerpt,
        } = err
        else {
            panic!("expected NoImageInResponse");
        };
        assert_eq!(finish_reason, None);
        assert_eq!(raw_excerpt.chars().count(), RAW_EXCERPT_CHARS);
    }

    #[test]
    fn unpadded_and_wrapped_base64_decodes() {
        for data in ["iVBORw0KGgo", "iVBO\nRw0K\r\nGgo="] {
            let bytes = extract_image_bytes(&json!({
                "candidates": [{"content": {"parts": [
                    {"inlineData": {"mimeType": "image/png", "data": data}}
                ]}}]
            }))
            .unwrap();
            assert_eq!(bytes, png_bytes());
        }
    }

    #[test]
    fn invalid_base64_is_a_parse_error() {
        let err = extract_image_bytes(&json!({
            "candidates": [{"content": {"parts": [
                {"inlineData": {"mimeType": "image/png", "data": "@@not base64@@"}}
            ]}}]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::ResponseParse { .. }));
    }
}

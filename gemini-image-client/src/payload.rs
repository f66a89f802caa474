//! Request payload construction.

use gemini_image_client_types::config::GenerationConfig;
use gemini_image_client_types::content::{Content, Part};
use gemini_image_client_types::request::GenerateContentRequest;
use serde_json::{Number, Value};

use crate::error::Result;
use crate::media::InputImage;

/// 构建 `generateContent` 请求体：文本在前，图片按输入顺序在后。
///
/// 第一张图片通常是多图合成任务中的基准图，顺序不可打乱。
///
/// # Errors
/// 当任一图片无法编码为 PNG 时返回错误。
pub fn build_payload(
    prompt: &str,
    images: &[InputImage],
    seed: Option<&Value>,
) -> Result<GenerateContentRequest> {
    let mut parts = Vec::with_capacity(images.len() + 1);
    parts.push(Part::text(prompt));
    for image in images {
        parts.push(Part::png(image.to_png()?.into_owned()));
    }

    let generation_config = GenerationConfig::image_and_text().with_seed(seed.and_then(coerce_seed));

    Ok(GenerateContentRequest {
        contents: vec![Content::user(parts)],
        generation_config,
    })
}

/// 将宿主传入的种子转为整数；无法转换时返回 `None`，调用不会因此失败。
///
/// 整数原样保留，有限浮点数向零截断，十进制整数字符串会被解析，布尔值转为 0/1。
#[must_use]
pub fn coerce_seed(seed: &Value) -> Option<Number> {
    match seed {
        Value::Number(number) if number.is_i64() || number.is_u64() => Some(number.clone()),
        Value::Number(number) => number.as_f64().and_then(truncate_float),
        Value::String(text) => {
            let text = text.trim();
            text.parse::<i64>()
                .map(Number::from)
                .or_else(|_| text.parse::<u64>().map(Number::from))
                .ok()
        }
        Value::Bool(flag) => Some(Number::from(u8::from(*flag))),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[allow(clippy::cast_possible_truncation)]
fn truncate_float(value: f64) -> Option<Number> {
    if !value.is_finite() {
        return None;
    }
    let truncated = value.trunc();
    if truncated >= i64::MIN as f64 && truncated < i64::MAX as f64 {
        Some(Number::from(truncated as i64))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::tiny_png;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde_json::json;

    #[test]
    fn parts_are_text_then_images_in_order() {
        let first = tiny_png([255, 0, 0, 255]);
        let second = tiny_png([0, 0, 255, 255]);
        let payload = build_payload(
            "p",
            &[
                InputImage::from_bytes(first.clone()),
                InputImage::from_bytes(second.clone()),
            ],
            None,
        )
        .unwrap();

        let value = serde_json::to_value(&payload).unwrap();
        let parts = value["contents"][0]["parts"].as_array().unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], json!({"text": "p"}));
        for (part, expected) in parts[1..].iter().zip([&first, &second]) {
            assert_eq!(part["inlineData"]["mimeType"], "image/png");
            let data = part["inlineData"]["data"].as_str().unwrap();
            assert_eq!(&STANDARD.decode(data).unwrap(), expected);
        }
        assert_eq!(value["contents"][0]["role"], "user");
    }

    #[test]
    fn prompt_only_payload_requests_image_and_text() {
        let payload = build_payload("just text", &[], None).unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["contents"][0]["parts"].as_array().unwrap().len(), 1);
        assert_eq!(
            value["generationConfig"]["responseModalities"],
            json!(["IMAGE", "TEXT"])
        );
    }

    #[test]
    fn seed_is_embedded_under_both_keys() {
        let payload = build_payload("p", &[], Some(&json!(42))).unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["generationConfig"]["seed"], 42);
        assert_eq!(value["generationConfig"]["random_seed"], 42);
    }

    #[test]
    fn uncoercible_seed_is_omitted_without_failing() {
        let payload = build_payload("p", &[], Some(&json!("not-a-number"))).unwrap();
        let value = serde_json::to_value(&payload).unwrap();
        assert!(value["generationConfig"].get("seed").is_none());
        assert!(value["generationConfig"].get("random_seed").is_none());
    }

    #[test]
    fn seed_coercion_rules() {
        assert_eq!(coerce_seed(&json!(7)), Some(Number::from(7)));
        assert_eq!(coerce_seed(&json!(u64::MAX)), Some(Number::from(u64::MAX)));
        assert_eq!(coerce_seed(&json!(3.9)), Some(Number::from(3)));
        assert_eq!(coerce_seed(&json!(-3.9)), Some(Number::from(-3)));
        assert_eq!(coerce_seed(&json!(" 12 ")), Some(Number::from(12)));
        assert_eq!(coerce_seed(&json!("1.5")), None);
        assert_eq!(coerce_seed(&json!(true)), Some(Number::from(1)));
        assert_eq!(coerce_seed(&json!(null)), None);
        assert_eq!(coerce_seed(&json!([1])), None);
    }

    #[test]
    fn unencodable_image_fails_the_payload() {
        let result = build_payload("p", &[InputImage::from_bytes(vec![0, 1])], None);
        assert!(result.is_err());
    }
}

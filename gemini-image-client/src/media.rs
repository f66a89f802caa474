//! Caller-supplied images and their PNG encoding.

use std::borrow::Cow;
use std::io::Cursor;

use image::{DynamicImage, ImageFormat};

use crate::error::{Error, Result};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// 输入图片。
///
/// 已是 PNG 的字节原样发送；其他编码格式先解码再转为 PNG；内存图像直接编码为 PNG。
#[derive(Debug, Clone)]
pub enum InputImage {
    Encoded(Vec<u8>),
    Decoded(DynamicImage),
}

impl InputImage {
    /// 从已编码的图片字节创建（PNG/JPEG/WebP）。
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Encoded(bytes.into())
    }

    /// 转为 PNG 字节。
    ///
    /// # Errors
    /// 当图片无法解码或编码为 PNG 时返回错误。
    pub fn to_png(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::Encoded(bytes) if is_png(bytes) => Ok(Cow::Borrowed(bytes)),
            Self::Encoded(bytes) => {
                let image = image::load_from_memory(bytes).map_err(|err| Error::ImageEncode {
                    message: format!("failed to decode input image: {err}"),
                })?;
                encode_png(&image).map(Cow::Owned)
            }
            Self::Decoded(image) => encode_png(image).map(Cow::Owned),
        }
    }
}

impl From<DynamicImage> for InputImage {
    fn from(image: DynamicImage) -> Self {
        Self::Decoded(image)
    }
}

impl From<Vec<u8>> for InputImage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Encoded(bytes)
    }
}

fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|err| Error::ImageEncode {
            message: format!("failed to encode PNG: {err}"),
        })?;
    Ok(bytes)
}

//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部请求”和“流水线中间结果”解耦：
//! - `ClipboardImageRequest` / `ClipboardImageResult` 是 IPC 边界上的请求与一次性结果
//! - `ImageSource` 表示外部来源语义
//! - `RawImageData` 表示已加载但未解码的字节
//! - `PreparedClipboardImage` 表示可直接写入剪贴板的 RGBA 数据

use serde::{Deserialize, Serialize};

/// 复制图片请求。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardImageRequest {
    #[serde(alias = "imageUrl")]
    pub url: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl ClipboardImageRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            request_id: None,
        }
    }
}

/// 复制结果，每个请求只产生一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ClipboardImageResult {
    Success,
    Failure { message: String },
}

/// 图片输入来源。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// 网络地址来源。
    Url(String),
    /// `data:image/...;base64,` 形式的内联图片。
    DataUrl(String),
}

impl ImageSource {
    /// 根据地址前缀判断来源类型。
    pub fn from_locator(locator: &str) -> Self {
        let trimmed = locator.trim();
        if trimmed
            .get(..5)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:"))
        {
            Self::DataUrl(trimmed.to_string())
        } else {
            Self::Url(trimmed.to_string())
        }
    }
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 解码阶段输出：可写入剪贴板的 RGBA 像素数据。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedClipboardImage {
    /// 图像宽度（像素）。
    pub width: usize,
    /// 图像高度（像素）。
    pub height: usize,
    /// RGBA 字节数组（`width * height * 4`）。
    pub bytes: Vec<u8>,
}

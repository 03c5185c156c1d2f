//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 使用单一错误枚举承载复制链路中的所有错误来源，避免字符串拼接式错误处理。
//! 通过 `thiserror` 保持人类可读错误，同时让调用侧可按分支匹配。

/// 图片复制统一错误类型。
///
/// 在命令边界被转换为 `ClipboardImageResult::Failure` 与 `copy-error` 事件。
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("网络错误：{0}")]
    Network(String),

    #[error("格式错误：{0}")]
    InvalidFormat(String),

    #[error("解码错误：{0}")]
    Decode(String),

    #[error("资源限制：{0}")]
    ResourceLimit(String),

    #[error("剪贴板错误：{0}")]
    Clipboard(String),

    #[error("剪贴板被占用：{0}")]
    ClipboardBusy(String),
}

impl ImageError {
    /// 稳定错误码，供前端分支判断。
    pub fn code(&self) -> &'static str {
        match self {
            Self::Network(_) => "E_NETWORK",
            Self::InvalidFormat(_) => "E_INVALID_FORMAT",
            Self::Decode(_) => "E_DECODE",
            Self::ResourceLimit(_) => "E_RESOURCE_LIMIT",
            Self::Clipboard(_) => "E_CLIPBOARD",
            Self::ClipboardBusy(_) => "E_CLIPBOARD_BUSY",
        }
    }

    /// 出错阶段：`load` / `decode` / `clipboard`。
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Network(_) | Self::ResourceLimit(_) => "load",
            Self::InvalidFormat(_) | Self::Decode(_) => "decode",
            Self::Clipboard(_) | Self::ClipboardBusy(_) => "clipboard",
        }
    }
}

impl From<crate::net::UrlRejection> for ImageError {
    fn from(rejection: crate::net::UrlRejection) -> Self {
        Self::InvalidFormat(rejection.to_string())
    }
}

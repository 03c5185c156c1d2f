//! # 下载错误模型

/// 下载链路统一错误类型。
///
/// 在命令边界被转换为 `DownloadResult::Failure` 的文案，不会以异常形式抛给前端。
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("链接无效：{0}")]
    InvalidUrl(String),

    #[error("网络错误：{0}")]
    Network(String),

    #[error("HTTP {status}: {reason}")]
    HttpStatus { status: u16, reason: &'static str },

    #[error("文件错误：{0}")]
    FileSystem(String),

    #[error("下载目录不可用：{0}")]
    Storage(String),
}

impl DownloadError {
    /// 稳定错误码，供前端分支判断。
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl(_) => "E_INVALID_URL",
            Self::Network(_) => "E_NETWORK",
            Self::HttpStatus { .. } => "E_HTTP_STATUS",
            Self::FileSystem(_) => "E_FILESYSTEM",
            Self::Storage(_) => "E_STORAGE",
        }
    }
}

impl From<crate::net::UrlRejection> for DownloadError {
    fn from(rejection: crate::net::UrlRejection) -> Self {
        Self::InvalidUrl(rejection.to_string())
    }
}

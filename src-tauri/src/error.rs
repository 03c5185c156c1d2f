//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 定义全局统一的 `AppError` 枚举，所有 `#[tauri::command]` 函数统一返回
//! `Result<T, AppError>`，前端通过 `Serialize` 获得可读的错误信息。
//!
//! 下载与复制的业务失败不走这里：它们以 `DownloadResult::Failure` /
//! `ClipboardImageResult::Failure` 正常返回。`AppError` 只承载
//! 状态缺失、设置读写、菜单创建等宿主侧故障。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - 为 `DownloadError` / `ImageError` / `io::Error` 提供 `From` 转换。
//! - 实现 `Serialize` 将错误序列化为字符串，满足 Tauri IPC 要求。

use serde::Serialize;

use crate::download::DownloadError;
use crate::image_handler::ImageError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 下载链路错误
    #[error("{0}")]
    Download(#[from] DownloadError),

    /// 图片处理流水线错误（加载 / 解码 / 复制）
    #[error("{0}")]
    Image(#[from] ImageError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 下载目录不可用
    #[error("存储目录不可用: {0}")]
    Storage(String),

    /// 设置读写或校验失败
    #[error("设置无效: {0}")]
    Settings(String),

    /// 原生菜单创建或弹出失败
    #[error("菜单操作失败: {0}")]
    Menu(String),
}

/// Tauri IPC 要求返回值实现 `Serialize`。
/// 将错误序列化为人类可读的字符串。
impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

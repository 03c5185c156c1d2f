//! # 图片下载模块（download）
//!
//! ## 设计思路
//!
//! 把远程图片逐字节写入下载目录，并把成功 / 失败以一次性结果返回给调用方：
//!
//! ```text
//! 前端 invoke("download_image" / "download_images")
//!    ↓
//! commands.rs（参数适配 + requestId）
//!    ↓
//! service.rs（GET → 流式写临时文件 → 同步 → 改名覆盖目标）
//!    ↓
//! DownloadResult / BatchDownloadReport + download-complete / download-error 事件
//! ```
//!
//! - 不重试、不校验图片格式，格式问题由调用方负责。
//! - 目标文件名由名称提示确定性推导，同名直接覆盖（见 `storage`）。
//! - 任一失败都会删除临时文件，磁盘上不会残留半截文件。
//! - 批量下载并发执行，单项失败不影响其他项，失败按下标逐项上报。

pub mod commands;
mod error;
mod request;
mod service;

pub use commands::{download_image, download_images};
pub use error::DownloadError;
pub use request::{BatchDownloadReport, DownloadFailure, DownloadRequest, DownloadResult};
pub use service::{DEFAULT_FILE_EXTENSION, DEFAULT_NAME_HINT_WORDS, DownloadConfig, DownloadService};

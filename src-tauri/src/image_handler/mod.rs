//! # 图片复制模块（image_handler）
//!
//! ## 设计思路
//!
//! 该模块将“来源识别 → 加载校验 → 解码缩放 → 写入剪贴板 → Tauri 命令暴露”
//! 按职责拆分为多个子模块，避免单文件膨胀与耦合。
//!
//! - `commands`：仅做 IPC 入参/出参适配（薄封装）
//! - `handler`：编排整条处理流水线并上报事件
//! - `loader`：负责 URL / data URL 加载与体积校验
//! - `pipeline`：负责解码、像素限制、重编码、降采样
//! - `clipboard_writer`：剪贴板接缝、系统实现与重试
//! - `config/error/source`：配置、错误、中间数据模型
//!
//! ## 调用链
//!
//! ```text
//! 前端 invoke / 右键菜单
//!    ↓
//! commands.rs / context_menu.rs
//!    ↓
//! handler.rs（统一编排 + 阶段耗时日志 + 事件）
//!    ├─ loader.rs
//!    ├─ pipeline.rs
//!    └─ clipboard_writer.rs
//!    ↓
//! ClipboardImageResult + copy-complete / copy-error
//! ```

pub mod commands;
mod clipboard_writer;
mod config;
mod error;
mod handler;
mod loader;
mod pipeline;
mod source;

pub use clipboard_writer::{
    ClipboardFailureKind, ClipboardWriteFailure, ImageClipboard, SystemClipboard,
};
pub use commands::copy_image;
pub use config::{ImageConfig, ImagePerformanceProfile};
pub use error::ImageError;
pub use handler::ImageHandler;
pub use source::{ClipboardImageRequest, ClipboardImageResult, ImageSource, PreparedClipboardImage};

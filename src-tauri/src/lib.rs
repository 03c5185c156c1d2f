//! # Image Batch Studio 宿主桥库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                前端 (沙箱 WebView / ui/)                  │
//! │                                                          │
//! │  invoke(download_image / download_images / copy_image)   │
//! │  invoke(show_context_menu)   listen(download-* / copy-*) │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↕ Tauri IPC (一次性结果 + 带 requestId 的事件)
//! ┌───────┼──────────────────────────────────────────────────┐
//! │       ↕            后端 (Rust)                           │
//! │                                                          │
//! │  ┌─ error ────── AppError (统一错误类型)                  │
//! │  ├─ events ───── 事件名 / 载荷 / EventSink 接缝           │
//! │  ├─ net ──────── HTTP 客户端 / URL 校验 / 日志脱敏        │
//! │  │                                                       │
//! │  ├─ download ─── 流式下载 → 临时文件 → 改名覆盖           │
//! │  ├─ image_handler 加载 · 解码 · 降采样 · 写剪贴板         │
//! │  ├─ context_menu  原生“复制图片”右键菜单                 │
//! │  │                                                       │
//! │  ├─ storage ──── 下载目录与文件命名                       │
//! │  └─ settings ─── settings.json 持久化与运行时生效         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，所有 Tauri command 的返回类型 |
//! | [`events`] | 宿主桥事件定义与发送接缝 |
//! | [`net`] | 共享的 HTTP 客户端构建与 URL 处理 |
//! | [`download`] | 单张 / 批量下载图片到下载目录 |
//! | [`image_handler`] | 从 URL / data URL 加载图片并复制到剪贴板 |
//! | [`context_menu`] | 图片右键菜单与菜单事件分发 |
//! | [`storage`] | 下载目录解析、文件名推导、目录统计 |
//! | [`settings`] | 用户设置的读取、校验、保存与应用 |

pub mod context_menu;
pub mod download;
pub mod error;
pub mod events;
pub mod image_handler;
pub mod net;
pub mod settings;
pub mod storage;

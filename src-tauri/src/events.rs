//! # 宿主桥事件模块
//!
//! ## 设计思路
//!
//! 每个请求除了通过 invoke 返回值得到一次性结果外，还会向前端广播命名事件，
//! 兼容“监听事件”式的旧调用方。所有事件都携带 `requestId`，
//! 前端按请求身份匹配结果，而不是依赖到达顺序。
//!
//! ## 实现思路
//!
//! - `EventSink` 是核心服务与 Tauri 之间的唯一接缝：
//!   生产环境由 `AppHandle` 实现（`Emitter::emit`），测试中可替换为内存记录器。
//! - `BridgeEvent` 使用 `#[serde(untagged)]`，序列化后即为载荷本身，
//!   事件名由 `BridgeEvent::name` 给出。

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tauri::{AppHandle, Emitter, Runtime};

pub const DOWNLOAD_COMPLETE_EVENT: &str = "download-complete";
pub const DOWNLOAD_ERROR_EVENT: &str = "download-error";
pub const COPY_COMPLETE_EVENT: &str = "copy-complete";
pub const COPY_ERROR_EVENT: &str = "copy-error";
pub const IMAGE_COPYING_EVENT: &str = "image-copying";
pub const IMAGE_COPIED_EVENT: &str = "image-copied";

static REQUEST_SEQ: AtomicU64 = AtomicU64::new(1);

/// 为未携带 `requestId` 的请求生成进程内唯一标识。
pub fn next_request_id(prefix: &str) -> String {
    format!("{}-{}", prefix, REQUEST_SEQ.fetch_add(1, Ordering::Relaxed))
}

/// 取调用方提供的 `requestId`，为空时生成新的。
pub fn resolve_request_id(provided: Option<String>, prefix: &str) -> String {
    provided
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| next_request_id(prefix))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadCompletePayload {
    pub request_id: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDownloadCompletePayload {
    pub request_id: String,
    pub paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadErrorPayload {
    pub request_id: String,
    /// 批量下载中失败项的下标；单张下载为 `None`。
    pub index: Option<usize>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyProgressPayload {
    pub request_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyCompletePayload {
    pub request_id: String,
    pub status: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CopyErrorPayload {
    pub request_id: String,
    pub message: String,
}

/// 宿主桥向前端发出的全部事件。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BridgeEvent {
    DownloadComplete(DownloadCompletePayload),
    BatchDownloadComplete(BatchDownloadCompletePayload),
    DownloadError(DownloadErrorPayload),
    ImageCopying(CopyProgressPayload),
    ImageCopied(CopyProgressPayload),
    CopyComplete(CopyCompletePayload),
    CopyError(CopyErrorPayload),
}

impl BridgeEvent {
    /// 前端监听使用的事件名。
    pub fn name(&self) -> &'static str {
        match self {
            Self::DownloadComplete(_) | Self::BatchDownloadComplete(_) => DOWNLOAD_COMPLETE_EVENT,
            Self::DownloadError(_) => DOWNLOAD_ERROR_EVENT,
            Self::ImageCopying(_) => IMAGE_COPYING_EVENT,
            Self::ImageCopied(_) => IMAGE_COPIED_EVENT,
            Self::CopyComplete(_) => COPY_COMPLETE_EVENT,
            Self::CopyError(_) => COPY_ERROR_EVENT,
        }
    }
}

/// 事件出口。
///
/// 发送失败只记录日志，不影响操作本身的结果。
pub trait EventSink: Send + Sync {
    fn emit_event(&self, event: BridgeEvent);
}

impl<R: Runtime> EventSink for AppHandle<R> {
    fn emit_event(&self, event: BridgeEvent) {
        let name = event.name();
        if let Err(err) = self.emit(name, event) {
            log::warn!("📡 事件发送失败 - {}: {}", name, err);
        }
    }
}

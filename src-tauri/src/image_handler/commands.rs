//! # Tauri 命令层
//!
//! 命令层仅做 IPC 参数接收与结果返回，实际处理交由 `ImageHandler`。
//! 复制失败通过 `ClipboardImageResult::Failure` 正常返回，同时发出 `copy-error` 事件。

use tauri::{AppHandle, State, Wry};

use super::{ClipboardImageRequest, ClipboardImageResult, ImageHandler};
use crate::error::AppError;

/// 下载图片并以位图形式写入系统剪贴板。
#[tauri::command]
pub async fn copy_image(
    state: State<'_, ImageHandler>,
    app: AppHandle<Wry>,
    request: ClipboardImageRequest,
) -> Result<ClipboardImageResult, AppError> {
    Ok(state.copy_and_report(request, &app).await)
}

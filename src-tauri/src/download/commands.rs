//! # Tauri 命令层
//!
//! 命令层仅做 IPC 参数接收与结果返回，实际处理交由 `DownloadService`。
//! 下载失败通过 `DownloadResult::Failure` 正常返回，Promise 不会因业务失败而 reject。

use tauri::{AppHandle, State, Wry};

use super::{BatchDownloadReport, DownloadRequest, DownloadResult, DownloadService};
use crate::error::AppError;

/// 下载单张图片到下载目录。
#[tauri::command]
pub async fn download_image(
    state: State<'_, DownloadService>,
    app: AppHandle<Wry>,
    request: DownloadRequest,
) -> Result<DownloadResult, AppError> {
    Ok(state.download_and_report(request, &app).await)
}

/// 批量下载图片，返回成功路径与逐项失败明细。
#[tauri::command]
pub async fn download_images(
    state: State<'_, DownloadService>,
    app: AppHandle<Wry>,
    requests: Vec<DownloadRequest>,
    request_id: Option<String>,
) -> Result<BatchDownloadReport, AppError> {
    Ok(state
        .download_batch_and_report(requests, request_id, &app)
        .await)
}

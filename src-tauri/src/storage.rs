//! 下载目录与文件命名模块
//!
//! # 设计思路
//!
//! 统一管理图片下载的落盘位置与文件名规则：
//! - 目录：优先使用用户在设置中配置的自定义目录，未设置时回退到系统“下载”目录。
//! - 文件名：由名称提示（通常是提示词）确定性推导，同名文件直接覆盖。
//!
//! # 实现思路
//!
//! - 名称提示按空白切词，只取前若干个词并直接拼接（不保留空格），
//!   例如 `"a sunset over hills"` → `asunsetover`。
//! - 文件系统保留字符替换为 `_`，首尾的点去掉，结果为空时回退为 `image`。
//! - 目录不存在时自动 `create_dir_all`，所有失败均返回 `Result`。

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tauri::{AppHandle, Manager, Runtime, State};

use crate::download::DownloadService;
use crate::error::AppError;

/// 推导结果为空时使用的文件名。
pub const FALLBACK_FILE_STEM: &str = "image";

/// 下载目录信息
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub path: String,
    pub total_size: u64,
    pub file_count: u64,
}

/// 获取下载目录
///
/// # 参数
/// * `app` - Tauri 应用句柄，用于获取系统下载目录
/// * `custom_dir` - 用户自定义目录（可选）
///
/// # 返回
/// - `Ok(PathBuf)`：可用的下载目录（已确保存在）
/// - `Err(AppError::Storage)`：无法获取或创建目录
pub fn resolve_downloads_dir<R: Runtime>(
    app: &AppHandle<R>,
    custom_dir: Option<&str>,
) -> Result<PathBuf, AppError> {
    if let Some(dir) = custom_dir.map(str::trim).filter(|dir| !dir.is_empty()) {
        let path = PathBuf::from(dir);
        ensure_dir(&path)?;
        return Ok(path);
    }

    let downloads = app
        .path()
        .download_dir()
        .map_err(|e| AppError::Storage(format!("获取系统下载目录失败: {}", e)))?;
    ensure_dir(&downloads)?;
    Ok(downloads)
}

fn ensure_dir(path: &Path) -> Result<(), AppError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            AppError::Storage(format!("创建目录 '{}' 失败: {}", path.display(), e))
        })?;
    }
    Ok(())
}

/// 由名称提示推导文件名主体（不含扩展名）。
pub fn file_stem_from_hint(hint: &str, max_words: usize) -> String {
    let joined: String = hint.split_whitespace().take(max_words.max(1)).collect();
    let sanitized = sanitize_file_stem(&joined);

    if sanitized.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        sanitized
    }
}

/// 替换文件系统保留字符，并去掉首尾的点。
pub fn sanitize_file_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

/// 计算下载目标路径：`<dir>/<stem>.<extension>`。
pub fn destination_path(dir: &Path, hint: &str, max_words: usize, extension: &str) -> PathBuf {
    let stem = file_stem_from_hint(hint, max_words);
    dir.join(format!("{}.{}", stem, extension.trim_start_matches('.')))
}

/// 统计目录下的文件数量与总大小（不递归）。
pub fn summarize_dir(dir: &Path) -> StorageInfo {
    let mut total_size: u64 = 0;
    let mut file_count: u64 = 0;

    if let Ok(entries) = fs::read_dir(dir) {
        for entry in entries.flatten() {
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    total_size += metadata.len();
                    file_count += 1;
                }
            }
        }
    }

    StorageInfo {
        path: dir.to_string_lossy().to_string(),
        total_size,
        file_count,
    }
}

/// 获取当前下载目录信息（路径 + 占用大小 + 文件数）
#[tauri::command]
pub fn get_downloads_dir_info(state: State<'_, DownloadService>) -> Result<StorageInfo, AppError> {
    let config = state.config_snapshot()?;
    Ok(summarize_dir(&config.target_dir))
}

//! # 下载服务（可注入状态）
//!
//! ## 设计思路
//!
//! `DownloadService` 作为 Tauri 注入状态，持有复用型 HTTP 客户端与运行时配置。
//! 单次请求使用同一份配置快照，设置变更不会影响进行中的下载。
//!
//! ## 实现思路
//!
//! 1. 校验 URL（仅 http/https）并推导目标路径
//! 2. 发起 GET，非 2xx 直接视为网络失败，此时尚未创建任何文件
//! 3. 响应体以流的方式写入同目录下的唯一临时文件，写完后 flush + sync
//! 4. 改名覆盖目标文件；任一步失败都删除临时文件
//!
//! 临时文件名带进程内序号，同一名称提示的并发下载互不干扰，最后完成者覆盖。

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use futures::StreamExt;
use futures::future::join_all;
use tokio::io::AsyncWriteExt;

use super::{BatchDownloadReport, DownloadError, DownloadFailure, DownloadRequest, DownloadResult};
use crate::events::{
    self, BatchDownloadCompletePayload, BridgeEvent, DownloadCompletePayload,
    DownloadErrorPayload, EventSink,
};
use crate::{net, storage};

/// 名称提示默认保留的词数。
pub const DEFAULT_NAME_HINT_WORDS: usize = 3;
/// 下载文件固定扩展名。
pub const DEFAULT_FILE_EXTENSION: &str = "png";

static PART_FILE_SEQ: AtomicU64 = AtomicU64::new(1);

/// 下载配置。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadConfig {
    /// 下载目录。
    pub target_dir: PathBuf,
    /// 名称提示取前几个词拼接为文件名。
    pub name_hint_words: usize,
    /// 固定扩展名（不含点）。
    pub file_extension: String,
}

impl DownloadConfig {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            name_hint_words: DEFAULT_NAME_HINT_WORDS,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
        }
    }

    /// 计算某个名称提示对应的目标路径。
    pub fn destination_for(&self, name_hint: &str) -> PathBuf {
        storage::destination_path(
            &self.target_dir,
            name_hint,
            self.name_hint_words,
            &self.file_extension,
        )
    }
}

/// 图片下载服务。
pub struct DownloadService {
    client: reqwest::Client,
    config: Arc<RwLock<DownloadConfig>>,
}

impl DownloadService {
    /// 根据初始配置创建服务。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_batch_studio::download::{DownloadConfig, DownloadService};
    ///
    /// let service = DownloadService::new(DownloadConfig::new("/tmp/downloads"))?;
    /// # Ok::<(), image_batch_studio::download::DownloadError>(())
    /// ```
    pub fn new(config: DownloadConfig) -> Result<Self, DownloadError> {
        let client = net::build_http_client()
            .map_err(|e| DownloadError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            client,
            config: Arc::new(RwLock::new(config)),
        })
    }

    /// 获取配置快照。
    pub fn config_snapshot(&self) -> Result<DownloadConfig, DownloadError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| DownloadError::Storage("下载配置读取锁已中毒".to_string()))
    }

    /// 替换运行时配置（设置变更时调用）。
    pub fn replace_config(&self, next: DownloadConfig) -> Result<(), DownloadError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| DownloadError::Storage("下载配置写入锁已中毒".to_string()))?;

        log::info!(
            "⚙️ 下载配置已更新：dir={} words={} ext={}",
            next.target_dir.display(),
            next.name_hint_words,
            next.file_extension
        );
        *config = next;
        Ok(())
    }

    /// 下载单张图片，成功返回落盘路径。
    pub async fn download(&self, request: &DownloadRequest) -> Result<PathBuf, DownloadError> {
        let config = self.config_snapshot()?;
        self.download_with_config(request, &config).await
    }

    /// 并发下载多张图片，结果顺序与请求顺序一致。
    pub async fn download_batch(
        &self,
        requests: &[DownloadRequest],
    ) -> Result<Vec<Result<PathBuf, DownloadError>>, DownloadError> {
        let config = self.config_snapshot()?;
        let config = &config;

        Ok(join_all(
            requests
                .iter()
                .map(|request| self.download_with_config(request, config)),
        )
        .await)
    }

    /// 下载单张并上报：返回一次性结果，同时发出完成 / 失败事件。
    pub async fn download_and_report(
        &self,
        request: DownloadRequest,
        sink: &dyn EventSink,
    ) -> DownloadResult {
        let request_id = events::resolve_request_id(request.request_id.clone(), "download");

        match self.download(&request).await {
            Ok(path) => {
                let path = path.to_string_lossy().to_string();
                sink.emit_event(BridgeEvent::DownloadComplete(DownloadCompletePayload {
                    request_id,
                    path: path.clone(),
                }));
                DownloadResult::Success { path }
            }
            Err(err) => {
                log::error!(
                    "❌ 图片下载失败 - {} [{}]: {}",
                    net::redact_url_for_log(&request.url),
                    err.code(),
                    err
                );
                let message = err.to_string();
                sink.emit_event(BridgeEvent::DownloadError(DownloadErrorPayload {
                    request_id,
                    index: None,
                    message: message.clone(),
                }));
                DownloadResult::Failure { message }
            }
        }
    }

    /// 批量下载并上报：成功路径汇总为一次 `download-complete`，
    /// 每个失败项各发一次带下标的 `download-error`。
    pub async fn download_batch_and_report(
        &self,
        requests: Vec<DownloadRequest>,
        request_id: Option<String>,
        sink: &dyn EventSink,
    ) -> BatchDownloadReport {
        let request_id = events::resolve_request_id(request_id, "batch");
        let started = Instant::now();

        let outcomes = match self.download_batch(&requests).await {
            Ok(outcomes) => outcomes,
            Err(err) => requests
                .iter()
                .map(|_| Err(DownloadError::Storage(err.to_string())))
                .collect(),
        };

        let mut report = BatchDownloadReport {
            request_id: request_id.clone(),
            ..BatchDownloadReport::default()
        };

        for (index, (request, outcome)) in requests.iter().zip(outcomes).enumerate() {
            match outcome {
                Ok(path) => report.paths.push(path.to_string_lossy().to_string()),
                Err(err) => {
                    log::warn!(
                        "⚠️ 批量下载第 {} 项失败 - {} [{}]: {}",
                        index,
                        net::redact_url_for_log(&request.url),
                        err.code(),
                        err
                    );
                    let message = err.to_string();
                    sink.emit_event(BridgeEvent::DownloadError(DownloadErrorPayload {
                        request_id: request_id.clone(),
                        index: Some(index),
                        message: message.clone(),
                    }));
                    report.failures.push(DownloadFailure {
                        index,
                        url: request.url.clone(),
                        name_hint: request.name_hint.clone(),
                        message,
                    });
                }
            }
        }

        log::info!(
            "📦 批量下载结束 - 成功 {} / 失败 {} / 耗时 {}ms",
            report.paths.len(),
            report.failures.len(),
            started.elapsed().as_millis()
        );

        sink.emit_event(BridgeEvent::BatchDownloadComplete(BatchDownloadCompletePayload {
            request_id,
            paths: report.paths.clone(),
        }));

        report
    }

    async fn download_with_config(
        &self,
        request: &DownloadRequest,
        config: &DownloadConfig,
    ) -> Result<PathBuf, DownloadError> {
        let url = net::parse_remote_url(&request.url)?;
        let destination = config.destination_for(&request.name_hint);
        let started = Instant::now();

        log::info!(
            "🌐 开始下载图片 - URL: {} -> {}",
            net::redact_url_for_log(url.as_str()),
            destination.display()
        );

        tokio::fs::create_dir_all(&config.target_dir)
            .await
            .map_err(|e| {
                DownloadError::Storage(format!("创建目录 '{}' 失败：{}", config.target_dir.display(), e))
            })?;

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| DownloadError::Network(net::describe_request_error(&e, url.as_str())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::HttpStatus {
                status: status.as_u16(),
                reason: net::status_message(status.as_u16()),
            });
        }

        let part = part_file_path(&destination);
        let written = match write_body_to_file(response, &part).await {
            Ok(written) => written,
            Err(err) => {
                remove_partial_file(&part).await;
                return Err(err);
            }
        };

        if let Err(e) = tokio::fs::rename(&part, &destination).await {
            remove_partial_file(&part).await;
            return Err(DownloadError::FileSystem(format!(
                "无法写入 '{}'：{}",
                destination.display(),
                e
            )));
        }

        log::info!(
            "✅ 下载完成 - {} bytes -> {}（{}ms）",
            written,
            destination.display(),
            started.elapsed().as_millis()
        );

        Ok(destination)
    }
}

/// 目标文件同目录下的唯一临时文件：`.<name>.<pid>-<seq>.part`。
fn part_file_path(destination: &Path) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| storage::FALLBACK_FILE_STEM.to_string());
    let seq = PART_FILE_SEQ.fetch_add(1, Ordering::Relaxed);

    destination.with_file_name(format!(".{}.{}-{}.part", file_name, std::process::id(), seq))
}

async fn write_body_to_file(
    response: reqwest::Response,
    part: &Path,
) -> Result<u64, DownloadError> {
    let mut file = tokio::fs::File::create(part)
        .await
        .map_err(|e| DownloadError::FileSystem(format!("无法创建文件：{}", e)))?;

    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| DownloadError::Network(format!("下载中断：{}", e)))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| DownloadError::FileSystem(format!("写入失败：{}", e)))?;
        written += chunk.len() as u64;
    }

    file.flush()
        .await
        .map_err(|e| DownloadError::FileSystem(format!("写入失败：{}", e)))?;
    file.sync_all()
        .await
        .map_err(|e| DownloadError::FileSystem(format!("同步文件失败：{}", e)))?;

    Ok(written)
}

async fn remove_partial_file(part: &Path) {
    match tokio::fs::remove_file(part).await {
        Ok(()) => log::debug!("🧹 已删除未完成文件 - {}", part.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => log::warn!("⚠️ 删除未完成文件失败 - {}: {}", part.display(), e),
    }
}

//! # 核心编排模块
//!
//! ## 设计思路
//!
//! `ImageHandler` 只负责流程编排与配置管理，不直接与 Tauri 绑定。
//! 处理链路固定为：
//! 1. 读取配置快照
//! 2. 按来源加载原始字节
//! 3. 解码并准备 RGBA 数据
//! 4. 写入剪贴板（含重试）
//!
//! ## 实现思路
//!
//! - 配置通过 `Arc<RwLock<ImageConfig>>` 支持运行时动态切档。
//! - 单次请求内使用“同一配置快照”，避免处理中途配置漂移。
//! - 记录 `load/decode/copy/total` 阶段耗时，便于性能诊断。
//! - 事件通过 `EventSink` 发出，测试中可替换为内存记录器。

use std::sync::{Arc, RwLock};
use std::time::Instant;

use super::clipboard_writer::{ImageClipboard, SystemClipboard};
use super::source::{ClipboardImageRequest, ClipboardImageResult};
use super::{ImageConfig, ImageError, ImagePerformanceProfile, ImageSource};
use crate::events::{
    self, BridgeEvent, CopyCompletePayload, CopyErrorPayload, CopyProgressPayload, EventSink,
};
use crate::net;

/// 图片处理器。
///
/// 封装了配置状态、HTTP 客户端与剪贴板后端，并编排各子模块实现完整流程。
pub struct ImageHandler {
    pub(super) config: Arc<RwLock<ImageConfig>>,
    pub(super) client: reqwest::Client,
    pub(super) clipboard: Arc<dyn ImageClipboard>,
}

impl ImageHandler {
    /// 使用系统剪贴板创建处理器。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use image_batch_studio::image_handler::{ImageConfig, ImageHandler};
    ///
    /// let handler = ImageHandler::new(ImageConfig::default())?;
    /// # Ok::<(), image_batch_studio::image_handler::ImageError>(())
    /// ```
    pub fn new(config: ImageConfig) -> Result<Self, ImageError> {
        Self::with_clipboard(config, Arc::new(SystemClipboard))
    }

    /// 使用指定剪贴板后端创建处理器。
    pub fn with_clipboard(
        config: ImageConfig,
        clipboard: Arc<dyn ImageClipboard>,
    ) -> Result<Self, ImageError> {
        let client = net::build_http_client()
            .map_err(|e| ImageError::Network(format!("无法创建 HTTP 客户端：{}", e)))?;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            client,
            clipboard,
        })
    }

    /// 获取配置快照。
    ///
    /// 作用：保证单次请求链路使用一致参数。
    pub fn config_snapshot(&self) -> Result<ImageConfig, ImageError> {
        self.config
            .read()
            .map(|cfg| cfg.clone())
            .map_err(|_| ImageError::ResourceLimit("配置读取锁已中毒".to_string()))
    }

    /// 设置性能档位。
    pub fn set_performance_profile(
        &self,
        profile: ImagePerformanceProfile,
    ) -> Result<(), ImageError> {
        let mut config = self
            .config
            .write()
            .map_err(|_| ImageError::ResourceLimit("配置写入锁已中毒".to_string()))?;
        config.apply_performance_profile(profile);

        log::info!(
            "⚙️ 已切换图片性能档位：{:?}（adaptive_resize={}, target_pixels={}, max_dim={}, filter={:?}）",
            profile,
            config.adaptive_resize,
            config.clipboard_target_pixels,
            config.clipboard_max_dimension,
            config.resize_filter
        );

        Ok(())
    }

    /// 获取当前生效档位。
    pub fn get_performance_profile(&self) -> Result<ImagePerformanceProfile, ImageError> {
        let config = self
            .config
            .read()
            .map_err(|_| ImageError::ResourceLimit("配置读取锁已中毒".to_string()))?;
        Ok(config.infer_performance_profile())
    }

    /// 处理主入口：从任意来源加载并复制图片。
    pub async fn process_and_copy(&self, source: ImageSource) -> Result<(), ImageError> {
        let config = self.config_snapshot()?;
        let total_start = Instant::now();

        let load_start = Instant::now();
        let raw = self.load(&source, &config).await?;
        let load_elapsed = load_start.elapsed();

        let decode_start = Instant::now();
        let decode_config = config.clone();
        let prepared = tokio::task::spawn_blocking(move || {
            Self::decode_and_prepare_for_clipboard(raw, &decode_config)
        })
        .await
        .map_err(|e| ImageError::Decode(format!("解码线程执行失败：{}", e)))??;
        let decode_elapsed = decode_start.elapsed();

        let copy_start = Instant::now();
        self.copy_to_clipboard_with_retry(prepared, &config).await?;
        let copy_elapsed = copy_start.elapsed();

        log::info!(
            "✅ 图片处理完成 - load={}ms decode={}ms copy={}ms total={}ms",
            load_elapsed.as_millis(),
            decode_elapsed.as_millis(),
            copy_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(())
    }

    /// 复制并上报：返回一次性结果，同时发出进度 / 完成 / 失败事件。
    pub async fn copy_and_report(
        &self,
        request: ClipboardImageRequest,
        sink: &dyn EventSink,
    ) -> ClipboardImageResult {
        let request_id = events::resolve_request_id(request.request_id.clone(), "copy");

        sink.emit_event(BridgeEvent::ImageCopying(CopyProgressPayload {
            request_id: request_id.clone(),
        }));

        match self.process_and_copy(ImageSource::from_locator(&request.url)).await {
            Ok(()) => {
                sink.emit_event(BridgeEvent::ImageCopied(CopyProgressPayload {
                    request_id: request_id.clone(),
                }));
                sink.emit_event(BridgeEvent::CopyComplete(CopyCompletePayload {
                    request_id,
                    status: true,
                }));
                ClipboardImageResult::Success
            }
            Err(err) => {
                log::error!(
                    "❌ 复制图片失败 - {} [{} @ {}]: {}",
                    net::redact_url_for_log(&request.url),
                    err.code(),
                    err.stage(),
                    err
                );
                let message = err.to_string();
                sink.emit_event(BridgeEvent::CopyError(CopyErrorPayload {
                    request_id,
                    message: message.clone(),
                }));
                ClipboardImageResult::Failure { message }
            }
        }
    }
}

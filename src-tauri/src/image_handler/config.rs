//! # 配置模块
//!
//! ## 设计思路
//!
//! 将复制链路的所有“可调策略”集中到 `ImageConfig`。
//! 性能档位（quality / balanced / speed）作为高层语义，映射到底层参数组合：
//! 是否降采样、降采样目标，以及大图是否先重编码为 JPEG 以压缩剪贴板载荷。
//!
//! ## 实现思路
//!
//! - `Default` 对应 `quality` 档位：原样复制，降采样与重编码需在设置中显式开启。
//! - `ImagePerformanceProfile` 实现 `FromStr`，负责档位字符串解析与反向输出。
//! - `infer_performance_profile` 用于从当前配置反推档位（给前端展示状态）。

use std::str::FromStr;

use image::imageops::FilterType;

use super::ImageError;

/// 图片复制配置。
///
/// 字段覆盖了加载、解码、重编码、降采样与剪贴板写入重试几个阶段。
#[derive(Debug, Clone)]
pub struct ImageConfig {
    /// 下载/解析原始字节时允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 重编码 JPEG 质量；`None` 表示不重编码。
    pub reencode_quality: Option<u8>,
    /// 原始载荷超过该体积才触发重编码（字节）。
    pub reencode_threshold_bytes: u64,
    /// 是否启用自适应降采样。
    pub adaptive_resize: bool,
    /// 降采样后目标像素上限。
    pub clipboard_target_pixels: u64,
    /// 降采样后宽/高单边最大值。
    pub clipboard_max_dimension: u32,
    /// 降采样滤镜策略。
    pub resize_filter: FilterType,
    /// 写入剪贴板失败时最大尝试次数。
    pub clipboard_retries: u32,
    /// 重试基础间隔（毫秒）。
    pub clipboard_retry_delay: u64,
    /// 单次写入流程允许的总重试预算（毫秒）。
    pub clipboard_retry_max_total_ms: u64,
    /// 单次退避延迟上限（毫秒）。
    pub clipboard_retry_max_delay_ms: u64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            reencode_quality: None,
            reencode_threshold_bytes: 8 * 1024 * 1024,
            adaptive_resize: false,
            clipboard_target_pixels: 40_000_000,
            clipboard_max_dimension: 8192,
            resize_filter: FilterType::CatmullRom,
            clipboard_retries: 3,
            clipboard_retry_delay: 100,
            clipboard_retry_max_total_ms: 1_800,
            clipboard_retry_max_delay_ms: 900,
        }
    }
}

/// 图片性能档位（面向产品/用户语义）。
///
/// - `Quality`：原样复制，不降采样、不重编码
/// - `Balanced`：大图降采样
/// - `Speed`：更激进的降采样，大载荷先重编码为 JPEG
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePerformanceProfile {
    Quality,
    Balanced,
    Speed,
}

impl ImagePerformanceProfile {
    /// 将档位输出为稳定字符串，供前端展示与持久化。
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }
}

impl FromStr for ImagePerformanceProfile {
    type Err = ImageError;

    fn from_str(profile: &str) -> Result<Self, Self::Err> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ImageError::InvalidFormat(format!(
                "未知性能档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }
}

impl ImageConfig {
    /// 基于当前参数反推性能档位。
    pub fn infer_performance_profile(&self) -> ImagePerformanceProfile {
        if !self.adaptive_resize && self.reencode_quality.is_none() {
            return ImagePerformanceProfile::Quality;
        }

        if self.reencode_quality.is_some()
            || self.clipboard_target_pixels <= 2_000_000
            || self.clipboard_max_dimension <= 1920
        {
            return ImagePerformanceProfile::Speed;
        }

        ImagePerformanceProfile::Balanced
    }

    /// 应用指定性能档位到实际参数。
    pub fn apply_performance_profile(&mut self, profile: ImagePerformanceProfile) {
        match profile {
            ImagePerformanceProfile::Quality => {
                self.adaptive_resize = false;
                self.reencode_quality = None;
                self.clipboard_target_pixels = self.max_decoded_pixels;
                self.clipboard_max_dimension = 8192;
                self.resize_filter = FilterType::CatmullRom;
            }
            ImagePerformanceProfile::Balanced => {
                self.adaptive_resize = true;
                self.reencode_quality = None;
                self.reencode_threshold_bytes = 8 * 1024 * 1024;
                self.clipboard_target_pixels = 5_000_000;
                self.clipboard_max_dimension = 2560;
                self.resize_filter = FilterType::Triangle;
            }
            ImagePerformanceProfile::Speed => {
                self.adaptive_resize = true;
                self.reencode_quality = Some(85);
                self.reencode_threshold_bytes = 2 * 1024 * 1024;
                self.clipboard_target_pixels = 2_000_000;
                self.clipboard_max_dimension = 1920;
                self.resize_filter = FilterType::Nearest;
            }
        }
    }
}

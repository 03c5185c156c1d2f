//! # 剪贴板写入模块
//!
//! ## 设计思路
//!
//! 将与操作系统剪贴板交互的逻辑独立出来，便于隔离平台不稳定因素。
//! `ImageClipboard` 是唯一的平台接缝：生产环境使用 `SystemClipboard`（arboard），
//! 测试中可注入内存实现。
//!
//! ## 实现思路
//!
//! - 写入在 `spawn_blocking` 线程中执行，避免阻塞 async 运行时。
//! - 失败按 Busy / Transient / Fatal 分类，仅前两类参与重试。
//! - 重试间隔为指数退避 + 抖动，并受总预算约束。
//! - 剪贴板是全局资源，不与其他写入方协调，最后一次写入生效。

use std::borrow::Cow;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use super::source::PreparedClipboardImage;
use super::{ImageConfig, ImageError, ImageHandler};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardFailureKind {
    Busy,
    Transient,
    Fatal,
}

/// 单次写入失败。
#[derive(Debug, Clone)]
pub struct ClipboardWriteFailure {
    pub kind: ClipboardFailureKind,
    pub message: String,
}

impl ClipboardWriteFailure {
    pub fn busy(message: impl Into<String>) -> Self {
        Self {
            kind: ClipboardFailureKind::Busy,
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self {
            kind: ClipboardFailureKind::Transient,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: ClipboardFailureKind::Fatal,
            message: message.into(),
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self.kind, ClipboardFailureKind::Busy | ClipboardFailureKind::Transient)
    }
}

/// 系统剪贴板图片写入能力。
///
/// 实现方在阻塞线程中被调用，可以执行同步 I/O。
pub trait ImageClipboard: Send + Sync {
    fn set_image(&self, image: &PreparedClipboardImage) -> Result<(), ClipboardWriteFailure>;
}

/// 基于 arboard 的系统剪贴板。
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl ImageClipboard for SystemClipboard {
    fn set_image(&self, image: &PreparedClipboardImage) -> Result<(), ClipboardWriteFailure> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| ClipboardWriteFailure::busy(format!("无法访问剪贴板：{}", e)))?;

        let image_data = arboard::ImageData {
            width: image.width,
            height: image.height,
            bytes: Cow::Borrowed(image.bytes.as_slice()),
        };

        clipboard.set_image(image_data).map_err(classify_arboard_error)
    }
}

fn classify_arboard_error(error: arboard::Error) -> ClipboardWriteFailure {
    let message = format!("复制失败：{}", error);
    match error {
        arboard::Error::ClipboardOccupied => ClipboardWriteFailure::busy(message),
        arboard::Error::ClipboardNotSupported | arboard::Error::ConversionFailure => {
            ClipboardWriteFailure::fatal(message)
        }
        _ => ClipboardWriteFailure::transient(message),
    }
}

/// 重试策略（取自配置快照）。
#[derive(Debug, Clone, Copy)]
struct RetryPolicy {
    attempts: u32,
    base_delay_ms: u64,
    max_total_ms: u64,
    max_delay_ms: u64,
}

impl RetryPolicy {
    fn from_config(config: &ImageConfig) -> Self {
        Self {
            attempts: config.clipboard_retries.max(1),
            base_delay_ms: config.clipboard_retry_delay.max(1),
            max_total_ms: config.clipboard_retry_max_total_ms,
            max_delay_ms: config.clipboard_retry_max_delay_ms,
        }
    }
}

static JITTER_STATE: AtomicU64 = AtomicU64::new(0);

fn seed_jitter_state() -> u64 {
    let time_seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let state = time_seed ^ ((std::process::id() as u64) << 32) ^ 0x9E37_79B9_7F4A_7C15;
    if state == 0 { 0xA5A5_5A5A_0123_4567 } else { state }
}

/// xorshift64，仅用于退避抖动。
fn next_jitter_u64() -> u64 {
    let mut current = JITTER_STATE.load(Ordering::Relaxed);

    loop {
        let mut next = if current == 0 { seed_jitter_state() } else { current };
        next ^= next << 13;
        next ^= next >> 7;
        next ^= next << 17;

        match JITTER_STATE.compare_exchange_weak(
            current,
            next,
            Ordering::Relaxed,
            Ordering::Relaxed,
        ) {
            Ok(_) => return next,
            Err(observed) => current = observed,
        }
    }
}

fn compute_backoff_delay_with_jitter(base_delay_ms: u64, attempt: u32, max_delay_ms: u64) -> u64 {
    let exp = base_delay_ms.saturating_mul(1_u64 << attempt.saturating_sub(1).min(8));
    let capped = exp.min(max_delay_ms.max(base_delay_ms));
    let jitter_bound = (capped / 3).max(1);
    let jitter = next_jitter_u64() % (jitter_bound + 1);
    capped.saturating_add(jitter)
}

fn would_exceed_retry_budget(elapsed_ms: u64, wait_ms: u64, budget_ms: u64) -> bool {
    elapsed_ms.saturating_add(wait_ms) > budget_ms
}

/// 在阻塞线程中执行写入 + 重试。
fn write_image_with_retry(
    clipboard: &dyn ImageClipboard,
    image: &PreparedClipboardImage,
    policy: RetryPolicy,
) -> Result<(), ImageError> {
    let started = Instant::now();
    let mut last_failure: Option<ClipboardWriteFailure> = None;

    for attempt in 1..=policy.attempts {
        if attempt > 1 {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let wait_ms = compute_backoff_delay_with_jitter(
                policy.base_delay_ms,
                attempt - 1,
                policy.max_delay_ms,
            );

            if would_exceed_retry_budget(elapsed_ms, wait_ms, policy.max_total_ms) {
                log::warn!(
                    "⏱️ 跳过第 {} 次重试：等待 {}ms 会超过预算 {}ms",
                    attempt,
                    wait_ms,
                    policy.max_total_ms
                );
                break;
            }

            log::debug!("🔄 重试 {}/{}，等待 {}ms", attempt, policy.attempts, wait_ms);
            std::thread::sleep(Duration::from_millis(wait_ms));
        }

        match clipboard.set_image(image) {
            Ok(()) => {
                log::info!("✅ 复制成功 (尝试 {})", attempt);
                return Ok(());
            }
            Err(failure) => {
                let retryable = failure.is_retryable();
                log::warn!(
                    "❌ 尝试 {} 失败: {}（kind={:?}, retryable={}）",
                    attempt,
                    failure.message,
                    failure.kind,
                    retryable
                );
                last_failure = Some(failure);

                if !retryable {
                    break;
                }
            }
        }
    }

    match last_failure {
        Some(failure) if failure.kind == ClipboardFailureKind::Busy => {
            Err(ImageError::ClipboardBusy(failure.message))
        }
        Some(failure) => Err(ImageError::Clipboard(failure.message)),
        None => Err(ImageError::Clipboard("未知错误".to_string())),
    }
}

impl ImageHandler {
    /// 将已准备好的 RGBA 数据写入系统剪贴板（含重试）。
    pub(super) async fn copy_to_clipboard_with_retry(
        &self,
        image: PreparedClipboardImage,
        config: &ImageConfig,
    ) -> Result<(), ImageError> {
        log::debug!("📋 准备复制到剪贴板 - {}x{}", image.width, image.height);

        let clipboard = Arc::clone(&self.clipboard);
        let policy = RetryPolicy::from_config(config);

        tokio::task::spawn_blocking(move || {
            write_image_with_retry(clipboard.as_ref(), &image, policy)
        })
        .await
        .map_err(|e| ImageError::Clipboard(format!("线程执行失败：{}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FlakyClipboard {
        failures: Mutex<Vec<ClipboardWriteFailure>>,
        calls: AtomicU64,
    }

    impl FlakyClipboard {
        fn new(failures: Vec<ClipboardWriteFailure>) -> Self {
            Self {
                failures: Mutex::new(failures),
                calls: AtomicU64::new(0),
            }
        }
    }

    impl ImageClipboard for FlakyClipboard {
        fn set_image(&self, _image: &PreparedClipboardImage) -> Result<(), ClipboardWriteFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut failures = self.failures.lock().expect("failures lock");
            if failures.is_empty() {
                Ok(())
            } else {
                Err(failures.remove(0))
            }
        }
    }

    fn pixel() -> PreparedClipboardImage {
        PreparedClipboardImage {
            width: 1,
            height: 1,
            bytes: vec![1, 2, 3, 4],
        }
    }

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy {
            attempts,
            base_delay_ms: 1,
            max_total_ms: 1_000,
            max_delay_ms: 5,
        }
    }

    #[test]
    fn backoff_delay_stays_within_expected_bounds() {
        let delay = compute_backoff_delay_with_jitter(100, 4, 900);

        assert!(delay >= 800, "delay should be at least exponential base");
        assert!(delay <= 1200, "delay should include bounded jitter only");
    }

    #[test]
    fn backoff_delay_respects_max_cap() {
        let delay = compute_backoff_delay_with_jitter(300, 8, 500);

        assert!(delay >= 500, "delay should be capped at max_delay floor");
        assert!(delay <= 666, "delay should not exceed capped value + jitter");
    }

    #[test]
    fn retry_budget_checker_works() {
        assert!(would_exceed_retry_budget(1700, 120, 1800));
        assert!(!would_exceed_retry_budget(1600, 120, 1800));
        assert!(!would_exceed_retry_budget(0, 0, 1800));
    }

    #[test]
    fn busy_clipboard_is_retried_until_success() {
        let clipboard = FlakyClipboard::new(vec![
            ClipboardWriteFailure::busy("occupied"),
            ClipboardWriteFailure::transient("glitch"),
        ]);

        write_image_with_retry(&clipboard, &pixel(), fast_policy(3))
            .expect("third attempt should succeed");

        assert_eq!(clipboard.calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn fatal_failure_stops_retrying() {
        let clipboard = FlakyClipboard::new(vec![ClipboardWriteFailure::fatal("unsupported")]);

        let result = write_image_with_retry(&clipboard, &pixel(), fast_policy(3));

        assert!(matches!(result, Err(ImageError::Clipboard(_))));
        assert_eq!(clipboard.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exhausted_busy_retries_report_busy() {
        let clipboard = FlakyClipboard::new(vec![
            ClipboardWriteFailure::busy("occupied"),
            ClipboardWriteFailure::busy("occupied"),
        ]);

        let result = write_image_with_retry(&clipboard, &pixel(), fast_policy(2));

        assert!(matches!(result, Err(ImageError::ClipboardBusy(_))));
    }
}

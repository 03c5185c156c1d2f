//! # 加载模块
//!
//! ## 设计思路
//!
//! 统一处理两种来源（网络 URL / data URL）的原始字节加载，并在“尽可能早”的阶段做体积校验。
//! 加载失败时剪贴板尚未被触碰。
//!
//! ## 实现思路
//!
//! - URL：协议校验 → GET → 状态码 → Content-Length 预判 → 分块读取并累计体积。
//! - data URL：要求 `data:image/...;base64,`，先估算解码后体积再解码。
//! - 不设置读取超时，沿用 reqwest 默认行为。

use base64::{Engine as _, engine::general_purpose};

use super::source::{ImageSource, RawImageData};
use super::{ImageConfig, ImageError, ImageHandler};
use crate::net;

const BUFFER_INITIAL_CAPACITY: usize = 16 * 1024;
const DATA_URL_BASE64_MARKER: &str = ";base64,";

impl ImageHandler {
    /// 按来源加载原始字节。
    pub(super) async fn load(
        &self,
        source: &ImageSource,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        match source {
            ImageSource::Url(url) => self.load_from_url(url, config).await,
            ImageSource::DataUrl(data) => Self::load_from_data_url(data, config),
        }
    }

    async fn load_from_url(
        &self,
        url: &str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        let parsed = net::parse_remote_url(url)?;
        log::info!("🌐 开始获取图片 - URL: {}", net::redact_url_for_log(parsed.as_str()));

        let mut response = self
            .client
            .get(parsed.clone())
            .send()
            .await
            .map_err(|e| ImageError::Network(net::describe_request_error(&e, parsed.as_str())))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageError::Network(format!(
                "HTTP {}: {}",
                status.as_u16(),
                net::status_message(status.as_u16())
            )));
        }

        let total_len = response.content_length();
        if let Some(size) = total_len {
            if size > config.max_file_size {
                return Err(Self::oversize_error(size, config.max_file_size));
            }
        }

        let initial_capacity = total_len
            .map(|len| len.min(config.max_file_size).min(usize::MAX as u64) as usize)
            .filter(|len| *len > 0)
            .unwrap_or(BUFFER_INITIAL_CAPACITY);
        let mut buffer = Vec::with_capacity(initial_capacity);
        let mut total: u64 = 0;

        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ImageError::Network(format!("下载失败：{}", e)))?
        {
            total = total.saturating_add(chunk.len() as u64);
            if total > config.max_file_size {
                return Err(Self::oversize_error(total, config.max_file_size));
            }
            buffer.extend_from_slice(&chunk);
        }

        if buffer.is_empty() {
            return Err(ImageError::InvalidFormat("图片内容为空".to_string()));
        }

        log::debug!("✅ 获取完成 - {} bytes", total);

        Ok(RawImageData {
            bytes: buffer,
            source_hint: "url",
        })
    }

    /// 解析 `data:image/...;base64,` 内联图片。
    pub(super) fn load_from_data_url(
        data: &str,
        config: &ImageConfig,
    ) -> Result<RawImageData, ImageError> {
        log::info!("📝 开始处理 data URL 图片");

        let normalized = data.trim();
        if !normalized
            .get(..11)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("data:image/"))
        {
            return Err(ImageError::InvalidFormat("data URL 不是图片类型".to_string()));
        }

        let marker = normalized
            .find(DATA_URL_BASE64_MARKER)
            .ok_or_else(|| ImageError::InvalidFormat("缺少 base64 标记".to_string()))?;
        let payload = normalized[marker + DATA_URL_BASE64_MARKER.len()..].trim();

        let estimated = Self::estimate_base64_decoded_upper_bound_len(payload)?;
        if estimated > config.max_file_size {
            return Err(Self::oversize_error(estimated, config.max_file_size));
        }

        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| ImageError::Decode(format!("Base64 解码失败：{}", e)))?;

        if bytes.is_empty() {
            return Err(ImageError::InvalidFormat("图片内容为空".to_string()));
        }

        Ok(RawImageData {
            bytes,
            source_hint: "data-url",
        })
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, ImageError> {
        let len = base64_data.len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| ImageError::ResourceLimit("Base64 输入长度溢出".to_string()))?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| ImageError::ResourceLimit("Base64 解码体积估算溢出".to_string()))
    }

    fn oversize_error(size: u64, limit: u64) -> ImageError {
        ImageError::ResourceLimit(format!(
            "文件过大：{:.2} MB（限制：{:.2} MB）",
            size as f64 / 1024.0 / 1024.0,
            limit as f64 / 1024.0 / 1024.0
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_round_trips_payload_bytes() {
        let payload = [137_u8, 80, 78, 71, 13, 10, 26, 10];
        let encoded = general_purpose::STANDARD.encode(payload);
        let data_url = format!("data:image/png;base64,{}", encoded);

        let raw = ImageHandler::load_from_data_url(&data_url, &ImageConfig::default())
            .expect("data url should load");

        assert_eq!(raw.bytes, payload);
        assert_eq!(raw.source_hint, "data-url");
    }

    #[test]
    fn data_url_rejects_non_image_media_type() {
        let config = ImageConfig::default();
        let result = ImageHandler::load_from_data_url("data:text/plain;base64,SGVsbG8=", &config);

        assert!(matches!(result, Err(ImageError::InvalidFormat(_))));
    }

    #[test]
    fn data_url_rejects_large_payload_before_decode() {
        let mut config = ImageConfig::default();
        config.max_file_size = 32;
        let huge = format!("data:image/png;base64,{}", "A".repeat(1024));

        let result = ImageHandler::load_from_data_url(&huge, &config);

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[tokio::test]
    async fn url_with_error_status_maps_to_network_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/gone.png")
            .with_status(404)
            .create_async()
            .await;

        let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");
        let source = ImageSource::Url(format!("{}/gone.png", server.url()));

        let result = handler.load(&source, &ImageConfig::default()).await;

        assert!(matches!(result, Err(ImageError::Network(message)) if message.contains("404")));
    }

    #[tokio::test]
    async fn url_body_over_limit_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/big.png")
            .with_status(200)
            .with_body(vec![0u8; 4096])
            .create_async()
            .await;

        let handler = ImageHandler::new(ImageConfig::default()).expect("handler init failed");
        let mut config = ImageConfig::default();
        config.max_file_size = 1024;
        let source = ImageSource::Url(format!("{}/big.png", server.url()));

        let result = handler.load(&source, &config).await;

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }
}

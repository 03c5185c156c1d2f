//! # 解码与变换流水线模块
//!
//! ## 设计思路
//!
//! 将“字节 → 图像 → RGBA”的过程集中管理，并在关键节点增加资源上限控制。
//! 优先做签名与尺寸检查，再进行完整解码。
//!
//! ## 实现思路
//!
//! 1. 文件签名探测，提前拒绝 HTML 错误页等非图片内容
//! 2. 读取 header 尺寸，按像素上限快速拒绝
//! 3. 完整解码
//! 4. 载荷过大且配置了重编码质量时，重编码为 JPEG 后再解码
//! 5. 根据配置决定是否降采样
//! 6. 转换 RGBA，并校验字节长度一致性

use fast_image_resize as fr;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, ImageReader, Rgba};
use std::io::Cursor;

use super::source::{PreparedClipboardImage, RawImageData};
use super::{ImageConfig, ImageError, ImageHandler};

impl ImageHandler {
    /// 将原始字节解码为可写入剪贴板的 RGBA 数据。
    pub(crate) fn decode_and_prepare_for_clipboard(
        raw: RawImageData,
        config: &ImageConfig,
    ) -> Result<PreparedClipboardImage, ImageError> {
        Self::validate_image_signature(&raw.bytes)?;

        let (header_width, header_height) = Self::inspect_dimensions_from_memory(&raw.bytes)?;
        Self::validate_pixel_limits(config, header_width, header_height)?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| ImageError::Decode(format!("图片解码失败：{}", e)))?;

        let (raw_width, raw_height) = decoded.dimensions();
        Self::validate_pixel_limits(config, raw_width, raw_height)?;

        let reencoded = Self::maybe_reencode(decoded, raw.bytes.len() as u64, config)?;
        let optimized = Self::maybe_downscale_for_clipboard(reencoded, config)?;
        let (width, height) = optimized.dimensions();

        let bytes = optimized.to_rgba8().into_raw();

        let expected_len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| ImageError::ResourceLimit("图片尺寸导致内存溢出风险".to_string()))?;

        if bytes.len() != expected_len {
            return Err(ImageError::Decode("解码后像素数据长度异常".to_string()));
        }

        log::info!(
            "✅ 图片解码成功 - 来源: {} 原始尺寸: {}x{} 输出尺寸: {}x{}",
            raw.source_hint,
            raw_width,
            raw_height,
            width,
            height
        );

        Ok(PreparedClipboardImage {
            width: width as usize,
            height: height as usize,
            bytes,
        })
    }

    /// 通过文件签名（magic bytes）提前识别非图片内容。
    ///
    /// 无法识别的签名交给解码器判断。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), ImageError> {
        if bytes.is_empty() {
            return Err(ImageError::InvalidFormat("图片内容为空".to_string()));
        }

        if let Some(kind) = infer::get(bytes) {
            if kind.matcher_type() != infer::MatcherType::Image {
                return Err(ImageError::InvalidFormat(format!(
                    "文件签名不是图片类型：{}",
                    kind.mime_type()
                )));
            }
            log::debug!("🔎 图片签名：{}", kind.mime_type());
        }

        Ok(())
    }

    /// 仅通过内存中的图片头信息读取宽高。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), ImageError> {
        ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| ImageError::InvalidFormat(format!("无法识别图片格式：{}", e)))?
            .into_dimensions()
            .map_err(|e| ImageError::InvalidFormat(format!("无法读取图片尺寸：{}", e)))
    }

    /// 校验像素数量是否超过配置上限。
    fn validate_pixel_limits(
        config: &ImageConfig,
        width: u32,
        height: u32,
    ) -> Result<(), ImageError> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ImageError::ResourceLimit("图片像素数溢出".to_string()))?;

        if pixels > config.max_decoded_pixels {
            return Err(ImageError::ResourceLimit(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, config.max_decoded_pixels
            )));
        }

        Ok(())
    }

    /// 载荷超过阈值时重编码为 JPEG，并以重编码结果为准重新解码。
    ///
    /// JPEG 不含透明通道，重编码后的图像 alpha 恒为 255。
    fn maybe_reencode(
        image: DynamicImage,
        payload_len: u64,
        config: &ImageConfig,
    ) -> Result<DynamicImage, ImageError> {
        let Some(quality) = config.reencode_quality else {
            return Ok(image);
        };

        if payload_len <= config.reencode_threshold_bytes {
            return Ok(image);
        }

        let mut encoded = Vec::new();
        DynamicImage::ImageRgb8(image.to_rgb8())
            .write_with_encoder(JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100)))
            .map_err(|e| ImageError::Decode(format!("JPEG 重编码失败：{}", e)))?;

        log::info!(
            "🗜️ 重编码为 JPEG：{} bytes -> {} bytes（quality={}）",
            payload_len,
            encoded.len(),
            quality
        );

        image::load_from_memory_with_format(&encoded, ImageFormat::Jpeg)
            .map_err(|e| ImageError::Decode(format!("重编码结果解码失败：{}", e)))
    }

    /// 按配置执行自适应降采样。
    fn maybe_downscale_for_clipboard(
        image: DynamicImage,
        config: &ImageConfig,
    ) -> Result<DynamicImage, ImageError> {
        if !config.adaptive_resize {
            return Ok(image);
        }

        let (width, height) = image.dimensions();
        let source_pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| ImageError::ResourceLimit("图片像素数溢出".to_string()))?;

        let over_dimension = width > config.clipboard_max_dimension
            || height > config.clipboard_max_dimension;
        let over_pixels = source_pixels > config.clipboard_target_pixels;

        if !over_dimension && !over_pixels {
            return Ok(image);
        }

        let dimension_scale = (config.clipboard_max_dimension as f64 / width as f64)
            .min(config.clipboard_max_dimension as f64 / height as f64);
        let pixel_scale = (config.clipboard_target_pixels as f64 / source_pixels as f64).sqrt();

        let scale = dimension_scale.min(pixel_scale).min(1.0);

        if scale <= 0.0 {
            return Err(ImageError::ResourceLimit("缩放比例计算异常".to_string()));
        }

        let target_width = ((width as f64 * scale).floor() as u32).max(1);
        let target_height = ((height as f64 * scale).floor() as u32).max(1);

        log::info!(
            "🧩 自适应降采样：{}x{} -> {}x{}（filter={:?}）",
            width,
            height,
            target_width,
            target_height,
            config.resize_filter
        );

        let filter = config.resize_filter;
        match Self::resize_with_fast_image_resize(&image, target_width, target_height, filter) {
            Ok(resized) => Ok(resized),
            Err(err) => {
                log::warn!("⚠️ fast_image_resize 降采样失败，回退 image::resize_exact：{}", err);
                Ok(image.resize_exact(target_width, target_height, config.resize_filter))
            }
        }
    }

    fn resize_with_fast_image_resize(
        image: &DynamicImage,
        target_width: u32,
        target_height: u32,
        filter: image::imageops::FilterType,
    ) -> Result<DynamicImage, ImageError> {
        let src = image.to_rgba8();
        let (src_width, src_height) = src.dimensions();

        let src_image = fr::images::Image::from_vec_u8(
            src_width,
            src_height,
            src.into_raw(),
            fr::PixelType::U8x4,
        )
        .map_err(|e| ImageError::Decode(format!("构建源图像缓冲失败：{}", e)))?;

        let mut dst_image =
            fr::images::Image::new(target_width, target_height, fr::PixelType::U8x4);

        let mut resizer = fr::Resizer::new();
        let options = fr::ResizeOptions::new()
            .resize_alg(fr::ResizeAlg::Convolution(Self::to_fast_filter(filter)));

        resizer
            .resize(&src_image, &mut dst_image, Some(&options))
            .map_err(|e| ImageError::Decode(format!("fast_image_resize 执行失败：{}", e)))?;

        let rgba = ImageBuffer::<Rgba<u8>, Vec<u8>>::from_raw(
            target_width,
            target_height,
            dst_image.into_vec(),
        )
        .ok_or_else(|| ImageError::Decode("fast_image_resize 输出缓冲长度异常".to_string()))?;

        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn to_fast_filter(filter: image::imageops::FilterType) -> fr::FilterType {
        match filter {
            image::imageops::FilterType::Nearest => fr::FilterType::Box,
            image::imageops::FilterType::Triangle => fr::FilterType::Bilinear,
            image::imageops::FilterType::CatmullRom => fr::FilterType::CatmullRom,
            image::imageops::FilterType::Gaussian => fr::FilterType::Mitchell,
            image::imageops::FilterType::Lanczos3 => fr::FilterType::Lanczos3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, ((x + y) % 255) as u8, 200])
        });

        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn raw(bytes: Vec<u8>) -> RawImageData {
        RawImageData {
            bytes,
            source_hint: "test",
        }
    }

    #[test]
    fn small_png_decodes_to_identical_rgba() {
        let png = create_png_bytes(64, 48);
        let expected = image::load_from_memory(&png).expect("decode").to_rgba8().into_raw();

        let config = ImageConfig::default();
        let prepared = ImageHandler::decode_and_prepare_for_clipboard(raw(png), &config)
            .expect("decode pipeline should succeed");

        assert_eq!((prepared.width, prepared.height), (64, 48));
        assert_eq!(prepared.bytes, expected);
    }

    #[test]
    fn html_payload_is_rejected_as_invalid_format() {
        let html = b"<!DOCTYPE html><html><body>404</body></html>".to_vec();

        let result =
            ImageHandler::decode_and_prepare_for_clipboard(raw(html), &ImageConfig::default());

        assert!(matches!(result, Err(ImageError::InvalidFormat(_))));
    }

    #[test]
    fn rejects_too_many_pixels() {
        let mut config = ImageConfig::default();
        config.max_decoded_pixels = 10_000;

        let png = create_png_bytes(200, 200);
        let result = ImageHandler::decode_and_prepare_for_clipboard(raw(png), &config);

        assert!(matches!(result, Err(ImageError::ResourceLimit(_))));
    }

    #[test]
    fn adaptive_resize_downscales_large_image() {
        let mut config = ImageConfig::default();
        config.adaptive_resize = true;
        config.clipboard_max_dimension = 256;

        let png = create_png_bytes(1024, 512);
        let prepared = ImageHandler::decode_and_prepare_for_clipboard(raw(png), &config)
            .expect("decode pipeline should succeed");

        assert_eq!((prepared.width, prepared.height), (256, 128));
        assert_eq!(prepared.bytes.len(), prepared.width * prepared.height * 4);
    }

    #[test]
    fn default_config_keeps_wide_image_pixels_intact() {
        let png = create_png_bytes(3000, 200);
        let expected = image::load_from_memory(&png).expect("decode").to_rgba8().into_raw();

        let config = ImageConfig::default();
        let prepared = ImageHandler::decode_and_prepare_for_clipboard(raw(png), &config)
            .expect("decode pipeline should succeed");

        assert_eq!((prepared.width, prepared.height), (3000, 200));
        assert_eq!(prepared.bytes, expected);
    }

    #[test]
    fn reencode_applies_only_above_threshold() {
        let png = create_png_bytes(32, 32);
        let mut config = ImageConfig::default();
        config.reencode_quality = Some(80);
        config.reencode_threshold_bytes = u64::MAX;

        let untouched = ImageHandler::decode_and_prepare_for_clipboard(raw(png.clone()), &config)
            .expect("decode pipeline should succeed");
        assert!(untouched.bytes.chunks(4).all(|px| px[3] == 200));

        config.reencode_threshold_bytes = 0;
        let reencoded = ImageHandler::decode_and_prepare_for_clipboard(raw(png), &config)
            .expect("decode pipeline should succeed");
        assert_eq!((reencoded.width, reencoded.height), (32, 32));
        assert!(reencoded.bytes.chunks(4).all(|px| px[3] == 255));
    }
}

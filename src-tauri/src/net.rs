//! # 网络辅助模块
//!
//! ## 设计思路
//!
//! 下载与复制两条链路都需要“解析远程地址 → 发起 GET → 映射错误”，
//! 公共部分集中在此，避免两处各写一套 URL 校验与日志脱敏。
//!
//! ## 实现思路
//!
//! - 仅接受 `http` / `https`，其他协议在发请求前直接拒绝。
//! - 不设置整体超时：沿用 reqwest 默认行为，由底层网络栈决定。
//! - 日志中的 URL 统一去掉 query 与 fragment，避免签名参数落盘。

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};

const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
);
const IMAGE_ACCEPT: &str = "image/avif,image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";

/// 远程地址被拒绝的原因。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UrlRejection {
    #[error("URL 格式错误：{0}")]
    Malformed(String),

    #[error("仅支持 HTTP/HTTPS：{0}")]
    UnsupportedScheme(String),

    #[error("URL 缺少主机地址")]
    MissingHost,
}

/// 构建共享 HTTP 客户端（浏览器 UA + 图片 Accept）。
pub fn build_http_client() -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(ACCEPT, HeaderValue::from_static(IMAGE_ACCEPT));

    reqwest::Client::builder().default_headers(headers).build()
}

/// 解析并校验远程图片地址。
pub fn parse_remote_url(url: &str) -> Result<reqwest::Url, UrlRejection> {
    let parsed = reqwest::Url::parse(url.trim())
        .map_err(|e| UrlRejection::Malformed(e.to_string()))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(UrlRejection::UnsupportedScheme(parsed.scheme().to_string()));
    }

    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(UrlRejection::MissingHost);
    }

    Ok(parsed)
}

/// 日志用 URL：保留协议、主机、端口与路径。
pub fn redact_url_for_log(url: &str) -> String {
    let Ok(parsed) = reqwest::Url::parse(url) else {
        return "<invalid-url>".to_string();
    };

    let host = parsed.host_str().unwrap_or("<unknown-host>");
    let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();

    format!("{}://{}{}{}", parsed.scheme(), host, port, parsed.path())
}

/// 将 reqwest 错误转成不含敏感参数的可读文案。
pub fn describe_request_error(error: &reqwest::Error, url: &str) -> String {
    let message = error.to_string().replace(url, &redact_url_for_log(url));

    if error.is_timeout() {
        format!("请求超时：{}", message)
    } else if error.is_connect() {
        format!("无法连接：{}", message)
    } else {
        format!("请求失败：{}", message)
    }
}

/// 常见 HTTP 状态码本地化文案。
pub fn status_message(code: u16) -> &'static str {
    match code {
        404 => "未找到",
        403 => "访问被拒绝",
        401 => "未授权",
        500..=599 => "服务器错误",
        _ => "请求失败",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_remote_url_accepts_http_and_https() {
        assert!(parse_remote_url("https://x/a.png").is_ok());
        assert!(parse_remote_url("  http://example.com/img?sig=1 ").is_ok());
    }

    #[test]
    fn parse_remote_url_rejects_other_schemes() {
        assert_eq!(
            parse_remote_url("file:///etc/passwd"),
            Err(UrlRejection::UnsupportedScheme("file".to_string()))
        );
        assert!(matches!(
            parse_remote_url("not a url"),
            Err(UrlRejection::Malformed(_))
        ));
    }

    #[test]
    fn redact_url_for_log_removes_query_and_fragment() {
        let redacted =
            redact_url_for_log("https://example.com:8443/path/img.png?token=abc123#hash");

        assert_eq!(redacted, "https://example.com:8443/path/img.png");
    }

    #[test]
    fn status_message_maps_common_codes() {
        assert_eq!(status_message(404), "未找到");
        assert_eq!(status_message(503), "服务器错误");
        assert_eq!(status_message(418), "请求失败");
    }
}

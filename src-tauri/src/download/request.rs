//! # 请求与结果模型
//!
//! 字段名按前端约定使用 camelCase；为兼容旧版前端，
//! `imageUrl` / `prompt` 也可作为 `url` / `nameHint` 的别名。

use serde::{Deserialize, Serialize};

/// 单张下载请求。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadRequest {
    #[serde(alias = "imageUrl")]
    pub url: String,
    #[serde(alias = "prompt", default)]
    pub name_hint: String,
    #[serde(default)]
    pub request_id: Option<String>,
}

impl DownloadRequest {
    pub fn new(url: impl Into<String>, name_hint: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            name_hint: name_hint.into(),
            request_id: None,
        }
    }
}

/// 单张下载结果，每个请求只产生一次。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum DownloadResult {
    Success { path: String },
    Failure { message: String },
}

impl DownloadResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// 批量下载中单项失败的明细。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadFailure {
    pub index: usize,
    pub url: String,
    pub name_hint: String,
    pub message: String,
}

/// 批量下载汇总：成功路径（按请求顺序）+ 逐项失败明细。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchDownloadReport {
    pub request_id: String,
    pub paths: Vec<String>,
    pub failures: Vec<DownloadFailure>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_legacy_field_names() {
        let request: DownloadRequest = serde_json::from_value(serde_json::json!({
            "imageUrl": "https://x/a.png",
            "prompt": "a sunset over hills"
        }))
        .expect("deserialize legacy request");

        assert_eq!(request, DownloadRequest::new("https://x/a.png", "a sunset over hills"));
    }

    #[test]
    fn request_accepts_camel_case_fields() {
        let request: DownloadRequest = serde_json::from_value(serde_json::json!({
            "url": "https://x/a.png",
            "nameHint": "cat",
            "requestId": "ui-3"
        }))
        .expect("deserialize request");

        assert_eq!(request.name_hint, "cat");
        assert_eq!(request.request_id.as_deref(), Some("ui-3"));
    }

    #[test]
    fn result_serializes_with_status_tag() {
        let ok = serde_json::to_value(DownloadResult::Success { path: "/d/a.png".to_string() })
            .expect("serialize success");
        assert_eq!(ok, serde_json::json!({ "status": "success", "path": "/d/a.png" }));

        let failed = serde_json::to_value(DownloadResult::Failure { message: "boom".to_string() })
            .expect("serialize failure");
        assert_eq!(failed, serde_json::json!({ "status": "failure", "message": "boom" }));
    }
}

//! 宿主桥设置模块
//!
//! # 设计思路
//!
//! 设置以 JSON 形式保存在应用数据目录下的 `settings.json`，
//! 启动时加载，修改时先校验再落盘，并立即作用到运行中的下载服务与图片处理器。
//!
//! # 实现思路
//!
//! - 文件缺失或内容损坏时回退到默认值并记录警告，不阻止应用启动。
//! - 字段缺省时使用默认值（`#[serde(default)]`），旧版本文件可直接读取。
//! - 进行中的请求使用各自的配置快照，新设置只影响之后的请求。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tauri::{AppHandle, Manager, Runtime, State, Wry};

use crate::download::{
    DEFAULT_FILE_EXTENSION, DEFAULT_NAME_HINT_WORDS, DownloadConfig, DownloadService,
};
use crate::error::AppError;
use crate::image_handler::{ImageHandler, ImagePerformanceProfile};
use crate::storage;

const SETTINGS_FILE_NAME: &str = "settings.json";
const MAX_NAME_HINT_WORDS: usize = 16;
const MAX_EXTENSION_LEN: usize = 8;

/// 用户可调整的宿主桥设置。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeSettings {
    /// 自定义下载目录，`None` 表示使用系统下载目录。
    pub download_dir: Option<String>,
    pub name_hint_words: usize,
    pub file_extension: String,
    /// 复制性能档位：`quality` / `balanced` / `speed`。
    pub copy_profile: String,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            download_dir: None,
            name_hint_words: DEFAULT_NAME_HINT_WORDS,
            file_extension: DEFAULT_FILE_EXTENSION.to_string(),
            copy_profile: ImagePerformanceProfile::Quality.as_str().to_string(),
        }
    }
}

impl BridgeSettings {
    /// 去掉首尾空白与扩展名前导点，空目录视为未设置。
    pub fn normalized(mut self) -> Self {
        self.download_dir = self
            .download_dir
            .map(|dir| dir.trim().to_string())
            .filter(|dir| !dir.is_empty());
        self.file_extension = self
            .file_extension
            .trim()
            .trim_start_matches('.')
            .to_ascii_lowercase();
        self.copy_profile = self.copy_profile.trim().to_ascii_lowercase();
        self
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(1..=MAX_NAME_HINT_WORDS).contains(&self.name_hint_words) {
            return Err(AppError::Settings(format!(
                "名称词数必须在 1~{} 之间",
                MAX_NAME_HINT_WORDS
            )));
        }

        if self.file_extension.is_empty()
            || self.file_extension.len() > MAX_EXTENSION_LEN
            || !self.file_extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(AppError::Settings(format!(
                "文件扩展名无效：'{}'",
                self.file_extension
            )));
        }

        self.profile()?;
        Ok(())
    }

    pub fn profile(&self) -> Result<ImagePerformanceProfile, AppError> {
        self.copy_profile
            .parse::<ImagePerformanceProfile>()
            .map_err(|e| AppError::Settings(e.to_string()))
    }

    /// 以给定目录生成下载配置。
    pub fn download_config(&self, target_dir: PathBuf) -> DownloadConfig {
        DownloadConfig {
            target_dir,
            name_hint_words: self.name_hint_words,
            file_extension: self.file_extension.clone(),
        }
    }
}

fn settings_file_path<R: Runtime>(app: &AppHandle<R>) -> Result<PathBuf, AppError> {
    let app_data_dir = app
        .path()
        .app_data_dir()
        .map_err(|e| AppError::Storage(format!("获取应用数据目录失败: {}", e)))?;

    fs::create_dir_all(&app_data_dir)
        .map_err(|e| AppError::Storage(format!("创建应用数据目录失败: {}", e)))?;

    Ok(app_data_dir.join(SETTINGS_FILE_NAME))
}

/// 读取设置文件；缺失或无效时返回默认设置。
pub fn read_settings_file(path: &Path) -> BridgeSettings {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return BridgeSettings::default(),
        Err(e) => {
            log::warn!("⚠️ 读取设置文件失败，使用默认设置 - {}: {}", path.display(), e);
            return BridgeSettings::default();
        }
    };

    let settings = match serde_json::from_str::<BridgeSettings>(&content) {
        Ok(settings) => settings.normalized(),
        Err(e) => {
            log::warn!("⚠️ 解析设置文件失败，使用默认设置 - {}: {}", path.display(), e);
            return BridgeSettings::default();
        }
    };

    match settings.validate() {
        Ok(()) => settings,
        Err(e) => {
            log::warn!("⚠️ 设置文件内容无效，使用默认设置: {}", e);
            BridgeSettings::default()
        }
    }
}

pub fn write_settings_file(path: &Path, settings: &BridgeSettings) -> Result<(), AppError> {
    let content = serde_json::to_string_pretty(settings)
        .map_err(|e| AppError::Settings(format!("序列化设置失败: {}", e)))?;
    fs::write(path, content)?;
    Ok(())
}

/// 启动时加载设置。
pub fn load_settings<R: Runtime>(app: &AppHandle<R>) -> BridgeSettings {
    match settings_file_path(app) {
        Ok(path) => read_settings_file(&path),
        Err(e) => {
            log::warn!("⚠️ 无法定位设置文件，使用默认设置: {}", e);
            BridgeSettings::default()
        }
    }
}

/// 先保存再作用到运行中的服务；保存失败时服务保持原设置。
pub fn commit_settings(
    path: &Path,
    settings: &BridgeSettings,
    target_dir: PathBuf,
    downloads: &DownloadService,
    images: &ImageHandler,
) -> Result<(), AppError> {
    write_settings_file(path, settings)?;
    downloads.replace_config(settings.download_config(target_dir))?;
    images.set_performance_profile(settings.profile()?)?;
    Ok(())
}

#[tauri::command]
pub fn get_bridge_settings(app: AppHandle<Wry>) -> BridgeSettings {
    load_settings(&app)
}

/// 校验、应用并保存设置，返回规范化后的结果。
#[tauri::command]
pub fn set_bridge_settings(
    app: AppHandle<Wry>,
    downloads: State<'_, DownloadService>,
    images: State<'_, ImageHandler>,
    settings: BridgeSettings,
) -> Result<BridgeSettings, AppError> {
    let settings = settings.normalized();
    settings.validate()?;

    let target_dir = storage::resolve_downloads_dir(&app, settings.download_dir.as_deref())?;
    commit_settings(&settings_file_path(&app)?, &settings, target_dir, &downloads, &images)?;

    log::info!("💾 设置已保存：{:?}", settings);
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_handler::ImageConfig;

    fn unique_temp_file(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!("image-batch-studio-settings-{tag}-{nanos}.json"))
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let settings: BridgeSettings =
            serde_json::from_str(r#"{ "copyProfile": "speed" }"#).expect("parse partial settings");

        assert_eq!(settings.name_hint_words, 3);
        assert_eq!(settings.file_extension, "png");
        assert_eq!(settings.profile().expect("profile"), ImagePerformanceProfile::Speed);
    }

    #[test]
    fn normalization_trims_extension_and_blank_dir() {
        let settings = BridgeSettings {
            download_dir: Some("   ".to_string()),
            file_extension: " .PNG ".to_string(),
            ..BridgeSettings::default()
        }
        .normalized();

        assert_eq!(settings.download_dir, None);
        assert_eq!(settings.file_extension, "png");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let zero_words = BridgeSettings {
            name_hint_words: 0,
            ..BridgeSettings::default()
        };
        assert!(matches!(zero_words.validate(), Err(AppError::Settings(_))));

        let bad_extension = BridgeSettings {
            file_extension: "p/ng".to_string(),
            ..BridgeSettings::default()
        };
        assert!(matches!(bad_extension.validate(), Err(AppError::Settings(_))));

        let bad_profile = BridgeSettings {
            copy_profile: "ultra".to_string(),
            ..BridgeSettings::default()
        };
        assert!(matches!(bad_profile.validate(), Err(AppError::Settings(_))));
    }

    #[test]
    fn settings_file_round_trip_and_corruption_fallback() {
        let path = unique_temp_file("roundtrip");
        let settings = BridgeSettings {
            download_dir: Some("/tmp/generated".to_string()),
            name_hint_words: 6,
            ..BridgeSettings::default()
        };

        write_settings_file(&path, &settings).expect("write settings");
        assert_eq!(read_settings_file(&path), settings);

        fs::write(&path, "{ not json").expect("corrupt settings");
        assert_eq!(read_settings_file(&path), BridgeSettings::default());

        let _ = fs::remove_file(&path);
        assert_eq!(read_settings_file(&path), BridgeSettings::default());
    }

    #[test]
    fn failed_save_leaves_live_services_untouched() {
        let live_dir = std::env::temp_dir().join("image-batch-studio-live");
        let downloads =
            DownloadService::new(DownloadConfig::new(&live_dir)).expect("download service");
        let images = ImageHandler::new(ImageConfig::default()).expect("image handler");
        let unwritable = unique_temp_file("missing-parent").join("settings.json");
        let next = BridgeSettings {
            name_hint_words: 5,
            copy_profile: "speed".to_string(),
            ..BridgeSettings::default()
        };

        let target = PathBuf::from("/elsewhere");
        let result = commit_settings(&unwritable, &next, target, &downloads, &images);

        assert!(result.is_err());
        let config = downloads.config_snapshot().expect("download snapshot");
        assert_eq!(config.target_dir, live_dir);
        assert_eq!(config.name_hint_words, DEFAULT_NAME_HINT_WORDS);
        assert_eq!(
            images.get_performance_profile().expect("profile"),
            ImagePerformanceProfile::Quality
        );
    }

    #[test]
    fn successful_commit_saves_then_applies() {
        let path = unique_temp_file("commit");
        let downloads =
            DownloadService::new(DownloadConfig::new("/before")).expect("download service");
        let images = ImageHandler::new(ImageConfig::default()).expect("image handler");
        let next = BridgeSettings {
            name_hint_words: 5,
            copy_profile: "speed".to_string(),
            ..BridgeSettings::default()
        };

        commit_settings(&path, &next, PathBuf::from("/after"), &downloads, &images)
            .expect("commit");

        assert_eq!(read_settings_file(&path), next);
        let config = downloads.config_snapshot().expect("download snapshot");
        assert_eq!(config.target_dir, PathBuf::from("/after"));
        assert_eq!(config.name_hint_words, 5);
        assert_eq!(
            images.get_performance_profile().expect("profile"),
            ImagePerformanceProfile::Speed
        );

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn download_config_carries_naming_rules() {
        let settings = BridgeSettings {
            name_hint_words: 2,
            file_extension: "webp".to_string(),
            ..BridgeSettings::default()
        };

        let config = settings.download_config(PathBuf::from("/downloads"));
        assert_eq!(
            config.destination_for("a sunset over hills"),
            PathBuf::from("/downloads").join("asunset.webp")
        );
    }
}

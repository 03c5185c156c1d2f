// 防止在 Windows 发布版本中显示额外的控制台窗口，不要删除！
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

//! # Image Batch Studio 应用入口
//!
//! 本文件仅负责应用初始化、状态注入与命令注册。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use image_batch_studio::context_menu::{self, ContextMenuTargets};
use image_batch_studio::download::{self, DownloadService};
use image_batch_studio::image_handler::{self, ImageConfig, ImageHandler};
use image_batch_studio::{settings, storage};
use tauri::Manager;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    tauri::Builder::default()
        .setup(|app| {
            log::info!("setup: begin");
            let handle = app.handle().clone();

            let bridge_settings = settings::load_settings(&handle);
            log::info!("setup: settings loaded - {:?}", bridge_settings);

            match storage::resolve_downloads_dir(&handle, bridge_settings.download_dir.as_deref())
                .map_err(|err| err.to_string())
                .and_then(|dir| {
                    DownloadService::new(bridge_settings.download_config(dir))
                        .map_err(|err| err.to_string())
                }) {
                Ok(service) => {
                    app.manage(service);
                    log::info!("setup: download service managed");
                }
                Err(err) => {
                    log::error!("setup: 下载服务初始化失败，应用将以受限模式运行: {err}");
                }
            }

            let mut image_config = ImageConfig::default();
            match bridge_settings.profile() {
                Ok(profile) => image_config.apply_performance_profile(profile),
                Err(err) => log::warn!("setup: 复制档位无效，使用默认档位: {err}"),
            }
            match ImageHandler::new(image_config) {
                Ok(handler) => {
                    app.manage(handler);
                    log::info!("setup: image handler managed");
                }
                Err(err) => {
                    log::error!("setup: 图片服务初始化失败，应用将以受限模式运行: {err}");
                }
            }

            app.manage(ContextMenuTargets::default());
            log::info!("setup: complete");

            Ok(())
        })
        // 右键菜单选择
        .on_menu_event(|app, event| context_menu::handle_menu_event(app, event.id.as_ref()))
        // 注册所有 Tauri 命令
        .invoke_handler(tauri::generate_handler![
            // 下载
            download::commands::download_image,
            download::commands::download_images,
            // 复制
            image_handler::commands::copy_image,
            context_menu::show_context_menu,
            // 设置与下载目录
            settings::get_bridge_settings,
            settings::set_bridge_settings,
            storage::get_downloads_dir_info,
        ])
        .run(tauri::generate_context!())
        .expect("运行 Tauri 应用时出错");
}

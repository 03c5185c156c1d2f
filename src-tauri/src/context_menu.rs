//! 图片右键菜单模块
//!
//! # 设计思路
//!
//! 前端在图片上右键时调用 `show_context_menu(url)`，宿主弹出只有一项
//! “复制图片”的原生菜单。菜单项 id 每次都重新生成，并记住对应的图片地址；
//! 选中后在后台执行复制流程（与 `copy_image` 相同，结果通过事件告知前端）。
//!
//! # 实现思路
//!
//! - 同一时刻只有一个待处理菜单，新菜单会替换旧的登记。
//! - 菜单事件在 `Builder::on_menu_event` 中统一分发，按 id 前缀识别。
//! - 复制在 `tauri::async_runtime::spawn` 中执行，不阻塞 UI 线程。

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use tauri::menu::{Menu, MenuItem};
use tauri::{AppHandle, Manager, State, Window, Wry};

use crate::error::AppError;
use crate::image_handler::{ClipboardImageRequest, ImageHandler};

const COPY_ITEM_PREFIX: &str = "copy-image:";
const COPY_ITEM_LABEL: &str = "复制图片";

/// 待处理的右键菜单目标（菜单项 id → 图片地址）。
#[derive(Debug, Default)]
pub struct ContextMenuTargets {
    pending: Mutex<Option<(String, String)>>,
    seq: AtomicU64,
}

impl ContextMenuTargets {
    /// 登记新的菜单目标，返回菜单项 id。之前的登记被替换。
    pub fn register(&self, url: &str) -> Result<String, AppError> {
        let id = format!("{}{}", COPY_ITEM_PREFIX, self.seq.fetch_add(1, Ordering::Relaxed) + 1);
        let mut pending = self
            .pending
            .lock()
            .map_err(|_| AppError::Menu("菜单状态锁已中毒".to_string()))?;
        *pending = Some((id.clone(), url.to_string()));
        Ok(id)
    }

    /// 取出与菜单项 id 对应的图片地址；id 不匹配时返回 `None` 且保留当前登记。
    pub fn take(&self, menu_id: &str) -> Option<String> {
        let mut pending = self.pending.lock().ok()?;
        if !pending.as_ref().is_some_and(|(id, _)| id == menu_id) {
            return None;
        }
        pending.take().map(|(_, url)| url)
    }
}

/// 在当前光标位置弹出“复制图片”菜单。
#[tauri::command]
pub fn show_context_menu(
    window: Window<Wry>,
    app: AppHandle<Wry>,
    targets: State<'_, ContextMenuTargets>,
    url: String,
) -> Result<(), AppError> {
    let url = url.trim();
    if url.is_empty() {
        return Err(AppError::Menu("图片地址为空".to_string()));
    }

    let id = targets.register(url)?;
    let item = MenuItem::with_id(&app, id.as_str(), COPY_ITEM_LABEL, true, None::<&str>)
        .map_err(|e| AppError::Menu(format!("创建菜单项失败: {}", e)))?;
    let menu = Menu::with_items(&app, &[&item])
        .map_err(|e| AppError::Menu(format!("创建菜单失败: {}", e)))?;

    window
        .popup_menu(&menu)
        .map_err(|e| AppError::Menu(format!("弹出菜单失败: {}", e)))?;

    log::debug!("🖱️ 已弹出右键菜单 - {}", id);
    Ok(())
}

/// 处理原生菜单事件；非本模块的菜单项直接忽略。
pub fn handle_menu_event(app: &AppHandle<Wry>, menu_id: &str) {
    if !menu_id.starts_with(COPY_ITEM_PREFIX) {
        return;
    }

    let Some(url) = app
        .try_state::<ContextMenuTargets>()
        .and_then(|targets| targets.take(menu_id))
    else {
        log::warn!("⚠️ 菜单项已过期 - {}", menu_id);
        return;
    };

    let app = app.clone();
    tauri::async_runtime::spawn(async move {
        let Some(handler) = app.try_state::<ImageHandler>() else {
            log::error!("❌ 图片服务未初始化，无法复制");
            return;
        };
        handler
            .copy_and_report(ClipboardImageRequest::new(url), &app)
            .await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selected_item_yields_registered_url_once() {
        let targets = ContextMenuTargets::default();
        let id = targets.register("https://cdn.example.com/a.png").expect("register");

        assert!(id.starts_with(COPY_ITEM_PREFIX));
        assert_eq!(targets.take(&id).as_deref(), Some("https://cdn.example.com/a.png"));
        assert_eq!(targets.take(&id), None);
    }

    #[test]
    fn newer_menu_replaces_older_target() {
        let targets = ContextMenuTargets::default();
        let old_id = targets.register("https://cdn.example.com/old.png").expect("register old");
        let new_id = targets.register("https://cdn.example.com/new.png").expect("register new");

        assert_ne!(old_id, new_id);
        assert_eq!(targets.take(&old_id), None);
        assert_eq!(targets.take(&new_id).as_deref(), Some("https://cdn.example.com/new.png"));
    }
}

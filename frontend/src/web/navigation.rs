//! 浏览器导航
//!
//! 整页跳转（`location.href`）与当前地址读取。应用内的无刷新切换见 `router`。

use coursedesk_shared::lifecycle::Navigator;

/// 当前路径（不含查询串）
pub fn current_path() -> String {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .unwrap_or_else(|| "/".to_string())
}

/// 当前查询串（含前导 `?`，可能为空）
pub fn current_query() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default()
}

/// 当前路径加查询串，用作登录后的返回目标
pub fn current_location() -> String {
    format!("{}{}", current_path(), current_query())
}

/// 通过 `location.href` 整页跳转
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn hard_redirect(&self, path: &str) {
        log::info!("hard redirect to {}", path);
        let Some(window) = web_sys::window() else {
            log::error!("无法获取 window 对象，跳转失败");
            return;
        };
        if let Err(e) = window.location().set_href(path) {
            log::error!("跳转到 {} 失败: {:?}", path, e);
        }
    }
}

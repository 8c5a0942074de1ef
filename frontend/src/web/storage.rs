//! LocalStorage 封装模块
//!
//! 使用 `web_sys::Storage` 实现共享层的 `KeyValueStore` 端口。

use coursedesk_shared::storage::KeyValueStore;

/// 浏览器 LocalStorage
///
/// 无状态的句柄，每次操作都重新取 `window.localStorage`，可随意复制进信号与闭包。
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
    /// 获取 LocalStorage 实例
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok()?
    }
}

impl KeyValueStore for BrowserStorage {
    /// # 返回
    /// - `Some(String)` 如果键存在且有值
    /// - `None` 如果键不存在或发生错误（例如隐私模式下存储不可用）
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set(&self, key: &str, value: &str) -> bool {
        Self::storage()
            .and_then(|s| s.set_item(key, value).ok())
            .is_some()
    }

    fn delete(&self, key: &str) -> bool {
        Self::storage()
            .and_then(|s| s.remove_item(key).ok())
            .is_some()
    }
}

//! 持久化端口
//!
//! `KeyValueStore` 抽象了浏览器 LocalStorage 的同步键值接口，
//! 购物车与凭据都只通过它读写持久状态，从而可以在宿主环境中用 `MemoryStore` 测试。

use crate::{AuthUser, STORAGE_TOKEN_KEY, STORAGE_USER_KEY, SessionToken};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// 同步键值存储
///
/// 签名与 LocalStorage 保持一致：读取失败视为不存在，写入/删除返回是否成功。
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> bool;
    fn delete(&self, key: &str) -> bool;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Rc<S> {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> bool {
        (**self).set(key, value)
    }

    fn delete(&self, key: &str) -> bool {
        (**self).delete(key)
    }
}

/// 内存存储
///
/// 克隆得到的是同一份数据的句柄，行为上等价于全局唯一的 LocalStorage。
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> bool {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        true
    }

    fn delete(&self, key: &str) -> bool {
        self.entries.borrow_mut().remove(key);
        true
    }
}

// =========================================================
// 凭据存取 (Stored Credential)
// =========================================================

/// 已存储凭据的类型化访问
///
/// 全局单槽位：一个原始字符串形式的 Token，一个 JSON 形式的用户记录。
#[derive(Debug, Clone)]
pub struct CredentialStore<S: KeyValueStore> {
    storage: S,
}

impl<S: KeyValueStore> CredentialStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn token(&self) -> Option<SessionToken> {
        self.storage
            .get(STORAGE_TOKEN_KEY)
            .filter(|t| !t.is_empty())
            .map(SessionToken)
    }

    /// 读取用户记录，损坏的记录视为不存在
    pub fn user(&self) -> Option<AuthUser> {
        let raw = self.storage.get(STORAGE_USER_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                log::warn!("stored user record is unreadable, ignoring it: {}", e);
                None
            }
        }
    }

    pub fn store(&self, token: &SessionToken, user: &AuthUser) -> bool {
        let token_ok = self.storage.set(STORAGE_TOKEN_KEY, token.as_str());
        token_ok && self.store_user(user)
    }

    pub fn store_user(&self, user: &AuthUser) -> bool {
        match serde_json::to_string(user) {
            Ok(raw) => self.storage.set(STORAGE_USER_KEY, &raw),
            Err(e) => {
                log::error!("failed to serialize user record: {}", e);
                false
            }
        }
    }

    /// 删除 Token 与用户记录，返回之前是否存在 Token
    pub fn clear(&self) -> bool {
        let had_token = self.token().is_some();
        self.storage.delete(STORAGE_TOKEN_KEY);
        self.storage.delete(STORAGE_USER_KEY);
        had_token
    }
}

//! 购物车状态模块
//!
//! `CartState` 是纯 reducer：所有变更都经过 `CartAction`，
//! 派生字段（数量、总价）在同一次变更中同步重算，外部无法单独设置。
//! `CartStore` 在其上注入持久化端口，只持久化条目与派生字段，面板开关状态不落盘。

use crate::protocol::InitiateCheckoutRequest;
use crate::storage::KeyValueStore;
use crate::{CourseId, CourseSummary, Price, STORAGE_CART_KEY, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 购物车条目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    #[serde(flatten)]
    pub course: CourseSummary,
    pub added_at: Timestamp,
}

impl CartItem {
    pub fn id(&self) -> CourseId {
        self.course.id
    }

    pub fn price(&self) -> Price {
        self.course.price
    }
}

/// 购物车变更动作
#[derive(Debug, Clone, PartialEq)]
pub enum CartAction {
    /// 加入课程；已存在相同 id 时为空操作
    Add {
        course: CourseSummary,
        added_at: Timestamp,
    },
    /// 移除课程；不存在时为空操作
    Remove(CourseId),
    /// 清空条目并关闭面板
    Clear,
    Open,
    Close,
    Toggle,
}

/// 购物车状态
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartState {
    items: Vec<CartItem>,
    total_items: usize,
    total_amount: Price,
    is_open: bool,
}

impl CartState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 纯 reducer：消费旧状态，返回新状态
    pub fn reduce(mut self, action: CartAction) -> Self {
        self.apply(action);
        self
    }

    /// 原地应用动作
    ///
    /// # 返回
    /// 需要持久化时返回 `true`（条目集合可能发生了变化）
    pub fn apply(&mut self, action: CartAction) -> bool {
        match action {
            CartAction::Add { course, added_at } => {
                if self.is_in_cart(course.id) {
                    return false;
                }
                if self.total_amount.checked_add(course.price).is_none() {
                    log::warn!("course {} rejected: cart total would overflow", course.id);
                    return false;
                }
                self.items.push(CartItem { course, added_at });
                self.recompute();
                true
            }
            CartAction::Remove(id) => {
                let before = self.items.len();
                self.items.retain(|item| item.id() != id);
                if self.items.len() == before {
                    return false;
                }
                self.recompute();
                true
            }
            CartAction::Clear => {
                self.items.clear();
                self.recompute();
                self.is_open = false;
                true
            }
            CartAction::Open => {
                self.is_open = true;
                false
            }
            CartAction::Close => {
                self.is_open = false;
                false
            }
            CartAction::Toggle => {
                self.is_open = !self.is_open;
                false
            }
        }
    }

    // 条目在加入时已保证总额不溢出
    fn recompute(&mut self) {
        self.total_items = self.items.len();
        self.total_amount = self
            .items
            .iter()
            .fold(0, |acc: Price, item| acc.saturating_add(item.price()));
    }

    // --- Queries ---

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn total_amount(&self) -> Price {
        self.total_amount
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_in_cart(&self, id: CourseId) -> bool {
        self.items.iter().any(|item| item.id() == id)
    }

    pub fn get_item(&self, id: CourseId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// 根据当前条目构造结账请求，空购物车返回 `None`
    pub fn checkout_request(&self) -> Option<InitiateCheckoutRequest> {
        if self.items.is_empty() {
            return None;
        }
        Some(InitiateCheckoutRequest {
            course_ids: self.items.iter().map(CartItem::id).collect(),
            amount: self.total_amount,
        })
    }

    // --- Persistence mapping ---

    pub fn to_persisted(&self) -> PersistedCart {
        PersistedCart {
            items: self.items.clone(),
            total_items: self.total_items,
            total_amount: self.total_amount,
        }
    }

    /// 从持久化记录恢复
    ///
    /// 派生字段总是按条目重算，重复 id 只保留第一条，
    /// 会使总额溢出的条目被丢弃。
    pub fn from_persisted(persisted: PersistedCart) -> Self {
        let mut seen = HashSet::new();
        let mut running: Price = 0;
        let items = persisted
            .items
            .into_iter()
            .filter(|item| seen.insert(item.id()))
            .filter(|item| match running.checked_add(item.price()) {
                Some(total) => {
                    running = total;
                    true
                }
                None => {
                    log::warn!("dropping stored cart item {}: total would overflow", item.id());
                    false
                }
            })
            .collect();
        let mut state = Self {
            items,
            ..Self::default()
        };
        state.recompute();
        state
    }
}

/// 落盘格式：条目与派生字段，不含面板开关
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCart {
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_items: usize,
    #[serde(default)]
    pub total_amount: Price,
}

// =========================================================
// 带持久化的状态容器
// =========================================================

/// 购物车状态容器
///
/// 由调用方显式持有（前端放在 Context 中），而非全局单例。
#[derive(Debug, Clone)]
pub struct CartStore<S: KeyValueStore> {
    state: CartState,
    storage: S,
}

impl<S: KeyValueStore> CartStore<S> {
    /// 从存储中加载，记录缺失或损坏时得到空购物车
    pub fn load(storage: S) -> Self {
        let state = match storage.get(STORAGE_CART_KEY) {
            Some(raw) => match serde_json::from_str::<PersistedCart>(&raw) {
                Ok(persisted) => CartState::from_persisted(persisted),
                Err(e) => {
                    log::warn!("discarding unreadable cart record: {}", e);
                    CartState::default()
                }
            },
            None => CartState::default(),
        };
        Self { state, storage }
    }

    pub fn state(&self) -> &CartState {
        &self.state
    }

    /// 应用动作，条目变化时写回存储
    pub fn dispatch(&mut self, action: CartAction) {
        if self.state.apply(action) {
            self.persist();
        }
    }

    fn persist(&self) {
        match serde_json::to_string(&self.state.to_persisted()) {
            Ok(raw) => {
                if !self.storage.set(STORAGE_CART_KEY, &raw) {
                    log::warn!("cart state could not be written to storage");
                }
            }
            Err(e) => log::error!("failed to serialize cart state: {}", e),
        }
    }

    pub fn add_item(&mut self, course: CourseSummary, now: Timestamp) {
        self.dispatch(CartAction::Add {
            course,
            added_at: now,
        });
    }

    pub fn remove_item(&mut self, id: CourseId) {
        self.dispatch(CartAction::Remove(id));
    }

    pub fn clear_cart(&mut self) {
        self.dispatch(CartAction::Clear);
    }

    pub fn open(&mut self) {
        self.dispatch(CartAction::Open);
    }

    pub fn close(&mut self) {
        self.dispatch(CartAction::Close);
    }

    pub fn toggle(&mut self) {
        self.dispatch(CartAction::Toggle);
    }

    pub fn is_in_cart(&self, id: CourseId) -> bool {
        self.state.is_in_cart(id)
    }

    pub fn get_item(&self, id: CourseId) -> Option<&CartItem> {
        self.state.get_item(id)
    }
}

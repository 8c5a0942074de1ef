//! 时间类型模块
//!
//! `Timestamp` 是可序列化的毫秒时间戳，用于购物车条目的加入时间等持久化字段。
//! 获取当前时间依赖宿主环境（浏览器中为 `Date.now()`），由前端的 `web::clock` 提供。

use serde::{Deserialize, Serialize};

/// 毫秒时间戳，用于序列化传输和存储
///
/// 内部存储为 `i64`，表示自 Unix 纪元以来的毫秒数
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// 创建新的时间戳
    #[inline]
    pub const fn new(ms: i64) -> Self {
        Self(ms)
    }
}

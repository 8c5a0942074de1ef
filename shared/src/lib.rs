//! CourseDesk 共享层
//!
//! 前端与边缘函数共用的领域模型、协议定义，以及不依赖浏览器的核心状态逻辑：
//! - `storage`: 持久化端口（LocalStorage 抽象）与凭据存取
//! - `cart` / `session`: 购物车与会话的纯 reducer 状态容器
//! - `guard`: 三态授权守卫
//! - `client` / `lifecycle`: 携带 Bearer Token 的 API 客户端，以及订阅认证事件的会话生命周期

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod cart;
pub mod client;
pub mod date;
pub mod error;
pub mod guard;
pub mod lifecycle;
pub mod protocol;
pub mod session;
pub mod storage;

pub use date::Timestamp;

// =========================================================
// 常量定义 (Constants)
// =========================================================

/// Bearer Token 的存储键（原始字符串）
pub const STORAGE_TOKEN_KEY: &str = "auth_token";
/// 用户记录的存储键（JSON）
pub const STORAGE_USER_KEY: &str = "auth_user";
/// 购物车状态的存储键（JSON）
pub const STORAGE_CART_KEY: &str = "cart-storage";

pub const HEADER_AUTHORIZATION: &str = "Authorization";

/// 登录页路径，认证失败时的重定向目标
pub const LOGIN_PATH: &str = "/login";
/// 登录后返回原页面所用的查询参数名
pub const REDIRECT_QUERY_PARAM: &str = "redirect";

// =========================================================
// 领域模型 (Domain Models)
// =========================================================

/// 课程标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CourseId(pub u64);

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CourseId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// 价格，以目录 API 使用的货币单位计
pub type Price = u64;

/// 课程目录条目
///
/// 目录 API 返回的结构，也是加入购物车时 UI 传入的数据。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: CourseId,
    pub title: String,
    pub price: Price,
    pub instructor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

/// 用户角色
///
/// 序列化为 kebab-case 字符串；未知角色保留原文，交由策略判断。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Student,
    Instructor,
    Admin,
    SuperAdmin,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::Student => "student",
            Role::Instructor => "instructor",
            Role::Admin => "admin",
            Role::SuperAdmin => "super-admin",
            Role::Other(s) => s,
        }
    }
}

impl From<String> for Role {
    fn from(s: String) -> Self {
        match s.as_str() {
            "student" => Role::Student,
            "instructor" => Role::Instructor,
            "admin" => Role::Admin,
            "super-admin" => Role::SuperAdmin,
            _ => Role::Other(s),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 用户资料（角色来源）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// 已认证用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    /// 资料缺失时守卫视为未授权
    #[serde(default)]
    pub profile: Option<UserProfile>,
}

impl AuthUser {
    pub fn role(&self) -> Option<&Role> {
        self.profile.as_ref().map(|p| &p.role)
    }
}

/// 会话凭据（不透明的 Bearer Token）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub String);

impl SessionToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionToken {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

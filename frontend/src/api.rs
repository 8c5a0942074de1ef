//! API 客户端装配
//!
//! 远程 API 与支付公钥边缘函数的地址在编译期通过环境变量注入。

use crate::web::{BrowserStorage, FetchTransport};
use coursedesk_shared::client::ApiClient;
use leptos::prelude::*;

const DEFAULT_API_URL: &str = "/api";
const DEFAULT_PAYMENT_KEY_URL: &str = "/functions/payment-key";

/// 浏览器端使用的客户端类型
pub type AppClient = ApiClient<FetchTransport, BrowserStorage>;

/// 前端配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppConfig {
    /// 远程 API 根地址（`COURSEDESK_API_URL`）
    pub api_url: &'static str,
    /// 支付公钥边缘函数地址（`COURSEDESK_PAYMENT_KEY_URL`）
    pub payment_key_url: &'static str,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: option_env!("COURSEDESK_API_URL").unwrap_or(DEFAULT_API_URL),
            payment_key_url: option_env!("COURSEDESK_PAYMENT_KEY_URL")
                .unwrap_or(DEFAULT_PAYMENT_KEY_URL),
        }
    }
}

/// 从 Context 获取 API 客户端
pub fn use_api() -> AppClient {
    use_context::<AppClient>().expect("AppClient should be provided")
}

pub fn use_config() -> AppConfig {
    use_context::<AppConfig>().expect("AppConfig should be provided")
}

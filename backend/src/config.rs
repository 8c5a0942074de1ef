use crate::error::{EdgeError, EdgeResult};
use worker::Env;

// =========================================================
// 常量定义
// =========================================================
const DEFAULT_SETTINGS_TABLE: &str = "payment_settings";
const DEFAULT_SECRET_VAR_NAME: &str = "SETTINGS_SERVICE_KEY";
const DEFAULT_PROVIDER: &str = "paystack";

/// 运行时配置
///
/// 普通变量来自 `[vars]`，服务密钥来自 secret，密钥名本身可通过
/// `SETTINGS_KEY_NAME` 覆盖。
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub settings_api_url: String,
    pub settings_table: String,
    pub service_key: String,
    pub provider: String,
}

impl RuntimeConfig {
    pub fn new(env: &Env) -> EdgeResult<Self> {
        Self::from_vars(
            |name| env.var(name).ok().map(|v| v.to_string()),
            |name| env.secret(name).ok().map(|s| s.to_string()),
        )
    }

    /// 从任意查找函数构造，便于在宿主机上测试
    pub fn from_vars<V, S>(var: V, secret: S) -> EdgeResult<Self>
    where
        V: Fn(&str) -> Option<String>,
        S: Fn(&str) -> Option<String>,
    {
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        let settings_api_url = non_empty(var("SETTINGS_API_URL"))
            .ok_or_else(|| EdgeError::config("SETTINGS_API_URL is not set").in_op("config.load"))?;

        let key_name = non_empty(var("SETTINGS_KEY_NAME"))
            .unwrap_or_else(|| DEFAULT_SECRET_VAR_NAME.to_string());
        let service_key = non_empty(secret(&key_name)).ok_or_else(|| {
            EdgeError::config(format!("secret {} is not set", key_name))
                .in_op_with("config.load", &key_name)
        })?;

        Ok(Self {
            settings_api_url,
            settings_table: non_empty(var("SETTINGS_TABLE"))
                .unwrap_or_else(|| DEFAULT_SETTINGS_TABLE.to_string()),
            service_key,
            provider: non_empty(var("PAYMENT_PROVIDER"))
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
        })
    }
}

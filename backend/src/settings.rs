//! 支付设置仓库
//!
//! 设置表通过其 REST 接口（PostgREST 风格的过滤查询）访问。
//! 仓库是一个 trait，业务逻辑可以注入 Mock 在宿主机上测试。

use crate::error::{EdgeError, EdgeResult};
use crate::utils::request::{HttpClient, HttpRequest};
use coursedesk_shared::protocol::HttpMethod;
use serde::{Deserialize, Serialize};
use worker::Url;

/// 设置表中的一行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentSettings {
    pub provider: String,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub is_active: bool,
}

#[async_trait::async_trait(?Send)]
pub trait SettingsRepository {
    /// 查找指定 provider 且已启用的唯一一行
    async fn find_active(&self, provider: &str) -> EdgeResult<Option<PaymentSettings>>;
}

/// 基于 REST 接口的设置仓库
pub struct RestSettingsRepository<C: HttpClient> {
    client: C,
    api_url: String,
    table: String,
    service_key: String,
}

impl<C: HttpClient> RestSettingsRepository<C> {
    pub fn new(client: C, api_url: &str, table: &str, service_key: &str) -> Self {
        Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn query_url(&self, provider: &str) -> EdgeResult<String> {
        let base = format!("{}/{}", self.api_url, self.table);
        let provider_filter = format!("eq.{}", provider);
        let url = Url::parse_with_params(
            &base,
            &[
                ("select", "*"),
                ("provider", provider_filter.as_str()),
                ("is_active", "eq.true"),
                ("limit", "1"),
            ],
        )
        .map_err(|e| {
            EdgeError::config(format!("invalid settings url: {}", e)).in_op_with("settings.url", &base)
        })?;
        Ok(url.to_string())
    }
}

#[async_trait::async_trait(?Send)]
impl<C: HttpClient> SettingsRepository for RestSettingsRepository<C> {
    async fn find_active(&self, provider: &str) -> EdgeResult<Option<PaymentSettings>> {
        let req = HttpRequest::new(&self.query_url(provider)?, HttpMethod::Get)
            .with_header("apikey", &self.service_key)
            .with_header("Authorization", &format!("Bearer {}", self.service_key))
            .with_header("Accept", "application/json");

        let resp = self
            .client
            .send(req)
            .await
            .map_err(|e| e.in_op_with("settings.fetch", &self.table))?;

        if !resp.is_success() {
            return Err(EdgeError::upstream(format!(
                "settings backend responded with {}: {}",
                resp.status,
                resp.body.chars().take(200).collect::<String>()
            ))
            .in_op_with("settings.fetch", &self.table));
        }

        let rows: Vec<PaymentSettings> = resp
            .json()
            .map_err(|e| e.in_op_with("settings.decode", &self.table))?;
        Ok(rows.into_iter().next())
    }
}

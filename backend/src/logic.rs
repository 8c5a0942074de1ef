use crate::error::{EdgeError, EdgeResult};
use crate::settings::SettingsRepository;
use coursedesk_shared::protocol::PaymentKeyResponse;

/// 支付公钥查询逻辑
///
/// 不依赖 worker crate，可以注入 MockSettingsRepository 在宿主机上测试。
pub struct PaymentKeyLogic<'a, R: SettingsRepository> {
    repo: &'a R,
    provider: &'a str,
}

impl<'a, R: SettingsRepository> PaymentKeyLogic<'a, R> {
    pub fn new(repo: &'a R, provider: &'a str) -> Self {
        Self { repo, provider }
    }

    pub async fn public_key(&self) -> EdgeResult<PaymentKeyResponse> {
        let row = self
            .repo
            .find_active(self.provider)
            .await
            .map_err(|e| e.in_op_with("payment_key.lookup", self.provider))?;

        // 未启用的行视同不存在
        let key = row
            .filter(|r| r.is_active)
            .and_then(|r| r.public_key)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        match key {
            Some(public_key) => Ok(PaymentKeyResponse { public_key }),
            None => Err(EdgeError::not_configured(format!(
                "{} is not configured",
                display_name(self.provider)
            ))
            .in_op_with("payment_key.lookup", self.provider)),
        }
    }
}

fn display_name(provider: &str) -> String {
    let mut chars = provider.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

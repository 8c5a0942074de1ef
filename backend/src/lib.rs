use worker::*;

// =========================================================
// 宏定义 (日志)
// =========================================================

#[cfg(target_arch = "wasm32")]
macro_rules! log_info { ($($t:tt)*) => (worker::console_log!($($t)*)) }
#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_info { ($($t:tt)*) => (println!($($t)*)) }

#[cfg(target_arch = "wasm32")]
macro_rules! log_error { ($($t:tt)*) => (worker::console_error!($($t)*)) }
#[cfg(not(target_arch = "wasm32"))]
macro_rules! log_error { ($($t:tt)*) => (eprintln!($($t)*)) }

pub mod config;
pub mod error;
pub mod logic;
pub mod settings;

pub(crate) mod utils {
    pub mod request;
}

use config::RuntimeConfig;
use error::{EdgeError, EdgeResult};
use logic::PaymentKeyLogic;
use settings::RestSettingsRepository;
use utils::request::WorkerHttpClient;

// 辅助函数：将 EdgeError 映射为 JSON 错误响应
fn error_response(e: EdgeError) -> Result<Response> {
    let status = e.status_code();

    // 对于 5xx 错误，记录日志以便排查；客户端只看到通用消息
    if status >= 500 {
        log_error!("Internal Error {}", e);
    } else {
        log_info!("Rejected: {}", e);
    }

    Ok(Response::from_json(&e.to_body())?.with_status(status))
}

async fn lookup_public_key(env: &Env) -> EdgeResult<Response> {
    let cfg = RuntimeConfig::new(env)?;
    let repo = RestSettingsRepository::new(
        WorkerHttpClient,
        &cfg.settings_api_url,
        &cfg.settings_table,
        &cfg.service_key,
    );

    let body = PaymentKeyLogic::new(&repo, &cfg.provider).public_key().await?;
    log_info!("Served public key for {}", cfg.provider);
    Ok(Response::from_json(&body)?)
}

// =========================================================
// Entry Points
// =========================================================

#[event(fetch)]
pub async fn main(req: Request, env: Env, _ctx: Context) -> Result<Response> {
    console_error_panic_hook::set_once();

    let cors = cors_policy();

    let response = match Dispatch::for_method(&req.method()) {
        Dispatch::Preflight => Response::empty(),
        Dispatch::Lookup => match lookup_public_key(&env).await {
            Ok(resp) => Ok(resp),
            Err(e) => error_response(e),
        },
        Dispatch::NotAllowed => method_not_allowed(),
    }?;

    response.with_cors(&cors)
}

// 浏览器直接调用，预检与实际响应都放开来源
const CORS_ORIGINS: [&str; 1] = ["*"];
const CORS_METHODS: [Method; 3] = [Method::Get, Method::Post, Method::Options];
const CORS_HEADERS: [&str; 3] = ["Content-Type", "Authorization", "apikey"];

fn cors_policy() -> Cors {
    Cors::new()
        .with_origins(CORS_ORIGINS)
        .with_methods(CORS_METHODS)
        .with_allowed_headers(CORS_HEADERS)
}

/// 请求方法到处理方式的映射，路径不参与匹配
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    Preflight,
    Lookup,
    NotAllowed,
}

impl Dispatch {
    fn for_method(method: &Method) -> Self {
        match method {
            Method::Options => Dispatch::Preflight,
            Method::Get | Method::Post => Dispatch::Lookup,
            _ => Dispatch::NotAllowed,
        }
    }
}

fn method_not_allowed() -> Result<Response> {
    let body = coursedesk_shared::protocol::EdgeErrorBody {
        error: "Method Not Allowed".to_string(),
    };
    Ok(Response::from_json(&body)?.with_status(405))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_dispatch() {
        assert_eq!(Dispatch::for_method(&Method::Options), Dispatch::Preflight);
        assert_eq!(Dispatch::for_method(&Method::Get), Dispatch::Lookup);
        assert_eq!(Dispatch::for_method(&Method::Post), Dispatch::Lookup);
        assert_eq!(Dispatch::for_method(&Method::Delete), Dispatch::NotAllowed);
        assert_eq!(Dispatch::for_method(&Method::Put), Dispatch::NotAllowed);
    }

    #[test]
    fn test_cors_allows_browser_callers() {
        assert_eq!(CORS_ORIGINS, ["*"]);
        assert!(CORS_METHODS.contains(&Method::Options));
        assert!(CORS_METHODS.contains(&Method::Get));
        assert!(CORS_METHODS.contains(&Method::Post));
        for header in ["Content-Type", "Authorization", "apikey"] {
            assert!(CORS_HEADERS.contains(&header));
        }
    }
}

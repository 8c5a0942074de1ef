//! 页面级数据获取
//!
//! 每个页面在挂载时发起自己的请求。请求本身不可取消：视图销毁后请求仍会完成，
//! 但结果通过 `ViewScope` 丢弃，不会写入已销毁视图的状态。
//! 失败转成一条临时通知；401 不提示，由会话生命周期负责跳转。

use crate::api::AppClient;
use crate::components::notification::Toasts;
use coursedesk_shared::client::{HttpRequest, Transport};
use coursedesk_shared::error::{ApiError, ApiResult};
use coursedesk_shared::protocol::{
    AdminStatsRequest, ApiRequest, EdgeErrorBody, HttpMethod, ListCoursesRequest,
    ListOrdersRequest, PaymentKeyResponse,
};
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// 页面数据状态
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState<T> {
    Idle,
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> FetchState<T> {
    /// 将请求结果转为页面状态，以及需要展示的通知（如果有）
    pub fn from_result(context: &str, result: ApiResult<T>) -> (Self, Option<String>) {
        match result {
            Ok(data) => (FetchState::Ready(data), None),
            Err(ApiError::Unauthorized) => (FetchState::Failed("登录已失效".to_string()), None),
            Err(e) => {
                let message = format!("{}: {}", context, e);
                (FetchState::Failed(e.to_string()), Some(message))
            }
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FetchState::Loading)
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            FetchState::Ready(data) => Some(data),
            _ => None,
        }
    }
}

/// 视图存活标记
#[derive(Debug, Clone)]
pub struct ScopeFlag(Arc<AtomicBool>);

impl ScopeFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn dispose(&self) {
        self.0.store(false, Ordering::Relaxed);
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// 视图仍存活时才应用结果
    pub fn apply<F: FnOnce()>(&self, f: F) -> bool {
        if self.is_alive() {
            f();
            true
        } else {
            log::debug!("view disposed before response arrived, result discarded");
            false
        }
    }
}

impl Default for ScopeFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// 绑定到当前响应式 Owner 的存活标记
///
/// 在组件或 Effect 中创建：Owner 清理（视图卸载或 Effect 重新执行）时标记失效。
pub struct ViewScope;

impl ViewScope {
    pub fn current() -> ScopeFlag {
        let flag = ScopeFlag::new();
        let on_dispose = flag.clone();
        on_cleanup(move || on_dispose.dispose());
        flag
    }
}

/// 发起请求并把结果写入 `target`
pub fn spawn_fetch<R>(
    client: &AppClient,
    context: &'static str,
    req: R,
    target: RwSignal<FetchState<R::Response>>,
    toasts: Toasts,
) where
    R: ApiRequest + 'static,
    R::Response: Send + Sync + 'static,
{
    let scope = ViewScope::current();
    let client = client.clone();
    target.set(FetchState::Loading);

    spawn_local(async move {
        let result = client.request(&req).await;
        scope.apply(move || {
            let (state, notice) = FetchState::from_result(context, result);
            if let Some(message) = notice {
                toasts.error(message);
            }
            target.set(state);
        });
    });
}

/// 课程目录
pub fn fetch_courses(
    client: &AppClient,
    search: Option<String>,
    target: RwSignal<FetchState<Vec<coursedesk_shared::CourseSummary>>>,
    toasts: Toasts,
) {
    let req = ListCoursesRequest {
        search: search.filter(|s| !s.trim().is_empty()),
        level: None,
    };
    spawn_fetch(client, "加载课程失败", req, target, toasts);
}

/// 管理统计，只应在守卫放行后的视图中调用
pub fn fetch_admin_stats(
    client: &AppClient,
    target: RwSignal<FetchState<coursedesk_shared::protocol::AdminStats>>,
    toasts: Toasts,
) {
    spawn_fetch(client, "加载统计失败", AdminStatsRequest, target, toasts);
}

/// 订单列表（分页）
pub fn fetch_orders(
    client: &AppClient,
    page: u32,
    target: RwSignal<FetchState<coursedesk_shared::protocol::OrderPage>>,
    toasts: Toasts,
) {
    let req = ListOrdersRequest {
        page: page.max(1),
        ..Default::default()
    };
    spawn_fetch(client, "加载订单失败", req, target, toasts);
}

/// 从边缘函数获取支付网关公钥
///
/// 边缘函数不需要用户凭据，直接走传输层。
pub async fn fetch_payment_key<T: Transport>(transport: &T, url: &str) -> ApiResult<String> {
    let req = HttpRequest::new(url, HttpMethod::Get).with_header("Accept", "application/json");
    let resp = transport.send(req).await?;

    match resp.status {
        200..=299 => serde_json::from_str::<PaymentKeyResponse>(&resp.body)
            .map(|r| r.public_key)
            .map_err(|e| ApiError::Decode(e.to_string())),
        status => {
            let message = serde_json::from_str::<EdgeErrorBody>(&resp.body)
                .map(|b| b.error)
                .unwrap_or(resp.body);
            log::warn!("payment key lookup failed [{}]: {}", status, message);
            Err(ApiError::Status { status, message })
        }
    }
}

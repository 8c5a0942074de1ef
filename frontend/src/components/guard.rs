use crate::session::use_session;
use crate::web::navigation::current_location;
use crate::web::router::use_router;
use coursedesk_shared::guard::{AccessGuard, GuardDecision, PrivilegedRoles};
use leptos::prelude::*;

/// 只对特权角色开放的内容
///
/// 每当会话的加载标志或身份变化时重新求值：
/// - 加载中：显示阻塞式加载指示
/// - 拒绝：跳转到登录页，并带上当前地址作为返回目标
/// - 放行：渲染子组件
#[component]
pub fn RequireRole(children: ChildrenFn) -> impl IntoView {
    let session = use_session();
    let router = use_router();
    let guard = AccessGuard::new(PrivilegedRoles::default());

    let decision = Memo::new(move |_| {
        session
            .state
            .with(|state| guard.evaluate(state, &current_location()))
    });

    Effect::new(move |_| {
        if let GuardDecision::Denied {
            reason,
            redirect_to,
        } = decision.get()
        {
            log::info!("access denied ({:?}), redirecting to {}", reason, redirect_to);
            router.redirect(&redirect_to);
        }
    });

    move || match decision.get() {
        GuardDecision::Granted => children().into_any(),
        GuardDecision::Pending | GuardDecision::Denied { .. } => view! {
            <div class="flex items-center justify-center min-h-screen">
                <span class="loading loading-spinner loading-lg text-primary"></span>
            </div>
        }
        .into_any(),
    }
}

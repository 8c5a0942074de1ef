//! 路由服务模块 - 核心引擎
//!
//! 封装了 web_sys 的 History API，所有对 window.history 的操作都集中在此模块。
//! 访问控制不在这里做：受保护的视图自己包在 `RequireRole` 里，
//! 路由只负责 "路径 -> 视图" 的映射与前进/后退。

use leptos::prelude::*;
use wasm_bindgen::prelude::*;

use super::navigation::current_path;
use super::route::AppRoute;

/// 推送 History 状态（内部工具函数）
fn push_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.push_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 替换 History 状态（内部工具函数，用于重定向）
fn replace_history_state(path: &str) {
    if let Some(window) = web_sys::window() {
        if let Ok(history) = window.history() {
            let _ = history.replace_state_with_url(&JsValue::NULL, "", Some(path));
        }
    }
}

/// 路由器服务
///
/// 通过 Signal 驱动界面更新。
#[derive(Clone, Copy)]
pub struct RouterService {
    /// 当前路由（只读信号）
    current_route: ReadSignal<AppRoute>,
    /// 设置当前路由（写入信号）
    set_route: WriteSignal<AppRoute>,
}

impl RouterService {
    fn new() -> Self {
        let initial_route = AppRoute::from_path(&current_path());
        let (current_route, set_route) = signal(initial_route);

        Self {
            current_route,
            set_route,
        }
    }

    /// 获取当前路由信号
    pub fn current_route(&self) -> ReadSignal<AppRoute> {
        self.current_route
    }

    /// 应用内导航（pushState），`path` 可以带查询串
    pub fn navigate(&self, path: &str) {
        push_history_state(path);
        self.set_route.set(AppRoute::from_path(path));
    }

    /// 替换当前历史记录，用于守卫拒绝后的跳转，避免后退回到受保护页面
    pub fn redirect(&self, path: &str) {
        log::debug!("[Router] redirect to {}", path);
        replace_history_state(path);
        self.set_route.set(AppRoute::from_path(path));
    }

    /// 初始化浏览器后退/前进按钮监听
    fn init_popstate_listener(&self) {
        let set_route = self.set_route;

        let closure = Closure::<dyn Fn()>::new(move || {
            set_route.set(AppRoute::from_path(&current_path()));
        });

        if let Some(window) = web_sys::window() {
            let _ = window
                .add_event_listener_with_callback("popstate", closure.as_ref().unchecked_ref());
        }

        // 泄漏闭包以保持监听器存活
        closure.forget();
    }
}

/// 提供路由服务到 Context 并初始化
fn provide_router() -> RouterService {
    let router = RouterService::new();
    router.init_popstate_listener();
    provide_context(router);
    router
}

/// 从 Context 获取路由服务
pub fn use_router() -> RouterService {
    use_context::<RouterService>()
        .expect("RouterService not found in context. Ensure Router is provided.")
}

// ============================================================================
// UI 组件
// ============================================================================

/// 路由器根组件
///
/// 提供路由上下文，应在 App 根部使用。
#[component]
pub fn Router(children: Children) -> impl IntoView {
    provide_router();
    children()
}

/// 路由出口组件
///
/// 根据当前路由状态渲染对应的组件。
#[component]
pub fn RouterOutlet(
    /// 路由匹配函数：接收当前路由，返回对应视图
    matcher: fn(AppRoute) -> AnyView,
) -> impl IntoView {
    let router = use_router();

    move || {
        let current = router.current_route().get();
        matcher(current)
    }
}

/// 应用内链接，点击时不刷新页面
#[component]
pub fn Link(
    /// 目标路径
    #[prop(into)]
    to: String,
    #[prop(optional, into)] class: String,
    children: Children,
) -> impl IntoView {
    let router = use_router();

    let target = to.clone();
    let on_click = move |ev: leptos::ev::MouseEvent| {
        ev.prevent_default();
        router.navigate(&target);
    };

    view! {
        <a href=to class=class on:click=on_click>
            {children()}
        </a>
    }
}

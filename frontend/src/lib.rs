//! CourseDesk 前端应用
//!
//! 采用 Context-Driven 的架构：
//! - `web`: 浏览器 API 适配（LocalStorage、fetch、导航、日志、路由）
//! - `session` / `cart`: 共享层状态容器的响应式上下文
//! - `fetchers`: 页面级数据获取
//! - `components`: UI 组件层，受保护页面包在 `RequireRole` 中

mod api;
mod cart;
mod fetchers;
mod session;
mod components {
    pub mod cart_panel;
    pub mod catalog;
    pub mod dashboard;
    pub mod guard;
    pub mod layout;
    pub mod login;
    pub mod notification;
}

use crate::api::{AppClient, AppConfig};
use crate::cart::CartContext;
use crate::components::cart_panel::{CartDrawer, CartPage};
use crate::components::catalog::CatalogPage;
use crate::components::dashboard::{AdminDashboard, OrdersPage};
use crate::components::guard::RequireRole;
use crate::components::layout::NavBar;
use crate::components::login::{AuthModal, LoginPage};
use crate::components::notification::{Notifications, Toasts};
use crate::session::SessionContext;
use coursedesk_shared::client::auth_channel;

use leptos::prelude::*;

// 原生 Web API 封装模块
// 此模块提供对浏览器原生 API 的轻量级封装，替代 gloo-* 系列 crate，
// 以减小 WASM 二进制体积。
pub(crate) mod web {
    pub mod clock;
    mod http;
    pub mod logger;
    pub mod navigation;
    pub mod route;
    pub mod router;
    mod storage;

    pub use http::FetchTransport;
    pub use storage::BrowserStorage;
}

use web::route::AppRoute;
use web::router::{Router, RouterOutlet};
use web::{BrowserStorage, FetchTransport};

/// 安装控制台日志
pub fn init_logging() {
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    web::logger::init(level);
}

/// 路由匹配函数
///
/// 根据 AppRoute 枚举返回对应的视图组件。
fn route_matcher(route: AppRoute) -> AnyView {
    match route {
        AppRoute::Catalog => view! { <CatalogPage /> }.into_any(),
        AppRoute::Cart => view! { <CartPage /> }.into_any(),
        AppRoute::Login => view! { <LoginPage /> }.into_any(),
        AppRoute::Admin => view! { <RequireRole><AdminDashboard /></RequireRole> }.into_any(),
        AppRoute::AdminOrders => view! { <RequireRole><OrdersPage /></RequireRole> }.into_any(),
        AppRoute::NotFound => view! {
            <div class="flex items-center justify-center min-h-screen bg-base-200">
                <div class="text-center">
                    <h1 class="text-6xl font-bold text-error">"404"</h1>
                    <p class="text-xl mt-4">"页面未找到"</p>
                </div>
            </div>
        }
        .into_any(),
    }
}

#[component]
pub fn App() -> impl IntoView {
    // 1. 配置与通知
    let config = AppConfig::from_env();
    provide_context(config);
    Toasts::provide();

    // 2. API 客户端：401 通过事件通道交给会话生命周期
    let (events_tx, events_rx) = auth_channel();
    let client = AppClient::new(config.api_url, FetchTransport, BrowserStorage, events_tx);
    provide_context(client.clone());

    // 3. 会话（启动身份解析）与购物车（从存储恢复）
    SessionContext::provide(client, events_rx);
    CartContext::provide();

    view! {
        <Router>
            <div class="min-h-screen bg-base-200 font-sans">
                <NavBar />
                <Notifications />
                <AuthModal />
                <CartDrawer />
                <RouterOutlet matcher=route_matcher />
            </div>
        </Router>
    }
}

use crate::api::use_api;
use crate::cart::use_cart;
use crate::session::use_session;
use crate::web::router::Link;
use coursedesk_shared::guard::{PrivilegedRoles, RolePolicy};
use leptos::prelude::*;
use leptos::task::spawn_local;

/// 顶部导航栏
#[component]
pub fn NavBar() -> impl IntoView {
    let session = use_session();
    let cart = use_cart();
    let client = use_api();

    let display_name = move || {
        session.user().map(|u| {
            u.profile
                .as_ref()
                .and_then(|p| p.full_name.clone())
                .unwrap_or(u.email)
        })
    };
    // 仅用于决定是否显示入口，真正的访问控制在 RequireRole
    let show_admin = move || {
        session
            .user()
            .and_then(|u| u.role().cloned())
            .is_some_and(|role| PrivilegedRoles::default().permits(&role))
    };

    let on_logout = move |_| {
        let client = client.clone();
        spawn_local(async move {
            session.sign_out(&client).await;
        });
    };

    view! {
        <div class="navbar bg-base-100 shadow">
            <div class="flex-1 gap-2">
                <Link to="/" class="btn btn-ghost text-xl">"CourseDesk"</Link>
                <Show when=show_admin>
                    <Link to="/admin" class="btn btn-ghost btn-sm">"管理"</Link>
                </Show>
            </div>
            <div class="flex-none gap-2">
                <button class="btn btn-ghost" on:click=move |_| cart.toggle()>
                    "购物车"
                    <span class="badge badge-primary">{move || cart.total_items()}</span>
                </button>
                <Show
                    when=move || session.is_authenticated()
                    fallback=move || view! {
                        <button
                            class="btn btn-primary btn-sm"
                            disabled=move || session.is_loading()
                            on:click=move |_| session.set_auth_modal(true)
                        >
                            "登录"
                        </button>
                    }
                >
                    <span class="text-sm opacity-70 hidden md:inline">{display_name}</span>
                    <button class="btn btn-outline btn-error btn-sm" on:click=on_logout.clone()>
                        "退出"
                    </button>
                </Show>
            </div>
        </div>
    }
}

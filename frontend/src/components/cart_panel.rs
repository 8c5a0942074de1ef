use crate::api::{use_api, use_config};
use crate::cart::use_cart;
use crate::components::catalog::format_price;
use crate::components::notification::use_toasts;
use crate::fetchers::fetch_payment_key;
use crate::session::use_session;
use crate::web::FetchTransport;
use crate::web::navigation::BrowserNavigator;
use coursedesk_shared::error::ApiError;
use coursedesk_shared::lifecycle::Navigator;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// 购物车条目列表
#[component]
fn CartItems() -> impl IntoView {
    let cart = use_cart();

    view! {
        <Show
            when=move || { cart.total_items() > 0 }
            fallback=|| view! { <p class="text-center py-8 text-base-content/50">"购物车是空的"</p> }
        >
            <ul class="divide-y">
                <For
                    each=move || cart.items()
                    key=|item| item.id()
                    children=move |item| {
                        let id = item.id();
                        view! {
                            <li class="flex items-center justify-between py-3 gap-4">
                                <div>
                                    <div class="font-semibold">{item.course.title.clone()}</div>
                                    <div class="text-sm opacity-70">{item.course.instructor.clone()}</div>
                                </div>
                                <div class="flex items-center gap-2">
                                    <span>{format_price(item.price())}</span>
                                    <button class="btn btn-ghost btn-xs text-error" on:click=move |_| cart.remove_item(id)>
                                        "移除"
                                    </button>
                                </div>
                            </li>
                        }
                    }
                />
            </ul>
        </Show>
    }
}

/// 结算区：总计与发起支付
#[component]
fn CheckoutBar() -> impl IntoView {
    let cart = use_cart();
    let session = use_session();
    let toasts = use_toasts();
    let client = use_api();
    let config = use_config();
    let (busy, set_busy) = signal(false);

    let on_checkout = move |_| {
        if !session.is_authenticated() {
            session.set_auth_modal(true);
            return;
        }
        let Some(req) = cart.checkout_request() else {
            return;
        };

        set_busy.set(true);
        let client = client.clone();
        spawn_local(async move {
            // 先确认支付网关已配置
            if let Err(e) = fetch_payment_key(&FetchTransport, config.payment_key_url).await {
                toasts.error(format!("支付暂不可用: {}", e));
                set_busy.set(false);
                return;
            }

            match client.request(&req).await {
                Ok(checkout) => {
                    log::info!("checkout {} initialized", checkout.reference);
                    BrowserNavigator.hard_redirect(&checkout.authorization_url);
                }
                // 生命周期已处理
                Err(ApiError::Unauthorized) => {}
                Err(e) => toasts.error(format!("发起支付失败: {}", e)),
            }
            set_busy.set(false);
        });
    };

    view! {
        <div class="flex items-center justify-between pt-4 border-t">
            <div>
                <span class="opacity-70">{move || format!("共 {} 门课程", cart.total_items())}</span>
                <div class="text-xl font-bold">{move || format_price(cart.total_amount())}</div>
            </div>
            <div class="flex gap-2">
                <button class="btn btn-ghost" disabled=move || cart.total_items() == 0 on:click=move |_| cart.clear_cart()>
                    "清空"
                </button>
                <button
                    class="btn btn-primary"
                    disabled=move || busy.get() || cart.total_items() == 0
                    on:click=on_checkout
                >
                    {move || if busy.get() { "处理中..." } else { "去结算" }}
                </button>
            </div>
        </div>
    }
}

/// 购物车页
#[component]
pub fn CartPage() -> impl IntoView {
    view! {
        <div class="max-w-3xl mx-auto p-4 md:p-8">
            <div class="card bg-base-100 shadow-xl">
                <div class="card-body">
                    <h2 class="card-title">"购物车"</h2>
                    <CartItems />
                    <CheckoutBar />
                </div>
            </div>
        </div>
    }
}

/// 侧边购物车抽屉，由购物车的 `is_open` 控制
#[component]
pub fn CartDrawer() -> impl IntoView {
    let cart = use_cart();

    view! {
        <Show when=move || cart.is_open()>
            <div class="fixed inset-0 z-40 bg-black/30" on:click=move |_| cart.close()></div>
            <aside class="fixed right-0 top-0 z-50 h-full w-full max-w-md bg-base-100 p-6 shadow-2xl overflow-y-auto">
                <div class="flex items-center justify-between mb-4">
                    <h2 class="text-lg font-bold">"购物车"</h2>
                    <button class="btn btn-sm btn-circle btn-ghost" on:click=move |_| cart.close()>"✕"</button>
                </div>
                <CartItems />
                <CheckoutBar />
            </aside>
        </Show>
    }
}

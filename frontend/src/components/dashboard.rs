use crate::api::use_api;
use crate::components::catalog::format_price;
use crate::components::notification::use_toasts;
use crate::fetchers::{FetchState, fetch_admin_stats, fetch_orders};
use crate::web::router::Link;
use coursedesk_shared::protocol::{AdminStats, ListOrdersRequest, OrderPage};
use leptos::prelude::*;

/// 管理面板
///
/// 只在 `RequireRole` 放行后挂载，因此统计请求总是在授权确认之后发出。
#[component]
pub fn AdminDashboard() -> impl IntoView {
    let client = use_api();
    let toasts = use_toasts();
    let stats = RwSignal::new(FetchState::<AdminStats>::Idle);

    fetch_admin_stats(&client, stats, toasts);

    let refresh = move |_| fetch_admin_stats(&client, stats, toasts);
    let value = move |f: fn(&AdminStats) -> String| {
        stats.with(|s| s.ready().map(f).unwrap_or_else(|| "-".to_string()))
    };

    view! {
        <div class="max-w-7xl mx-auto p-4 md:p-8 space-y-8">
            <div class="flex items-center justify-between">
                <h1 class="text-2xl font-bold">"管理面板"</h1>
                <div class="flex gap-2">
                    <Link to="/admin/orders" class="btn btn-outline">"订单"</Link>
                    <button class="btn btn-ghost" disabled=move || stats.with(|s| s.is_loading()) on:click=refresh>
                        "刷新"
                    </button>
                </div>
            </div>

            <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                <div class="stat">
                    <div class="stat-title">"用户"</div>
                    <div class="stat-value text-primary">{move || value(|s| s.total_users.to_string())}</div>
                </div>
                <div class="stat">
                    <div class="stat-title">"课程"</div>
                    <div class="stat-value">{move || value(|s| s.total_courses.to_string())}</div>
                </div>
                <div class="stat">
                    <div class="stat-title">"订单"</div>
                    <div class="stat-value">{move || value(|s| s.total_orders.to_string())}</div>
                </div>
                <div class="stat">
                    <div class="stat-title">"收入"</div>
                    <div class="stat-value text-success">{move || value(|s| format_price(s.total_revenue))}</div>
                </div>
            </div>
        </div>
    }
}

/// 订单列表
#[component]
pub fn OrdersPage() -> impl IntoView {
    let client = use_api();
    let toasts = use_toasts();
    let orders = RwSignal::new(FetchState::<OrderPage>::Idle);
    let (page, set_page) = signal(1u32);
    let per_page = ListOrdersRequest::default().per_page as u64;

    // 页码变化时重新获取；Effect 重新执行会使上一次请求的结果失效
    Effect::new(move |_| {
        fetch_orders(&client, page.get(), orders, toasts);
    });

    let is_loading = move || orders.with(|s| s.is_loading());
    let rows = move || orders.with(|s| s.ready().map(|p| p.orders.clone()).unwrap_or_default());
    let has_next = move || {
        orders.with(|s| {
            s.ready()
                .map(|p| p.page as u64 * per_page < p.total)
                .unwrap_or(false)
        })
    };

    view! {
        <div class="max-w-7xl mx-auto p-4 md:p-8 space-y-6">
            <div class="flex items-center justify-between">
                <h1 class="text-2xl font-bold">"订单"</h1>
                <Link to="/admin" class="btn btn-ghost">"返回面板"</Link>
            </div>

            <div class="card bg-base-100 shadow-xl">
                <div class="overflow-x-auto w-full">
                    <table class="table table-zebra w-full">
                        <thead>
                            <tr>
                                <th>"参考号"</th>
                                <th>"客户"</th>
                                <th>"金额"</th>
                                <th>"状态"</th>
                                <th class="hidden md:table-cell">"时间"</th>
                            </tr>
                        </thead>
                        <tbody>
                            <Show when=is_loading>
                                <tr>
                                    <td colspan="5" class="text-center py-8 text-base-content/50">
                                        <span class="loading loading-spinner loading-md"></span> " 加载中..."
                                    </td>
                                </tr>
                            </Show>
                            <Show when=move || !is_loading() && rows().is_empty()>
                                <tr>
                                    <td colspan="5" class="text-center py-8 text-base-content/50">"暂无订单"</td>
                                </tr>
                            </Show>
                            <For
                                each=rows
                                key=|o| o.id.clone()
                                children=|order| view! {
                                    <tr>
                                        <td class="font-mono text-sm">{order.reference}</td>
                                        <td>{order.customer_email}</td>
                                        <td>{format_price(order.amount)}</td>
                                        <td><div class="badge badge-outline">{order.status}</div></td>
                                        <td class="hidden md:table-cell text-xs opacity-70">{order.created_at}</td>
                                    </tr>
                                }
                            />
                        </tbody>
                    </table>
                </div>
            </div>

            <div class="join">
                <button
                    class="join-item btn"
                    disabled=move || page.get() <= 1 || is_loading()
                    on:click=move |_| set_page.update(|p| *p = p.saturating_sub(1).max(1))
                >
                    "«"
                </button>
                <button class="join-item btn">{move || format!("第 {} 页", page.get())}</button>
                <button
                    class="join-item btn"
                    disabled=move || !has_next() || is_loading()
                    on:click=move |_| set_page.update(|p| *p += 1)
                >
                    "»"
                </button>
            </div>
        </div>
    }
}

use crate::api::use_api;
use crate::cart::use_cart;
use crate::components::notification::use_toasts;
use crate::fetchers::{FetchState, fetch_courses};
use coursedesk_shared::{CourseSummary, Price};
use leptos::prelude::*;

/// 金额格式化，千位分隔
pub fn format_price(amount: Price) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("₦{}", out)
}

#[component]
fn CourseCard(course: CourseSummary) -> impl IntoView {
    let cart = use_cart();
    let id = course.id;
    let in_cart = move || cart.is_in_cart(id);

    let title = course.title.clone();
    let instructor = course.instructor.clone();
    let level = course.level.clone();
    let thumbnail = course.thumbnail.clone();
    let price = format_price(course.price);

    view! {
        <div class="card bg-base-100 shadow-xl">
            {thumbnail.map(|src| view! {
                <figure><img src=src alt=title.clone() /></figure>
            })}
            <div class="card-body">
                <h2 class="card-title">{title.clone()}</h2>
                <p class="text-sm text-base-content/70">{instructor}</p>
                {level.map(|level| view! { <div class="badge badge-outline">{level}</div> })}
                <div class="card-actions justify-between items-center">
                    <span class="font-bold">{price}</span>
                    <button
                        class="btn btn-primary btn-sm"
                        disabled=in_cart
                        on:click=move |_| {
                            cart.add_item(course.clone());
                            cart.open();
                        }
                    >
                        {move || if in_cart() { "已在购物车" } else { "加入购物车" }}
                    </button>
                </div>
            </div>
        </div>
    }
}

/// 课程目录页
#[component]
pub fn CatalogPage() -> impl IntoView {
    let client = use_api();
    let toasts = use_toasts();
    let courses = RwSignal::new(FetchState::<Vec<CourseSummary>>::Idle);
    let (search, set_search) = signal(String::new());

    let load = move |query: String| {
        fetch_courses(&client, Some(query), courses, toasts);
    };

    // 初始加载
    load(String::new());

    let on_search = {
        let load = load.clone();
        move |ev: leptos::ev::SubmitEvent| {
            ev.prevent_default();
            load(search.get());
        }
    };

    view! {
        <div class="max-w-7xl mx-auto p-4 md:p-8 space-y-6">
            <form class="join w-full" on:submit=on_search>
                <input
                    class="input input-bordered join-item w-full"
                    placeholder="搜索课程"
                    on:input=move |ev| set_search.set(event_target_value(&ev))
                    prop:value=search
                />
                <button class="btn join-item">"搜索"</button>
            </form>

            {move || courses.with(|state| match state {
                FetchState::Idle | FetchState::Loading => view! {
                    <div class="text-center py-8">
                        <span class="loading loading-spinner loading-md"></span>
                    </div>
                }.into_any(),
                FetchState::Failed(msg) => view! {
                    <div class="text-center py-8 text-error">{msg.clone()}</div>
                }.into_any(),
                FetchState::Ready(list) if list.is_empty() => view! {
                    <div class="text-center py-8 text-base-content/50">"没有找到课程"</div>
                }.into_any(),
                FetchState::Ready(list) => {
                    let list = list.clone();
                    view! {
                        <div class="grid gap-6 md:grid-cols-3">
                            <For
                                each=move || list.clone()
                                key=|c| c.id
                                children=|course| view! { <CourseCard course=course /> }
                            />
                        </div>
                    }.into_any()
                }
            })}
        </div>
    }
}

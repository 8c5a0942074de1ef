use crate::api::use_api;
use crate::components::notification::use_toasts;
use crate::session::use_session;
use crate::web::navigation::current_query;
use crate::web::router::use_router;
use coursedesk_shared::error::ApiError;
use coursedesk_shared::guard::redirect_target;
use leptos::prelude::*;
use leptos::task::spawn_local;

fn login_error_message(err: &ApiError) -> String {
    match err {
        ApiError::Unauthorized | ApiError::Validation { .. } => "邮箱或密码错误".to_string(),
        ApiError::Network(_) => "网络错误，请稍后重试".to_string(),
        other => other.to_string(),
    }
}

/// 登录表单，登录页与登录弹窗共用
#[component]
pub fn LoginForm(#[prop(into)] on_success: Callback<()>) -> impl IntoView {
    let session = use_session();
    let client = use_api();

    let (email, set_email) = signal(String::new());
    let (password, set_password) = signal(String::new());
    let (is_submitting, set_is_submitting) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let on_submit = move |ev: leptos::ev::SubmitEvent| {
        ev.prevent_default();
        let (email, password) = (email.get(), password.get());
        if email.is_empty() || password.is_empty() {
            set_error_msg.set(Some("请填写邮箱和密码".to_string()));
            return;
        }

        set_is_submitting.set(true);
        set_error_msg.set(None);

        let client = client.clone();
        spawn_local(async move {
            let result = session.sign_in(&client, email, password).await;
            set_is_submitting.set(false);
            match result {
                Ok(action) => {
                    on_success.run(());
                    session.dispatch(action);
                }
                Err(e) => set_error_msg.set(Some(login_error_message(&e))),
            }
        });
    };

    view! {
        <form class="card-body" on:submit=on_submit>
            {move || error_msg.get().map(|msg| view! {
                <div role="alert" class="alert alert-error text-sm py-2">
                    <span>{msg}</span>
                </div>
            })}

            <div class="form-control">
                <label class="label" for="email">
                    <span class="label-text">"邮箱"</span>
                </label>
                <input
                    id="email"
                    type="email"
                    placeholder="you@example.com"
                    on:input=move |ev| set_email.set(event_target_value(&ev))
                    prop:value=email
                    class="input input-bordered"
                    required
                />
            </div>
            <div class="form-control">
                <label class="label" for="password">
                    <span class="label-text">"密码"</span>
                </label>
                <input
                    id="password"
                    type="password"
                    placeholder="••••••••"
                    on:input=move |ev| set_password.set(event_target_value(&ev))
                    prop:value=password
                    class="input input-bordered"
                    required
                />
            </div>
            <div class="form-control mt-6">
                <button class="btn btn-primary" disabled=move || is_submitting.get()>
                    {move || if is_submitting.get() {
                        view! { <span class="loading loading-spinner"></span> "登录中..." }.into_any()
                    } else {
                        "登录".into_any()
                    }}
                </button>
            </div>
        </form>
    }
}

/// 登录页
///
/// 登录成功（或已登录）后返回 `?redirect=` 指定的站内路径，没有则回到首页。
#[component]
pub fn LoginPage() -> impl IntoView {
    let session = use_session();
    let router = use_router();

    let go_back = move || {
        let target = redirect_target(&current_query()).unwrap_or_else(|| "/".to_string());
        router.navigate(&target);
    };

    Effect::new(move |_| {
        if !session.is_loading() && session.is_authenticated() {
            go_back();
        }
    });

    view! {
        <Show
            when=move || !session.is_loading()
            fallback=|| view! {
                <div class="flex items-center justify-center min-h-screen">
                    <span class="loading loading-spinner loading-lg text-primary"></span>
                </div>
            }
        >
            <div class="hero min-h-screen bg-base-200">
                <div class="hero-content flex-col w-full max-w-md">
                    <div class="text-center mb-4">
                        <h1 class="text-3xl font-bold">"CourseDesk"</h1>
                        <p class="text-base-content/70">"登录以继续"</p>
                    </div>
                    <div class="card shrink-0 w-full shadow-2xl bg-base-100">
                        // 跳转由上面的 Effect 在会话更新后完成
                        <LoginForm on_success=|_| log::debug!("signed in from login page") />
                    </div>
                </div>
            </div>
        </Show>
    }
}

/// 登录弹窗，由会话状态的 `auth_modal_open` 控制
#[component]
pub fn AuthModal() -> impl IntoView {
    let session = use_session();
    let toasts = use_toasts();
    let is_open = move || session.state.with(|s| s.auth_modal_open);

    view! {
        <Show when=is_open>
            <div class="modal modal-open">
                <div class="modal-box">
                    <button
                        class="btn btn-sm btn-circle btn-ghost absolute right-2 top-2"
                        on:click=move |_| session.set_auth_modal(false)
                    >
                        "✕"
                    </button>
                    <h3 class="font-bold text-lg">"登录"</h3>
                    <LoginForm on_success=move |_| toasts.success("登录成功") />
                </div>
            </div>
        </Show>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coursedesk_shared::error::TransportError;

    #[test]
    fn test_login_error_messages() {
        assert_eq!(login_error_message(&ApiError::Unauthorized), "邮箱或密码错误");
        assert_eq!(
            login_error_message(&ApiError::Network(TransportError::Network("x".into()))),
            "网络错误，请稍后重试"
        );
        assert!(
            login_error_message(&ApiError::Status {
                status: 500,
                message: "boom".into()
            })
            .contains("boom")
        );
    }
}

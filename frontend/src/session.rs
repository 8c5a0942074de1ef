//! 会话上下文
//!
//! 把共享层的 `SessionState` 放进信号，并在应用启动时：
//! 1. 启动会话生命周期的事件循环（消费 API 客户端上报的 401）
//! 2. 发起一次身份解析，结束后 `loading` 置为 false
//!
//! 登录与登出也经由生命周期完成，视图只读取信号。

use crate::api::AppClient;
use crate::web::BrowserStorage;
use crate::web::navigation::BrowserNavigator;
use coursedesk_shared::client::AuthEventReceiver;
use coursedesk_shared::error::ApiResult;
use coursedesk_shared::lifecycle::SessionLifecycle;
use coursedesk_shared::session::{SessionAction, SessionState};
use coursedesk_shared::AuthUser;
use leptos::prelude::*;
use leptos::task::spawn_local;
use std::rc::Rc;

pub type AppLifecycle = SessionLifecycle<BrowserStorage, BrowserNavigator>;

/// 会话上下文
#[derive(Clone, Copy)]
pub struct SessionContext {
    /// 会话状态
    pub state: RwSignal<SessionState>,
    lifecycle: StoredValue<Rc<AppLifecycle>, LocalStorage>,
}

impl SessionContext {
    /// 创建上下文并启动生命周期
    pub fn provide(client: AppClient, events: AuthEventReceiver) -> Self {
        let state = RwSignal::new(SessionState::default());
        let lifecycle = Rc::new(SessionLifecycle::new(BrowserStorage, BrowserNavigator));

        let ctx = Self {
            state,
            lifecycle: StoredValue::new_local(lifecycle.clone()),
        };

        // 事件循环：应用生命周期给出的动作
        let looped = lifecycle.clone();
        spawn_local(async move {
            looped
                .run(events, move |action| state.update(|s| s.apply(action)))
                .await;
        });

        // 启动时的身份解析
        spawn_local(async move {
            let action = lifecycle.resolve_identity(&client).await;
            state.update(|s| s.apply(action));
        });

        provide_context(ctx);
        ctx
    }

    fn lifecycle(&self) -> Rc<AppLifecycle> {
        self.lifecycle.get_value()
    }

    /// 应用一个会话动作
    pub fn dispatch(&self, action: SessionAction) {
        self.state.update(|s| s.apply(action));
    }

    pub fn is_loading(&self) -> bool {
        self.state.with(|s| s.loading)
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.with(|s| s.is_authenticated())
    }

    pub fn user(&self) -> Option<AuthUser> {
        self.state.with(|s| s.user.clone())
    }

    pub fn set_auth_modal(&self, open: bool) {
        self.dispatch(SessionAction::SetAuthModal(open));
    }

    /// 邮箱密码登录
    ///
    /// 凭据在返回前已写入存储；返回的 `SignedIn` 由调用方在收尾后 `dispatch`，
    /// 因为它会关闭登录弹窗并卸载调用方所在的视图。
    pub async fn sign_in(
        &self,
        client: &AppClient,
        email: String,
        password: String,
    ) -> ApiResult<SessionAction> {
        self.lifecycle()
            .sign_in_with_password(client, email, password)
            .await
    }

    /// 登出，受保护页面的跳转交给守卫
    pub async fn sign_out(&self, client: &AppClient) {
        let action = self.lifecycle().sign_out_remote(client).await;
        self.dispatch(action);
    }
}

/// 从 Context 获取会话上下文
pub fn use_session() -> SessionContext {
    use_context::<SessionContext>().expect("SessionContext should be provided")
}

//! 会话生命周期
//!
//! 唯一有权清除凭据并强制导航的组件。它订阅 `ApiClient` 上报的认证事件，
//! 并把每个决定表达为一个 `SessionAction`，由持有会话状态的一方应用。

use crate::client::{ApiClient, AuthEvent, AuthEventReceiver, Transport};
use crate::error::ApiResult;
use crate::protocol::{LoginRequest, LogoutRequest, MeRequest};
use crate::session::SessionAction;
use crate::storage::{CredentialStore, KeyValueStore};
use crate::{AuthUser, LOGIN_PATH, SessionToken};
use futures::StreamExt;
use std::cell::Cell;
use std::rc::Rc;

/// 整页跳转
pub trait Navigator {
    fn hard_redirect(&self, path: &str);
}

impl<N: Navigator + ?Sized> Navigator for Rc<N> {
    fn hard_redirect(&self, path: &str) {
        (**self).hard_redirect(path)
    }
}

pub struct SessionLifecycle<S: KeyValueStore, N: Navigator> {
    credentials: CredentialStore<S>,
    navigator: N,
    /// 本轮登录期内是否已经发出过跳转
    redirect_issued: Cell<bool>,
}

impl<S: KeyValueStore, N: Navigator> SessionLifecycle<S, N> {
    pub fn new(storage: S, navigator: N) -> Self {
        Self {
            credentials: CredentialStore::new(storage),
            navigator,
            redirect_issued: Cell::new(false),
        }
    }

    pub fn credentials(&self) -> &CredentialStore<S> {
        &self.credentials
    }

    /// 处理一个认证事件
    ///
    /// 401：删除 Token 与用户记录，并跳转到登录页。
    ///
    /// 同一登录期内的多个 401 只跳转一次。没有存储凭据时（例如登录接口本身返回 401）
    /// 不跳转，错误留给调用方展示。
    pub fn handle_event(&self, event: AuthEvent) -> SessionAction {
        match event {
            AuthEvent::Unauthorized { path } => {
                let had_token = self.credentials.clear();
                log::info!(
                    "credentials rejected on {} (token present: {}), tearing down session",
                    path,
                    had_token
                );
                if had_token && !self.redirect_issued.replace(true) {
                    self.navigator.hard_redirect(LOGIN_PATH);
                }
                SessionAction::TornDown
            }
        }
    }

    /// 同步处理通道中已到达的全部事件
    pub fn drain(&self, events: &mut AuthEventReceiver) -> Vec<SessionAction> {
        let mut actions = Vec::new();
        while let Ok(Some(event)) = events.try_next() {
            actions.push(self.handle_event(event));
        }
        actions
    }

    /// 持续监听事件，直到所有发送端被丢弃
    pub async fn run<F>(&self, mut events: AuthEventReceiver, mut apply: F)
    where
        F: FnMut(SessionAction),
    {
        while let Some(event) = events.next().await {
            apply(self.handle_event(event));
        }
        log::debug!("auth event channel closed");
    }

    /// 保存新凭据，并重新允许跳转
    pub fn sign_in(&self, token: SessionToken, user: AuthUser) -> SessionAction {
        if !self.credentials.store(&token, &user) {
            log::warn!("credentials could not be persisted; session lasts for this page only");
        }
        self.redirect_issued.set(false);
        SessionAction::SignedIn {
            user,
            session: token,
        }
    }

    /// 本地登出：只清除凭据，视图由守卫处理
    pub fn sign_out(&self) -> SessionAction {
        self.credentials.clear();
        SessionAction::TornDown
    }

    /// 通知服务端登出（失败只记录日志），再清除本地凭据
    pub async fn sign_out_remote<T: Transport, S2: KeyValueStore>(
        &self,
        client: &ApiClient<T, S2>,
    ) -> SessionAction {
        if self.credentials.token().is_some() {
            if let Err(e) = client.request(&LogoutRequest).await {
                log::warn!("remote sign-out failed: {}", e);
            }
        }
        self.sign_out()
    }

    /// 邮箱密码登录
    pub async fn sign_in_with_password<T: Transport, S2: KeyValueStore>(
        &self,
        client: &ApiClient<T, S2>,
        email: String,
        password: String,
    ) -> ApiResult<SessionAction> {
        let resp = client.request(&LoginRequest { email, password }).await?;
        Ok(self.sign_in(resp.token, resp.user))
    }

    /// 身份解析
    ///
    /// 无论成功与否都会产生 `Resolved`，使加载标志结束：
    /// - 无 Token：匿名，不发请求
    /// - 成功：刷新存储的用户记录
    /// - 401：匿名（凭据清理经由事件通道完成）
    /// - 其他失败：回退到存储的用户记录
    pub async fn resolve_identity<T: Transport, S2: KeyValueStore>(
        &self,
        client: &ApiClient<T, S2>,
    ) -> SessionAction {
        let Some(token) = self.credentials.token() else {
            return SessionAction::Resolved {
                user: None,
                session: None,
            };
        };

        match client.request(&MeRequest).await {
            Ok(user) => {
                self.credentials.store_user(&user);
                SessionAction::Resolved {
                    user: Some(user),
                    session: Some(token),
                }
            }
            Err(e) if e.is_unauthorized() => SessionAction::Resolved {
                user: None,
                session: None,
            },
            Err(e) => {
                log::warn!("identity resolution failed, using stored user record: {}", e);
                let user = self.credentials.user();
                let session = user.as_ref().map(|_| token);
                SessionAction::Resolved { user, session }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::auth_channel;
    use crate::client::tests::MockTransport;
    use crate::error::{ApiError, TransportError};
    use crate::session::SessionState;
    use crate::storage::MemoryStore;
    use crate::{Role, STORAGE_TOKEN_KEY, STORAGE_USER_KEY, UserProfile};
    use serde_json::json;
    use std::cell::RefCell;

    const BASE: &str = "https://api.example.com";

    #[derive(Default)]
    struct RecordingNavigator {
        redirects: RefCell<Vec<String>>,
    }

    impl Navigator for RecordingNavigator {
        fn hard_redirect(&self, path: &str) {
            self.redirects.borrow_mut().push(path.to_string());
        }
    }

    struct Harness {
        storage: MemoryStore,
        transport: Rc<MockTransport>,
        navigator: Rc<RecordingNavigator>,
        client: ApiClient<Rc<MockTransport>, MemoryStore>,
        lifecycle: SessionLifecycle<MemoryStore, Rc<RecordingNavigator>>,
        events: AuthEventReceiver,
    }

    fn harness() -> Harness {
        let storage = MemoryStore::new();
        let transport = Rc::new(MockTransport::new());
        let navigator = Rc::new(RecordingNavigator::default());
        let (tx, rx) = auth_channel();
        Harness {
            client: ApiClient::new(BASE, transport.clone(), storage.clone(), tx),
            lifecycle: SessionLifecycle::new(storage.clone(), navigator.clone()),
            storage,
            transport,
            navigator,
            events: rx,
        }
    }

    fn admin() -> AuthUser {
        AuthUser {
            id: "u1".into(),
            email: "admin@example.com".into(),
            profile: Some(UserProfile {
                role: Role::Admin,
                full_name: Some("Ada".into()),
                avatar_url: None,
            }),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_clears_token_and_redirects_once() {
        let mut h = harness();
        let mut state = SessionState::default()
            .reduce(h.lifecycle.sign_in(SessionToken::from("tok"), admin()));
        h.transport
            .mock_response(&format!("{}/admin/stats", BASE), 401, json!({}));

        let err = h
            .client
            .send::<serde_json::Value>(crate::protocol::HttpMethod::Get, "/admin/stats", None, &[])
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Unauthorized);

        for action in h.lifecycle.drain(&mut h.events) {
            state.apply(action);
        }

        assert!(!h.storage.contains(STORAGE_TOKEN_KEY));
        assert!(!h.storage.contains(STORAGE_USER_KEY));
        assert_eq!(*h.navigator.redirects.borrow(), vec![LOGIN_PATH.to_string()]);
        assert!(state.user.is_none());
        assert!(state.session.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_unauthorized_redirects_once_until_next_sign_in() {
        let mut h = harness();
        h.lifecycle.sign_in(SessionToken::from("tok"), admin());
        h.transport.mock_response(&format!("{}/a", BASE), 401, json!({}));
        h.transport.mock_response(&format!("{}/b", BASE), 401, json!({}));

        let _ = h.client.send::<()>(crate::protocol::HttpMethod::Get, "/a", None, &[]).await;
        let _ = h.client.send::<()>(crate::protocol::HttpMethod::Get, "/b", None, &[]).await;
        assert_eq!(h.lifecycle.drain(&mut h.events).len(), 2);
        assert_eq!(h.navigator.redirects.borrow().len(), 1);

        h.lifecycle.sign_in(SessionToken::from("tok2"), admin());
        let _ = h.client.send::<()>(crate::protocol::HttpMethod::Get, "/a", None, &[]).await;
        h.lifecycle.drain(&mut h.events);
        assert_eq!(h.navigator.redirects.borrow().len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_password_does_not_redirect() {
        let mut h = harness();
        h.transport.mock_response(
            &format!("{}/auth/login", BASE),
            401,
            json!({ "message": "invalid credentials" }),
        );

        let err = h
            .lifecycle
            .sign_in_with_password(&h.client, "a@b.c".into(), "wrong".into())
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(h.lifecycle.drain(&mut h.events), vec![SessionAction::TornDown]);
        assert!(h.navigator.redirects.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_run_applies_actions_until_channel_closes() {
        let storage = MemoryStore::new();
        let navigator = Rc::new(RecordingNavigator::default());
        let lifecycle = SessionLifecycle::new(storage.clone(), navigator.clone());
        lifecycle.sign_in(SessionToken::from("tok"), admin());

        let (tx, rx) = auth_channel();
        tx.unbounded_send(AuthEvent::Unauthorized { path: "/x".into() })
            .unwrap();
        drop(tx);

        let mut applied = Vec::new();
        lifecycle.run(rx, |action| applied.push(action)).await;
        assert_eq!(applied, vec![SessionAction::TornDown]);
        assert!(!storage.contains(STORAGE_TOKEN_KEY));
    }

    #[tokio::test]
    async fn test_resolve_without_token_skips_network() {
        let h = harness();
        let action = h.lifecycle.resolve_identity(&h.client).await;
        assert_eq!(
            action,
            SessionAction::Resolved {
                user: None,
                session: None
            }
        );
        assert!(h.transport.requests.borrow().is_empty());
        assert!(!SessionState::default().reduce(action).loading);
    }

    #[tokio::test]
    async fn test_resolve_with_valid_token_refreshes_user_record() {
        let h = harness();
        h.storage.set(STORAGE_TOKEN_KEY, "tok");
        h.transport.mock_response(
            &format!("{}/auth/me", BASE),
            200,
            serde_json::to_value(admin()).unwrap(),
        );

        let state = SessionState::default().reduce(h.lifecycle.resolve_identity(&h.client).await);
        assert_eq!(state.user, Some(admin()));
        assert_eq!(state.session, Some(SessionToken::from("tok")));
        assert!(!state.loading);
        assert_eq!(h.lifecycle.credentials().user(), Some(admin()));
    }

    #[tokio::test]
    async fn test_resolve_with_rejected_token_is_anonymous() {
        let mut h = harness();
        h.storage.set(STORAGE_TOKEN_KEY, "expired");
        h.transport
            .mock_response(&format!("{}/auth/me", BASE), 401, json!({}));

        let mut state = SessionState::default().reduce(h.lifecycle.resolve_identity(&h.client).await);
        for action in h.lifecycle.drain(&mut h.events) {
            state.apply(action);
        }
        assert!(state.user.is_none());
        assert!(!state.loading);
        assert!(!h.storage.contains(STORAGE_TOKEN_KEY));
        assert_eq!(h.navigator.redirects.borrow().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_stored_user_on_outage() {
        let h = harness();
        h.lifecycle.credentials().store(&SessionToken::from("tok"), &admin());
        h.transport.fail_next(TransportError::Network("offline".into()));

        let state = SessionState::default().reduce(h.lifecycle.resolve_identity(&h.client).await);
        assert_eq!(state.user, Some(admin()));
        assert!(!state.loading);
        assert!(h.storage.contains(STORAGE_TOKEN_KEY));
    }

    #[tokio::test]
    async fn test_password_sign_in_persists_credentials() {
        let h = harness();
        h.transport.mock_response(
            &format!("{}/auth/login", BASE),
            200,
            json!({ "token": "fresh", "user": serde_json::to_value(admin()).unwrap() }),
        );

        let action = h
            .lifecycle
            .sign_in_with_password(&h.client, "admin@example.com".into(), "pw".into())
            .await
            .unwrap();
        assert!(matches!(action, SessionAction::SignedIn { .. }));
        assert_eq!(h.storage.get(STORAGE_TOKEN_KEY).as_deref(), Some("fresh"));

        let body = h.transport.requests.borrow()[0].body.clone().unwrap();
        let body: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(body["email"], "admin@example.com");
    }

    #[tokio::test]
    async fn test_remote_sign_out_clears_even_when_server_fails() {
        let h = harness();
        h.lifecycle.sign_in(SessionToken::from("tok"), admin());
        h.transport
            .mock_response(&format!("{}/auth/logout", BASE), 500, json!({}));

        let action = h.lifecycle.sign_out_remote(&h.client).await;
        assert_eq!(action, SessionAction::TornDown);
        assert!(!h.storage.contains(STORAGE_TOKEN_KEY));
        assert!(h.navigator.redirects.borrow().is_empty());
    }
}

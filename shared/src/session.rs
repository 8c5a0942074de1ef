//! 会话状态模块
//!
//! 只有普通的 setter 与生命周期使用的组合动作，不做派生计算，也不校验传入的值。

use crate::{AuthUser, SessionToken};

/// 会话状态
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub user: Option<AuthUser>,
    pub session: Option<SessionToken>,
    /// 首次身份解析完成前为 `true`
    pub loading: bool,
    /// 登录弹窗是否可见
    pub auth_modal_open: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            user: None,
            session: None,
            loading: true,
            auth_modal_open: false,
        }
    }
}

/// 会话变更动作
#[derive(Debug, Clone, PartialEq)]
pub enum SessionAction {
    SetUser(Option<AuthUser>),
    SetSession(Option<SessionToken>),
    SetLoading(bool),
    SetAuthModal(bool),
    /// 身份解析完成（无论成功与否）
    Resolved {
        user: Option<AuthUser>,
        session: Option<SessionToken>,
    },
    SignedIn {
        user: AuthUser,
        session: SessionToken,
    },
    /// 登出或凭据失效：全部置空
    TornDown,
}

impl SessionState {
    pub fn reduce(mut self, action: SessionAction) -> Self {
        self.apply(action);
        self
    }

    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::SetUser(user) => self.user = user,
            SessionAction::SetSession(session) => self.session = session,
            SessionAction::SetLoading(loading) => self.loading = loading,
            SessionAction::SetAuthModal(open) => self.auth_modal_open = open,
            SessionAction::Resolved { user, session } => {
                self.user = user;
                self.session = session;
                self.loading = false;
            }
            SessionAction::SignedIn { user, session } => {
                self.user = Some(user);
                self.session = Some(session);
                self.loading = false;
                self.auth_modal_open = false;
            }
            // 加载标志只由身份解析结束（或登录）清除
            SessionAction::TornDown => {
                self.user = None;
                self.session = None;
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }
}

//! 授权守卫
//!
//! 守卫是 (会话状态, 请求路径) 的纯函数，每次加载标志或身份变化时重新求值，
//! 不缓存此前的 Granted 结果。角色集合由 `RolePolicy` 提供，守卫本身不持有。

use crate::session::SessionState;
use crate::{LOGIN_PATH, REDIRECT_QUERY_PARAM, Role};
use std::collections::HashSet;
use url::form_urlencoded;

/// 守卫决策
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// 身份尚未解析，渲染阻塞式加载指示
    Pending,
    /// 拒绝访问，跳转到 `redirect_to`
    Denied {
        reason: DenialReason,
        redirect_to: String,
    },
    /// 渲染受保护内容
    Granted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    Anonymous,
    MissingProfile,
    InsufficientRole,
}

/// 角色策略
pub trait RolePolicy {
    fn permits(&self, role: &Role) -> bool;
}

/// 特权角色集合，默认为 admin 与 super-admin
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivilegedRoles {
    roles: HashSet<Role>,
}

impl PrivilegedRoles {
    pub fn new(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            roles: roles.into_iter().collect(),
        }
    }
}

impl Default for PrivilegedRoles {
    fn default() -> Self {
        Self::new([Role::Admin, Role::SuperAdmin])
    }
}

impl RolePolicy for PrivilegedRoles {
    fn permits(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}

/// 访问守卫
#[derive(Debug, Clone, Default)]
pub struct AccessGuard<P: RolePolicy> {
    policy: P,
}

impl<P: RolePolicy> AccessGuard<P> {
    pub fn new(policy: P) -> Self {
        Self { policy }
    }

    /// 对当前会话求值
    ///
    /// # 参数
    /// - `session`: 当前会话状态
    /// - `requested_path`: 用户原本请求的路径（含查询串），拒绝时作为返回目标
    pub fn evaluate(&self, session: &SessionState, requested_path: &str) -> GuardDecision {
        if session.loading {
            return GuardDecision::Pending;
        }

        let reason = match &session.user {
            None => Some(DenialReason::Anonymous),
            Some(user) => match user.role() {
                None => Some(DenialReason::MissingProfile),
                Some(role) if !self.policy.permits(role) => Some(DenialReason::InsufficientRole),
                Some(_) => None,
            },
        };

        match reason {
            None => GuardDecision::Granted,
            Some(reason) => GuardDecision::Denied {
                reason,
                redirect_to: login_redirect(requested_path),
            },
        }
    }
}

/// 构造带返回目标的登录路径
pub fn login_redirect(requested_path: &str) -> String {
    if requested_path.is_empty() || requested_path == "/" {
        return LOGIN_PATH.to_string();
    }
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(REDIRECT_QUERY_PARAM, requested_path)
        .finish();
    format!("{}?{}", LOGIN_PATH, query)
}

/// 从登录页的查询串中取回返回目标
///
/// 只接受站内绝对路径，避免开放重定向。
pub fn redirect_target(query: &str) -> Option<String> {
    form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
        .find(|(k, _)| k == REDIRECT_QUERY_PARAM)
        .map(|(_, v)| v.into_owned())
        .filter(|v| v.starts_with('/') && !v.starts_with("//"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthUser, UserProfile};

    fn session(loading: bool, user: Option<AuthUser>) -> SessionState {
        SessionState {
            user,
            session: None,
            loading,
            auth_modal_open: false,
        }
    }

    fn user_with(role: Option<Role>) -> AuthUser {
        AuthUser {
            id: "u1".into(),
            email: "u1@example.com".into(),
            profile: role.map(|role| UserProfile {
                role,
                full_name: None,
                avatar_url: None,
            }),
        }
    }

    #[test]
    fn test_pending_while_loading_regardless_of_user() {
        let guard = AccessGuard::new(PrivilegedRoles::default());
        assert_eq!(guard.evaluate(&session(true, None), "/admin"), GuardDecision::Pending);
        assert_eq!(
            guard.evaluate(&session(true, Some(user_with(Some(Role::Admin)))), "/admin"),
            GuardDecision::Pending
        );
        assert_eq!(
            guard.evaluate(&session(true, Some(user_with(Some(Role::Student)))), "/admin"),
            GuardDecision::Pending
        );
    }

    #[test]
    fn test_anonymous_redirects_with_return_path() {
        let guard = AccessGuard::new(PrivilegedRoles::default());
        let decision = guard.evaluate(&session(false, None), "/admin/orders?page=2");
        assert_eq!(
            decision,
            GuardDecision::Denied {
                reason: DenialReason::Anonymous,
                redirect_to: "/login?redirect=%2Fadmin%2Forders%3Fpage%3D2".into(),
            }
        );
    }

    #[test]
    fn test_role_check() {
        let guard = AccessGuard::new(PrivilegedRoles::default());
        let denied = guard.evaluate(&session(false, Some(user_with(Some(Role::Student)))), "/admin");
        assert!(matches!(
            denied,
            GuardDecision::Denied {
                reason: DenialReason::InsufficientRole,
                ..
            }
        ));

        let no_profile = guard.evaluate(&session(false, Some(user_with(None))), "/admin");
        assert!(matches!(
            no_profile,
            GuardDecision::Denied {
                reason: DenialReason::MissingProfile,
                ..
            }
        ));

        for role in [Role::Admin, Role::SuperAdmin] {
            assert_eq!(
                guard.evaluate(&session(false, Some(user_with(Some(role)))), "/admin"),
                GuardDecision::Granted
            );
        }
    }

    #[test]
    fn test_identity_change_reruns_check() {
        let guard = AccessGuard::new(PrivilegedRoles::default());
        let mut state = session(false, Some(user_with(Some(Role::Admin))));
        assert_eq!(guard.evaluate(&state, "/admin"), GuardDecision::Granted);

        state.user = Some(user_with(Some(Role::Instructor)));
        assert!(matches!(guard.evaluate(&state, "/admin"), GuardDecision::Denied { .. }));
    }

    #[test]
    fn test_custom_policy() {
        let guard = AccessGuard::new(PrivilegedRoles::new([Role::Instructor]));
        assert_eq!(
            guard.evaluate(&session(false, Some(user_with(Some(Role::Instructor)))), "/studio"),
            GuardDecision::Granted
        );
        assert!(matches!(
            guard.evaluate(&session(false, Some(user_with(Some(Role::Admin)))), "/studio"),
            GuardDecision::Denied { .. }
        ));
    }

    #[test]
    fn test_redirect_target_round_trip_and_rejects_external() {
        let login = login_redirect("/admin?tab=orders");
        let query = login.split_once('?').unwrap().1;
        assert_eq!(redirect_target(query).as_deref(), Some("/admin?tab=orders"));

        assert_eq!(login_redirect("/"), "/login");
        assert!(redirect_target("redirect=https%3A%2F%2Fevil.example").is_none());
        assert!(redirect_target("redirect=%2F%2Fevil.example").is_none());
        assert!(redirect_target("").is_none());
    }
}

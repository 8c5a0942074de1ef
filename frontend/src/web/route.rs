//! 路由定义模块 - 领域模型
//!
//! 这是纯粹的业务逻辑层，不依赖于 DOM 或 web_sys。
//! 定义了应用的所有路由及其属性。

use coursedesk_shared::LOGIN_PATH;
use std::fmt::Display;

/// 应用路由枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppRoute {
    /// 课程目录 (默认路由)
    #[default]
    Catalog,
    /// 购物车
    Cart,
    /// 登录页面
    Login,
    /// 管理面板 (需要特权角色)
    Admin,
    /// 订单列表 (需要特权角色)
    AdminOrders,
    /// 页面未找到
    NotFound,
}

impl AppRoute {
    /// 将 URL path 解析为路由枚举，查询串与末尾斜杠被忽略
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or("/");
        let path = match path.trim_end_matches('/') {
            "" => "/",
            p => p,
        };
        match path {
            "/" | "/courses" => Self::Catalog,
            "/cart" => Self::Cart,
            p if p == LOGIN_PATH => Self::Login,
            "/admin" => Self::Admin,
            "/admin/orders" => Self::AdminOrders,
            _ => Self::NotFound,
        }
    }

    /// 获取路由对应的 URL path
    pub fn to_path(&self) -> &'static str {
        match self {
            Self::Catalog => "/",
            Self::Cart => "/cart",
            Self::Login => LOGIN_PATH,
            Self::Admin => "/admin",
            Self::AdminOrders => "/admin/orders",
            Self::NotFound => "/404",
        }
    }

    /// **核心守卫标记：该路由是否只对特权角色开放**
    pub fn requires_privileged_role(&self) -> bool {
        matches!(self, Self::Admin | Self::AdminOrders)
    }
}

impl Display for AppRoute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(AppRoute::from_path("/"), AppRoute::Catalog);
        assert_eq!(AppRoute::from_path(""), AppRoute::Catalog);
        assert_eq!(AppRoute::from_path("/courses/"), AppRoute::Catalog);
        assert_eq!(AppRoute::from_path("/login?redirect=%2Fadmin"), AppRoute::Login);
        assert_eq!(AppRoute::from_path("/admin/orders?page=2"), AppRoute::AdminOrders);
        assert_eq!(AppRoute::from_path("/admin#stats"), AppRoute::Admin);
        assert_eq!(AppRoute::from_path("/nope"), AppRoute::NotFound);
    }

    #[test]
    fn test_paths_round_trip() {
        for route in [
            AppRoute::Catalog,
            AppRoute::Cart,
            AppRoute::Login,
            AppRoute::Admin,
            AppRoute::AdminOrders,
        ] {
            assert_eq!(AppRoute::from_path(route.to_path()), route);
        }
    }

    #[test]
    fn test_only_admin_routes_are_guarded() {
        assert!(AppRoute::Admin.requires_privileged_role());
        assert!(AppRoute::AdminOrders.requires_privileged_role());
        assert!(!AppRoute::Catalog.requires_privileged_role());
        assert!(!AppRoute::Login.requires_privileged_role());
        assert!(!AppRoute::Cart.requires_privileged_role());
    }
}

//! API 客户端
//!
//! 传输层（`Transport`）只负责把请求发出去；`ApiClient` 在其上附加已存储的 Bearer Token，
//! 并按 HTTP 状态对结果分类。认证失败时客户端不触碰存储，也不做导航，
//! 只通过显式的事件通道上报 `AuthEvent`，由会话生命周期组件决定后续处理。

use crate::error::{ApiError, ApiResult, TransportError};
use crate::protocol::{ApiRequest, HttpMethod};
use crate::storage::{CredentialStore, KeyValueStore};
use crate::HEADER_AUTHORIZATION;
use futures::channel::mpsc::{UnboundedReceiver, UnboundedSender, unbounded};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::rc::Rc;
use url::form_urlencoded;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

/// 通用 HTTP 请求结构
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_body(mut self, body: String) -> Self {
        self.body = Some(body);
        self
    }
}

/// 通用 HTTP 响应结构
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// 传输层特性 (Trait)
///
/// (?Send) 是因为浏览器环境下 fetch 相关类型不是 Send 的
#[async_trait::async_trait(?Send)]
pub trait Transport {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError>;
}

#[async_trait::async_trait(?Send)]
impl<T: Transport + ?Sized> Transport for Rc<T> {
    async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).send(req).await
    }
}

// =========================================================
// 认证事件通道
// =========================================================

/// 传输层上报的认证事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    /// 某个请求收到了 401
    Unauthorized { path: String },
}

pub type AuthEventSender = UnboundedSender<AuthEvent>;
pub type AuthEventReceiver = UnboundedReceiver<AuthEvent>;

/// 创建认证事件通道
pub fn auth_channel() -> (AuthEventSender, AuthEventReceiver) {
    unbounded()
}

// =========================================================
// ApiClient
// =========================================================

/// 远程 API 客户端
///
/// 每次调用只发送一次：没有重试、退避或去重。
#[derive(Debug, Clone)]
pub struct ApiClient<T: Transport, S: KeyValueStore> {
    base_url: String,
    transport: T,
    credentials: CredentialStore<S>,
    events: AuthEventSender,
}

impl<T: Transport, S: KeyValueStore> ApiClient<T, S> {
    pub fn new(base_url: &str, transport: T, storage: S, events: AuthEventSender) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            credentials: CredentialStore::new(storage),
            events,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, query: &[(String, String)]) -> String {
        let mut url = if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        };
        if !query.is_empty() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .finish();
            url.push(if url.contains('?') { '&' } else { '?' });
            url.push_str(&encoded);
        }
        url
    }

    /// 发送类型化请求
    ///
    /// GET/DELETE 请求的字段编码为查询串，其余方法编码为 JSON 请求体。
    pub async fn request<R: ApiRequest>(&self, req: &R) -> ApiResult<R::Response> {
        let value = serde_json::to_value(req).map_err(|e| ApiError::Encode(e.to_string()))?;
        if R::METHOD.uses_query() {
            let query = query_pairs(&value);
            self.send(R::METHOD, R::PATH, None, &query).await
        } else {
            let body = match value {
                Value::Null => None,
                v => Some(v),
            };
            self.send(R::METHOD, R::PATH, body, &[]).await
        }
    }

    /// 发送原始请求
    ///
    /// # 参数
    /// - `method`: HTTP 方法
    /// - `path`: 相对于 base URL 的路径
    /// - `body`: 可选的 JSON 请求体
    /// - `query`: 查询参数
    pub async fn send<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
        query: &[(String, String)],
    ) -> ApiResult<R> {
        let mut req =
            HttpRequest::new(&self.url(path, query), method).with_header("Accept", "application/json");

        if let Some(token) = self.credentials.token() {
            req = req.with_header(HEADER_AUTHORIZATION, &format!("Bearer {}", token.as_str()));
        }
        if let Some(body) = body {
            req = req
                .with_header("Content-Type", "application/json")
                .with_body(body.to_string());
        }

        let resp = self.transport.send(req).await.map_err(|e| {
            log::warn!("{} {} failed before a response arrived: {}", method.as_str(), path, e);
            ApiError::from(e)
        })?;

        self.classify(method, path, resp)
    }

    fn classify<R: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        resp: HttpResponse,
    ) -> ApiResult<R> {
        match resp.status {
            200..=299 => decode(&resp.body),
            401 => {
                log::info!("{} {} rejected with 401", method.as_str(), path);
                let event = AuthEvent::Unauthorized {
                    path: path.to_string(),
                };
                if self.events.unbounded_send(event).is_err() {
                    log::warn!("auth event dropped: no session lifecycle is listening");
                }
                Err(ApiError::Unauthorized)
            }
            403 => {
                let message = error_message(&resp.body);
                log::warn!("{} {} forbidden: {}", method.as_str(), path, message);
                Err(ApiError::Forbidden { message })
            }
            404 => {
                let message = error_message(&resp.body);
                log::warn!("{} {} not found: {}", method.as_str(), path, message);
                Err(ApiError::NotFound { message })
            }
            422 => {
                let errors = serde_json::from_str::<Value>(&resp.body)
                    .map(|v| match v {
                        Value::Object(mut map) => map.remove("errors").unwrap_or(Value::Object(map)),
                        other => other,
                    })
                    .unwrap_or_else(|_| Value::String(resp.body.clone()));
                log::warn!("{} {} validation failed: {}", method.as_str(), path, errors);
                Err(ApiError::Validation { errors })
            }
            status => {
                let message = error_message(&resp.body);
                if status >= 500 {
                    log::error!("{} {} server error [{}]: {}", method.as_str(), path, status, message);
                } else {
                    log::warn!("{} {} responded [{}]: {}", method.as_str(), path, status, message);
                }
                Err(ApiError::Status { status, message })
            }
        }
    }
}

/// 解析 2xx 响应体，空响应体按 `null` 处理
fn decode<R: DeserializeOwned>(body: &str) -> ApiResult<R> {
    let text = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(text).map_err(|e| ApiError::Decode(e.to_string()))
}

/// 从错误响应中提取可读消息
fn error_message(body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(s)) = map.get(key) {
                return s.clone();
            }
        }
    }
    body.chars().take(200).collect()
}

/// 将请求对象展开为查询参数
///
/// `null` 字段被跳过，数组按同名键重复。
fn query_pairs(value: &Value) -> Vec<(String, String)> {
    let Value::Object(map) = value else {
        return Vec::new();
    };
    let mut pairs = Vec::new();
    for (key, v) in map {
        match v {
            Value::Null => {}
            Value::Array(items) => {
                for item in items {
                    if let Some(s) = scalar(item) {
                        pairs.push((key.clone(), s));
                    }
                }
            }
            other => {
                if let Some(s) = scalar(other) {
                    pairs.push((key.clone(), s));
                }
            }
        }
    }
    pairs
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(_) | Value::Number(_) => Some(value.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

// =========================================================
// 测试工具: MockTransport
// =========================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::protocol::{AdminStatsRequest, ListOrdersRequest, LogoutRequest, MeRequest};
    use crate::storage::MemoryStore;
    use crate::{STORAGE_TOKEN_KEY, STORAGE_USER_KEY};
    use serde_json::json;
    use std::cell::RefCell;

    pub struct MockTransport {
        // (URL, (Status, Response Body))
        responses: RefCell<HashMap<String, (u16, String)>>,
        // 记录发出的请求
        pub requests: RefCell<Vec<HttpRequest>>,
        fail_with: RefCell<Option<TransportError>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                responses: RefCell::new(HashMap::new()),
                requests: RefCell::new(Vec::new()),
                fail_with: RefCell::new(None),
            }
        }

        pub fn mock_response(&self, url: &str, status: u16, body: Value) {
            self.responses
                .borrow_mut()
                .insert(url.to_string(), (status, body.to_string()));
        }

        pub fn mock_raw(&self, url: &str, status: u16, body: &str) {
            self.responses
                .borrow_mut()
                .insert(url.to_string(), (status, body.to_string()));
        }

        pub fn fail_next(&self, err: TransportError) {
            *self.fail_with.borrow_mut() = Some(err);
        }
    }

    #[async_trait::async_trait(?Send)]
    impl Transport for MockTransport {
        async fn send(&self, req: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.requests.borrow_mut().push(req.clone());
            if let Some(err) = self.fail_with.borrow_mut().take() {
                return Err(err);
            }
            let responses = self.responses.borrow();
            match responses.get(&req.url) {
                Some((status, body)) => Ok(HttpResponse {
                    status: *status,
                    body: body.clone(),
                }),
                None => Ok(HttpResponse {
                    status: 404,
                    body: "Not Found".to_string(),
                }),
            }
        }
    }

    const BASE: &str = "https://api.example.com";

    fn client(
        storage: &MemoryStore,
    ) -> (
        ApiClient<Rc<MockTransport>, MemoryStore>,
        Rc<MockTransport>,
        AuthEventReceiver,
    ) {
        let transport = Rc::new(MockTransport::new());
        let (tx, rx) = auth_channel();
        let client = ApiClient::new(&format!("{}/", BASE), transport.clone(), storage.clone(), tx);
        (client, transport, rx)
    }

    #[tokio::test]
    async fn test_attaches_bearer_when_token_stored() {
        let storage = MemoryStore::new();
        storage.set(STORAGE_TOKEN_KEY, "abc");
        let (client, transport, _rx) = client(&storage);
        transport.mock_response(
            &format!("{}/auth/me", BASE),
            200,
            json!({ "id": "u1", "email": "a@b.c" }),
        );

        let user = client.request(&MeRequest).await.unwrap();
        assert_eq!(user.id, "u1");

        let reqs = transport.requests.borrow();
        assert_eq!(reqs[0].headers.get("Authorization").map(String::as_str), Some("Bearer abc"));
    }

    #[tokio::test]
    async fn test_no_authorization_header_without_token() {
        let storage = MemoryStore::new();
        let (client, transport, _rx) = client(&storage);
        transport.mock_response(&format!("{}/admin/stats", BASE), 200, json!({
            "totalUsers": 1, "totalCourses": 2, "totalOrders": 3, "totalRevenue": 4
        }));

        let stats = client.request(&AdminStatsRequest).await.unwrap();
        assert_eq!(stats.total_revenue, 4);
        assert!(!transport.requests.borrow()[0].headers.contains_key("Authorization"));
    }

    #[tokio::test]
    async fn test_get_fields_become_query() {
        let storage = MemoryStore::new();
        let (client, transport, _rx) = client(&storage);
        let url = format!("{}/admin/orders?page=2&perPage=5&status=paid", BASE);
        transport.mock_response(&url, 200, json!({ "orders": [], "total": 0, "page": 2 }));

        let req = ListOrdersRequest {
            page: 2,
            per_page: 5,
            status: Some("paid".into()),
        };
        let page = client.request(&req).await.unwrap();
        assert_eq!(page.page, 2);
        assert!(transport.requests.borrow()[0].body.is_none());
    }

    #[tokio::test]
    async fn test_post_with_empty_body_response() {
        let storage = MemoryStore::new();
        let (client, transport, _rx) = client(&storage);
        transport.mock_raw(&format!("{}/auth/logout", BASE), 204, "");

        client.request(&LogoutRequest).await.unwrap();
        let reqs = transport.requests.borrow();
        assert_eq!(reqs[0].method, HttpMethod::Post);
        assert!(reqs[0].body.is_none());
    }

    #[tokio::test]
    async fn test_unauthorized_reports_event_without_touching_storage() {
        let storage = MemoryStore::new();
        storage.set(STORAGE_TOKEN_KEY, "stale");
        storage.set(STORAGE_USER_KEY, "{}");
        let (client, transport, mut rx) = client(&storage);
        transport.mock_response(&format!("{}/auth/me", BASE), 401, json!({ "message": "expired" }));

        let err = client.request(&MeRequest).await.unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(
            rx.try_next().unwrap(),
            Some(AuthEvent::Unauthorized {
                path: "/auth/me".into()
            })
        );
        // 清理凭据是生命周期组件的职责
        assert!(storage.contains(STORAGE_TOKEN_KEY));
        assert!(storage.contains(STORAGE_USER_KEY));
    }

    #[tokio::test]
    async fn test_validation_errors_are_surfaced() {
        let storage = MemoryStore::new();
        let (client, transport, _rx) = client(&storage);
        transport.mock_response(
            &format!("{}/checkout/initialize", BASE),
            422,
            json!({ "errors": { "courseIds": ["must not be empty"] } }),
        );

        let err: ApiError = client
            .send::<Value>(HttpMethod::Post, "/checkout/initialize", Some(json!({})), &[])
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Validation {
                errors: json!({ "courseIds": ["must not be empty"] })
            }
        );
        assert_eq!(err.status(), Some(422));
    }

    #[tokio::test]
    async fn test_other_statuses_propagate_unchanged() {
        let storage = MemoryStore::new();
        storage.set(STORAGE_TOKEN_KEY, "tok");
        let (client, transport, mut rx) = client(&storage);
        transport.mock_response(&format!("{}/a", BASE), 403, json!({ "error": "nope" }));
        transport.mock_response(&format!("{}/b", BASE), 500, json!({ "message": "boom" }));

        let forbidden = client.send::<Value>(HttpMethod::Get, "/a", None, &[]).await;
        assert_eq!(forbidden.unwrap_err(), ApiError::Forbidden { message: "nope".into() });

        let missing = client.send::<Value>(HttpMethod::Get, "/missing", None, &[]).await;
        assert!(matches!(missing.unwrap_err(), ApiError::NotFound { .. }));

        let server = client.send::<Value>(HttpMethod::Get, "/b", None, &[]).await;
        assert_eq!(
            server.unwrap_err(),
            ApiError::Status {
                status: 500,
                message: "boom".into()
            }
        );

        assert!(storage.contains(STORAGE_TOKEN_KEY));
        assert!(rx.try_next().is_err());
    }

    #[tokio::test]
    async fn test_network_and_decode_failures() {
        let storage = MemoryStore::new();
        let (client, transport, _rx) = client(&storage);
        transport.fail_next(TransportError::Network("offline".into()));
        let err = client.request(&MeRequest).await.unwrap_err();
        assert_eq!(err, ApiError::Network(TransportError::Network("offline".into())));
        assert_eq!(err.status(), None);

        transport.mock_raw(&format!("{}/auth/me", BASE), 200, "<html>");
        assert!(matches!(client.request(&MeRequest).await.unwrap_err(), ApiError::Decode(_)));
    }

    #[test]
    fn test_query_pairs_flattening() {
        let pairs = query_pairs(&json!({ "a": null, "b": [1, 2], "c": "x y", "d": true }));
        assert_eq!(
            pairs,
            vec![
                ("b".to_string(), "1".to_string()),
                ("b".to_string(), "2".to_string()),
                ("c".to_string(), "x y".to_string()),
                ("d".to_string(), "true".to_string()),
            ]
        );
        assert!(query_pairs(&Value::Null).is_empty());
    }
}

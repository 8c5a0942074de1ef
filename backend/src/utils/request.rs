use crate::error::{EdgeError, EdgeResult};
use coursedesk_shared::protocol::HttpMethod;
use serde::de::DeserializeOwned;
use worker::{Fetch, Headers, Method, Request, RequestInit, wasm_bindgen};

// 请求结构与前端共用
pub use coursedesk_shared::client::HttpRequest;

#[cfg(test)]
use std::cell::RefCell;
#[cfg(test)]
use std::collections::HashMap;

// =========================================================
// 核心抽象层 (HTTP Interface Abstraction)
// =========================================================

fn worker_method(m: HttpMethod) -> Method {
    match m {
        HttpMethod::Get => Method::Get,
        HttpMethod::Post => Method::Post,
        HttpMethod::Put => Method::Put,
        HttpMethod::Patch => Method::Patch,
        HttpMethod::Delete => Method::Delete,
    }
}

pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> EdgeResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| EdgeError::serialization(e.to_string()).with_source(e))
    }
}

#[async_trait::async_trait(?Send)]
pub trait HttpClient {
    async fn send(&self, req: HttpRequest) -> EdgeResult<HttpResponse>;
}

#[async_trait::async_trait(?Send)]
impl<'a, C: HttpClient + ?Sized> HttpClient for &'a C {
    async fn send(&self, req: HttpRequest) -> EdgeResult<HttpResponse> {
        (**self).send(req).await
    }
}

// =========================================================
// 实现层: Worker 客户端
// =========================================================

/// 基于 `worker::Fetch` 的客户端，每个请求只发送一次
#[derive(Clone)]
pub struct WorkerHttpClient;

#[async_trait::async_trait(?Send)]
impl HttpClient for WorkerHttpClient {
    async fn send(&self, req: HttpRequest) -> EdgeResult<HttpResponse> {
        let headers = Headers::new();
        for (k, v) in &req.headers {
            headers.set(k, v)?;
        }

        let mut init = RequestInit {
            method: worker_method(req.method),
            headers,
            ..Default::default()
        };

        if let Some(body_str) = &req.body {
            init.body = Some(wasm_bindgen::JsValue::from_str(body_str));
        }

        let worker_req = Request::new_with_init(&req.url, &init)?;
        let mut response = Fetch::Request(worker_req).send().await?;

        Ok(HttpResponse {
            status: response.status_code(),
            body: response.text().await?,
        })
    }
}

// =========================================================
// 测试工具: MockHttpClient
// =========================================================

#[cfg(test)]
pub struct MockHttpClient {
    // (URL, (Status, Response Body))
    responses: RefCell<HashMap<String, (u16, String)>>,
    // 记录发出的请求
    pub requests: RefCell<Vec<HttpRequest>>,
    fail_with: RefCell<Option<String>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            responses: RefCell::new(HashMap::new()),
            requests: RefCell::new(Vec::new()),
            fail_with: RefCell::new(None),
        }
    }

    pub fn mock_response(&self, url: &str, status: u16, body: serde_json::Value) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), (status, body.to_string()));
    }

    pub fn mock_raw(&self, url: &str, status: u16, body: &str) {
        self.responses
            .borrow_mut()
            .insert(url.to_string(), (status, body.to_string()));
    }

    /// 下一次请求以网络错误失败
    pub fn fail_next(&self, message: &str) {
        *self.fail_with.borrow_mut() = Some(message.to_string());
    }
}

#[cfg(test)]
#[async_trait::async_trait(?Send)]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> EdgeResult<HttpResponse> {
        self.requests.borrow_mut().push(req.clone());

        if let Some(message) = self.fail_with.borrow_mut().take() {
            return Err(EdgeError::upstream(message));
        }

        let responses = self.responses.borrow();
        if let Some((status, body)) = responses.get(&req.url) {
            Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            })
        } else {
            Ok(HttpResponse {
                status: 404,
                body: "Not Found".to_string(),
            })
        }
    }
}

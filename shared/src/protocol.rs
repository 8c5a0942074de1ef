use crate::{AuthUser, CourseId, CourseSummary, Price, SessionToken};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether request fields travel in the query string rather than a JSON body.
    pub fn uses_query(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response: DeserializeOwned;
    /// The URL path, relative to the API base URL.
    const PATH: &'static str;
    /// The HTTP method.
    const METHOD: HttpMethod;
}

// =========================================================
// Auth
// =========================================================

/// Resolve the identity behind the stored token.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeRequest;

impl ApiRequest for MeRequest {
    type Response = AuthUser;
    const PATH: &'static str = "/auth/me";
    const METHOD: HttpMethod = HttpMethod::Get;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: SessionToken,
    pub user: AuthUser,
}

impl ApiRequest for LoginRequest {
    type Response = LoginResponse;
    const PATH: &'static str = "/auth/login";
    const METHOD: HttpMethod = HttpMethod::Post;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutRequest;

impl ApiRequest for LogoutRequest {
    type Response = ();
    const PATH: &'static str = "/auth/logout";
    const METHOD: HttpMethod = HttpMethod::Post;
}

// =========================================================
// Catalog & checkout
// =========================================================

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ListCoursesRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl ApiRequest for ListCoursesRequest {
    type Response = Vec<CourseSummary>;
    const PATH: &'static str = "/courses";
    const METHOD: HttpMethod = HttpMethod::Get;
}

/// Start a payment for the courses currently in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiateCheckoutRequest {
    pub course_ids: Vec<CourseId>,
    /// Amount the client expects to be charged; the API recomputes it.
    pub amount: Price,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub reference: String,
    pub authorization_url: String,
}

impl ApiRequest for InitiateCheckoutRequest {
    type Response = CheckoutSession;
    const PATH: &'static str = "/checkout/initialize";
    const METHOD: HttpMethod = HttpMethod::Post;
}

// =========================================================
// Admin
// =========================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminStatsRequest;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_users: u64,
    pub total_courses: u64,
    pub total_orders: u64,
    pub total_revenue: Price,
}

impl ApiRequest for AdminStatsRequest {
    type Response = AdminStats;
    const PATH: &'static str = "/admin/stats";
    const METHOD: HttpMethod = HttpMethod::Get;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOrdersRequest {
    pub page: u32,
    pub per_page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Default for ListOrdersRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 20,
            status: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: String,
    pub reference: String,
    pub customer_email: String,
    pub amount: Price,
    pub status: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPage {
    pub orders: Vec<OrderSummary>,
    pub total: u64,
    pub page: u32,
}

impl ApiRequest for ListOrdersRequest {
    type Response = OrderPage;
    const PATH: &'static str = "/admin/orders";
    const METHOD: HttpMethod = HttpMethod::Get;
}

// =========================================================
// Payment key edge function
// =========================================================

/// Public key of the active payment gateway, as returned by the edge function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentKeyResponse {
    pub public_key: String,
}

/// Error body returned by the edge function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeErrorBody {
    pub error: String,
}

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    HEAD,
    OPTIONS,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::GET => "GET",
            HttpMethod::POST => "POST",
            HttpMethod::PUT => "PUT",
            HttpMethod::DELETE => "DELETE",
            HttpMethod::PATCH => "PATCH",
            HttpMethod::HEAD => "HEAD",
            HttpMethod::OPTIONS => "OPTIONS",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for hyper::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::GET => hyper::Method::GET,
            HttpMethod::POST => hyper::Method::POST,
            HttpMethod::PUT => hyper::Method::PUT,
            HttpMethod::DELETE => hyper::Method::DELETE,
            HttpMethod::PATCH => hyper::Method::PATCH,
            HttpMethod::HEAD => hyper::Method::HEAD,
            HttpMethod::OPTIONS => hyper::Method::OPTIONS,
        }
    }
}

/// Which synthesis routine produces the parameters of a request.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Paginated listing: `page` and `limit`.
    List,
    /// Free-text search: `q` and `limit`.
    Search,
    /// Category browse: `category`.
    Category,
    /// Credential POST.
    Login,
    /// Order creation POST.
    CreateOrder,
    /// Payment POST.
    Payment,
    /// No synthesized parameters.
    Generic,
}

/// One weighted entry of the workload catalog, with its URL already resolved
/// against the target.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointDescriptor {
    pub name: String,
    pub url: String,
    pub method: HttpMethod,
    pub weight: u32,
    pub scenario: ScenarioKind,
}

/// Endpoint entry as written in an endpoints file. `path` is relative to the
/// target URL; the weight is signed so that bad values are reported instead
/// of failing deserialization.
#[derive(Debug, Deserialize, Clone)]
pub struct EndpointSpec {
    pub name: String,

    #[serde(default)]
    pub path: String,

    #[serde(default = "default_method")]
    pub method: HttpMethod,

    pub weight: i64,

    #[serde(default = "default_scenario")]
    pub scenario: ScenarioKind,
}

fn default_method() -> HttpMethod {
    HttpMethod::GET
}

fn default_scenario() -> ScenarioKind {
    ScenarioKind::Generic
}

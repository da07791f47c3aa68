//! Weighted endpoint catalog and request synthesis.
//!
//! The catalog is read-only once built. Workers share it through an `Arc` and
//! bring their own random source, so draws need no synchronization.

mod vocabulary;

pub use vocabulary::ScenarioVocabulary;

use rand::seq::SliceRandom;
use rand::Rng;
use serde_json::json;
use std::path::Path;
use url::Url;

use crate::client::SynthesizedRequest;
use crate::error::{ConfigurationError, SynthesisError};
use crate::models::{EndpointDescriptor, EndpointSpec, HttpMethod, ScenarioKind};

const PAGE_SIZE: &str = "20";

#[derive(Debug, Clone)]
pub struct WorkloadCatalog {
    endpoints: Vec<EndpointDescriptor>,
    total_weight: u64,
    vocabulary: ScenarioVocabulary,
}

impl WorkloadCatalog {
    pub fn new(
        endpoints: Vec<EndpointDescriptor>,
        vocabulary: ScenarioVocabulary,
    ) -> Result<Self, ConfigurationError> {
        if let Some(bad) = endpoints.iter().find(|e| e.weight == 0) {
            return Err(ConfigurationError::InvalidWeight {
                name: bad.name.clone(),
                weight: 0,
            });
        }

        for endpoint in &endpoints {
            check_endpoint_url(endpoint)?;
        }

        let total_weight: u64 = endpoints.iter().map(|e| u64::from(e.weight)).sum();
        if total_weight == 0 {
            return Err(ConfigurationError::ZeroWeightSum);
        }

        Ok(Self {
            endpoints,
            total_weight,
            vocabulary,
        })
    }

    /// Skips URL checks so request-time synthesis faults can be exercised.
    #[cfg(test)]
    pub(crate) fn new_unchecked(endpoints: Vec<EndpointDescriptor>) -> Self {
        let total_weight = endpoints.iter().map(|e| u64::from(e.weight)).sum();
        Self {
            endpoints,
            total_weight,
            vocabulary: ScenarioVocabulary::default(),
        }
    }

    /// Builds a catalog from endpoint specs whose paths are resolved under
    /// `base_url`. A leading `/` on a path is optional.
    pub fn from_specs(base_url: &Url, specs: Vec<EndpointSpec>) -> Result<Self, ConfigurationError> {
        let root = endpoint_root(base_url);
        let mut endpoints = Vec::with_capacity(specs.len());

        for spec in specs {
            let weight = u32::try_from(spec.weight)
                .ok()
                .filter(|w| *w >= 1)
                .ok_or_else(|| ConfigurationError::InvalidWeight {
                    name: spec.name.clone(),
                    weight: spec.weight,
                })?;

            endpoints.push(EndpointDescriptor {
                url: resolve_path(&root, &spec.name, &spec.path)?,
                name: spec.name,
                method: spec.method,
                weight,
                scenario: spec.scenario,
            });
        }

        Self::new(endpoints, ScenarioVocabulary::default())
    }

    /// Loads endpoint specs from a JSON array file.
    pub fn from_file(base_url: &Url, path: &Path) -> Result<Self, ConfigurationError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigurationError::EndpointsFile {
            path: path.to_path_buf(),
            source,
        })?;
        let specs: Vec<EndpointSpec> = serde_json::from_str(&raw)?;
        Self::from_specs(base_url, specs)
    }

    /// The e-commerce traffic mix used when no endpoints file is given.
    pub fn default_mix(base_url: &Url) -> Result<Self, ConfigurationError> {
        use HttpMethod::{GET, POST};
        use ScenarioKind::*;

        let entry = |name: &str, path: &str, method, weight, scenario| EndpointSpec {
            name: name.to_string(),
            path: path.to_string(),
            method,
            weight,
            scenario,
        };

        let specs = vec![
            // Homepage and static content
            entry("homepage", "", GET, 15, Generic),
            // Catalog browsing
            entry("products_list", "/api/v1/products", GET, 20, List),
            entry("categories", "/api/v1/products/categories", GET, 8, Category),
            entry("featured_products", "/api/v1/products/featured", GET, 7, List),
            // Search
            entry("product_search", "/api/v1/products/search", GET, 15, Search),
            entry("search_suggestions", "/api/v1/products/search/suggestions", GET, 10, Search),
            // Users
            entry("user_login", "/api/v1/auth/login", POST, 8, Login),
            entry("user_profile", "/api/v1/users/profile", GET, 4, Generic),
            entry("user_preferences", "/api/v1/users/preferences", GET, 3, Generic),
            // Orders
            entry("orders_list", "/api/v1/orders", GET, 4, Generic),
            entry("create_order", "/api/v1/orders", POST, 2, CreateOrder),
            entry("cart_view", "/api/v1/cart", GET, 1, Generic),
            // Payments
            entry("payment_methods", "/api/v1/payments/methods", GET, 2, Generic),
            entry("process_payment", "/api/v1/payments/process", POST, 1, Payment),
        ];

        Self::from_specs(base_url, specs)
    }

    pub fn endpoints(&self) -> &[EndpointDescriptor] {
        &self.endpoints
    }

    pub fn total_weight(&self) -> u64 {
        self.total_weight
    }

    /// Weighted draw: a uniform value in `[1, total_weight]` picks the first
    /// endpoint whose cumulative weight reaches it.
    pub fn select_endpoint<R: Rng + ?Sized>(&self, rng: &mut R) -> &EndpointDescriptor {
        let draw = rng.gen_range(1..=self.total_weight);
        let mut cumulative = 0u64;

        for endpoint in &self.endpoints {
            cumulative += u64::from(endpoint.weight);
            if draw <= cumulative {
                return endpoint;
            }
        }

        // Unreachable while total_weight is the exact sum of weights.
        &self.endpoints[self.endpoints.len() - 1]
    }

    /// Resolves URL, headers and body for one request to `endpoint`.
    pub fn generate_request<R: Rng + ?Sized>(
        &self,
        endpoint: &EndpointDescriptor,
        rng: &mut R,
    ) -> Result<SynthesizedRequest, SynthesisError> {
        let mut url = Url::parse(&endpoint.url).map_err(|source| SynthesisError::InvalidUrl {
            name: endpoint.name.clone(),
            url: endpoint.url.clone(),
            source,
        })?;
        let vocab = &self.vocabulary;
        let mut body = None;

        match endpoint.scenario {
            ScenarioKind::List => {
                let page = rng.gen_range(1..=10).to_string();
                url.query_pairs_mut()
                    .append_pair("page", &page)
                    .append_pair("limit", PAGE_SIZE);
            }
            ScenarioKind::Search => {
                if let Some(term) = vocab.search_terms.choose(rng) {
                    url.query_pairs_mut()
                        .append_pair("q", term)
                        .append_pair("limit", PAGE_SIZE);
                }
            }
            ScenarioKind::Category => {
                if let Some(category) = vocab.categories.choose(rng) {
                    url.query_pairs_mut().append_pair("category", category);
                }
            }
            ScenarioKind::Login => {
                body = Some(json!({
                    "email": format!("user{}@example.com", rng.gen_range(1..=1000)),
                    "password": "password123",
                }));
            }
            ScenarioKind::CreateOrder => {
                body = Some(json!({
                    "items": [{
                        "productId": format!("product_{}", rng.gen_range(1..=500)),
                        "quantity": rng.gen_range(1..=3),
                        "price": rng.gen_range(10..=500),
                    }],
                    "shippingAddress": {
                        "street": "123 Test Street",
                        "city": "Test City",
                        "state": "TS",
                        "zipCode": "12345",
                    },
                }));
            }
            ScenarioKind::Payment => {
                body = Some(json!({
                    "amount": rng.gen_range(10..=500),
                    "currency": "USD",
                    "method": "credit_card",
                    "cardToken": format!("tok_test_{}", rng.gen_range(100000..=999999)),
                }));
            }
            ScenarioKind::Generic => {}
        }

        let mut headers = Vec::with_capacity(2);
        if let Some(agent) = vocab.user_agents.choose(rng) {
            headers.push(("user-agent", agent.to_string()));
        }

        let body = match body {
            Some(value) => {
                headers.push(("content-type", "application/json".to_string()));
                Some(serde_json::to_vec(&value)?)
            }
            None => None,
        };

        Ok(SynthesizedRequest {
            method: endpoint.method,
            url: url.to_string(),
            headers,
            body,
        })
    }
}

/// The target URL as a directory: no query or fragment, path ending in `/`.
fn endpoint_root(base_url: &Url) -> Url {
    let mut root = base_url.clone();
    root.set_query(None);
    root.set_fragment(None);
    if !root.path().ends_with('/') {
        let dir = format!("{}/", root.path());
        root.set_path(&dir);
    }
    root
}

fn resolve_path(root: &Url, name: &str, path: &str) -> Result<String, ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidEndpointUrl {
        name: name.to_string(),
        url: path.to_string(),
        reason,
    };

    let resolved = root
        .join(path.trim_start_matches('/'))
        .map_err(|e| invalid(e.to_string()))?;
    if resolved.origin() != root.origin() {
        return Err(invalid(format!(
            "resolves outside the target {}",
            root.origin().ascii_serialization()
        )));
    }
    Ok(resolved.to_string())
}

fn check_endpoint_url(endpoint: &EndpointDescriptor) -> Result<(), ConfigurationError> {
    let invalid = |reason: String| ConfigurationError::InvalidEndpointUrl {
        name: endpoint.name.clone(),
        url: endpoint.url.clone(),
        reason,
    };

    let url = Url::parse(&endpoint.url).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(()),
        "http" | "https" => Err(invalid("missing host".to_string())),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

pub mod cart;
pub mod checkout;
pub mod currency;
pub mod product;
pub mod shipping;

pub use cart::CartService;
pub use checkout::CheckoutService;
pub use currency::CurrencyService;
pub use product::ProductService;
pub use shipping::ShippingService;

use opentelemetry::baggage::BaggageExt;
use opentelemetry::{Context, KeyValue};
use url::Url;

use crate::error::{CoreResult, ShopError};
use crate::http_client::HttpClient;
use crate::state::SessionManager;
use crate::telemetry::{KEY_SESSION_ID, Telemetry};

/// Everything a service needs to reach the shop API.
/// Built once and cloned into each service. Spans are started with the
/// same `Telemetry` the HTTP client injects headers with.
#[derive(Debug, Clone)]
pub struct ApiContext {
    base: Url,
    http: HttpClient,
    telemetry: Telemetry,
    session: SessionManager,
}

impl ApiContext {
    pub fn new(base_url: &str, http: HttpClient, session: SessionManager) -> CoreResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| ShopError::Validation(format!("invalid base url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ShopError::Validation(format!(
                "base url '{base_url}' cannot carry a path"
            )));
        }
        let telemetry = http.telemetry().clone();
        Ok(Self {
            base,
            http,
            telemetry,
            session,
        })
    }

    #[cfg(test)]
    pub fn new_for_tests(base_url: &str, telemetry: Telemetry, session: SessionManager) -> Self {
        let http = HttpClient::new_default(telemetry).unwrap();
        Self::new(base_url, http, session).unwrap()
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// `base` + path `segments` (each percent-encoded) + `query` pairs.
    pub fn endpoint(&self, segments: &[&str], query: &[(&str, &str)]) -> CoreResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ShopError::Validation(format!("base url '{}' cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url)
    }

    /// Child of `parent` carrying `session.id` baggage.
    pub fn with_session(&self, parent: &Context, session_id: &str) -> Context {
        parent.with_baggage([KeyValue::new(KEY_SESSION_ID, session_id.to_string())])
    }
}

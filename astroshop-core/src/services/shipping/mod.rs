use async_trait::async_trait;
use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};

use crate::api::ShippingApi;
use crate::error::CoreResult;
use crate::http_client::RequestSpec;
use crate::model::{Address, CartItem, Money};
use crate::services::ApiContext;
use crate::telemetry::{
    KEY_CART_ITEMS_COUNT, KEY_SHIPPING_COST_CURRENCY, KEY_SHIPPING_COST_UNITS,
    SPAN_SHIPPING_QUOTE, traced,
};

#[derive(Debug, Clone)]
pub struct ShippingService {
    api: ApiContext,
}

impl ShippingService {
    pub fn new(api: ApiContext) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ShippingApi for ShippingService {
    async fn get_shipping_cost(
        &self,
        items: &[CartItem],
        address: &Address,
        currency_code: &str,
        parent: &Context,
    ) -> CoreResult<Money> {
        let session = self.api.session().session_id();
        // The quote endpoint takes its inputs as JSON-encoded query values.
        let item_list = serde_json::to_string(items)?;
        let address_json = serde_json::to_string(address)?;
        let url = self.api.endpoint(
            &["shipping"],
            &[
                ("itemList", item_list.as_str()),
                ("currencyCode", currency_code),
                ("address", address_json.as_str()),
            ],
        )?;
        let parent = self.api.with_session(parent, &session);
        let item_count = items.len() as i64;

        traced(
            self.api.telemetry(),
            &parent,
            SPAN_SHIPPING_QUOTE,
            |cost: &Money| {
                vec![
                    KeyValue::new(KEY_SHIPPING_COST_UNITS, cost.units),
                    KeyValue::new(KEY_SHIPPING_COST_CURRENCY, cost.currency_code.clone()),
                ]
            },
            |cx| async move {
                cx.span()
                    .set_attribute(KeyValue::new(KEY_CART_ITEMS_COUNT, item_count));
                self.api
                    .http()
                    .execute_json::<Money>(RequestSpec::get(url), &cx)
                    .await
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShopError;
    use crate::state::SessionManager;
    use crate::telemetry::Telemetry;
    use crate::telemetry::testing::{attr, install_capture};
    use httpmock::Method::GET;
    use httpmock::MockServer;
    use opentelemetry::trace::Status;
    use serde_json::json;

    fn service(server: &MockServer, telemetry: Telemetry) -> ShippingService {
        ShippingService::new(ApiContext::new_for_tests(
            &server.base_url(),
            telemetry,
            SessionManager::with_id("sess-1"),
        ))
    }

    fn address() -> Address {
        Address {
            street_address: "1600 Amphitheatre Parkway".into(),
            city: "Mountain View".into(),
            state: "CA".into(),
            country: "United States".into(),
            zip_code: "94043".into(),
        }
    }

    #[tokio::test]
    async fn quote_sends_json_query_and_records_cost() {
        let server = MockServer::start();
        let items = vec![CartItem::new("OLJCESPC7Z", 2)];
        let expected_items = serde_json::to_string(&items).unwrap();
        let expected_address = serde_json::to_string(&address()).unwrap();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/shipping")
                .query_param("itemList", expected_items.as_str())
                .query_param("currencyCode", "EUR")
                .query_param("address", expected_address.as_str());
            then.status(200)
                .json_body(json!({"currencyCode": "EUR", "units": 8, "nanos": 990000000}));
        });

        let (telemetry, capture) = install_capture();
        let cost = service(&server, telemetry)
            .get_shipping_cost(&items, &address(), "EUR", &Context::new())
            .await
            .expect("quote ok");
        m.assert();
        assert_eq!(cost, Money::new("EUR", 8, 990_000_000));

        let span = capture.single(SPAN_SHIPPING_QUOTE);
        assert_eq!(span.status, Status::Unset);
        assert_eq!(attr(&span, KEY_SHIPPING_COST_UNITS).unwrap().as_str(), "8");
        assert_eq!(
            attr(&span, KEY_SHIPPING_COST_CURRENCY).unwrap().as_str(),
            "EUR"
        );
        assert_eq!(attr(&span, KEY_CART_ITEMS_COUNT).unwrap().as_str(), "1");
    }

    #[tokio::test]
    async fn quote_failure_marks_span() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/shipping");
            then.status(502).body("upstream quote service unavailable");
        });

        let (telemetry, capture) = install_capture();
        let err = service(&server, telemetry)
            .get_shipping_cost(&[], &address(), "USD", &Context::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ShopError::HttpStatus { status: 502, .. }));
        let span = capture.single(SPAN_SHIPPING_QUOTE);
        assert!(matches!(span.status, Status::Error { .. }));
        assert!(attr(&span, KEY_SHIPPING_COST_UNITS).is_none());
    }
}

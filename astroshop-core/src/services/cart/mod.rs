use async_trait::async_trait;
use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};
use tracing::debug;

use crate::api::CartApi;
use crate::error::CoreResult;
use crate::http_client::RequestSpec;
use crate::model::{AddItemRequest, CartItem, ServerCart};
use crate::services::ApiContext;
use crate::telemetry::{
    KEY_CART_ITEMS_COUNT, KEY_CART_NOT_FOUND, KEY_CART_TOTAL_QUANTITY, KEY_PRODUCT_ID,
    KEY_PRODUCT_QUANTITY, KEY_SESSION_ID, SPAN_CART_ADD_ITEM, SPAN_CART_EMPTY, SPAN_CART_GET,
    traced,
};

/// Cart endpoints, keyed by the current session id.
#[derive(Debug, Clone)]
pub struct CartService {
    api: ApiContext,
}

impl CartService {
    pub fn new(api: ApiContext) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CartApi for CartService {
    async fn get_cart(&self, parent: &Context) -> CoreResult<ServerCart> {
        let session = self.api.session().session_id();
        let url = self.api.endpoint(&["cart"], &[("sessionId", session.as_str())])?;
        let parent = self.api.with_session(parent, &session);

        traced(
            self.api.telemetry(),
            &parent,
            SPAN_CART_GET,
            |cart: &ServerCart| {
                vec![
                    KeyValue::new(KEY_CART_ITEMS_COUNT, cart.items.len() as i64),
                    KeyValue::new(KEY_CART_TOTAL_QUANTITY, cart.total_item_count()),
                ]
            },
            |cx| async move {
                cx.span()
                    .set_attribute(KeyValue::new(KEY_SESSION_ID, session.to_string()));
                match self
                    .api
                    .http()
                    .execute_json::<ServerCart>(RequestSpec::get(url), &cx)
                    .await
                {
                    // A fresh session has no cart on the server yet.
                    Err(e) if e.is_not_found() => {
                        debug!(session_id = %session, "no cart for session, treating as empty");
                        cx.span().set_attribute(KeyValue::new(KEY_CART_NOT_FOUND, true));
                        Ok(ServerCart::default())
                    }
                    other => other,
                }
            },
        )
        .await
    }

    async fn add_item(&self, product_id: &str, quantity: i32, parent: &Context) -> CoreResult<()> {
        let session = self.api.session().session_id();
        let url = self.api.endpoint(&["cart"], &[("sessionId", session.as_str())])?;
        let body = AddItemRequest {
            user_id: session.to_string(),
            item: CartItem::new(product_id, quantity),
        };
        let req = RequestSpec::post_json(url, &body)?;
        let parent = self.api.with_session(parent, &session);

        traced(
            self.api.telemetry(),
            &parent,
            SPAN_CART_ADD_ITEM,
            |_: &()| vec![],
            |cx| async move {
                cx.span().set_attributes([
                    KeyValue::new(KEY_SESSION_ID, session.to_string()),
                    KeyValue::new(KEY_PRODUCT_ID, product_id.to_string()),
                    KeyValue::new(KEY_PRODUCT_QUANTITY, i64::from(quantity)),
                ]);
                self.api.http().execute(req, &cx).await?;
                Ok(())
            },
        )
        .await
    }

    async fn empty_cart(&self, parent: &Context) -> CoreResult<()> {
        let session = self.api.session().session_id();
        let url = self.api.endpoint(&["cart"], &[("sessionId", session.as_str())])?;
        let parent = self.api.with_session(parent, &session);

        traced(
            self.api.telemetry(),
            &parent,
            SPAN_CART_EMPTY,
            |_: &()| vec![],
            |cx| async move {
                cx.span()
                    .set_attribute(KeyValue::new(KEY_SESSION_ID, session.to_string()));
                self.api.http().execute(RequestSpec::delete(url), &cx).await?;
                Ok(())
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
    use httpmock::Method::{DELETE, GET, POST};
    use httpmock::MockServer;
    use opentelemetry::trace::Status;
    use serde_json::json;

    fn service(server: &MockServer, telemetry: Telemetry) -> CartService {
        CartService::new(ApiContext::new_for_tests(
            &server.base_url(),
            telemetry,
            SessionManager::with_id("sess-1"),
        ))
    }

    #[tokio::test]
    async fn get_cart_parses_items_and_records_counts() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(GET)
                .path("/cart")
                .query_param("sessionId", "sess-1")
                .header_exists("traceparent")
                .header("baggage", "session.id=sess-1");
            then.status(200).json_body(json!({
                "userId": "sess-1",
                "items": [
                    {"productId": "p1", "quantity": 2},
                    {"productId": "p2", "quantity": 3}
                ]
            }));
        });

        let (telemetry, capture) = install_capture();
        let cart = service(&server, telemetry)
            .get_cart(&Context::new())
            .await
            .expect("cart ok");
        m.assert();
        assert_eq!(cart.total_item_count(), 5);
        assert_eq!(cart.items[0], CartItem::new("p1", 2));

        let span = capture.single(SPAN_CART_GET);
        assert_eq!(span.status, Status::Unset);
        assert_eq!(attr(&span, KEY_CART_ITEMS_COUNT).unwrap().as_str(), "2");
        assert_eq!(attr(&span, KEY_CART_TOTAL_QUANTITY).unwrap().as_str(), "5");
        assert_eq!(attr(&span, KEY_SESSION_ID).unwrap().as_str(), "sess-1");
    }

    #[tokio::test]
    async fn get_cart_404_is_empty_cart() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/cart");
            then.status(404).body("cart not found");
        });

        let (telemetry, capture) = install_capture();
        let cart = service(&server, telemetry)
            .get_cart(&Context::new())
            .await
            .expect("404 means empty");
        assert!(cart.items.is_empty());
        assert_eq!(cart.total_item_count(), 0);

        let span = capture.single(SPAN_CART_GET);
        assert_eq!(span.status, Status::Unset);
        assert_eq!(attr(&span, KEY_CART_NOT_FOUND).unwrap().as_str(), "true");
    }

    #[tokio::test]
    async fn get_cart_500_is_error_on_span_and_caller() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(GET).path("/cart");
            then.status(500).body("redis down");
        });

        let (telemetry, capture) = install_capture();
        let err = service(&server, telemetry)
            .get_cart(&Context::new())
            .await
            .unwrap_err();
        match err {
            ShopError::HttpStatus { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "redis down");
            }
            other => panic!("expected HttpStatus, got {other:?}"),
        }
        let span = capture.single(SPAN_CART_GET);
        assert!(matches!(span.status, Status::Error { .. }));
    }

    #[tokio::test]
    async fn add_item_posts_session_and_item() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(POST)
                .path("/cart")
                .query_param("sessionId", "sess-1")
                .json_body(json!({
                    "userId": "sess-1",
                    "item": {"productId": "OLJCESPC7Z", "quantity": 3}
                }));
            then.status(200).json_body(json!({}));
        });

        let (telemetry, capture) = install_capture();
        service(&server, telemetry)
            .add_item("OLJCESPC7Z", 3, &Context::new())
            .await
            .expect("add ok");
        m.assert();

        let span = capture.single(SPAN_CART_ADD_ITEM);
        assert_eq!(attr(&span, KEY_PRODUCT_ID).unwrap().as_str(), "OLJCESPC7Z");
        assert_eq!(attr(&span, KEY_PRODUCT_QUANTITY).unwrap().as_str(), "3");
    }

    #[tokio::test]
    async fn add_item_404_is_not_swallowed() {
        let server = MockServer::start();
        let _m = server.mock(|when, then| {
            when.method(POST).path("/cart");
            then.status(404).body("no such product");
        });

        let err = service(&server, Telemetry::noop())
            .add_item("missing", 1, &Context::new())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn empty_cart_sends_delete() {
        let server = MockServer::start();
        let m = server.mock(|when, then| {
            when.method(DELETE).path("/cart").query_param("sessionId", "sess-1");
            then.status(204);
        });

        let (telemetry, capture) = install_capture();
        service(&server, telemetry)
            .empty_cart(&Context::new())
            .await
            .expect("empty ok");
        m.assert();
        assert_eq!(capture.named(SPAN_CART_EMPTY).len(), 1);
    }
}

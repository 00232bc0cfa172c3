use async_trait::async_trait;
use opentelemetry::trace::TraceContextExt;
use opentelemetry::{Context, KeyValue};
use tracing::info;

use crate::api::CheckoutApi;
use crate::error::CoreResult;
use crate::http_client::RequestSpec;
use crate::model::{CheckoutRequest, CheckoutResponse};
use crate::services::ApiContext;
use crate::telemetry::{
    KEY_ORDER_ID, KEY_ORDER_ITEMS_COUNT, KEY_SESSION_ID, KEY_SHIPPING_TRACKING_ID,
    KEY_USER_CURRENCY, SPAN_CHECKOUT_PLACE_ORDER, traced,
};

/// Places orders. The request already names the user; the session is only
/// used for baggage so downstream services can correlate.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    api: ApiContext,
}

impl CheckoutService {
    pub fn new(api: ApiContext) -> Self {
        Self { api }
    }
}

#[async_trait]
impl CheckoutApi for CheckoutService {
    async fn place_order(
        &self,
        request: &CheckoutRequest,
        currency_code: &str,
        parent: &Context,
    ) -> CoreResult<CheckoutResponse> {
        let url = self
            .api
            .endpoint(&["checkout"], &[("currencyCode", currency_code)])?;
        let req = RequestSpec::post_json(url, request)?;
        let parent = self.api.with_session(parent, &request.user_id);

        traced(
            self.api.telemetry(),
            &parent,
            SPAN_CHECKOUT_PLACE_ORDER,
            |order: &CheckoutResponse| {
                vec![
                    KeyValue::new(KEY_ORDER_ID, order.order_id.clone()),
                    KeyValue::new(KEY_ORDER_ITEMS_COUNT, order.items.len() as i64),
                    KeyValue::new(KEY_SHIPPING_TRACKING_ID, order.shipping_tracking_id.clone()),
                ]
            },
            |cx| async move {
                cx.span().set_attributes([
                    KeyValue::new(KEY_SESSION_ID, request.user_id.clone()),
                    KeyValue::new(KEY_USER_CURRENCY, currency_code.to_string()),
                ]);
                let order = self
                    .api
                    .http()
                    .execute_json::<CheckoutResponse>(req, &cx)
                    .await?;
                info!(order_id = %order.order_id, items = order.items.len(), "order placed");
                Ok(order)
            },
        )
        .await
    }
}

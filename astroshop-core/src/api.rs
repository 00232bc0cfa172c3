use async_trait::async_trait;
use opentelemetry::Context;

use crate::error::CoreResult;
use crate::model::{Address, CartItem, CheckoutRequest, CheckoutResponse, Money, Product, ServerCart};

// Every method takes the caller's trace context explicitly; the span it
// starts is a child of `parent`.

#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn list_products(&self, currency_code: &str, parent: &Context) -> CoreResult<Vec<Product>>;
    async fn get_product(
        &self,
        product_id: &str,
        currency_code: &str,
        parent: &Context,
    ) -> CoreResult<Product>;
}

#[async_trait]
pub trait CartApi: Send + Sync {
    /// A cart that does not exist yet (404) is returned as an empty cart.
    async fn get_cart(&self, parent: &Context) -> CoreResult<ServerCart>;
    async fn add_item(&self, product_id: &str, quantity: i32, parent: &Context) -> CoreResult<()>;
    async fn empty_cart(&self, parent: &Context) -> CoreResult<()>;
}

#[async_trait]
pub trait CheckoutApi: Send + Sync {
    async fn place_order(
        &self,
        request: &CheckoutRequest,
        currency_code: &str,
        parent: &Context,
    ) -> CoreResult<CheckoutResponse>;
}

#[async_trait]
pub trait ShippingApi: Send + Sync {
    async fn get_shipping_cost(
        &self,
        items: &[CartItem],
        address: &Address,
        currency_code: &str,
        parent: &Context,
    ) -> CoreResult<Money>;
}

#[async_trait]
pub trait CurrencyApi: Send + Sync {
    async fn list_currencies(&self, parent: &Context) -> CoreResult<Vec<String>>;
}
